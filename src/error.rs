use thiserror::Error;

use crate::session::Step;

#[derive(Error, Debug)]
pub enum RegopError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[cfg(feature = "xlsx")]
    #[error("Spreadsheet error: {0}")]
    Spreadsheet(#[from] calamine::Error),

    #[error("Settings error: {0}")]
    Settings(String),

    #[error("Catalog error: {0}")]
    Catalog(String),

    #[error("Unsupported file type: {0}")]
    UnsupportedFile(String),

    #[error("Column layout error: {0}")]
    Layout(String),

    #[error("Invalid filter: {0}")]
    Filter(String),

    #[error("PDF error: {0}")]
    Pdf(String),

    #[error("Prompt error: {0}")]
    Prompt(#[from] dialoguer::Error),

    #[error(transparent)]
    Form(#[from] FormError),
}

/// Rejected state-machine operations. None of these change the session.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FormError {
    #[error("Invalid time format for {field}: {value:?} (use HH:MM)")]
    InvalidDuration { field: &'static str, value: String },

    #[error("Invalid date: {0:?} (use YYYY-MM-DD)")]
    InvalidDate(String),

    #[error("Operation belongs to step {expected}, session is at step {actual}")]
    WrongStep { expected: Step, actual: Step },

    #[error("Cannot jump forward from step {from} to step {to}")]
    ForwardJump { from: Step, to: Step },

    #[error("Row {0} is computed and cannot be edited")]
    ReadOnlyRow(usize),

    #[error("Row {0} does not exist")]
    RowOutOfRange(usize),

    #[error("{value:?} is not a valid choice for {concept}")]
    UnknownOption { concept: String, value: String },
}

pub type Result<T> = std::result::Result<T, RegopError>;
