pub mod dashboard;
#[cfg(feature = "pdf")]
pub mod export;
pub mod form;
pub mod init;
pub mod status;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "regop", about = "Operational shift log and dispatch dashboard.")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Set up regop: choose a data directory and write the default catalog.
    Init {
        /// Path for regop data (default: ~/Documents/regop)
        #[arg(long = "data-dir")]
        data_dir: Option<String>,
        /// Operator name printed on reports
        #[arg(long)]
        operator: Option<String>,
    },
    /// Show the current configuration.
    Status,
    /// Fill in the shift record step by step.
    Form,
    /// List the dates present in a dispatch spreadsheet.
    Dates {
        /// Path to a CSV or Excel file
        file: String,
    },
    /// Hourly dispatch counts per company and destination.
    Dashboard {
        #[command(flatten)]
        selection: Selection,
    },
    /// Export one PDF report per company.
    #[cfg(feature = "pdf")]
    Export {
        #[command(flatten)]
        selection: Selection,
        /// Output directory (default: <data_dir>/exports)
        #[arg(long = "output-dir")]
        output_dir: Option<String>,
    },
}

#[derive(Args, Debug, Clone)]
pub struct Selection {
    /// Path to a CSV or Excel file
    pub file: String,
    /// Day to report: YYYY-MM-DD or DD/MM/YYYY (default: latest in file)
    #[arg(long)]
    pub date: Option<String>,
    /// Destination to include; repeat for several (default: all)
    #[arg(long = "destination")]
    pub destinations: Vec<String>,
    /// Company to include; repeat for several (default: all)
    #[arg(long = "company")]
    pub companies: Vec<String>,
    /// First hour of the range, inclusive
    #[arg(long = "from-hour", default_value = "0")]
    pub from_hour: u8,
    /// Last hour of the range, inclusive
    #[arg(long = "to-hour", default_value = "23")]
    pub to_hour: u8,
}
