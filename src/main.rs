mod aggregator;
mod assets;
mod catalog;
mod cli;
mod dataset;
mod error;
mod fmt;
mod names;
#[cfg(feature = "pdf")]
mod pdf;
mod record;
mod session;
mod settings;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands};

const LOG_ENV: &str = "REGOP_LOG";

fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV).or_else(|_| EnvFilter::try_new("warn"));
    if let Ok(filter) = filter {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .try_init();
    }
}

fn main() {
    init_tracing();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Init { data_dir, operator } => cli::init::run(data_dir, operator),
        Commands::Status => cli::status::run(),
        Commands::Form => cli::form::run(),
        Commands::Dates { file } => cli::dashboard::dates(&file),
        Commands::Dashboard { selection } => cli::dashboard::run(&selection),
        #[cfg(feature = "pdf")]
        Commands::Export {
            selection,
            output_dir,
        } => cli::export::run(&selection, output_dir),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
