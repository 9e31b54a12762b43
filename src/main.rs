//! shvim
//!
//! Edit a file in vim with GUI-style keys.

use std::process::ExitCode;

use clap::Parser;
use tracing::error;

use shvim::app::{self, CliArgs, Config};
use shvim::session;

fn main() -> ExitCode {
    let args = CliArgs::parse();

    // Load configuration with precedence: CLI > file > defaults
    let config = match Config::load_with_args(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("shvim: {}", e);
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = app::init_logging(&config) {
        eprintln!("shvim: cannot open log file: {}", e);
        return ExitCode::FAILURE;
    }

    match session::run(&config, &args.file) {
        Ok(status) => ExitCode::from(u8::try_from(status).unwrap_or(1)),
        Err(e) => {
            error!("Fatal error: {}", e);
            eprintln!("shvim: {}", e);
            ExitCode::FAILURE
        }
    }
}
