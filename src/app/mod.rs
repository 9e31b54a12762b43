//! Application glue module
//!
//! Configuration, the editor startup script, and logging.

mod config;
pub mod vimrc;

use std::fs::OpenOptions;
use std::io;
use std::sync::Mutex;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub use config::{default_config_path, CliArgs, Config, ConfigError};

/// Install the global tracing subscriber
///
/// Logs go to `config.log_file` only: stdout and stderr belong to the
/// editor's screen. Without a log file nothing is installed and the
/// `tracing` macros are no-ops. `RUST_LOG` overrides `config.log_filter`.
pub fn init_logging(config: &Config) -> io::Result<()> {
    let Some(path) = &config.log_file else {
        return Ok(());
    };

    let file = OpenOptions::new().create(true).append(true).open(path)?;
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_filter))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(Mutex::new(file)),
        )
        .try_init()
        .map_err(io::Error::other)
}
