//! Configuration for shvim
//!
//! Settings come from three places, highest priority first:
//! - command-line arguments
//! - `$HOME/.config/shvim/config.json` (or the file given with `--config`)
//! - built-in defaults

use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::Parser;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::input::ModifierScheme;

/// Upper bound for `cursor_query_timeout_ms` and `escape_timeout_ms`
const MAX_TIMEOUT_MS: u64 = 10_000;

/// CLI arguments for shvim
#[derive(Parser, Debug, Clone)]
#[command(name = "shvim")]
#[command(version)]
#[command(about = "Edit a file in vim with GUI-style keys", long_about = None)]
pub struct CliArgs {
    /// File to edit
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Path to custom config file
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Editor command to run
    #[arg(short, long, value_name = "CMD")]
    pub editor: Option<String>,

    /// How modified arrow keys are reported (xterm, aliased)
    #[arg(short, long, value_name = "SCHEME")]
    pub modifier_scheme: Option<String>,

    /// Write a debug log to this file
    #[arg(long, value_name = "FILE")]
    pub log: Option<PathBuf>,

    /// Never query the terminal for the cursor position
    #[arg(long)]
    pub no_cursor_probe: bool,
}

/// shvim configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Editor program, looked up in `PATH`
    pub editor: String,
    /// Modifier byte interpretation for `ESC [ 1 ; m X` sequences
    pub modifier_scheme: ModifierScheme,
    /// How long to wait for a cursor position report
    pub cursor_query_timeout_ms: u64,
    /// How long a lone ESC waits for the rest of a sequence
    pub escape_timeout_ms: u64,
    /// Query the cursor position for copy, cut, save and paste
    pub probe_cursor: bool,
    /// Editor `tabstop` / `shiftwidth`
    pub tab_width: u8,
    /// Insert spaces instead of tabs
    pub expand_tab: bool,
    /// Log destination; nothing is logged without one
    pub log_file: Option<PathBuf>,
    /// Default log filter when `RUST_LOG` is unset
    pub log_filter: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            editor: "vim".to_string(),
            modifier_scheme: ModifierScheme::default(),
            cursor_query_timeout_ms: 100,
            escape_timeout_ms: 25,
            probe_cursor: true,
            tab_width: 2,
            expand_tab: true,
            log_file: None,
            log_filter: "info".to_string(),
        }
    }
}

impl Config {
    /// Load configuration with full precedence:
    /// CLI args > config file > defaults
    ///
    /// A broken file at the default location is ignored with a warning; a
    /// broken file named with `--config` is an error.
    pub fn load_with_args(args: &CliArgs) -> Result<Self, ConfigError> {
        let mut config = match &args.config {
            Some(path) => Self::load(path)?,
            None => Self::load_or_default(),
        };

        config.apply_cli_args(args)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to a file
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Load configuration from default location or return default config
    pub fn load_or_default() -> Self {
        let Some(path) = default_config_path() else {
            return Self::default();
        };
        if !path.exists() {
            return Self::default();
        }
        match Self::load(&path) {
            Ok(config) => config,
            Err(e) => {
                warn!("Failed to load config from {:?}: {}", path, e);
                Self::default()
            }
        }
    }

    fn apply_cli_args(&mut self, args: &CliArgs) -> Result<(), ConfigError> {
        if let Some(editor) = &args.editor {
            self.editor = editor.clone();
        }
        if let Some(name) = &args.modifier_scheme {
            self.modifier_scheme = ModifierScheme::from_name(name).ok_or_else(|| {
                ConfigError::invalid("modifier_scheme", format!("unknown scheme '{}'", name))
            })?;
        }
        if let Some(log) = &args.log {
            self.log_file = Some(log.clone());
        }
        if args.no_cursor_probe {
            self.probe_cursor = false;
        }
        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.editor.trim().is_empty() {
            return Err(ConfigError::invalid("editor", "must not be empty"));
        }
        if self.tab_width == 0 {
            return Err(ConfigError::invalid("tab_width", "must be at least 1"));
        }
        let timeouts = [
            ("cursor_query_timeout_ms", self.cursor_query_timeout_ms),
            ("escape_timeout_ms", self.escape_timeout_ms),
        ];
        for (field, ms) in timeouts {
            if ms > MAX_TIMEOUT_MS {
                return Err(ConfigError::invalid(
                    field,
                    format!("must be at most {} ms", MAX_TIMEOUT_MS),
                ));
            }
        }
        Ok(())
    }

    pub fn cursor_query_timeout(&self) -> Duration {
        Duration::from_millis(self.cursor_query_timeout_ms)
    }

    pub fn escape_timeout(&self) -> Duration {
        Duration::from_millis(self.escape_timeout_ms)
    }
}

/// Get the default configuration file path
pub fn default_config_path() -> Option<PathBuf> {
    std::env::var("HOME").ok().map(|home| {
        PathBuf::from(home)
            .join(".config")
            .join("shvim")
            .join("config.json")
    })
}

/// Configuration error
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Config error in '{field}': {message}")]
    Invalid { field: &'static str, message: String },
}

impl ConfigError {
    fn invalid(field: &'static str, message: impl Into<String>) -> Self {
        ConfigError::Invalid {
            field,
            message: message.into(),
        }
    }
}
