use std::fs::OpenOptions;
use std::sync::Mutex;

use tracing_subscriber::{fmt, EnvFilter};

use crate::config::AppConfig;
use crate::error::{GridError, Result};

/// Where log lines go.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogTarget {
    /// The UI owns the terminal: log to the configured file or nowhere.
    FileOnly,
    /// No UI: fall back to stderr when no file is configured.
    Stderr,
}

/// Install the global subscriber. `RUST_LOG` overrides `[logging] level`.
pub fn init(config: &AppConfig, target: LogTarget) -> Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(config.log_level()));

    let installed = match (config.log_file(), target) {
        (Some(path), _) => {
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_target(true)
                .with_writer(Mutex::new(file))
                .try_init()
        }
        (None, LogTarget::Stderr) => fmt()
            .with_env_filter(filter)
            .with_target(true)
            .with_writer(std::io::stderr)
            .try_init(),
        (None, LogTarget::FileOnly) => return Ok(()),
    };
    installed.map_err(|e| GridError::Terminal(format!("cannot install logger: {e}")))
}
