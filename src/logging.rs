//! Logger setup for the binary

use std::fs::OpenOptions;
use std::path::Path;

use crate::error::{FleetError, Result};

/// Install the global `env_logger`
///
/// The default level is `info`, raised to `debug` for this crate when
/// `debug` is set. `RUST_LOG` overrides both. With `log_file`, output is
/// appended to that file instead of stderr.
///
/// # Errors
/// Returns error if the log file cannot be opened or a logger is already installed
pub fn init_logging(debug: bool, log_file: Option<&Path>) -> Result<()> {
    let default_filter = if debug {
        "info,chat_fleet=debug"
    } else {
        "info"
    };

    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter));
    builder.format_timestamp_millis();

    if let Some(path) = log_file {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        builder.target(env_logger::Target::Pipe(Box::new(file)));
    }

    builder
        .try_init()
        .map_err(|e| FleetError::invalid_state(format!("logger already installed: {e}")))
}
