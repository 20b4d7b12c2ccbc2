//! Log setup. The terminal belongs to the table, so everything goes to a file.

use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing_error::ErrorLayer;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use crate::domain::RosterError;

/// Used when RUST_LOG is not set.
const DEFAULT_LOG_FILTER: &str = "roster=info";
const LOG_FILE_NAME: &str = "roster.log";

/// Expands `~` and environment variables in a user supplied path.
/// Without one the log lands in the temp directory.
pub fn resolve_log_path(raw: Option<&str>) -> Result<PathBuf, RosterError> {
    match raw {
        Some(raw) => shellexpand::full(raw)
            .map(|expanded| PathBuf::from(expanded.as_ref()))
            .map_err(|e| RosterError::Config(format!("log file '{raw}': {e}"))),
        None => Ok(std::env::temp_dir().join(LOG_FILE_NAME)),
    }
}

pub fn init(path: &Path) -> Result<(), RosterError> {
    let file = OpenOptions::new().create(true).append(true).open(path)?;

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(Mutex::new(file))
                .with_ansi(false)
                .with_target(true)
                .with_line_number(true),
        )
        .with(ErrorLayer::default())
        .try_init()
        .map_err(|e| RosterError::Logging(e.to_string()))?;

    tracing::info!(version = env!("CARGO_PKG_VERSION"), log = %path.display(), "roster starting up");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_log_path_is_in_temp_dir() {
        let path = resolve_log_path(None).unwrap();
        assert!(path.starts_with(std::env::temp_dir()));
        assert!(path.ends_with(LOG_FILE_NAME));
    }

    #[test]
    fn plain_path_is_kept() {
        let path = resolve_log_path(Some("/var/tmp/table.log")).unwrap();
        assert_eq!(path, PathBuf::from("/var/tmp/table.log"));
    }

    #[test]
    fn undefined_variable_is_a_config_error() {
        let result = resolve_log_path(Some("$ROSTER_UNDEFINED_LOG_DIR_7F3A/x.log"));
        assert!(matches!(result, Err(RosterError::Config(_))));
    }
}
