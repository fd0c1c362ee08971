//! Fetch log location.
//!
//! Resolves the SQLite fetch log to a platform-specific default location
//! unless the configuration names one.

use airspace_data::cache::FetchLog;
use airspace_data::error::DataError;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Get the default cache directory path.
///
/// Uses platform-specific cache directories:
/// - Linux: `~/.cache/airspace/`
/// - macOS: `~/Library/Caches/airspace/`
/// - Windows: `%LOCALAPPDATA%\airspace\`
pub(crate) fn default_cache_dir() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("airspace")
}

/// Get the default fetch log path.
pub(crate) fn default_fetch_log_path() -> PathBuf {
    default_cache_dir().join("fetch_log.db")
}

/// Open the fetch log, creating its directory if needed.
pub(crate) fn open_fetch_log(configured: Option<&Path>) -> Result<FetchLog, DataError> {
    let log_path = configured.map_or_else(default_fetch_log_path, Path::to_path_buf);

    if let Some(parent) = log_path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }

    debug!(path = %log_path.display(), "opening fetch log");
    FetchLog::new(&log_path)
}
