//! Retrieval of the raw airspace dataset.
//!
//! A [`Fetcher`] produces the response body for a URL; [`download`] stores
//! that body at the raw dataset path, replacing any previous copy.

pub mod http;

pub use http::{DEFAULT_AIRSPACES_URL, HttpFetcher};

use crate::error::Result;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Source of raw dataset bytes.
pub trait Fetcher {
    /// Retrieve the full response body for `url`.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server does not answer
    /// with a success status.
    fn fetch(&self, url: &str) -> impl Future<Output = Result<Vec<u8>>> + Send;
}

/// Fetch `url` and replace the file at `dest` with the response body.
///
/// Parent directories are created when missing. Returns the number of bytes
/// written.
///
/// # Errors
///
/// Propagates fetch errors unchanged; nothing is written in that case.
pub async fn download<F: Fetcher>(fetcher: &F, url: &str, dest: &Path) -> Result<u64> {
    info!(url, dest = %dest.display(), "downloading raw dataset");
    let body = fetcher.fetch(url).await?;
    write_replacing(dest, &body)?;
    info!(bytes = body.len(), dest = %dest.display(), "raw dataset stored");
    Ok(body.len() as u64)
}

/// Write `contents` to a sibling file and rename it over `dest`.
///
/// # Errors
///
/// Returns an error if the directory cannot be created or either the write
/// or the rename fails.
pub fn write_replacing(dest: &Path, contents: &[u8]) -> Result<()> {
    if let Some(parent) = dest.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }

    let partial = partial_path(dest);
    debug!(partial = %partial.display(), "writing partial file");
    if let Err(e) = std::fs::write(&partial, contents) {
        std::fs::remove_file(&partial).ok();
        return Err(e.into());
    }
    std::fs::rename(&partial, dest)?;
    Ok(())
}

fn partial_path(dest: &Path) -> PathBuf {
    let mut name = dest
        .file_name()
        .map_or_else(|| OsString::from("download"), |n| n.to_os_string());
    name.push(".partial");
    dest.with_file_name(name)
}
