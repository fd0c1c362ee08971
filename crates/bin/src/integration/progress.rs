//! Terminal feedback while the raw dataset downloads.

use airspace_data::Result;
use airspace_data::fetch::Fetcher;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Wraps a fetcher with a spinner on stderr.
#[derive(Debug)]
pub(crate) struct SpinnerFetcher<F> {
    inner: F,
}

impl<F> SpinnerFetcher<F> {
    pub(crate) const fn new(inner: F) -> Self {
        Self { inner }
    }
}

impl<F: Fetcher + Sync> Fetcher for SpinnerFetcher<F> {
    fn fetch(&self, url: &str) -> impl Future<Output = Result<Vec<u8>>> + Send {
        async move {
            let pb = ProgressBar::new_spinner();
            pb.set_style(
                ProgressStyle::default_spinner()
                    .template("{spinner:.green} {msg} [{elapsed}]")
                    .expect("valid template"),
            );
            pb.enable_steady_tick(Duration::from_millis(100));
            pb.set_message(format!("Will download airspaces JSON from '{url}'"));

            let result = self.inner.fetch(url).await;
            match &result {
                Ok(body) => pb.finish_with_message(format!("Downloaded {} bytes", body.len())),
                Err(_) => pb.finish_with_message("Download failed!"),
            }
            result
        }
    }
}
