//! HTTP fetcher backed by `reqwest`.

use super::Fetcher;
use crate::error::{DataError, Result};
use std::time::Duration;
use tracing::debug;

/// Published GeoJSON airspace collection.
pub const DEFAULT_AIRSPACES_URL: &str = "https://airspace.shv-fsvl.ch/api/v1/geojson/airspaces";

/// User agent sent with every request.
const USER_AGENT: &str = concat!("airspace/", env!("CARGO_PKG_VERSION"));

/// Plain HTTP GET fetcher.
///
/// No retries are attempted. Without a timeout a stalled server blocks the
/// caller until the connection is closed.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    /// Create a fetcher without a request timeout.
    pub fn new() -> Result<Self> {
        Self::with_timeout(None)
    }

    /// Create a fetcher with an optional overall request timeout.
    ///
    /// # Example
    /// ```no_run
    /// use airspace_data::fetch::{Fetcher, HttpFetcher, DEFAULT_AIRSPACES_URL};
    /// use std::time::Duration;
    ///
    /// # async fn example() -> airspace_data::Result<()> {
    /// let fetcher = HttpFetcher::with_timeout(Some(Duration::from_secs(60)))?;
    /// let body = fetcher.fetch(DEFAULT_AIRSPACES_URL).await?;
    /// println!("{} bytes", body.len());
    /// # Ok(())
    /// # }
    /// ```
    pub fn with_timeout(timeout: Option<Duration>) -> Result<Self> {
        let mut builder = reqwest::Client::builder().user_agent(USER_AGENT);
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(DataError::Network)?;

        Ok(Self { client })
    }
}

impl Fetcher for HttpFetcher {
    fn fetch(&self, url: &str) -> impl Future<Output = Result<Vec<u8>>> + Send {
        async move {
            let response = self
                .client
                .get(url)
                .send()
                .await
                .map_err(DataError::Network)?;

            let status = response.status();
            if !status.is_success() {
                return Err(DataError::Http {
                    url: url.to_string(),
                    status: status.as_u16(),
                });
            }

            let body = response.bytes().await.map_err(DataError::Network)?;
            debug!(url, bytes = body.len(), "response received");
            Ok(body.to_vec())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetcher_creation() {
        assert!(HttpFetcher::new().is_ok());
        assert!(HttpFetcher::with_timeout(Some(Duration::from_secs(5))).is_ok());
    }

    #[tokio::test]
    async fn test_invalid_url_is_network_error() {
        let fetcher = HttpFetcher::new().unwrap();
        let err = fetcher.fetch("not a url").await.unwrap_err();
        assert!(matches!(err, DataError::Network(_)));
    }
}
