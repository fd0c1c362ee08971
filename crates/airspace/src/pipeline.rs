//! Refresh-and-filter pipeline.
//!
//! One run evaluates the freshness gate, downloads the raw dataset when the
//! gate asks for it, and filters the raw dataset on disk into the processed
//! dataset. A fresh cache without `force` ends the run before filtering.

use crate::config::{AirspaceConfig, ConfigError, FreshnessSource};
use airspace_data::DataError;
use airspace_data::cache::{
    FetchLog, FetchRecord, Freshness, FreshnessGate, ModifiedTime, RefetchReason,
    format_timedelta,
};
use airspace_data::fetch::{Fetcher, download};
use airspace_filter::{FeatureFilter, FilterError, FilterSummary};
use chrono::{DateTime, TimeDelta, Utc};
use thiserror::Error;
use tracing::info;

/// Errors that abort a run.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Configuration error
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Fetch or cache error
    #[error(transparent)]
    Data(#[from] DataError),

    /// Parse, validation or output error
    #[error(transparent)]
    Filter(#[from] FilterError),
}

/// Result of a completed run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// Cache still fresh; nothing fetched or written.
    StillFresh {
        /// Time left until the cached copy expires
        remaining: TimeDelta,
    },
    /// The processed dataset was rewritten.
    Processed {
        /// Why the raw dataset was downloaded, if it was
        refetch: Option<RefetchReason>,
        /// Size of the downloaded raw dataset
        fetched_bytes: Option<u64>,
        /// Filter counts
        summary: FilterSummary,
    },
}

/// Runs the gate, fetcher and filter against one configuration.
#[derive(Debug)]
pub struct Pipeline<F> {
    config: AirspaceConfig,
    gate: FreshnessGate,
    filter: FeatureFilter,
    fetcher: F,
    fetch_log: Option<FetchLog>,
}

impl<F: Fetcher> Pipeline<F> {
    /// Build a pipeline from a validated configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the relevant areas are unusable.
    pub fn new(config: AirspaceConfig, fetcher: F) -> Result<Self, PipelineError> {
        let filter = FeatureFilter::new(config.relevance()?);
        Ok(Self {
            gate: config.freshness_gate(),
            filter,
            config,
            fetcher,
            fetch_log: None,
        })
    }

    /// Record fetches in `log`; required when the config reads freshness
    /// from the fetch log.
    pub fn with_fetch_log(mut self, log: FetchLog) -> Self {
        self.fetch_log = Some(log);
        self
    }

    /// Configuration in use.
    pub const fn config(&self) -> &AirspaceConfig {
        &self.config
    }

    /// Fetcher in use.
    pub const fn fetcher(&self) -> &F {
        &self.fetcher
    }

    /// Fetch log in use, if any.
    pub const fn fetch_log(&self) -> Option<&FetchLog> {
        self.fetch_log.as_ref()
    }

    /// Evaluate the freshness gate at `now`.
    pub fn check_freshness(
        &self,
        force: bool,
        now: DateTime<Utc>,
    ) -> Result<Freshness, PipelineError> {
        let raw_path = &self.config.raw_path;
        let decision = match self.config.freshness_source {
            FreshnessSource::ModifiedTime => {
                self.gate.evaluate(raw_path, force, &ModifiedTime, now)?
            }
            FreshnessSource::FetchLog => {
                let log = self.fetch_log.as_ref().ok_or_else(|| {
                    ConfigError::Invalid(
                        "freshness_source = \"fetch_log\" needs an open fetch log".to_string(),
                    )
                })?;
                self.gate.evaluate(raw_path, force, log, now)?
            }
        };
        Ok(decision)
    }

    /// Run once, using the current time.
    pub async fn run(&self, force: bool) -> Result<RunOutcome, PipelineError> {
        self.run_at(force, Utc::now()).await
    }

    /// Run once as if the current time were `now`.
    ///
    /// # Errors
    ///
    /// Every failure is fatal: timestamp access, download, fetch log,
    /// parsing, validation and output errors abort the run. The processed
    /// dataset is only replaced after it has been fully computed.
    pub async fn run_at(
        &self,
        force: bool,
        now: DateTime<Utc>,
    ) -> Result<RunOutcome, PipelineError> {
        let raw_path = &self.config.raw_path;
        info!(path = %raw_path.display(), force, "verifying raw dataset");

        let (refetch, fetched_bytes) = match self.check_freshness(force, now)? {
            Freshness::Refetch(reason) => {
                info!(%reason, url = %self.config.url, "fetching raw dataset");
                let bytes = download(&self.fetcher, &self.config.url, raw_path).await?;
                if let Some(log) = &self.fetch_log {
                    log.record_fetch(&FetchRecord::new(raw_path, &self.config.url, bytes, now))?;
                }
                (Some(reason), Some(bytes))
            }
            Freshness::Fresh {
                remaining,
                reprocess: false,
                ..
            } => {
                info!(remaining = %format_timedelta(remaining), "raw dataset still fresh");
                return Ok(RunOutcome::StillFresh { remaining });
            }
            Freshness::Fresh {
                remaining,
                reprocess: true,
                ..
            } => {
                info!(
                    remaining = %format_timedelta(remaining),
                    "raw dataset still fresh, reprocessing cached copy"
                );
                (None, None)
            }
        };

        let summary = self
            .filter
            .process_file(raw_path, &self.config.processed_path)?;

        Ok(RunOutcome::Processed {
            refetch,
            fetched_bytes,
            summary,
        })
    }
}
