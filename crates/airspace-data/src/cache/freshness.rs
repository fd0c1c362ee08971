//! Staleness gate for the cached raw dataset.
//!
//! The gate decides, before anything touches the network, whether the raw
//! dataset on disk has to be downloaded again. The age of the cache comes
//! from a [`FetchTimestamps`] source: the file's modification time by
//! default, or an explicit fetch log.

use crate::error::Result;
use chrono::{DateTime, TimeDelta, Utc};
use std::fmt;
use std::path::Path;
use tracing::{debug, warn};

/// Default refresh interval in days.
pub const DEFAULT_REFRESH_INTERVAL_DAYS: u32 = 7;

/// Source for the time at which a cached file was last fetched.
pub trait FetchTimestamps {
    /// Time of the last successful fetch into `path`, if known.
    ///
    /// # Errors
    ///
    /// Returns an error if the timestamp source cannot be read.
    fn last_fetched(&self, path: &Path) -> Result<Option<DateTime<Utc>>>;
}

/// Uses the filesystem modification time as the fetch timestamp.
#[derive(Debug, Clone, Copy, Default)]
pub struct ModifiedTime;

impl FetchTimestamps for ModifiedTime {
    fn last_fetched(&self, path: &Path) -> Result<Option<DateTime<Utc>>> {
        let modified = std::fs::metadata(path)?.modified()?;
        Ok(Some(DateTime::<Utc>::from(modified)))
    }
}

/// Why the raw dataset has to be fetched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefetchReason {
    /// The caller asked for an unconditional refresh.
    Forced,
    /// No raw dataset exists at the cache path.
    Missing,
    /// The file exists but the timestamp source has no record of it.
    Unrecorded,
    /// The cached copy is older than the refresh interval.
    Stale {
        /// Age of the cached copy.
        age: TimeDelta,
    },
}

impl fmt::Display for RefetchReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Forced => write!(f, "refresh forced"),
            Self::Missing => write!(f, "no cached copy"),
            Self::Unrecorded => write!(f, "no recorded fetch for cached copy"),
            Self::Stale { age } => write!(f, "cached copy is {} old", format_timedelta(*age)),
        }
    }
}

/// Outcome of evaluating the gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Freshness {
    /// The raw dataset must be downloaded before filtering.
    Refetch(RefetchReason),
    /// The cached raw dataset is recent enough.
    Fresh {
        /// Age of the cached copy.
        age: TimeDelta,
        /// Time left until the cached copy expires.
        remaining: TimeDelta,
        /// Filter the cached copy anyway (forced run without refetch).
        reprocess: bool,
    },
}

impl Freshness {
    /// Whether a download is required.
    pub const fn needs_fetch(&self) -> bool {
        matches!(self, Self::Refetch(_))
    }

    /// Whether the filter stage should run after this decision.
    pub const fn should_filter(&self) -> bool {
        match self {
            Self::Refetch(_) => true,
            Self::Fresh { reprocess, .. } => *reprocess,
        }
    }
}

/// Decides whether the cached raw dataset must be refetched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FreshnessGate {
    refresh_interval: TimeDelta,
    force_always_refetches: bool,
}

impl Default for FreshnessGate {
    fn default() -> Self {
        Self::new(
            TimeDelta::days(i64::from(DEFAULT_REFRESH_INTERVAL_DAYS)),
            true,
        )
    }
}

impl FreshnessGate {
    /// Create a gate.
    ///
    /// # Arguments
    /// * `refresh_interval` - Maximum age of a cached copy
    /// * `force_always_refetches` - When false, a forced run on a fresh
    ///   cache skips the download and only reprocesses the cached copy
    pub const fn new(refresh_interval: TimeDelta, force_always_refetches: bool) -> Self {
        Self {
            refresh_interval,
            force_always_refetches,
        }
    }

    /// Maximum age of a cached copy.
    pub const fn refresh_interval(&self) -> TimeDelta {
        self.refresh_interval
    }

    /// Whether a forced run always downloads.
    pub const fn force_always_refetches(&self) -> bool {
        self.force_always_refetches
    }

    /// Evaluate the gate for the raw dataset at `path`.
    ///
    /// Rules, in order: forced refresh, missing file, unrecorded fetch,
    /// age strictly greater than the refresh interval. Anything else is
    /// fresh.
    ///
    /// # Errors
    ///
    /// Returns an error if the fetch timestamp cannot be read.
    pub fn evaluate<S: FetchTimestamps + ?Sized>(
        &self,
        path: &Path,
        force: bool,
        source: &S,
        now: DateTime<Utc>,
    ) -> Result<Freshness> {
        if force && self.force_always_refetches {
            return Ok(Freshness::Refetch(RefetchReason::Forced));
        }

        if !path.is_file() {
            return Ok(Freshness::Refetch(RefetchReason::Missing));
        }

        let Some(last_fetched) = source.last_fetched(path)? else {
            return Ok(Freshness::Refetch(RefetchReason::Unrecorded));
        };

        let age = now - last_fetched;
        debug!(path = %path.display(), %last_fetched, age = %format_timedelta(age), "cached copy found");
        if age < TimeDelta::zero() {
            warn!(path = %path.display(), %last_fetched, "cached copy is dated in the future");
        }

        if age > self.refresh_interval {
            return Ok(Freshness::Refetch(RefetchReason::Stale { age }));
        }

        Ok(Freshness::Fresh {
            age,
            remaining: self.refresh_interval - age,
            reprocess: force,
        })
    }
}

/// Render a duration as `"N days, HH:MM:SS"`.
pub fn format_timedelta(delta: TimeDelta) -> String {
    let sign = if delta < TimeDelta::zero() { "-" } else { "" };
    let total = delta.num_seconds().unsigned_abs();
    let days = total / 86_400;
    let hours = (total % 86_400) / 3_600;
    let minutes = (total % 3_600) / 60;
    let seconds = total % 60;

    match days {
        0 => format!("{sign}{hours}:{minutes:02}:{seconds:02}"),
        1 => format!("{sign}1 day, {hours}:{minutes:02}:{seconds:02}"),
        _ => format!("{sign}{days} days, {hours}:{minutes:02}:{seconds:02}"),
    }
}
