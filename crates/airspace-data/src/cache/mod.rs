//! Cache freshness tracking for the raw dataset.

pub mod freshness;
pub mod sqlite;

pub use freshness::{
    DEFAULT_REFRESH_INTERVAL_DAYS, FetchTimestamps, Freshness, FreshnessGate, ModifiedTime,
    RefetchReason, format_timedelta,
};
pub use sqlite::{FetchLog, FetchLogStats, FetchRecord};
