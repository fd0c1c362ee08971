#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/airspace-tools/airspace/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod config;
pub mod pipeline;

// Re-export sub-crates
pub use airspace_data as data;
pub use airspace_filter as filter;

pub use config::{AirspaceConfig, ConfigError, FreshnessSource};
pub use pipeline::{Pipeline, PipelineError, RunOutcome};

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
