#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/airspace-tools/airspace/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod dataset;
pub mod error;
pub mod filter;
pub mod relevance;

pub use dataset::{FEATURES_KEY, ProcessedDataset, RawDataset};
pub use error::{FilterError, Result};
pub use filter::{FeatureFilter, FilterSummary};
pub use relevance::{
    DEFAULT_FLAG_PROPERTY, DEFAULT_NAME_PROPERTY, DEFAULT_RELEVANT_AREAS, RelevanceConfig,
    is_truthy,
};
