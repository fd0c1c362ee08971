//! Feature filter: raw dataset in, processed dataset out.

use crate::dataset::{ProcessedDataset, RawDataset};
use crate::error::Result;
use crate::relevance::RelevanceConfig;
use std::path::Path;
use tracing::info;

/// Counts from one filter pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FilterSummary {
    /// Features in the raw dataset
    pub total: usize,
    /// Features kept in the processed dataset
    pub retained: usize,
}

/// Selects the features relevant to the configured areas.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeatureFilter {
    relevance: RelevanceConfig,
}

impl FeatureFilter {
    /// Create a filter for the given relevance config.
    pub const fn new(relevance: RelevanceConfig) -> Self {
        Self { relevance }
    }

    /// Relevance config in use.
    pub const fn relevance(&self) -> &RelevanceConfig {
        &self.relevance
    }

    /// Keep the relevant features of `raw`, in their original order.
    pub fn apply(&self, raw: &RawDataset) -> ProcessedDataset {
        let features = raw
            .features()
            .iter()
            .filter(|feature| self.relevance.is_relevant(feature))
            .cloned()
            .collect();
        ProcessedDataset::new(features)
    }

    /// Read `raw_path`, filter it and replace `processed_path` with the result.
    ///
    /// Nothing is written unless the raw dataset parses and validates.
    ///
    /// # Errors
    ///
    /// Returns an error if the raw dataset cannot be read, parsed or
    /// validated, or if the processed dataset cannot be written.
    pub fn process_file(&self, raw_path: &Path, processed_path: &Path) -> Result<FilterSummary> {
        info!(raw = %raw_path.display(), "processing airspaces");
        let raw = RawDataset::from_path(raw_path)?;
        let processed = self.apply(&raw);
        processed.write_to(processed_path)?;

        let summary = FilterSummary {
            total: raw.len(),
            retained: processed.len(),
        };
        info!(
            total = summary.total,
            retained = summary.retained,
            processed = %processed_path.display(),
            "processed dataset written"
        );
        Ok(summary)
    }
}
