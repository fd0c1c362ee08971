//! Raw and processed airspace datasets.
//!
//! The raw dataset is the GeoJSON feature collection as published. Only the
//! presence of a `features` list is checked; each feature is kept as an
//! opaque [`Value`] so geometry and properties pass through untouched.

use crate::error::{FilterError, Result};
use serde::Serialize;
use serde_json::Value;
use std::ffi::OsString;
use std::path::Path;

/// Top-level key holding the feature list.
pub const FEATURES_KEY: &str = "features";

/// Feature collection as retrieved from the remote source.
#[derive(Debug, Clone, PartialEq)]
pub struct RawDataset {
    features: Vec<Value>,
}

impl RawDataset {
    /// Parse a raw dataset from JSON bytes.
    ///
    /// # Errors
    ///
    /// Returns [`FilterError::Parse`] for malformed JSON and a validation
    /// error when the `features` list is missing or not a list.
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        let document: Value = serde_json::from_slice(bytes).map_err(FilterError::Parse)?;
        Self::from_value(document)
    }

    /// Build a raw dataset from an already parsed document.
    pub fn from_value(mut document: Value) -> Result<Self> {
        let features = document
            .as_object_mut()
            .and_then(|object| object.remove(FEATURES_KEY))
            .ok_or(FilterError::MissingKey { key: FEATURES_KEY })?;

        match features {
            Value::Array(features) => Ok(Self { features }),
            other => Err(FilterError::NotAList {
                key: FEATURES_KEY,
                found: json_type_name(&other),
            }),
        }
    }

    /// Read and parse the raw dataset at `path`.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let bytes = std::fs::read(path)?;
        Self::from_slice(&bytes)
    }

    /// Features in document order.
    pub fn features(&self) -> &[Value] {
        &self.features
    }

    /// Number of features.
    pub fn len(&self) -> usize {
        self.features.len()
    }

    /// Whether the feature list is empty.
    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}

/// Features retained for the operational area, serialized as a bare list.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ProcessedDataset {
    features: Vec<Value>,
}

impl ProcessedDataset {
    /// Wrap an ordered list of retained features.
    pub const fn new(features: Vec<Value>) -> Self {
        Self { features }
    }

    /// Retained features in original order.
    pub fn features(&self) -> &[Value] {
        &self.features
    }

    /// Number of retained features.
    pub fn len(&self) -> usize {
        self.features.len()
    }

    /// Whether no feature was retained.
    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Pretty-printed JSON with two-space indentation.
    pub fn to_pretty_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(FilterError::Serialization)
    }

    /// Serialize fully, then replace the file at `path`.
    ///
    /// The output goes to a sibling `.partial` file first and is renamed
    /// over `path`, so a failed write never truncates a previous result.
    pub fn write_to<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let content = self.to_pretty_json()?;

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }

        let mut partial_name = path
            .file_name()
            .map_or_else(|| OsString::from("processed"), |n| n.to_os_string());
        partial_name.push(".partial");
        let partial = path.with_file_name(partial_name);

        if let Err(e) = std::fs::write(&partial, content) {
            std::fs::remove_file(&partial).ok();
            return Err(e.into());
        }
        std::fs::rename(&partial, path)?;
        Ok(())
    }
}

const fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}
