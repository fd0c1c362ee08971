//! Relevance predicate for airspace features.
//!
//! A feature is relevant when its restriction flag is truthy and its
//! lowercased name contains at least one configured area substring.

use crate::error::{FilterError, Result};
use serde_json::Value;
use tracing::debug;

/// Property holding the restriction flag.
pub const DEFAULT_FLAG_PROPERTY: &str = "HX";

/// Property holding the airspace name.
pub const DEFAULT_NAME_PROPERTY: &str = "Name";

/// Relevant areas used when none are configured.
pub const DEFAULT_RELEVANT_AREAS: &[&str] = &["meiringen"];

/// Relevant areas plus the property keys the predicate reads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelevanceConfig {
    areas: Vec<String>,
    flag_property: String,
    name_property: String,
}

impl Default for RelevanceConfig {
    fn default() -> Self {
        Self {
            areas: DEFAULT_RELEVANT_AREAS
                .iter()
                .map(|area| (*area).to_string())
                .collect(),
            flag_property: DEFAULT_FLAG_PROPERTY.to_string(),
            name_property: DEFAULT_NAME_PROPERTY.to_string(),
        }
    }
}

impl RelevanceConfig {
    /// Build a config from area substrings.
    ///
    /// Areas are trimmed and lowercased; blank entries and repeats are
    /// dropped, keeping first-seen order.
    ///
    /// # Errors
    ///
    /// Returns [`FilterError::NoRelevantAreas`] when no area remains.
    ///
    /// # Example
    /// ```
    /// use airspace_filter::RelevanceConfig;
    ///
    /// let config = RelevanceConfig::new([" Meiringen ", "SION", "meiringen"]).unwrap();
    /// assert_eq!(config.areas(), ["meiringen", "sion"]);
    /// ```
    pub fn new<I, S>(areas: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut normalized: Vec<String> = Vec::new();
        for area in areas {
            let area = area.as_ref().trim().to_lowercase();
            if !area.is_empty() && !normalized.contains(&area) {
                normalized.push(area);
            }
        }

        if normalized.is_empty() {
            return Err(FilterError::NoRelevantAreas);
        }

        Ok(Self {
            areas: normalized,
            ..Self::default()
        })
    }

    /// Override the property keys read by the predicate.
    pub fn with_properties(mut self, flag_property: &str, name_property: &str) -> Self {
        self.flag_property = flag_property.to_string();
        self.name_property = name_property.to_string();
        self
    }

    /// Normalized area substrings.
    pub fn areas(&self) -> &[String] {
        &self.areas
    }

    /// Property holding the restriction flag.
    pub fn flag_property(&self) -> &str {
        &self.flag_property
    }

    /// Property holding the feature name.
    pub fn name_property(&self) -> &str {
        &self.name_property
    }

    /// First area matched by `feature`, or `None` when it is not relevant.
    pub fn matched_area(&self, feature: &Value) -> Option<&str> {
        let properties = feature.get("properties")?.as_object()?;

        if !properties.get(&self.flag_property).is_some_and(is_truthy) {
            return None;
        }

        let name = properties
            .get(&self.name_property)
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_lowercase();

        let area = self.areas.iter().find(|area| name.contains(area.as_str()))?;
        debug!("> Match for '{area}': {name}");
        Some(area.as_str())
    }

    /// Whether `feature` belongs to the processed dataset.
    pub fn is_relevant(&self, feature: &Value) -> bool {
        self.matched_area(feature).is_some()
    }
}

/// Truthiness of a loosely typed JSON flag.
///
/// `false`, `null`, zero, the empty string and empty containers are falsy.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}
