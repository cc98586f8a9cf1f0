//! Target and feature column selection

use crate::dataset::Dataset;
use crate::error::{Result, TabulaError};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Columns that may be offered as features once `target` is chosen.
///
/// Only numeric columns qualify and the target itself is never listed.
pub fn available_features(dataset: &Dataset, target: &str) -> Vec<String> {
    dataset
        .numeric_columns()
        .into_iter()
        .filter(|name| name != target)
        .collect()
}

/// A validated target column plus its feature columns
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureSelection {
    target: String,
    features: Vec<String>,
}

impl FeatureSelection {
    /// Validate a selection against a dataset.
    ///
    /// The feature list may be empty; a workflow with no features stays idle.
    pub fn new(
        dataset: &Dataset,
        target: impl Into<String>,
        features: Vec<String>,
    ) -> Result<Self> {
        let target = target.into();
        if !dataset.has_column(&target) {
            return Err(TabulaError::FeatureNotFound(target));
        }

        Self::validate_features(dataset, &target, &features)?;

        Ok(Self { target, features })
    }

    /// Replace the feature list, keeping the target
    pub fn with_features(self, dataset: &Dataset, features: Vec<String>) -> Result<Self> {
        Self::new(dataset, self.target, features)
    }

    fn validate_features(dataset: &Dataset, target: &str, features: &[String]) -> Result<()> {
        let mut seen = HashSet::new();
        for feature in features {
            if feature == target {
                return Err(TabulaError::InvalidSelection(format!(
                    "target column '{}' cannot also be a feature",
                    target
                )));
            }
            if !seen.insert(feature.as_str()) {
                return Err(TabulaError::InvalidSelection(format!(
                    "feature '{}' selected twice",
                    feature
                )));
            }
            if !dataset.is_numeric(feature)? {
                return Err(TabulaError::InvalidSelection(format!(
                    "feature '{}' is not numeric",
                    feature
                )));
            }
        }
        Ok(())
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn features(&self) -> &[String] {
        &self.features
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}
