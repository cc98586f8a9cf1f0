//! Training configuration

use super::decision_tree::Criterion;
use super::random_forest::{MaxFeatures, RandomForest};
use crate::error::{Result, TabulaError};
use crate::preprocessing::ScalerType;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Random forest hyperparameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForestConfig {
    /// Number of trees
    pub n_estimators: usize,
    /// Maximum depth of trees (None = grow until pure)
    pub max_depth: Option<usize>,
    /// Minimum samples required to split a node
    pub min_samples_split: usize,
    /// Minimum samples per leaf
    pub min_samples_leaf: usize,
    /// Features drawn per split
    pub max_features: MaxFeatures,
    /// Impurity criterion
    pub criterion: Criterion,
    /// Bootstrap sampling of rows per tree
    pub bootstrap: bool,
}

impl Default for ForestConfig {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: MaxFeatures::Sqrt,
            criterion: Criterion::Gini,
            bootstrap: true,
        }
    }
}

impl ForestConfig {
    /// Build an unfitted forest from these settings
    pub fn build(&self, random_state: u64) -> RandomForest {
        RandomForest::new(self.n_estimators)
            .with_max_depth(self.max_depth)
            .with_min_samples_split(self.min_samples_split)
            .with_min_samples_leaf(self.min_samples_leaf)
            .with_max_features(self.max_features)
            .with_criterion(self.criterion)
            .with_bootstrap(self.bootstrap)
            .with_random_state(random_state)
    }
}

/// Configuration for the train/predict workflow
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkflowConfig {
    /// Fraction of rows held out for testing
    pub test_size: f64,
    /// Seed for the split and the forest
    pub random_state: u64,
    /// Feature scaler fitted on the train split
    pub scaler: ScalerType,
    /// Classifier settings
    pub forest: ForestConfig,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            test_size: 0.2,
            random_state: 42,
            scaler: ScalerType::Standard,
            forest: ForestConfig::default(),
        }
    }
}

impl WorkflowConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a configuration from a JSON file; missing keys take defaults
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&json).map_err(|e| {
            TabulaError::ConfigError(format!("{}: {}", path.display(), e))
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn with_test_size(mut self, test_size: f64) -> Self {
        self.test_size = test_size;
        self
    }

    pub fn with_random_state(mut self, seed: u64) -> Self {
        self.random_state = seed;
        self
    }

    pub fn with_scaler(mut self, scaler: ScalerType) -> Self {
        self.scaler = scaler;
        self
    }

    pub fn with_n_estimators(mut self, n_estimators: usize) -> Self {
        self.forest.n_estimators = n_estimators;
        self
    }

    pub fn with_max_depth(mut self, depth: Option<usize>) -> Self {
        self.forest.max_depth = depth;
        self
    }

    pub fn with_forest(mut self, forest: ForestConfig) -> Self {
        self.forest = forest;
        self
    }

    /// Reject values the workflow cannot run with
    pub fn validate(&self) -> Result<()> {
        fn invalid(name: &str, value: impl ToString, reason: &str) -> TabulaError {
            TabulaError::InvalidParameter {
                name: name.to_string(),
                value: value.to_string(),
                reason: reason.to_string(),
            }
        }

        if !(self.test_size > 0.0 && self.test_size < 1.0) {
            return Err(invalid("test_size", self.test_size, "must be strictly between 0 and 1"));
        }
        if self.forest.n_estimators == 0 {
            return Err(invalid("n_estimators", 0, "at least one tree is required"));
        }
        if self.forest.max_depth == Some(0) {
            return Err(invalid("max_depth", 0, "must be at least 1"));
        }
        if self.forest.min_samples_split < 2 {
            return Err(invalid(
                "min_samples_split",
                self.forest.min_samples_split,
                "must be at least 2",
            ));
        }
        if self.forest.min_samples_leaf == 0 {
            return Err(invalid("min_samples_leaf", 0, "must be at least 1"));
        }
        match self.forest.max_features {
            MaxFeatures::Fraction(f) if !(f > 0.0 && f <= 1.0) => {
                return Err(invalid("max_features", f, "fraction must be in (0, 1]"));
            }
            MaxFeatures::Fixed(0) => {
                return Err(invalid("max_features", 0, "must be at least 1"));
            }
            _ => {}
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = WorkflowConfig::default();
        assert_eq!(config.test_size, 0.2);
        assert_eq!(config.random_state, 42);
        assert_eq!(config.scaler, ScalerType::Standard);
        assert_eq!(config.forest.n_estimators, 100);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        assert!(WorkflowConfig::new().with_test_size(1.5).validate().is_err());
        assert!(WorkflowConfig::new().with_n_estimators(0).validate().is_err());
        assert!(WorkflowConfig::new().with_max_depth(Some(0)).validate().is_err());

        let mut forest = ForestConfig::default();
        forest.max_features = MaxFeatures::Fraction(0.0);
        assert!(WorkflowConfig::new().with_forest(forest).validate().is_err());
    }

    #[test]
    fn test_from_json_partial() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"random_state": 7, "forest": {{"n_estimators": 25, "max_features": {{"fixed": 2}}}}}}"#
        )
        .unwrap();

        let config = WorkflowConfig::from_json_file(file.path()).unwrap();
        assert_eq!(config.random_state, 7);
        assert_eq!(config.test_size, 0.2);
        assert_eq!(config.forest.n_estimators, 25);
        assert_eq!(config.forest.max_features, MaxFeatures::Fixed(2));
        assert!(config.forest.bootstrap);
    }

    #[test]
    fn test_from_json_invalid() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"test_size": 0.0}}"#).unwrap();
        assert!(WorkflowConfig::from_json_file(file.path()).is_err());
    }

    #[test]
    fn test_scaler_serde_name() {
        let json = serde_json::to_string(&ScalerType::MinMax).unwrap();
        assert_eq!(json, "\"minmax\"");
    }
}
