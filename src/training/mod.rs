//! Model training module
//!
//! Provides the pieces the workflow trains with:
//! - Seeded train/test split
//! - Decision trees and Random Forests (classification)
//! - Accuracy and confusion matrix
//! - Training configuration

mod config;
mod metrics;
mod split;
pub mod decision_tree;
pub mod random_forest;

pub use config::{ForestConfig, WorkflowConfig};
pub use decision_tree::{Criterion, DecisionTree, TreeNode};
pub use metrics::ClassificationMetrics;
pub use random_forest::{MaxFeatures, RandomForest};
pub use split::{train_test_split, TrainTestSplit};
