//! tabula - train a random forest on a table and classify single records
//!
//! The crate walks one dataset through a fixed workflow:
//! load, pick a target and feature columns, split, standardize, train,
//! report accuracy and feature importances, then classify one record.
//!
//! # Modules
//!
//! - [`dataset`] - File loading and column statistics
//! - [`selection`] - Target / feature choice and its validation
//! - [`preprocessing`] - Feature scaling fitted on training rows
//! - [`training`] - Split, decision trees, random forest, metrics, config
//! - [`workflow`] - The stateful load → configure → train → predict session
//! - [`report`] - Text and JSON rendering of results
//! - [`demo`] - Seeded sample data
//! - [`cli`] - Command-line interface

pub mod error;

pub mod dataset;
pub mod selection;
pub mod preprocessing;
pub mod training;
pub mod workflow;

pub mod report;
pub mod demo;
pub mod cli;

pub use error::{Result, TabulaError};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::dataset::{ColumnSummary, Dataset, DataLoader, FileFormat};
    pub use crate::error::{Result, TabulaError};
    pub use crate::preprocessing::{Scaler, ScalerType};
    pub use crate::selection::FeatureSelection;
    pub use crate::training::{ForestConfig, MaxFeatures, RandomForest, WorkflowConfig};
    pub use crate::workflow::{
        Prediction, PredictionInput, TrainingReport, Workflow, WorkflowState,
    };
}
