//! Tabular model workflow
//!
//! Drives one dataset through `Idle → DataLoaded → Configured → Trained →
//! PredictionReady`:
//!
//! 1. [`Workflow::load`] takes a [`Dataset`] and resets everything derived
//!    from the previous one.
//! 2. [`Workflow::configure`] picks a target and feature columns. An empty
//!    feature list is accepted but leaves the workflow idle.
//! 3. [`Workflow::train`] splits rows (seeded), fits the scaler on the train
//!    split only, fits a random forest, and scores it on the test split.
//! 4. [`Workflow::predict`] scales one record with the training statistics
//!    and returns the predicted class.
//!
//! Every `train` call rebuilds the model from scratch; with the same data,
//! selection and seed it produces the same report.

use crate::dataset::Dataset;
use crate::error::{Result, TabulaError};
use crate::preprocessing::Scaler;
use crate::selection::{self, FeatureSelection};
use crate::training::{
    train_test_split, ClassificationMetrics, RandomForest, WorkflowConfig,
};
use ndarray::{Array2, Axis};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Workflow lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WorkflowState {
    Idle,
    DataLoaded,
    Configured,
    Trained,
    PredictionReady,
}

impl fmt::Display for WorkflowState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            WorkflowState::Idle => "Idle",
            WorkflowState::DataLoaded => "DataLoaded",
            WorkflowState::Configured => "Configured",
            WorkflowState::Trained => "Trained",
            WorkflowState::PredictionReady => "PredictionReady",
        };
        f.write_str(name)
    }
}

/// Importance weight of one feature
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureImportance {
    pub feature: String,
    pub importance: f64,
}

/// Outcome of one `train` call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingReport {
    pub target: String,
    /// Selected features, in selection order
    pub features: Vec<String>,
    /// Class labels; index `i` is class `i`
    pub classes: Vec<String>,
    /// Test-split accuracy in [0, 1]
    pub accuracy: f64,
    /// One entry per feature, in selection order
    pub feature_importances: Vec<FeatureImportance>,
    /// `confusion_matrix[actual][predicted]` over the test split
    pub confusion_matrix: Vec<Vec<usize>>,
    pub n_train: usize,
    pub n_test: usize,
    /// Rows skipped because the target or a feature was null
    pub n_dropped: usize,
    pub random_state: u64,
    pub training_time_secs: f64,
}

impl TrainingReport {
    /// Feature name → importance
    pub fn importance_map(&self) -> BTreeMap<String, f64> {
        self.feature_importances
            .iter()
            .map(|fi| (fi.feature.clone(), fi.importance))
            .collect()
    }

    /// Importances sorted by weight, largest first; ties keep selection order
    pub fn ranking(&self) -> Vec<FeatureImportance> {
        let mut ranked = self.feature_importances.clone();
        ranked.sort_by(|a, b| b.importance.total_cmp(&a.importance));
        ranked
    }
}

/// One record to classify: feature name → value
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PredictionInput {
    values: BTreeMap<String, f64>,
}

impl PredictionInput {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set one feature value, replacing any previous value
    pub fn set(&mut self, feature: impl Into<String>, value: f64) -> &mut Self {
        self.values.insert(feature.into(), value);
        self
    }

    pub fn with(mut self, feature: impl Into<String>, value: f64) -> Self {
        self.set(feature, value);
        self
    }

    pub fn get(&self, feature: &str) -> Option<f64> {
        self.values.get(feature).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.values.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl FromIterator<(String, f64)> for PredictionInput {
    fn from_iter<I: IntoIterator<Item = (String, f64)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}

/// Vote share for one class
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassProbability {
    pub label: String,
    pub probability: f64,
}

/// Result of classifying one record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub label: String,
    pub class_index: usize,
    pub probabilities: Vec<ClassProbability>,
}

/// Scaler and forest fitted by one `train` call
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainedModel {
    features: Vec<String>,
    classes: Vec<String>,
    scaler: Scaler,
    forest: RandomForest,
}

impl TrainedModel {
    pub fn features(&self) -> &[String] {
        &self.features
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn scaler(&self) -> &Scaler {
        &self.scaler
    }

    pub fn forest(&self) -> &RandomForest {
        &self.forest
    }

    /// Classify one record. The record must name exactly the trained
    /// features, each with a finite value.
    pub fn predict(&self, input: &PredictionInput) -> Result<Prediction> {
        if let Some((unknown, _)) = input
            .iter()
            .find(|(name, _)| !self.features.iter().any(|f| f.as_str() == *name))
        {
            return Err(TabulaError::InvalidInput(format!(
                "'{}' is not a trained feature",
                unknown
            )));
        }

        let row = self
            .features
            .iter()
            .map(|feature| match input.get(feature) {
                Some(v) if v.is_finite() => Ok(v),
                Some(v) => Err(TabulaError::InvalidInput(format!(
                    "value for '{}' is not finite: {}",
                    feature, v
                ))),
                None => Err(TabulaError::InvalidInput(format!(
                    "missing value for feature '{}'",
                    feature
                ))),
            })
            .collect::<Result<Vec<f64>>>()?;

        let scaled = self.scaler.transform_row(&row)?.insert_axis(Axis(0));
        let class_index = self.forest.predict(&scaled)?[0];
        let proba = self.forest.predict_proba(&scaled)?;

        let probabilities = self
            .classes
            .iter()
            .zip(proba.row(0))
            .map(|(label, &probability)| ClassProbability {
                label: label.clone(),
                probability,
            })
            .collect();

        Ok(Prediction {
            label: self.classes[class_index].clone(),
            class_index,
            probabilities,
        })
    }
}

/// Sort labels numerically when every label parses as a number
fn sort_labels(labels: &mut [String]) {
    let numeric: Option<Vec<f64>> = labels.iter().map(|l| l.trim().parse::<f64>().ok()).collect();
    match numeric {
        Some(_) => labels.sort_by(|a, b| {
            let x: f64 = a.trim().parse().unwrap_or(f64::NAN);
            let y: f64 = b.trim().parse().unwrap_or(f64::NAN);
            x.total_cmp(&y).then_with(|| a.cmp(b))
        }),
        None => labels.sort(),
    }
}

/// Rows with a target and every feature present, as a matrix plus labels
struct PreparedData {
    x: Array2<f64>,
    labels: Vec<String>,
    n_dropped: usize,
}

fn prepare_data(dataset: &Dataset, selection: &FeatureSelection) -> Result<PreparedData> {
    let labels = dataset.label_values(selection.target())?;
    let columns: Vec<Vec<Option<f64>>> = selection
        .features()
        .iter()
        .map(|feature| dataset.numeric_values(feature))
        .collect::<Result<_>>()?;

    let n_features = columns.len();
    let mut data = Vec::with_capacity(labels.len() * n_features);
    let mut kept_labels = Vec::with_capacity(labels.len());

    for (i, label) in labels.into_iter().enumerate() {
        let Some(label) = label else { continue };
        if columns.iter().any(|col| col[i].is_none()) {
            continue;
        }
        data.extend(columns.iter().filter_map(|col| col[i]));
        kept_labels.push(label);
    }

    let n_dropped = dataset.height() - kept_labels.len();
    let x = Array2::from_shape_vec((kept_labels.len(), n_features), data)?;

    Ok(PreparedData {
        x,
        labels: kept_labels,
        n_dropped,
    })
}

/// The stateful train/predict workflow
#[derive(Debug, Clone)]
pub struct Workflow {
    config: WorkflowConfig,
    state: WorkflowState,
    dataset: Option<Dataset>,
    selection: Option<FeatureSelection>,
    model: Option<TrainedModel>,
    report: Option<TrainingReport>,
    prediction: Option<Prediction>,
}

impl Default for Workflow {
    fn default() -> Self {
        Self::new(WorkflowConfig::default())
    }
}

impl Workflow {
    pub fn new(config: WorkflowConfig) -> Self {
        Self {
            config,
            state: WorkflowState::Idle,
            dataset: None,
            selection: None,
            model: None,
            report: None,
            prediction: None,
        }
    }

    pub fn state(&self) -> WorkflowState {
        self.state
    }

    pub fn config(&self) -> &WorkflowConfig {
        &self.config
    }

    pub fn dataset(&self) -> Option<&Dataset> {
        self.dataset.as_ref()
    }

    pub fn selection(&self) -> Option<&FeatureSelection> {
        self.selection.as_ref()
    }

    pub fn model(&self) -> Option<&TrainedModel> {
        self.model.as_ref()
    }

    pub fn report(&self) -> Option<&TrainingReport> {
        self.report.as_ref()
    }

    pub fn last_prediction(&self) -> Option<&Prediction> {
        self.prediction.as_ref()
    }

    fn clear_model(&mut self) {
        self.model = None;
        self.report = None;
        self.prediction = None;
    }

    fn require_dataset(&self, action: &str) -> Result<&Dataset> {
        self.dataset.as_ref().ok_or_else(|| TabulaError::InvalidState {
            action: action.to_string(),
            state: self.state.to_string(),
        })
    }

    /// Replace the dataset; any selection and model are discarded
    pub fn load(&mut self, dataset: Dataset) {
        info!(
            source = dataset.source().unwrap_or("<memory>"),
            rows = dataset.height(),
            cols = dataset.width(),
            "Workflow data loaded"
        );
        self.dataset = Some(dataset);
        self.selection = None;
        self.clear_model();
        self.state = WorkflowState::DataLoaded;
    }

    /// Features that may be chosen alongside `target`
    pub fn available_features(&self, target: &str) -> Result<Vec<String>> {
        let dataset = self.require_dataset("list features")?;
        Ok(selection::available_features(dataset, target))
    }

    /// Choose target and features. An empty feature list is recorded but
    /// keeps the workflow in `DataLoaded`.
    pub fn configure(&mut self, target: &str, features: Vec<String>) -> Result<()> {
        let dataset = self.require_dataset("configure")?;
        let selection = FeatureSelection::new(dataset, target, features)?;

        self.state = if selection.is_empty() {
            WorkflowState::DataLoaded
        } else {
            WorkflowState::Configured
        };
        debug!(
            target = selection.target(),
            features = ?selection.features(),
            state = %self.state,
            "Selection updated"
        );
        self.selection = Some(selection);
        self.clear_model();
        Ok(())
    }

    /// Change the feature list, keeping the current target
    pub fn set_features(&mut self, features: Vec<String>) -> Result<()> {
        let target = self
            .selection
            .as_ref()
            .map(|s| s.target().to_string())
            .ok_or_else(|| TabulaError::InvalidState {
                action: "set features".to_string(),
                state: self.state.to_string(),
            })?;
        self.configure(&target, features)
    }

    /// Train on the current selection.
    ///
    /// Returns `Ok(None)` without training when no features are selected.
    pub fn train(&mut self) -> Result<Option<TrainingReport>> {
        let dataset = self.require_dataset("train")?;
        let selection = match &self.selection {
            Some(selection) if !selection.is_empty() => selection,
            _ => {
                debug!("No features selected, skipping training");
                return Ok(None);
            }
        };

        self.config.validate()?;
        let start = Instant::now();

        let prepared = prepare_data(dataset, selection)?;
        if prepared.n_dropped > 0 {
            warn!(
                dropped = prepared.n_dropped,
                "Dropped rows with missing target or feature values"
            );
        }

        let mut classes: Vec<String> = prepared
            .labels
            .iter()
            .cloned()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        sort_labels(&mut classes);
        if classes.len() < 2 {
            warn!(classes = classes.len(), "Target has a single class");
        }

        let class_index: HashMap<&str, usize> = classes
            .iter()
            .enumerate()
            .map(|(i, c)| (c.as_str(), i))
            .collect();
        let y: Vec<usize> = prepared
            .labels
            .iter()
            .map(|l| class_index[l.as_str()])
            .collect();

        let split = train_test_split(prepared.x.nrows(), self.config.test_size, self.config.random_state)?;
        debug!(train = split.train.len(), test = split.test.len(), "Split rows");

        let x_train = prepared.x.select(Axis(0), &split.train);
        let x_test = prepared.x.select(Axis(0), &split.test);
        let y_train: Vec<usize> = split.train.iter().map(|&i| y[i]).collect();
        let y_test: Vec<usize> = split.test.iter().map(|&i| y[i]).collect();

        // Statistics come from the train split only
        let mut scaler = Scaler::new(self.config.scaler);
        let x_train = scaler.fit_transform(&x_train)?;
        let x_test = scaler.transform(&x_test)?;
        debug!(params = ?scaler.params(), "Scaler fitted");

        let mut forest = self.config.forest.build(self.config.random_state);
        forest.fit(&x_train, &y_train, classes.len())?;

        let y_pred = forest.predict(&x_test)?;
        let metrics = ClassificationMetrics::compute(&y_test, &y_pred, classes.len())?;

        let importances = forest
            .feature_importances()
            .ok_or(TabulaError::ModelNotFitted)?;
        let feature_importances = selection
            .features()
            .iter()
            .zip(importances.iter())
            .map(|(feature, &importance)| FeatureImportance {
                feature: feature.clone(),
                importance,
            })
            .collect();

        let report = TrainingReport {
            target: selection.target().to_string(),
            features: selection.features().to_vec(),
            classes: classes.clone(),
            accuracy: metrics.accuracy,
            feature_importances,
            confusion_matrix: metrics.confusion_matrix,
            n_train: split.train.len(),
            n_test: split.test.len(),
            n_dropped: prepared.n_dropped,
            random_state: self.config.random_state,
            training_time_secs: start.elapsed().as_secs_f64(),
        };

        info!(
            target = %report.target,
            accuracy = report.accuracy,
            n_train = report.n_train,
            n_test = report.n_test,
            "Model trained"
        );

        self.model = Some(TrainedModel {
            features: selection.features().to_vec(),
            classes,
            scaler,
            forest,
        });
        self.report = Some(report.clone());
        self.prediction = None;
        self.state = WorkflowState::Trained;

        Ok(Some(report))
    }

    /// A record holding each selected feature's mean over the whole dataset
    pub fn prediction_defaults(&self) -> Result<PredictionInput> {
        let dataset = self.require_dataset("build prediction defaults")?;
        let selection = self.selection.as_ref().ok_or_else(|| TabulaError::InvalidState {
            action: "build prediction defaults".to_string(),
            state: self.state.to_string(),
        })?;

        selection
            .features()
            .iter()
            .map(|feature| Ok((feature.clone(), dataset.column_mean(feature)?)))
            .collect()
    }

    /// Classify one record with the trained model
    pub fn predict(&mut self, input: &PredictionInput) -> Result<Prediction> {
        let model = match self.state {
            WorkflowState::Trained | WorkflowState::PredictionReady => {
                self.model.as_ref().ok_or(TabulaError::ModelNotFitted)?
            }
            _ => return Err(TabulaError::ModelNotFitted),
        };

        let prediction = model.predict(input)?;
        info!(label = %prediction.label, "Prediction made");

        self.prediction = Some(prediction.clone());
        self.state = WorkflowState::PredictionReady;
        Ok(prediction)
    }
}
