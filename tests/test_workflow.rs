//! Integration tests for the load → configure → train → predict workflow

use polars::prelude::*;
use tabula::demo::classification_frame;
use tabula::prelude::*;
use tabula::training::train_test_split;

fn demo_dataset(rows: usize, seed: u64) -> Dataset {
    Dataset::new(classification_frame(rows, seed).unwrap()).unwrap()
}

fn trained(config: WorkflowConfig) -> (Workflow, TrainingReport) {
    let mut wf = Workflow::new(config);
    wf.load(demo_dataset(100, 42));
    wf.configure("target", vec!["A".into(), "B".into()]).unwrap();
    let report = wf.train().unwrap().unwrap();
    (wf, report)
}

// ============================================================================
// Training outcome
// ============================================================================

#[test]
fn test_two_feature_scenario() {
    let (_, report) = trained(WorkflowConfig::default());

    assert_eq!(report.n_train, 80);
    assert_eq!(report.n_test, 20);
    assert_eq!(report.n_dropped, 0);
    assert_eq!(report.classes, vec!["0", "1"]);
    assert!(report.accuracy >= 0.6, "accuracy {}", report.accuracy);
    assert!((0.0..=1.0).contains(&report.accuracy));

    let names: Vec<&str> = report.feature_importances.iter().map(|f| f.feature.as_str()).collect();
    assert_eq!(names, vec!["A", "B"]);
    for fi in &report.feature_importances {
        assert!(fi.importance > 0.0, "{} has no importance", fi.feature);
    }
}

#[test]
fn test_importances_sum_to_one() {
    let (_, report) = trained(WorkflowConfig::default().with_n_estimators(25));
    let total: f64 = report.feature_importances.iter().map(|f| f.importance).sum();
    assert!((total - 1.0).abs() < 1e-6, "sum was {}", total);
    assert!(report.feature_importances.iter().all(|f| f.importance >= 0.0));
}

#[test]
fn test_confusion_matrix_counts_test_rows() {
    let (_, report) = trained(WorkflowConfig::default().with_n_estimators(10));
    let total: usize = report.confusion_matrix.iter().flatten().sum();
    assert_eq!(total, report.n_test);
    let correct: usize = (0..report.classes.len()).map(|i| report.confusion_matrix[i][i]).sum();
    assert!((report.accuracy - correct as f64 / total as f64).abs() < 1e-12);
}

#[test]
fn test_same_seed_same_outcome() {
    let config = WorkflowConfig::default().with_n_estimators(20).with_random_state(7);
    let (mut wf1, r1) = trained(config.clone());
    let (mut wf2, r2) = trained(config);

    assert_eq!(r1.accuracy, r2.accuracy);
    assert_eq!(r1.feature_importances, r2.feature_importances);
    assert_eq!(r1.confusion_matrix, r2.confusion_matrix);

    let input = PredictionInput::new().with("A", 0.3).with("B", -0.1);
    assert_eq!(wf1.predict(&input).unwrap(), wf2.predict(&input).unwrap());
}

#[test]
fn test_seed_changes_split() {
    let (wf1, r1) = trained(WorkflowConfig::default().with_n_estimators(10).with_random_state(1));
    let (wf2, r2) = trained(WorkflowConfig::default().with_n_estimators(10).with_random_state(2));

    let center1 = wf1.model().unwrap().scaler().params()[0].center;
    let center2 = wf2.model().unwrap().scaler().params()[0].center;
    assert_ne!(center1, center2);
    assert_ne!(r1.feature_importances, r2.feature_importances);
}

#[test]
fn test_scaler_fitted_on_train_rows_only() {
    let (wf, _) = trained(WorkflowConfig::default().with_n_estimators(5));
    let dataset = wf.dataset().unwrap();

    let a: Vec<f64> = dataset.numeric_values("A").unwrap().into_iter().flatten().collect();
    let split = train_test_split(100, 0.2, 42).unwrap();
    let train_mean = split.train.iter().map(|&i| a[i]).sum::<f64>() / split.train.len() as f64;

    let center = wf.model().unwrap().scaler().params()[0].center;
    assert!((center - train_mean).abs() < 1e-12, "center {} vs {}", center, train_mean);
    assert!((center - dataset.column_mean("A").unwrap()).abs() > 1e-6);
}

#[test]
fn test_adjacent_float_values_train() {
    let a = f64::from_bits(1.0f64.to_bits() + 1);
    let b = f64::from_bits(1.0f64.to_bits() + 2);
    let values: Vec<f64> = (0..20).map(|i| if i % 2 == 0 { a } else { b }).collect();
    let labels: Vec<i64> = (0..20).map(|i| i % 2).collect();
    let dataset = Dataset::new(df!("A" => &values, "y" => &labels).unwrap()).unwrap();

    let mut wf = Workflow::new(
        WorkflowConfig::default()
            .with_scaler(ScalerType::None)
            .with_n_estimators(3),
    );
    wf.load(dataset);
    wf.configure("y", vec!["A".into()]).unwrap();
    let report = wf.train().unwrap().unwrap();
    assert!((0.0..=1.0).contains(&report.accuracy));

    let low = wf.predict(&PredictionInput::new().with("A", a)).unwrap();
    let high = wf.predict(&PredictionInput::new().with("A", b)).unwrap();
    assert_eq!(low.label, "0");
    assert_eq!(high.label, "1");
}

// ============================================================================
// Prediction
// ============================================================================

#[test]
fn test_defaults_are_feature_means() {
    let (wf, _) = trained(WorkflowConfig::default().with_n_estimators(10));
    let defaults = wf.prediction_defaults().unwrap();
    let dataset = wf.dataset().unwrap();

    assert_eq!(defaults.len(), 2);
    for feature in ["A", "B"] {
        let expected = dataset.column_mean(feature).unwrap();
        assert!((defaults.get(feature).unwrap() - expected).abs() < 1e-12);
    }
}

#[test]
fn test_prediction_matches_model() {
    let (mut wf, _) = trained(WorkflowConfig::default().with_n_estimators(15));
    let input = wf.prediction_defaults().unwrap();

    let direct = wf.model().unwrap().predict(&input).unwrap();
    let via_workflow = wf.predict(&input).unwrap();
    assert_eq!(direct, via_workflow);
    assert_eq!(wf.state(), WorkflowState::PredictionReady);
    assert_eq!(wf.last_prediction(), Some(&via_workflow));

    let total: f64 = via_workflow.probabilities.iter().map(|p| p.probability).sum();
    assert!((total - 1.0).abs() < 1e-9);
    assert!(["0", "1"].contains(&via_workflow.label.as_str()));
}

#[test]
fn test_clear_cases_classified() {
    let (mut wf, _) = trained(WorkflowConfig::default());
    let positive = PredictionInput::new().with("A", 2.5).with("B", 2.5);
    let negative = PredictionInput::new().with("A", -2.5).with("B", -2.5);
    assert_eq!(wf.predict(&positive).unwrap().label, "1");
    assert_eq!(wf.predict(&negative).unwrap().label, "0");
}

#[test]
fn test_prediction_input_validated() {
    let (mut wf, _) = trained(WorkflowConfig::default().with_n_estimators(5));

    let missing = PredictionInput::new().with("A", 1.0);
    assert!(matches!(wf.predict(&missing), Err(TabulaError::InvalidInput(_))));

    let unknown = PredictionInput::new().with("A", 1.0).with("B", 1.0).with("C", 1.0);
    assert!(matches!(wf.predict(&unknown), Err(TabulaError::InvalidInput(_))));

    let target = PredictionInput::new().with("A", 1.0).with("B", 1.0).with("target", 1.0);
    assert!(matches!(wf.predict(&target), Err(TabulaError::InvalidInput(_))));
}

// ============================================================================
// Selection and state
// ============================================================================

#[test]
fn test_target_never_a_feature() {
    let mut wf = Workflow::default();
    wf.load(demo_dataset(50, 3));

    let available = wf.available_features("target").unwrap();
    assert_eq!(available, vec!["A", "B"]);
    let available = wf.available_features("A").unwrap();
    assert_eq!(available, vec!["B", "target"]);

    let err = wf.configure("target", vec!["A".into(), "target".into()]);
    assert!(matches!(err, Err(TabulaError::InvalidSelection(_))));
    assert_eq!(wf.state(), WorkflowState::DataLoaded);
}

#[test]
fn test_unknown_columns_rejected() {
    let mut wf = Workflow::default();
    wf.load(demo_dataset(50, 3));
    assert!(matches!(
        wf.configure("missing", vec!["A".into()]),
        Err(TabulaError::FeatureNotFound(_))
    ));
    assert!(wf.configure("target", vec!["Z".into()]).is_err());
}

#[test]
fn test_empty_features_skip_training() {
    let mut wf = Workflow::default();
    wf.load(demo_dataset(50, 3));
    wf.configure("target", vec![]).unwrap();

    assert_eq!(wf.state(), WorkflowState::DataLoaded);
    assert!(wf.train().unwrap().is_none());
    assert!(wf.model().is_none());
    assert!(matches!(
        wf.predict(&PredictionInput::new()),
        Err(TabulaError::ModelNotFitted)
    ));
}

#[test]
fn test_reload_resets_state() {
    let (mut wf, _) = trained(WorkflowConfig::default().with_n_estimators(5));
    let input = wf.prediction_defaults().unwrap();
    wf.predict(&input).unwrap();

    wf.load(demo_dataset(60, 9));
    assert_eq!(wf.state(), WorkflowState::DataLoaded);
    assert!(wf.selection().is_none());
    assert!(wf.model().is_none());
    assert!(wf.report().is_none());
    assert!(wf.last_prediction().is_none());
    assert!(matches!(wf.predict(&input), Err(TabulaError::ModelNotFitted)));
}

#[test]
fn test_reconfigure_invalidates_model() {
    let (mut wf, _) = trained(WorkflowConfig::default().with_n_estimators(5));
    wf.set_features(vec!["A".into()]).unwrap();

    assert_eq!(wf.state(), WorkflowState::Configured);
    assert!(wf.model().is_none());

    let report = wf.train().unwrap().unwrap();
    assert_eq!(report.features, vec!["A"]);
    assert!((report.feature_importances[0].importance - 1.0).abs() < 1e-9);
}

#[test]
fn test_bad_config_rejected_at_train() {
    let mut wf = Workflow::new(WorkflowConfig::default().with_test_size(1.5));
    wf.load(demo_dataset(50, 3));
    wf.configure("target", vec!["A".into()]).unwrap();
    assert!(matches!(wf.train(), Err(TabulaError::InvalidParameter { .. })));
}

// ============================================================================
// From a file
// ============================================================================

#[test]
fn test_csv_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("demo.csv");
    let mut df = classification_frame(100, 42).unwrap();
    let mut file = std::fs::File::create(&path).unwrap();
    CsvWriter::new(&mut file).finish(&mut df).unwrap();

    let dataset = Dataset::from_path(&path).unwrap();
    assert_eq!(dataset.height(), 100);
    assert_eq!(dataset.source(), Some("demo.csv"));

    let mut wf = Workflow::new(WorkflowConfig::default().with_n_estimators(20));
    wf.load(dataset);
    let features = wf.available_features("target").unwrap();
    wf.configure("target", features).unwrap();
    let report = wf.train().unwrap().unwrap();
    assert_eq!(report.n_train + report.n_test, 100);

    let input = wf.prediction_defaults().unwrap();
    wf.predict(&input).unwrap();
    assert_eq!(wf.state(), WorkflowState::PredictionReady);
}
