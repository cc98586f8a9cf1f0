//! Classification metrics

use crate::error::{Result, TabulaError};
use serde::{Deserialize, Serialize};

/// Metrics for a labelled evaluation set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationMetrics {
    /// Fraction of correct predictions, in [0, 1]
    pub accuracy: f64,
    /// `confusion_matrix[actual][predicted]`
    pub confusion_matrix: Vec<Vec<usize>>,
    /// Number of evaluated samples
    pub n_samples: usize,
}

impl ClassificationMetrics {
    /// Compare predicted against true class indices
    pub fn compute(y_true: &[usize], y_pred: &[usize], n_classes: usize) -> Result<Self> {
        if y_true.len() != y_pred.len() {
            return Err(TabulaError::ShapeError {
                expected: format!("{} predictions", y_true.len()),
                actual: format!("{} predictions", y_pred.len()),
            });
        }
        if y_true.is_empty() {
            return Err(TabulaError::DataError(
                "Cannot score an empty evaluation set".to_string(),
            ));
        }

        let mut confusion_matrix = vec![vec![0usize; n_classes]; n_classes];
        let mut correct = 0usize;
        for (&t, &p) in y_true.iter().zip(y_pred) {
            if t >= n_classes || p >= n_classes {
                return Err(TabulaError::DataError(format!(
                    "Class index out of range for {} classes",
                    n_classes
                )));
            }
            confusion_matrix[t][p] += 1;
            if t == p {
                correct += 1;
            }
        }

        Ok(Self {
            accuracy: correct as f64 / y_true.len() as f64,
            confusion_matrix,
            n_samples: y_true.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accuracy_and_confusion() {
        let metrics = ClassificationMetrics::compute(&[0, 0, 1, 1], &[0, 1, 1, 1], 2).unwrap();
        assert!((metrics.accuracy - 0.75).abs() < 1e-12);
        assert_eq!(metrics.confusion_matrix, vec![vec![1, 1], vec![0, 2]]);
        assert_eq!(metrics.n_samples, 4);
    }

    #[test]
    fn test_empty_rejected() {
        assert!(ClassificationMetrics::compute(&[], &[], 2).is_err());
    }

    #[test]
    fn test_length_mismatch() {
        assert!(ClassificationMetrics::compute(&[0], &[0, 1], 2).is_err());
    }
}
