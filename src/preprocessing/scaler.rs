//! Feature scaling implementations

use crate::error::{Result, TabulaError};
use ndarray::{Array1, Array2, ArrayView1, Axis};
use serde::{Deserialize, Serialize};

/// Type of scaler to use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ScalerType {
    /// Standard scaling (z-score normalization): (x - mean) / std
    #[default]
    Standard,
    /// Min-Max scaling: (x - min) / (max - min)
    MinMax,
    /// No scaling
    None,
}

/// Parameters for one fitted column
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScalerParams {
    /// mean or min
    pub center: f64,
    /// std or range, never zero
    pub scale: f64,
}

/// Column-wise feature scaler over row-major matrices
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scaler {
    scaler_type: ScalerType,
    params: Vec<ScalerParams>,
    is_fitted: bool,
}

impl Scaler {
    /// Create a new scaler
    pub fn new(scaler_type: ScalerType) -> Self {
        Self {
            scaler_type,
            params: Vec::new(),
            is_fitted: false,
        }
    }

    pub fn scaler_type(&self) -> ScalerType {
        self.scaler_type
    }

    /// Fitted per-column parameters, in column order
    pub fn params(&self) -> &[ScalerParams] {
        &self.params
    }

    pub fn is_fitted(&self) -> bool {
        self.is_fitted
    }

    /// Fit the scaler to the data. Any previous fit is replaced.
    pub fn fit(&mut self, x: &Array2<f64>) -> Result<&mut Self> {
        if x.nrows() == 0 {
            return Err(TabulaError::PreprocessingError(
                "Cannot fit scaler on zero rows".to_string(),
            ));
        }

        self.params = x
            .axis_iter(Axis(1))
            .map(|column| self.compute_params(column))
            .collect();
        self.is_fitted = true;
        Ok(self)
    }

    /// Scale every row with the fitted parameters
    pub fn transform(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        self.check_width(x.ncols())?;

        let mut result = x.clone();
        for (mut column, params) in result.axis_iter_mut(Axis(1)).zip(&self.params) {
            column.mapv_inplace(|v| (v - params.center) / params.scale);
        }
        Ok(result)
    }

    /// Scale a single record
    pub fn transform_row(&self, row: &[f64]) -> Result<Array1<f64>> {
        self.check_width(row.len())?;

        Ok(row
            .iter()
            .zip(&self.params)
            .map(|(v, params)| (v - params.center) / params.scale)
            .collect())
    }

    /// Fit and transform in one step
    pub fn fit_transform(&mut self, x: &Array2<f64>) -> Result<Array2<f64>> {
        self.fit(x)?;
        self.transform(x)
    }

    fn check_width(&self, n_cols: usize) -> Result<()> {
        if !self.is_fitted {
            return Err(TabulaError::ModelNotFitted);
        }
        if n_cols != self.params.len() {
            return Err(TabulaError::ShapeError {
                expected: format!("{} columns", self.params.len()),
                actual: format!("{} columns", n_cols),
            });
        }
        Ok(())
    }

    fn compute_params(&self, column: ArrayView1<f64>) -> ScalerParams {
        match self.scaler_type {
            ScalerType::Standard => {
                let n = column.len() as f64;
                let mean = column.sum() / n;
                // population std, matching the usual z-score scaler
                let var = column.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
                let std = var.sqrt();
                ScalerParams {
                    center: mean,
                    scale: if std == 0.0 { 1.0 } else { std },
                }
            }
            ScalerType::MinMax => {
                let min = column.iter().copied().fold(f64::INFINITY, f64::min);
                let max = column.iter().copied().fold(f64::NEG_INFINITY, f64::max);
                let range = max - min;
                ScalerParams {
                    center: min,
                    scale: if range == 0.0 { 1.0 } else { range },
                }
            }
            ScalerType::None => ScalerParams {
                center: 0.0,
                scale: 1.0,
            },
        }
    }
}
