//! Dataset handling
//!
//! A [`Dataset`] wraps a polars [`DataFrame`] holding named columns of mixed
//! numeric and categorical content. It is loaded wholesale from a file and
//! replaced when a new file is loaded.

mod loader;

pub use loader::{DataLoader, FileFormat};

use crate::error::{Result, TabulaError};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

/// Broad column kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColumnKind {
    Numeric,
    Categorical,
}

/// Per-column statistics shown in the data preview
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnSummary {
    pub name: String,
    pub dtype: String,
    pub kind: ColumnKind,
    pub null_count: usize,
    pub unique_count: usize,
    pub mean: Option<f64>,
    pub std: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
}

/// A loaded table
#[derive(Debug, Clone)]
pub struct Dataset {
    frame: DataFrame,
    source: Option<String>,
}

pub(crate) fn is_numeric_dtype(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
            | DataType::Float32
            | DataType::Float64
    )
}

impl Dataset {
    /// Wrap a frame. Frames with no rows or no columns are rejected.
    pub fn new(frame: DataFrame) -> Result<Self> {
        if frame.width() == 0 || frame.height() == 0 {
            return Err(TabulaError::DataError(format!(
                "Dataset is empty ({} rows x {} cols)",
                frame.height(),
                frame.width()
            )));
        }
        Ok(Self { frame, source: None })
    }

    /// Load a dataset from a CSV, TSV, JSON or Parquet file
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let frame = DataLoader::new().load(path)?;
        let dataset = Self::new(frame)?.with_source(
            path.file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string()),
        );

        info!(
            source = %path.display(),
            rows = dataset.height(),
            cols = dataset.width(),
            "Dataset loaded"
        );
        Ok(dataset)
    }

    /// Attach the name of the file this dataset came from
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }

    pub fn frame(&self) -> &DataFrame {
        &self.frame
    }

    pub fn height(&self) -> usize {
        self.frame.height()
    }

    pub fn width(&self) -> usize {
        self.frame.width()
    }

    /// Column names in table order
    pub fn column_names(&self) -> Vec<String> {
        self.frame
            .get_column_names()
            .into_iter()
            .map(|name| name.to_string())
            .collect()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.frame.column(name).is_ok()
    }

    fn column(&self, name: &str) -> Result<&Column> {
        self.frame
            .column(name)
            .map_err(|_| TabulaError::FeatureNotFound(name.to_string()))
    }

    /// Whether the named column holds numbers
    pub fn is_numeric(&self, name: &str) -> Result<bool> {
        Ok(is_numeric_dtype(self.column(name)?.dtype()))
    }

    /// Names of numeric columns, in table order
    pub fn numeric_columns(&self) -> Vec<String> {
        self.frame
            .get_columns()
            .iter()
            .filter(|col| is_numeric_dtype(col.dtype()))
            .map(|col| col.name().to_string())
            .collect()
    }

    /// Values of a numeric column as f64, nulls kept as `None`
    pub fn numeric_values(&self, name: &str) -> Result<Vec<Option<f64>>> {
        let column = self.column(name)?;
        if !is_numeric_dtype(column.dtype()) {
            return Err(TabulaError::DataError(format!(
                "Column '{}' is not numeric ({})",
                name,
                column.dtype()
            )));
        }

        let as_f64 = column.cast(&DataType::Float64)?;
        let values = as_f64
            .f64()?
            .into_iter()
            .map(|v| v.filter(|x| x.is_finite()))
            .collect();
        Ok(values)
    }

    /// Values of any column rendered as strings, nulls kept as `None`
    pub fn label_values(&self, name: &str) -> Result<Vec<Option<String>>> {
        let column = self.column(name)?;
        let as_str = column.cast(&DataType::String)?;
        let values = as_str
            .str()?
            .into_iter()
            .map(|v| v.map(|s| s.to_string()))
            .collect();
        Ok(values)
    }

    /// Mean of a numeric column, ignoring nulls
    pub fn column_mean(&self, name: &str) -> Result<f64> {
        let values = self.numeric_values(name)?;
        let present: Vec<f64> = values.into_iter().flatten().collect();
        if present.is_empty() {
            return Err(TabulaError::DataError(format!(
                "Column '{}' has no values",
                name
            )));
        }
        Ok(present.iter().sum::<f64>() / present.len() as f64)
    }

    /// Per-column statistics
    pub fn summary(&self) -> Result<Vec<ColumnSummary>> {
        self.frame
            .get_columns()
            .iter()
            .map(|col| {
                let numeric = is_numeric_dtype(col.dtype());
                let mut summary = ColumnSummary {
                    name: col.name().to_string(),
                    dtype: col.dtype().to_string(),
                    kind: if numeric {
                        ColumnKind::Numeric
                    } else {
                        ColumnKind::Categorical
                    },
                    null_count: col.null_count(),
                    unique_count: col.n_unique()?,
                    mean: None,
                    std: None,
                    min: None,
                    max: None,
                };

                if numeric {
                    let as_f64 = col.cast(&DataType::Float64)?;
                    let ca = as_f64.f64()?;
                    summary.mean = ca.mean();
                    summary.std = ca.std(1);
                    summary.min = ca.min();
                    summary.max = ca.max();
                }

                Ok(summary)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Dataset {
        let df = df!(
            "A" => &[1.0, 2.0, 3.0, 4.0],
            "B" => &[10i64, 20, 30, 40],
            "color" => &["red", "green", "blue", "red"]
        )
        .unwrap();
        Dataset::new(df).unwrap()
    }

    #[test]
    fn test_numeric_columns() {
        let ds = sample();
        assert_eq!(ds.numeric_columns(), vec!["A".to_string(), "B".to_string()]);
        assert!(!ds.is_numeric("color").unwrap());
    }

    #[test]
    fn test_column_mean() {
        let ds = sample();
        assert!((ds.column_mean("A").unwrap() - 2.5).abs() < 1e-12);
        assert!((ds.column_mean("B").unwrap() - 25.0).abs() < 1e-12);
    }

    #[test]
    fn test_mean_of_categorical_fails() {
        let ds = sample();
        assert!(ds.column_mean("color").is_err());
    }

    #[test]
    fn test_label_values() {
        let ds = sample();
        let labels = ds.label_values("B").unwrap();
        assert_eq!(labels[0].as_deref(), Some("10"));
    }

    #[test]
    fn test_summary() {
        let ds = sample();
        let summary = ds.summary().unwrap();
        assert_eq!(summary.len(), 3);
        assert_eq!(summary[2].kind, ColumnKind::Categorical);
        assert_eq!(summary[2].unique_count, 3);
        assert_eq!(summary[0].min, Some(1.0));
        assert_eq!(summary[0].max, Some(4.0));
    }

    #[test]
    fn test_empty_frame_rejected() {
        let df = DataFrame::empty();
        assert!(Dataset::new(df).is_err());
    }

    #[test]
    fn test_missing_column() {
        let ds = sample();
        assert!(matches!(
            ds.numeric_values("nope"),
            Err(TabulaError::FeatureNotFound(_))
        ));
    }
}
