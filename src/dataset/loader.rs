//! File loading for datasets

use crate::error::{Result, TabulaError};
use polars::prelude::*;
use std::fs::File;
use std::path::Path;
use tracing::debug;

/// Supported input formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    Csv,
    Tsv,
    Json,
    JsonLines,
    Parquet,
}

impl FileFormat {
    /// Detect format from the file extension; unknown extensions read as CSV
    pub fn from_path(path: &Path) -> Self {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .unwrap_or_default();

        match ext.as_str() {
            "tsv" => FileFormat::Tsv,
            "json" => FileFormat::Json,
            "jsonl" | "ndjson" => FileFormat::JsonLines,
            "parquet" | "pq" => FileFormat::Parquet,
            _ => FileFormat::Csv,
        }
    }
}

/// Rows scanned for CSV schema inference
const INFER_SCHEMA_ROWS: usize = 1000;

/// Reads data files into polars frames
#[derive(Debug, Clone, Default)]
pub struct DataLoader;

impl DataLoader {
    pub fn new() -> Self {
        Self
    }

    /// Load a file, choosing the reader by extension
    pub fn load(&self, path: &Path) -> Result<DataFrame> {
        if !path.exists() {
            return Err(TabulaError::DataError(format!(
                "File not found: {}",
                path.display()
            )));
        }

        let format = FileFormat::from_path(path);
        debug!(path = %path.display(), ?format, "Reading data file");

        match format {
            FileFormat::Csv => self.load_delimited(path, b','),
            FileFormat::Tsv => self.load_delimited(path, b'\t'),
            FileFormat::Json => Ok(JsonReader::new(File::open(path)?).finish()?),
            FileFormat::JsonLines => Ok(JsonReader::new(File::open(path)?)
                .with_json_format(JsonFormat::JsonLines)
                .finish()?),
            FileFormat::Parquet => Ok(ParquetReader::new(File::open(path)?).finish()?),
        }
    }

    fn load_delimited(&self, path: &Path, separator: u8) -> Result<DataFrame> {
        let parse_opts = CsvParseOptions::default().with_separator(separator);

        let df = CsvReadOptions::default()
            .with_has_header(true)
            .with_infer_schema_length(Some(INFER_SCHEMA_ROWS))
            .with_parse_options(parse_opts)
            .try_into_reader_with_file_path(Some(path.to_path_buf()))?
            .finish()?;

        Ok(df)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_format_detection() {
        assert_eq!(FileFormat::from_path(Path::new("a.csv")), FileFormat::Csv);
        assert_eq!(FileFormat::from_path(Path::new("a.TSV")), FileFormat::Tsv);
        assert_eq!(FileFormat::from_path(Path::new("a.jsonl")), FileFormat::JsonLines);
        assert_eq!(FileFormat::from_path(Path::new("a.pq")), FileFormat::Parquet);
        assert_eq!(FileFormat::from_path(Path::new("a.txt")), FileFormat::Csv);
        assert_eq!(FileFormat::from_path(Path::new("noext")), FileFormat::Csv);
    }

    #[test]
    fn test_load_tsv() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.tsv");
        let mut file = File::create(&path).unwrap();
        writeln!(file, "a\tb").unwrap();
        writeln!(file, "1\tx").unwrap();
        writeln!(file, "2\ty").unwrap();

        let df = DataLoader::new().load(&path).unwrap();
        assert_eq!(df.shape(), (2, 2));
    }

    #[test]
    fn test_missing_file() {
        let result = DataLoader::new().load(Path::new("/definitely/not/here.csv"));
        assert!(matches!(result, Err(TabulaError::DataError(_))));
    }
}
