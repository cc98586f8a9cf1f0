//! Plain-text rendering of summaries, reports and charts

use crate::dataset::ColumnSummary;
use crate::error::Result;
use crate::workflow::{Prediction, PredictionInput, TrainingReport};
use serde::Serialize;
use std::fmt::Write;

const BAR_WIDTH: usize = 40;
const MARKERS: [char; 4] = ['*', 'o', '+', 'x'];

/// Pretty-printed JSON for any report type
pub fn to_json<T: Serialize>(value: &T) -> Result<String> {
    Ok(serde_json::to_string_pretty(value)?)
}

fn fmt_opt(value: Option<f64>) -> String {
    value.map_or_else(|| "-".to_string(), |v| format!("{:.4}", v))
}

/// Dataset preview table
pub fn render_summary(summary: &[ColumnSummary]) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:<20} {:<10} {:>6} {:>7} {:>10} {:>10} {:>10} {:>10}",
        "Column", "Type", "Nulls", "Unique", "Mean", "Std", "Min", "Max"
    );
    let _ = writeln!(out, "{}", "-".repeat(90));
    for col in summary {
        let _ = writeln!(
            out,
            "{:<20} {:<10} {:>6} {:>7} {:>10} {:>10} {:>10} {:>10}",
            col.name,
            col.dtype,
            col.null_count,
            col.unique_count,
            fmt_opt(col.mean),
            fmt_opt(col.std),
            fmt_opt(col.min),
            fmt_opt(col.max),
        );
    }
    out
}

/// Horizontal bars scaled so the largest value spans `width` cells
pub fn render_bar_chart(items: &[(String, f64)], width: usize) -> String {
    let label_width = items.iter().map(|(l, _)| l.chars().count()).max().unwrap_or(0);
    let max = items.iter().map(|(_, v)| *v).fold(0.0f64, f64::max);

    let mut out = String::new();
    for (label, value) in items {
        let len = if max > 0.0 {
            ((value / max) * width as f64).round() as usize
        } else {
            0
        };
        let _ = writeln!(
            out,
            "{:<lw$} │{:<w$}│ {:.4}",
            label,
            "█".repeat(len),
            value,
            lw = label_width,
            w = width
        );
    }
    out
}

/// Training outcome: accuracy, importance chart, confusion matrix
pub fn render_report(report: &TrainingReport) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Target      {}", report.target);
    let _ = writeln!(out, "Features    {}", report.features.join(", "));
    let _ = writeln!(out, "Classes     {}", report.classes.join(", "));
    let _ = writeln!(
        out,
        "Rows        {} train / {} test ({} dropped)",
        report.n_train, report.n_test, report.n_dropped
    );
    let _ = writeln!(out, "Seed        {}", report.random_state);
    let _ = writeln!(out, "Accuracy    {:.4}", report.accuracy);
    let _ = writeln!(out);

    let _ = writeln!(out, "Feature importance");
    let bars: Vec<(String, f64)> = report
        .ranking()
        .into_iter()
        .map(|fi| (fi.feature, fi.importance))
        .collect();
    out.push_str(&render_bar_chart(&bars, BAR_WIDTH));
    let _ = writeln!(out);

    out.push_str(&render_confusion_matrix(&report.classes, &report.confusion_matrix));
    out
}

/// Rows are actual classes, columns predicted
pub fn render_confusion_matrix(classes: &[String], matrix: &[Vec<usize>]) -> String {
    let cell = classes
        .iter()
        .map(|c| c.chars().count())
        .max()
        .unwrap_or(0)
        .max(6);

    let mut out = String::new();
    let _ = writeln!(out, "Confusion matrix (actual \\ predicted)");
    let _ = write!(out, "{:<cell$}", "", cell = cell);
    for class in classes {
        let _ = write!(out, " {:>cell$}", class, cell = cell);
    }
    let _ = writeln!(out);
    for (class, row) in classes.iter().zip(matrix) {
        let _ = write!(out, "{:<cell$}", class, cell = cell);
        for count in row {
            let _ = write!(out, " {:>cell$}", count, cell = cell);
        }
        let _ = writeln!(out);
    }
    out
}

/// The record that was classified and the forest's answer
pub fn render_prediction(input: &PredictionInput, prediction: &Prediction) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Input");
    for (feature, value) in input.iter() {
        let _ = writeln!(out, "  {:<18} {:.4}", feature, value);
    }
    let _ = writeln!(out, "Prediction  {}", prediction.label);
    let bars: Vec<(String, f64)> = prediction
        .probabilities
        .iter()
        .map(|p| (p.label.clone(), p.probability))
        .collect();
    out.push_str(&render_bar_chart(&bars, BAR_WIDTH / 2));
    out
}

/// Character plot of one or more series sharing the x axis
pub fn render_line_chart(series: &[(String, Vec<f64>)], height: usize) -> String {
    let height = height.max(2);
    let n_points = series.iter().map(|(_, s)| s.len()).max().unwrap_or(0);
    let values = series.iter().flat_map(|(_, s)| s.iter().copied()).filter(|v| v.is_finite());
    let (min, max) = values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    });

    let mut out = String::new();
    if n_points == 0 || !min.is_finite() {
        let _ = writeln!(out, "(no data)");
        return out;
    }
    let span = if max > min { max - min } else { 1.0 };

    let mut grid = vec![vec![' '; n_points]; height];
    for (s_idx, (_, points)) in series.iter().enumerate() {
        let marker = MARKERS[s_idx % MARKERS.len()];
        for (x, &v) in points.iter().enumerate() {
            if !v.is_finite() {
                continue;
            }
            let level = (((v - min) / span) * (height - 1) as f64).round() as usize;
            grid[height - 1 - level][x] = marker;
        }
    }

    for (row_idx, row) in grid.iter().enumerate() {
        let label = if row_idx == 0 {
            format!("{:>9.3}", max)
        } else if row_idx == height - 1 {
            format!("{:>9.3}", min)
        } else {
            " ".repeat(9)
        };
        let line: String = row.iter().flat_map(|&c| [c, ' ']).collect();
        let _ = writeln!(out, "{} ┤ {}", label, line.trim_end());
    }
    let _ = writeln!(out, "{} └{}", " ".repeat(9), "─".repeat(n_points * 2 + 1));

    let legend: Vec<String> = series
        .iter()
        .enumerate()
        .map(|(i, (name, _))| format!("{} {}", MARKERS[i % MARKERS.len()], name))
        .collect();
    let _ = writeln!(out, "{}   {}", " ".repeat(9), legend.join("   "));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflow::{ClassProbability, FeatureImportance};

    fn report() -> TrainingReport {
        TrainingReport {
            target: "target".to_string(),
            features: vec!["A".to_string(), "B".to_string()],
            classes: vec!["0".to_string(), "1".to_string()],
            accuracy: 0.85,
            feature_importances: vec![
                FeatureImportance { feature: "A".to_string(), importance: 0.25 },
                FeatureImportance { feature: "B".to_string(), importance: 0.75 },
            ],
            confusion_matrix: vec![vec![8, 2], vec![1, 9]],
            n_train: 80,
            n_test: 20,
            n_dropped: 0,
            random_state: 42,
            training_time_secs: 0.1,
        }
    }

    #[test]
    fn test_bar_chart_scaling() {
        let chart = render_bar_chart(&[("a".into(), 1.0), ("b".into(), 0.5)], 10);
        let lines: Vec<&str> = chart.lines().collect();
        assert_eq!(lines[0].matches('█').count(), 10);
        assert_eq!(lines[1].matches('█').count(), 5);
    }

    #[test]
    fn test_bar_chart_all_zero() {
        let chart = render_bar_chart(&[("a".into(), 0.0)], 10);
        assert_eq!(chart.matches('█').count(), 0);
    }

    #[test]
    fn test_report_ranks_importance() {
        let text = render_report(&report());
        assert!(text.contains("Accuracy    0.8500"));
        let b_pos = text.find("B │").unwrap();
        let a_pos = text.find("A │").unwrap();
        assert!(b_pos < a_pos);
        assert!(text.contains("Confusion matrix"));
    }

    #[test]
    fn test_prediction_rendering() {
        let input = PredictionInput::new().with("A", 1.5);
        let prediction = Prediction {
            label: "1".to_string(),
            class_index: 1,
            probabilities: vec![
                ClassProbability { label: "0".to_string(), probability: 0.3 },
                ClassProbability { label: "1".to_string(), probability: 0.7 },
            ],
        };
        let text = render_prediction(&input, &prediction);
        assert!(text.contains("Prediction  1"));
        assert!(text.contains("1.5000"));
    }

    #[test]
    fn test_line_chart_extremes() {
        let chart = render_line_chart(&[("X".into(), vec![0.0, 1.0, 2.0])], 3);
        let lines: Vec<&str> = chart.lines().collect();
        assert!(lines[0].starts_with("    2.000"));
        assert!(lines[0].ends_with('*'));
        assert!(lines[2].starts_with("    0.000"));
        assert!(chart.contains("* X"));
    }

    #[test]
    fn test_line_chart_empty() {
        assert_eq!(render_line_chart(&[], 5), "(no data)\n");
    }

    #[test]
    fn test_json() {
        let json = to_json(&report()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["accuracy"], 0.85);
        assert_eq!(value["feature_importances"][1]["feature"], "B");
    }
}
