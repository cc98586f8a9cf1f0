//! tabula CLI Module
//!
//! Command-line interface for inspecting data, training the classifier and
//! predicting single records, plus a prompt-driven interactive session.

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use colored::*;
use polars::prelude::*;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::dataset::Dataset;
use crate::demo;
use crate::preprocessing::ScalerType;
use crate::report;
use crate::training::WorkflowConfig;
use crate::workflow::{Prediction, PredictionInput, TrainingReport, Workflow};

// ─── Styling helpers ───────────────────────────────────────────────────────────

fn dim(s: &str) -> ColoredString   { s.truecolor(100, 100, 100) }
fn accent(s: &str) -> ColoredString { s.truecolor(120, 170, 255) }
fn muted(s: &str) -> ColoredString  { s.truecolor(140, 140, 140) }
fn ok(s: &str) -> ColoredString     { s.truecolor(100, 210, 120) }

fn step_run(msg: &str) {
    print!("  {} {}... ", accent("›"), msg);
}

fn step_done(detail: &str) {
    println!("{} {}", ok("done"), dim(detail));
}

fn section(title: &str) {
    println!();
    println!("  {}", title.white().bold());
    println!("  {}", dim(&"─".repeat(56)));
}

fn indented(block: &str) {
    for line in block.lines() {
        println!("  {}", line);
    }
}

// ─── CLI definition ────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "tabula")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Train a random forest on a table and classify single records")]
#[command(long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Scaler choices accepted on the command line
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ScalerArg {
    Standard,
    Minmax,
    None,
}

impl From<ScalerArg> for ScalerType {
    fn from(arg: ScalerArg) -> Self {
        match arg {
            ScalerArg::Standard => ScalerType::Standard,
            ScalerArg::Minmax => ScalerType::MinMax,
            ScalerArg::None => ScalerType::None,
        }
    }
}

/// Kinds of generated demo data
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum DemoKind {
    /// Columns X, Y of standard normal noise
    Random,
    /// Columns A, B and a binary target
    Classification,
}

/// Settings shared by commands that train
#[derive(Debug, Clone, Default, clap::Args)]
pub struct TrainOptions {
    /// JSON configuration file (flags below override it)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Random seed for the split and the forest
    #[arg(long)]
    pub seed: Option<u64>,

    /// Fraction of rows held out for testing
    #[arg(long)]
    pub test_size: Option<f64>,

    /// Number of trees
    #[arg(long)]
    pub trees: Option<usize>,

    /// Maximum tree depth
    #[arg(long)]
    pub max_depth: Option<usize>,

    /// Feature scaler
    #[arg(long, value_enum)]
    pub scaler: Option<ScalerArg>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show column types and statistics of a data file
    Info {
        /// Input data file (CSV, TSV, JSON or Parquet)
        #[arg(short, long)]
        data: PathBuf,
    },

    /// Train on a data file, report accuracy and importances, predict one record
    Train {
        /// Input data file (CSV, TSV, JSON or Parquet)
        #[arg(short, long)]
        data: PathBuf,

        /// Target column name
        #[arg(short, long)]
        target: String,

        /// Feature columns, comma separated (default: every numeric column but the target)
        #[arg(short, long, value_delimiter = ',')]
        features: Option<Vec<String>>,

        /// Prediction input override, FEATURE=VALUE (others default to the column mean)
        #[arg(long = "set", value_name = "FEATURE=VALUE")]
        set: Vec<String>,

        /// Print a JSON document instead of text
        #[arg(long)]
        json: bool,

        #[command(flatten)]
        options: TrainOptions,
    },

    /// Generate seeded sample data and chart it or write it as CSV
    Demo {
        /// Number of rows
        #[arg(short, long, default_value = "10")]
        rows: usize,

        /// Random seed
        #[arg(long, default_value = "42")]
        seed: u64,

        /// Kind of data
        #[arg(short, long, value_enum, default_value = "random")]
        kind: DemoKind,

        /// Write CSV here instead of charting
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Prompt-driven session: pick target and features, train, predict
    Interactive {
        /// Input data file; asked for when omitted
        #[arg(short, long)]
        data: Option<PathBuf>,

        #[command(flatten)]
        options: TrainOptions,
    },
}

// ─── Helpers ───────────────────────────────────────────────────────────────────

/// Resolve the workflow configuration: file first, then flag overrides
pub fn build_config(options: &TrainOptions) -> anyhow::Result<WorkflowConfig> {
    let mut config = match &options.config {
        Some(path) => WorkflowConfig::from_json_file(path)
            .with_context(|| format!("reading config {}", path.display()))?,
        None => WorkflowConfig::default(),
    };

    if let Some(seed) = options.seed {
        config = config.with_random_state(seed);
    }
    if let Some(test_size) = options.test_size {
        config = config.with_test_size(test_size);
    }
    if let Some(trees) = options.trees {
        config = config.with_n_estimators(trees);
    }
    if options.max_depth.is_some() {
        config = config.with_max_depth(options.max_depth);
    }
    if let Some(scaler) = options.scaler {
        config = config.with_scaler(scaler.into());
    }

    config.validate()?;
    Ok(config)
}

/// Parse a `FEATURE=VALUE` pair
pub fn parse_assignment(raw: &str) -> anyhow::Result<(String, f64)> {
    let (name, value) = raw
        .split_once('=')
        .with_context(|| format!("expected FEATURE=VALUE, got '{}'", raw))?;
    let name = name.trim();
    if name.is_empty() {
        anyhow::bail!("missing feature name in '{}'", raw);
    }
    let value: f64 = value
        .trim()
        .parse()
        .with_context(|| format!("'{}' is not a number", value.trim()))?;
    Ok((name.to_string(), value))
}

/// Everything `train --json` prints
#[derive(Debug, Serialize)]
pub struct TrainOutput {
    pub report: TrainingReport,
    pub input: PredictionInput,
    pub prediction: Prediction,
}

// ─── Commands ──────────────────────────────────────────────────────────────────

pub fn cmd_info(data_path: &Path) -> anyhow::Result<()> {
    section("Data Info");

    let dataset = Dataset::from_path(data_path)?;

    println!("  {:<12} {}", muted("File"), data_path.display());
    println!("  {:<12} {}", muted("Rows"), dataset.height());
    println!("  {:<12} {}", muted("Columns"), dataset.width());
    println!(
        "  {:<12} {:.2} MB",
        muted("Memory"),
        dataset.frame().estimated_size() as f64 / 1024.0 / 1024.0
    );
    println!();

    indented(&report::render_summary(&dataset.summary()?));
    println!();
    Ok(())
}

pub fn cmd_train(
    data_path: &Path,
    target: &str,
    features: Option<Vec<String>>,
    overrides: &[String],
    json: bool,
    options: &TrainOptions,
) -> anyhow::Result<()> {
    let config = build_config(options)?;
    let overrides = overrides
        .iter()
        .map(|raw| parse_assignment(raw))
        .collect::<anyhow::Result<Vec<_>>>()?;

    if !json {
        section("Train");
        step_run("Loading data");
    }
    let start = Instant::now();
    let dataset = Dataset::from_path(data_path)?;
    if !json {
        step_done(&format!(
            "{} rows × {} cols in {:?}",
            dataset.height(),
            dataset.width(),
            start.elapsed()
        ));
    }

    let mut workflow = Workflow::new(config);
    workflow.load(dataset);

    let features = match features {
        Some(features) => features,
        None => workflow.available_features(target)?,
    };
    workflow.configure(target, features)?;

    if !json {
        step_run("Training random forest");
    }
    let Some(training) = workflow.train()? else {
        if !json {
            println!("{}", "skipped".yellow());
            println!("  {}", muted("no feature columns selected, nothing to train"));
        }
        return Ok(());
    };
    if !json {
        step_done(&format!("{:.3}s", training.training_time_secs));
    }

    let mut input = workflow.prediction_defaults()?;
    for (name, value) in overrides {
        input.set(name, value);
    }
    let prediction = workflow.predict(&input)?;

    if json {
        let output = TrainOutput {
            report: training,
            input,
            prediction,
        };
        println!("{}", report::to_json(&output)?);
        return Ok(());
    }

    section("Results");
    indented(&report::render_report(&training));
    section("Prediction");
    indented(&report::render_prediction(&input, &prediction));
    println!();
    Ok(())
}

pub fn cmd_demo(rows: usize, seed: u64, kind: DemoKind, output: Option<&Path>) -> anyhow::Result<()> {
    let mut df = match kind {
        DemoKind::Random => demo::random_frame(rows, seed)?,
        DemoKind::Classification => demo::classification_frame(rows, seed)?,
    };

    if let Some(path) = output {
        let mut file = std::fs::File::create(path)?;
        CsvWriter::new(&mut file).finish(&mut df)?;
        println!(
            "  {} wrote {} rows × {} cols to {}",
            ok("✓"),
            df.height(),
            df.width(),
            path.display()
        );
        return Ok(());
    }

    section("Demo data");
    let series = df
        .get_columns()
        .iter()
        .filter(|col| crate::dataset::is_numeric_dtype(col.dtype()))
        .map(|col| -> anyhow::Result<(String, Vec<f64>)> {
            let values: Vec<f64> = col
                .cast(&DataType::Float64)?
                .f64()?
                .into_iter()
                .map(|v| v.unwrap_or(f64::NAN))
                .collect();
            Ok((col.name().to_string(), values))
        })
        .collect::<anyhow::Result<Vec<(String, Vec<f64>)>>>()?;
    indented(&report::render_line_chart(&series, 12));
    println!();
    Ok(())
}

// ─── Interactive mode ──────────────────────────────────────────────────────────

fn print_banner() {
    println!();
    println!("       {}", "tabula".truecolor(120, 170, 255).bold());
    println!(
        "       {}",
        dim(&format!("tabular classifier  ·  v{}  ·  rust", env!("CARGO_PKG_VERSION")))
    );
    println!();
}

fn theme() -> dialoguer::theme::ColorfulTheme {
    use dialoguer::console::{style, Style};

    dialoguer::theme::ColorfulTheme {
        active_item_prefix: style("  ›".to_string()).for_stderr().cyan(),
        active_item_style: Style::new().for_stderr().white().bold(),
        inactive_item_prefix: style("   ".to_string()).for_stderr(),
        inactive_item_style: Style::new().for_stderr().color256(245),
        prompt_prefix: style("  ?".to_string()).for_stderr().color256(111),
        prompt_style: Style::new().for_stderr().white().bold(),
        ..dialoguer::theme::ColorfulTheme::default()
    }
}

fn prompt_dataset(
    theme: &dialoguer::theme::ColorfulTheme,
    data: Option<&Path>,
) -> anyhow::Result<Dataset> {
    use dialoguer::Input;

    let path: String = match data {
        Some(path) => path.display().to_string(),
        None => Input::with_theme(theme)
            .with_prompt("Data file (empty for demo data)")
            .allow_empty(true)
            .interact_text()?,
    };

    let dataset = if path.trim().is_empty() {
        Dataset::new(demo::classification_frame(100, 42)?)?.with_source("demo")
    } else {
        Dataset::from_path(path.trim())?
    };
    println!(
        "  {} {} {}",
        muted("Loaded file:"),
        dataset.source().unwrap_or("-").white().bold(),
        dim(&format!("({} rows × {} cols)", dataset.height(), dataset.width()))
    );
    Ok(dataset)
}

/// Colors offered in the greeting
pub const COLORS: [&str; 3] = ["Red", "Green", "Blue"];

/// Ages accepted in the greeting
pub fn validate_age(age: &u8) -> Result<(), String> {
    if *age <= 100 {
        Ok(())
    } else {
        Err(format!("age must be between 0 and 100, got {}", age))
    }
}

/// Confirmation line shown after the greeting prompts
pub fn greeting(name: &str, color: &str, age: u8) -> String {
    format!("Hello {}! You like {} and you are {} years old", name, color, age)
}

fn prompt_greeting(theme: &dialoguer::theme::ColorfulTheme) -> anyhow::Result<()> {
    use dialoguer::{Confirm, Input, Select};

    let name: String = Input::with_theme(theme)
        .with_prompt("Your name")
        .allow_empty(true)
        .interact_text()?;
    let color = Select::with_theme(theme)
        .with_prompt("Favorite color")
        .items(&COLORS)
        .default(0)
        .interact()?;
    let age: u8 = Input::with_theme(theme)
        .with_prompt("Your age (0-100)")
        .default(25)
        .validate_with(validate_age)
        .interact_text()?;

    let confirmed = Confirm::with_theme(theme)
        .with_prompt("Confirm")
        .default(true)
        .interact()?;
    if confirmed {
        println!("  {}", greeting(name.trim(), COLORS[color], age).white().bold());
    }
    Ok(())
}

fn prompt_selection(
    theme: &dialoguer::theme::ColorfulTheme,
    workflow: &mut Workflow,
) -> anyhow::Result<()> {
    use dialoguer::{MultiSelect, Select};

    let columns = workflow
        .dataset()
        .map(|d| d.column_names())
        .unwrap_or_default();
    let target_idx = Select::with_theme(theme)
        .with_prompt("Target column")
        .items(&columns)
        .default(columns.len().saturating_sub(1))
        .interact()?;
    let target = columns[target_idx].clone();

    let available = workflow.available_features(&target)?;
    let defaults = vec![true; available.len()];
    let chosen = MultiSelect::with_theme(theme)
        .with_prompt("Feature columns")
        .items(&available)
        .defaults(&defaults)
        .interact()?;

    let features = chosen.into_iter().map(|i| available[i].clone()).collect();
    workflow.configure(&target, features)?;
    Ok(())
}

fn prompt_record(
    theme: &dialoguer::theme::ColorfulTheme,
    workflow: &Workflow,
) -> anyhow::Result<PredictionInput> {
    use dialoguer::Input;

    let defaults = workflow.prediction_defaults()?;
    let mut input = PredictionInput::new();
    for (feature, mean) in defaults.iter() {
        let value: f64 = Input::with_theme(theme)
            .with_prompt(feature)
            .default(mean)
            .interact_text()?;
        input.set(feature, value);
    }
    Ok(input)
}

fn train_and_show(workflow: &mut Workflow) -> anyhow::Result<bool> {
    match workflow.train()? {
        Some(training) => {
            section("Results");
            indented(&report::render_report(&training));
            Ok(true)
        }
        None => {
            println!();
            println!("  {}", muted("no feature columns selected, nothing to train"));
            Ok(false)
        }
    }
}

pub fn cmd_interactive(data: Option<&Path>, options: &TrainOptions) -> anyhow::Result<()> {
    use dialoguer::Select;

    print_banner();
    let theme = theme();

    prompt_greeting(&theme)?;

    let mut workflow = Workflow::new(build_config(options)?);
    workflow.load(prompt_dataset(&theme, data)?);
    prompt_selection(&theme, &mut workflow)?;
    let mut trained = train_and_show(&mut workflow)?;

    loop {
        let mut items = Vec::new();
        if trained {
            items.push("Predict a record");
        }
        items.extend(["Change features", "Load another file", "Exit"]);

        println!();
        let sel = Select::with_theme(&theme)
            .with_prompt("What would you like to do")
            .items(&items)
            .default(0)
            .interact_opt()?;

        match sel.map(|i| items[i]) {
            Some("Predict a record") => {
                let input = prompt_record(&theme, &workflow)?;
                let prediction = workflow.predict(&input)?;
                section("Prediction");
                indented(&report::render_prediction(&input, &prediction));
            }
            Some("Change features") => {
                prompt_selection(&theme, &mut workflow)?;
                trained = train_and_show(&mut workflow)?;
            }
            Some("Load another file") => {
                workflow.load(prompt_dataset(&theme, None)?);
                prompt_selection(&theme, &mut workflow)?;
                trained = train_and_show(&mut workflow)?;
            }
            _ => {
                println!();
                println!("  {}", dim("goodbye"));
                println!();
                break;
            }
        }
    }

    Ok(())
}
