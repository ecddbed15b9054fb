//! Neurocog CLI Module
//!
//! Command-line interface for training, batch and single-record prediction,
//! and inspecting the published artifacts.

use clap::{Parser, Subcommand};
use colored::*;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::config::PipelineConfig;
use crate::error::NeurocogError;
use crate::inference::PredictionRecord;
use crate::pipeline::CognitivePipeline;

// ─── Styling helpers ───────────────────────────────────────────────────────────

const W: usize = 58; // box inner width

fn dim(s: &str) -> ColoredString   { s.truecolor(100, 100, 100) }
fn accent(s: &str) -> ColoredString { s.truecolor(120, 170, 255) }
fn muted(s: &str) -> ColoredString  { s.truecolor(140, 140, 140) }
fn ok(s: &str) -> ColoredString     { s.truecolor(100, 210, 120) }

fn line_box_top()    { println!("  {}", dim("┌─────────────────────────────────────────────────────────┐")); }
fn line_box_bottom() { println!("  {}", dim("└─────────────────────────────────────────────────────────┘")); }
fn line_box_sep()    { println!("  {}", dim("├─────────────────────────────────────────────────────────┤")); }

fn line_box(content: &str) {
    let visible_len = strip_ansi(content).chars().count();
    let pad = W.saturating_sub(visible_len);
    println!("  {}  {}{} {}", dim("│"), content, " ".repeat(pad), dim("│"));
}

fn line_box_center(content: &str) {
    let visible_len = strip_ansi(content).chars().count();
    let total_pad = W.saturating_sub(visible_len);
    let left = total_pad / 2;
    let right = total_pad - left;
    println!("  {}  {}{}{} {}", dim("│"), " ".repeat(left), content, " ".repeat(right), dim("│"));
}

fn line_box_empty() { line_box(""); }

fn strip_ansi(s: &str) -> String {
    let mut out = String::new();
    let mut in_escape = false;
    for c in s.chars() {
        if c == '\x1b' { in_escape = true; continue; }
        if in_escape { if c == 'm' { in_escape = false; } continue; }
        out.push(c);
    }
    out
}

fn kv(key: &str, val: &str) -> String {
    format!("{} {}", muted(key), val.white())
}

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

// ─── CLI definition ────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "neurocog")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Cognitive-status prediction from structured clinical features")]
#[command(long_about = None)]
pub struct Cli {
    /// Directory holding published model artifacts
    #[arg(long, global = true, env = "NEUROCOG_MODEL_DIR")]
    pub model_dir: Option<PathBuf>,

    /// JSON pipeline configuration
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Train all models on a labelled CSV and publish a new version
    Train {
        /// Input CSV with a header row
        #[arg(short, long)]
        data: PathBuf,
    },

    /// Predict every row of a CSV
    Predict {
        /// Input CSV with a header row
        #[arg(short, long)]
        data: PathBuf,

        /// Model to use (svm, naiveBayes, decisionTree); defaults to the best
        #[arg(short, long)]
        model: Option<String>,

        /// Write predictions as JSON instead of printing a table
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Predict a single JSON record
    PredictOne {
        /// Record as a JSON object, e.g. '{"NACCID":"A1","AGE":70,...}'
        #[arg(short, long)]
        record: String,

        /// Model to use; defaults to the best
        #[arg(short, long)]
        model: Option<String>,
    },

    /// Show the published version and its metrics
    Info,
}

/// Resolve the pipeline configuration from `--config` and `--model-dir`
pub fn load_config(config: Option<&Path>, model_dir: Option<&Path>) -> anyhow::Result<PipelineConfig> {
    let mut config = match config {
        Some(path) => PipelineConfig::from_file(path)?,
        None => PipelineConfig::default(),
    };
    if let Some(dir) = model_dir {
        config = config.with_model_dir(dir);
    }
    Ok(config)
}

/// Dispatch a parsed command line
pub fn run(cli: Cli) -> anyhow::Result<()> {
    let config = load_config(cli.config.as_deref(), cli.model_dir.as_deref())?;
    let pipeline = CognitivePipeline::open(config)?;

    match cli.command {
        Commands::Train { data } => cmd_train(&pipeline, &data),
        Commands::Predict { data, model, output } => {
            cmd_predict(&pipeline, &data, model.as_deref(), output.as_deref())
        }
        Commands::PredictOne { record, model } => cmd_predict_one(&pipeline, &record, model.as_deref()),
        Commands::Info => cmd_info(&pipeline),
    }
}

// ─── Commands ──────────────────────────────────────────────────────────────────

pub fn cmd_train(pipeline: &CognitivePipeline, data_path: &Path) -> anyhow::Result<()> {
    section("Train");

    step_run(&format!("Training on {}", data_path.display()));
    let start = Instant::now();
    let report = pipeline.train_csv(data_path)?;
    step_done(&format!("{:?}", start.elapsed()));

    println!();
    println!(
        "  {:<16} {:>10} {:>10} {:>10} {:>10}",
        muted("Model"),
        muted("Accuracy"),
        muted("Precision"),
        muted("Recall"),
        muted("F1")
    );
    println!("  {}", dim(&"─".repeat(60)));
    for (family, m) in &report.models {
        let name = if *family == report.best_model {
            family.name().white().bold()
        } else {
            family.name().normal()
        };
        println!(
            "  {:<16} {:>10.4} {:>10.4} {:>10.4} {:>10.4}",
            name, m.accuracy, m.precision, m.recall, m.f1_score
        );
    }
    println!("  {}", dim(&"─".repeat(60)));

    println!();
    println!("  {} {} {}", ok("best"), report.best_model.name().white().bold(), dim(&report.version.to_string()));
    println!(
        "  {:<16} {}",
        muted("Saved to"),
        pipeline.config().artifacts.model_dir.display().to_string().white()
    );
    println!();
    Ok(())
}

pub fn cmd_predict(
    pipeline: &CognitivePipeline,
    data_path: &Path,
    model: Option<&str>,
    output: Option<&Path>,
) -> anyhow::Result<()> {
    section("Predict");

    step_run(&format!("Predicting {}", data_path.display()));
    let start = Instant::now();
    let records = pipeline.predict_csv(data_path, model)?;
    step_done(&format!("{} rows in {:?}", records.len(), start.elapsed()));

    match output {
        Some(path) => {
            std::fs::write(path, serde_json::to_vec_pretty(&records)?)?;
            println!("  {:<12} {}", muted("Written"), path.display().to_string().white());
        }
        None => print_records(&records),
    }

    println!();
    Ok(())
}

pub fn cmd_predict_one(pipeline: &CognitivePipeline, record: &str, model: Option<&str>) -> anyhow::Result<()> {
    section("Predict");

    let record = parse_record(record)?;
    let prediction = pipeline.predict_single(&record, model)?;
    print_records(std::slice::from_ref(&prediction));

    println!();
    Ok(())
}

pub fn cmd_info(pipeline: &CognitivePipeline) -> anyhow::Result<()> {
    let model_dir = pipeline.config().artifacts.model_dir.display().to_string();

    println!();
    line_box_top();
    line_box_empty();
    line_box_center(&format!("{}", "Neurocog".white().bold()));
    line_box_center(&format!("{}", dim(&format!("v{}", env!("CARGO_PKG_VERSION")))));
    line_box_empty();
    line_box_sep();
    line_box_empty();
    line_box(&kv("Models ", &model_dir));

    match pipeline.repository().load_manifest() {
        Ok(manifest) => {
            line_box(&kv("Version", &manifest.version.to_string()));
            line_box(&kv("Best   ", manifest.best_model.name()));
            line_box(&kv("Trained", &manifest.created_at.format("%Y-%m-%d %H:%M:%S UTC").to_string()));
            line_box(&kv("Inputs ", &manifest.output_columns.len().to_string()));
            line_box_empty();
            line_box_sep();
            line_box_empty();
            for (family, m) in &manifest.models {
                line_box(&kv(&format!("{:<13}", family.name()), &format!("f1 {:.4}  acc {:.4}", m.f1_score, m.accuracy)));
            }
        }
        Err(NeurocogError::ModelNotFound(_)) => {
            line_box(&format!("{}", "no trained model yet".yellow()));
        }
        Err(e) => return Err(e.into()),
    }

    line_box_empty();
    line_box_bottom();
    println!();
    Ok(())
}

fn parse_record(text: &str) -> anyhow::Result<Map<String, Value>> {
    match serde_json::from_str::<Value>(text)? {
        Value::Object(map) => Ok(map),
        other => anyhow::bail!("record must be a JSON object, got {}", other),
    }
}

fn print_records(records: &[PredictionRecord]) {
    println!();
    println!("  {:<16} {:>6} {:>6} {:>10}", muted("NACCID"), muted("AGE"), muted("SEX"), muted("NACCUDSD"));
    println!("  {}", dim(&"─".repeat(42)));
    for r in records {
        println!(
            "  {:<16} {:>6} {:>6} {:>10}",
            r.subject_id,
            r.age,
            r.sex,
            r.diagnosis.to_string().white().bold()
        );
    }
}
