//! Sales forecast CLI module
//!
//! Command-line interface for training the pipeline, predicting sales and
//! inspecting data or artifacts.

use clap::{Parser, Subcommand};
use colored::*;
use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::config::{ColumnConfig, ForecastConfig};
use crate::export::{load_artifact, save_outcome};
use crate::inference::InferenceEngine;
use crate::reporting::{CityTier, GroupBy, PredictionTable, RecordFilter};
use crate::training::TrainEngine;
use crate::utils::{DataLoader, TargetRequirement};

// ─── Styling helpers ───────────────────────────────────────────────────────────

fn dim(s: &str) -> ColoredString { s.truecolor(100, 100, 100) }
fn accent(s: &str) -> ColoredString { s.truecolor(120, 170, 255) }
fn muted(s: &str) -> ColoredString { s.truecolor(140, 140, 140) }
fn ok(s: &str) -> ColoredString { s.truecolor(100, 210, 120) }

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

fn money(value: f64) -> String {
    format!("{:.2}", value)
}

// ─── CLI definition ────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "sales-forecast")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Train and serve a sales forecasting pipeline")]
#[command(long_about = None)]
pub struct Cli {
    /// JSON configuration file; flags override its values
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Train the pipeline on historical sales and save the artifact
    Train {
        /// Historical sales (CSV)
        #[arg(short, long)]
        data: Option<PathBuf>,

        /// Artifact output path
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Number of boosted trees
        #[arg(long)]
        n_estimators: Option<usize>,

        /// Seed for the split and the booster
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Predict sales for every row and report totals
    Predict {
        /// Trained pipeline artifact
        #[arg(short, long)]
        model: Option<PathBuf>,

        /// Rows to predict (CSV)
        #[arg(short, long)]
        data: Option<PathBuf>,

        /// Dimension to total by (city, category, month, payment_method, product)
        #[arg(short, long, default_value = "city")]
        group_by: GroupBy,

        /// Keep only this city
        #[arg(long)]
        city: Option<String>,

        /// Keep only this category
        #[arg(long)]
        category: Option<String>,

        /// Keep only this month (1-12)
        #[arg(long)]
        month: Option<u32>,

        /// Keep only this payment method
        #[arg(long)]
        payment_method: Option<String>,

        /// Also print KPIs and city tiers
        #[arg(long)]
        summary: bool,
    },

    /// Show data and artifact information
    Info {
        /// Input data file
        #[arg(short, long)]
        data: Option<PathBuf>,

        /// Trained pipeline artifact
        #[arg(short, long)]
        model: Option<PathBuf>,
    },
}

/// Configuration from the optional file, or defaults
pub fn load_config(path: Option<&Path>) -> anyhow::Result<ForecastConfig> {
    Ok(match path {
        Some(p) => ForecastConfig::from_file(p)?,
        None => ForecastConfig::default(),
    })
}

// ─── Commands ──────────────────────────────────────────────────────────────────

pub fn cmd_train(config: &ForecastConfig) -> anyhow::Result<()> {
    config.validate()?;
    section("Train");

    step_run("Loading data");
    let start = Instant::now();
    let loader = DataLoader::new(config.columns.clone());
    let dataset = loader.load_training(&config.data_path)?;
    step_done(&format!(
        "{} records, {} covariates in {:?}",
        dataset.len(),
        dataset.covariate_names.len(),
        start.elapsed()
    ));

    step_run(&format!(
        "Training {} trees",
        config.training.booster.n_estimators.to_string().cyan()
    ));
    let outcome = TrainEngine::new(config.training.clone()).fit(&dataset)?;
    step_done(&format!("{:.3}s", outcome.summary.training_time_secs));

    step_run("Saving artifact");
    save_outcome(&config.artifact_path, &outcome)?;
    step_done(&config.artifact_path.display().to_string());

    let metrics = &outcome.metrics;
    println!();
    println!("  {} {}", muted("MAE:"), format!("{:.2}", metrics.mae).white().bold());
    println!("  {} {}", muted("R2 Score:"), format!("{:.4}", metrics.r2).white().bold());
    println!(
        "  {}",
        dim(&format!(
            "{} train / {} test rows, RMSE {:.2}",
            outcome.summary.n_train, outcome.summary.n_test, metrics.rmse
        ))
    );

    let importances = outcome.pipeline.feature_importances();
    if !importances.is_empty() {
        section("Top features");
        for (name, importance) in importances.iter().take(5) {
            println!("  {:<28} {}", muted(name), format!("{:.4}", importance).white());
        }
    }

    println!();
    Ok(())
}

pub fn cmd_predict(
    config: &ForecastConfig,
    group_by: GroupBy,
    filter: &RecordFilter,
    summary: bool,
) -> anyhow::Result<()> {
    config.validate()?;
    section("Predict");

    step_run("Loading pipeline");
    let engine = InferenceEngine::load(&config.artifact_path)?;
    step_done(&config.artifact_path.display().to_string());

    step_run("Predicting");
    let start = Instant::now();
    let loader = DataLoader::new(config.columns.clone());
    let table = engine.predict_file(&config.data_path, &loader)?;
    step_done(&format!("{} rows in {:?}", table.len(), start.elapsed()));

    let table = table.filter(filter);
    if !filter.is_all() {
        println!("  {} {}", muted("Filtered to"), format!("{} rows", table.len()).white());
    }

    print_group_totals(&table, group_by);
    if summary {
        print_summary(&table);
    }

    println!();
    Ok(())
}

fn print_group_totals(table: &PredictionTable, group_by: GroupBy) {
    section(&format!("Estimated sales by {}", group_by.name()));
    println!(
        "  {:<24} {:>14} {:>14} {:>8}",
        muted("Group"),
        muted("Predicted"),
        muted("Actual"),
        muted("Rows")
    );
    println!("  {}", dim(&"─".repeat(63)));
    for total in table.group_totals(group_by) {
        println!(
            "  {:<24} {:>14} {:>14} {:>8}",
            total.key.to_string(),
            money(total.predicted).white().bold(),
            money(total.actual),
            total.count
        );
    }
}

fn print_summary(table: &PredictionTable) {
    let kpis = table.kpis();
    section("KPIs");
    println!("  {:<16} {}", muted("Actual sales"), money(kpis.total_actual).white());
    println!("  {:<16} {}", muted("Predicted"), money(kpis.total_predicted).white());
    let ticket = kpis.avg_ticket.map(money).unwrap_or_else(|| "-".to_string());
    println!("  {:<16} {}", muted("Avg ticket"), ticket.white());

    section("City tiers");
    for standing in table.city_tiers() {
        let tier = standing.tier.to_string();
        let tier = match standing.tier {
            CityTier::High => ok(&tier),
            CityTier::Medium => tier.yellow(),
            CityTier::Low => tier.red(),
        };
        println!("  {:<24} {:>14} {}", standing.city, money(standing.actual), tier);
    }
}

pub fn cmd_info(
    columns: &ColumnConfig,
    data_path: Option<&Path>,
    model_path: Option<&Path>,
) -> anyhow::Result<()> {
    if let Some(path) = data_path {
        section("Data Info");

        let loader = DataLoader::new(columns.clone());
        let df = loader.load_frame(path)?;
        let covariates = loader.discover_covariates(&df);
        let missing = loader.missing_columns(&df, TargetRequirement::Required);

        println!("  {:<12} {}", muted("File"), path.display());
        println!("  {:<12} {}", muted("Rows"), df.height());
        println!("  {:<12} {}", muted("Columns"), df.width());
        println!("  {:<12} {:.2} MB", muted("Memory"), df.estimated_size() as f64 / 1024.0 / 1024.0);
        let covariates = if covariates.is_empty() {
            "none".to_string()
        } else {
            covariates.join(", ")
        };
        println!("  {:<12} {}", muted("Covariates"), covariates);
        if !missing.is_empty() {
            println!("  {:<12} {}", muted("Missing"), missing.join(", ").red());
        }
        println!();

        println!("  {:<20} {:<12} {:>6} {:>8}", muted("Column"), muted("Type"), muted("Nulls"), muted("Unique"));
        println!("  {}", dim(&"─".repeat(50)));

        for col in df.get_columns() {
            println!(
                "  {:<20} {:<12} {:>6} {:>8}",
                col.name(),
                format!("{:?}", col.dtype()).truecolor(140, 140, 140),
                col.null_count(),
                col.n_unique().unwrap_or(0)
            );
        }
    }

    if let Some(path) = model_path {
        section("Artifact Info");

        let artifact = load_artifact(path)?;
        let meta = &artifact.metadata;
        println!("  {:<14} {}", muted("File"), path.display());
        println!("  {:<14} {}", muted("Trained at"), meta.trained_at);
        println!("  {:<14} {}", muted("Version"), meta.crate_version);
        println!("  {:<14} {}", muted("Recipe"), meta.recipe_version);
        println!("  {:<14} {}", muted("Trees"), artifact.pipeline.model().n_trees());
        println!("  {:<14} {}", muted("Features"), meta.feature_names.len());
        if !meta.covariate_names.is_empty() {
            println!("  {:<14} {}", muted("Covariates"), meta.covariate_names.join(", "));
        }
        if let Some(metrics) = &meta.metrics {
            println!("  {:<14} {:.2}", muted("MAE"), metrics.mae);
            println!("  {:<14} {:.4}", muted("R2"), metrics.r2);
        }
    }

    println!();
    Ok(())
}
