//! Daily demand dataset preparation CLI.
//!
//! Usage:
//! ```bash
//! # Print the walk-forward fold schedule
//! demand-prep folds --train-start 2017-01-07 --test-start 2018-06-02 --test-end 2018-08-25
//!
//! # Build train/valid/test feature tables
//! demand-prep build --config config/default.toml --data data/olist --output datasets
//!
//! # Check the resampled daily series
//! demand-prep validate --config config/default.toml --data data/olist
//!
//! # Score a forecast
//! demand-prep score --input forecast.csv --actual payment_value --predicted forecast
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use polars::prelude::*;
use tracing::info;

use demand_prep::data::OrderTablesLoader;
use demand_prep::dataset::{DatasetBuilder, DatasetConfig, DatasetSplits};
use demand_prep::metrics::MetricsCalculator;
use demand_prep::validation::SeriesIntegrityValidator;
use demand_prep::walkforward::{generate_folds, DEFAULT_STEP_WEEKS, MAX_STEP_WEEKS};

#[derive(Parser)]
#[command(name = "demand-prep")]
#[command(about = "Leakage-safe feature datasets for daily demand forecasting")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Csv,
    Parquet,
}

impl OutputFormat {
    fn extension(self) -> &'static str {
        match self {
            OutputFormat::Csv => "csv",
            OutputFormat::Parquet => "parquet",
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Print the walk-forward fold schedule
    Folds {
        /// First training day (YYYY-MM-DD)
        #[arg(long)]
        train_start: String,

        /// First test day of the first fold (YYYY-MM-DD)
        #[arg(long)]
        test_start: String,

        /// Last day to cover with test windows (YYYY-MM-DD)
        #[arg(long)]
        test_end: String,

        /// Weeks between consecutive folds
        #[arg(
            long,
            default_value_t = DEFAULT_STEP_WEEKS,
            value_parser = clap::value_parser!(i64).range(1..=MAX_STEP_WEEKS)
        )]
        step_weeks: i64,

        /// Print folds as JSON
        #[arg(long)]
        json: bool,
    },

    /// Build train/valid/test feature tables
    Build {
        /// Path to configuration file
        #[arg(short, long)]
        config: PathBuf,

        /// Directory holding the CSV exports
        #[arg(short, long, default_value = "data/olist")]
        data: PathBuf,

        /// Output directory for the splits
        #[arg(short, long, default_value = "datasets")]
        output: PathBuf,

        /// Output file format
        #[arg(short, long, value_enum, default_value = "csv")]
        format: OutputFormat,

        /// Write one set of splits per walk-forward fold
        #[arg(long)]
        walk_forward: bool,
    },

    /// Check the resampled daily series for gaps and duplicates
    Validate {
        /// Path to configuration file
        #[arg(short, long)]
        config: PathBuf,

        /// Directory holding the CSV exports
        #[arg(short, long, default_value = "data/olist")]
        data: PathBuf,
    },

    /// Score a forecast against actual values
    Score {
        /// CSV file with actual and predicted columns
        #[arg(short, long)]
        input: PathBuf,

        /// Column of actual values
        #[arg(long)]
        actual: String,

        /// Column of predicted values
        #[arg(long)]
        predicted: String,

        /// Print metrics as JSON
        #[arg(long)]
        json: bool,
    },
}

fn parse_date(value: &str, field: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .with_context(|| format!("Invalid {} date format: {}", field, value))
}

fn load_builder(config_path: &Path, data_dir: &Path) -> Result<(DatasetBuilder, LazyFrame)> {
    let config = DatasetConfig::from_toml_file(config_path)
        .with_context(|| format!("Failed to load {}", config_path.display()))?;
    let loader = OrderTablesLoader::new(data_dir, config.tables.clone());
    let builder = DatasetBuilder::new(config).context("Invalid configuration")?;
    let raw = loader
        .load_transactions()
        .with_context(|| format!("Failed to read tables from {}", data_dir.display()))?;
    Ok((builder, raw))
}

fn write_frame(df: &mut DataFrame, path: &Path, format: OutputFormat) -> Result<()> {
    let file = fs::File::create(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    match format {
        OutputFormat::Csv => {
            CsvWriter::new(file).include_header(true).finish(df)?;
        }
        OutputFormat::Parquet => {
            ParquetWriter::new(file)
                .with_compression(ParquetCompression::Zstd(Some(ZstdLevel::try_new(3)?)))
                .finish(df)?;
        }
    }
    Ok(())
}

fn write_splits(splits: &DatasetSplits, dir: &Path, format: OutputFormat) -> Result<()> {
    fs::create_dir_all(dir)?;
    for (name, split) in splits.named() {
        let path = dir.join(format!("{}.{}", name, format.extension()));
        let mut df = split.clone().into_frame();
        write_frame(&mut df, &path, format)?;
        println!("  {}: {} rows -> {}", name, split.len(), path.display());
    }
    Ok(())
}

fn cmd_folds(
    train_start: &str,
    test_start: &str,
    test_end: &str,
    step_weeks: i64,
    json: bool,
) -> Result<()> {
    let folds = generate_folds(
        parse_date(train_start, "train start")?,
        parse_date(test_start, "test start")?,
        parse_date(test_end, "test end")?,
        step_weeks,
    );

    if json {
        println!("{}", serde_json::to_string_pretty(&folds)?);
        return Ok(());
    }

    println!("fold  train_start  train_end   valid_start  valid_end   test_start  test_end");
    for fold in &folds {
        println!(
            "{:>4}  {}   {}  {}   {}  {}  {}",
            fold.fold,
            fold.train_start,
            fold.train_end,
            fold.valid_start,
            fold.valid_end,
            fold.test_start,
            fold.test_end
        );
    }
    Ok(())
}

fn cmd_build(
    config: &Path,
    data: &Path,
    output: &Path,
    format: OutputFormat,
    walk_forward: bool,
) -> Result<()> {
    let (builder, raw) = load_builder(config, data)?;

    if walk_forward {
        let folds = builder.build_walk_forward(raw)?;
        for fold in &folds {
            println!(
                "Fold {} (test {} to {}):",
                fold.window.fold, fold.window.test_start, fold.window.test_end
            );
            write_splits(&fold.splits, &output.join(format!("fold_{}", fold.window.fold)), format)?;
        }
        info!("Wrote {} folds to {}", folds.len(), output.display());
    } else {
        let splits = builder.build(raw)?;
        println!("Splits:");
        write_splits(&splits, output, format)?;
    }

    Ok(())
}

fn cmd_validate(config: &Path, data: &Path) -> Result<()> {
    let (builder, raw) = load_builder(config, data)?;
    let daily = builder.daily_counts(raw)?;
    let report = SeriesIntegrityValidator::new().validate_frame(&daily, &builder.config().columns)?;

    println!("{}", report.summary());
    for check in &report.checks {
        let status = if check.passed { "PASS" } else { "FAIL" };
        println!("  [{}] {}: {}", status, check.name, check.message);
        if let Some(details) = &check.details {
            println!("         {}", details);
        }
    }

    if !report.all_passed() {
        bail!("{} integrity checks failed", report.failed_checks().len());
    }
    Ok(())
}

fn cmd_score(input: &Path, actual: &str, predicted: &str, json: bool) -> Result<()> {
    let df = LazyCsvReader::new(input)
        .with_has_header(true)
        .finish()?
        .select([
            col(actual).cast(DataType::Float64),
            col(predicted).cast(DataType::Float64),
        ])
        .drop_nulls(None)
        .collect()
        .with_context(|| format!("Failed to read {}", input.display()))?;

    let actual_values: Vec<f64> = df.column(actual)?.f64()?.into_no_null_iter().collect();
    let predicted_values: Vec<f64> = df.column(predicted)?.f64()?.into_no_null_iter().collect();
    let metrics = MetricsCalculator::calculate(&actual_values, &predicted_values)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&metrics)?);
    } else {
        println!("{}", metrics.summary());
    }
    Ok(())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("demand_prep=info".parse()?),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Folds {
            train_start,
            test_start,
            test_end,
            step_weeks,
            json,
        } => cmd_folds(&train_start, &test_start, &test_end, step_weeks, json)?,
        Commands::Build {
            config,
            data,
            output,
            format,
            walk_forward,
        } => cmd_build(&config, &data, &output, format, walk_forward)?,
        Commands::Validate { config, data } => cmd_validate(&config, &data)?,
        Commands::Score {
            input,
            actual,
            predicted,
            json,
        } => cmd_score(&input, &actual, &predicted, json)?,
    }

    Ok(())
}
