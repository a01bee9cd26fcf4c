//! Folio CLI - Command line interface for the portfolio analytics engine.
//!
//! This binary provides JSON output for integration with a dashboard layer.
//! Price data comes from a CSV data directory through the file-backed feed
//! adapter; network providers stay outside this binary.

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use folio_core::feed::CsvFeed;
use folio_core::{
    align, fetch_prices, pipeline, AnalysisInputs, ApiResponse, Instrument, MatrixSnapshot,
    WeightVector,
};

#[derive(Parser)]
#[command(name = "folio")]
#[command(about = "Portfolio analytics CLI - performance, risk, and growth projection")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full analysis and print the report
    Analyze {
        /// Comma-separated asset symbols (crypto uses the -USD suffix)
        #[arg(short, long)]
        assets: String,
        /// Comma-separated weight percentages, matching the asset order
        #[arg(short, long)]
        weights: String,
        /// Start date of the historical window (YYYY-MM-DD)
        #[arg(short, long)]
        start: NaiveDate,
        /// Initial investment amount
        #[arg(short, long, default_value = "10000")]
        capital: f64,
        /// Expected nominal annual growth rate (%)
        #[arg(long, default_value = "7.0")]
        growth_rate: f64,
        /// Expected annual inflation rate (%)
        #[arg(long, default_value = "2.0")]
        inflation: f64,
        /// Risk-free rate (%)
        #[arg(long, default_value = "2.0")]
        risk_free: f64,
        /// Risk tolerance label (informational)
        #[arg(long)]
        risk_tolerance: Option<String>,
        /// Directory holding the CSV price files
        #[arg(short, long, default_value = "data")]
        data_dir: String,
        /// Also write the aligned matrix snapshot
        #[arg(long)]
        snapshot: bool,
    },
    /// Ingest and align only, printing the aligned price matrix
    Align {
        /// Comma-separated asset symbols
        #[arg(short, long)]
        assets: String,
        /// Start date of the historical window (YYYY-MM-DD)
        #[arg(short, long)]
        start: NaiveDate,
        /// Directory holding the CSV price files
        #[arg(short, long, default_value = "data")]
        data_dir: String,
    },
}

fn main() {
    let cli = Cli::parse();

    let output = match cli.command {
        Commands::Analyze {
            assets,
            weights,
            start,
            capital,
            growth_rate,
            inflation,
            risk_free,
            risk_tolerance,
            data_dir,
            snapshot,
        } => handle_analyze(
            &assets,
            &weights,
            start,
            capital,
            growth_rate,
            inflation,
            risk_free,
            risk_tolerance,
            &data_dir,
            snapshot,
        ),
        Commands::Align {
            assets,
            start,
            data_dir,
        } => handle_align(&assets, start, &data_dir),
    };

    println!("{}", output);
}

fn parse_weights(assets: &[Instrument], raw: &str) -> Result<WeightVector, String> {
    let values: Result<Vec<f64>, _> = raw.split(',').map(|w| w.trim().parse::<f64>()).collect();
    let values = values.map_err(|e| format!("invalid weight: {e}"))?;

    if values.len() != assets.len() {
        return Err(format!(
            "{} weights given for {} assets",
            values.len(),
            assets.len()
        ));
    }

    Ok(WeightVector::new(
        assets
            .iter()
            .map(|a| a.symbol.clone())
            .zip(values)
            .collect(),
    ))
}

#[allow(clippy::too_many_arguments)]
fn handle_analyze(
    assets: &str,
    weights: &str,
    start: NaiveDate,
    capital: f64,
    growth_rate: f64,
    inflation: f64,
    risk_free: f64,
    risk_tolerance: Option<String>,
    data_dir: &str,
    snapshot: bool,
) -> String {
    let instruments = Instrument::parse_list(assets);
    if instruments.is_empty() {
        return serde_json::to_string_pretty(&ApiResponse::<()>::err("no assets given")).unwrap();
    }

    let weights = match parse_weights(&instruments, weights) {
        Ok(w) => w,
        Err(e) => return serde_json::to_string_pretty(&ApiResponse::<()>::err(e)).unwrap(),
    };

    let inputs = AnalysisInputs {
        initial_capital: capital,
        growth_rate_pct: growth_rate,
        inflation_rate_pct: inflation,
        risk_free_rate_pct: risk_free,
        risk_tolerance,
        start_date: start,
    };

    let feed = CsvFeed::new(data_dir);

    if snapshot {
        if let Err(e) = write_snapshot(&feed, &instruments, start) {
            return serde_json::to_string_pretty(&ApiResponse::<()>::err(e)).unwrap();
        }
    }

    match pipeline::run(&feed, &instruments, &weights, &inputs) {
        Ok(report) => serde_json::to_string_pretty(&ApiResponse::ok(report)).unwrap(),
        Err(e) => serde_json::to_string_pretty(&ApiResponse::<()>::err(e.to_string())).unwrap(),
    }
}

fn write_snapshot(
    feed: &CsvFeed,
    instruments: &[Instrument],
    start: NaiveDate,
) -> Result<(), String> {
    let (series, _) = fetch_prices(feed, instruments, start).map_err(|e| e.to_string())?;
    let matrix = align(&series);
    MatrixSnapshot::new().save(&matrix).map_err(|e| e.to_string())
}

fn handle_align(assets: &str, start: NaiveDate, data_dir: &str) -> String {
    let instruments = Instrument::parse_list(assets);
    if instruments.is_empty() {
        return serde_json::to_string_pretty(&ApiResponse::<()>::err("no assets given")).unwrap();
    }

    let feed = CsvFeed::new(data_dir);
    match fetch_prices(&feed, &instruments, start) {
        Ok((series, failures)) => {
            let matrix = align(&series);
            serde_json::to_string_pretty(&ApiResponse::ok(serde_json::json!({
                "matrix": matrix,
                "feed_failures": failures,
            })))
            .unwrap()
        }
        Err(e) => serde_json::to_string_pretty(&ApiResponse::<()>::err(e.to_string())).unwrap(),
    }
}
