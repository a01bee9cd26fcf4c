//! End-to-end analytics pipeline.
//!
//! One batch, point-in-time computation per invocation: every run starts
//! from the current inputs and a fresh fetch, and nothing survives between
//! runs except the explicit matrix snapshot. Structural failures (weight
//! sum, batch fetch, empty alignment) abort the analytics stage with a typed
//! error; per-instrument fetch failures ride along in the report.

use crate::benchmark::{benchmark_series, fetch_benchmark};
use crate::feed::PriceFeed;
use crate::growth::project_growth;
use crate::ingest::{align, fetch_prices};
use crate::report::{AllocationSlice, AnalysisReport, LabeledSeries};
use crate::returns::{cumulative_returns, periodic_returns, portfolio_returns};
use crate::risk::calculate_risk_metrics;
use crate::types::{AnalysisInputs, Instrument, WeightVector};
use crate::{Error, Result};

/// Run the full analysis: ingest, align, compose returns, compute risk, and
/// project growth.
pub fn run(
    feed: &dyn PriceFeed,
    instruments: &[Instrument],
    weights: &WeightVector,
    inputs: &AnalysisInputs,
) -> Result<AnalysisReport> {
    // The weight invariant gates everything downstream
    weights.validate()?;

    let (series, feed_failures) = fetch_prices(feed, instruments, inputs.start_date)?;
    let matrix = align(&series);
    if matrix.len() < 2 {
        return Err(Error::EmptyAlignedData);
    }

    let returns = periodic_returns(&matrix)?;
    let portfolio = portfolio_returns(&returns, weights);
    let cumulative = cumulative_returns(&portfolio);

    let bench_prices = fetch_benchmark(feed, inputs.start_date)?;
    let bench = benchmark_series(&bench_prices)?;

    let risk = calculate_risk_metrics(&returns, &bench, weights, inputs.risk_free_rate_pct)?;
    let growth = project_growth(matrix.dates[0], &returns.dates, &cumulative, inputs);

    let allocation = matrix
        .symbols
        .iter()
        .filter_map(|symbol| {
            weights.get(symbol).map(|weight_pct| AllocationSlice {
                symbol: symbol.clone(),
                weight_pct,
            })
        })
        .collect();

    Ok(AnalysisReport {
        portfolio_cumulative: LabeledSeries {
            label: "Portfolio".to_string(),
            dates: returns.dates.clone(),
            values: cumulative,
        },
        benchmark_cumulative: LabeledSeries {
            label: bench.symbol.clone(),
            dates: bench.dates,
            values: bench.cumulative,
        },
        risk,
        allocation,
        growth,
        feed_failures,
    })
}
