//! Portfolio risk and performance analytics.
//!
//! Covariance-based portfolio volatility, per-instrument beta against the
//! benchmark, Sharpe ratios, and the correlation matrix. Metrics are
//! recomputed fresh on every run; nothing here persists between runs.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::benchmark::BenchmarkSeries;
use crate::returns::ReturnMatrix;
use crate::types::WeightVector;
use crate::{Error, Result};

/// Variance below this is treated as degenerate (metric undefined).
const VARIANCE_FLOOR: f64 = 1e-12;

/// Per-instrument statistics.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InstrumentStats {
    pub symbol: String,
    /// Mean periodic return
    pub mean_return: f64,
    /// Sample standard deviation of periodic returns
    pub std_dev: f64,
    /// Beta vs. the benchmark; `None` when the benchmark variance is
    /// degenerate or the calendars share too few dates
    pub beta: Option<f64>,
    /// Sharpe ratio; `None` when the instrument's returns have zero
    /// variance (constant price)
    pub sharpe: Option<f64>,
}

/// Scalar risk bundle for one analytics run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RiskMetrics {
    /// Portfolio standard deviation, sqrt(W' Sigma W)
    pub portfolio_std: f64,
    /// Sample standard deviation of the benchmark's periodic returns
    pub benchmark_std: f64,
    /// Per-instrument stats, in matrix column order
    pub instruments: Vec<InstrumentStats>,
    /// Pearson correlation matrix in the same instrument order
    pub correlation: Vec<Vec<f64>>,
}

pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample covariance (n-1 denominator). Zero for fewer than two points.
pub fn sample_cov(xs: &[f64], ys: &[f64]) -> f64 {
    let n = xs.len().min(ys.len());
    if n < 2 {
        return 0.0;
    }
    let mx = mean(&xs[..n]);
    let my = mean(&ys[..n]);
    xs[..n]
        .iter()
        .zip(&ys[..n])
        .map(|(x, y)| (x - mx) * (y - my))
        .sum::<f64>()
        / (n - 1) as f64
}

/// Sample variance (n-1 denominator).
pub fn sample_var(values: &[f64]) -> f64 {
    sample_cov(values, values)
}

/// Sample standard deviation.
pub fn sample_std(values: &[f64]) -> f64 {
    sample_var(values).sqrt()
}

/// Covariance matrix over per-instrument return columns. Symmetric.
pub fn covariance_matrix(columns: &[Vec<f64>]) -> Vec<Vec<f64>> {
    let n = columns.len();
    let mut cov = vec![vec![0.0; n]; n];
    for i in 0..n {
        for j in i..n {
            let value = sample_cov(&columns[i], &columns[j]);
            cov[i][j] = value;
            cov[j][i] = value;
        }
    }
    cov
}

/// Pearson correlation matrix. Symmetric with an exact unit diagonal; pairs
/// involving a zero-variance column get correlation 0.
pub fn correlation_matrix(columns: &[Vec<f64>]) -> Vec<Vec<f64>> {
    let n = columns.len();
    let stds: Vec<f64> = columns.iter().map(|c| sample_std(c)).collect();
    let mut corr = vec![vec![0.0; n]; n];
    for i in 0..n {
        corr[i][i] = 1.0;
        for j in (i + 1)..n {
            let denom = stds[i] * stds[j];
            let value = if denom < VARIANCE_FLOOR {
                0.0
            } else {
                sample_cov(&columns[i], &columns[j]) / denom
            };
            corr[i][j] = value;
            corr[j][i] = value;
        }
    }
    corr
}

/// Portfolio standard deviation sqrt(W' Sigma W) for weight fractions `w`.
pub fn portfolio_std(cov: &[Vec<f64>], w: &[f64]) -> f64 {
    let mut quad = 0.0;
    for (i, wi) in w.iter().enumerate() {
        for (j, wj) in w.iter().enumerate() {
            quad += wi * cov[i][j] * wj;
        }
    }
    // Floating residue can push a degenerate quadratic form slightly negative
    quad.max(0.0).sqrt()
}

/// Beta of an asset vs. the benchmark: Cov(r_a, r_b) / Var(r_b).
///
/// Errors with [`Error::DegenerateVariance`] when the benchmark variance is
/// zero instead of emitting NaN.
pub fn beta(asset: &[f64], benchmark: &[f64]) -> Result<f64> {
    let var = sample_var(benchmark);
    if var < VARIANCE_FLOOR {
        return Err(Error::DegenerateVariance(
            "benchmark returns have zero variance, beta is undefined".to_string(),
        ));
    }
    Ok(sample_cov(asset, benchmark) / var)
}

/// Sharpe ratio per period: (mean(r) - rf/100) / std(r). `None` when the
/// return series has zero variance.
pub fn sharpe_ratio(returns: &[f64], risk_free_rate_pct: f64) -> Option<f64> {
    let std = sample_std(returns);
    if std < VARIANCE_FLOOR {
        return None;
    }
    Some((mean(returns) - risk_free_rate_pct / 100.0) / std)
}

/// Restrict two date-indexed series to the dates they share. Both inputs
/// must be in ascending date order.
fn paired_by_date(
    dates_a: &[NaiveDate],
    values_a: &[f64],
    dates_b: &[NaiveDate],
    values_b: &[f64],
) -> (Vec<f64>, Vec<f64>) {
    let mut out_a = Vec::new();
    let mut out_b = Vec::new();
    let (mut i, mut j) = (0, 0);
    while i < dates_a.len() && j < dates_b.len() {
        match dates_a[i].cmp(&dates_b[j]) {
            std::cmp::Ordering::Less => i += 1,
            std::cmp::Ordering::Greater => j += 1,
            std::cmp::Ordering::Equal => {
                out_a.push(values_a[i]);
                out_b.push(values_b[j]);
                i += 1;
                j += 1;
            }
        }
    }
    (out_a, out_b)
}

/// Compute the full risk bundle for one analytics run.
///
/// The benchmark keeps its own calendar, so each instrument's beta is
/// computed over the dates the two series share. A degenerate benchmark
/// leaves betas `None` without aborting the rest of the analytics.
pub fn calculate_risk_metrics(
    returns: &ReturnMatrix,
    bench: &BenchmarkSeries,
    weights: &WeightVector,
    risk_free_rate_pct: f64,
) -> Result<RiskMetrics> {
    if returns.is_empty() {
        return Err(Error::InsufficientData(
            "no return periods to analyze".to_string(),
        ));
    }

    let cov = covariance_matrix(&returns.columns);
    let fractions: Vec<f64> = returns
        .symbols
        .iter()
        .map(|s| weights.fraction(s))
        .collect();

    let mut instruments = Vec::with_capacity(returns.symbols.len());
    for (i, symbol) in returns.symbols.iter().enumerate() {
        let column = &returns.columns[i];
        let (asset_paired, bench_paired) =
            paired_by_date(&returns.dates, column, &bench.dates, &bench.returns);
        let instrument_beta = if asset_paired.len() < 2 {
            None
        } else {
            match beta(&asset_paired, &bench_paired) {
                Ok(b) => Some(b),
                Err(Error::DegenerateVariance(_)) => None,
                Err(e) => return Err(e),
            }
        };

        instruments.push(InstrumentStats {
            symbol: symbol.clone(),
            mean_return: mean(column),
            std_dev: sample_std(column),
            beta: instrument_beta,
            sharpe: sharpe_ratio(column, risk_free_rate_pct),
        });
    }

    Ok(RiskMetrics {
        portfolio_std: portfolio_std(&cov, &fractions),
        benchmark_std: sample_std(&bench.returns),
        instruments,
        correlation: correlation_matrix(&returns.columns),
    })
}
