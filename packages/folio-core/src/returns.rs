//! Returns engine.
//!
//! Converts the aligned price matrix into periodic returns and composes them
//! into a portfolio-level cumulative return under fixed weights.
//!
//! The portfolio return at each period is the weight-fraction sum of
//! per-instrument returns with the weights reapplied every period. This
//! treats allocations as renormalized each period rather than drifting with
//! instrument performance as they would under buy-and-hold; it is the defined
//! semantics of the engine, not an approximation to correct.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::types::{AlignedPriceMatrix, WeightVector};
use crate::{Error, Result};

/// Per-instrument periodic returns on a shared date index.
///
/// Column-major: `columns[i][t]` is the return of `symbols[i]` over the
/// period ending on `dates[t]`. One fewer row than the source matrix; the
/// first price row has no prior value.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReturnMatrix {
    pub symbols: Vec<String>,
    pub dates: Vec<NaiveDate>,
    pub columns: Vec<Vec<f64>>,
}

impl ReturnMatrix {
    /// Number of return periods.
    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    pub fn column(&self, symbol: &str) -> Option<&[f64]> {
        let idx = self.symbols.iter().position(|s| s == symbol)?;
        Some(&self.columns[idx])
    }
}

/// Periodic percentage-change returns per instrument:
/// `(price[t] - price[t-1]) / price[t-1]`, first row dropped.
pub fn periodic_returns(matrix: &AlignedPriceMatrix) -> Result<ReturnMatrix> {
    if matrix.len() < 2 {
        return Err(Error::InsufficientData(
            "need at least 2 aligned price rows to compute returns".to_string(),
        ));
    }

    let mut columns = vec![Vec::with_capacity(matrix.len() - 1); matrix.instrument_count()];
    for t in 1..matrix.len() {
        for (i, column) in columns.iter_mut().enumerate() {
            let prev = matrix.rows[t - 1][i];
            let curr = matrix.rows[t][i];
            column.push((curr - prev) / prev);
        }
    }

    Ok(ReturnMatrix {
        symbols: matrix.symbols.clone(),
        dates: matrix.dates[1..].to_vec(),
        columns,
    })
}

/// Portfolio periodic return per row: the sum of each instrument's return
/// weighted by its allocation fraction. Instruments that dropped out of
/// alignment are absent from the matrix, so their weight contributes
/// nothing.
pub fn portfolio_returns(returns: &ReturnMatrix, weights: &WeightVector) -> Vec<f64> {
    let fractions: Vec<f64> = returns
        .symbols
        .iter()
        .map(|s| weights.fraction(s))
        .collect();

    (0..returns.len())
        .map(|t| {
            returns
                .columns
                .iter()
                .zip(&fractions)
                .map(|(column, w)| column[t] * w)
                .sum()
        })
        .collect()
}

/// Cumulative compounded return: `cumulative[t] = prod(1 + r[k], k <= t) - 1`.
pub fn cumulative_returns(returns: &[f64]) -> Vec<f64> {
    let mut out = Vec::with_capacity(returns.len());
    let mut acc = 1.0;
    for r in returns {
        acc *= 1.0 + r;
        out.push(acc - 1.0);
    }
    out
}
