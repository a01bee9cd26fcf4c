//! Growth projector.
//!
//! Builds two value trajectories over the portfolio's aligned return dates:
//! the realized value of the initial capital under actual cumulative
//! portfolio returns, and the expected value under a constant annual growth
//! rate adjusted for inflation. The expected curve depends only on elapsed
//! calendar days, not on historical returns.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::types::AnalysisInputs;

/// Average calendar days per year, leap years included.
const DAYS_PER_YEAR: f64 = 365.25;

/// Realized vs. expected investment value on a shared date index.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GrowthProjection {
    pub dates: Vec<NaiveDate>,
    /// Initial capital compounded by the actual cumulative portfolio return
    pub realized: Vec<f64>,
    /// Initial capital compounded at the inflation-adjusted rate over
    /// elapsed calendar days
    pub expected: Vec<f64>,
}

/// Inflation-adjusted annual growth rate as a fraction:
/// `(nominal% - inflation%) / 100`.
pub fn real_rate(nominal_pct: f64, inflation_pct: f64) -> f64 {
    (nominal_pct - inflation_pct) / 100.0
}

/// Expected value of `capital` after `elapsed_days` at `rate` per year.
pub fn expected_value(capital: f64, rate: f64, elapsed_days: f64) -> f64 {
    capital * (1.0 + rate).powf(elapsed_days / DAYS_PER_YEAR)
}

/// Project both trajectories over the aligned return dates.
///
/// `first_date` is the first date of the aligned price matrix (the day the
/// capital is deployed); `dates` and `cumulative` are the portfolio's return
/// index and cumulative returns, one entry per period.
pub fn project_growth(
    first_date: NaiveDate,
    dates: &[NaiveDate],
    cumulative: &[f64],
    inputs: &AnalysisInputs,
) -> GrowthProjection {
    let rate = real_rate(inputs.growth_rate_pct, inputs.inflation_rate_pct);

    let realized = cumulative
        .iter()
        .map(|c| inputs.initial_capital * (1.0 + c))
        .collect();
    let expected = dates
        .iter()
        .map(|date| {
            let elapsed = (*date - first_date).num_days() as f64;
            expected_value(inputs.initial_capital, rate, elapsed)
        })
        .collect();

    GrowthProjection {
        dates: dates.to_vec(),
        realized,
        expected,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn inputs() -> AnalysisInputs {
        AnalysisInputs {
            initial_capital: 1000.0,
            growth_rate_pct: 7.0,
            inflation_rate_pct: 2.0,
            risk_free_rate_pct: 2.0,
            risk_tolerance: None,
            start_date: d(2022, 6, 1),
        }
    }

    #[test]
    fn test_real_rate() {
        assert_relative_eq!(real_rate(7.0, 2.0), 0.05, epsilon = 1e-12);
        assert_relative_eq!(real_rate(2.0, 3.0), -0.01, epsilon = 1e-12);
    }

    #[test]
    fn test_expected_value_one_year() {
        // 1000 at 5% real over exactly one average year = 1050
        let value = expected_value(1000.0, 0.05, 365.25);
        assert_relative_eq!(value, 1050.0, epsilon = 1e-9);
    }

    #[test]
    fn test_project_growth_trajectories() {
        let first = d(2024, 1, 1);
        let dates = vec![d(2024, 1, 2), d(2024, 7, 1), d(2025, 1, 1)];
        let cumulative = vec![0.01, 0.03, 0.08];

        let projection = project_growth(first, &dates, &cumulative, &inputs());

        assert_eq!(projection.dates, dates);
        assert_relative_eq!(projection.realized[0], 1010.0, epsilon = 1e-9);
        assert_relative_eq!(projection.realized[2], 1080.0, epsilon = 1e-9);

        // Expected value is computed per date from elapsed days
        assert_relative_eq!(
            projection.expected[0],
            expected_value(1000.0, 0.05, 1.0),
            epsilon = 1e-9
        );
        assert_relative_eq!(
            projection.expected[2],
            expected_value(1000.0, 0.05, 366.0),
            epsilon = 1e-9
        );
        // Intermediate point sits strictly between the endpoints
        assert!(projection.expected[1] > projection.expected[0]);
        assert!(projection.expected[1] < projection.expected[2]);
    }

    #[test]
    fn test_projection_shares_return_index() {
        let first = d(2024, 1, 1);
        let dates = vec![d(2024, 1, 2), d(2024, 1, 3)];
        let cumulative = vec![0.05, 0.155];

        let projection = project_growth(first, &dates, &cumulative, &inputs());
        assert_eq!(projection.realized.len(), projection.expected.len());
        assert_eq!(projection.dates.len(), cumulative.len());
    }
}
