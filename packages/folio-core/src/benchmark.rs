//! Benchmark comparator.
//!
//! The benchmark index is fetched independently of the portfolio and keeps
//! its own trading calendar: it is not part of the portfolio's alignment
//! join, so it may retain dates the portfolio dropped. Its cumulative return
//! uses the same compounding as the portfolio for a side-by-side overlay.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::feed::PriceFeed;
use crate::returns::cumulative_returns;
use crate::types::{Instrument, PriceSeries};
use crate::{Error, Result};

/// Default benchmark: the S&P 500 index.
pub const BENCHMARK_SYMBOL: &str = "^GSPC";

/// Benchmark returns on the benchmark's own calendar.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BenchmarkSeries {
    pub symbol: String,
    /// Dates of the return periods (first price date dropped)
    pub dates: Vec<NaiveDate>,
    /// Periodic returns
    pub returns: Vec<f64>,
    /// Cumulative compounded returns
    pub cumulative: Vec<f64>,
}

/// Fetch the benchmark's price history through the batch feed.
///
/// The benchmark rides the same atomic batch call as equities, so a failure
/// here is fatal the same way.
pub fn fetch_benchmark(feed: &dyn PriceFeed, start: NaiveDate) -> Result<PriceSeries> {
    let benchmark = Instrument::new(BENCHMARK_SYMBOL);
    let mut batch = feed
        .fetch_batch(&[benchmark], start)
        .map_err(|e| Error::BatchFeed(format!("benchmark: {e}")))?;
    batch
        .pop()
        .ok_or_else(|| Error::BatchFeed("benchmark: empty batch response".to_string()))
}

/// Derive periodic and cumulative returns from the benchmark price series.
pub fn benchmark_series(series: &PriceSeries) -> Result<BenchmarkSeries> {
    if series.len() < 2 {
        return Err(Error::InsufficientData(format!(
            "benchmark {} has {} price points, need at least 2",
            series.symbol,
            series.len()
        )));
    }

    let closes = series.closes();
    let returns: Vec<f64> = closes
        .windows(2)
        .map(|w| (w[1] - w[0]) / w[0])
        .collect();
    let cumulative = cumulative_returns(&returns);

    Ok(BenchmarkSeries {
        symbol: series.symbol.clone(),
        dates: series.points[1..].iter().map(|p| p.date).collect(),
        returns,
        cumulative,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::StaticFeed;
    use crate::types::PricePoint;
    use approx::assert_relative_eq;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, day).unwrap()
    }

    #[test]
    fn test_benchmark_series_compounding() {
        let points = vec![
            PricePoint { date: d(1), close: 4000.0 },
            PricePoint { date: d(2), close: 4400.0 },
            PricePoint { date: d(3), close: 4840.0 },
        ];
        let bench = benchmark_series(&PriceSeries::new(BENCHMARK_SYMBOL, points)).unwrap();

        assert_eq!(bench.dates, vec![d(2), d(3)]);
        assert_relative_eq!(bench.returns[0], 0.10, epsilon = 1e-12);
        assert_relative_eq!(bench.returns[1], 0.10, epsilon = 1e-12);
        assert_relative_eq!(bench.cumulative[1], 0.21, epsilon = 1e-12);
    }

    #[test]
    fn test_benchmark_series_too_short() {
        let points = vec![PricePoint { date: d(1), close: 4000.0 }];
        let result = benchmark_series(&PriceSeries::new(BENCHMARK_SYMBOL, points));
        assert!(matches!(result, Err(Error::InsufficientData(_))));
    }

    #[test]
    fn test_fetch_benchmark() {
        let mut feed = StaticFeed::new();
        feed.add_series(BENCHMARK_SYMBOL, &[(2024, 1, 1, 4000.0), (2024, 1, 2, 4100.0)]);

        let series = fetch_benchmark(&feed, d(1)).unwrap();
        assert_eq!(series.symbol, BENCHMARK_SYMBOL);
        assert_eq!(series.len(), 2);
    }

    #[test]
    fn test_fetch_benchmark_failure_is_fatal() {
        let feed = StaticFeed::new();
        let result = fetch_benchmark(&feed, d(1));
        assert!(matches!(result, Err(Error::BatchFeed(_))));
    }
}
