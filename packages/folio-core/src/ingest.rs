//! Ingestion and alignment.
//!
//! Fetches raw per-instrument series from the feed seam and merges the
//! heterogeneous results onto one fully-populated date index. Alignment is a
//! pure function over in-memory series, independently testable without any
//! feed.

use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::feed::{Kline, PriceFeed};
use crate::types::{AlignedPriceMatrix, Instrument, PricePoint, PriceSeries};
use crate::{Error, Result};

/// Report entry for one instrument whose fetch failed. Isolated: the
/// instrument is excluded and the pipeline continues without it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FeedFailure {
    pub symbol: String,
    pub reason: String,
}

/// Reduce native-interval kline records to one closing price per calendar
/// day. Sub-day resolution is discarded; the last close of a day wins.
pub fn daily_closes(klines: &[Kline]) -> Vec<PricePoint> {
    let mut by_day: BTreeMap<NaiveDate, f64> = BTreeMap::new();
    for kline in klines {
        if let Some(date) = kline.date() {
            by_day.insert(date, kline.close);
        }
    }
    by_day
        .into_iter()
        .map(|(date, close)| PricePoint { date, close })
        .collect()
}

/// Fetch price series for all instruments since `start`.
///
/// Equities and bonds go through the atomic batch call; a batch error is
/// fatal ([`Error::BatchFeed`]). Crypto instruments are fetched one by one
/// and per-symbol failures are collected as [`FeedFailure`] reports instead
/// of aborting the run. A fetch that succeeds but yields no data — an empty
/// batch column or an empty kline response — is reported as a failure too,
/// so it cannot empty the alignment join.
pub fn fetch_prices(
    feed: &dyn PriceFeed,
    instruments: &[Instrument],
    start: NaiveDate,
) -> Result<(Vec<PriceSeries>, Vec<FeedFailure>)> {
    let (cryptos, equities): (Vec<_>, Vec<_>) =
        instruments.iter().cloned().partition(Instrument::is_crypto);

    let mut series = Vec::with_capacity(instruments.len());
    let mut failures = Vec::new();
    if !equities.is_empty() {
        let batch = feed
            .fetch_batch(&equities, start)
            .map_err(|e| Error::BatchFeed(e.to_string()))?;
        for fetched in batch {
            if fetched.is_empty() {
                failures.push(FeedFailure {
                    symbol: fetched.symbol,
                    reason: "no data returned".to_string(),
                });
            } else {
                series.push(fetched);
            }
        }
    }

    for crypto in &cryptos {
        match feed.fetch_klines(crypto, start) {
            Ok(klines) => {
                let points = daily_closes(&klines);
                if points.is_empty() {
                    failures.push(FeedFailure {
                        symbol: crypto.symbol.clone(),
                        reason: "no data returned".to_string(),
                    });
                } else {
                    series.push(PriceSeries::new(crypto.symbol.clone(), points));
                }
            }
            Err(e) => failures.push(FeedFailure {
                symbol: crypto.symbol.clone(),
                reason: e.to_string(),
            }),
        }
    }

    Ok((series, failures))
}

/// Merge per-instrument series onto one date index.
///
/// Outer-join on date, then drop every row with at least one missing cell,
/// which converges to the intersection of all instruments' trading
/// calendars. Keyed by symbol identity, so the result does not depend on the
/// order fetches completed; column order follows input order. Empty input
/// series leave their symbol out of the matrix entirely.
pub fn align(series: &[PriceSeries]) -> AlignedPriceMatrix {
    let tracked: Vec<&PriceSeries> = series.iter().filter(|s| !s.is_empty()).collect();
    if tracked.is_empty() {
        return AlignedPriceMatrix::empty();
    }

    let by_symbol: Vec<BTreeMap<NaiveDate, f64>> = tracked
        .iter()
        .map(|s| s.points.iter().map(|p| (p.date, p.close)).collect())
        .collect();

    let mut all_dates: BTreeSet<NaiveDate> = BTreeSet::new();
    for map in &by_symbol {
        all_dates.extend(map.keys().copied());
    }

    let mut dates = Vec::new();
    let mut rows = Vec::new();
    for date in all_dates {
        let row: Option<Vec<f64>> = by_symbol.iter().map(|m| m.get(&date).copied()).collect();
        if let Some(row) = row {
            dates.push(date);
            rows.push(row);
        }
    }

    AlignedPriceMatrix {
        symbols: tracked.iter().map(|s| s.symbol.clone()).collect(),
        dates,
        rows,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::StaticFeed;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn series(symbol: &str, rows: &[(i32, u32, u32, f64)]) -> PriceSeries {
        let points = rows
            .iter()
            .map(|&(y, m, day, close)| PricePoint {
                date: d(y, m, day),
                close,
            })
            .collect();
        PriceSeries::new(symbol, points)
    }

    #[test]
    fn test_daily_closes_keeps_last_per_day() {
        let day_ms = 86_400_000i64;
        let base = 1_704_067_200_000i64; // 2024-01-01 00:00 UTC
        let klines = vec![
            Kline { open_time_ms: base, open: 0.0, high: 0.0, low: 0.0, close: 10.0, volume: 0.0 },
            Kline { open_time_ms: base + 3_600_000, open: 0.0, high: 0.0, low: 0.0, close: 11.0, volume: 0.0 },
            Kline { open_time_ms: base + day_ms, open: 0.0, high: 0.0, low: 0.0, close: 12.0, volume: 0.0 },
        ];

        let points = daily_closes(&klines);
        assert_eq!(points.len(), 2);
        assert_eq!(points[0], PricePoint { date: d(2024, 1, 1), close: 11.0 });
        assert_eq!(points[1], PricePoint { date: d(2024, 1, 2), close: 12.0 });
    }

    #[test]
    fn test_align_drops_incomplete_rows() {
        // Crypto trades every day, the equity skips the weekend
        let equity = series("AAPL", &[(2024, 1, 5, 100.0), (2024, 1, 8, 102.0)]);
        let crypto = series(
            "BTC-USD",
            &[
                (2024, 1, 5, 40000.0),
                (2024, 1, 6, 40100.0),
                (2024, 1, 7, 40200.0),
                (2024, 1, 8, 40300.0),
            ],
        );

        let matrix = align(&[equity, crypto]);
        assert_eq!(matrix.dates, vec![d(2024, 1, 5), d(2024, 1, 8)]);
        assert_eq!(matrix.rows, vec![vec![100.0, 40000.0], vec![102.0, 40300.0]]);
    }

    #[test]
    fn test_align_no_missing_values() {
        let a = series("A", &[(2024, 1, 1, 1.0), (2024, 1, 2, 2.0), (2024, 1, 4, 4.0)]);
        let b = series("B", &[(2024, 1, 2, 20.0), (2024, 1, 3, 30.0), (2024, 1, 4, 40.0)]);

        let matrix = align(&[a, b]);
        assert!(matrix.rows.iter().all(|row| row.len() == 2));
        assert!(matrix
            .rows
            .iter()
            .all(|row| row.iter().all(|v| v.is_finite())));
        assert_eq!(matrix.dates, vec![d(2024, 1, 2), d(2024, 1, 4)]);
    }

    #[test]
    fn test_align_order_independent() {
        let a = series("A", &[(2024, 1, 1, 1.0), (2024, 1, 2, 2.0)]);
        let b = series("B", &[(2024, 1, 1, 10.0), (2024, 1, 2, 20.0)]);

        let forward = align(&[a.clone(), b.clone()]);
        let reverse = align(&[b, a]);

        assert_eq!(forward.dates, reverse.dates);
        assert_eq!(forward.column("A"), reverse.column("A"));
        assert_eq!(forward.column("B"), reverse.column("B"));
    }

    #[test]
    fn test_align_disjoint_calendars() {
        let a = series("A", &[(2024, 1, 1, 1.0)]);
        let b = series("B", &[(2024, 1, 2, 2.0)]);

        let matrix = align(&[a, b]);
        assert!(matrix.is_empty());
    }

    #[test]
    fn test_fetch_prices_isolates_crypto_failure() {
        let mut feed = StaticFeed::new();
        feed.add_series("AAPL", &[(2024, 1, 1, 100.0), (2024, 1, 2, 101.0)]);
        feed.add_series("MSFT", &[(2024, 1, 1, 200.0), (2024, 1, 2, 202.0)]);
        feed.fail_symbol("BTC-USD");

        let instruments = Instrument::parse_list("AAPL,MSFT,BTC-USD");
        let (series, failures) = fetch_prices(&feed, &instruments, d(2024, 1, 1)).unwrap();

        let matrix = align(&series);
        assert_eq!(matrix.symbols, vec!["AAPL", "MSFT"]);
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].symbol, "BTC-USD");
    }

    #[test]
    fn test_fetch_prices_batch_failure_is_fatal() {
        let mut feed = StaticFeed::new();
        feed.add_series("BTC-USD", &[(2024, 1, 1, 40000.0)]);
        feed.fail_batch();

        let instruments = Instrument::parse_list("AAPL,BTC-USD");
        let result = fetch_prices(&feed, &instruments, d(2024, 1, 1));
        assert!(matches!(result, Err(Error::BatchFeed(_))));
    }

    #[test]
    fn test_fetch_prices_empty_crypto_reported() {
        let mut feed = StaticFeed::new();
        feed.add_series("AAPL", &[(2024, 1, 1, 100.0)]);
        feed.add_klines("ETH-USD", Vec::new());

        let instruments = Instrument::parse_list("AAPL,ETH-USD");
        let (series, failures) = fetch_prices(&feed, &instruments, d(2024, 1, 1)).unwrap();

        assert_eq!(series.len(), 1);
        assert_eq!(failures[0].symbol, "ETH-USD");
        assert_eq!(failures[0].reason, "no data returned");
    }

    #[test]
    fn test_fetch_prices_empty_equity_reported() {
        let mut feed = StaticFeed::new();
        feed.add_series("AAPL", &[(2024, 1, 1, 100.0), (2024, 1, 2, 101.0)]);
        // All of TLT's history predates the window, so its batch column
        // comes back empty
        feed.add_series("TLT", &[(2023, 6, 1, 95.0), (2023, 6, 2, 96.0)]);

        let instruments = Instrument::parse_list("AAPL,TLT");
        let (series, failures) = fetch_prices(&feed, &instruments, d(2024, 1, 1)).unwrap();

        let matrix = align(&series);
        assert_eq!(matrix.symbols, vec!["AAPL"]);
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].symbol, "TLT");
        assert_eq!(failures[0].reason, "no data returned");
    }
}
