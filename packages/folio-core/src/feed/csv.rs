//! File-backed feed adapter.
//!
//! Reads fixture files from a data directory so the CLI runs without network
//! access. Equity/bond files are named `<SYMBOL>.csv` with `date,close` rows;
//! crypto files are named after the exchange pair (`BTCUSDT.csv`) with
//! `open_time_ms,open,high,low,close,volume` rows. A `#`-prefixed or header
//! line is skipped.

use std::fs;
use std::path::PathBuf;

use chrono::NaiveDate;

use super::{FeedError, Kline, PriceFeed};
use crate::types::{Instrument, PricePoint, PriceSeries};

/// Feed adapter backed by CSV files in a directory.
#[derive(Debug, Clone)]
pub struct CsvFeed {
    dir: PathBuf,
}

impl CsvFeed {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn read_file(&self, name: &str) -> Result<String, FeedError> {
        let path = self.dir.join(format!("{name}.csv"));
        if !path.exists() {
            return Err(FeedError::SymbolNotFound(name.to_string()));
        }
        fs::read_to_string(&path)
            .map_err(|e| FeedError::Unavailable(format!("{}: {e}", path.display())))
    }
}

fn data_lines(content: &str) -> impl Iterator<Item = &str> {
    content
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with('#'))
        // Tolerate a header row
        .filter(|l| l.chars().next().map(|c| c.is_ascii_digit()).unwrap_or(false))
}

fn parse_price_row(line: &str, symbol: &str) -> Result<PricePoint, FeedError> {
    let mut cols = line.split(',').map(str::trim);
    let date = cols
        .next()
        .and_then(|c| NaiveDate::parse_from_str(c, "%Y-%m-%d").ok())
        .ok_or_else(|| FeedError::Malformed(format!("{symbol}: bad date in '{line}'")))?;
    let close = cols
        .next()
        .and_then(|c| c.parse::<f64>().ok())
        .ok_or_else(|| FeedError::Malformed(format!("{symbol}: bad close in '{line}'")))?;
    Ok(PricePoint { date, close })
}

fn parse_kline_row(line: &str, symbol: &str) -> Result<Kline, FeedError> {
    let cols: Vec<&str> = line.split(',').map(str::trim).collect();
    if cols.len() < 6 {
        return Err(FeedError::Malformed(format!(
            "{symbol}: expected 6 kline columns in '{line}'"
        )));
    }
    let open_time_ms = cols[0]
        .parse::<i64>()
        .map_err(|_| FeedError::Malformed(format!("{symbol}: bad open time in '{line}'")))?;
    let mut nums = [0.0f64; 5];
    for (i, raw) in cols[1..6].iter().enumerate() {
        nums[i] = raw
            .parse::<f64>()
            .map_err(|_| FeedError::Malformed(format!("{symbol}: bad number in '{line}'")))?;
    }
    Ok(Kline {
        open_time_ms,
        open: nums[0],
        high: nums[1],
        low: nums[2],
        close: nums[3],
        volume: nums[4],
    })
}

impl PriceFeed for CsvFeed {
    fn fetch_batch(
        &self,
        instruments: &[Instrument],
        start: NaiveDate,
    ) -> Result<Vec<PriceSeries>, FeedError> {
        let mut out = Vec::with_capacity(instruments.len());
        for instrument in instruments {
            let content = self.read_file(&instrument.symbol)?;
            let mut points = Vec::new();
            for line in data_lines(&content) {
                let point = parse_price_row(line, &instrument.symbol)?;
                if point.date >= start {
                    points.push(point);
                }
            }
            out.push(PriceSeries::new(instrument.symbol.clone(), points));
        }
        Ok(out)
    }

    fn fetch_klines(
        &self,
        instrument: &Instrument,
        start: NaiveDate,
    ) -> Result<Vec<Kline>, FeedError> {
        let pair = instrument
            .exchange_pair()
            .ok_or_else(|| FeedError::SymbolNotFound(instrument.symbol.clone()))?;
        let content = self.read_file(&pair)?;
        let mut klines = Vec::new();
        for line in data_lines(&content) {
            let kline = parse_kline_row(line, &instrument.symbol)?;
            if kline.date().map(|d| d >= start).unwrap_or(false) {
                klines.push(kline);
            }
        }
        Ok(klines)
    }
}
