//! Core data types for the portfolio analytics engine.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Tolerance applied when checking that allocation weights sum to 100%.
pub const WEIGHT_SUM_TOLERANCE: f64 = 1e-6;

/// Asset category, decides which feed an instrument is fetched from.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AssetClass {
    /// Equities and bonds, fetched as one batch from the fundamental feed.
    EquityBond,
    /// Crypto assets, fetched one symbol at a time from the kline feed.
    Crypto,
}

impl AssetClass {
    /// Classify a symbol. Crypto symbols carry a `-USD` suffix (`BTC-USD`),
    /// everything else is an equity or bond ticker.
    pub fn of(symbol: &str) -> Self {
        if symbol.ends_with("-USD") {
            Self::Crypto
        } else {
            Self::EquityBond
        }
    }
}

/// A tradable asset tracked in the portfolio. Immutable once parsed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Instrument {
    /// Ticker or symbolic asset code (uppercase)
    pub symbol: String,
    /// Asset category
    pub class: AssetClass,
}

impl Instrument {
    /// Create an instrument from a raw symbol, trimming and uppercasing it.
    pub fn new(symbol: &str) -> Self {
        let symbol = symbol.trim().to_uppercase();
        let class = AssetClass::of(&symbol);
        Self { symbol, class }
    }

    /// Parse a comma-separated asset list (`"AAPL, MSFT, BTC-USD, TLT"`).
    /// Empty entries are dropped.
    pub fn parse_list(input: &str) -> Vec<Instrument> {
        input
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(Instrument::new)
            .collect()
    }

    /// Exchange pair used by the kline feed for crypto symbols
    /// (`BTC-USD` -> `BTCUSDT`). `None` for equities and bonds.
    pub fn exchange_pair(&self) -> Option<String> {
        match self.class {
            AssetClass::Crypto => {
                let base = self.symbol.split('-').next().unwrap_or(&self.symbol);
                Some(format!("{}USDT", base))
            }
            AssetClass::EquityBond => None,
        }
    }

    pub fn is_crypto(&self) -> bool {
        self.class == AssetClass::Crypto
    }
}

/// A single closing price observation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub close: f64,
}

/// Ordered daily price series for one instrument.
///
/// Dates are strictly increasing with no duplicates; the constructor sorts
/// incoming points and keeps the last observation per day.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PriceSeries {
    pub symbol: String,
    pub points: Vec<PricePoint>,
}

impl PriceSeries {
    pub fn new(symbol: impl Into<String>, mut points: Vec<PricePoint>) -> Self {
        points.sort_by_key(|p| p.date);
        // Last observation per day wins
        let mut deduped: Vec<PricePoint> = Vec::with_capacity(points.len());
        for p in points {
            match deduped.last_mut() {
                Some(last) if last.date == p.date => *last = p,
                _ => deduped.push(p),
            }
        }
        Self {
            symbol: symbol.into(),
            points: deduped,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Closing prices in date order.
    pub fn closes(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.close).collect()
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.points.first().map(|p| p.date)
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.points.last().map(|p| p.date)
    }
}

/// Price data for all portfolio instruments on a common date index.
///
/// Row-major: `rows[t][i]` is the price of `symbols[i]` on `dates[t]`. Every
/// retained row is fully populated; alignment drops dates where any tracked
/// instrument lacks a price.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AlignedPriceMatrix {
    pub symbols: Vec<String>,
    pub dates: Vec<NaiveDate>,
    pub rows: Vec<Vec<f64>>,
}

impl AlignedPriceMatrix {
    pub fn empty() -> Self {
        Self {
            symbols: Vec::new(),
            dates: Vec::new(),
            rows: Vec::new(),
        }
    }

    /// Number of retained date rows.
    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    pub fn instrument_count(&self) -> usize {
        self.symbols.len()
    }

    /// Price column for one instrument, in date order.
    pub fn column(&self, symbol: &str) -> Option<Vec<f64>> {
        let idx = self.symbols.iter().position(|s| s == symbol)?;
        Some(self.rows.iter().map(|row| row[idx]).collect())
    }
}

/// Target allocation weights in percent, keyed by symbol.
///
/// Preserves insertion order so downstream output is deterministic.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WeightVector {
    entries: Vec<(String, f64)>,
}

impl WeightVector {
    pub fn new(entries: Vec<(String, f64)>) -> Self {
        let entries = entries
            .into_iter()
            .map(|(s, w)| (s.trim().to_uppercase(), w))
            .collect();
        Self { entries }
    }

    /// Weight percentage for a symbol, if present.
    pub fn get(&self, symbol: &str) -> Option<f64> {
        self.entries
            .iter()
            .find(|(s, _)| s == symbol)
            .map(|(_, w)| *w)
    }

    /// Weight as a fraction of 1, zero for symbols without an allocation.
    pub fn fraction(&self, symbol: &str) -> f64 {
        self.get(symbol).unwrap_or(0.0) / 100.0
    }

    pub fn total(&self) -> f64 {
        self.entries.iter().map(|(_, w)| w).sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.entries.iter().map(|(s, w)| (s.as_str(), *w))
    }

    /// Check the allocation invariant: weights must sum to exactly 100%
    /// (within tolerance). Violations halt the pipeline before any return
    /// computation.
    ///
    /// Written to fail closed: a non-finite total (NaN or infinite weight
    /// entries) never satisfies the comparison, so it is rejected like any
    /// other violation.
    pub fn validate(&self) -> crate::Result<()> {
        let total = self.total();
        if !((total - 100.0).abs() <= WEIGHT_SUM_TOLERANCE) {
            return Err(crate::Error::WeightInvariant { total });
        }
        Ok(())
    }
}

/// User-supplied analysis parameters.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AnalysisInputs {
    /// Initial lump-sum investment
    pub initial_capital: f64,
    /// Expected nominal annual growth rate (%)
    pub growth_rate_pct: f64,
    /// Expected annual inflation rate (%)
    pub inflation_rate_pct: f64,
    /// Risk-free rate (%) used by the Sharpe ratio
    pub risk_free_rate_pct: f64,
    /// Risk tolerance label; informational only, not consumed by any
    /// computation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub risk_tolerance: Option<String>,
    /// First date of the historical window
    pub start_date: NaiveDate,
}

/// API response wrapper for success cases.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    /// Create a successful response.
    pub fn ok(data: T) -> Self {
        Self {
            ok: true,
            data: Some(data),
            error: None,
        }
    }

    /// Create an error response.
    pub fn err(error: impl Into<String>) -> Self {
        Self {
            ok: false,
            data: None,
            error: Some(error.into()),
        }
    }
}
