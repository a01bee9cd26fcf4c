//! Folio Core - Portfolio analytics engine.
//!
//! This crate computes historical performance, risk, and a benchmark-relative
//! comparison for a basket of priced instruments (equities, bonds, crypto)
//! under fixed target allocation weights, plus an inflation-adjusted forward
//! growth projection:
//!
//! - **Ingestion & alignment**: heterogeneous feed series merged onto one
//!   fully-populated date index
//! - **Returns engine**: periodic returns composed into a weighted portfolio
//!   cumulative return
//! - **Risk analytics**: covariance-based portfolio volatility, per-instrument
//!   beta vs. benchmark, Sharpe ratios, correlation matrix
//! - **Growth projection**: realized vs. inflation-adjusted expected value
//!   trajectories
//!
//! Price providers, user input, and presentation are external collaborators;
//! the feed seam is the [`feed::PriceFeed`] trait.
//!
//! # Example
//!
//! ```rust
//! use chrono::NaiveDate;
//! use folio_core::feed::StaticFeed;
//! use folio_core::{pipeline, AnalysisInputs, Instrument, WeightVector};
//!
//! let mut feed = StaticFeed::new();
//! feed.add_series("AAPL", &[(2024, 1, 1, 100.0), (2024, 1, 2, 110.0), (2024, 1, 3, 121.0)]);
//! feed.add_series("MSFT", &[(2024, 1, 1, 50.0), (2024, 1, 2, 50.0), (2024, 1, 3, 55.0)]);
//! feed.add_series("^GSPC", &[(2024, 1, 1, 4000.0), (2024, 1, 2, 4040.0), (2024, 1, 3, 4080.0)]);
//!
//! let instruments = Instrument::parse_list("AAPL,MSFT");
//! let weights = WeightVector::new(vec![("AAPL".into(), 50.0), ("MSFT".into(), 50.0)]);
//! let inputs = AnalysisInputs {
//!     initial_capital: 10_000.0,
//!     growth_rate_pct: 7.0,
//!     inflation_rate_pct: 2.0,
//!     risk_free_rate_pct: 2.0,
//!     risk_tolerance: None,
//!     start_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
//! };
//!
//! let report = pipeline::run(&feed, &instruments, &weights, &inputs).unwrap();
//! assert_eq!(report.portfolio_cumulative.values.len(), 2);
//! ```

pub mod benchmark;
pub mod feed;
pub mod growth;
pub mod ingest;
pub mod pipeline;
pub mod report;
pub mod returns;
pub mod risk;
pub mod types;

// Re-export commonly used types
pub use types::{
    AlignedPriceMatrix, AnalysisInputs, ApiResponse, AssetClass, Instrument, PricePoint,
    PriceSeries, WeightVector,
};

// Re-export main functionality
pub use benchmark::{benchmark_series, BenchmarkSeries, BENCHMARK_SYMBOL};
pub use growth::{expected_value, project_growth, GrowthProjection};
pub use ingest::{align, daily_closes, fetch_prices, FeedFailure};
pub use report::{AnalysisReport, MatrixSnapshot};
pub use returns::{cumulative_returns, periodic_returns, portfolio_returns, ReturnMatrix};
pub use risk::{calculate_risk_metrics, InstrumentStats, RiskMetrics};

/// Error types for folio-core operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The combined equity/bond batch fetch failed; fatal to the run.
    #[error("batch feed failure: {0}")]
    BatchFeed(String),

    /// Allocation weights do not sum to 100%; halts before analytics.
    #[error("allocation weights must sum to 100% (got {total:.4}%)")]
    WeightInvariant { total: f64 },

    /// No rows remain after alignment; analytics are skipped.
    #[error("no aligned price data for the selected assets and date range")]
    EmptyAlignedData,

    /// Zero variance makes the requested metric undefined.
    #[error("degenerate variance: {0}")]
    DegenerateVariance(String),

    #[error("insufficient data: {0}")]
    InsufficientData(String),
}

/// Result type for folio-core operations.
pub type Result<T> = std::result::Result<T, Error>;
