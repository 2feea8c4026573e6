//! Price and rate feed capabilities and their backends.
//!
//! Every source of market data is reduced to one operation,
//! [`PriceFeed::get_series`]. Backends are composed rather than special-cased:
//! [`FallbackFeed`] tries several in order and [`super::CachedFeed`] memoizes any of them.
//! Short-rate histories come through [`RateFeed::get_rates`], which keeps zero and
//! negative quotes that a price series would reject.

use std::collections::HashMap;
use std::path::PathBuf;

use chrono::Datelike;
use serde::{Deserialize, Serialize};

use crate::core::error::{Result, SimError};
use crate::core::timeseries::RateSeries;
use crate::core::types::{Date, PriceBar, PriceSeries};
use crate::io::csv::{read_prices_file, read_rates_file, RateUnits};

/// Sampling interval of a requested series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Interval {
    #[default]
    Daily,
    /// Last observation of each ISO week.
    Weekly,
    /// Last observation of each calendar month.
    Monthly,
}

/// What to fetch. Also the cache key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SeriesRequest {
    pub ticker: String,
    pub start: Date,
    pub end: Date,
    pub interval: Interval,
}

impl SeriesRequest {
    /// Daily request for `[start, end]`.
    pub fn daily(ticker: impl Into<String>, start: Date, end: Date) -> Self {
        Self {
            ticker: ticker.into(),
            start,
            end,
            interval: Interval::Daily,
        }
    }

    /// Grouping key for the request interval. Daily keeps every date distinct.
    fn period_key(&self, date: Date) -> (i32, u32) {
        match self.interval {
            Interval::Daily => (date.year(), date.ordinal()),
            Interval::Weekly => (date.iso_week().year(), date.iso_week().week()),
            Interval::Monthly => (date.year(), date.month()),
        }
    }

    fn check(&self) -> Result<()> {
        if self.start > self.end {
            return Err(SimError::invalid_input(format!(
                "start {} is after end {} for {}",
                self.start, self.end, self.ticker
            )));
        }
        Ok(())
    }
}

/// A source of price series.
pub trait PriceFeed: Send + Sync {
    /// Backend name for logs.
    fn name(&self) -> &str;

    /// Fetch the series described by `request`.
    fn get_series(&self, request: &SeriesRequest) -> Result<PriceSeries>;
}

/// A source of annualized short-rate histories, e.g. a T-bill yield index.
pub trait RateFeed: Send + Sync {
    /// Fetch the rates described by `request`, converted from `units` to decimals.
    fn get_rates(&self, request: &SeriesRequest, units: RateUnits) -> Result<RateSeries>;
}

/// Cut a full rate history down to a request. Empty windows are unavailable.
fn slice_rates_for_request(full: &RateSeries, request: &SeriesRequest) -> Result<RateSeries> {
    let ranged = full.between(request.start, request.end);
    if ranged.is_empty() {
        return Err(SimError::data_unavailable(&request.ticker));
    }
    Ok(ranged.last_per_period(|date| request.period_key(date)))
}

/// Cut a full history down to a request: date range, then interval.
fn slice_for_request(full: &PriceSeries, request: &SeriesRequest) -> Result<PriceSeries> {
    let ranged = full
        .between(request.start, request.end)
        .map_err(|_| SimError::data_unavailable(&request.ticker))?;
    resample_last(&ranged, request.interval)
}

/// Keep the last observation of each period.
pub fn resample_last(prices: &PriceSeries, interval: Interval) -> Result<PriceSeries> {
    let period = |d: Date| -> (i32, u32) {
        match interval {
            Interval::Daily => (d.year(), d.ordinal()),
            Interval::Weekly => (d.iso_week().year(), d.iso_week().week()),
            Interval::Monthly => (d.year(), d.month()),
        }
    };
    if interval == Interval::Daily {
        return Ok(prices.clone());
    }

    let mut bars: Vec<PriceBar> = Vec::new();
    for bar in prices.bars() {
        match bars.last_mut() {
            Some(last) if period(last.date) == period(bar.date) => *last = bar,
            _ => bars.push(bar),
        }
    }
    PriceSeries::from_bars(&bars)
}

/// Series held in memory, keyed by upper-case ticker.
#[derive(Debug, Clone, Default)]
pub struct InMemoryFeed {
    series: HashMap<String, PriceSeries>,
    /// Rate histories, stored as decimals.
    rates: HashMap<String, RateSeries>,
}

impl InMemoryFeed {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a full history for a ticker.
    pub fn insert(&mut self, ticker: &str, series: PriceSeries) {
        self.series.insert(ticker.to_ascii_uppercase(), series);
    }

    /// Builder form of [`InMemoryFeed::insert`].
    pub fn with_series(mut self, ticker: &str, series: PriceSeries) -> Self {
        self.insert(ticker, series);
        self
    }

    /// Register a decimal rate history for a ticker.
    pub fn insert_rates(&mut self, ticker: &str, rates: RateSeries) {
        self.rates.insert(ticker.to_ascii_uppercase(), rates);
    }

    /// Builder form of [`InMemoryFeed::insert_rates`].
    pub fn with_rates(mut self, ticker: &str, rates: RateSeries) -> Self {
        self.insert_rates(ticker, rates);
        self
    }
}

impl PriceFeed for InMemoryFeed {
    fn name(&self) -> &str {
        "memory"
    }

    fn get_series(&self, request: &SeriesRequest) -> Result<PriceSeries> {
        request.check()?;
        let full = self
            .series
            .get(&request.ticker.to_ascii_uppercase())
            .ok_or_else(|| SimError::data_unavailable(&request.ticker))?;
        slice_for_request(full, request)
    }
}

impl RateFeed for InMemoryFeed {
    /// Stored rates are already decimal, so `units` is ignored.
    fn get_rates(&self, request: &SeriesRequest, _units: RateUnits) -> Result<RateSeries> {
        request.check()?;
        let full = self
            .rates
            .get(&request.ticker.to_ascii_uppercase())
            .ok_or_else(|| SimError::data_unavailable(&request.ticker))?;
        slice_rates_for_request(full, request)
    }
}

/// One `<TICKER>.csv` file per ticker under a directory.
#[derive(Debug, Clone)]
pub struct CsvDirectoryFeed {
    root: PathBuf,
}

impl CsvDirectoryFeed {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn path_for(&self, ticker: &str) -> PathBuf {
        let file = ticker.trim_start_matches('^').to_ascii_uppercase();
        self.root.join(format!("{file}.csv"))
    }

    fn existing_path(&self, request: &SeriesRequest) -> Result<PathBuf> {
        request.check()?;
        let path = self.path_for(&request.ticker);
        if !path.is_file() {
            return Err(SimError::data_unavailable(&request.ticker));
        }
        Ok(path)
    }
}

impl PriceFeed for CsvDirectoryFeed {
    fn name(&self) -> &str {
        "csv-directory"
    }

    fn get_series(&self, request: &SeriesRequest) -> Result<PriceSeries> {
        let path = self.existing_path(request)?;
        tracing::debug!(ticker = %request.ticker, path = %path.display(), "loading csv series");
        let full = read_prices_file(&path)?;
        slice_for_request(&full, request)
    }
}

impl RateFeed for CsvDirectoryFeed {
    fn get_rates(&self, request: &SeriesRequest, units: RateUnits) -> Result<RateSeries> {
        let path = self.existing_path(request)?;
        tracing::debug!(ticker = %request.ticker, path = %path.display(), "loading csv rates");
        let full = read_rates_file(&path, units)?;
        slice_rates_for_request(&full, request)
    }
}

/// Tries backends in order and returns the first success.
#[derive(Default)]
pub struct FallbackFeed {
    backends: Vec<Box<dyn PriceFeed>>,
}

impl FallbackFeed {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a backend; earlier backends take priority.
    pub fn with_backend(mut self, backend: impl PriceFeed + 'static) -> Self {
        self.backends.push(Box::new(backend));
        self
    }

    pub fn len(&self) -> usize {
        self.backends.len()
    }

    pub fn is_empty(&self) -> bool {
        self.backends.is_empty()
    }
}

impl PriceFeed for FallbackFeed {
    fn name(&self) -> &str {
        "fallback"
    }

    fn get_series(&self, request: &SeriesRequest) -> Result<PriceSeries> {
        request.check()?;
        for backend in &self.backends {
            match backend.get_series(request) {
                Ok(series) => return Ok(series),
                Err(err) => {
                    tracing::warn!(
                        backend = backend.name(),
                        ticker = %request.ticker,
                        error = %err,
                        "feed backend failed, trying next"
                    );
                }
            }
        }
        Err(SimError::data_unavailable(&request.ticker))
    }
}
