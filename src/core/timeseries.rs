//! Date-indexed series and alignment onto a trading calendar.

use chrono::Datelike;

use super::error::{Result, SimError};
use super::types::{Date, PriceSeries};

/// A date-indexed series of values.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeSeries<T> {
    /// Dates for each value, strictly increasing.
    pub dates: Vec<Date>,
    /// Values.
    pub values: Vec<T>,
}

/// Annualized short-term rate (decimal, 0.045 = 4.5%) by date.
pub type RateSeries = TimeSeries<f64>;

impl<T: Clone> TimeSeries<T> {
    /// Create a new time series, validating length and ordering.
    pub fn new(dates: Vec<Date>, values: Vec<T>) -> Result<Self> {
        if dates.len() != values.len() {
            return Err(SimError::length_mismatch("value", dates.len(), values.len()));
        }
        if let Some(i) = dates.windows(2).position(|w| w[1] <= w[0]) {
            return Err(SimError::invalid_input(format!(
                "series dates must be strictly increasing: {} follows {}",
                dates[i + 1],
                dates[i]
            )));
        }
        Ok(Self { dates, values })
    }

    /// Get the length.
    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Check if empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Get value at index.
    #[inline]
    pub fn get(&self, index: usize) -> Option<&T> {
        self.values.get(index)
    }

    /// Exact-date lookup.
    pub fn value_on(&self, date: Date) -> Option<&T> {
        self.dates
            .binary_search(&date)
            .ok()
            .and_then(|i| self.values.get(i))
    }

    /// Map values to a new type.
    pub fn map<U, F>(&self, f: F) -> TimeSeries<U>
    where
        F: Fn(&T) -> U,
    {
        TimeSeries {
            dates: self.dates.clone(),
            values: self.values.iter().map(f).collect(),
        }
    }

    /// Iterator over (date, value) pairs.
    pub fn iter(&self) -> impl Iterator<Item = (Date, &T)> {
        self.dates.iter().copied().zip(self.values.iter())
    }

    /// Entries dated within `[start, end]`. May be empty.
    pub fn between(&self, start: Date, end: Date) -> Self {
        let from = self.dates.partition_point(|d| *d < start);
        let to = self.dates.partition_point(|d| *d <= end).max(from);
        Self {
            dates: self.dates[from..to].to_vec(),
            values: self.values[from..to].to_vec(),
        }
    }

    /// Keep the last entry of each run of dates sharing a `period` key.
    pub fn last_per_period<K, F>(&self, period: F) -> Self
    where
        K: PartialEq,
        F: Fn(Date) -> K,
    {
        let mut dates: Vec<Date> = Vec::with_capacity(self.len());
        let mut values: Vec<T> = Vec::with_capacity(self.len());
        for (date, value) in self.iter() {
            match (dates.last_mut(), values.last_mut()) {
                (Some(last_date), Some(last_value)) if period(*last_date) == period(date) => {
                    *last_date = date;
                    *last_value = value.clone();
                }
                _ => {
                    dates.push(date);
                    values.push(value.clone());
                }
            }
        }
        Self { dates, values }
    }
}

impl TimeSeries<f64> {
    /// Build a rate series from quotes in percent (e.g. a T-bill index quoting 5.2 for 5.2%).
    pub fn from_percent_quotes(dates: Vec<Date>, quotes: Vec<f64>) -> Result<Self> {
        Ok(Self::new(dates, quotes)?.map(|q| q / 100.0))
    }

    /// Take the adjusted close of a price series as a value series.
    pub fn from_adj_close(prices: &PriceSeries) -> Self {
        Self {
            dates: prices.dates().to_vec(),
            values: prices.adj_close().to_vec(),
        }
    }

    /// Reindex onto `target` dates: exact matches, then forward-fill, then backward-fill.
    ///
    /// Values observed on dates absent from `target` are dropped, and non-finite
    /// values count as missing. Returns `None` if no target date has a value.
    pub fn align_to(&self, target: &[Date]) -> Option<Vec<f64>> {
        let mut aligned: Vec<Option<f64>> = target
            .iter()
            .map(|d| self.value_on(*d).copied().filter(|v| v.is_finite()))
            .collect();

        let first_valid = aligned.iter().position(Option::is_some)?;

        let mut last = None;
        for slot in aligned.iter_mut() {
            match slot {
                Some(v) => last = Some(*v),
                None => *slot = last,
            }
        }
        let seed = aligned[first_valid];
        for slot in aligned.iter_mut().take(first_valid) {
            *slot = seed;
        }

        aligned.into_iter().collect()
    }

    /// Last value in each calendar year, in year order.
    pub fn year_end_values(&self) -> Vec<(i32, f64)> {
        let mut out: Vec<(i32, f64)> = Vec::new();
        for (date, value) in self.iter() {
            match out.last_mut() {
                Some((year, last)) if *year == date.year() => *last = *value,
                _ => out.push((date.year(), *value)),
            }
        }
        out
    }
}
