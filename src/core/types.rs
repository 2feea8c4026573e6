//! Core data types for synthsim.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::error::{Result, SimError};

/// Type alias for price values.
pub type Price = f64;

/// Trading dates are calendar dates without a time component.
pub type Date = NaiveDate;

/// A single observation of the underlying.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceBar {
    pub date: Date,
    pub close: Price,
    pub adj_close: Price,
}

/// Ordered daily closes of the underlying.
///
/// Always non-empty, strictly increasing in date, with finite positive prices.
/// Adjusted close falls back to close when the source has no adjusted column.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceSeries {
    dates: Vec<Date>,
    close: Vec<Price>,
    adj_close: Vec<Price>,
}

impl PriceSeries {
    /// Create a validated price series.
    pub fn new(dates: Vec<Date>, close: Vec<Price>, adj_close: Option<Vec<Price>>) -> Result<Self> {
        if dates.is_empty() {
            return Err(SimError::invalid_input("price series is empty"));
        }
        if close.len() != dates.len() {
            return Err(SimError::length_mismatch("Close", dates.len(), close.len()));
        }
        let adj_close = match adj_close {
            Some(adj) => {
                if adj.len() != dates.len() {
                    return Err(SimError::length_mismatch("Adj Close", dates.len(), adj.len()));
                }
                adj
            }
            None => close.clone(),
        };

        if let Some(i) = dates.windows(2).position(|w| w[1] <= w[0]) {
            return Err(SimError::invalid_input(format!(
                "dates must be strictly increasing: {} follows {}",
                dates[i + 1],
                dates[i]
            )));
        }
        for (column, values) in [("Close", &close), ("Adj Close", &adj_close)] {
            if let Some(i) = values.iter().position(|v| !v.is_finite() || *v <= 0.0) {
                return Err(SimError::invalid_input(format!(
                    "{column} on {} must be a positive number, got {}",
                    dates[i], values[i]
                )));
            }
        }

        Ok(Self {
            dates,
            close,
            adj_close,
        })
    }

    /// Create from bars, sorting is the caller's responsibility.
    pub fn from_bars(bars: &[PriceBar]) -> Result<Self> {
        Self::new(
            bars.iter().map(|b| b.date).collect(),
            bars.iter().map(|b| b.close).collect(),
            Some(bars.iter().map(|b| b.adj_close).collect()),
        )
    }

    /// Get the number of observations.
    #[inline]
    pub fn len(&self) -> usize {
        self.dates.len()
    }

    /// Always false for a constructed series.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    #[inline]
    pub fn dates(&self) -> &[Date] {
        &self.dates
    }

    #[inline]
    pub fn close(&self) -> &[Price] {
        &self.close
    }

    #[inline]
    pub fn adj_close(&self) -> &[Price] {
        &self.adj_close
    }

    #[inline]
    pub fn first_date(&self) -> Date {
        self.dates[0]
    }

    #[inline]
    pub fn last_date(&self) -> Date {
        self.dates[self.dates.len() - 1]
    }

    /// Get a single bar at index.
    pub fn bar(&self, index: usize) -> Option<PriceBar> {
        if index >= self.len() {
            return None;
        }
        Some(PriceBar {
            date: self.dates[index],
            close: self.close[index],
            adj_close: self.adj_close[index],
        })
    }

    /// Iterate over bars in date order.
    pub fn bars(&self) -> impl Iterator<Item = PriceBar> + '_ {
        (0..self.len()).filter_map(move |i| self.bar(i))
    }

    /// Restrict to `[start, end]` inclusive.
    pub fn between(&self, start: Date, end: Date) -> Result<Self> {
        let bars: Vec<PriceBar> = self
            .bars()
            .filter(|b| b.date >= start && b.date <= end)
            .collect();
        if bars.is_empty() {
            return Err(SimError::invalid_input(format!(
                "no prices between {start} and {end}"
            )));
        }
        Self::from_bars(&bars)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> Date {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_adj_close_defaults_to_close() {
        let prices =
            PriceSeries::new(vec![d(2024, 1, 2), d(2024, 1, 3)], vec![100.0, 101.0], None)
                .unwrap();
        assert_eq!(prices.adj_close(), prices.close());
    }

    #[test]
    fn test_rejects_empty_and_unordered() {
        let empty = PriceSeries::new(vec![], vec![], None).unwrap_err();
        assert!(empty.is_invalid_input());

        let dup = PriceSeries::new(vec![d(2024, 1, 2), d(2024, 1, 2)], vec![1.0, 1.0], None)
            .unwrap_err();
        assert!(dup.is_invalid_input());

        let backwards =
            PriceSeries::new(vec![d(2024, 1, 3), d(2024, 1, 2)], vec![1.0, 1.0], None)
                .unwrap_err();
        assert!(backwards.is_invalid_input());
    }

    #[test]
    fn test_rejects_bad_prices() {
        let err = PriceSeries::new(vec![d(2024, 1, 2)], vec![f64::NAN], None).unwrap_err();
        assert!(err.is_invalid_input());

        let err = PriceSeries::new(vec![d(2024, 1, 2)], vec![10.0], Some(vec![0.0])).unwrap_err();
        assert!(err.is_invalid_input());

        let err = PriceSeries::new(vec![d(2024, 1, 2)], vec![10.0, 11.0], None).unwrap_err();
        assert!(err.is_invalid_input());
    }

    #[test]
    fn test_between() {
        let prices = PriceSeries::new(
            vec![d(2024, 1, 2), d(2024, 1, 3), d(2024, 1, 4)],
            vec![1.0, 2.0, 3.0],
            None,
        )
        .unwrap();
        let sub = prices.between(d(2024, 1, 3), d(2024, 1, 10)).unwrap();
        assert_eq!(sub.len(), 2);
        assert_eq!(sub.first_date(), d(2024, 1, 3));
        assert!(prices.between(d(2025, 1, 1), d(2025, 2, 1)).is_err());
    }
}
