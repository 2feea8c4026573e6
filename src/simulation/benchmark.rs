//! Equal-cash buy-and-hold curves for additional benchmark instruments.

use serde::{Deserialize, Serialize};

use crate::core::timeseries::TimeSeries;
use crate::core::types::Date;
use crate::metrics::returns::{yearly_returns, YearlyReturn};
use crate::metrics::summary::{summarize_curve, CurveSummary};

/// Summary of one named benchmark curve over a run's dates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkReport {
    pub name: String,
    pub summary: CurveSummary,
    pub yearly: Vec<YearlyReturn>,
    #[serde(skip)]
    pub curve: Vec<f64>,
}

impl BenchmarkReport {
    /// Build the equal-cash curve for `adj_close` and summarize it.
    ///
    /// Returns `None` when the series shares no date with `dates`.
    pub fn build(
        name: impl Into<String>,
        dates: &[Date],
        adj_close: &TimeSeries<f64>,
        initial_cash: f64,
    ) -> Option<Self> {
        let curve = equal_cash_curve(dates, adj_close, initial_cash)?;
        Some(Self {
            name: name.into(),
            summary: summarize_curve(dates, &curve),
            yearly: yearly_returns(dates, &curve),
            curve,
        })
    }
}

/// Value of `initial_cash` invested on the first date and held.
///
/// `adj_close` is aligned onto `dates` with forward then backward fill, so a
/// benchmark that lists later (or trades on a slightly different calendar)
/// still yields one value per result date. Returns `None` if nothing aligns.
pub fn equal_cash_curve(
    dates: &[Date],
    adj_close: &TimeSeries<f64>,
    initial_cash: f64,
) -> Option<Vec<f64>> {
    let aligned = adj_close.align_to(dates)?;
    let base = aligned[0];
    if base.is_nan() || base <= 0.0 {
        return None;
    }
    Some(aligned.iter().map(|v| initial_cash * v / base).collect())
}
