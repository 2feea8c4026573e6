//! Growth-rate measures over dated equity curves.

use serde::{Deserialize, Serialize};

use crate::core::calendar::{days_between, DAYS_PER_YEAR};
use crate::core::timeseries::TimeSeries;
use crate::core::types::Date;

/// Compound annual growth rate between the first and last observation.
///
/// `(end / start)^(365.25 / days) - 1`. Returns 0 for fewer than two points,
/// no elapsed time, a non-positive start value, or a non-positive growth
/// ratio (an account that ended at or below zero).
pub fn cagr(dates: &[Date], equity: &[f64]) -> f64 {
    let n = equity.len().min(dates.len());
    if n < 2 {
        return 0.0;
    }
    let start = equity[0];
    let end = equity[n - 1];
    let days = days_between(dates[0], dates[n - 1]);
    if days <= 0 || start <= 0.0 {
        return 0.0;
    }
    let ratio = end / start;
    if !ratio.is_finite() || ratio <= 0.0 {
        return 0.0;
    }
    let years = days as f64 / DAYS_PER_YEAR;
    let rate = ratio.powf(1.0 / years) - 1.0;
    if rate.is_finite() {
        rate
    } else {
        0.0
    }
}

/// Return of one calendar year, from the previous year-end to this year-end.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct YearlyReturn {
    pub year: i32,
    /// Percentage, 12.5 = +12.5%.
    pub return_pct: f64,
}

/// Calendar-year returns using each year's last observation.
///
/// The first year has no prior year-end and is omitted.
pub fn yearly_returns(dates: &[Date], equity: &[f64]) -> Vec<YearlyReturn> {
    let n = equity.len().min(dates.len());
    let series = TimeSeries {
        dates: dates[..n].to_vec(),
        values: equity[..n].to_vec(),
    };
    series
        .year_end_values()
        .windows(2)
        .filter(|w| w[0].1 != 0.0)
        .map(|w| YearlyReturn {
            year: w[1].0,
            return_pct: (w[1].1 / w[0].1 - 1.0) * 100.0,
        })
        .collect()
}

/// Synthetic versus benchmark for one calendar year.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct YearlyComparison {
    pub year: i32,
    pub synthetic_pct: f64,
    pub benchmark_pct: f64,
    /// Synthetic minus benchmark, in percentage points.
    pub excess_pp: f64,
}

/// Side-by-side yearly returns for two curves sharing the same dates.
pub fn yearly_comparison(
    dates: &[Date],
    synthetic: &[f64],
    benchmark: &[f64],
) -> Vec<YearlyComparison> {
    let synthetic = yearly_returns(dates, synthetic);
    let benchmark = yearly_returns(dates, benchmark);

    synthetic
        .iter()
        .filter_map(|s| {
            let b = benchmark.iter().find(|b| b.year == s.year)?;
            Some(YearlyComparison {
                year: s.year,
                synthetic_pct: s.return_pct,
                benchmark_pct: b.return_pct,
                excess_pp: s.return_pct - b.return_pct,
            })
        })
        .collect()
}
