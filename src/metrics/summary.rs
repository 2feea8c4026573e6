//! Metrics summary computed once from the full results table.

use serde::{Deserialize, Serialize};

use crate::core::types::Date;
use crate::simulation::result::{DailyResultRow, RollEvent};

use super::drawdown::max_drawdown;
use super::returns::cagr;

/// Scalar summary of a simulation run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Metrics {
    /// Synthetic equity on the last row.
    pub final_synthetic_equity: f64,
    /// Buy-and-hold equity on the last row.
    pub final_benchmark_equity: f64,
    pub cagr_synthetic: f64,
    pub cagr_benchmark: f64,
    /// Fraction, ≤ 0.
    pub max_drawdown_synthetic: f64,
    /// Fraction, ≤ 0.
    pub max_drawdown_benchmark: f64,
    /// Largest margin requirement on any row.
    pub peak_margin_requirement: f64,
    /// Largest cumulative top-up on any row.
    pub peak_cumulative_topup: f64,
    /// Largest single-day top-up.
    pub peak_single_topup: f64,
    /// Days on which a top-up was injected.
    pub margin_call_count: usize,
    /// Rolls realized.
    pub roll_count: usize,
    /// Liquidated at any point.
    pub liquidated: bool,
    /// First liquidated date.
    pub liquidation_date: Option<Date>,
}

/// Final value, CAGR and max drawdown of a single curve.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CurveSummary {
    pub final_value: f64,
    pub cagr: f64,
    pub max_drawdown: f64,
}

/// Summarize any dated curve.
pub fn summarize_curve(dates: &[Date], values: &[f64]) -> CurveSummary {
    CurveSummary {
        final_value: values.last().copied().unwrap_or(0.0),
        cagr: cagr(dates, values),
        max_drawdown: max_drawdown(values),
    }
}

/// Per-row top-up amounts, derived from the cumulative column.
fn topup_increments(rows: &[DailyResultRow]) -> impl Iterator<Item = f64> + '_ {
    rows.iter().scan(0.0, |prev, row| {
        let step = row.cumulative_topup - *prev;
        *prev = row.cumulative_topup;
        Some(step)
    })
}

/// Number of days on which cumulative top-up increased over the previous row.
///
/// The first row has no previous row, so a top-up there is not counted.
pub fn margin_call_count(rows: &[DailyResultRow]) -> usize {
    topup_increments(rows).skip(1).filter(|step| *step > 0.0).count()
}

/// Largest single-day top-up, the first row included.
pub fn peak_single_topup(rows: &[DailyResultRow]) -> f64 {
    topup_increments(rows).fold(0.0, f64::max)
}

/// Compute the metrics summary from the results table.
pub fn compute_metrics(rows: &[DailyResultRow], roll_events: &[RollEvent]) -> Metrics {
    let dates: Vec<Date> = rows.iter().map(|r| r.date).collect();
    let synthetic: Vec<f64> = rows.iter().map(|r| r.synthetic_equity).collect();
    let benchmark: Vec<f64> = rows.iter().map(|r| r.benchmark_equity).collect();

    let synthetic_summary = summarize_curve(&dates, &synthetic);
    let benchmark_summary = summarize_curve(&dates, &benchmark);
    let liquidation_date = rows.iter().find(|r| r.liquidated).map(|r| r.date);

    Metrics {
        final_synthetic_equity: synthetic_summary.final_value,
        final_benchmark_equity: benchmark_summary.final_value,
        cagr_synthetic: synthetic_summary.cagr,
        cagr_benchmark: benchmark_summary.cagr,
        max_drawdown_synthetic: synthetic_summary.max_drawdown,
        max_drawdown_benchmark: benchmark_summary.max_drawdown,
        peak_margin_requirement: rows.iter().map(|r| r.margin_requirement).fold(0.0, f64::max),
        peak_cumulative_topup: rows.iter().map(|r| r.cumulative_topup).fold(0.0, f64::max),
        peak_single_topup: peak_single_topup(rows),
        margin_call_count: margin_call_count(rows),
        roll_count: roll_events.len(),
        liquidated: liquidation_date.is_some(),
        liquidation_date,
    }
}
