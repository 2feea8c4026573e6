//! Output records of a simulation run.

use serde::{Deserialize, Serialize};

use crate::core::types::{Date, Price};
use crate::metrics::summary::Metrics;

/// One row of the results table, written once per trading date.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DailyResultRow {
    pub date: Date,
    pub underlying_close: Price,
    pub synthetic_notional: f64,
    pub margin_requirement: f64,
    pub synthetic_equity: f64,
    pub free_cash: f64,
    pub cumulative_topup: f64,
    pub liquidated: bool,
    pub benchmark_equity: f64,
    pub effective_annual_rate: f64,
}

/// A realized roll of the synthetic position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RollEvent {
    /// Date the roll was executed.
    pub date: Date,
    /// Underlying close at the roll.
    pub price: Price,
    /// Reference entry price that was replaced.
    pub entry_price_before: Price,
    /// P&L moved into cash.
    pub realized_pnl: f64,
}

/// Complete simulation result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationResult {
    /// One row per price date, in date order.
    pub rows: Vec<DailyResultRow>,
    /// Summary computed from `rows`.
    pub metrics: Metrics,
    /// Every roll realized during the run.
    pub roll_events: Vec<RollEvent>,
}

impl SimulationResult {
    /// Dates of all rows.
    pub fn dates(&self) -> Vec<Date> {
        self.rows.iter().map(|r| r.date).collect()
    }

    /// Synthetic equity curve.
    pub fn synthetic_equity(&self) -> Vec<f64> {
        self.rows.iter().map(|r| r.synthetic_equity).collect()
    }

    /// Buy-and-hold benchmark curve.
    pub fn benchmark_equity(&self) -> Vec<f64> {
        self.rows.iter().map(|r| r.benchmark_equity).collect()
    }

    /// Index of the first liquidated row, if any.
    pub fn liquidation_index(&self) -> Option<usize> {
        self.rows.iter().position(|r| r.liquidated)
    }
}
