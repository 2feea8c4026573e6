//! Post-hoc carry and roll-friction deductions from reported equity.
//!
//! The overlay reads a finished [`SimulationResult`] and never feeds back into
//! the cash/margin mechanics, so it can be toggled independently of the run.

use serde::{Deserialize, Serialize};

use crate::core::calendar::{days_between, DAYS_PER_YEAR};
use crate::core::types::Date;
use crate::metrics::summary::{summarize_curve, CurveSummary};
use crate::simulation::result::SimulationResult;

use super::curve::CarryCurve;

/// Carry cost model applied over a results table.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CarryOverlay {
    /// Annualized carry as a fraction of current notional.
    pub annual_carry_rate: f64,
    /// Fixed cost charged on every roll for the whole position.
    pub cost_per_roll: f64,
}

/// One row of the overlay.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CarryAdjustedRow {
    pub date: Date,
    /// Carry accrued since the previous row.
    pub carry_cost: f64,
    /// Roll friction charged on this date.
    pub roll_cost: f64,
    /// All deductions so far.
    pub cumulative_cost: f64,
    /// Synthetic equity net of cumulative deductions.
    pub adjusted_equity: f64,
}

/// Overlay output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CarryOverlayResult {
    pub rows: Vec<CarryAdjustedRow>,
    pub total_carry_cost: f64,
    pub total_roll_cost: f64,
    /// Metrics of the adjusted equity curve.
    pub adjusted: CurveSummary,
}

impl CarryOverlay {
    /// Overlay with a fixed annual carry rate and no roll friction.
    pub fn new(annual_carry_rate: f64) -> Self {
        Self {
            annual_carry_rate,
            cost_per_roll: 0.0,
        }
    }

    /// Read the carry rate for the roll frequency off a curve.
    pub fn from_curve(curve: &CarryCurve, roll_interval_months: u32) -> Self {
        Self::new(curve.annual_rate(roll_interval_months as f64))
    }

    /// Charge `cost_per_contract * contracts` on every roll.
    pub fn with_roll_friction(mut self, cost_per_contract: f64, contracts: u32) -> Self {
        self.cost_per_roll = cost_per_contract * contracts as f64;
        self
    }

    /// Apply to a finished run.
    ///
    /// Carry accrues on each row's notional for the calendar days elapsed since
    /// the previous row. Liquidated rows accrue nothing.
    pub fn apply(&self, result: &SimulationResult) -> CarryOverlayResult {
        let mut rows = Vec::with_capacity(result.rows.len());
        let mut cumulative_cost = 0.0;
        let mut total_carry_cost = 0.0;
        let mut total_roll_cost = 0.0;
        let mut rolls = result.roll_events.iter().peekable();
        let mut prev_date: Option<Date> = None;

        for row in &result.rows {
            let carry_cost = match prev_date {
                Some(prev) if !row.liquidated => {
                    let year_fraction = days_between(prev, row.date) as f64 / DAYS_PER_YEAR;
                    self.annual_carry_rate * row.synthetic_notional * year_fraction
                }
                _ => 0.0,
            };

            let mut roll_cost = 0.0;
            while let Some(event) = rolls.next_if(|e| e.date <= row.date) {
                if event.date == row.date {
                    roll_cost += self.cost_per_roll;
                }
            }

            total_carry_cost += carry_cost;
            total_roll_cost += roll_cost;
            cumulative_cost += carry_cost + roll_cost;
            rows.push(CarryAdjustedRow {
                date: row.date,
                carry_cost,
                roll_cost,
                cumulative_cost,
                adjusted_equity: row.synthetic_equity - cumulative_cost,
            });
            prev_date = Some(row.date);
        }

        let dates: Vec<Date> = rows.iter().map(|r| r.date).collect();
        let equity: Vec<f64> = rows.iter().map(|r| r.adjusted_equity).collect();

        CarryOverlayResult {
            adjusted: summarize_curve(&dates, &equity),
            rows,
            total_carry_cost,
            total_roll_cost,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::PriceSeries;
    use crate::simulation::{simulate, SimulationParameters};
    use chrono::NaiveDate;

    fn d(y: i32, m: u32, day: u32) -> Date {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn flat_result(dates: Vec<Date>) -> SimulationResult {
        let n = dates.len();
        let prices = PriceSeries::new(dates, vec![100.0; n], None).unwrap();
        let params = SimulationParameters {
            initial_cash: 10_000.0,
            fallback_annual_rate: 0.0,
            annual_dividend_drag: 0.0,
            roll_interval_months: 1,
            ..Default::default()
        };
        simulate(&prices, &params, None).unwrap()
    }

    #[test]
    fn test_carry_uses_elapsed_days() {
        // Friday to Monday is three days of carry.
        let result = flat_result(vec![d(2024, 1, 5), d(2024, 1, 8), d(2024, 1, 9)]);
        let overlay = CarryOverlay::new(0.0365).apply(&result);

        assert_eq!(overlay.rows[0].carry_cost, 0.0);
        let expected_weekend = 0.0365 * 10_000.0 * 3.0 / DAYS_PER_YEAR;
        assert!((overlay.rows[1].carry_cost - expected_weekend).abs() < 1e-9);
        let expected_day = 0.0365 * 10_000.0 / DAYS_PER_YEAR;
        assert!((overlay.rows[2].carry_cost - expected_day).abs() < 1e-9);
        assert!(
            (overlay.rows[2].adjusted_equity - (10_000.0 - expected_weekend - expected_day)).abs()
                < 1e-9
        );
    }

    #[test]
    fn test_roll_friction_on_roll_dates() {
        let result = flat_result(vec![d(2024, 1, 30), d(2024, 1, 31), d(2024, 2, 1), d(2024, 2, 2)]);
        assert_eq!(result.roll_events.len(), 1);

        let overlay = CarryOverlay::new(0.0).with_roll_friction(1.5, 2).apply(&result);
        assert_eq!(overlay.rows[2].roll_cost, 3.0);
        assert_eq!(overlay.total_roll_cost, 3.0);
        assert_eq!(overlay.rows[3].cumulative_cost, 3.0);
        assert_eq!(overlay.total_carry_cost, 0.0);
    }

    #[test]
    fn test_zero_rate_is_identity() {
        let result = flat_result(vec![d(2024, 1, 2), d(2024, 1, 3)]);
        let overlay = CarryOverlay::new(0.0).apply(&result);
        for (row, adj) in result.rows.iter().zip(&overlay.rows) {
            assert_eq!(row.synthetic_equity, adj.adjusted_equity);
        }
    }
}
