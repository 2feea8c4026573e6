//! Initial margin check on the opening date.

use serde::{Deserialize, Serialize};

use crate::core::types::{Date, Price, PriceSeries};

use super::params::SimulationParameters;

/// Broker-style check of whether the starting cash covers the opening margin.
///
/// Informational only: the simulation still runs when capital is short so that
/// top-up and liquidation behaviour can be stress-tested.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MarginFeasibility {
    pub entry_date: Date,
    pub entry_price: Price,
    pub estimated_notional: f64,
    pub initial_margin: f64,
    pub starting_capital: f64,
    /// Missing capital, if the starting cash is below the initial margin.
    pub shortfall: Option<f64>,
}

impl MarginFeasibility {
    #[inline]
    pub fn passed(&self) -> bool {
        self.shortfall.is_none()
    }
}

/// Compare starting cash with the margin required at the first close.
pub fn initial_margin_check(
    prices: &PriceSeries,
    params: &SimulationParameters,
) -> MarginFeasibility {
    let entry_date = prices.first_date();
    let entry_price = prices.close()[0];
    let estimated_notional = entry_price * params.position_units();
    let initial_margin = params.margin_pct * estimated_notional;
    let shortfall = (params.initial_cash < initial_margin)
        .then_some(initial_margin - params.initial_cash);

    MarginFeasibility {
        entry_date,
        entry_price,
        estimated_notional,
        initial_margin,
        starting_capital: params.initial_cash,
        shortfall,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_shortfall() {
        let prices = PriceSeries::new(
            vec![NaiveDate::from_ymd_opt(2015, 1, 2).unwrap()],
            vec![205.43],
            None,
        )
        .unwrap();
        let params = SimulationParameters { initial_cash: 5_000.0, ..Default::default() };
        let check = initial_margin_check(&prices, &params);

        assert!((check.estimated_notional - 20_543.0).abs() < 1e-9);
        assert!((check.initial_margin - 5_135.75).abs() < 1e-9);
        assert!(!check.passed());
        assert!((check.shortfall.unwrap() - 135.75).abs() < 1e-9);

        let params = SimulationParameters { initial_cash: 10_000.0, ..Default::default() };
        assert!(initial_margin_check(&prices, &params).passed());
    }
}
