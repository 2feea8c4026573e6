//! Account state carried between simulated days.

use serde::{Deserialize, Serialize};

use crate::core::types::{Date, Price};

use super::result::RollEvent;

/// Live margin account backing an open synthetic position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AccountState {
    /// Cash balance, including realized roll P&L and top-ups.
    pub cash: f64,
    /// Underlying price at the last roll (or the opening date).
    pub entry_price: Price,
    /// Date of the last roll.
    pub last_roll_date: Date,
    /// Total cash injected to meet margin.
    pub cumulative_topup: f64,
}

impl AccountState {
    /// Open the position at the first date.
    pub fn open(date: Date, price: Price, cash: f64) -> Self {
        Self {
            cash,
            entry_price: price,
            last_roll_date: date,
            cumulative_topup: 0.0,
        }
    }

    /// Price P&L since the last roll.
    #[inline]
    pub fn unrealized_pnl(&self, price: Price, units: f64) -> f64 {
        (price - self.entry_price) * units
    }

    /// Cash plus unrealized P&L.
    #[inline]
    pub fn equity(&self, price: Price, units: f64) -> f64 {
        self.cash + self.unrealized_pnl(price, units)
    }

    /// Realize P&L into cash and reset the reference entry.
    pub fn roll(&mut self, date: Date, price: Price, units: f64) -> RollEvent {
        let realized_pnl = self.unrealized_pnl(price, units);
        let event = RollEvent {
            date,
            price,
            entry_price_before: self.entry_price,
            realized_pnl,
        };
        self.cash += realized_pnl;
        self.entry_price = price;
        self.last_roll_date = date;
        event
    }

    /// Inject cash to cover a margin shortfall.
    pub fn top_up(&mut self, shortfall: f64) {
        self.cash += shortfall;
        self.cumulative_topup += shortfall;
    }

    /// Close the position; the account value is its cash.
    pub fn freeze(&self, date: Date) -> FrozenAccount {
        FrozenAccount {
            equity: self.cash,
            cumulative_topup: self.cumulative_topup,
            liquidated_on: date,
        }
    }
}

/// Account after liquidation. Nothing changes once reached.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FrozenAccount {
    pub equity: f64,
    pub cumulative_topup: f64,
    pub liquidated_on: Date,
}

/// Simulation state: either running or terminally liquidated.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum SimulationState {
    Active(AccountState),
    Liquidated(FrozenAccount),
}

impl SimulationState {
    #[inline]
    pub fn is_liquidated(&self) -> bool {
        matches!(self, SimulationState::Liquidated(_))
    }

    /// Total top-ups so far.
    pub fn cumulative_topup(&self) -> f64 {
        match self {
            SimulationState::Active(account) => account.cumulative_topup,
            SimulationState::Liquidated(frozen) => frozen.cumulative_topup,
        }
    }
}

/// Everything needed to continue a run from a row boundary.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Checkpoint {
    /// Index of the next price row to simulate.
    pub next_index: usize,
    /// State after the last simulated row.
    pub state: SimulationState,
    /// Benchmark share count fixed on the first date.
    pub benchmark_shares: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn d(y: i32, m: u32, day: u32) -> Date {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_roll_realizes_pnl() {
        let mut account = AccountState::open(d(2024, 1, 2), 100.0, 10_000.0);
        let event = account.roll(d(2024, 7, 1), 110.0, 100.0);

        assert!((event.realized_pnl - 1_000.0).abs() < 1e-10);
        assert_eq!(event.entry_price_before, 100.0);
        assert!((account.cash - 11_000.0).abs() < 1e-10);
        assert_eq!(account.entry_price, 110.0);
        assert_eq!(account.last_roll_date, d(2024, 7, 1));
        assert_eq!(account.unrealized_pnl(110.0, 100.0), 0.0);
    }

    #[test]
    fn test_freeze_uses_cash() {
        let mut account = AccountState::open(d(2024, 1, 2), 100.0, 5_000.0);
        account.top_up(250.0);
        let frozen = account.freeze(d(2024, 1, 3));
        assert_eq!(frozen.equity, 5_250.0);
        assert_eq!(frozen.cumulative_topup, 250.0);

        let state = SimulationState::Liquidated(frozen);
        assert!(state.is_liquidated());
        assert_eq!(state.cumulative_topup(), 250.0);
    }
}
