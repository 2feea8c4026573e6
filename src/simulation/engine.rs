//! Day-stepped funding simulation of a synthetic long position.
//!
//! Single pass over the price dates with one mutable account carried forward.
//! Rolls realize P&L into cash, free cash above the margin requirement earns
//! the risk-free rate, dividend drag is charged against notional, and a margin
//! breach is either topped up or liquidates the account for good.

use crate::core::calendar::{daily_rate_from_annual, roll_due};
use crate::core::error::{Result, SimError};
use crate::core::timeseries::RateSeries;
use crate::core::types::PriceSeries;
use crate::metrics::summary::compute_metrics;

use super::params::{MarginBreachPolicy, SimulationParameters};
use super::result::{DailyResultRow, RollEvent, SimulationResult};
use super::state::{AccountState, Checkpoint, FrozenAccount, SimulationState};

/// Simulation engine for one parameter set.
#[derive(Debug, Clone, Default)]
pub struct SimulationEngine {
    /// Configuration.
    pub params: SimulationParameters,
}

impl SimulationEngine {
    /// Create a new engine with the given parameters.
    pub fn new(params: SimulationParameters) -> Self {
        Self { params }
    }

    /// Run the full simulation.
    ///
    /// # Arguments
    /// * `prices` - Daily closes of the underlying
    /// * `rates` - Optional annualized risk-free rates; the fallback rate is used when absent
    ///
    /// # Returns
    /// Rows for every price date, the metrics summary, and the realized rolls
    pub fn simulate(
        &self,
        prices: &PriceSeries,
        rates: Option<&RateSeries>,
    ) -> Result<SimulationResult> {
        let mut run = Simulation::start(prices, &self.params, rates)?;
        let rows: Vec<DailyResultRow> = run.by_ref().collect();
        let roll_events = run.into_roll_events();
        let metrics = compute_metrics(&rows, &roll_events);

        Ok(SimulationResult {
            rows,
            metrics,
            roll_events,
        })
    }
}

/// Run a simulation with borrowed parameters.
pub fn simulate(
    prices: &PriceSeries,
    params: &SimulationParameters,
    rates: Option<&RateSeries>,
) -> Result<SimulationResult> {
    SimulationEngine::new(params.clone()).simulate(prices, rates)
}

/// Row-by-row stepper over a price series.
///
/// Yields one [`DailyResultRow`] per date. A [`Checkpoint`] taken between rows
/// can be fed to [`Simulation::resume`] to continue with identical output.
#[derive(Debug)]
pub struct Simulation<'a> {
    params: &'a SimulationParameters,
    prices: &'a PriceSeries,
    annual_rates: Vec<f64>,
    daily_rates: Vec<f64>,
    daily_dividend_drag: f64,
    units: f64,
    benchmark_shares: f64,
    state: SimulationState,
    next_index: usize,
    roll_events: Vec<RollEvent>,
}

impl<'a> Simulation<'a> {
    /// Validate inputs and open the position on the first date.
    pub fn start(
        prices: &'a PriceSeries,
        params: &'a SimulationParameters,
        rates: Option<&RateSeries>,
    ) -> Result<Self> {
        params.validate()?;
        let first = prices
            .bar(0)
            .ok_or_else(|| SimError::invalid_input("price series is empty"))?;

        let benchmark_shares = params.initial_cash / first.adj_close;
        let state = SimulationState::Active(AccountState::open(
            first.date,
            first.close,
            params.initial_cash,
        ));

        Self::build(prices, params, rates, state, 0, benchmark_shares)
    }

    /// Continue a run from a checkpoint taken on the same inputs.
    pub fn resume(
        prices: &'a PriceSeries,
        params: &'a SimulationParameters,
        rates: Option<&RateSeries>,
        checkpoint: Checkpoint,
    ) -> Result<Self> {
        params.validate()?;
        if checkpoint.next_index > prices.len() {
            return Err(SimError::invalid_input(format!(
                "checkpoint index {} is beyond the {} price rows",
                checkpoint.next_index,
                prices.len()
            )));
        }
        if !checkpoint.benchmark_shares.is_finite() || checkpoint.benchmark_shares <= 0.0 {
            return Err(SimError::invalid_input("checkpoint benchmark shares must be positive"));
        }

        Self::build(
            prices,
            params,
            rates,
            checkpoint.state,
            checkpoint.next_index,
            checkpoint.benchmark_shares,
        )
    }

    fn build(
        prices: &'a PriceSeries,
        params: &'a SimulationParameters,
        rates: Option<&RateSeries>,
        state: SimulationState,
        next_index: usize,
        benchmark_shares: f64,
    ) -> Result<Self> {
        let annual_rates = effective_annual_rates(prices, params, rates)?;
        let daily_rates = annual_rates.iter().map(|r| daily_rate_from_annual(*r)).collect();

        Ok(Self {
            params,
            prices,
            annual_rates,
            daily_rates,
            daily_dividend_drag: daily_rate_from_annual(params.annual_dividend_drag),
            units: params.position_units(),
            benchmark_shares,
            state,
            next_index,
            roll_events: Vec::new(),
        })
    }

    /// Snapshot of the state at the current row boundary.
    pub fn checkpoint(&self) -> Checkpoint {
        Checkpoint {
            next_index: self.next_index,
            state: self.state,
            benchmark_shares: self.benchmark_shares,
        }
    }

    /// Current state.
    #[inline]
    pub fn state(&self) -> &SimulationState {
        &self.state
    }

    /// Rolls realized so far by this stepper.
    #[inline]
    pub fn roll_events(&self) -> &[RollEvent] {
        &self.roll_events
    }

    /// Consume the stepper, keeping the roll log.
    pub fn into_roll_events(self) -> Vec<RollEvent> {
        self.roll_events
    }

    /// Simulate one date.
    fn step(&mut self, i: usize) -> Option<DailyResultRow> {
        let bar = self.prices.bar(i)?;
        let params = self.params;

        let notional = bar.close * self.units;
        let margin_requirement = params.margin_pct * notional;

        let mut liquidation: Option<FrozenAccount> = None;
        let (synthetic_equity, free_cash, cumulative_topup) = match &mut self.state {
            SimulationState::Liquidated(frozen) => (frozen.equity, 0.0, frozen.cumulative_topup),
            SimulationState::Active(account) => {
                if i > 0 && roll_due(account.last_roll_date, bar.date, params.roll_interval_months)
                {
                    self.roll_events.push(account.roll(bar.date, bar.close, self.units));
                }

                account.cash -= notional * self.daily_dividend_drag;

                let equity = account.equity(bar.close, self.units);
                let free_cash = (equity - margin_requirement).max(0.0);
                account.cash += free_cash * self.daily_rates[i];
                let equity = account.equity(bar.close, self.units);

                if equity < margin_requirement {
                    let shortfall = margin_requirement - equity;
                    let breach_liquidates = match params.margin_breach_policy {
                        MarginBreachPolicy::TopUp => {
                            account.top_up(shortfall);
                            params
                                .max_total_topup
                                .is_some_and(|cap| account.cumulative_topup > cap)
                        }
                        MarginBreachPolicy::Liquidate => true,
                    };
                    if breach_liquidates {
                        liquidation = Some(account.freeze(bar.date));
                    }
                }

                match liquidation {
                    Some(frozen) => (frozen.equity, 0.0, frozen.cumulative_topup),
                    None => (equity, free_cash, account.cumulative_topup),
                }
            }
        };

        if let Some(frozen) = liquidation {
            self.state = SimulationState::Liquidated(frozen);
        }

        Some(DailyResultRow {
            date: bar.date,
            underlying_close: bar.close,
            synthetic_notional: notional,
            margin_requirement,
            synthetic_equity,
            free_cash,
            cumulative_topup,
            liquidated: self.state.is_liquidated(),
            benchmark_equity: self.benchmark_shares * bar.adj_close,
            effective_annual_rate: self.annual_rates[i],
        })
    }
}

impl Iterator for Simulation<'_> {
    type Item = DailyResultRow;

    fn next(&mut self) -> Option<Self::Item> {
        let row = self.step(self.next_index)?;
        self.next_index += 1;
        Some(row)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.prices.len().saturating_sub(self.next_index);
        (remaining, Some(remaining))
    }
}

/// Annual rate in effect on each price date.
fn effective_annual_rates(
    prices: &PriceSeries,
    params: &SimulationParameters,
    rates: Option<&RateSeries>,
) -> Result<Vec<f64>> {
    let annual = rates
        .and_then(|series| series.align_to(prices.dates()))
        .unwrap_or_else(|| vec![params.fallback_annual_rate; prices.len()]);

    if let Some(i) = annual.iter().position(|r| !r.is_finite() || *r <= -1.0) {
        return Err(SimError::configuration(format!(
            "risk-free rate on {} must be above -100%, got {}",
            prices.dates()[i],
            annual[i]
        )));
    }
    Ok(annual)
}
