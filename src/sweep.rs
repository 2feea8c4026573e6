//! Parallel parameter sweep.
//!
//! Every grid point is an independent run over the same borrowed inputs, so
//! the sweep is a plain rayon map with no shared state.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::core::timeseries::RateSeries;
use crate::core::types::PriceSeries;
use crate::metrics::summary::Metrics;
use crate::simulation::engine::simulate;
use crate::simulation::params::{MarginBreachPolicy, SimulationParameters};

/// Axes of a sweep. An empty axis keeps the base parameter's value.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SweepGrid {
    pub base: SimulationParameters,
    pub roll_intervals: Vec<u32>,
    pub margin_pcts: Vec<f64>,
    pub policies: Vec<MarginBreachPolicy>,
}

/// Outcome of one grid point. Exactly one of `metrics` and `error` is set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SweepOutcome {
    pub params: SimulationParameters,
    pub metrics: Option<Metrics>,
    pub error: Option<String>,
}

impl SweepOutcome {
    pub fn is_ok(&self) -> bool {
        self.metrics.is_some()
    }
}

impl SweepGrid {
    pub fn new(base: SimulationParameters) -> Self {
        Self {
            base,
            ..Default::default()
        }
    }

    pub fn roll_intervals(mut self, months: impl IntoIterator<Item = u32>) -> Self {
        self.roll_intervals = months.into_iter().collect();
        self
    }

    pub fn margin_pcts(mut self, pcts: impl IntoIterator<Item = f64>) -> Self {
        self.margin_pcts = pcts.into_iter().collect();
        self
    }

    pub fn policies(mut self, policies: impl IntoIterator<Item = MarginBreachPolicy>) -> Self {
        self.policies = policies.into_iter().collect();
        self
    }

    /// Cartesian product of the axes, roll interval outermost.
    pub fn combinations(&self) -> Vec<SimulationParameters> {
        let rolls = axis(&self.roll_intervals, self.base.roll_interval_months);
        let margins = axis(&self.margin_pcts, self.base.margin_pct);
        let policies = axis(&self.policies, self.base.margin_breach_policy);

        let mut out = Vec::with_capacity(rolls.len() * margins.len() * policies.len());
        for &roll in &rolls {
            for &margin in &margins {
                for &policy in &policies {
                    out.push(SimulationParameters {
                        roll_interval_months: roll,
                        margin_pct: margin,
                        margin_breach_policy: policy,
                        ..self.base.clone()
                    });
                }
            }
        }
        out
    }
}

fn axis<T: Copy>(values: &[T], fallback: T) -> Vec<T> {
    if values.is_empty() {
        vec![fallback]
    } else {
        values.to_vec()
    }
}

/// Run every grid point in parallel. Output order matches [`SweepGrid::combinations`].
///
/// A failing point (e.g. an invalid margin fraction) reports its error and
/// does not abort the others.
pub fn run_sweep(
    prices: &PriceSeries,
    rates: Option<&RateSeries>,
    grid: &SweepGrid,
) -> Vec<SweepOutcome> {
    grid.combinations()
        .into_par_iter()
        .map(|params| match simulate(prices, &params, rates) {
            Ok(result) => SweepOutcome {
                params,
                metrics: Some(result.metrics),
                error: None,
            },
            Err(err) => SweepOutcome {
                params,
                metrics: None,
                error: Some(err.to_string()),
            },
        })
        .collect()
}
