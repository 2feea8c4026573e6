//! PyO3 class and function bindings for synthsim.

use std::collections::{BTreeMap, HashMap};

use numpy::{PyArray1, PyReadonlyArray1};
use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;

use crate::carry::curve::CarryCurve;
use crate::carry::overlay::CarryOverlay;
use crate::core::timeseries::RateSeries;
use crate::core::types::PriceSeries;
use crate::metrics::drawdown::drawdown_curve;
use crate::metrics::summary::Metrics;
use crate::simulation::engine::simulate;
use crate::simulation::params::{MarginBreachPolicy, SimulationParameters};
use crate::simulation::result::{DailyResultRow, SimulationResult};

use super::numpy_bridge::*;

// ============================================================================
// Configuration
// ============================================================================

/// Python-exposed simulation parameters.
#[pyclass]
#[derive(Debug, Clone)]
pub struct PySimulationParams {
    #[pyo3(get, set)]
    pub initial_cash: f64,
    #[pyo3(get, set)]
    pub contracts: u32,
    #[pyo3(get, set)]
    pub contract_multiplier: u32,
    #[pyo3(get, set)]
    pub margin_pct: f64,
    #[pyo3(get, set)]
    pub fallback_annual_rate: f64,
    #[pyo3(get, set)]
    pub roll_interval_months: u32,
    #[pyo3(get, set)]
    pub annual_dividend_drag: f64,
    #[pyo3(get, set)]
    pub liquidate_on_breach: bool,
    #[pyo3(get, set)]
    pub max_total_topup: Option<f64>,
}

#[pymethods]
impl PySimulationParams {
    #[new]
    #[pyo3(signature = (
        initial_cash=30000.0,
        contracts=1,
        contract_multiplier=100,
        margin_pct=0.25,
        fallback_annual_rate=0.045,
        roll_interval_months=6,
        annual_dividend_drag=0.012,
        liquidate_on_breach=false,
        max_total_topup=None
    ))]
    #[allow(clippy::too_many_arguments)]
    fn new(
        initial_cash: f64,
        contracts: u32,
        contract_multiplier: u32,
        margin_pct: f64,
        fallback_annual_rate: f64,
        roll_interval_months: u32,
        annual_dividend_drag: f64,
        liquidate_on_breach: bool,
        max_total_topup: Option<f64>,
    ) -> Self {
        Self {
            initial_cash,
            contracts,
            contract_multiplier,
            margin_pct,
            fallback_annual_rate,
            roll_interval_months,
            annual_dividend_drag,
            liquidate_on_breach,
            max_total_topup,
        }
    }

    fn __repr__(&self) -> String {
        format!(
            "SimulationParams(initial_cash={}, contracts={}, margin_pct={}, roll_interval_months={})",
            self.initial_cash, self.contracts, self.margin_pct, self.roll_interval_months
        )
    }
}

impl From<&PySimulationParams> for SimulationParameters {
    fn from(py_params: &PySimulationParams) -> Self {
        SimulationParameters {
            initial_cash: py_params.initial_cash,
            contracts: py_params.contracts,
            contract_multiplier: py_params.contract_multiplier,
            margin_pct: py_params.margin_pct,
            fallback_annual_rate: py_params.fallback_annual_rate,
            roll_interval_months: py_params.roll_interval_months,
            annual_dividend_drag: py_params.annual_dividend_drag,
            margin_breach_policy: if py_params.liquidate_on_breach {
                MarginBreachPolicy::Liquidate
            } else {
                MarginBreachPolicy::TopUp
            },
            max_total_topup: py_params.max_total_topup,
        }
    }
}

// ============================================================================
// Results
// ============================================================================

/// Python-exposed metrics summary.
#[pyclass]
#[derive(Debug, Clone)]
pub struct PyMetrics {
    #[pyo3(get)]
    pub final_synthetic_equity: f64,
    #[pyo3(get)]
    pub final_benchmark_equity: f64,
    #[pyo3(get)]
    pub cagr_synthetic: f64,
    #[pyo3(get)]
    pub cagr_benchmark: f64,
    #[pyo3(get)]
    pub max_drawdown_synthetic: f64,
    #[pyo3(get)]
    pub max_drawdown_benchmark: f64,
    #[pyo3(get)]
    pub peak_margin_requirement: f64,
    #[pyo3(get)]
    pub peak_cumulative_topup: f64,
    #[pyo3(get)]
    pub peak_single_topup: f64,
    #[pyo3(get)]
    pub margin_call_count: usize,
    #[pyo3(get)]
    pub roll_count: usize,
    #[pyo3(get)]
    pub liquidated: bool,
    #[pyo3(get)]
    pub liquidation_date: Option<String>,
}

#[pymethods]
impl PyMetrics {
    fn __repr__(&self) -> String {
        format!(
            "Metrics(cagr_synthetic={:.4}, cagr_benchmark={:.4}, max_dd={:.4}, liquidated={})",
            self.cagr_synthetic, self.cagr_benchmark, self.max_drawdown_synthetic, self.liquidated
        )
    }
}

impl From<&Metrics> for PyMetrics {
    fn from(m: &Metrics) -> Self {
        Self {
            final_synthetic_equity: m.final_synthetic_equity,
            final_benchmark_equity: m.final_benchmark_equity,
            cagr_synthetic: m.cagr_synthetic,
            cagr_benchmark: m.cagr_benchmark,
            max_drawdown_synthetic: m.max_drawdown_synthetic,
            max_drawdown_benchmark: m.max_drawdown_benchmark,
            peak_margin_requirement: m.peak_margin_requirement,
            peak_cumulative_topup: m.peak_cumulative_topup,
            peak_single_topup: m.peak_single_topup,
            margin_call_count: m.margin_call_count,
            roll_count: m.roll_count,
            liquidated: m.liquidated,
            liquidation_date: m.liquidation_date.map(|d| d.to_string()),
        }
    }
}

/// Python-exposed simulation result. Columns come back as numpy arrays.
#[pyclass]
#[derive(Debug, Clone)]
pub struct PySimulationResult {
    #[pyo3(get)]
    pub metrics: PyMetrics,
    inner: SimulationResult,
}

impl PySimulationResult {
    fn column(&self, f: impl Fn(&DailyResultRow) -> f64) -> Vec<f64> {
        self.inner.rows.iter().map(f).collect()
    }
}

#[pymethods]
impl PySimulationResult {
    /// ISO dates of every row.
    fn dates(&self) -> Vec<String> {
        format_dates(self.inner.dates())
    }

    fn underlying_close<'py>(&self, py: Python<'py>) -> &'py PyArray1<f64> {
        vec_to_numpy_f64(py, self.column(|r| r.underlying_close))
    }

    fn synthetic_notional<'py>(&self, py: Python<'py>) -> &'py PyArray1<f64> {
        vec_to_numpy_f64(py, self.column(|r| r.synthetic_notional))
    }

    fn margin_requirement<'py>(&self, py: Python<'py>) -> &'py PyArray1<f64> {
        vec_to_numpy_f64(py, self.column(|r| r.margin_requirement))
    }

    fn synthetic_equity<'py>(&self, py: Python<'py>) -> &'py PyArray1<f64> {
        vec_to_numpy_f64(py, self.inner.synthetic_equity())
    }

    fn free_cash<'py>(&self, py: Python<'py>) -> &'py PyArray1<f64> {
        vec_to_numpy_f64(py, self.column(|r| r.free_cash))
    }

    fn cumulative_topup<'py>(&self, py: Python<'py>) -> &'py PyArray1<f64> {
        vec_to_numpy_f64(py, self.column(|r| r.cumulative_topup))
    }

    fn benchmark_equity<'py>(&self, py: Python<'py>) -> &'py PyArray1<f64> {
        vec_to_numpy_f64(py, self.inner.benchmark_equity())
    }

    fn effective_annual_rate<'py>(&self, py: Python<'py>) -> &'py PyArray1<f64> {
        vec_to_numpy_f64(py, self.column(|r| r.effective_annual_rate))
    }

    fn liquidated<'py>(&self, py: Python<'py>) -> &'py PyArray1<bool> {
        vec_to_numpy_bool(py, self.inner.rows.iter().map(|r| r.liquidated).collect())
    }

    /// Drawdown of synthetic equity as negative fractions.
    fn drawdown_curve<'py>(&self, py: Python<'py>) -> &'py PyArray1<f64> {
        vec_to_numpy_f64(py, drawdown_curve(&self.inner.synthetic_equity()))
    }

    /// Dates on which the position was rolled.
    fn roll_dates(&self) -> Vec<String> {
        format_dates(self.inner.roll_events.iter().map(|e| e.date))
    }

    /// Synthetic equity net of carry and roll friction.
    #[pyo3(signature = (annual_carry_rate, roll_cost_per_contract=0.0, contracts=1))]
    fn carry_adjusted_equity<'py>(
        &self,
        py: Python<'py>,
        annual_carry_rate: f64,
        roll_cost_per_contract: f64,
        contracts: u32,
    ) -> &'py PyArray1<f64> {
        let overlay = CarryOverlay::new(annual_carry_rate)
            .with_roll_friction(roll_cost_per_contract, contracts)
            .apply(&self.inner);
        vec_to_numpy_f64(py, overlay.rows.iter().map(|r| r.adjusted_equity).collect())
    }

    fn __len__(&self) -> usize {
        self.inner.rows.len()
    }

    fn __repr__(&self) -> String {
        format!(
            "SimulationResult(rows={}, final_equity={:.2}, rolls={}, liquidated={})",
            self.inner.rows.len(),
            self.metrics.final_synthetic_equity,
            self.metrics.roll_count,
            self.metrics.liquidated
        )
    }
}

impl From<SimulationResult> for PySimulationResult {
    fn from(result: SimulationResult) -> Self {
        Self {
            metrics: PyMetrics::from(&result.metrics),
            inner: result,
        }
    }
}

// ============================================================================
// Functions
// ============================================================================

/// Run a synthetic funding simulation.
///
/// `rate_dates` and `rates` must be given together; rates are decimal annual values.
#[pyfunction]
#[pyo3(signature = (dates, close, adj_close=None, params=None, rate_dates=None, rates=None))]
pub fn run_synthetic_simulation(
    dates: Vec<String>,
    close: PyReadonlyArray1<f64>,
    adj_close: Option<PyReadonlyArray1<f64>>,
    params: Option<&PySimulationParams>,
    rate_dates: Option<Vec<String>>,
    rates: Option<PyReadonlyArray1<f64>>,
) -> PyResult<PySimulationResult> {
    let prices = PriceSeries::new(
        parse_dates(&dates)?,
        numpy_to_vec_f64(close),
        adj_close.map(numpy_to_vec_f64),
    )?;

    let rate_series = match (rate_dates, rates) {
        (Some(rd), Some(rv)) => Some(RateSeries::new(parse_dates(&rd)?, numpy_to_vec_f64(rv))?),
        (None, None) => None,
        _ => {
            return Err(PyValueError::new_err(
                "rate_dates and rates must be given together",
            ))
        }
    };

    let params = params.map(SimulationParameters::from).unwrap_or_default();
    let result = simulate(&prices, &params, rate_series.as_ref())?;
    Ok(result.into())
}

/// Annualized carry at `tenor_months` from a `{tenor_months: net_debit}` table.
#[pyfunction]
#[pyo3(signature = (table, reference_spot, tenor_months, contracts=1, multiplier=100))]
pub fn carry_rate(
    table: HashMap<u32, f64>,
    reference_spot: f64,
    tenor_months: f64,
    contracts: u32,
    multiplier: u32,
) -> PyResult<f64> {
    let table: BTreeMap<u32, f64> = table.into_iter().collect();
    let curve = CarryCurve::from_map(&table, reference_spot, contracts, multiplier)?;
    Ok(curve.annual_rate(tenor_months))
}
