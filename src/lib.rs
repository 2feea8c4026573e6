// Suppress warning from PyO3 macro expansion (fixed in newer PyO3 versions)
#![cfg_attr(feature = "python", allow(non_local_definitions))]

//! synthsim - funding simulator for synthetic long equity exposure.
//!
//! A synthetic long (long call + short put) tracks the underlying while the
//! margin account holds cash. This crate provides:
//! - Day-stepped simulation of rolls, margin, interest and dividend drag
//! - Margin-breach handling by top-up or liquidation
//! - Performance metrics against buy-and-hold
//! - An option carry curve and post-hoc carry overlay
//! - CSV/TOML I/O, pluggable price feeds and parallel parameter sweeps

pub mod carry;
pub mod config;
pub mod core;
pub mod feed;
pub mod io;
pub mod metrics;
#[cfg(feature = "python")]
pub mod python;
pub mod simulation;
pub mod sweep;

pub use crate::carry::{CarryCurve, CarryOverlay};
pub use crate::config::RunConfig;
pub use crate::core::{Result, SimError};
pub use crate::metrics::Metrics;
pub use crate::simulation::{simulate, SimulationEngine, SimulationParameters, SimulationResult};

#[cfg(feature = "python")]
use pyo3::prelude::*;

/// Python module entry point
#[cfg(feature = "python")]
#[pymodule]
fn _synthsim(_py: Python<'_>, m: &PyModule) -> PyResult<()> {
    // Register classes
    m.add_class::<python::bindings::PySimulationParams>()?;
    m.add_class::<python::bindings::PySimulationResult>()?;
    m.add_class::<python::bindings::PyMetrics>()?;

    // Register functions
    m.add_function(wrap_pyfunction!(python::bindings::run_synthetic_simulation, m)?)?;
    m.add_function(wrap_pyfunction!(python::bindings::carry_rate, m)?)?;

    Ok(())
}
