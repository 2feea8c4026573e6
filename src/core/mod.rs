//! Core types and utilities for synthsim.

pub mod calendar;
pub mod error;
pub mod timeseries;
pub mod types;

pub use error::{Result, SimError};
pub use timeseries::{RateSeries, TimeSeries};
pub use types::*;
