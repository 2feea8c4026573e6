//! Option carry modelling for synthsim.

pub mod curve;
pub mod overlay;

pub use curve::{CarryCurve, CarryPoint};
pub use overlay::{CarryAdjustedRow, CarryOverlay, CarryOverlayResult};
