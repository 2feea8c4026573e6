//! Synthetic funding simulation for synthsim.

pub mod benchmark;
pub mod engine;
pub mod feasibility;
pub mod params;
pub mod result;
pub mod state;

pub use benchmark::{equal_cash_curve, BenchmarkReport};
pub use engine::{simulate, Simulation, SimulationEngine};
pub use feasibility::{initial_margin_check, MarginFeasibility};
pub use params::{MarginBreachPolicy, SimulationParameters};
pub use result::{DailyResultRow, RollEvent, SimulationResult};
pub use state::{AccountState, Checkpoint, FrozenAccount, SimulationState};
