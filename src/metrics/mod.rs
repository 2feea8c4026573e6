//! Performance metrics for synthsim.

pub mod drawdown;
pub mod returns;
pub mod summary;

pub use drawdown::{drawdown_curve, max_drawdown, DrawdownTracker};
pub use returns::{cagr, yearly_comparison, yearly_returns, YearlyComparison, YearlyReturn};
pub use summary::{compute_metrics, summarize_curve, CurveSummary, Metrics};
