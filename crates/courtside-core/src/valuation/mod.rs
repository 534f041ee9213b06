// Valuation engine: efficiency score, percentile value labels, what-if
// salary simulation, and the auxiliary per-player metrics.

pub mod efficiency;
pub mod metrics;
pub mod percentile;
pub mod simulate;

pub use efficiency::{score, score_records, ScoredRecord, ScoredTable, ValueCutoffs, ValueLabel};
pub use simulate::{simulate_salary, SalarySimulation};
