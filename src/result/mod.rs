//! Result Reconciliation
//!
//! Compares two assessment-result runs control by control and check by
//! check, classifying every difference as one of the [`StateChange`]
//! transitions.
//!
//! # Usage
//!
//! ```ignore
//! use assay::result::{ReportFilter, ResultComparisonMap};
//!
//! let comparisons = ResultComparisonMap::new(&current, &baseline);
//!
//! for row in comparisons.control_rows() {
//!     println!("{} {} {}", row.target_id, row.state_change, row.satisfied);
//! }
//!
//! let report = comparisons.observation_report(ReportFilter::default().changed_only());
//! let export = comparisons.machine_friendly_observations();
//! ```
//!
//! # Classification
//!
//! - Absent from the baseline: `NEW`
//! - Absent from the current run: `REMOVED`
//! - Otherwise the satisfaction tokens decide between `UNCHANGED` and the
//!   two transitions

mod comparison;
mod evaluate;
mod observation_pair;
mod report;

pub use comparison::{ResultComparison, ResultComparisonMap};
pub use evaluate::{evaluate, select_runs, EvaluationOutcome};
pub use observation_pair::{
    create_observation_pairs, is_satisfied_token, observation_satisfied, ObservationPair,
    StateChange, NOT_SATISFIED, SATISFIED,
};
pub use report::{
    satisfied_display, ControlRow, ObservationReport, ObservationRef, ObservationRow,
    ObservationsByControl, ReportFilter,
};
