//! Run Evaluation
//!
//! Decides whether a new assessment run regressed against its threshold.
//! A run fails evaluation when any control moved from satisfied to
//! not-satisfied; new, removed, and improved controls are reported but do
//! not fail it.

use serde::Serialize;

use super::comparison::ResultComparisonMap;
use super::observation_pair::StateChange;
use crate::oscal::AssessmentResult;

/// Outcome of comparing a run against its threshold
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvaluationOutcome {
    /// Uuid of the run being evaluated
    pub result_uuid: String,

    /// Uuid of the threshold it was compared against
    pub threshold_uuid: String,

    pub comparisons: ResultComparisonMap,
}

impl EvaluationOutcome {
    /// Compare `result` against `threshold`
    pub fn new(result: &AssessmentResult, threshold: &AssessmentResult) -> Self {
        Self {
            result_uuid: result.uuid.clone(),
            threshold_uuid: threshold.uuid.clone(),
            comparisons: ResultComparisonMap::new(result, threshold),
        }
    }

    fn targets_with(&self, state_change: StateChange) -> Vec<&str> {
        self.comparisons
            .iter()
            .filter(|(_, c)| c.state_change == state_change)
            .map(|(t, _)| t)
            .collect()
    }

    /// Controls that went from satisfied to not-satisfied
    pub fn regressions(&self) -> Vec<&str> {
        self.targets_with(StateChange::SatisfiedToNotSatisfied)
    }

    /// Controls that went from not-satisfied to satisfied
    pub fn improvements(&self) -> Vec<&str> {
        self.targets_with(StateChange::NotSatisfiedToSatisfied)
    }

    /// Controls present only in the evaluated run
    pub fn new_controls(&self) -> Vec<&str> {
        self.targets_with(StateChange::New)
    }

    /// Controls present only in the threshold
    pub fn removed_controls(&self) -> Vec<&str> {
        self.targets_with(StateChange::Removed)
    }

    pub fn passed(&self) -> bool {
        self.regressions().is_empty()
    }
}

/// Evaluate `current` against the `threshold` run
pub fn evaluate(current: &AssessmentResult, threshold: &AssessmentResult) -> EvaluationOutcome {
    EvaluationOutcome::new(current, threshold)
}

/// Pick the run to evaluate and the threshold to compare it against.
///
/// The evaluated run is the latest by start time. The threshold is the
/// result marked `threshold=true`, or otherwise the earliest run. Returns
/// `None` when fewer than two runs are available.
pub fn select_runs(results: &[AssessmentResult]) -> Option<(&AssessmentResult, &AssessmentResult)> {
    if results.len() < 2 {
        return None;
    }

    let latest = results.iter().max_by_key(|r| r.start)?;
    let threshold = results
        .iter()
        .filter(|r| !std::ptr::eq(*r, latest))
        .find(|r| r.is_threshold())
        .or_else(|| {
            results
                .iter()
                .filter(|r| !std::ptr::eq(*r, latest))
                .min_by_key(|r| r.start)
        })?;

    Some((latest, threshold))
}
