//! Observation Pairing
//!
//! Observation uuids are regenerated on every run, so two runs can only be
//! correlated through the observation description, which names the check.
//! Pairing walks the union of names (current order first, then names only
//! the baseline has) and classifies each name exactly once.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::oscal::Observation;

/// Satisfaction state of a finding target
pub const SATISFIED: &str = "satisfied";

/// Failing satisfaction state of a finding target
pub const NOT_SATISFIED: &str = "not-satisfied";

/// Transition between the baseline run and the current run
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum StateChange {
    #[serde(rename = "NOT SATISFIED TO SATISFIED")]
    NotSatisfiedToSatisfied,
    #[serde(rename = "SATISFIED TO NOT SATISFIED")]
    SatisfiedToNotSatisfied,
    #[serde(rename = "NEW")]
    New,
    #[serde(rename = "REMOVED")]
    Removed,
    #[serde(rename = "UNCHANGED")]
    Unchanged,
}

impl StateChange {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotSatisfiedToSatisfied => "NOT SATISFIED TO SATISFIED",
            Self::SatisfiedToNotSatisfied => "SATISFIED TO NOT SATISFIED",
            Self::New => "NEW",
            Self::Removed => "REMOVED",
            Self::Unchanged => "UNCHANGED",
        }
    }

    /// Classify two satisfaction states present on both sides
    pub fn between(current: bool, baseline: bool) -> Self {
        match (baseline, current) {
            (false, true) => Self::NotSatisfiedToSatisfied,
            (true, false) => Self::SatisfiedToNotSatisfied,
            _ => Self::Unchanged,
        }
    }
}

impl fmt::Display for StateChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether text carries the `satisfied` token rather than `not-satisfied`
pub fn is_satisfied_token(text: &str) -> bool {
    let text = text.to_lowercase();
    !text.contains(NOT_SATISFIED) && text.contains(SATISFIED)
}

/// Satisfaction of an observation, read from its first evidence entry
pub fn observation_satisfied(observation: &Observation) -> bool {
    observation
        .relevant_evidence
        .first()
        .is_some_and(|e| is_satisfied_token(&e.description))
}

/// Displayable summary of an observation
fn observation_summary(observation: &Observation) -> String {
    observation
        .relevant_evidence
        .first()
        .and_then(|e| e.remarks.clone())
        .unwrap_or_default()
}

/// One observation name correlated across two runs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObservationPair {
    /// Stable correlation key (the observation description)
    pub name: String,

    pub state_change: StateChange,

    /// Current-run satisfaction; false when removed
    pub satisfied: bool,

    /// Summary of the current-run observation
    pub observation: Option<String>,

    /// Summary of the baseline observation
    pub compared_observation: Option<String>,

    pub observation_uuid: Option<String>,

    pub compared_observation_uuid: Option<String>,
}

impl ObservationPair {
    fn new(current: Option<&Observation>, baseline: Option<&Observation>, name: &str) -> Self {
        let (state_change, satisfied) = match (current, baseline) {
            (Some(c), Some(b)) => {
                let satisfied = observation_satisfied(c);
                (StateChange::between(satisfied, observation_satisfied(b)), satisfied)
            }
            (Some(c), None) => (StateChange::New, observation_satisfied(c)),
            (None, _) => (StateChange::Removed, false),
        };

        Self {
            name: name.to_string(),
            state_change,
            satisfied,
            observation: current.map(observation_summary),
            compared_observation: baseline.map(observation_summary),
            observation_uuid: current.map(|o| o.uuid.clone()),
            compared_observation_uuid: baseline.map(|o| o.uuid.clone()),
        }
    }
}

/// Name-indexed view of observations, remembering first-seen order.
/// A repeated name keeps its first position and its last observation.
fn index_by_name<'a, I>(observations: I) -> (Vec<&'a str>, HashMap<&'a str, &'a Observation>)
where
    I: IntoIterator<Item = &'a Observation>,
{
    let mut order = Vec::new();
    let mut by_name = HashMap::new();
    for observation in observations {
        let name = observation.description.as_str();
        if by_name.insert(name, observation).is_none() {
            order.push(name);
        }
    }
    (order, by_name)
}

/// Pair current observations with baseline observations by name.
///
/// Produces exactly one pair per distinct name across both inputs.
pub fn create_observation_pairs<'a, C, B>(current: C, baseline: B) -> Vec<ObservationPair>
where
    C: IntoIterator<Item = &'a Observation>,
    B: IntoIterator<Item = &'a Observation>,
{
    let (current_order, current) = index_by_name(current);
    let (baseline_order, baseline) = index_by_name(baseline);

    let mut pairs = Vec::with_capacity(current_order.len() + baseline_order.len());

    for name in &current_order {
        pairs.push(ObservationPair::new(
            current.get(name).copied(),
            baseline.get(name).copied(),
            name,
        ));
    }

    for name in baseline_order.iter().filter(|n| !current.contains_key(*n)) {
        pairs.push(ObservationPair::new(None, baseline.get(name).copied(), name));
    }

    pairs
}
