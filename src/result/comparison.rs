//! Result Comparison
//!
//! Reconciles two assessment results (a current run and a baseline run)
//! control by control. Findings are correlated by target id, which is
//! assumed unique within one result; a repeated target id keeps the last
//! finding. Malformed input never fails reconciliation: missing
//! observations simply produce empty pair lists.

use std::collections::{BTreeMap, HashMap};

use serde::Serialize;
use tracing::warn;

use super::observation_pair::{create_observation_pairs, ObservationPair, StateChange, SATISFIED};
use crate::oscal::{AssessmentResult, Finding, Observation};

/// Reconciliation of a single control target
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultComparison {
    pub state_change: StateChange,

    /// Current finding status; false when removed
    pub satisfied: bool,

    /// Finding from the current run
    pub finding: Option<Finding>,

    /// Finding from the baseline run
    pub compared_finding: Option<Finding>,

    pub observation_pairs: Vec<ObservationPair>,
}

fn finding_satisfied(finding: &Finding) -> bool {
    finding.target.status.state == SATISFIED
}

impl ResultComparison {
    fn new(
        finding: Option<&Finding>,
        compared_finding: Option<&Finding>,
        related: &[&Observation],
        compared_related: &[&Observation],
    ) -> Self {
        let (state_change, satisfied) = match (finding, compared_finding) {
            (Some(f), Some(c)) => (
                StateChange::between(finding_satisfied(f), finding_satisfied(c)),
                finding_satisfied(f),
            ),
            (Some(f), None) => (StateChange::New, finding_satisfied(f)),
            (None, _) => (StateChange::Removed, false),
        };

        Self {
            state_change,
            satisfied,
            finding: finding.cloned(),
            compared_finding: compared_finding.cloned(),
            observation_pairs: create_observation_pairs(
                related.iter().copied(),
                compared_related.iter().copied(),
            ),
        }
    }

    /// Observation pairs for display, optionally dropping unchanged ones
    pub fn observation_rows(&self, changed_only: bool) -> impl Iterator<Item = &ObservationPair> {
        self.observation_pairs
            .iter()
            .filter(move |p| !(changed_only && p.state_change == StateChange::Unchanged))
    }
}

/// Per-target reconciliation of two results, ordered by target id
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ResultComparisonMap {
    comparisons: BTreeMap<String, ResultComparison>,
}

impl ResultComparisonMap {
    /// Reconcile `result` against the `compared` baseline.
    ///
    /// The map holds exactly one entry per target id appearing in either
    /// result.
    pub fn new(result: &AssessmentResult, compared: &AssessmentResult) -> Self {
        let findings = finding_map(&result.findings);
        let compared_findings = finding_map(&compared.findings);

        let related = related_observations(&findings, &result.observations);
        let compared_related = related_observations(&compared_findings, &compared.observations);

        let mut comparisons = BTreeMap::new();

        for (target_id, finding) in &findings {
            let compared_finding = compared_findings.get(target_id).copied();
            let compared_obs = match compared_finding {
                Some(_) => observations_for(&compared_related, target_id),
                None => &[],
            };
            comparisons.insert(
                target_id.to_string(),
                ResultComparison::new(
                    Some(*finding),
                    compared_finding,
                    observations_for(&related, target_id),
                    compared_obs,
                ),
            );
        }

        for (target_id, compared_finding) in &compared_findings {
            if findings.contains_key(target_id) {
                continue;
            }
            comparisons.insert(
                target_id.to_string(),
                ResultComparison::new(
                    None,
                    Some(*compared_finding),
                    &[],
                    observations_for(&compared_related, target_id),
                ),
            );
        }

        Self { comparisons }
    }

    /// Merge several comparison maps into one.
    ///
    /// Target ids are expected to be unique across the inputs; on a
    /// collision the later map wins and a warning is logged.
    pub fn collapse<I>(maps: I) -> Self
    where
        I: IntoIterator<Item = ResultComparisonMap>,
    {
        let mut comparisons = BTreeMap::new();
        for map in maps {
            for (target_id, comparison) in map.comparisons {
                if comparisons.contains_key(&target_id) {
                    warn!(target_id = %target_id, "Duplicate target while collapsing comparisons; keeping the later one");
                }
                comparisons.insert(target_id, comparison);
            }
        }
        Self { comparisons }
    }

    /// Sub-map of targets with the given transition and satisfaction
    pub fn filter_by_state(&self, state_change: StateChange, satisfied: bool) -> Self {
        self.comparisons
            .iter()
            .filter(|(_, c)| c.state_change == state_change && c.satisfied == satisfied)
            .map(|(k, c)| (k.clone(), c.clone()))
            .collect()
    }

    pub fn get(&self, target_id: &str) -> Option<&ResultComparison> {
        self.comparisons.get(target_id)
    }

    pub fn contains(&self, target_id: &str) -> bool {
        self.comparisons.contains_key(target_id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ResultComparison)> {
        self.comparisons.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn target_ids(&self) -> impl Iterator<Item = &str> {
        self.comparisons.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.comparisons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.comparisons.is_empty()
    }
}

impl FromIterator<(String, ResultComparison)> for ResultComparisonMap {
    fn from_iter<T: IntoIterator<Item = (String, ResultComparison)>>(iter: T) -> Self {
        Self {
            comparisons: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for ResultComparisonMap {
    type Item = (String, ResultComparison);
    type IntoIter = std::collections::btree_map::IntoIter<String, ResultComparison>;

    fn into_iter(self) -> Self::IntoIter {
        self.comparisons.into_iter()
    }
}

/// Findings keyed by target id (1:1 assumed; the last duplicate wins)
fn finding_map(findings: &[Finding]) -> HashMap<&str, &Finding> {
    findings
        .iter()
        .map(|f| (f.target.target_id.as_str(), f))
        .collect()
}

/// Observations referenced by each target's finding, in reference order.
/// Dangling references are skipped.
fn related_observations<'a>(
    findings: &HashMap<&'a str, &'a Finding>,
    observations: &'a [Observation],
) -> HashMap<&'a str, Vec<&'a Observation>> {
    let by_uuid: HashMap<&str, &Observation> =
        observations.iter().map(|o| (o.uuid.as_str(), o)).collect();

    findings
        .iter()
        .map(|(target_id, finding)| {
            let related = finding
                .related_observations
                .iter()
                .filter_map(|r| by_uuid.get(r.observation_uuid.as_str()).copied())
                .collect();
            (*target_id, related)
        })
        .collect()
}

fn observations_for<'m, 'a>(
    related: &'m HashMap<&'a str, Vec<&'a Observation>>,
    target_id: &str,
) -> &'m [&'a Observation] {
    related.get(target_id).map(Vec::as_slice).unwrap_or(&[])
}
