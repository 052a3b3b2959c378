//! Comparison Reports
//!
//! Read-only views over a [`ResultComparisonMap`]: one row per control,
//! observation rows flattened across controls with composable filters, and
//! a machine-readable export grouped by state change.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::comparison::ResultComparisonMap;
use super::observation_pair::{ObservationPair, StateChange};

/// Display form of a satisfaction flag; removed entries have none
pub fn satisfied_display(satisfied: bool, state_change: StateChange) -> &'static str {
    match (state_change, satisfied) {
        (StateChange::Removed, _) => "N/A",
        (_, true) => "true",
        (_, false) => "false",
    }
}

/// One control target in the per-control table
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ControlRow {
    pub target_id: String,
    pub state_change: StateChange,
    pub satisfied: &'static str,
    pub observations: usize,
}

/// Filters for the per-observation report; they compose by AND
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReportFilter {
    /// Drop unchanged pairs
    pub changed_only: bool,
    /// Drop removed pairs
    pub skip_removed: bool,
    /// Drop satisfied pairs
    pub failed_only: bool,
}

impl ReportFilter {
    pub fn changed_only(mut self) -> Self {
        self.changed_only = true;
        self
    }

    pub fn skip_removed(mut self) -> Self {
        self.skip_removed = true;
        self
    }

    pub fn failed_only(mut self) -> Self {
        self.failed_only = true;
        self
    }

    /// Whether an entry with this transition and satisfaction passes every
    /// enabled filter
    pub fn admits_state(&self, state_change: StateChange, satisfied: bool) -> bool {
        !(self.changed_only && state_change == StateChange::Unchanged)
            && !(self.skip_removed && state_change == StateChange::Removed)
            && !(self.failed_only && satisfied)
    }

    /// Whether a pair passes every enabled filter
    pub fn admits(&self, pair: &ObservationPair) -> bool {
        self.admits_state(pair.state_change, pair.satisfied)
    }
}

/// Observation pairs regrouped across controls
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObservationsByControl {
    /// Pair name -> pair. A name shared by several controls keeps the
    /// pair from the last control in target-id order.
    pub pairs: BTreeMap<String, ObservationPair>,

    /// Pair name -> every control referencing it
    pub controls: BTreeMap<String, Vec<String>>,

    /// Controls with no observation pairs at all
    pub no_observations: Vec<String>,
}

/// One row of the cross-control observation table
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ObservationRow {
    pub control_ids: Vec<String>,
    pub name: String,
    pub satisfied: &'static str,
    pub state_change: StateChange,
    pub observation: String,
    pub compared_observation: String,
}

/// Filtered observation rows plus the controls that had nothing to show
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ObservationReport {
    pub rows: Vec<ObservationRow>,
    pub no_observations: Vec<String>,
}

/// Observation uuids of one pair, for downstream tooling
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObservationRef {
    pub new_observation: Option<String>,
    pub original_observation: Option<String>,
}

impl ResultComparisonMap {
    /// One row per control target
    pub fn control_rows(&self) -> Vec<ControlRow> {
        self.iter()
            .map(|(target_id, c)| ControlRow {
                target_id: target_id.to_string(),
                state_change: c.state_change,
                satisfied: satisfied_display(c.satisfied, c.state_change),
                observations: c.observation_pairs.len(),
            })
            .collect()
    }

    /// Regroup every observation pair by name across all controls
    pub fn observations_by_control(&self) -> ObservationsByControl {
        let mut grouped = ObservationsByControl::default();

        for (target_id, comparison) in self.iter() {
            if comparison.observation_pairs.is_empty() {
                grouped.no_observations.push(target_id.to_string());
            }
            for pair in &comparison.observation_pairs {
                grouped.pairs.insert(pair.name.clone(), pair.clone());
                grouped
                    .controls
                    .entry(pair.name.clone())
                    .or_default()
                    .push(target_id.to_string());
            }
        }

        grouped
    }

    /// Cross-control observation table, ordered by observation name
    pub fn observation_report(&self, filter: ReportFilter) -> ObservationReport {
        let ObservationsByControl {
            pairs,
            mut controls,
            no_observations,
        } = self.observations_by_control();

        let rows = pairs
            .into_iter()
            .filter(|(_, pair)| filter.admits(pair))
            .map(|(name, pair)| ObservationRow {
                control_ids: controls.remove(&name).unwrap_or_default(),
                satisfied: satisfied_display(pair.satisfied, pair.state_change),
                state_change: pair.state_change,
                observation: pair.observation.unwrap_or_default(),
                compared_observation: pair.compared_observation.unwrap_or_default(),
                name,
            })
            .collect();

        ObservationReport {
            rows,
            no_observations,
        }
    }

    /// Every observation pair's uuids, grouped by state change
    pub fn machine_friendly_observations(&self) -> BTreeMap<StateChange, Vec<ObservationRef>> {
        let mut grouped: BTreeMap<StateChange, Vec<ObservationRef>> = BTreeMap::new();

        for (_, comparison) in self.iter() {
            for pair in &comparison.observation_pairs {
                grouped.entry(pair.state_change).or_default().push(ObservationRef {
                    new_observation: pair.observation_uuid.clone(),
                    original_observation: pair.compared_observation_uuid.clone(),
                });
            }
        }

        grouped
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::result::comparison::tests::{finding, fixture, result};
    use crate::result::observation_pair::tests::observation;

    fn shared_fixture() -> ResultComparisonMap {
        // "shared" is referenced by two controls in both runs
        let cs = observation("shared", "satisfied");
        let cu = observation("unchanged", "satisfied");
        let current = result(
            vec![
                finding("ac-1", "satisfied", &[&cs, &cu]),
                finding("ac-2", "satisfied", &[&cs]),
                finding("ac-5", "satisfied", &[]),
            ],
            vec![cs.clone(), cu.clone()],
        );

        let bs = observation("shared", "not-satisfied");
        let bu = observation("unchanged", "satisfied");
        let bg = observation("gone", "not-satisfied");
        let baseline = result(
            vec![
                finding("ac-1", "not-satisfied", &[&bs, &bu, &bg]),
                finding("ac-2", "not-satisfied", &[&bs]),
            ],
            vec![bs.clone(), bu.clone(), bg.clone()],
        );

        ResultComparisonMap::new(&current, &baseline)
    }

    #[test]
    fn test_satisfied_display() {
        assert_eq!(satisfied_display(true, StateChange::New), "true");
        assert_eq!(satisfied_display(false, StateChange::Unchanged), "false");
        assert_eq!(satisfied_display(false, StateChange::Removed), "N/A");
    }

    #[test]
    fn test_control_rows() {
        let (current, baseline) = fixture();
        let rows = ResultComparisonMap::new(&current, &baseline).control_rows();

        let summary: Vec<(&str, StateChange, &str)> = rows
            .iter()
            .map(|r| (r.target_id.as_str(), r.state_change, r.satisfied))
            .collect();
        assert_eq!(
            summary,
            vec![
                ("ac-1", StateChange::NotSatisfiedToSatisfied, "true"),
                ("ac-2", StateChange::SatisfiedToNotSatisfied, "false"),
                ("ac-3", StateChange::Removed, "N/A"),
                ("ac-4", StateChange::New, "true"),
            ]
        );
    }

    #[test]
    fn test_observations_by_control_tracks_shared_pairs() {
        let grouped = shared_fixture().observations_by_control();

        assert_eq!(grouped.controls["shared"], vec!["ac-1", "ac-2"]);
        assert_eq!(grouped.controls["gone"], vec!["ac-1"]);
        assert_eq!(grouped.pairs.len(), 3);
        assert_eq!(grouped.no_observations, vec!["ac-5"]);
    }

    #[test]
    fn test_observation_report_unfiltered() {
        let report = shared_fixture().observation_report(ReportFilter::default());

        let names: Vec<&str> = report.rows.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["gone", "shared", "unchanged"]);
        assert_eq!(report.rows[0].satisfied, "N/A");
        assert_eq!(report.rows[1].control_ids, vec!["ac-1", "ac-2"]);
        assert_eq!(report.no_observations, vec!["ac-5"]);
    }

    #[test]
    fn test_filters_compose() {
        let map = shared_fixture();

        let changed = map.observation_report(ReportFilter::default().changed_only());
        assert!(changed.rows.iter().all(|r| r.state_change != StateChange::Unchanged));
        assert_eq!(changed.rows.len(), 2);

        let no_removed = map.observation_report(ReportFilter::default().skip_removed());
        assert!(no_removed.rows.iter().all(|r| r.state_change != StateChange::Removed));

        let failed = map.observation_report(ReportFilter::default().failed_only());
        assert!(failed.rows.iter().all(|r| r.satisfied != "true"));
        assert_eq!(failed.rows.len(), 1);
        assert_eq!(failed.rows[0].name, "gone");

        let all = ReportFilter::default().changed_only().skip_removed().failed_only();
        assert!(map.observation_report(all).rows.is_empty());
    }

    #[test]
    fn test_filter_admits() {
        let pair = ObservationPair {
            name: "x".to_string(),
            state_change: StateChange::Removed,
            satisfied: false,
            observation: None,
            compared_observation: Some("old".to_string()),
            observation_uuid: None,
            compared_observation_uuid: Some("u".to_string()),
        };
        assert!(ReportFilter::default().admits(&pair));
        assert!(ReportFilter::default().changed_only().admits(&pair));
        assert!(!ReportFilter::default().skip_removed().admits(&pair));
        assert!(ReportFilter::default().failed_only().admits(&pair));
    }

    #[test]
    fn test_admits_state_matches_pair_filter() {
        let failed = ReportFilter::default().failed_only();
        assert!(!failed.admits_state(StateChange::Unchanged, true));
        assert!(failed.admits_state(StateChange::SatisfiedToNotSatisfied, false));

        let changed = ReportFilter::default().changed_only().skip_removed();
        assert!(!changed.admits_state(StateChange::Unchanged, false));
        assert!(!changed.admits_state(StateChange::Removed, false));
        assert!(changed.admits_state(StateChange::New, true));
    }

    #[test]
    fn test_machine_friendly_groups_by_state() {
        let (current, baseline) = fixture();
        let export = ResultComparisonMap::new(&current, &baseline).machine_friendly_observations();

        assert_eq!(export[&StateChange::NotSatisfiedToSatisfied].len(), 1);
        assert_eq!(export[&StateChange::SatisfiedToNotSatisfied].len(), 1);
        assert_eq!(export[&StateChange::New].len(), 1);

        let removed = &export[&StateChange::Removed];
        assert_eq!(removed.len(), 1);
        assert!(removed[0].new_observation.is_none());
        assert!(removed[0].original_observation.is_some());
        assert!(!export.contains_key(&StateChange::Unchanged));

        let json = serde_json::to_value(&export).unwrap();
        assert!(json.get("SATISFIED TO NOT SATISFIED").is_some());
    }
}
