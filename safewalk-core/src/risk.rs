//! Incident application and danger-score maintenance
//!
//! Consumes *already parsed* incident reports (the text-classification call
//! is an external collaborator) and translates them into danger-score
//! mutations on the graph store. Every report is recorded for audit, whether
//! or not a street could be resolved.

use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, Utc};
use itertools::Itertools;
use log::warn;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::model::GraphStore;
use crate::{MAX_DANGER_SCORE, StreetId};

/// How an incident's severity is combined with a street's existing score.
///
/// The exact blending function is a policy choice, not an invariant; both
/// variants are monotonic in severity and keep the result in [0, 100].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "policy", rename_all = "snake_case")]
pub enum DangerPolicy {
    /// `max(old, severity)`: a single severe report cannot be diluted by
    /// later low-severity ones.
    Max,
    /// Exponential moving average `retain·old + (1−retain)·severity`:
    /// repeated incidents compound while one outlier doesn't dominate.
    Blend { retain: f64 },
}

impl Default for DangerPolicy {
    fn default() -> Self {
        Self::Max
    }
}

impl DangerPolicy {
    pub fn combine(self, old_score: f64, severity: f64) -> f64 {
        let combined = match self {
            Self::Max => old_score.max(severity),
            Self::Blend { retain } => retain * old_score + (1.0 - retain) * severity,
        };
        combined.clamp(0.0, MAX_DANGER_SCORE)
    }
}

/// A structured incident as delivered by the parsing collaborator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IncidentReport {
    /// Raw report text, preserved for audit
    pub raw_text: String,
    /// Resolved target street id, when the parser localized one
    #[serde(default)]
    pub street_id: Option<StreetId>,
    /// Parsed street name, matched against street display names when no id
    /// was resolved
    #[serde(default)]
    pub street_name: Option<String>,
    /// Severity in danger-score units; clamped to [0, 100] at this boundary
    pub severity: f64,
    #[serde(default)]
    pub category: Option<String>,
}

/// Stored incident record. Immutable once recorded except for `resolved`,
/// which only affects display/audit, never danger-score computation.
#[derive(Debug, Clone, Serialize)]
pub struct Incident {
    pub id: String,
    pub raw_text: String,
    /// Street the update was applied to; `None` if none could be resolved
    pub street_id: Option<StreetId>,
    pub severity: f64,
    pub category: Option<String>,
    pub reported_at: DateTime<Utc>,
    pub resolved: bool,
}

/// Translates structured incidents into graph mutations and keeps the audit
/// log.
#[derive(Debug)]
pub struct RiskUpdater {
    store: Arc<GraphStore>,
    policy: DangerPolicy,
    incidents: Mutex<Vec<Incident>>,
}

impl RiskUpdater {
    pub fn new(store: Arc<GraphStore>, policy: DangerPolicy) -> Self {
        Self {
            store,
            policy,
            incidents: Mutex::new(Vec::new()),
        }
    }

    pub fn policy(&self) -> DangerPolicy {
        self.policy
    }

    /// Applies a structured incident to the graph.
    ///
    /// Resolution order: a direct `street_id`, else every street whose name
    /// contains `street_name` (case-insensitive, matching multiple segments
    /// of the same street). Each resolved street's score is recomputed under
    /// the policy and published through the store. An unknown street id is
    /// logged and dropped, never propagated as a routing failure.
    ///
    /// Returns the stored record; its `street_id` holds the first street the
    /// update was applied to, or `None` when nothing could be resolved.
    pub fn apply_incident(&self, report: IncidentReport) -> Incident {
        let severity = if report.severity.is_finite() {
            report.severity.clamp(0.0, MAX_DANGER_SCORE)
        } else {
            warn!("Incident carries non-finite severity, treating as 0");
            0.0
        };

        let snapshot = self.store.snapshot();
        let targets: Vec<StreetId> = if let Some(id) = &report.street_id {
            vec![id.clone()]
        } else if let Some(name) = &report.street_name {
            snapshot
                .streets_matching(name)
                .iter()
                .map(|s| s.id.clone())
                .collect()
        } else {
            Vec::new()
        };

        let mut applied = None;
        for street_id in &targets {
            let old_score = match snapshot.street(street_id) {
                Ok(street) => street.danger_score,
                Err(err) => {
                    warn!("Incident references unknown street {street_id}: {err}");
                    continue;
                }
            };
            let new_score = self.policy.combine(old_score, severity);
            match self.store.set_danger_score(street_id, new_score) {
                Ok(_) => {
                    if applied.is_none() {
                        applied = Some(street_id.clone());
                    }
                }
                Err(err) => warn!("Dropping danger update for street {street_id}: {err}"),
            }
        }

        let incident = Incident {
            id: Uuid::new_v4().to_string(),
            raw_text: report.raw_text,
            street_id: applied,
            severity,
            category: report.category,
            reported_at: Utc::now(),
            resolved: false,
        };
        self.incidents
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(incident.clone());
        incident
    }

    /// Most recent incidents, newest first.
    pub fn recent_incidents(&self, limit: usize) -> Vec<Incident> {
        self.incidents
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .sorted_by_key(|i| std::cmp::Reverse(i.reported_at))
            .take(limit)
            .cloned()
            .collect()
    }

    /// Flips an incident's display-only resolved flag. Returns `false` for
    /// an unknown incident id.
    pub fn resolve_incident(&self, id: &str) -> bool {
        let mut guard = self
            .incidents
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        match guard.iter_mut().find(|i| i.id == id) {
            Some(incident) => {
                incident.resolved = true;
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loading::seed::demo_graph;

    fn updater(policy: DangerPolicy) -> RiskUpdater {
        RiskUpdater::new(Arc::new(GraphStore::new(demo_graph())), policy)
    }

    fn report(street_id: &str, severity: f64) -> IncidentReport {
        IncidentReport {
            raw_text: format!("incident on {street_id}"),
            street_id: Some(street_id.to_string()),
            street_name: None,
            severity,
            category: Some("mugging".to_string()),
        }
    }

    #[test]
    fn max_policy_never_lowers_a_score() {
        let updater = updater(DangerPolicy::Max);
        let street = "state-10th-12th"; // seeded at 65

        updater.apply_incident(report(street, 40.0));
        assert_eq!(updater.store.snapshot().street(street).unwrap().danger_score, 65.0);

        updater.apply_incident(report(street, 90.0));
        assert_eq!(updater.store.snapshot().street(street).unwrap().danger_score, 90.0);

        updater.apply_incident(report(street, 10.0));
        assert_eq!(updater.store.snapshot().street(street).unwrap().danger_score, 90.0);
    }

    #[test]
    fn blend_policy_moves_toward_severity() {
        let updater = updater(DangerPolicy::Blend { retain: 0.6 });
        let street = "pine-rolla-state"; // seeded at 5

        updater.apply_incident(report(street, 55.0));
        let score = updater.store.snapshot().street(street).unwrap().danger_score;
        assert!((score - 25.0).abs() < 1e-9, "got {score}");
    }

    #[test]
    fn scores_stay_in_bounds_under_any_report_sequence() {
        let updater = updater(DangerPolicy::Max);
        let street = "pine-rolla-state";
        for severity in [250.0, -40.0, f64::NAN, 100.0, 3.0] {
            updater.apply_incident(report(street, severity));
            let score = updater.store.snapshot().street(street).unwrap().danger_score;
            assert!((0.0..=100.0).contains(&score), "got {score}");
        }
    }

    #[test]
    fn unknown_street_is_logged_and_dropped() {
        let updater = updater(DangerPolicy::Max);
        let incident = updater.apply_incident(report("not-a-street", 80.0));
        assert_eq!(incident.street_id, None);
        assert_eq!(updater.recent_incidents(10).len(), 1);
    }

    #[test]
    fn name_resolution_updates_every_matching_segment() {
        let updater = updater(DangerPolicy::Max);
        let incident = updater.apply_incident(IncidentReport {
            raw_text: "Harassment reported on State St".to_string(),
            street_id: None,
            street_name: Some("state st".to_string()),
            severity: 70.0,
            category: Some("harassment".to_string()),
        });
        assert!(incident.street_id.is_some());

        let snapshot = updater.store.snapshot();
        let matches = snapshot.streets_matching("state st");
        assert!(!matches.is_empty());
        for street in matches {
            assert!(street.danger_score >= 70.0, "{} at {}", street.id, street.danger_score);
        }
    }

    #[test]
    fn unresolvable_report_is_still_recorded() {
        let updater = updater(DangerPolicy::Max);
        let incident = updater.apply_incident(IncidentReport {
            raw_text: "Something happened somewhere".to_string(),
            street_id: None,
            street_name: None,
            severity: 50.0,
            category: None,
        });
        assert_eq!(incident.street_id, None);
        assert_eq!(updater.recent_incidents(10).len(), 1);
    }

    #[test]
    fn recent_incidents_are_newest_first_and_limited() {
        let updater = updater(DangerPolicy::Max);
        for i in 0..5 {
            updater.apply_incident(report("pine-rolla-state", f64::from(i)));
        }
        let recent = updater.recent_incidents(3);
        assert_eq!(recent.len(), 3);
        assert!(recent.windows(2).all(|w| w[0].reported_at >= w[1].reported_at));
    }

    #[test]
    fn resolve_flag_flips_once_known() {
        let updater = updater(DangerPolicy::Max);
        let incident = updater.apply_incident(report("pine-rolla-state", 10.0));
        assert!(updater.resolve_incident(&incident.id));
        assert!(!updater.resolve_incident("nope"));
        assert!(updater.recent_incidents(1)[0].resolved);
    }
}
