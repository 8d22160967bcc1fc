//! Persistence detection over hostile edges
//!
//! Per directed pair: sort hostile edges by time, cut wherever the gap to
//! the previous edge exceeds `max_gap_days`, and keep the runs that reach
//! both `min_hostile_count` and `min_span_days`.

use chrono::NaiveDateTime;
use std::collections::BTreeMap;

use super::graph::InteractionEdge;
use crate::config::PersistencePolicy;
use crate::error::Result;

const MILLIS_PER_DAY: f64 = 86_400_000.0;

/// Fractional days from `from` to `to`
pub fn days_between(from: NaiveDateTime, to: NaiveDateTime) -> f64 {
    (to - from).num_milliseconds() as f64 / MILLIS_PER_DAY
}

/// A contiguous run of hostility from one aggressor to one victim
#[derive(Debug, Clone, PartialEq)]
pub struct HostileRun {
    pub aggressor_id: String,
    pub victim_id: String,
    pub edges: Vec<InteractionEdge>,
}

impl HostileRun {
    pub fn span_days(&self) -> f64 {
        match (self.edges.first(), self.edges.last()) {
            (Some(first), Some(last)) => days_between(first.timestamp, last.timestamp),
            _ => 0.0,
        }
    }
}

pub struct PersistenceDetector {
    policy: PersistencePolicy,
}

impl PersistenceDetector {
    pub fn new(policy: PersistencePolicy) -> Result<Self> {
        policy.validate()?;
        Ok(Self { policy })
    }

    pub fn policy(&self) -> &PersistencePolicy {
        &self.policy
    }

    /// Split time-sorted edges wherever consecutive gaps exceed `max_gap_days`
    pub fn split_runs(edges: &[InteractionEdge], max_gap_days: f64) -> Vec<Vec<InteractionEdge>> {
        let mut runs: Vec<Vec<InteractionEdge>> = vec![];
        let mut current: Vec<InteractionEdge> = vec![];

        for edge in edges {
            if let Some(previous) = current.last() {
                if days_between(previous.timestamp, edge.timestamp) > max_gap_days {
                    runs.push(std::mem::take(&mut current));
                }
            }
            current.push(edge.clone());
        }
        if !current.is_empty() {
            runs.push(current);
        }
        runs
    }

    /// Accepted runs over all pairs, ordered by (aggressor, victim, start)
    pub fn detect(&self, edges: &[InteractionEdge]) -> Vec<HostileRun> {
        let mut by_pair: BTreeMap<(&str, &str), Vec<InteractionEdge>> = BTreeMap::new();
        for edge in edges.iter().filter(|e| e.is_hostile) {
            by_pair
                .entry((edge.aggressor_id.as_str(), edge.victim_id.as_str()))
                .or_default()
                .push(edge.clone());
        }

        let mut accepted = vec![];
        for ((aggressor, victim), mut pair_edges) in by_pair {
            pair_edges.sort_by(|a, b| {
                a.timestamp
                    .cmp(&b.timestamp)
                    .then(a.message_id.cmp(&b.message_id))
            });

            let candidates = Self::split_runs(&pair_edges, self.policy.max_gap_days);
            let candidate_count = candidates.len();

            for run_edges in candidates {
                let run = HostileRun {
                    aggressor_id: aggressor.to_string(),
                    victim_id: victim.to_string(),
                    edges: run_edges,
                };
                if run.edges.len() >= self.policy.min_hostile_count
                    && run.span_days() >= self.policy.min_span_days
                {
                    accepted.push(run);
                }
            }

            tracing::debug!(
                aggressor,
                victim,
                hostile = pair_edges.len(),
                candidate_runs = candidate_count,
                "evaluated pair"
            );
        }

        tracing::info!(runs = accepted.len(), "persistence detection complete");
        accepted
    }
}
