//! Persistent case records and ranking

use chrono::NaiveDateTime;
use serde::Serialize;
use std::cmp::Ordering;

use super::graph::InteractionEdge;
use super::persistence::HostileRun;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PersistentCase {
    pub aggressor_id: String,
    pub victim_id: String,
    pub edges: Vec<InteractionEdge>,
    pub first_ts: NaiveDateTime,
    pub last_ts: NaiveDateTime,
    pub hostile_count: usize,
    pub span_days: f64,
    pub severity_score: f64,
}

/// Hostile messages per day of span, with one day added so that
/// single-day cases stay finite. Grows with the count and shrinks as the
/// same count is spread over more days.
pub fn severity(hostile_count: usize, span_days: f64) -> f64 {
    hostile_count as f64 / (1.0 + span_days)
}

pub struct CaseAggregator;

impl CaseAggregator {
    /// Turn accepted runs into ranked cases: severity descending, then
    /// oldest first, then by pair.
    pub fn aggregate(runs: Vec<HostileRun>) -> Vec<PersistentCase> {
        let mut cases: Vec<PersistentCase> = runs
            .into_iter()
            .filter_map(|run| {
                let span_days = run.span_days();
                let first_ts = run.edges.iter().map(|e| e.timestamp).min()?;
                let last_ts = run.edges.iter().map(|e| e.timestamp).max()?;
                let hostile_count = run.edges.len();
                Some(PersistentCase {
                    aggressor_id: run.aggressor_id,
                    victim_id: run.victim_id,
                    edges: run.edges,
                    first_ts,
                    last_ts,
                    hostile_count,
                    span_days,
                    severity_score: severity(hostile_count, span_days),
                })
            })
            .collect();

        cases.sort_by(|a, b| {
            b.severity_score
                .partial_cmp(&a.severity_score)
                .unwrap_or(Ordering::Equal)
                .then(a.first_ts.cmp(&b.first_ts))
                .then_with(|| a.aggressor_id.cmp(&b.aggressor_id))
                .then_with(|| a.victim_id.cmp(&b.victim_id))
        });

        cases
    }
}
