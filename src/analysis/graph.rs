//! Directed interaction edges between participants

use chrono::NaiveDateTime;
use petgraph::graph::{DiGraph, NodeIndex};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use super::classifier::Classification;
use super::resolver::AddresseeGuess;
use crate::transcript::Message;

/// One message from `aggressor_id` directed at `victim_id`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InteractionEdge {
    pub aggressor_id: String,
    pub victim_id: String,
    pub timestamp: NaiveDateTime,
    pub message_id: u64,
    pub hostility_score: f32,
    pub is_hostile: bool,
    pub exemplar_index: Option<usize>,
}

/// Per-pair totals, the weighted-edge view of the graph
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PairWeight {
    pub aggressor_id: String,
    pub victim_id: String,
    pub hostile_count: usize,
    pub total_count: usize,
}

impl fmt::Display for PairWeight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.hostile_count, self.total_count)
    }
}

/// Append-only, timestamp-ordered edge list
#[derive(Debug, Clone, Default)]
pub struct InteractionGraph {
    edges: Vec<InteractionEdge>,
}

impl InteractionGraph {
    /// Build edges from messages in store order.
    ///
    /// `addressees` and `classifications` must be aligned with `messages`.
    /// Messages without an addressee, or addressed to their own sender,
    /// produce nothing.
    pub fn build(
        messages: &[Message],
        addressees: &[Option<AddresseeGuess>],
        classifications: &[Classification],
    ) -> Self {
        let mut graph = Self::default();

        for ((message, addressee), classification) in
            messages.iter().zip(addressees).zip(classifications)
        {
            let Some(addressee) = addressee else {
                continue;
            };
            if addressee.candidate_target_id == message.sender_id {
                continue;
            }
            graph.push(InteractionEdge {
                aggressor_id: message.sender_id.clone(),
                victim_id: addressee.candidate_target_id.clone(),
                timestamp: message.timestamp,
                message_id: message.id,
                hostility_score: classification.hostility_score,
                is_hostile: classification.is_hostile,
                exemplar_index: classification.exemplar_index,
            });
        }

        tracing::info!(
            edges = graph.edges.len(),
            hostile = graph.hostile_count(),
            "built interaction graph"
        );
        graph
    }

    fn push(&mut self, edge: InteractionEdge) {
        debug_assert!(edge.aggressor_id != edge.victim_id);
        debug_assert!(self
            .edges
            .last()
            .map_or(true, |last| last.timestamp <= edge.timestamp));
        self.edges.push(edge);
    }

    pub fn edges(&self) -> &[InteractionEdge] {
        &self.edges
    }

    pub fn into_edges(self) -> Vec<InteractionEdge> {
        self.edges
    }

    pub fn hostile_count(&self) -> usize {
        self.edges.iter().filter(|e| e.is_hostile).count()
    }

    /// Participant graph with one weighted edge per directed pair.
    ///
    /// Nodes are added in name order and edges in (aggressor, victim)
    /// order, so indices and iteration order are stable across runs.
    pub fn weighted(edges: &[InteractionEdge]) -> DiGraph<String, PairWeight> {
        let mut totals: BTreeMap<(&str, &str), (usize, usize)> = BTreeMap::new();
        for edge in edges {
            let entry = totals
                .entry((edge.aggressor_id.as_str(), edge.victim_id.as_str()))
                .or_default();
            if edge.is_hostile {
                entry.0 += 1;
            }
            entry.1 += 1;
        }

        let names: BTreeSet<&str> = edges
            .iter()
            .flat_map(|e| [e.aggressor_id.as_str(), e.victim_id.as_str()])
            .collect();

        let mut graph = DiGraph::new();
        let mut index: BTreeMap<&str, NodeIndex> = BTreeMap::new();
        for name in names {
            index.insert(name, graph.add_node(name.to_string()));
        }

        for ((aggressor, victim), (hostile_count, total_count)) in totals {
            graph.add_edge(
                index[aggressor],
                index[victim],
                PairWeight {
                    aggressor_id: aggressor.to_string(),
                    victim_id: victim.to_string(),
                    hostile_count,
                    total_count,
                },
            );
        }
        graph
    }

    /// Totals per directed pair, sorted by (aggressor, victim)
    pub fn pair_weights(edges: &[InteractionEdge]) -> Vec<PairWeight> {
        Self::weighted(edges).edge_weights().cloned().collect()
    }

    /// Every participant appearing on an edge, sorted
    pub fn nodes(edges: &[InteractionEdge]) -> Vec<String> {
        Self::weighted(edges).node_weights().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::resolver::ResolutionBasis;
    use chrono::NaiveDate;

    fn message(id: u64, sender: &str) -> Message {
        Message {
            id,
            conversation_id: "room".to_string(),
            sender_id: sender.to_string(),
            timestamp: NaiveDate::from_ymd_opt(2024, 1, 1)
                .unwrap()
                .and_hms_opt(10, id as u32, 0)
                .unwrap(),
            raw_text: String::new(),
        }
    }

    fn to(id: u64, target: &str) -> Option<AddresseeGuess> {
        Some(AddresseeGuess {
            message_id: id,
            candidate_target_id: target.to_string(),
            confidence: 0.6,
            basis: ResolutionBasis::LastSpeaker,
        })
    }

    fn scored(score: f32, hostile: bool) -> Classification {
        Classification {
            hostility_score: score,
            is_hostile: hostile,
            exemplar_index: Some(0),
        }
    }

    #[test]
    fn test_edges_skip_unresolved_and_self() {
        let messages = vec![message(0, "A"), message(1, "B"), message(2, "A"), message(3, "B")];
        let addressees = vec![None, to(1, "A"), to(2, "A"), to(3, "A")];
        let classes = vec![
            scored(0.9, true),
            scored(0.9, true),
            scored(0.2, false),
            scored(0.7, true),
        ];

        let graph = InteractionGraph::build(&messages, &addressees, &classes);
        let ids: Vec<u64> = graph.edges().iter().map(|e| e.message_id).collect();
        assert_eq!(ids, vec![1, 3]);
        assert!(graph.edges().iter().all(|e| e.aggressor_id == "B" && e.victim_id == "A"));
        assert_eq!(graph.hostile_count(), 2);
    }

    #[test]
    fn test_pair_weights_keep_direction_and_multiplicity() {
        let messages = vec![message(0, "A"), message(1, "B"), message(2, "A"), message(3, "A")];
        let addressees = vec![to(0, "B"), to(1, "A"), to(2, "B"), to(3, "B")];
        let classes = vec![
            scored(0.9, true),
            scored(0.1, false),
            scored(0.8, true),
            scored(0.3, false),
        ];

        let graph = InteractionGraph::build(&messages, &addressees, &classes);
        let weights = InteractionGraph::pair_weights(graph.edges());
        assert_eq!(
            weights,
            vec![
                PairWeight {
                    aggressor_id: "A".into(),
                    victim_id: "B".into(),
                    hostile_count: 2,
                    total_count: 3,
                },
                PairWeight {
                    aggressor_id: "B".into(),
                    victim_id: "A".into(),
                    hostile_count: 0,
                    total_count: 1,
                },
            ]
        );
        assert_eq!(InteractionGraph::nodes(graph.edges()), vec!["A", "B"]);
    }

    #[test]
    fn test_weighted_graph_is_directed_and_sorted() {
        let messages = vec![message(0, "Cy"), message(1, "Al"), message(2, "Bo")];
        let addressees = vec![to(0, "Al"), to(1, "Cy"), to(2, "Al")];
        let classes = vec![scored(0.9, true), scored(0.1, false), scored(0.8, true)];

        let graph = InteractionGraph::build(&messages, &addressees, &classes);
        let weighted = InteractionGraph::weighted(graph.edges());

        assert_eq!(weighted.node_count(), 3);
        assert_eq!(weighted.edge_count(), 3);
        let names: Vec<&String> = weighted.node_weights().collect();
        assert_eq!(names, vec!["Al", "Bo", "Cy"]);

        let al = NodeIndex::new(0);
        let cy = NodeIndex::new(2);
        let forward = weighted.find_edge(cy, al).unwrap();
        assert_eq!(weighted[forward].hostile_count, 1);
        let back = weighted.find_edge(al, cy).unwrap();
        assert_eq!(weighted[back].to_string(), "0/1");
    }
}
