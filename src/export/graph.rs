//! Relationship graph exports: JSON for tooling, DOT for Graphviz

use petgraph::dot::{Config as DotConfig, Dot};
use petgraph::visit::EdgeRef;
use serde::Serialize;

use crate::analysis::{InteractionEdge, InteractionGraph};

#[derive(Serialize)]
struct GraphDocument<'a> {
    nodes: Vec<String>,
    edges: Vec<GraphEdge<'a>>,
}

#[derive(Serialize)]
struct GraphEdge<'a> {
    source: &'a str,
    target: &'a str,
    hostile_count: usize,
    total_count: usize,
}

pub fn render_json(edges: &[InteractionEdge]) -> serde_json::Result<String> {
    let weights = InteractionGraph::pair_weights(edges);
    let document = GraphDocument {
        nodes: InteractionGraph::nodes(edges),
        edges: weights
            .iter()
            .map(|w| GraphEdge {
                source: &w.aggressor_id,
                target: &w.victim_id,
                hostile_count: w.hostile_count,
                total_count: w.total_count,
            })
            .collect(),
    };
    serde_json::to_string_pretty(&document)
}

/// Every participant as a node; only pairs with hostility get an arrow
pub fn render_dot(edges: &[InteractionEdge]) -> String {
    let graph = InteractionGraph::weighted(edges).filter_map(
        |_, name| Some(name.clone()),
        |_, weight| (weight.hostile_count > 0).then(|| weight.clone()),
    );

    let body = Dot::with_attr_getters(
        &graph,
        &[DotConfig::EdgeNoLabel, DotConfig::GraphContentOnly],
        &|_, edge| {
            let hostile_count = edge.weight().hostile_count;
            let pen_width = 1.0 + hostile_count.min(10) as f64 * 0.5;
            format!(
                "label = \"{}\" penwidth = {:.1} color = red ",
                hostile_count, pen_width
            )
        },
        &|_, _| String::new(),
    );

    format!(
        "digraph interactions {{\n    rankdir=LR;\n    node [shape=ellipse];\n{}}}\n",
        body
    )
}
