//! Export of a finished run
//!
//! Files written to the output directory:
//! - cases.csv      one row per persistent case, ranked
//! - edges.jsonl    every interaction edge
//! - graph.json     nodes plus weighted directed pairs
//! - graph.dot      Graphviz rendering of hostile pairs
//! - manifest.json  run summary, exemplar provenance and policy
//!
//! Everything is rendered in memory, written into a staging directory next
//! to the target and only then moved into place. A failed run leaves no
//! partial export behind.

mod graph;
mod table;

pub use graph::{render_dot, render_json};
pub use table::render_cases;

use std::path::{Path, PathBuf};

use crate::analysis::{AnalysisReport, InteractionEdge, RunSummary};
use crate::error::Result;

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

pub const CASES_FILE: &str = "cases.csv";
pub const EDGES_FILE: &str = "edges.jsonl";
pub const GRAPH_JSON_FILE: &str = "graph.json";
pub const GRAPH_DOT_FILE: &str = "graph.dot";
pub const MANIFEST_FILE: &str = "manifest.json";

pub fn render_edges(edges: &[InteractionEdge]) -> Result<String> {
    let mut out = String::new();
    for edge in edges {
        out.push_str(&serde_json::to_string(edge)?);
        out.push('\n');
    }
    Ok(out)
}

pub fn render_manifest(summary: &RunSummary) -> Result<String> {
    Ok(serde_json::to_string_pretty(summary)?)
}

/// Write every export for `report` into `dir`, returning the written paths
pub fn write_all(report: &AnalysisReport, dir: &Path) -> Result<Vec<PathBuf>> {
    let files = [
        (CASES_FILE, render_cases(report.cases())?),
        (EDGES_FILE, render_edges(report.edges())?),
        (GRAPH_JSON_FILE, render_json(report.edges())?),
        (GRAPH_DOT_FILE, render_dot(report.edges())),
        (MANIFEST_FILE, render_manifest(report.summary())?),
    ];

    let parent = match dir.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    std::fs::create_dir_all(&parent)?;

    // Dropped (and removed) on every exit path
    let staging = tempfile::Builder::new()
        .prefix(".chatwitness-export-")
        .tempdir_in(&parent)?;
    for (name, content) in &files {
        std::fs::write(staging.path().join(name), content)?;
    }

    let names: Vec<&str> = files.iter().map(|(name, _)| *name).collect();
    if dir.exists() {
        publish_into(staging.path(), dir, &names)?;
    } else {
        std::fs::rename(staging.path(), dir)?;
    }

    let written: Vec<PathBuf> = names.iter().map(|name| dir.join(name)).collect();
    for path in &written {
        tracing::debug!(path = %path.display(), "wrote export");
    }
    Ok(written)
}

/// Move staged files into an existing directory, all or nothing
fn publish_into(staging: &Path, dir: &Path, names: &[&str]) -> Result<()> {
    let mut moved: Vec<PathBuf> = vec![];
    for name in names {
        let target = dir.join(name);
        if let Err(e) = std::fs::rename(staging.join(name), &target) {
            for path in &moved {
                if let Err(cleanup) = std::fs::remove_file(path) {
                    tracing::warn!(path = %path.display(), error = %cleanup, "could not roll back export");
                }
            }
            return Err(e.into());
        }
        moved.push(target);
    }
    Ok(())
}
