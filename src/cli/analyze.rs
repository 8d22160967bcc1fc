//! Analyze command implementation

use anyhow::{Context, Result};
use std::path::Path;
use std::sync::Arc;

use crate::analysis::{AnalysisReport, Analyzer};
use crate::config::Config;
use crate::embedding;
use crate::export;
use crate::store::EmbeddingCache;
use crate::transcript::FormatRegistry;

use super::load_exemplars;

pub fn run(
    config: &Config,
    registry: &FormatRegistry,
    transcript: &Path,
    format: Option<String>,
    out_dir: &Path,
    conversation: Option<String>,
) -> Result<()> {
    config.validate().context("Invalid configuration")?;

    let text = std::fs::read_to_string(transcript)
        .with_context(|| format!("Failed to read transcript {}", transcript.display()))?;

    let conversation_id = conversation.unwrap_or_else(|| {
        transcript
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("conversation")
            .to_string()
    });

    let store = registry.load(&text, format.as_deref(), &conversation_id)?;
    println!(
        "📄 {} messages from {} participants",
        store.len(),
        store.participants().len()
    );

    let exemplars = load_exemplars(config)?;
    let provider: Arc<dyn embedding::EmbeddingProvider> =
        Arc::from(embedding::from_config(&config.embedding)?);

    let mut cache = if config.cache.enabled {
        let path = config.cache_path();
        Some(
            EmbeddingCache::open(&path)
                .with_context(|| format!("Failed to open embedding cache {}", path.display()))?,
        )
    } else {
        None
    };

    let analyzer = Analyzer::from_config(config, provider, &exemplars, cache.as_mut())?;
    let report = analyzer.run(&store)?;

    let written = export::write_all(&report, out_dir)
        .with_context(|| format!("Failed to write exports to {}", out_dir.display()))?;

    print_report(&report);

    println!();
    for path in written {
        println!("   → {}", path.display());
    }
    println!("\n✅ Analysis complete!");
    Ok(())
}

fn print_report(report: &AnalysisReport) {
    let summary = report.summary();

    println!(
        "\nExemplars: {} ({}…) | Provider: {}",
        summary.provenance.exemplar_version,
        &summary.provenance.exemplar_fingerprint[..12],
        summary.provenance.provider_id
    );
    println!(
        "Edges: {} ({} hostile) | Degraded messages: {}",
        summary.edge_count, summary.hostile_edge_count, summary.degraded_count
    );

    if report.cases().is_empty() {
        println!("\nNo persistent cases met the policy.");
        return;
    }

    println!(
        "\n{:<16} {:<16} {:>7} {:<17} {:<17} {:>8} {:>9}",
        "Aggressor", "Victim", "Count", "First", "Last", "Days", "Severity"
    );
    println!("{}", "-".repeat(96));

    for case in report.cases() {
        println!(
            "{:<16} {:<16} {:>7} {:<17} {:<17} {:>8.2} {:>9.3}",
            truncate(&case.aggressor_id, 16),
            truncate(&case.victim_id, 16),
            case.hostile_count,
            case.first_ts.format("%Y-%m-%d %H:%M"),
            case.last_ts.format("%Y-%m-%d %H:%M"),
            case.span_days,
            case.severity_score,
        );
    }
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() > width {
        let head: String = text.chars().take(width - 3).collect();
        format!("{}...", head)
    } else {
        text.to_string()
    }
}
