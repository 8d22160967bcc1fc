use chrono::{Duration, NaiveDate, NaiveDateTime};
use std::sync::Arc;

use chatwitness::analysis::{Analyzer, ExemplarSet};
use chatwitness::config::Config;
use chatwitness::embedding::{EmbeddingError, EmbeddingProvider};
use chatwitness::error::AnalysisError;
use chatwitness::export;
use chatwitness::transcript::{MessageStore, RawMessage};

/// "idiot" anywhere in the text embeds onto the exemplar axis,
/// "FAIL" makes the provider error, everything else is orthogonal.
struct KeywordProvider;

impl EmbeddingProvider for KeywordProvider {
    fn id(&self) -> String {
        "keyword-test".to_string()
    }

    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        if text.contains("FAIL") {
            return Err(EmbeddingError::Unavailable("simulated outage".to_string()));
        }
        if text.to_lowercase().contains("idiot") {
            Ok(vec![1.0, 0.0])
        } else {
            Ok(vec![0.0, 1.0])
        }
    }
}

fn at(day: i64, hour: u32, minute: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 3, 1)
        .unwrap()
        .and_hms_opt(hour, minute, 0)
        .unwrap()
        + Duration::days(day)
}

fn store(lines: &[(NaiveDateTime, &str, &str)]) -> MessageStore {
    MessageStore::new(
        "test-room",
        lines
            .iter()
            .map(|(ts, sender, text)| RawMessage {
                sender: sender.to_string(),
                timestamp: *ts,
                text: text.to_string(),
            })
            .collect(),
    )
}

fn config(min_count: usize, min_span: f64, max_gap: f64) -> Config {
    let mut config = Config::default();
    config.cache.enabled = false;
    config.persistence.min_hostile_count = min_count;
    config.persistence.min_span_days = min_span;
    config.persistence.max_gap_days = max_gap;
    config
}

fn analyzer(config: &Config) -> Analyzer {
    let exemplars = ExemplarSet::new("test-v1", vec!["idiot".to_string()]);
    Analyzer::from_config(config, Arc::new(KeywordProvider), &exemplars, None).unwrap()
}

/// Ana is hostile to Ben on days 0, 2, 3 and 20
fn scenario() -> MessageStore {
    store(&[
        (at(0, 8, 0), "Ben", "hi all"),
        (at(0, 9, 0), "Ana", "Ben you idiot"),
        (at(2, 8, 0), "Cho", "morning"),
        (at(2, 9, 0), "Ana", "ben, idiot"),
        (at(3, 8, 0), "Ben", "leave me alone"),
        (at(3, 9, 0), "Ana", "idiot"),
        (at(20, 8, 0), "Cho", "long time"),
        (at(20, 9, 0), "Ana", "ben idiot"),
    ])
}

#[test]
fn scenario_yields_single_three_message_case() {
    let report = analyzer(&config(3, 1.0, 5.0)).run(&scenario()).unwrap();

    assert_eq!(report.cases().len(), 1);
    let case = &report.cases()[0];
    assert_eq!(case.aggressor_id, "Ana");
    assert_eq!(case.victim_id, "Ben");
    assert_eq!(case.hostile_count, 3);
    assert_eq!(case.span_days, 3.0);
    assert_eq!(case.first_ts, at(0, 9, 0));
    assert_eq!(case.last_ts, at(3, 9, 0));
    assert!(case
        .edges
        .iter()
        .all(|e| e.is_hostile && e.aggressor_id == "Ana" && e.victim_id == "Ben"));

    let summary = report.summary();
    assert_eq!(summary.message_count, 8);
    assert_eq!(summary.hostile_edge_count, 4);
    assert_eq!(summary.degraded_count, 0);
    assert_eq!(summary.case_count, 1);
}

#[test]
fn first_message_produces_no_edge() {
    let report = analyzer(&config(3, 1.0, 5.0)).run(&scenario()).unwrap();
    assert!(report.edges().iter().all(|e| e.message_id != 0));
    assert_eq!(report.summary().addressed_count, 7);
}

#[test]
fn runs_are_deterministic() {
    let config = config(3, 1.0, 5.0);
    let first = analyzer(&config).run(&scenario()).unwrap();
    let second = analyzer(&config).run(&scenario()).unwrap();

    assert_eq!(
        export::render_cases(first.cases()).unwrap(),
        export::render_cases(second.cases()).unwrap()
    );
    assert_eq!(
        export::render_edges(first.edges()).unwrap(),
        export::render_edges(second.edges()).unwrap()
    );
    assert_eq!(
        export::render_dot(first.edges()),
        export::render_dot(second.edges())
    );
}

#[test]
fn symmetric_hostility_gives_two_directional_cases() {
    let mut lines = vec![];
    for day in 0..4 {
        lines.push((at(day, 9, 0), "Ana", "idiot"));
        lines.push((at(day, 9, 1), "Ben", "idiot"));
    }
    let report = analyzer(&config(3, 1.0, 5.0)).run(&store(&lines)).unwrap();

    let pairs: Vec<(&str, &str)> = report
        .cases()
        .iter()
        .map(|c| (c.aggressor_id.as_str(), c.victim_id.as_str()))
        .collect();
    assert_eq!(pairs.len(), 2);
    assert!(pairs.contains(&("Ana", "Ben")));
    assert!(pairs.contains(&("Ben", "Ana")));
    assert!(report.cases().iter().all(|c| c.aggressor_id != c.victim_id));
}

#[test]
fn raising_min_count_never_adds_cases() {
    let mut lines = vec![];
    for day in 0..12 {
        lines.push((at(day, 9, 0), "Ben", "hello"));
        lines.push((at(day, 9, 1), "Ana", "idiot"));
        if day % 3 == 0 {
            lines.push((at(day, 9, 2), "Cho", "you idiot"));
        }
        if day % 5 == 0 {
            lines.push((at(day, 9, 3), "Ben", "idiot"));
        }
    }
    let store = store(&lines);

    let mut previous = usize::MAX;
    for min_count in 1..=8 {
        let cases = analyzer(&config(min_count, 1.0, 3.0))
            .run(&store)
            .unwrap()
            .cases()
            .len();
        assert!(cases <= previous, "min_count {} produced more cases", min_count);
        previous = cases;
    }
}

#[test]
fn provider_failures_degrade_without_aborting() {
    let mut lines = vec![];
    for i in 0..100 {
        let sender = if i % 2 == 0 { "Ana" } else { "Ben" };
        let text = if i == 10 || i == 57 { "FAIL idiot" } else { "idiot" };
        lines.push((at(i / 10, 9, (i % 10) as u32), sender, text));
    }
    let report = analyzer(&config(3, 1.0, 5.0)).run(&store(&lines)).unwrap();

    let summary = report.summary();
    assert_eq!(summary.degraded_count, 2);
    assert_eq!(summary.degraded_message_ids, vec![10, 57]);
    let degraded_edges: Vec<_> = report
        .edges()
        .iter()
        .filter(|e| e.message_id == 10 || e.message_id == 57)
        .collect();
    assert_eq!(degraded_edges.len(), 2);
    assert!(degraded_edges
        .iter()
        .all(|e| !e.is_hostile && e.hostility_score == 0.0));
    assert!(!report.cases().is_empty());
}

#[test]
fn empty_transcript_is_input_error() {
    let result = analyzer(&config(3, 1.0, 5.0)).run(&store(&[]));
    assert!(matches!(result, Err(AnalysisError::Input(_))));
}

#[test]
fn invalid_policy_fails_before_running() {
    let exemplars = ExemplarSet::new("test-v1", vec!["idiot".to_string()]);
    let result = Analyzer::from_config(
        &config(3, -2.0, 5.0),
        Arc::new(KeywordProvider),
        &exemplars,
        None,
    );
    assert!(matches!(result, Err(AnalysisError::Configuration(_))));
}

#[test]
fn pinned_worker_pool_matches_default_scoring() {
    let mut pinned = config(3, 1.0, 5.0);
    pinned.classifier.workers = Some(2);

    let a = analyzer(&config(3, 1.0, 5.0)).run(&scenario()).unwrap();
    let b = analyzer(&pinned).run(&scenario()).unwrap();
    assert_eq!(a.edges(), b.edges());
    assert_eq!(a.cases(), b.cases());
}

#[test]
fn exports_are_written_together() {
    let report = analyzer(&config(3, 1.0, 5.0)).run(&scenario()).unwrap();
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("evidence");

    let written = export::write_all(&report, &out).unwrap();
    assert_eq!(written.len(), 5);
    assert!(written.iter().all(|p| p.exists()));

    let csv = std::fs::read_to_string(out.join(export::CASES_FILE)).unwrap();
    assert!(csv.contains("Ana,Ben,3,2024-03-01T09:00:00,2024-03-04T09:00:00,3.0000,0.750000"));

    let manifest: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(out.join(export::MANIFEST_FILE)).unwrap())
            .unwrap();
    assert_eq!(manifest["provenance"]["exemplar_version"], "test-v1");
    assert_eq!(manifest["degraded_count"], 0);
    assert_eq!(manifest["policy"]["min_hostile_count"], 3);

    let edge_lines = std::fs::read_to_string(out.join(export::EDGES_FILE)).unwrap();
    assert_eq!(edge_lines.lines().count(), report.edges().len());
}
