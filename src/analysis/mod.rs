//! Persistence analysis engine
//!
//! One run over one closed transcript:
//!   resolve addressees (sequential) -> classify hostility (parallel)
//!   -> build interaction edges -> detect persistent runs -> rank cases
//!
//! Structural and configuration problems fail the run before any output
//! exists. Embedding failures on individual messages only degrade those
//! messages, and are counted in the summary.

mod cases;
mod classifier;
mod exemplars;
mod graph;
mod persistence;
mod resolver;

pub use cases::{severity, CaseAggregator, PersistentCase};
pub use classifier::{Classification, ExemplarClassifier, HostilityClassifier};
pub use exemplars::{ExemplarSet, BUILTIN_VERSION};
pub use graph::{InteractionEdge, InteractionGraph, PairWeight};
pub use persistence::{days_between, HostileRun, PersistenceDetector};
pub use resolver::{
    find_mention, resolve_addressees, AddresseeGuess, AddresseeResolver, ResolutionBasis,
    WindowResolver,
};

use rayon::prelude::*;
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::config::{AddresseePrecedence, Config, PersistencePolicy};
use crate::embedding::{EmbeddingError, EmbeddingProvider};
use crate::error::{AnalysisError, Result};
use crate::store::EmbeddingCache;
use crate::transcript::{Message, MessageStore};

/// What produced the scores, recorded next to every export
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Provenance {
    pub exemplar_version: String,
    pub exemplar_fingerprint: String,
    pub exemplar_count: usize,
    pub provider_id: String,
}

impl Provenance {
    pub fn new(exemplars: &ExemplarSet, provider_id: &str) -> Self {
        Self {
            exemplar_version: exemplars.version().to_string(),
            exemplar_fingerprint: exemplars.fingerprint(),
            exemplar_count: exemplars.len(),
            provider_id: provider_id.to_string(),
        }
    }
}

/// Accounting for one run
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub run_id: String,
    pub message_count: usize,
    pub participant_count: usize,
    pub addressed_count: usize,
    pub edge_count: usize,
    pub hostile_edge_count: usize,
    pub case_count: usize,
    pub degraded_count: usize,
    pub degraded_message_ids: Vec<u64>,
    pub provenance: Provenance,
    pub hostility_threshold: f32,
    pub resolver_window: usize,
    pub resolver_precedence: AddresseePrecedence,
    pub policy: PersistencePolicy,
}

/// Finalised output of a run
#[derive(Debug, Clone)]
pub struct AnalysisReport {
    cases: Vec<PersistentCase>,
    edges: Vec<InteractionEdge>,
    summary: RunSummary,
}

impl AnalysisReport {
    pub fn cases(&self) -> &[PersistentCase] {
        &self.cases
    }

    pub fn edges(&self) -> &[InteractionEdge] {
        &self.edges
    }

    pub fn summary(&self) -> &RunSummary {
        &self.summary
    }
}

pub struct Analyzer {
    resolver: Box<dyn AddresseeResolver>,
    classifier: Box<dyn HostilityClassifier>,
    detector: PersistenceDetector,
    pool: Option<rayon::ThreadPool>,
    window: usize,
    precedence: AddresseePrecedence,
    hostility_threshold: f32,
    provenance: Provenance,
}

impl Analyzer {
    /// Assemble an analyzer from explicit components.
    ///
    /// The configuration is validated here; invalid thresholds never reach
    /// a run.
    pub fn new(
        config: &Config,
        resolver: Box<dyn AddresseeResolver>,
        classifier: Box<dyn HostilityClassifier>,
        provenance: Provenance,
    ) -> Result<Self> {
        config.validate()?;

        let pool = match config.classifier.workers {
            Some(workers) => Some(
                rayon::ThreadPoolBuilder::new()
                    .num_threads(workers)
                    .thread_name(|i| format!("chatwitness-score-{}", i))
                    .build()
                    .map_err(|e| {
                        AnalysisError::Configuration(format!("cannot start scoring workers: {}", e))
                    })?,
            ),
            None => None,
        };

        Ok(Self {
            resolver,
            classifier,
            detector: PersistenceDetector::new(config.persistence.clone())?,
            pool,
            window: config.resolver.window,
            precedence: config.resolver.precedence,
            hostility_threshold: config.classifier.hostility_threshold,
            provenance,
        })
    }

    /// Rule-based resolver plus exemplar classifier over `provider`
    pub fn from_config(
        config: &Config,
        provider: Arc<dyn EmbeddingProvider>,
        exemplars: &ExemplarSet,
        cache: Option<&mut EmbeddingCache>,
    ) -> Result<Self> {
        config.validate()?;
        let provenance = Provenance::new(exemplars, &provider.id());
        let classifier = ExemplarClassifier::new(
            provider,
            exemplars,
            config.classifier.hostility_threshold,
            cache,
        )?;
        Self::new(
            config,
            Box::new(WindowResolver::new(config.resolver.precedence)),
            Box::new(classifier),
            provenance,
        )
    }

    /// Analyse one transcript
    pub fn run(&self, store: &MessageStore) -> Result<AnalysisReport> {
        if store.is_empty() {
            return Err(AnalysisError::Input(
                "transcript contains no messages".to_string(),
            ));
        }

        let run_id = Uuid::new_v4().to_string();
        tracing::info!(
            %run_id,
            messages = store.len(),
            exemplars = %self.provenance.exemplar_version,
            provider = %self.provenance.provider_id,
            "starting analysis run"
        );

        let messages = store.messages();
        let addressees = resolve_addressees(self.resolver.as_ref(), store, self.window);

        let mut degraded_message_ids = vec![];
        let classifications: Vec<Classification> = self
            .score(messages)
            .into_iter()
            .zip(messages)
            .map(|(outcome, message)| match outcome {
                Ok(classification) => classification,
                Err(e) => {
                    tracing::warn!(message_id = message.id, error = %e, "classification degraded");
                    degraded_message_ids.push(message.id);
                    Classification::benign()
                }
            })
            .collect();

        let graph = InteractionGraph::build(messages, &addressees, &classifications);
        let hostile_edge_count = graph.hostile_count();

        // Barrier: detection only sees the complete edge set
        let runs = self.detector.detect(graph.edges());
        let cases = CaseAggregator::aggregate(runs);
        let edges = graph.into_edges();

        let summary = RunSummary {
            run_id,
            message_count: messages.len(),
            participant_count: store.participants().len(),
            addressed_count: addressees.iter().filter(|a| a.is_some()).count(),
            edge_count: edges.len(),
            hostile_edge_count,
            case_count: cases.len(),
            degraded_count: degraded_message_ids.len(),
            degraded_message_ids,
            provenance: self.provenance.clone(),
            hostility_threshold: self.hostility_threshold,
            resolver_window: self.window,
            resolver_precedence: self.precedence,
            policy: self.detector.policy().clone(),
        };

        if summary.degraded_count > 0 {
            tracing::warn!(
                degraded = summary.degraded_count,
                "some messages could not be classified and were treated as non-hostile"
            );
        }
        tracing::info!(
            cases = summary.case_count,
            edges = summary.edge_count,
            hostile_edges = summary.hostile_edge_count,
            "analysis run complete"
        );

        Ok(AnalysisReport {
            cases,
            edges,
            summary,
        })
    }

    /// Score every message in parallel; results stay in store order
    fn score(&self, messages: &[Message]) -> Vec<std::result::Result<Classification, EmbeddingError>> {
        let classify = || {
            messages
                .par_iter()
                .map(|m| self.classifier.classify(&m.raw_text))
                .collect()
        };
        match &self.pool {
            Some(pool) => pool.install(classify),
            None => classify(),
        }
    }
}
