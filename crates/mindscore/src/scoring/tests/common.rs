use std::collections::BTreeMap;
use std::sync::Arc;

use axum::response::Response;
use serde_json::Value;

use crate::ledger::{InMemoryLedger, LedgerEntry, LedgerError, LedgerStore, PrivacyPolicy};
use crate::scoring::domain::{
    ArchetypeDefinition, MetricDefinition, PhaseDefinition, ResponseText, ScoreThreshold,
    WeightSet,
};
use crate::scoring::{ScoringEngine, ScoringService};

pub(super) const CALM_WALK: &str = "I walked home. It felt calm and quiet.";

pub(super) fn engine() -> ScoringEngine {
    ScoringEngine::default()
}

pub(super) fn metric(id: &str, name: &str, weight: Option<f64>) -> MetricDefinition {
    MetricDefinition {
        id: id.to_string(),
        name: name.to_string(),
        weight,
    }
}

/// Three weighted metrics feeding the perception domain.
pub(super) fn perception_phase() -> PhaseDefinition {
    PhaseDefinition {
        id: "phase-1".to_string(),
        name: Some("Recall".to_string()),
        metrics: Some(vec![
            metric("empathy", "Empathy", Some(0.5)),
            metric("detail", "Detail", Some(0.3)),
            metric("reflection", "Self reflection", Some(0.2)),
        ]),
        submetrics: None,
        domains: vec!["perception".to_string()],
    }
}

pub(super) fn phase_for(id: &str, domains: &[&str]) -> PhaseDefinition {
    PhaseDefinition {
        id: id.to_string(),
        name: None,
        metrics: Some(vec![
            metric("coherence", "Logical coherence", None),
            metric("novelty", "Creative novelty", None),
        ]),
        submetrics: None,
        domains: domains.iter().map(|domain| domain.to_string()).collect(),
    }
}

pub(super) fn response(phase_id: &str, text: &str) -> ResponseText {
    ResponseText::new(phase_id, text)
}

pub(super) fn vector(entries: &[(&str, f64)]) -> BTreeMap<String, f64> {
    entries
        .iter()
        .map(|(key, value)| (key.to_string(), *value))
        .collect()
}

pub(super) fn catalog_weights() -> WeightSet {
    let mut archetype_mapping = BTreeMap::new();
    archetype_mapping.insert(
        "The Analyst".to_string(),
        ArchetypeDefinition {
            signature_vector: vector(&[("logic", 0.9), ("reflection", 0.6), ("emotion", 0.1)]),
            threshold: Some(ScoreThreshold(200.0, 700.0)),
            dominant_domains: vec!["logic".to_string(), "reflection".to_string()],
        },
    );
    archetype_mapping.insert(
        "The Empath".to_string(),
        ArchetypeDefinition {
            signature_vector: vector(&[("emotion", 0.9), ("perception", 0.7), ("logic", 0.1)]),
            threshold: None,
            dominant_domains: Vec::new(),
        },
    );

    WeightSet {
        version: "2024.1".to_string(),
        domains: vector(&[
            ("perception", 1.0),
            ("logic", 1.0),
            ("creativity", 1.0),
            ("emotion", 1.0),
            ("reflection", 1.0),
            ("adaptability", 1.0),
            ("integration", 1.0),
        ]),
        archetype_mapping,
    }
}

pub(super) fn build_service(
    policy: PrivacyPolicy,
) -> (ScoringService<InMemoryLedger>, InMemoryLedger) {
    let ledger = InMemoryLedger::default();
    let service = ScoringService::new(
        Arc::new(engine()),
        Arc::new(ledger.clone()),
        catalog_weights(),
        policy,
        "test-suite",
    );
    (service, ledger)
}

pub(super) struct UnavailableLedger;

impl LedgerStore for UnavailableLedger {
    fn append(&self, _entry: LedgerEntry) -> Result<(), LedgerError> {
        Err(LedgerError::Unavailable("storage offline".to_string()))
    }

    fn entries_for_session(&self, _session_id: &str) -> Result<Vec<LedgerEntry>, LedgerError> {
        Err(LedgerError::Unavailable("storage offline".to_string()))
    }
}

pub(super) fn unavailable_service() -> ScoringService<UnavailableLedger> {
    ScoringService::new(
        Arc::new(engine()),
        Arc::new(UnavailableLedger),
        WeightSet::default(),
        PrivacyPolicy::FullPayload,
        "test-suite",
    )
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 1 << 20)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
