use std::collections::BTreeMap;

use super::common::*;
use crate::ledger::HashAlgorithm;
use crate::scoring::domain::{PhaseDefinition, RawMetricsMap};
use crate::scoring::metrics::{distribute, phase_aggregate};
use crate::scoring::{
    DomainDistribution, HeuristicTable, ScoringConfig, ScoringEngine, ScoringError,
};

fn raw(entries: &[(&str, f64)]) -> RawMetricsMap {
    vector(entries)
}

#[test]
fn table_prefers_earlier_rules_when_several_match() {
    let table = HeuristicTable::default();

    let rule = table.select(&metric("m1", "Emotional depth", None));

    assert_eq!(rule.label, "detail");
}

#[test]
fn table_matches_name_before_id() {
    let table = HeuristicTable::default();

    let rule = table.select(&metric("logic_score", "Imagination", None));

    assert_eq!(rule.label, "novelty");
}

#[test]
fn table_falls_back_to_id_then_default_rule() {
    let table = HeuristicTable::default();

    assert_eq!(
        table
            .select(&metric("reasoning_score", "Overall answer", None))
            .label,
        "coherence"
    );
    assert_eq!(
        table.select(&metric("misc", "Overall answer", None)).label,
        "general clarity"
    );
    assert_eq!(
        table.select(&metric("self_awareness", "", None)).label,
        "reflection"
    );
}

#[test]
fn explanations_cite_observed_counts() {
    let engine = engine();
    let phase = PhaseDefinition {
        id: "p".to_string(),
        name: None,
        metrics: Some(vec![
            metric("empathy", "Empathy", None),
            metric("coherence", "Logical coherence", None),
        ]),
        submetrics: None,
        domains: vec!["emotion".to_string()],
    };

    let score = engine
        .score_response(
            &response("p", "I felt anxious because the deadline moved."),
            &phase,
        )
        .expect("scores");

    let empathy = &score.explanations[0];
    assert_eq!(empathy.metric_id, "empathy");
    assert_eq!(empathy.rule, "empathy");
    assert!((empathy.value - 0.25).abs() < 1e-9);
    assert!(empathy.rationale.contains("1 affect word(s)"));
    assert!(empathy.rationale.contains("1 self-reference(s)"));

    let coherence = &score.explanations[1];
    assert_eq!(coherence.rule, "coherence");
    assert!(coherence
        .rationale
        .contains("1 causal connector(s) over 1 sentence(s)"));
    assert!((score.raw_metrics["coherence"] - 0.535).abs() < 1e-9);
}

#[test]
fn submetric_weights_drive_the_aggregate() {
    let metrics = vec![
        metric("a", "A", None),
        metric("b", "B", None),
        metric("c", "C", None),
    ];
    let submetrics: BTreeMap<String, f64> = vector(&[("a", 0.5), ("b", 0.3), ("c", 0.2)]);

    let value = phase_aggregate(
        &metrics,
        Some(&submetrics),
        &raw(&[("a", 1.0), ("b", 0.5), ("c", 0.0)]),
    );

    assert!((value - 0.65).abs() < 1e-9);
}

#[test]
fn undeclared_submetrics_weigh_nothing() {
    let metrics = vec![metric("a", "A", None), metric("b", "B", None)];
    let submetrics = vector(&[("a", 1.0)]);

    let value = phase_aggregate(
        &metrics,
        Some(&submetrics),
        &raw(&[("a", 0.2), ("b", 1.0)]),
    );

    assert!((value - 0.2).abs() < 1e-9);
}

#[test]
fn non_positive_weights_fall_back_to_uniform() {
    let metrics = vec![
        metric("a", "A", Some(0.0)),
        metric("b", "B", Some(-3.0)),
    ];

    let value = phase_aggregate(&metrics, None, &raw(&[("a", 1.0), ("b", 0.0)]));

    assert!((value - 0.5).abs() < 1e-9);
}

#[test]
fn phases_without_domains_feed_the_fallback_domain() {
    let mut phase = phase_for("p", &[]);
    let contributions = distribute(&phase, 0.4, DomainDistribution::Split);
    assert_eq!(contributions, vector(&[("integration", 0.4)]));

    phase.domains = vec!["logic".to_string(), " ".to_string(), "creativity".to_string()];
    let contributions = distribute(&phase, 1.7, DomainDistribution::Split);
    assert_eq!(contributions, vector(&[("creativity", 0.5), ("logic", 0.5)]));
}

#[test]
fn multi_domain_phases_split_the_aggregate() {
    let engine = engine();
    let single = engine
        .score_response(&response("p", CALM_WALK), &phase_for("p", &["logic"]))
        .expect("scores");
    let shared = engine
        .score_response(
            &response("p", CALM_WALK),
            &phase_for("p", &["logic", "emotion"]),
        )
        .expect("scores");

    assert_eq!(single.sub_score, shared.sub_score);
    let total: f64 = shared.domain_contributions.values().sum();
    assert!((total - single.domain_contributions["logic"]).abs() < 1e-12);
    assert!((shared.domain_contributions["logic"] - single.aggregate / 2.0).abs() < 1e-12);
    assert_eq!(
        shared.domain_contributions["logic"],
        shared.domain_contributions["emotion"]
    );
}

#[test]
fn replicate_mode_gives_each_domain_the_full_aggregate() {
    let config = ScoringConfig {
        domain_distribution: DomainDistribution::Replicate,
        ..ScoringConfig::default()
    };
    let engine = ScoringEngine::new(config, HashAlgorithm::Sha256);

    let score = engine
        .score_response(
            &response("p", CALM_WALK),
            &phase_for("p", &["logic", "emotion"]),
        )
        .expect("scores");

    assert_eq!(score.domain_contributions["logic"], score.aggregate);
    assert_eq!(score.domain_contributions["emotion"], score.aggregate);
}

#[test]
fn empty_text_scores_zero_everywhere() {
    let engine = engine();
    let phase = perception_phase();

    let score = engine
        .score_response(&response("phase-1", "  \n\t "), &phase)
        .expect("empty text is still scored");

    assert_eq!(score.sub_score, 0.0);
    assert!(score.raw_metrics.values().all(|value| *value == 0.0));
    assert_eq!(score.probabilities.coherence, 0.0);
    assert_eq!(score.probabilities.novelty, 0.0);
    assert_eq!(score.domain_contributions, vector(&[("perception", 0.0)]));
    assert!(score
        .explanations
        .iter()
        .all(|explanation| explanation.rationale.contains("no response text")));
}

#[test]
fn phase_without_metrics_list_is_rejected() {
    let engine = engine();
    let phase = PhaseDefinition::from_json(r#"{"id":"p","domains":["logic"]}"#)
        .expect("shape parses");

    match engine.score_response(&response("p", "Because it rained."), &phase) {
        Err(ScoringError::InvalidInput { reason }) => assert!(reason.contains("metrics")),
        other => panic!("expected invalid input, got {other:?}"),
    }
}

#[test]
fn repeated_metric_ids_are_a_configuration_error() {
    let engine = engine();
    let mut phase = phase_for("p", &["perception"]);
    phase.metrics = Some(vec![
        metric("m", "Detail", Some(0.5)),
        metric("m", "Empathy", Some(0.5)),
    ]);

    match engine.score_response(&response("p", CALM_WALK), &phase) {
        Err(ScoringError::Configuration { reason }) => {
            assert!(reason.contains("'m' more than once"))
        }
        other => panic!("expected configuration error, got {other:?}"),
    }
}

#[test]
fn malformed_phase_document_is_a_configuration_error() {
    match PhaseDefinition::from_json(r#"{"name": 4}"#) {
        Err(ScoringError::Configuration { reason }) => {
            assert!(reason.contains("phase definition"))
        }
        other => panic!("expected configuration error, got {other:?}"),
    }
}

#[test]
fn mismatched_response_phase_is_still_scored() {
    let engine = engine();
    let phase = perception_phase();

    let score = engine
        .score_response(&response("another-phase", CALM_WALK), &phase)
        .expect("scores");

    assert_eq!(score.phase_id, "phase-1");
}
