use super::common::*;
use crate::ledger::{LedgerError, PrivacyPolicy};
use crate::scoring::domain::WeightSet;
use crate::scoring::{ScoringError, ScoringServiceError, ScoringSession};

#[test]
fn score_appends_a_verifiable_ledger_entry() {
    let (service, ledger) = build_service(PrivacyPolicy::FullPayload);

    let receipt = service
        .score("session-1", Some(&response("phase-1", CALM_WALK)), &perception_phase())
        .expect("scores");

    assert_eq!(ledger.len(), 1);
    let entries = service.ledger_entries("session-1").expect("entries");
    let entry = &entries[0];
    assert_eq!(entry.id(), receipt.ledger.entry_id);
    assert_eq!(entry.hash(), receipt.ledger.hash);
    assert_eq!(entry.action(), "score_response");
    assert_eq!(entry.actor(), "test-suite");
    assert!(entry.verify());
    assert!(!entry.is_redacted());
    assert_eq!(
        entry.payload()["phase_id"].as_str(),
        Some("phase-1")
    );
    assert!(entry.rationale().contains("phase phase-1 scored"));
}

#[test]
fn hash_only_policy_drops_the_payload() {
    let (service, _) = build_service(PrivacyPolicy::RetainHashOnly);

    service
        .score("session-1", Some(&response("phase-1", CALM_WALK)), &perception_phase())
        .expect("scores");

    let entries = service.ledger_entries("session-1").expect("entries");
    let entry = &entries[0];
    assert!(entry.is_redacted());
    assert!(entry.payload().get("raw_metrics").is_none());
    assert!(entry.payload()["summary"]
        .as_str()
        .unwrap_or_default()
        .contains("score_response for session session-1"));
    assert!(entry.verify());
}

#[test]
fn missing_response_is_rejected_without_ledger_writes() {
    let (service, ledger) = build_service(PrivacyPolicy::FullPayload);

    match service.score("session-1", None, &perception_phase()) {
        Err(ScoringServiceError::Scoring(ScoringError::InvalidInput { reason })) => {
            assert!(reason.contains("missing"))
        }
        other => panic!("expected invalid input, got {other:?}"),
    }
    assert!(ledger.is_empty());
}

#[test]
fn ledger_failures_propagate() {
    let service = unavailable_service();

    match service.score("session-1", Some(&response("phase-1", CALM_WALK)), &perception_phase()) {
        Err(ScoringServiceError::Ledger(LedgerError::Unavailable(_))) => {}
        other => panic!("expected ledger failure, got {other:?}"),
    }
}

#[test]
fn composite_uses_default_weights_when_none_supplied() {
    let (service, _) = build_service(PrivacyPolicy::FullPayload);
    let phases = vec![crate::scoring::domain::ScoredPhase {
        phase_id: "a".to_string(),
        domain_contributions: vector(&[("logic", 0.9), ("reflection", 0.6)]),
        probabilities: Default::default(),
        timestamps: None,
        external_contributions: None,
    }];

    let defaulted = service
        .composite("session-1", &phases, None)
        .expect("composite");
    assert_eq!(defaulted.result.archetype.name, "The Analyst");

    let overridden = service
        .composite("session-1", &phases, Some(&WeightSet::default()))
        .expect("composite");
    assert!(overridden.result.archetype.id.starts_with("balanced-"));

    let entries = service.ledger_entries("session-1").expect("entries");
    assert_eq!(entries.len(), 2);
    assert!(entries
        .iter()
        .all(|entry| entry.action() == "compute_composite"));
    assert_eq!(entries[0].payload()["weights_version"].as_str(), Some("2024.1"));
}

#[test]
fn session_tracks_phases_and_ledger_pointers() {
    let (service, ledger) = build_service(PrivacyPolicy::FullPayload);
    let mut session = ScoringSession::new("session-7");

    service
        .score_into(
            &mut session,
            &response("p1", "Because the bridge closed, we waited. Then we walked."),
            &phase_for("p1", &["logic"]),
        )
        .expect("first phase");
    service
        .score_into(
            &mut session,
            &response("p2", "The city hummed like a hive."),
            &phase_for("p2", &["creativity"]),
        )
        .expect("second phase");
    let result = service.complete(&mut session, None).expect("composite");

    assert_eq!(session.scored_phases().len(), 2);
    assert_eq!(session.ledger_pointers().len(), 3);
    assert_eq!(ledger.len(), 3);
    assert!(result.domain_scores["logic"] > 0.0);
    assert!(result.domain_scores["creativity"] > 0.0);
}

#[test]
fn rescoring_a_phase_replaces_its_result() {
    let (service, _) = build_service(PrivacyPolicy::FullPayload);
    let mut session = ScoringSession::new("session-8");
    let phase = phase_for("p1", &["logic"]);

    service
        .score_into(&mut session, &response("p1", ""), &phase)
        .expect("empty answer");
    service
        .score_into(&mut session, &response("p1", "Because it rained, we stayed."), &phase)
        .expect("revised answer");

    assert_eq!(session.scored_phases().len(), 1);
    assert!(session.scored_phases()[0].domain_contributions["logic"] > 0.0);
    assert_eq!(session.ledger_pointers().len(), 2);
}

#[test]
fn forgetting_a_pointer_leaves_the_ledger_intact() {
    let (service, ledger) = build_service(PrivacyPolicy::FullPayload);
    let mut session = ScoringSession::new("session-9");

    service
        .score_into(&mut session, &response("phase-1", CALM_WALK), &perception_phase())
        .expect("scores");
    let pointer = session.ledger_pointers()[0].clone();

    assert!(session.forget_ledger_entry(&pointer));
    assert!(!session.forget_ledger_entry(&pointer));
    assert!(session.ledger_pointers().is_empty());
    assert_eq!(ledger.len(), 1);
    let entries = service.ledger_entries("session-9").expect("entries");
    assert_eq!(entries[0].id(), pointer);
}
