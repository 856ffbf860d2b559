use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;

use super::domain::{
    CompositeResult, PhaseDefinition, PhaseScore, ResponseText, ScoredPhase, WeightSet,
};
use super::engine::ScoringEngine;
use super::session::ScoringSession;
use super::ScoringError;
use crate::ledger::{LedgerDraft, LedgerEntry, LedgerError, LedgerStore, PrivacyPolicy};

/// Pointer to the ledger entry written for an operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerReceipt {
    pub entry_id: String,
    pub hash: String,
}

impl From<&LedgerEntry> for LedgerReceipt {
    fn from(entry: &LedgerEntry) -> Self {
        Self {
            entry_id: entry.id().to_string(),
            hash: entry.hash().to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreReceipt {
    pub score: PhaseScore,
    pub ledger: LedgerReceipt,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompositeReceipt {
    pub result: CompositeResult,
    pub ledger: LedgerReceipt,
}

/// Service composing the scoring engine with a ledger store.
pub struct ScoringService<L> {
    engine: Arc<ScoringEngine>,
    ledger: Arc<L>,
    default_weights: Arc<WeightSet>,
    policy: PrivacyPolicy,
    actor: String,
}

impl<L> ScoringService<L>
where
    L: LedgerStore + 'static,
{
    pub fn new(
        engine: Arc<ScoringEngine>,
        ledger: Arc<L>,
        default_weights: WeightSet,
        policy: PrivacyPolicy,
        actor: impl Into<String>,
    ) -> Self {
        Self {
            engine,
            ledger,
            default_weights: Arc::new(default_weights),
            policy,
            actor: actor.into(),
        }
    }

    pub fn engine(&self) -> &ScoringEngine {
        &self.engine
    }

    pub fn default_weights(&self) -> &WeightSet {
        &self.default_weights
    }

    /// Score one response and record the event.
    pub fn score(
        &self,
        session_id: &str,
        response: Option<&ResponseText>,
        phase: &PhaseDefinition,
    ) -> Result<ScoreReceipt, ScoringServiceError> {
        let response = response.ok_or_else(|| ScoringError::InvalidInput {
            reason: "response text is missing".to_string(),
        })?;
        let score = self.engine.score_response(response, phase)?;

        let payload = json!({
            "phase_id": score.phase_id,
            "sub_score": score.sub_score,
            "raw_metrics": score.raw_metrics,
            "probabilities": score.probabilities,
        });
        let rationale = format!(
            "phase {} scored {:.2}/100 from {} metric(s)",
            score.phase_id,
            score.sub_score,
            score.raw_metrics.len()
        );
        let entry = self.record(session_id, "score_response", &payload, rationale)?;

        Ok(ScoreReceipt {
            score,
            ledger: LedgerReceipt::from(&entry),
        })
    }

    /// Compute the composite for a set of scored phases and record the event.
    /// Falls back to the service's default weights when none are supplied.
    pub fn composite(
        &self,
        session_id: &str,
        phases: &[ScoredPhase],
        weights: Option<&WeightSet>,
    ) -> Result<CompositeReceipt, ScoringServiceError> {
        let weights = weights.unwrap_or(&self.default_weights);
        let result = self.engine.compute_composite(phases, weights);

        let payload = json!({
            "weights_version": weights.version,
            "phase_ids": phases.iter().map(|phase| phase.phase_id.as_str()).collect::<Vec<_>>(),
            "domain_scores": result.domain_scores,
            "composite_score": result.composite_score,
            "tier": result.tier,
            "archetype": result.archetype.name,
        });
        let rationale = format!(
            "composite {:.2}/700 ({}) with archetype {}",
            result.composite_score,
            result.tier.label(),
            result.archetype.name
        );
        let entry = self.record(session_id, "compute_composite", &payload, rationale)?;

        Ok(CompositeReceipt {
            result,
            ledger: LedgerReceipt::from(&entry),
        })
    }

    /// Score a response inside a session, keeping the session's ledger pointers current.
    pub fn score_into(
        &self,
        session: &mut ScoringSession,
        response: &ResponseText,
        phase: &PhaseDefinition,
    ) -> Result<PhaseScore, ScoringServiceError> {
        let receipt = self.score(session.session_id(), Some(response), phase)?;
        session.record(&receipt.score, receipt.ledger.entry_id);
        Ok(receipt.score)
    }

    /// Compute the composite for every phase the session has scored.
    pub fn complete(
        &self,
        session: &mut ScoringSession,
        weights: Option<&WeightSet>,
    ) -> Result<CompositeResult, ScoringServiceError> {
        let receipt = self.composite(session.session_id(), session.scored_phases(), weights)?;
        session.attach_ledger_entry(receipt.ledger.entry_id);
        Ok(receipt.result)
    }

    pub fn ledger_entries(&self, session_id: &str) -> Result<Vec<LedgerEntry>, ScoringServiceError> {
        Ok(self.ledger.entries_for_session(session_id)?)
    }

    fn record(
        &self,
        session_id: &str,
        action: &str,
        payload: &serde_json::Value,
        rationale: String,
    ) -> Result<LedgerEntry, ScoringServiceError> {
        let draft = LedgerDraft::new(self.actor.as_str(), action, session_id, payload, rationale)?;
        let entry = self.engine.create_ledger_entry(draft, self.policy)?;
        self.ledger.append(entry.clone())?;
        info!(
            session = %session_id,
            action,
            entry = %entry.id(),
            "ledger entry appended"
        );
        Ok(entry)
    }
}

/// Error raised by the scoring service.
#[derive(Debug, thiserror::Error)]
pub enum ScoringServiceError {
    #[error(transparent)]
    Scoring(#[from] ScoringError),
    #[error(transparent)]
    Ledger(#[from] LedgerError),
}
