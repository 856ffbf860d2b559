use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::archetype::match_archetype;
use super::bayes::{MergeStrategy, MergeWeights, NormalBelief};
use super::composite::{accumulate, aggregate};
use super::domain::{
    CompositeResult, PhaseDefinition, PhaseScore, PhaseTimestamps, ProbabilityProxies,
    ResponseText, ScoredPhase, WeightSet,
};
use super::features::{extract, FeatureCeilings};
use super::metrics::{
    distribute, duplicate_metric_id, phase_aggregate, score_metrics, DomainDistribution,
    HeuristicTable, ProbabilityModel,
};
use super::narrative::{compose, NarrativeInputs};
use super::{clamp_unit, round2, ScoringError};
use crate::ledger::{HashAlgorithm, LedgerBuilder, LedgerDraft, LedgerEntry, LedgerError, PrivacyPolicy};

/// Tunable coefficients for every stage of the pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    pub ceilings: FeatureCeilings,
    pub heuristics: HeuristicTable,
    pub probabilities: ProbabilityModel,
    pub domain_distribution: DomainDistribution,
    pub merge_strategy: MergeStrategy,
    pub merge_weights: MergeWeights,
    /// Prior for the reflective-stability belief built from per-phase coherence.
    pub stability_prior: NormalBelief,
    pub stability_observation_variance: f64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            ceilings: FeatureCeilings::default(),
            heuristics: HeuristicTable::default(),
            probabilities: ProbabilityModel::default(),
            domain_distribution: DomainDistribution::default(),
            merge_strategy: MergeStrategy::LinearPool,
            merge_weights: MergeWeights::default(),
            stability_prior: NormalBelief::default(),
            stability_observation_variance: 0.05,
        }
    }
}

/// Stateless scorer applying a [`ScoringConfig`] to responses and sessions.
pub struct ScoringEngine {
    config: ScoringConfig,
    ledger: LedgerBuilder,
}

impl Default for ScoringEngine {
    fn default() -> Self {
        Self::new(ScoringConfig::default(), HashAlgorithm::Sha256)
    }
}

impl ScoringEngine {
    pub fn new(config: ScoringConfig, hash_algorithm: HashAlgorithm) -> Self {
        Self {
            config,
            ledger: LedgerBuilder::new(hash_algorithm),
        }
    }

    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    pub fn score_response(
        &self,
        response: &ResponseText,
        phase: &PhaseDefinition,
    ) -> Result<PhaseScore, ScoringError> {
        let metrics = phase
            .metrics
            .as_deref()
            .ok_or_else(|| ScoringError::InvalidInput {
                reason: format!("phase '{}' does not declare a metrics list", phase.id),
            })?;
        if let Some(id) = duplicate_metric_id(metrics) {
            return Err(ScoringError::Configuration {
                reason: format!("phase '{}' declares metric '{id}' more than once", phase.id),
            });
        }

        if !response.phase_id.is_empty() && response.phase_id != phase.id {
            warn!(
                response_phase = %response.phase_id,
                phase = %phase.id,
                "response scored against a different phase than it was submitted for"
            );
        }

        let signature = extract(&response.text, &self.config.ceilings);
        let (raw_metrics, explanations) =
            score_metrics(metrics, &signature, &self.config.heuristics);
        let aggregate = phase_aggregate(metrics, phase.submetrics.as_ref(), &raw_metrics);
        let domain_contributions = distribute(phase, aggregate, self.config.domain_distribution);
        let probabilities = self.config.probabilities.evaluate(&signature);

        debug!(
            phase = %phase.id,
            tokens = signature.token_count,
            aggregate,
            "response scored"
        );

        Ok(PhaseScore {
            phase_id: phase.id.clone(),
            raw_metrics,
            sub_score: round2(aggregate * 100.0),
            aggregate,
            domain_contributions,
            probabilities,
            explanations,
            psycholinguistic: signature,
            timestamps: PhaseTimestamps {
                submitted_at: response.submitted_at,
                scored_at: Utc::now(),
            },
        })
    }

    pub fn compute_composite(&self, phases: &[ScoredPhase], weights: &WeightSet) -> CompositeResult {
        let contributions = accumulate(
            phases,
            self.config.merge_strategy,
            self.config.merge_weights,
        );
        let breakdown = aggregate(&contributions, weights);
        let archetype = match_archetype(
            &breakdown.domain_scores,
            breakdown.composite_score,
            weights,
        );

        let probabilities = mean_probabilities(phases);
        let stability = self.config.stability_prior.update_all(
            phases
                .iter()
                .map(|phase| clamp_unit(phase.probabilities.coherence)),
            self.config.stability_observation_variance,
        );

        let narrative = compose(&NarrativeInputs {
            domain_scores: &breakdown.domain_scores,
            composite_score: breakdown.composite_score,
            tier: breakdown.tier,
            archetype: &archetype,
            probabilities,
            stability,
            phase_count: phases.len(),
        });

        info!(
            phases = phases.len(),
            composite = breakdown.composite_score,
            tier = breakdown.tier.label(),
            archetype = %archetype.name,
            "composite computed"
        );

        CompositeResult {
            domain_scores: breakdown.domain_scores,
            composite_score: breakdown.composite_score,
            tier: breakdown.tier,
            archetype,
            probabilities,
            stability,
            narrative,
            computed_at: Utc::now(),
        }
    }

    pub fn create_ledger_entry(
        &self,
        draft: LedgerDraft,
        policy: PrivacyPolicy,
    ) -> Result<LedgerEntry, LedgerError> {
        self.ledger.create(draft, policy)
    }
}

fn mean_probabilities(phases: &[ScoredPhase]) -> ProbabilityProxies {
    if phases.is_empty() {
        return ProbabilityProxies::default();
    }
    let count = phases.len() as f64;
    let (coherence, novelty) = phases.iter().fold((0.0, 0.0), |(c, n), phase| {
        (
            c + clamp_unit(phase.probabilities.coherence),
            n + clamp_unit(phase.probabilities.novelty),
        )
    });
    ProbabilityProxies {
        coherence: coherence / count,
        novelty: novelty / count,
    }
}
