//! Response scoring and composite aggregation.

pub mod archetype;
pub mod bayes;
pub mod composite;
pub mod domain;
mod engine;
pub mod features;
pub mod metrics;
mod narrative;
pub mod router;
pub mod service;
pub mod session;

#[cfg(test)]
mod tests;

pub use archetype::{ArchetypeEvidence, ArchetypeMatch, MatchBasis};
pub use bayes::{MergeStrategy, MergeWeights, NormalBelief};
pub use composite::CompositeBreakdown;
pub use domain::{
    ArchetypeDefinition, CompositeResult, DomainContributionsMap, MetricDefinition,
    MetricExplanation, PhaseDefinition, PhaseScore, PhaseTimestamps, ProbabilityProxies,
    RawMetricsMap, ResponseText, ScoreThreshold, ScoredPhase, Tier, WeightSet,
};
pub use engine::{ScoringConfig, ScoringEngine};
pub use features::{FeatureCeilings, PsycholinguisticSignature};
pub use metrics::{
    DomainDistribution, Formula, HeuristicRule, HeuristicTable, ProbabilityModel, Signal,
};
pub use router::scoring_router;
pub use service::{
    CompositeReceipt, LedgerReceipt, ScoreReceipt, ScoringService, ScoringServiceError,
};
pub use session::ScoringSession;

/// Caller-side errors raised by the scoring core.
#[derive(Debug, thiserror::Error)]
pub enum ScoringError {
    #[error("invalid input: {reason}")]
    InvalidInput { reason: String },
    #[error("invalid configuration: {reason}")]
    Configuration { reason: String },
}

/// Clamps into [0,1]; NaN and infinities become 0.
pub(crate) fn clamp_unit(value: f64) -> f64 {
    if value.is_finite() {
        value.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
