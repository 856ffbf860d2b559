use std::collections::BTreeMap;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::archetype::ArchetypeMatch;
use super::bayes::NormalBelief;
use super::features::PsycholinguisticSignature;
use super::ScoringError;

/// Metric id to clamped [0,1] value, produced once per response.
pub type RawMetricsMap = BTreeMap<String, f64>;

/// Domain id to accumulated [0,1] contribution.
pub type DomainContributionsMap = BTreeMap<String, f64>;

/// Domains used when a weight set declares none, weighted equally.
pub const DEFAULT_DOMAINS: [&str; 7] = [
    "perception",
    "logic",
    "creativity",
    "emotion",
    "reflection",
    "adaptability",
    "integration",
];

/// Domain receiving a phase's aggregate when the phase declares no domains.
pub const FALLBACK_DOMAIN: &str = "integration";

/// A respondent's raw answer to one prompt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseText {
    pub phase_id: String,
    pub text: String,
    #[serde(default = "Utc::now")]
    pub submitted_at: DateTime<Utc>,
}

impl ResponseText {
    pub fn new(phase_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            phase_id: phase_id.into(),
            text: text.into(),
            submitted_at: Utc::now(),
        }
    }
}

/// A named metric declared by a phase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricDefinition {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,
}

impl MetricDefinition {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            weight: None,
        }
    }

    /// Display name, falling back to the id for unnamed metrics.
    pub fn label(&self) -> &str {
        if self.name.trim().is_empty() {
            &self.id
        } else {
            &self.name
        }
    }
}

/// One scoring phase: its metrics, how they are weighted, and which domains it feeds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhaseDefinition {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Left optional so a document without a metrics list is rejected rather than defaulted.
    #[serde(default)]
    pub metrics: Option<Vec<MetricDefinition>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub submetrics: Option<BTreeMap<String, f64>>,
    #[serde(default)]
    pub domains: Vec<String>,
}

impl PhaseDefinition {
    pub fn from_json(raw: &str) -> Result<Self, ScoringError> {
        serde_json::from_str(raw).map_err(|err| ScoringError::Configuration {
            reason: format!("phase definition is malformed: {err}"),
        })
    }
}

/// Composite-score window in which an archetype is considered a natural fit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreThreshold(pub f64, pub f64);

impl ScoreThreshold {
    pub fn contains(&self, score: f64) -> bool {
        let (low, high) = if self.0 <= self.1 {
            (self.0, self.1)
        } else {
            (self.1, self.0)
        };
        score >= low && score <= high
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArchetypeDefinition {
    pub signature_vector: BTreeMap<String, f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub threshold: Option<ScoreThreshold>,
    #[serde(default)]
    pub dominant_domains: Vec<String>,
}

/// Domain weights plus the archetype catalog, supplied as configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WeightSet {
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub domains: BTreeMap<String, f64>,
    #[serde(default)]
    pub archetype_mapping: BTreeMap<String, ArchetypeDefinition>,
}

impl WeightSet {
    pub fn from_json(raw: &str) -> Result<Self, ScoringError> {
        serde_json::from_str(raw).map_err(|err| ScoringError::Configuration {
            reason: format!("weight set is malformed: {err}"),
        })
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ScoringError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|err| ScoringError::Configuration {
            reason: format!("unable to read weight set {}: {err}", path.display()),
        })?;
        Self::from_json(&raw)
    }

    /// Declared domain weights, or the default domain list at weight 1 when none are declared.
    /// Negative and non-finite weights count as 0.
    pub fn effective_domains(&self) -> Vec<(String, f64)> {
        if self.domains.is_empty() {
            return DEFAULT_DOMAINS
                .iter()
                .map(|domain| (domain.to_string(), 1.0))
                .collect();
        }

        self.domains
            .iter()
            .map(|(domain, weight)| {
                let weight = if weight.is_finite() && *weight > 0.0 {
                    *weight
                } else {
                    0.0
                };
                (domain.clone(), weight)
            })
            .collect()
    }
}

/// Coarse classification of the composite score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Tier {
    Explorer,
    Architect,
    Visionary,
}

impl Tier {
    pub fn from_score(composite: f64) -> Self {
        if composite >= 526.0 {
            Tier::Visionary
        } else if composite >= 351.0 {
            Tier::Architect
        } else {
            Tier::Explorer
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Tier::Explorer => "Explorer",
            Tier::Architect => "Architect",
            Tier::Visionary => "Visionary",
        }
    }
}

/// Probability proxies derived from a single response.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ProbabilityProxies {
    pub coherence: f64,
    pub novelty: f64,
}

/// Evidence trail for a single metric value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricExplanation {
    pub metric_id: String,
    pub value: f64,
    pub rule: String,
    pub rationale: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PhaseTimestamps {
    pub submitted_at: DateTime<Utc>,
    pub scored_at: DateTime<Utc>,
}

/// Result of scoring one response against one phase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhaseScore {
    pub phase_id: String,
    pub raw_metrics: RawMetricsMap,
    /// Phase aggregate on a 0-100 scale.
    pub sub_score: f64,
    pub aggregate: f64,
    pub domain_contributions: DomainContributionsMap,
    pub probabilities: ProbabilityProxies,
    pub explanations: Vec<MetricExplanation>,
    pub psycholinguistic: PsycholinguisticSignature,
    pub timestamps: PhaseTimestamps,
}

impl PhaseScore {
    pub fn to_scored_phase(&self) -> ScoredPhase {
        ScoredPhase {
            phase_id: self.phase_id.clone(),
            domain_contributions: self.domain_contributions.clone(),
            probabilities: self.probabilities,
            timestamps: Some(self.timestamps),
            external_contributions: None,
        }
    }
}

/// Per-phase input to composite computation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredPhase {
    pub phase_id: String,
    #[serde(default)]
    pub domain_contributions: DomainContributionsMap,
    #[serde(default)]
    pub probabilities: ProbabilityProxies,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamps: Option<PhaseTimestamps>,
    /// Externally supplied estimates, pooled with the local contributions when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_contributions: Option<DomainContributionsMap>,
}

/// Terminal artifact of a completed session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompositeResult {
    /// Per-domain scores on a 0-100 scale.
    pub domain_scores: BTreeMap<String, f64>,
    /// Weighted composite on a 0-700 scale.
    pub composite_score: f64,
    pub tier: Tier,
    pub archetype: ArchetypeMatch,
    pub probabilities: ProbabilityProxies,
    /// Posterior belief about reflective stability, built from per-phase coherence.
    pub stability: NormalBelief,
    pub narrative: String,
    pub computed_at: DateTime<Utc>,
}
