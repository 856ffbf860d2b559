use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use uuid::Uuid;

use super::clamp_unit;
use super::domain::{ArchetypeDefinition, WeightSet};

pub const BALANCED_STRATEGIST: &str = "Balanced Strategist";
pub const BALANCED_STRATEGIST_CONFIDENCE: f64 = 0.75;
/// Below this variance the domain profile counts as unspecialized.
pub const LOW_VARIANCE: f64 = 0.01;
pub const WEAK_FIT: f64 = 0.5;
const MAX_EVIDENCE: usize = 3;

/// Observed and expected values for one dominant domain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArchetypeEvidence {
    pub domain: String,
    pub observed: f64,
    pub expected: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchBasis {
    Similarity,
    BalancedFallback,
    SyntheticBalanced,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArchetypeMatch {
    pub id: String,
    pub name: String,
    pub confidence: f64,
    pub dominant_domains: Vec<String>,
    pub evidence: Vec<ArchetypeEvidence>,
    pub basis: MatchBasis,
    /// Whether the composite sat inside the archetype's declared threshold, if it declares one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub within_threshold: Option<bool>,
}

/// Cosine similarity over the key union; missing keys count as 0 and a zero-norm side yields 0.
pub fn cosine_similarity(left: &BTreeMap<String, f64>, right: &BTreeMap<String, f64>) -> f64 {
    let keys: BTreeSet<&String> = left.keys().chain(right.keys()).collect();
    let value = |map: &BTreeMap<String, f64>, key: &String| {
        map.get(key)
            .copied()
            .filter(|value| value.is_finite())
            .unwrap_or(0.0)
    };

    let (mut dot, mut left_norm, mut right_norm) = (0.0, 0.0, 0.0);
    for key in keys {
        let (a, b) = (value(left, key), value(right, key));
        dot += a * b;
        left_norm += a * a;
        right_norm += b * b;
    }

    if left_norm <= 0.0 || right_norm <= 0.0 {
        return 0.0;
    }
    (dot / (left_norm.sqrt() * right_norm.sqrt())).clamp(-1.0, 1.0)
}

/// Maps cosine similarity from [-1,1] onto [0,1].
pub fn fit(cosine: f64) -> f64 {
    clamp_unit((cosine + 1.0) / 2.0)
}

fn variance(values: &BTreeMap<String, f64>) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let count = values.len() as f64;
    let mean = values.values().sum::<f64>() / count;
    values
        .values()
        .map(|value| (value - mean).powi(2))
        .sum::<f64>()
        / count
}

fn normalize(domain_scores: &BTreeMap<String, f64>) -> BTreeMap<String, f64> {
    domain_scores
        .iter()
        .map(|(domain, score)| (domain.clone(), clamp_unit(score / 100.0)))
        .collect()
}

fn slug(name: &str) -> String {
    let slug = name
        .split(|ch: char| !ch.is_ascii_alphanumeric())
        .filter(|part| !part.is_empty())
        .map(|part| part.to_ascii_lowercase())
        .collect::<Vec<_>>()
        .join("-");
    if slug.is_empty() {
        "archetype".to_string()
    } else {
        slug
    }
}

/// Domains to cite as evidence: the declared dominant domains, else the strongest signature entries.
fn evidence_domains(definition: &ArchetypeDefinition) -> Vec<String> {
    if !definition.dominant_domains.is_empty() {
        return definition
            .dominant_domains
            .iter()
            .take(MAX_EVIDENCE)
            .cloned()
            .collect();
    }
    top_domains(&definition.signature_vector)
}

fn top_domains(values: &BTreeMap<String, f64>) -> Vec<String> {
    let mut ranked: Vec<(&String, f64)> = values.iter().map(|(k, v)| (k, *v)).collect();
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    ranked
        .into_iter()
        .take(MAX_EVIDENCE)
        .map(|(domain, _)| domain.clone())
        .collect()
}

fn evidence_for(
    domains: &[String],
    observed: &BTreeMap<String, f64>,
    expected: &BTreeMap<String, f64>,
) -> Vec<ArchetypeEvidence> {
    domains
        .iter()
        .map(|domain| ArchetypeEvidence {
            domain: domain.clone(),
            observed: observed.get(domain).copied().unwrap_or(0.0),
            expected: expected.get(domain).copied().unwrap_or(0.0),
        })
        .collect()
}

struct Candidate<'a> {
    name: &'a String,
    definition: &'a ArchetypeDefinition,
    fit: f64,
    within_threshold: Option<bool>,
}

/// Picks the catalog entry whose signature best matches the domain profile.
///
/// Thresholds never exclude an entry; being inside one only breaks exact fit ties.
pub fn match_archetype(
    domain_scores: &BTreeMap<String, f64>,
    composite_score: f64,
    weights: &WeightSet,
) -> ArchetypeMatch {
    let normalized = normalize(domain_scores);

    if weights.archetype_mapping.is_empty() {
        return synthetic_balanced(&normalized);
    }

    let best = weights
        .archetype_mapping
        .iter()
        .map(|(name, definition)| Candidate {
            name,
            definition,
            fit: fit(cosine_similarity(&normalized, &definition.signature_vector)),
            within_threshold: definition
                .threshold
                .map(|threshold| threshold.contains(composite_score)),
        })
        .reduce(|best, candidate| {
            let better_fit = candidate.fit > best.fit;
            let tie_inside = candidate.fit == best.fit
                && candidate.within_threshold == Some(true)
                && best.within_threshold != Some(true);
            if better_fit || tie_inside {
                candidate
            } else {
                best
            }
        });

    let Some(best) = best else {
        return synthetic_balanced(&normalized);
    };

    let spread = variance(&normalized);
    if spread < LOW_VARIANCE && best.fit < WEAK_FIT {
        warn!(
            best = %best.name,
            fit = best.fit,
            variance = spread,
            "no specialization detected; using balanced fallback"
        );
        return balanced_strategist(&normalized);
    }

    debug!(archetype = %best.name, fit = best.fit, "archetype selected");

    let dominant_domains = evidence_domains(best.definition);
    let evidence = evidence_for(
        &dominant_domains,
        &normalized,
        &best.definition.signature_vector,
    );

    ArchetypeMatch {
        id: slug(best.name),
        name: best.name.clone(),
        confidence: best.fit,
        dominant_domains,
        evidence,
        basis: MatchBasis::Similarity,
        within_threshold: best.within_threshold,
    }
}

fn balanced_strategist(normalized: &BTreeMap<String, f64>) -> ArchetypeMatch {
    let dominant_domains = top_domains(normalized);
    let evidence = dominant_domains
        .iter()
        .map(|domain| {
            let observed = normalized.get(domain).copied().unwrap_or(0.0);
            ArchetypeEvidence {
                domain: domain.clone(),
                observed,
                expected: observed,
            }
        })
        .collect();

    ArchetypeMatch {
        id: slug(BALANCED_STRATEGIST),
        name: BALANCED_STRATEGIST.to_string(),
        confidence: BALANCED_STRATEGIST_CONFIDENCE,
        dominant_domains,
        evidence,
        basis: MatchBasis::BalancedFallback,
        within_threshold: None,
    }
}

fn synthetic_balanced(normalized: &BTreeMap<String, f64>) -> ArchetypeMatch {
    let mean = if normalized.is_empty() {
        0.0
    } else {
        normalized.values().sum::<f64>() / normalized.len() as f64
    };
    let dominant_domains = top_domains(normalized);
    let evidence = dominant_domains
        .iter()
        .map(|domain| ArchetypeEvidence {
            domain: domain.clone(),
            observed: normalized.get(domain).copied().unwrap_or(0.0),
            expected: mean,
        })
        .collect();

    ArchetypeMatch {
        id: format!("balanced-{}", Uuid::new_v4()),
        name: "Balanced Profile".to_string(),
        confidence: clamp_unit(mean),
        dominant_domains,
        evidence,
        basis: MatchBasis::SyntheticBalanced,
        within_threshold: None,
    }
}
