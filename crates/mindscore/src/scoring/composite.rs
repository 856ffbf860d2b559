use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::warn;

use super::bayes::{merge_maps, MergeStrategy, MergeWeights};
use super::domain::{DomainContributionsMap, ScoredPhase, Tier, WeightSet};
use super::{clamp_unit, round2};

/// Upper bound of the composite scale.
pub const COMPOSITE_SCALE: f64 = 700.0;

/// Weighted per-domain scores and the resulting composite.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompositeBreakdown {
    pub domain_scores: BTreeMap<String, f64>,
    pub composite_score: f64,
    pub tier: Tier,
}

/// Contributions a single phase brings to the composite, after pooling any
/// external estimates it carries.
pub fn phase_contributions(
    phase: &ScoredPhase,
    strategy: MergeStrategy,
    weights: MergeWeights,
) -> DomainContributionsMap {
    match &phase.external_contributions {
        Some(external) => merge_maps(strategy, &phase.domain_contributions, external, weights),
        None => phase.domain_contributions.clone(),
    }
}

/// Per-domain mean over every phase that contributes to the domain.
///
/// Each phase is mapped on its own and the fold is order-independent, so
/// phases may be scored in any order.
pub fn accumulate(
    phases: &[ScoredPhase],
    strategy: MergeStrategy,
    weights: MergeWeights,
) -> DomainContributionsMap {
    let mut totals: BTreeMap<String, (f64, usize)> = BTreeMap::new();

    for contributions in phases
        .iter()
        .map(|phase| phase_contributions(phase, strategy, weights))
    {
        for (domain, value) in contributions {
            let entry = totals.entry(domain).or_insert((0.0, 0));
            entry.0 += clamp_unit(value);
            entry.1 += 1;
        }
    }

    totals
        .into_iter()
        .map(|(domain, (sum, count))| (domain, sum / count.max(1) as f64))
        .collect()
}

pub fn aggregate(contributions: &DomainContributionsMap, weights: &WeightSet) -> CompositeBreakdown {
    let mut domain_scores = BTreeMap::new();
    let mut weighted_sum = 0.0;
    let mut weight_total = 0.0;

    for (domain, weight) in weights.effective_domains() {
        let contribution = clamp_unit(contributions.get(&domain).copied().unwrap_or(0.0));
        domain_scores.insert(domain, round2(contribution * 100.0));
        weighted_sum += contribution * weight;
        weight_total += weight;
    }

    if weight_total <= 0.0 {
        warn!(
            version = %weights.version,
            "domain weights sum to zero; substituting a total of 1"
        );
        weight_total = 1.0;
    }

    let fraction = clamp_unit(weighted_sum / weight_total);
    let composite_score = round2(fraction * COMPOSITE_SCALE).clamp(0.0, COMPOSITE_SCALE);

    CompositeBreakdown {
        domain_scores,
        composite_score,
        tier: Tier::from_score(composite_score),
    }
}
