use std::collections::BTreeMap;

use super::archetype::{ArchetypeMatch, MatchBasis};
use super::bayes::NormalBelief;
use super::domain::{ProbabilityProxies, Tier};

pub(crate) struct NarrativeInputs<'a> {
    pub domain_scores: &'a BTreeMap<String, f64>,
    pub composite_score: f64,
    pub tier: Tier,
    pub archetype: &'a ArchetypeMatch,
    pub probabilities: ProbabilityProxies,
    pub stability: NormalBelief,
    pub phase_count: usize,
}

fn tier_blurb(tier: Tier) -> &'static str {
    match tier {
        Tier::Explorer => "answers are still surveying the ground",
        Tier::Architect => "answers show deliberate, structured reasoning",
        Tier::Visionary => "answers integrate structure with original framing",
    }
}

fn stability_label(stability: &NormalBelief) -> &'static str {
    if stability.mean >= 0.6 {
        "steady"
    } else if stability.mean >= 0.35 {
        "moderate"
    } else {
        "variable"
    }
}

/// Short human-readable summary of a composite result.
pub(crate) fn compose(inputs: &NarrativeInputs<'_>) -> String {
    let mut sentences = Vec::new();

    sentences.push(format!(
        "Composite {:.2}/700 across {} phase(s) places this profile in the {} tier: {}.",
        inputs.composite_score,
        inputs.phase_count,
        inputs.tier.label(),
        tier_blurb(inputs.tier)
    ));

    let mut ranked: Vec<(&String, f64)> = inputs
        .domain_scores
        .iter()
        .map(|(domain, score)| (domain, *score))
        .collect();
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(b.0)));

    let strongest: Vec<String> = ranked
        .iter()
        .filter(|(_, score)| *score > 0.0)
        .take(2)
        .map(|(domain, score)| format!("{domain} ({score:.1})"))
        .collect();
    if strongest.is_empty() {
        sentences.push("No domain has accumulated evidence yet.".to_string());
    } else {
        sentences.push(format!("Strongest domains: {}.", strongest.join(", ")));
    }

    let archetype = inputs.archetype;
    let archetype_sentence = match archetype.basis {
        MatchBasis::Similarity => format!(
            "Closest archetype: {} (confidence {:.2}).",
            archetype.name, archetype.confidence
        ),
        MatchBasis::BalancedFallback => format!(
            "No strong specialization was detected, so the profile reads as {}.",
            archetype.name
        ),
        MatchBasis::SyntheticBalanced => {
            "No archetype catalog was configured; the profile is summarized as balanced."
                .to_string()
        }
    };
    sentences.push(archetype_sentence);

    sentences.push(format!(
        "Coherence {:.2}, novelty {:.2}; reflective stability is {} (mean {:.2}).",
        inputs.probabilities.coherence,
        inputs.probabilities.novelty,
        stability_label(&inputs.stability),
        inputs.stability.mean
    ));

    sentences.join(" ")
}
