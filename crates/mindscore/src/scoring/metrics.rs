use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use super::clamp_unit;
use super::domain::{
    DomainContributionsMap, MetricDefinition, MetricExplanation, PhaseDefinition,
    ProbabilityProxies, RawMetricsMap, FALLBACK_DOMAIN,
};
use super::features::PsycholinguisticSignature;

/// Signature value a formula term reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Signal {
    Causal,
    Temporal,
    Contrast,
    Modal,
    Metaphor,
    SelfReference,
    Affect,
    Complexity,
    Length,
    InverseCausal,
    InverseMetaphor,
    InverseComplexity,
}

impl Signal {
    pub fn value(self, sig: &PsycholinguisticSignature) -> f64 {
        match self {
            Signal::Causal => sig.causal_density,
            Signal::Temporal => sig.temporal_density,
            Signal::Contrast => sig.contrast_density,
            Signal::Modal => sig.modal_density,
            Signal::Metaphor => sig.metaphor_density,
            Signal::SelfReference => sig.self_reference_density,
            Signal::Affect => sig.affect_density,
            Signal::Complexity => sig.sentence_complexity,
            Signal::Length => sig.length_signal,
            Signal::InverseCausal => 1.0 - sig.causal_density,
            Signal::InverseMetaphor => 1.0 - sig.metaphor_density,
            Signal::InverseComplexity => 1.0 - sig.sentence_complexity,
        }
    }

    fn evidence(self, sig: &PsycholinguisticSignature) -> String {
        let sentences = sig.sentence_count;
        match self {
            Signal::Causal | Signal::InverseCausal => format!(
                "{} causal connector(s) over {sentences} sentence(s)",
                sig.causal_count
            ),
            Signal::Temporal => format!(
                "{} temporal connector(s) over {sentences} sentence(s)",
                sig.temporal_count
            ),
            Signal::Contrast => format!(
                "{} contrast connector(s) over {sentences} sentence(s)",
                sig.contrast_count
            ),
            Signal::Modal => format!(
                "{} modal marker(s) over {sentences} sentence(s)",
                sig.modal_count
            ),
            Signal::Metaphor | Signal::InverseMetaphor => {
                format!("{} metaphor marker(s)", sig.metaphor_count)
            }
            Signal::SelfReference => format!("{} self-reference(s)", sig.self_reference_count),
            Signal::Affect => format!("{} affect word(s)", sig.affect_count),
            Signal::Complexity | Signal::InverseComplexity => format!(
                "{:.1} tokens per sentence",
                sig.avg_tokens_per_sentence
            ),
            Signal::Length => format!("{} tokens", sig.token_count),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Term {
    pub signal: Signal,
    pub coefficient: f64,
}

/// Linear combination of signature signals, clamped to [0,1].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Formula {
    pub terms: Vec<Term>,
}

impl Formula {
    pub fn new(terms: &[(Signal, f64)]) -> Self {
        Self {
            terms: terms
                .iter()
                .map(|&(signal, coefficient)| Term {
                    signal,
                    coefficient,
                })
                .collect(),
        }
    }

    pub fn evaluate(&self, sig: &PsycholinguisticSignature) -> f64 {
        let total = self
            .terms
            .iter()
            .map(|term| term.coefficient * term.signal.value(sig))
            .sum::<f64>();
        clamp_unit(total)
    }

    fn evidence(&self, sig: &PsycholinguisticSignature) -> String {
        let parts: Vec<String> = self
            .terms
            .iter()
            .map(|term| term.signal.evidence(sig))
            .collect();
        if parts.is_empty() {
            "no contributing signals".to_string()
        } else {
            parts.join(", ")
        }
    }
}

/// A keyword-selected scoring formula.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeuristicRule {
    pub label: String,
    pub keywords: Vec<String>,
    pub formula: Formula,
}

impl HeuristicRule {
    pub fn new(label: &str, keywords: &[&str], terms: &[(Signal, f64)]) -> Self {
        Self {
            label: label.to_string(),
            keywords: keywords.iter().map(|keyword| keyword.to_string()).collect(),
            formula: Formula::new(terms),
        }
    }

    fn matches(&self, name: &str) -> bool {
        self.keywords
            .iter()
            .any(|keyword| !keyword.is_empty() && name.contains(&keyword.to_lowercase()))
    }
}

/// Ordered dispatch table from metric names to formulas. The first matching rule wins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeuristicTable {
    pub rules: Vec<HeuristicRule>,
    pub fallback: HeuristicRule,
}

impl HeuristicTable {
    pub fn select(&self, metric: &MetricDefinition) -> &HeuristicRule {
        let name = metric.label().to_lowercase();
        let id = metric.id.to_lowercase();
        self.rules
            .iter()
            .find(|rule| rule.matches(&name))
            .or_else(|| self.rules.iter().find(|rule| rule.matches(&id)))
            .unwrap_or(&self.fallback)
    }
}

impl Default for HeuristicTable {
    fn default() -> Self {
        use Signal::*;

        Self {
            rules: vec![
                HeuristicRule::new(
                    "detail",
                    &["detail", "depth", "elaborat"],
                    &[(Complexity, 0.6), (Length, 0.4)],
                ),
                HeuristicRule::new(
                    "empathy",
                    &["empath", "emotion", "affect"],
                    &[(Affect, 0.6), (SelfReference, 0.4)],
                ),
                HeuristicRule::new(
                    "novelty",
                    &["novel", "metaphor", "creativ", "imagin"],
                    &[(Metaphor, 0.6), (InverseComplexity, 0.4)],
                ),
                HeuristicRule::new(
                    "coherence",
                    &["coheren", "logic", "reason", "causal"],
                    &[(Causal, 0.5), (Contrast, 0.3), (Complexity, 0.2)],
                ),
                HeuristicRule::new(
                    "reflection",
                    &["reflect", "insight", "aware", "self"],
                    &[(SelfReference, 0.5), (Modal, 0.3), (Contrast, 0.2)],
                ),
                HeuristicRule::new(
                    "sequencing",
                    &["sequence", "narrat", "tempor", "time"],
                    &[(Temporal, 0.7), (Complexity, 0.3)],
                ),
                HeuristicRule::new(
                    "flexibility",
                    &["flexib", "nuance", "ambigu"],
                    &[(Modal, 0.5), (Contrast, 0.5)],
                ),
            ],
            fallback: HeuristicRule::new(
                "general clarity",
                &[],
                &[(Causal, 0.4), (InverseMetaphor, 0.3), (Complexity, 0.3)],
            ),
        }
    }
}

/// Coefficients for the coherence and novelty proxies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProbabilityModel {
    pub coherence: Formula,
    pub novelty: Formula,
}

impl ProbabilityModel {
    /// Zero-signal input yields zero proxies.
    pub fn evaluate(&self, sig: &PsycholinguisticSignature) -> ProbabilityProxies {
        if sig.is_empty() {
            return ProbabilityProxies::default();
        }
        ProbabilityProxies {
            coherence: self.coherence.evaluate(sig),
            novelty: self.novelty.evaluate(sig),
        }
    }
}

impl Default for ProbabilityModel {
    fn default() -> Self {
        use Signal::*;

        Self {
            coherence: Formula::new(&[(Causal, 0.5), (InverseMetaphor, 0.2), (Complexity, 0.3)]),
            novelty: Formula::new(&[(Metaphor, 0.7), (InverseCausal, 0.3)]),
        }
    }
}

pub(crate) fn score_metrics(
    metrics: &[MetricDefinition],
    sig: &PsycholinguisticSignature,
    table: &HeuristicTable,
) -> (RawMetricsMap, Vec<MetricExplanation>) {
    let mut raw = RawMetricsMap::new();
    let mut explanations = Vec::with_capacity(metrics.len());

    for metric in metrics {
        let rule = table.select(metric);
        let (value, rationale) = if sig.is_empty() {
            (
                0.0,
                format!("{} scored 0.00: no response text was supplied.", metric.label()),
            )
        } else {
            let value = rule.formula.evaluate(sig);
            (
                value,
                format!(
                    "{} scored {:.2} via the {} heuristic: {}.",
                    metric.label(),
                    value,
                    rule.label,
                    rule.formula.evidence(sig)
                ),
            )
        };

        raw.insert(metric.id.clone(), value);
        explanations.push(MetricExplanation {
            metric_id: metric.id.clone(),
            value,
            rule: rule.label.clone(),
            rationale,
        });
    }

    (raw, explanations)
}

fn sanitize_weight(weight: f64) -> f64 {
    if weight.is_finite() && weight > 0.0 {
        weight
    } else {
        0.0
    }
}

/// Weighted mean of the raw metrics in [0,1].
///
/// Weights come from the submetric map when present, then from the metric's
/// declared weight; without a submetric map undeclared metrics weigh 1. A
/// non-positive total falls back to uniform weighting.
pub(crate) fn phase_aggregate(
    metrics: &[MetricDefinition],
    submetrics: Option<&BTreeMap<String, f64>>,
    raw: &RawMetricsMap,
) -> f64 {
    if metrics.is_empty() {
        return 0.0;
    }

    let weights: Vec<f64> = metrics
        .iter()
        .map(|metric| {
            let declared = match submetrics {
                Some(map) => map.get(&metric.id).copied().or(metric.weight).unwrap_or(0.0),
                None => metric.weight.unwrap_or(1.0),
            };
            sanitize_weight(declared)
        })
        .collect();

    let total: f64 = weights.iter().sum();
    let (weights, total) = if total > 0.0 {
        (weights, total)
    } else {
        (vec![1.0; metrics.len()], metrics.len() as f64)
    };

    let weighted: f64 = metrics
        .iter()
        .zip(&weights)
        .map(|(metric, weight)| raw.get(&metric.id).copied().unwrap_or(0.0) * weight)
        .sum();

    clamp_unit(weighted / total)
}

/// How a phase aggregate is spread over the phase's declared domains.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DomainDistribution {
    /// Each domain receives `aggregate / n`.
    #[default]
    Split,
    /// Each domain receives the full aggregate.
    Replicate,
}

/// Spreads the aggregate over the declared domains; phases without domains feed the fallback domain.
pub(crate) fn distribute(
    phase: &PhaseDefinition,
    aggregate: f64,
    mode: DomainDistribution,
) -> DomainContributionsMap {
    let aggregate = clamp_unit(aggregate);
    let declared: BTreeSet<&String> = phase
        .domains
        .iter()
        .filter(|domain| !domain.trim().is_empty())
        .collect();

    if declared.is_empty() {
        return DomainContributionsMap::from([(FALLBACK_DOMAIN.to_string(), aggregate)]);
    }

    let share = match mode {
        DomainDistribution::Split => aggregate / declared.len() as f64,
        DomainDistribution::Replicate => aggregate,
    };
    declared
        .into_iter()
        .map(|domain| (domain.clone(), share))
        .collect()
}

/// First metric id declared more than once, if any.
pub(crate) fn duplicate_metric_id(metrics: &[MetricDefinition]) -> Option<&str> {
    let mut seen = BTreeSet::new();
    metrics
        .iter()
        .map(|metric| metric.id.as_str())
        .find(|id| !seen.insert(*id))
}
