//! Deterministic lexical features extracted from a free-text response.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use super::clamp_unit;

const CAUSAL: &[&str] = &[
    "because",
    "therefore",
    "hence",
    "thus",
    "as a result",
    "consequently",
    "so",
    "due to",
    "since",
];

const TEMPORAL: &[&str] = &[
    "then",
    "after",
    "before",
    "when",
    "while",
    "later",
    "finally",
    "first",
    "next",
    "meanwhile",
    "until",
    "eventually",
];

const CONTRAST: &[&str] = &[
    "but",
    "however",
    "although",
    "though",
    "yet",
    "whereas",
    "nevertheless",
    "on the other hand",
    "instead",
    "despite",
];

const MODAL: &[&str] = &[
    "might", "may", "could", "would", "should", "must", "can", "perhaps", "possibly", "probably",
];

const METAPHOR: &[&str] = &[
    "like",
    "as if",
    "as though",
    "resembles",
    "metaphor",
    "akin to",
    "similar to",
    "reminds me of",
];

const SELF_REFERENCE: &[&str] = &["i", "me", "my", "we", "our", "us", "mine"];

const AFFECT: &[&str] = &[
    "anxious",
    "happy",
    "angry",
    "calm",
    "sad",
    "afraid",
    "excited",
    "frustrated",
    "joy",
    "fear",
    "love",
    "hope",
    "worried",
    "proud",
    "ashamed",
    "lonely",
    "grateful",
    "nervous",
    "peaceful",
    "content",
    "upset",
    "hurt",
    "relieved",
];

static CAUSAL_RE: LazyLock<Regex> = LazyLock::new(|| lexicon_regex(CAUSAL));
static TEMPORAL_RE: LazyLock<Regex> = LazyLock::new(|| lexicon_regex(TEMPORAL));
static CONTRAST_RE: LazyLock<Regex> = LazyLock::new(|| lexicon_regex(CONTRAST));
static MODAL_RE: LazyLock<Regex> = LazyLock::new(|| lexicon_regex(MODAL));
static METAPHOR_RE: LazyLock<Regex> = LazyLock::new(|| lexicon_regex(METAPHOR));
static SELF_REFERENCE_RE: LazyLock<Regex> = LazyLock::new(|| lexicon_regex(SELF_REFERENCE));
static AFFECT_RE: LazyLock<Regex> = LazyLock::new(|| lexicon_regex(AFFECT));
static SENTENCE_BREAK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[.!?]+").expect("sentence pattern is valid"));

/// Builds a case-insensitive, word-bounded alternation. Spaces inside a phrase
/// match any run of whitespace.
fn lexicon_regex(words: &[&str]) -> Regex {
    let alternation = words
        .iter()
        .map(|word| {
            word.split_whitespace()
                .map(regex::escape)
                .collect::<Vec<_>>()
                .join(r"\s+")
        })
        .collect::<Vec<_>>()
        .join("|");
    Regex::new(&format!(r"(?i)\b(?:{alternation})\b")).expect("lexicon pattern is valid")
}

/// Normalization ceilings for the derived densities.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureCeilings {
    /// Average tokens per sentence treated as maximal complexity.
    pub tokens_per_sentence: f64,
    /// Minimum divisor for metaphor, affect, and self-reference densities.
    pub min_marker_divisor: f64,
    /// Token count treated as a maximal-length answer.
    pub response_tokens: f64,
}

impl Default for FeatureCeilings {
    fn default() -> Self {
        Self {
            tokens_per_sentence: 40.0,
            min_marker_divisor: 4.0,
            response_tokens: 200.0,
        }
    }
}

/// Raw counts plus normalized [0,1] densities for one response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PsycholinguisticSignature {
    pub token_count: usize,
    pub sentence_count: usize,
    pub avg_tokens_per_sentence: f64,
    pub causal_count: usize,
    pub temporal_count: usize,
    pub contrast_count: usize,
    pub modal_count: usize,
    pub metaphor_count: usize,
    pub self_reference_count: usize,
    pub affect_count: usize,
    pub causal_density: f64,
    pub temporal_density: f64,
    pub contrast_density: f64,
    pub modal_density: f64,
    pub metaphor_density: f64,
    pub self_reference_density: f64,
    pub affect_density: f64,
    pub sentence_complexity: f64,
    pub length_signal: f64,
}

impl PsycholinguisticSignature {
    /// True when the response carried no tokens at all.
    pub fn is_empty(&self) -> bool {
        self.token_count == 0
    }
}

pub fn extract(text: &str, ceilings: &FeatureCeilings) -> PsycholinguisticSignature {
    let token_count = text.split_whitespace().count();
    if token_count == 0 {
        return PsycholinguisticSignature::default();
    }

    let sentence_count = count_sentences(text);
    let sentence_divisor = sentence_count.max(1) as f64;
    let marker_divisor = ceilings.min_marker_divisor.max(sentence_count as f64).max(1.0);

    let causal_count = CAUSAL_RE.find_iter(text).count();
    let temporal_count = TEMPORAL_RE.find_iter(text).count();
    let contrast_count = CONTRAST_RE.find_iter(text).count();
    let modal_count = MODAL_RE.find_iter(text).count();
    let metaphor_count = METAPHOR_RE.find_iter(text).count();
    let self_reference_count = SELF_REFERENCE_RE.find_iter(text).count();
    let affect_count = AFFECT_RE.find_iter(text).count();

    let avg_tokens_per_sentence = token_count as f64 / sentence_divisor;

    PsycholinguisticSignature {
        token_count,
        sentence_count,
        avg_tokens_per_sentence,
        causal_count,
        temporal_count,
        contrast_count,
        modal_count,
        metaphor_count,
        self_reference_count,
        affect_count,
        causal_density: clamp_unit(causal_count as f64 / sentence_divisor),
        temporal_density: clamp_unit(temporal_count as f64 / sentence_divisor),
        contrast_density: clamp_unit(contrast_count as f64 / sentence_divisor),
        modal_density: clamp_unit(modal_count as f64 / sentence_divisor),
        metaphor_density: clamp_unit(metaphor_count as f64 / marker_divisor),
        self_reference_density: clamp_unit(self_reference_count as f64 / marker_divisor),
        affect_density: clamp_unit(affect_count as f64 / marker_divisor),
        sentence_complexity: clamp_unit(
            avg_tokens_per_sentence / ceilings.tokens_per_sentence.max(1.0),
        ),
        length_signal: clamp_unit(token_count as f64 / ceilings.response_tokens.max(1.0)),
    }
}

/// Newlines close a sentence; runs of terminal punctuation count once.
fn count_sentences(text: &str) -> usize {
    text.lines()
        .flat_map(|line| SENTENCE_BREAK_RE.split(line))
        .filter(|fragment| !fragment.trim().is_empty())
        .count()
}
