//! Smoothing and merging of numeric estimates.
//!
//! Two strategies are supported: a conjugate normal-normal update for slowly
//! moving beliefs, and linear pooling for reconciling two estimates of the
//! same quantity. Both are total over finite input.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::clamp_unit;

/// Floor applied to variances and pooling weights.
pub const EPSILON: f64 = 1e-6;

fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}

fn floor_positive(value: f64) -> f64 {
    finite_or_zero(value).max(EPSILON)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MergeStrategy {
    ConjugateNormal,
    LinearPool,
}

/// Gaussian belief over a scalar trait.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NormalBelief {
    pub mean: f64,
    pub variance: f64,
}

impl NormalBelief {
    pub fn new(mean: f64, variance: f64) -> Self {
        Self {
            mean: finite_or_zero(mean),
            variance: floor_positive(variance),
        }
    }

    /// Posterior after one observation with its own variance.
    pub fn update(&self, observation: f64, observation_variance: f64) -> Self {
        let prior_variance = floor_positive(self.variance);
        let observation_variance = floor_positive(observation_variance);
        let observation = finite_or_zero(observation);

        let posterior_variance = 1.0 / (1.0 / prior_variance + 1.0 / observation_variance);
        let posterior_mean = posterior_variance
            * (finite_or_zero(self.mean) / prior_variance + observation / observation_variance);

        Self {
            mean: posterior_mean,
            variance: posterior_variance,
        }
    }

    pub fn update_all(
        &self,
        observations: impl IntoIterator<Item = f64>,
        observation_variance: f64,
    ) -> Self {
        observations
            .into_iter()
            .fold(*self, |belief, observation| {
                belief.update(observation, observation_variance)
            })
    }
}

impl Default for NormalBelief {
    /// Uninformative prior centered on the midpoint of the unit interval.
    fn default() -> Self {
        Self::new(0.5, 0.25)
    }
}

/// Pooling weights for primary (local) and secondary (external) estimates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MergeWeights {
    pub alpha: f64,
    pub beta: f64,
}

impl Default for MergeWeights {
    fn default() -> Self {
        Self {
            alpha: 0.6,
            beta: 0.4,
        }
    }
}

pub fn linear_pool(primary: f64, secondary: f64, alpha: f64, beta: f64) -> f64 {
    let alpha = floor_positive(alpha);
    let beta = floor_positive(beta);
    let merged =
        (finite_or_zero(primary) * alpha + finite_or_zero(secondary) * beta) / (alpha + beta);
    clamp_unit(merged)
}

/// Merge one primary/secondary pair. Under `ConjugateNormal` the weights act as
/// precisions, so the primary is the prior with variance `1/alpha`.
pub fn merge(strategy: MergeStrategy, primary: f64, secondary: f64, weights: MergeWeights) -> f64 {
    match strategy {
        MergeStrategy::LinearPool => linear_pool(primary, secondary, weights.alpha, weights.beta),
        MergeStrategy::ConjugateNormal => {
            let prior = NormalBelief::new(primary, 1.0 / floor_positive(weights.alpha));
            clamp_unit(prior.update(secondary, 1.0 / floor_positive(weights.beta)).mean)
        }
    }
}

/// Merges two maps key by key over the union of their keys. A key missing from
/// one side is merged against 0.
pub fn merge_maps(
    strategy: MergeStrategy,
    primary: &BTreeMap<String, f64>,
    secondary: &BTreeMap<String, f64>,
    weights: MergeWeights,
) -> BTreeMap<String, f64> {
    primary
        .keys()
        .chain(secondary.keys())
        .map(|key| {
            let local = primary.get(key).copied().unwrap_or(0.0);
            let external = secondary.get(key).copied().unwrap_or(0.0);
            (key.clone(), merge(strategy, local, external, weights))
        })
        .collect()
}
