use metrics_exporter_prometheus::PrometheusHandle;
use mindscore::config::ScoringSettings;
use mindscore::error::AppError;
use mindscore::ledger::InMemoryLedger;
use mindscore::scoring::{
    PhaseDefinition, ResponseText, ScoringConfig, ScoringEngine, ScoringError, ScoringService,
    WeightSet,
};
use serde::Deserialize;
use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tracing::info;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// A session as submitted for offline scoring: phase definitions plus the answers to them.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct SessionDocument {
    pub(crate) session_id: String,
    #[serde(default)]
    pub(crate) actor: Option<String>,
    pub(crate) phases: Vec<PhaseDefinition>,
    pub(crate) responses: Vec<ResponseText>,
}

impl SessionDocument {
    pub(crate) fn from_path(path: &Path) -> Result<Self, AppError> {
        let raw = std::fs::read_to_string(path)?;
        serde_json::from_str(&raw).map_err(|err| {
            AppError::Scoring(ScoringError::Configuration {
                reason: format!("session document {} is malformed: {err}", path.display()),
            })
        })
    }

    /// Each response paired with the phase it answers, in submission order.
    pub(crate) fn pairs(&self) -> Result<Vec<(&ResponseText, &PhaseDefinition)>, ScoringError> {
        self.responses
            .iter()
            .map(|response| {
                self.phases
                    .iter()
                    .find(|phase| phase.id == response.phase_id)
                    .map(|phase| (response, phase))
                    .ok_or_else(|| ScoringError::InvalidInput {
                        reason: format!(
                            "response references unknown phase '{}'",
                            response.phase_id
                        ),
                    })
            })
            .collect()
    }
}

/// Loads the configured weight set, or the built-in defaults when no path is given.
pub(crate) fn load_weights(path: Option<&Path>) -> Result<WeightSet, AppError> {
    match path {
        Some(path) => {
            let weights = WeightSet::from_path(path)?;
            info!(
                path = %path.display(),
                version = %weights.version,
                archetypes = weights.archetype_mapping.len(),
                "weight set loaded"
            );
            Ok(weights)
        }
        None => {
            info!("no weight set configured; using default domains");
            Ok(WeightSet::default())
        }
    }
}

pub(crate) fn build_scoring_service(
    settings: &ScoringSettings,
    weights: WeightSet,
    actor: Option<&str>,
) -> ScoringService<InMemoryLedger> {
    let engine = ScoringEngine::new(ScoringConfig::default(), settings.hash_algorithm);
    ScoringService::new(
        Arc::new(engine),
        Arc::new(InMemoryLedger::default()),
        weights,
        settings.privacy_policy,
        actor.unwrap_or(&settings.actor),
    )
}
