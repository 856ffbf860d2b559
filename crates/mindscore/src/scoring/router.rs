use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};

use super::domain::{PhaseDefinition, ResponseText, ScoredPhase, WeightSet};
use super::service::{CompositeReceipt, ScoreReceipt, ScoringService};
use super::ScoringError;
use crate::error::AppError;
use crate::ledger::LedgerStore;

#[derive(Debug, Deserialize)]
pub struct ScoreRequest {
    pub session_id: String,
    pub phase: PhaseDefinition,
    #[serde(default)]
    pub response: Option<ResponseText>,
}

#[derive(Debug, Deserialize)]
pub struct CompositeRequest {
    pub session_id: String,
    #[serde(default)]
    pub phases: Vec<ScoredPhase>,
    #[serde(default)]
    pub weights: Option<WeightSet>,
}

/// Router builder exposing scoring, composite, and ledger endpoints.
pub fn scoring_router<L>(service: Arc<ScoringService<L>>) -> Router
where
    L: LedgerStore + 'static,
{
    Router::new()
        .route("/api/v1/score", post(score_handler::<L>))
        .route("/api/v1/composite", post(composite_handler::<L>))
        .route("/api/v1/ledger/:session_id", get(ledger_handler::<L>))
        .with_state(service)
}

/// Body decoding failures are caller input errors and share the JSON error shape.
fn rejected(rejection: JsonRejection) -> AppError {
    AppError::Scoring(ScoringError::InvalidInput {
        reason: rejection.body_text(),
    })
}

pub(crate) async fn score_handler<L>(
    State(service): State<Arc<ScoringService<L>>>,
    payload: Result<Json<ScoreRequest>, JsonRejection>,
) -> Result<Json<ScoreReceipt>, AppError>
where
    L: LedgerStore + 'static,
{
    let Json(request) = payload.map_err(rejected)?;
    let receipt = service.score(&request.session_id, request.response.as_ref(), &request.phase)?;
    Ok(Json(receipt))
}

pub(crate) async fn composite_handler<L>(
    State(service): State<Arc<ScoringService<L>>>,
    payload: Result<Json<CompositeRequest>, JsonRejection>,
) -> Result<Json<CompositeReceipt>, AppError>
where
    L: LedgerStore + 'static,
{
    let Json(request) = payload.map_err(rejected)?;
    let receipt = service.composite(
        &request.session_id,
        &request.phases,
        request.weights.as_ref(),
    )?;
    Ok(Json(receipt))
}

pub(crate) async fn ledger_handler<L>(
    State(service): State<Arc<ScoringService<L>>>,
    Path(session_id): Path<String>,
) -> Result<Json<Value>, AppError>
where
    L: LedgerStore + 'static,
{
    let entries = service.ledger_entries(&session_id)?;
    Ok(Json(json!({
        "session_id": session_id,
        "entries": entries,
    })))
}
