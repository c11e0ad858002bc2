use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use std::sync::Arc;

use crate::api::dtos::requests::{CompleteCreditRequest, ScheduleCreditRequest};
use crate::api::dtos::responses::JoinWindowResponse;
use crate::api::extractors::identity::AuthIdentity;
use crate::domain::services::policy;
use crate::error::AppError;
use crate::state::AppState;

pub async fn schedule_credit(
    State(state): State<Arc<AppState>>,
    AuthIdentity(identity): AuthIdentity,
    Path(credit_id): Path<String>,
    Json(payload): Json<ScheduleCreditRequest>,
) -> Result<impl IntoResponse, AppError> {
    let credit = state.ledger
        .schedule_credit(&identity, &credit_id, payload.scheduled_date)
        .await?;
    Ok(Json(credit))
}

pub async fn reschedule_credit(
    State(state): State<Arc<AppState>>,
    AuthIdentity(identity): AuthIdentity,
    Path(credit_id): Path<String>,
    Json(payload): Json<ScheduleCreditRequest>,
) -> Result<impl IntoResponse, AppError> {
    let credit = state.ledger
        .reschedule_credit(&identity, &credit_id, payload.scheduled_date)
        .await?;
    Ok(Json(credit))
}

pub async fn complete_credit(
    State(state): State<Arc<AppState>>,
    AuthIdentity(identity): AuthIdentity,
    Path(credit_id): Path<String>,
    Json(payload): Json<CompleteCreditRequest>,
) -> Result<impl IntoResponse, AppError> {
    let credit = state.ledger
        .complete_credit(&identity, &credit_id, payload.recording_url.as_deref())
        .await?;
    Ok(Json(credit))
}

pub async fn join_credit(
    State(state): State<Arc<AppState>>,
    AuthIdentity(identity): AuthIdentity,
    Path(credit_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let (credit, _booking) = state.ledger.get_credit(&identity, &credit_id).await?;

    let now = Utc::now();
    let can_join = policy::can_join(&credit, now);
    let window = credit.scheduled_date.map(policy::join_window);

    // The link is only handed out inside the window.
    Ok(Json(JoinWindowResponse {
        can_join,
        join_link: if can_join { credit.join_link.clone() } else { None },
        opens_at: window.map(|(opens, _)| opens),
        closes_at: window.map(|(_, closes)| closes),
    }))
}
