use axum::{extract::State, response::IntoResponse, Json};
use std::sync::Arc;

use crate::api::extractors::identity::AuthIdentity;
use crate::error::AppError;
use crate::state::AppState;

pub async fn list_jobs(
    State(state): State<Arc<AppState>>,
    AuthIdentity(identity): AuthIdentity,
) -> Result<impl IntoResponse, AppError> {
    identity.require_admin()?;
    let jobs = state.job_repo.list().await?;
    Ok(Json(jobs))
}
