use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use std::sync::Arc;

use crate::api::dtos::requests::{ListBookingsQuery, PurchaseRequest};
use crate::api::extractors::identity::AuthIdentity;
use crate::domain::models::identity::Role;
use crate::domain::services::ledger::PurchaseParams;
use crate::error::AppError;
use crate::state::AppState;

pub async fn purchase(
    State(state): State<Arc<AppState>>,
    AuthIdentity(identity): AuthIdentity,
    Json(payload): Json<PurchaseRequest>,
) -> Result<impl IntoResponse, AppError> {
    if identity.role != Role::Client {
        return Err(AppError::Forbidden("Only clients can purchase packages".into()));
    }

    let booking = state.ledger.purchase(&identity, PurchaseParams {
        package_id: payload.package_id,
        voucher_code: payload.voucher_code,
        idempotency_key: payload.idempotency_key,
    }).await?;

    Ok((StatusCode::CREATED, Json(booking)))
}

pub async fn list_bookings(
    State(state): State<Arc<AppState>>,
    AuthIdentity(identity): AuthIdentity,
    Query(query): Query<ListBookingsQuery>,
) -> Result<impl IntoResponse, AppError> {
    if identity.role == Role::Admin {
        if let Some(client_id) = &query.client_id {
            return Ok(Json(state.ledger.list_bookings_for_client(client_id).await?));
        }
        if let Some(therapist_id) = &query.therapist_id {
            return Ok(Json(state.booking_repo.list_by_therapist(therapist_id).await?));
        }
    }
    Ok(Json(state.ledger.list_bookings(&identity).await?))
}

pub async fn get_booking(
    State(state): State<Arc<AppState>>,
    AuthIdentity(identity): AuthIdentity,
    Path(booking_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let booking = state.ledger.get_booking(&identity, &booking_id).await?;
    Ok(Json(booking))
}

pub async fn list_credits(
    State(state): State<Arc<AppState>>,
    AuthIdentity(identity): AuthIdentity,
    Path(booking_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let credits = state.ledger.list_credits(&identity, &booking_id).await?;
    Ok(Json(credits))
}
