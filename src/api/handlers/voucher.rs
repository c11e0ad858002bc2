use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use chrono::Utc;
use std::sync::Arc;
use tracing::info;

use crate::api::dtos::requests::{CreateVoucherRequest, ValidateVoucherRequest};
use crate::api::dtos::responses::VoucherQuoteResponse;
use crate::api::extractors::identity::AuthIdentity;
use crate::domain::models::voucher::{NewVoucherParams, Voucher};
use crate::domain::services::{commission, voucher};
use crate::error::{AppError, VoucherError};
use crate::state::AppState;

pub async fn create_voucher(
    State(state): State<Arc<AppState>>,
    AuthIdentity(identity): AuthIdentity,
    Json(payload): Json<CreateVoucherRequest>,
) -> Result<impl IntoResponse, AppError> {
    identity.require_admin()?;

    if !(0..=100).contains(&payload.discount_percent) {
        return Err(AppError::Validation("discount_percent must be between 0 and 100".into()));
    }
    if payload.min_amount.is_some_and(|m| m < 0) {
        return Err(AppError::Validation("min_amount must not be negative".into()));
    }
    if payload.usage_limit.is_some_and(|l| l <= 0) {
        return Err(AppError::Validation("usage_limit must be positive".into()));
    }

    let voucher = Voucher::new(NewVoucherParams {
        code: payload.code,
        discount_percent: payload.discount_percent,
        min_amount: payload.min_amount,
        usage_limit: payload.usage_limit,
        expiry_date: payload.expiry_date,
        description: payload.description,
        is_active: payload.is_active.unwrap_or(true),
    });

    match state.voucher_repo.create(&voucher).await {
        Ok(created) => {
            info!("create_voucher: {} ({}%)", created.code, created.discount_percent);
            Ok((StatusCode::CREATED, Json(created)))
        }
        Err(e) if e.is_unique_violation() => {
            Err(AppError::Conflict("Voucher code already exists".into()))
        }
        Err(e) => Err(e),
    }
}

pub async fn list_vouchers(
    State(state): State<Arc<AppState>>,
    AuthIdentity(identity): AuthIdentity,
) -> Result<impl IntoResponse, AppError> {
    identity.require_admin()?;
    let vouchers = state.voucher_repo.list().await?;
    Ok(Json(vouchers))
}

/// Price quote for the checkout page. Read-only; redemption happens
/// inside the purchase transaction, so a quote never burns usage.
pub async fn validate_voucher(
    State(state): State<Arc<AppState>>,
    AuthIdentity(_identity): AuthIdentity,
    Json(payload): Json<ValidateVoucherRequest>,
) -> Result<impl IntoResponse, AppError> {
    if payload.price <= 0 {
        return Err(AppError::Validation("price must be positive".into()));
    }

    let code = payload.code.trim().to_uppercase();
    let row = state.voucher_repo.find_by_code(&code).await?
        .ok_or(AppError::Voucher(VoucherError::NotFound))?;

    let discount_percent = voucher::validate(&row, payload.price, Utc::now())?;
    let discount_amount = commission::discount_amount(payload.price, discount_percent);

    Ok(Json(VoucherQuoteResponse {
        code,
        discount_percent,
        discount_amount,
        final_amount: payload.price - discount_amount,
    }))
}
