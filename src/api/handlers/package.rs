use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use std::sync::Arc;
use tracing::info;

use crate::api::dtos::requests::{
    CreatePackageRequest, ListPackagesQuery, RejectPackageRequest, UpdatePackageRequest,
};
use crate::api::extractors::identity::AuthIdentity;
use crate::domain::models::identity::Identity;
use crate::domain::models::job::{JobPayload, NotificationJob};
use crate::domain::models::package::{
    NewPackageParams, Package, PackageEdit, PackageStatus,
};
use crate::domain::services::policy;
use crate::error::AppError;
use crate::state::AppState;

pub async fn create_package(
    State(state): State<Arc<AppState>>,
    AuthIdentity(identity): AuthIdentity,
    Json(payload): Json<CreatePackageRequest>,
) -> Result<impl IntoResponse, AppError> {
    identity.require_therapist()?;

    if !(1..=policy::MAX_PACKAGE_PRICE).contains(&payload.price) {
        return Err(AppError::Validation("Price is out of range".into()));
    }
    if payload.session_templates.is_empty() {
        return Err(AppError::Validation("Package must contain at least one session".into()));
    }
    if let Some(fee) = payload.platform_fee_percent {
        if !(0..=100).contains(&fee) {
            return Err(AppError::InvalidFeePercent(fee));
        }
    }

    let package = Package::new(NewPackageParams {
        therapist_id: identity.user_id.clone(),
        title: payload.title,
        description: payload.description,
        price: payload.price,
        category: payload.category,
        languages: payload.languages,
        mode: payload.mode,
        max_participants: payload.max_participants,
        session_templates: payload.session_templates,
        tags: payload.tags.unwrap_or_default(),
        platform_fee_percent: payload.platform_fee_percent,
        save_as_draft: payload.save_as_draft.unwrap_or(false),
    });

    let created = state.package_repo.create(&package).await?;
    info!("create_package: {} by therapist {} ({:?})", created.id, identity.user_id, created.status);
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn list_packages(
    State(state): State<Arc<AppState>>,
    AuthIdentity(identity): AuthIdentity,
    Query(query): Query<ListPackagesQuery>,
) -> Result<impl IntoResponse, AppError> {
    let status_filter = match query.status.as_deref() {
        None => None,
        Some("draft") => Some(PackageStatus::Draft),
        Some("pending") => Some(PackageStatus::Pending),
        Some("approved") => Some(PackageStatus::Approved),
        Some("rejected") => Some(PackageStatus::Rejected),
        Some(other) => {
            return Err(AppError::Validation(format!("Unknown package status: {}", other)))
        }
    };

    if let Some(therapist_id) = &query.therapist_id {
        let own = identity.is_admin() || identity.user_id == *therapist_id;
        let mut packages = state.package_repo.list_by_therapist(therapist_id).await?;
        if !own {
            // Other people only ever see the live storefront.
            packages.retain(|p| p.status == PackageStatus::Approved);
        }
        if let Some(status) = status_filter {
            packages.retain(|p| p.status == status);
        }
        return Ok(Json(packages));
    }

    match status_filter {
        Some(PackageStatus::Approved) | None => {
            let packages = state.package_repo.list_by_status(PackageStatus::Approved).await?;
            Ok(Json(packages))
        }
        Some(status) => {
            identity.require_admin()?;
            let packages = state.package_repo.list_by_status(status).await?;
            Ok(Json(packages))
        }
    }
}

pub async fn get_package(
    State(state): State<Arc<AppState>>,
    AuthIdentity(identity): AuthIdentity,
    Path(package_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let package = load_visible(&state, &identity, &package_id).await?;
    Ok(Json(package))
}

pub async fn update_package(
    State(state): State<Arc<AppState>>,
    AuthIdentity(identity): AuthIdentity,
    Path(package_id): Path<String>,
    Json(payload): Json<UpdatePackageRequest>,
) -> Result<impl IntoResponse, AppError> {
    let mut package = load_owned(&state, &identity, &package_id).await?;

    package.apply_edit(
        PackageEdit {
            title: payload.title,
            description: payload.description,
            price: payload.price,
            category: payload.category,
            languages: payload.languages,
            mode: payload.mode,
            max_participants: payload.max_participants,
            session_templates: payload.session_templates,
            tags: payload.tags,
        },
        Utc::now(),
    )?;

    let updated = state.package_repo.update(&package).await?;
    info!("update_package: {} now {:?}", updated.id, updated.status);
    Ok(Json(updated))
}

pub async fn delete_package(
    State(state): State<Arc<AppState>>,
    AuthIdentity(identity): AuthIdentity,
    Path(package_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let package = load_owned(&state, &identity, &package_id).await?;

    // Live packages may have outstanding bookings referencing them.
    if package.status == PackageStatus::Approved {
        return Err(AppError::Conflict("Approved packages cannot be deleted".into()));
    }

    state.package_repo.delete(&package.id).await?;
    info!("delete_package: {} removed", package.id);
    Ok(StatusCode::NO_CONTENT)
}

pub async fn submit_package(
    State(state): State<Arc<AppState>>,
    AuthIdentity(identity): AuthIdentity,
    Path(package_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let mut package = load_owned(&state, &identity, &package_id).await?;
    package.submit(Utc::now())?;
    let updated = state.package_repo.update(&package).await?;
    info!("submit_package: {} queued for review", updated.id);
    Ok(Json(updated))
}

pub async fn approve_package(
    State(state): State<Arc<AppState>>,
    AuthIdentity(identity): AuthIdentity,
    Path(package_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    identity.require_admin()?;

    let mut package = state.package_repo.find_by_id(&package_id).await?
        .ok_or(AppError::NotFound("Package not found".into()))?;
    package.approve(&identity.user_id, Utc::now())?;
    let updated = state.package_repo.update(&package).await?;

    let job = NotificationJob::new(
        "PACKAGE_APPROVED",
        JobPayload {
            recipient_id: updated.therapist_id.clone(),
            booking_id: None,
            package_id: Some(updated.id.clone()),
            credit_id: None,
        },
        Utc::now(),
    );
    state.job_repo.create(&job).await?;

    info!("approve_package: {} approved by {}", updated.id, identity.user_id);
    Ok(Json(updated))
}

pub async fn reject_package(
    State(state): State<Arc<AppState>>,
    AuthIdentity(identity): AuthIdentity,
    Path(package_id): Path<String>,
    Json(payload): Json<RejectPackageRequest>,
) -> Result<impl IntoResponse, AppError> {
    identity.require_admin()?;

    let mut package = state.package_repo.find_by_id(&package_id).await?
        .ok_or(AppError::NotFound("Package not found".into()))?;
    package.reject(&identity.user_id, &payload.reason, Utc::now())?;
    let updated = state.package_repo.update(&package).await?;

    let job = NotificationJob::new(
        "PACKAGE_REJECTED",
        JobPayload {
            recipient_id: updated.therapist_id.clone(),
            booking_id: None,
            package_id: Some(updated.id.clone()),
            credit_id: None,
        },
        Utc::now(),
    );
    state.job_repo.create(&job).await?;

    info!("reject_package: {} rejected by {}", updated.id, identity.user_id);
    Ok(Json(updated))
}

/// Unmoderated packages are invisible to everyone except their owner
/// and admins; leaking their existence would leak the review queue.
async fn load_visible(
    state: &Arc<AppState>,
    identity: &Identity,
    package_id: &str,
) -> Result<Package, AppError> {
    let package = state.package_repo.find_by_id(package_id).await?
        .ok_or(AppError::NotFound("Package not found".into()))?;

    if package.status == PackageStatus::Approved
        || identity.is_admin()
        || identity.user_id == package.therapist_id
    {
        Ok(package)
    } else {
        Err(AppError::NotFound("Package not found".into()))
    }
}

async fn load_owned(
    state: &Arc<AppState>,
    identity: &Identity,
    package_id: &str,
) -> Result<Package, AppError> {
    let package = state.package_repo.find_by_id(package_id).await?
        .ok_or(AppError::NotFound("Package not found".into()))?;

    if identity.is_admin() || identity.user_id == package.therapist_id {
        Ok(package)
    } else {
        Err(AppError::Forbidden("Package belongs to another therapist".into()))
    }
}
