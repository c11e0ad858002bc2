use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use sqlx::types::Json;

use crate::domain::services::policy::{DEFAULT_PLATFORM_FEE_PERCENT, MAX_PACKAGE_PRICE};
use crate::error::AppError;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "TEXT", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PackageStatus {
    Draft,
    Pending,
    Approved,
    Rejected,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "TEXT", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum SessionMode {
    Video,
    AudioVideo,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "TEXT", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ParticipantType {
    Individual,
    Couple,
    Family,
    Custom,
}

/// One planned session within a package. Copied verbatim onto the
/// session credits at purchase time, so the credit history stays stable
/// even if a draft template is later edited.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct SessionTemplate {
    pub duration_minutes: i32,
    pub title: String,
    pub description: Option<String>,
    pub participant_type: ParticipantType,
}

#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct Package {
    pub id: String,
    pub therapist_id: String,
    pub title: String,
    pub description: String,
    pub price: i64,
    pub category: String,
    pub languages: Json<Vec<String>>,
    pub mode: SessionMode,
    pub max_participants: i32,
    pub session_templates: Json<Vec<SessionTemplate>>,
    pub tags: Json<Vec<String>>,
    pub status: PackageStatus,
    pub rejection_reason: Option<String>,
    pub platform_fee_percent: i64,
    pub reviewed_by: Option<String>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

pub struct NewPackageParams {
    pub therapist_id: String,
    pub title: String,
    pub description: String,
    pub price: i64,
    pub category: String,
    pub languages: Vec<String>,
    pub mode: SessionMode,
    pub max_participants: i32,
    pub session_templates: Vec<SessionTemplate>,
    pub tags: Vec<String>,
    pub platform_fee_percent: Option<i64>,
    pub save_as_draft: bool,
}

/// Descriptive fields are always editable. Price, the session template
/// list, and the fee percent are frozen once a package is approved so
/// historical bookings keep their exact money split and credit count.
pub struct PackageEdit {
    pub title: Option<String>,
    pub description: Option<String>,
    pub price: Option<i64>,
    pub category: Option<String>,
    pub languages: Option<Vec<String>>,
    pub mode: Option<SessionMode>,
    pub max_participants: Option<i32>,
    pub session_templates: Option<Vec<SessionTemplate>>,
    pub tags: Option<Vec<String>>,
}

impl Package {
    pub fn new(params: NewPackageParams) -> Self {
        let now = Utc::now();
        let status = if params.save_as_draft { PackageStatus::Draft } else { PackageStatus::Pending };

        Self {
            id: Uuid::new_v4().to_string(),
            therapist_id: params.therapist_id,
            title: params.title,
            description: params.description,
            price: params.price,
            category: params.category,
            languages: Json(params.languages),
            mode: params.mode,
            max_participants: params.max_participants,
            session_templates: Json(params.session_templates),
            tags: Json(params.tags),
            status,
            rejection_reason: None,
            platform_fee_percent: params.platform_fee_percent.unwrap_or(DEFAULT_PLATFORM_FEE_PERCENT),
            reviewed_by: None,
            reviewed_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn total_sessions(&self) -> i32 {
        self.session_templates.0.len() as i32
    }

    pub fn submit(&mut self, now: DateTime<Utc>) -> Result<(), AppError> {
        match self.status {
            PackageStatus::Draft | PackageStatus::Rejected => {
                self.status = PackageStatus::Pending;
                self.rejection_reason = None;
                self.updated_at = now;
                Ok(())
            }
            PackageStatus::Pending => Err(AppError::Conflict("Package is already pending approval".into())),
            PackageStatus::Approved => Err(AppError::Conflict("Package is already approved".into())),
        }
    }

    pub fn approve(&mut self, admin_id: &str, now: DateTime<Utc>) -> Result<(), AppError> {
        if self.status != PackageStatus::Pending {
            return Err(AppError::Conflict("Only pending packages can be approved".into()));
        }
        self.status = PackageStatus::Approved;
        self.rejection_reason = None;
        self.reviewed_by = Some(admin_id.to_string());
        self.reviewed_at = Some(now);
        self.updated_at = now;
        Ok(())
    }

    pub fn reject(&mut self, admin_id: &str, reason: &str, now: DateTime<Utc>) -> Result<(), AppError> {
        if reason.trim().is_empty() {
            return Err(AppError::Validation("Rejection reason must not be empty".into()));
        }
        if self.status != PackageStatus::Pending {
            return Err(AppError::Conflict("Only pending packages can be rejected".into()));
        }
        self.status = PackageStatus::Rejected;
        self.rejection_reason = Some(reason.trim().to_string());
        self.reviewed_by = Some(admin_id.to_string());
        self.reviewed_at = Some(now);
        self.updated_at = now;
        Ok(())
    }

    pub fn apply_edit(&mut self, patch: PackageEdit, now: DateTime<Utc>) -> Result<(), AppError> {
        if self.status == PackageStatus::Approved
            && (patch.price.is_some() || patch.session_templates.is_some()) {
            return Err(AppError::Validation(
                "Price and session structure of an approved package cannot be changed".into(),
            ));
        }

        if let Some(title) = patch.title { self.title = title; }
        if let Some(description) = patch.description { self.description = description; }
        if let Some(price) = patch.price {
            if !(1..=MAX_PACKAGE_PRICE).contains(&price) {
                return Err(AppError::Validation("Price is out of range".into()));
            }
            self.price = price;
        }
        if let Some(category) = patch.category { self.category = category; }
        if let Some(languages) = patch.languages { self.languages = Json(languages); }
        if let Some(mode) = patch.mode { self.mode = mode; }
        if let Some(max_participants) = patch.max_participants { self.max_participants = max_participants; }
        if let Some(templates) = patch.session_templates {
            if templates.is_empty() {
                return Err(AppError::Validation("Package must contain at least one session".into()));
            }
            self.session_templates = Json(templates);
        }
        if let Some(tags) = patch.tags { self.tags = Json(tags); }

        // A re-edited rejection goes back into the moderation queue.
        if self.status == PackageStatus::Rejected {
            self.status = PackageStatus::Pending;
            self.rejection_reason = None;
        }

        self.updated_at = now;
        Ok(())
    }
}
