use std::str::FromStr;

use crate::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Client,
    Therapist,
    Admin,
}

impl FromStr for Role {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "client" => Ok(Role::Client),
            "therapist" => Ok(Role::Therapist),
            "admin" => Ok(Role::Admin),
            _ => Err(()),
        }
    }
}

/// The caller identity asserted by the upstream auth gateway. Passed
/// explicitly into every catalog/ledger operation; there is no ambient
/// current-user state anywhere in the service.
#[derive(Debug, Clone)]
pub struct Identity {
    pub user_id: String,
    pub role: Role,
}

impl Identity {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    pub fn require_admin(&self) -> Result<(), AppError> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(AppError::Forbidden("Admin role required".into()))
        }
    }

    pub fn require_therapist(&self) -> Result<(), AppError> {
        if self.role == Role::Therapist {
            Ok(())
        } else {
            Err(AppError::Forbidden("Therapist role required".into()))
        }
    }
}
