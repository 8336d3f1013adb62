//! Admin identity, sessions, and the site-wide maintenance switch.

mod credentials;
mod sessions;

pub use credentials::{Argon2Verifier, CredentialVerifier, hash_password};
pub use sessions::{AdminSessions, token_from_cookie_header};

use std::sync::atomic::{AtomicBool, Ordering};

use serde::{Deserialize, Serialize};
use tracing::info;

#[derive(Debug, thiserror::Error)]
pub enum AdminError {
    #[error("invalid password hash: {0}")]
    InvalidHash(String),
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct MaintenanceUpdate {
    pub enabled: bool,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MaintenanceStatus {
    pub maintenance_mode: bool,
}

#[derive(Debug, Default)]
pub struct MaintenanceMode(AtomicBool);

impl MaintenanceMode {
    pub fn new(enabled: bool) -> Self {
        Self(AtomicBool::new(enabled))
    }

    pub fn is_enabled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }

    pub fn set(&self, enabled: bool) {
        let previous = self.0.swap(enabled, Ordering::Relaxed);
        if previous != enabled {
            info!(enabled, "maintenance mode changed");
        }
    }

    pub fn status(&self) -> MaintenanceStatus {
        MaintenanceStatus {
            maintenance_mode: self.is_enabled(),
        }
    }
}
