use argon2::password_hash::SaltString;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use async_trait::async_trait;
use rand::rngs::OsRng;
use tracing::{debug, warn};

use super::AdminError;

/// The single place admin identity is checked. Every entry point that needs
/// an admin goes through one shared instance.
#[async_trait]
pub trait CredentialVerifier: Send + Sync {
    async fn verify(&self, username: &str, password: &str) -> bool;
}

#[derive(Clone)]
struct PhcHash(String);

impl std::fmt::Debug for PhcHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("[REDACTED]")
    }
}

/// Checks one configured admin account against an Argon2 PHC hash.
#[derive(Debug, Clone)]
pub struct Argon2Verifier {
    username: String,
    hash: Option<PhcHash>,
}

impl Argon2Verifier {
    /// `hash` must be a PHC string such as `$argon2id$v=19$...`.
    pub fn new(username: &str, hash: &str) -> Result<Self, AdminError> {
        PasswordHash::new(hash).map_err(|e| AdminError::InvalidHash(e.to_string()))?;
        Ok(Self {
            username: username.to_string(),
            hash: Some(PhcHash(hash.to_string())),
        })
    }

    /// A verifier that rejects every login, used when no hash is configured.
    pub fn disabled(username: &str) -> Self {
        Self {
            username: username.to_string(),
            hash: None,
        }
    }
}

#[async_trait]
impl CredentialVerifier for Argon2Verifier {
    async fn verify(&self, username: &str, password: &str) -> bool {
        let Some(PhcHash(hash)) = self.hash.clone() else {
            warn!("admin login attempted but no password hash is configured");
            return false;
        };

        // Always hash so a wrong username costs the same as a wrong password.
        let password = password.to_string();
        let password_ok = tokio::task::spawn_blocking(move || check_password(&hash, &password))
            .await
            .unwrap_or_else(|e| {
                warn!(error = %e, "password check task failed");
                false
            });

        let ok = password_ok && username == self.username;
        debug!(username, ok, "admin credential check");
        ok
    }
}

fn check_password(hash: &str, password: &str) -> bool {
    PasswordHash::new(hash)
        .and_then(|parsed| Argon2::default().verify_password(password.as_bytes(), &parsed))
        .is_ok()
}

/// Produce a PHC string for `ADMIN_PASSWORD_HASH`.
pub fn hash_password(password: &str) -> Result<String, AdminError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| AdminError::InvalidHash(e.to_string()))
}
