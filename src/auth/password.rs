use argon2::password_hash::{PasswordHash, SaltString};
use argon2::{Algorithm, Argon2, Params, PasswordHasher as _, PasswordVerifier as _, Version};
use rand_core::OsRng;
use std::sync::{Arc, OnceLock};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PasswordError {
    #[error("failed to hash password: {0}")]
    Hash(String),

    #[error("password worker failed: {0}")]
    Worker(String),
}

/// Salted Argon2id hashing with a fixed cost.
///
/// `compare` never errors: a digest that cannot be parsed is a mismatch, and it
/// still pays for one full hash so the outcome is not observable by timing.
#[derive(Clone)]
pub struct PasswordHasher {
    params: Params,
    decoy: Arc<OnceLock<Option<String>>>,
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self::new(Params::default())
    }
}

impl std::fmt::Debug for PasswordHasher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PasswordHasher")
            .field("m_cost", &self.params.m_cost())
            .field("t_cost", &self.params.t_cost())
            .finish()
    }
}

impl PasswordHasher {
    pub fn new(params: Params) -> Self {
        Self {
            params,
            decoy: Arc::new(OnceLock::new()),
        }
    }

    fn argon2(&self) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }

    pub fn hash(&self, secret: &str) -> Result<String, PasswordError> {
        let salt = SaltString::generate(&mut OsRng);
        self.argon2()
            .hash_password(secret.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| PasswordError::Hash(e.to_string()))
    }

    pub fn compare(&self, digest: &str, candidate: &str) -> bool {
        match PasswordHash::new(digest) {
            Ok(parsed) => self.argon2().verify_password(candidate.as_bytes(), &parsed).is_ok(),
            Err(_) => {
                self.spend_one_verification(candidate);
                false
            }
        }
    }

    /// Same cost as a real comparison, for identities that do not exist.
    pub fn reject_unknown(&self, candidate: &str) -> bool {
        self.spend_one_verification(candidate);
        false
    }

    fn spend_one_verification(&self, candidate: &str) {
        let decoy = self.decoy.get_or_init(|| self.hash("decoy-password").ok());
        if let Some(parsed) = decoy.as_deref().and_then(|d| PasswordHash::new(d).ok()) {
            let _ = self.argon2().verify_password(candidate.as_bytes(), &parsed);
        }
    }

    /// Hash on the blocking pool; the caller awaits the digest before responding.
    pub async fn hash_blocking(&self, secret: String) -> Result<String, PasswordError> {
        let hasher = self.clone();
        tokio::task::spawn_blocking(move || hasher.hash(&secret))
            .await
            .map_err(|e| PasswordError::Worker(e.to_string()))?
    }

    pub async fn compare_blocking(&self, digest: String, candidate: String) -> bool {
        let hasher = self.clone();
        match tokio::task::spawn_blocking(move || hasher.compare(&digest, &candidate)).await {
            Ok(matched) => matched,
            Err(e) => {
                tracing::error!("password comparison worker failed: {}", e);
                false
            }
        }
    }

    pub async fn reject_unknown_blocking(&self, candidate: String) -> bool {
        let hasher = self.clone();
        tokio::task::spawn_blocking(move || hasher.reject_unknown(&candidate))
            .await
            .unwrap_or(false)
    }
}
