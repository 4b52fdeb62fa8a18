use chrono::{DateTime, Duration, TimeZone, Utc};
use jsonwebtoken::{decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};
use thiserror::Error;

use crate::config::SecurityConfig;
use crate::types::Principal;

/// Lifetime of every issued token. There is no renewal path.
pub const TOKEN_TTL_HOURS: i64 = 24;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject id (employee or customer primary key)
    pub sub: String,
    pub role: Principal,
    pub iss: String,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("token signature does not match")]
    InvalidSignature,

    #[error("token has expired")]
    Expired,

    #[error("token is malformed: {0}")]
    Malformed(String),

    #[error("token was issued by another service")]
    WrongIssuer,

    #[error("token signing failed: {0}")]
    Signing(String),

    #[error("signing secret is not configured")]
    MissingSecret,
}

impl From<jsonwebtoken::errors::Error> for TokenError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        match err.kind() {
            ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => TokenError::InvalidSignature,
            ErrorKind::ExpiredSignature => TokenError::Expired,
            ErrorKind::InvalidIssuer => TokenError::WrongIssuer,
            _ => TokenError::Malformed(err.to_string()),
        }
    }
}

/// Source of "now" for issuing and expiring tokens
pub trait Clock: Send + Sync + 'static {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Manually driven clock for expiry checks in tests and tooling
#[derive(Debug, Clone)]
pub struct FixedClock {
    now: Arc<Mutex<DateTime<Utc>>>,
}

impl FixedClock {
    pub fn at(now: DateTime<Utc>) -> Self {
        Self { now: Arc::new(Mutex::new(now)) }
    }

    pub fn at_timestamp(secs: i64) -> Self {
        Self::at(Utc.timestamp_opt(secs, 0).single().unwrap_or_else(Utc::now))
    }

    pub fn set(&self, now: DateTime<Utc>) {
        if let Ok(mut guard) = self.now.lock() {
            *guard = now;
        }
    }

    pub fn advance(&self, by: Duration) {
        if let Ok(mut guard) = self.now.lock() {
            *guard += by;
        }
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.now.lock().map(|guard| *guard).unwrap_or_else(|poisoned| *poisoned.into_inner())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct IssuedToken {
    pub token: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// Result of a successful verification: who the bearer is, as of issuance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VerifiedToken {
    pub subject_id: i64,
    pub principal: Principal,
    pub issued_at: i64,
    pub expires_at: i64,
}

/// Issues and verifies HS256 bearer tokens.
///
/// Verification never consults the credential store: the role embedded at
/// issuance is trusted until the token expires.
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    issuer: String,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for TokenService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenService").field("issuer", &self.issuer).finish_non_exhaustive()
    }
}

impl TokenService {
    pub fn new(secret: &str, issuer: impl Into<String>) -> Result<Self, TokenError> {
        if secret.is_empty() {
            return Err(TokenError::MissingSecret);
        }

        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            issuer: issuer.into(),
            clock: Arc::new(SystemClock),
        })
    }

    pub fn from_config(security: &SecurityConfig) -> Result<Self, TokenError> {
        Self::new(&security.jwt_secret, security.jwt_issuer.clone())
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn issue(&self, subject_id: i64, principal: Principal) -> Result<IssuedToken, TokenError> {
        let issued_at = self.clock.now();
        let expires_at = issued_at + Duration::hours(TOKEN_TTL_HOURS);

        let claims = Claims {
            sub: subject_id.to_string(),
            role: principal,
            iss: self.issuer.clone(),
            iat: issued_at.timestamp(),
            exp: expires_at.timestamp(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| TokenError::Signing(e.to_string()))?;

        Ok(IssuedToken { token, issued_at, expires_at })
    }

    pub fn verify(&self, token: &str) -> Result<VerifiedToken, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry is checked below against our own clock, inclusive of the boundary
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "iat", "iss", "sub"]);
        validation.set_issuer(&[self.issuer.as_str()]);

        let data = decode::<Claims>(token, &self.decoding_key, &validation)?;
        let claims = data.claims;

        if self.clock.now().timestamp() >= claims.exp {
            return Err(TokenError::Expired);
        }

        let subject_id = claims
            .sub
            .parse::<i64>()
            .map_err(|_| TokenError::Malformed(format!("subject '{}' is not an id", claims.sub)))?;

        Ok(VerifiedToken {
            subject_id,
            principal: claims.role,
            issued_at: claims.iat,
            expires_at: claims.exp,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Role;

    const SECRET: &str = "unit-test-secret";
    const T0: i64 = 1_700_000_000;

    fn service_at(secs: i64) -> (TokenService, FixedClock) {
        let clock = FixedClock::at_timestamp(secs);
        let service = TokenService::new(SECRET, "ticket-desk").unwrap().with_clock(Arc::new(clock.clone()));
        (service, clock)
    }

    #[test]
    fn issue_then_verify_returns_same_subject_and_role() {
        let (service, _clock) = service_at(T0);
        let issued = service.issue(42, Principal::Staff(Role::Noc)).unwrap();

        let verified = service.verify(&issued.token).unwrap();
        assert_eq!(verified.subject_id, 42);
        assert_eq!(verified.principal, Principal::Staff(Role::Noc));
        assert_eq!(verified.issued_at, T0);
        assert_eq!(verified.expires_at, T0 + 24 * 3600);
    }

    #[test]
    fn issuance_is_deterministic_for_fixed_clock() {
        let (service, clock) = service_at(T0);
        let a = service.issue(7, Principal::Customer).unwrap();
        let b = service.issue(7, Principal::Customer).unwrap();
        assert_eq!(a.token, b.token);

        clock.advance(Duration::seconds(1));
        let c = service.issue(7, Principal::Customer).unwrap();
        assert_ne!(a.token, c.token);
    }

    #[test]
    fn expiry_boundary_is_inclusive() {
        let (service, clock) = service_at(T0);
        let issued = service.issue(1, Principal::Staff(Role::Owner)).unwrap();

        clock.set(issued.expires_at - Duration::seconds(1));
        assert!(service.verify(&issued.token).is_ok());

        clock.set(issued.expires_at);
        assert_eq!(service.verify(&issued.token), Err(TokenError::Expired));

        clock.advance(Duration::days(3));
        assert_eq!(service.verify(&issued.token), Err(TokenError::Expired));
    }

    #[test]
    fn foreign_secret_fails_signature_check() {
        let (service, _clock) = service_at(T0);
        let other = TokenService::new("another-secret", "ticket-desk")
            .unwrap()
            .with_clock(Arc::new(FixedClock::at_timestamp(T0)));

        let issued = other.issue(1, Principal::Staff(Role::Owner)).unwrap();
        assert_eq!(service.verify(&issued.token), Err(TokenError::InvalidSignature));
    }

    #[test]
    fn tampered_payload_fails_signature_check() {
        let (service, _clock) = service_at(T0);
        let issued = service.issue(1, Principal::Staff(Role::Technician)).unwrap();
        let forged = service.issue(1, Principal::Staff(Role::Owner)).unwrap();

        // Splice the owner payload onto the technician signature
        let parts: Vec<&str> = issued.token.split('.').collect();
        let forged_parts: Vec<&str> = forged.token.split('.').collect();
        let spliced = format!("{}.{}.{}", parts[0], forged_parts[1], parts[2]);

        assert_eq!(service.verify(&spliced), Err(TokenError::InvalidSignature));
    }

    #[test]
    fn garbage_is_malformed() {
        let (service, _clock) = service_at(T0);
        assert!(matches!(service.verify("not-a-token"), Err(TokenError::Malformed(_))));
        assert!(matches!(service.verify(""), Err(TokenError::Malformed(_))));
    }

    #[test]
    fn other_issuer_is_rejected() {
        let (service, _clock) = service_at(T0);
        let other = TokenService::new(SECRET, "someone-else")
            .unwrap()
            .with_clock(Arc::new(FixedClock::at_timestamp(T0)));

        let issued = other.issue(1, Principal::Staff(Role::Owner)).unwrap();
        assert_eq!(service.verify(&issued.token), Err(TokenError::WrongIssuer));
    }

    #[test]
    fn unknown_role_claim_is_malformed() {
        let (service, _clock) = service_at(T0);
        let claims = serde_json::json!({
            "sub": "1",
            "role": "superuser",
            "iss": "ticket-desk",
            "iat": T0,
            "exp": T0 + 3600,
        });
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap();

        assert!(matches!(service.verify(&token), Err(TokenError::Malformed(_))));
    }

    #[test]
    fn empty_secret_is_refused() {
        assert_eq!(TokenService::new("", "ticket-desk").err(), Some(TokenError::MissingSecret));
    }
}
