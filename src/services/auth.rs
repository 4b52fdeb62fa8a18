use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

use crate::auth::{PasswordHasher, TokenError, TokenService};
use crate::database::{CredentialStore, DatabaseError};
use crate::types::{AccountStatus, Principal};

#[derive(Debug, Error)]
pub enum LoginError {
    /// Unknown identity, wrong password and inactive account all land here
    #[error("invalid credentials")]
    InvalidCredentials,

    #[error(transparent)]
    Store(#[from] DatabaseError),

    #[error(transparent)]
    Token(#[from] TokenError),
}

/// Lower-cased, trimmed email as stored
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[derive(Debug, Clone, Serialize)]
pub struct SubjectSummary {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub role: Principal,
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub subject: SubjectSummary,
}

/// Credential checks for staff and customer logins
pub struct LoginService<S: ?Sized> {
    store: Arc<S>,
    tokens: Arc<TokenService>,
    passwords: PasswordHasher,
}

impl<S: ?Sized> Clone for LoginService<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            tokens: Arc::clone(&self.tokens),
            passwords: self.passwords.clone(),
        }
    }
}

impl<S: CredentialStore + ?Sized> LoginService<S> {
    pub fn new(store: Arc<S>, tokens: Arc<TokenService>, passwords: PasswordHasher) -> Self {
        Self { store, tokens, passwords }
    }

    /// Every path spends exactly one password verification, found or not.
    async fn check(
        &self,
        stored: Option<(String, AccountStatus)>,
        password: &str,
    ) -> Result<(), LoginError> {
        let Some((digest, status)) = stored else {
            self.passwords.reject_unknown_blocking(password.to_string()).await;
            return Err(LoginError::InvalidCredentials);
        };

        let matched = self.passwords.compare_blocking(digest, password.to_string()).await;
        if !matched || status != AccountStatus::Active {
            return Err(LoginError::InvalidCredentials);
        }
        Ok(())
    }

    pub async fn employee_login(&self, email: &str, password: &str) -> Result<LoginResponse, LoginError> {
        let employee = self.store.find_employee_by_email(&normalize_email(email)).await?;
        let stored = employee.as_ref().map(|e| (e.password_hash.clone(), e.status));

        if let Err(err) = self.check(stored, password).await {
            debug!("Employee login rejected");
            return Err(err);
        }
        let Some(employee) = employee else {
            return Err(LoginError::InvalidCredentials);
        };

        let principal = Principal::Staff(employee.role);
        let issued = self.tokens.issue(employee.id, principal)?;
        info!(subject_id = employee.id, role = %principal, "Employee logged in");

        Ok(LoginResponse {
            token: issued.token,
            expires_at: issued.expires_at,
            subject: SubjectSummary { id: employee.id, name: employee.name, email: employee.email, role: principal },
        })
    }

    /// `identifier` is either the customer's email or phone number.
    pub async fn customer_login(&self, identifier: &str, password: &str) -> Result<LoginResponse, LoginError> {
        let identifier = identifier.trim();
        let lookup = if identifier.contains('@') { normalize_email(identifier) } else { identifier.to_string() };

        let customer = if lookup.is_empty() {
            None
        } else {
            self.store.find_customer_by_email_or_phone(&lookup).await?
        };
        let stored = customer.as_ref().map(|c| (c.password_hash.clone(), c.status));

        if let Err(err) = self.check(stored, password).await {
            debug!("Customer login rejected");
            return Err(err);
        }
        let Some(customer) = customer else {
            return Err(LoginError::InvalidCredentials);
        };

        let issued = self.tokens.issue(customer.id, Principal::Customer)?;
        info!(subject_id = customer.id, role = %Principal::Customer, "Customer logged in");

        Ok(LoginResponse {
            token: issued.token,
            expires_at: issued.expires_at,
            subject: SubjectSummary {
                id: customer.id,
                name: customer.name,
                email: customer.email,
                role: Principal::Customer,
            },
        })
    }
}
