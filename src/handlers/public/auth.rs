// handlers/public/auth.rs - POST /api/auth/{employee,customer}/login

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use serde::Deserialize;

use crate::app::AppState;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::LoginResponse;

#[derive(Debug, Deserialize)]
pub struct EmployeeLoginRequest {
    pub email: String,
    pub password: String,
}

/// Customers sign in with email or phone; either field name is accepted.
#[derive(Debug, Deserialize)]
pub struct CustomerLoginRequest {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    pub password: String,
}

impl CustomerLoginRequest {
    fn identifier(&self) -> &str {
        self.email
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .or(self.phone.as_deref())
            .unwrap_or_default()
    }
}

pub async fn employee_login_post(
    State(state): State<AppState>,
    payload: Result<Json<EmployeeLoginRequest>, JsonRejection>,
) -> ApiResult<LoginResponse> {
    let Json(body) = payload?;
    if body.email.trim().is_empty() || body.password.is_empty() {
        return Err(ApiError::bad_request("email and password are required"));
    }

    let login = state.logins.employee_login(&body.email, &body.password).await?;
    Ok(ApiResponse::success(login))
}

pub async fn customer_login_post(
    State(state): State<AppState>,
    payload: Result<Json<CustomerLoginRequest>, JsonRejection>,
) -> ApiResult<LoginResponse> {
    let Json(body) = payload?;
    let identifier = body.identifier();
    if identifier.trim().is_empty() || body.password.is_empty() {
        return Err(ApiError::bad_request("email or phone and password are required"));
    }

    let login = state.logins.customer_login(identifier, &body.password).await?;
    Ok(ApiResponse::success(login))
}
