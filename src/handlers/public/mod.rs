// handlers/public/mod.rs - no token required
//
// Token acquisition and liveness endpoints.

pub mod auth;
pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::app::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(health::root_get))
        .route("/api/health", get(health::health_get))
        .route("/api/auth/employee/login", post(auth::employee_login_post))
        .route("/api/auth/customer/login", post(auth::customer_login_post))
}
