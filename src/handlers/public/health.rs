// handlers/public/health.rs - GET / and GET /api/health

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Value};

use crate::app::AppState;

pub async fn root_get() -> Json<Value> {
    Json(json!({
        "success": true,
        "data": {
            "name": "Ticket Desk API",
            "version": env!("CARGO_PKG_VERSION"),
            "status": "running",
            "endpoints": {
                "auth": "/api/auth/employee/login, /api/auth/customer/login (public)",
                "tickets": "/api/tickets[/:id] (token)",
                "customers": "/api/customers[/:id] (staff)",
                "reports": "/api/reports/* (staff)",
                "staff": "/api/staff[/:id], /api/employees, /api/roles (owner)",
            }
        }
    }))
}

pub async fn health_get(State(state): State<AppState>) -> impl IntoResponse {
    let now = chrono::Utc::now();
    let backend = state.store.backend_name();

    match state.store.ping().await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "data": {
                    "status": "healthy",
                    "timestamp": now,
                    "store": backend,
                }
            })),
        ),
        Err(e) => {
            tracing::error!("Health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "success": false,
                    "error": "store unavailable",
                    "code": "SERVICE_UNAVAILABLE",
                    "data": {
                        "status": "degraded",
                        "timestamp": now,
                        "store": backend,
                    }
                })),
            )
        }
    }
}
