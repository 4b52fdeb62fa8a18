// handlers/elevated/mod.rs - owner only
//
// Staff administration. The whole tier is wrapped in one owner guard.

pub mod staff;

use axum::{
    extract::Request,
    middleware::{self, Next},
    routing::get,
    Router,
};

use crate::app::AppState;
use crate::handlers::protected::OWNER;
use crate::middleware::require_roles;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/staff", get(staff::list_get).post(staff::create_post))
        .route(
            "/api/staff/:id",
            get(staff::show_get).put(staff::update_put).delete(staff::delete_delete),
        )
        .route("/api/employees", get(staff::list_get).post(staff::create_post))
        .route("/api/roles", get(staff::roles_get))
        .route_layer(middleware::from_fn(|request: Request, next: Next| require_roles(OWNER, request, next)))
}
