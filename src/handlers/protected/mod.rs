// handlers/protected/mod.rs - valid bearer token required
//
// Everything here sits behind `jwt_auth_middleware`. Routes that act on
// behalf of a role are additionally wrapped with `guarded`.

pub mod auth;
pub mod customers;
pub mod reports;
pub mod tickets;

use axum::{
    routing::{delete, get, post, put},
    Router,
};

use crate::app::AppState;
use crate::middleware::guarded;
use crate::types::Role;

pub const STAFF: &[Role] = &Role::ALL;
pub const CUSTOMER_SERVICE: &[Role] = &[Role::CustomerService];
pub const NOC: &[Role] = &[Role::Noc];
pub const TECHNICIAN: &[Role] = &[Role::Technician];
pub const OWNER: &[Role] = &[Role::Owner];

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/auth/whoami", get(auth::whoami_get))
        .merge(ticket_routes())
        .merge(customer_routes())
        .merge(report_routes())
}

fn ticket_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/api/tickets",
            get(tickets::list_get).merge(guarded(post(tickets::create_post), CUSTOMER_SERVICE)),
        )
        .route("/api/tickets/:id", get(tickets::show_get))
        .route(
            "/api/tickets/:id/forward/noc",
            guarded(post(tickets::forward_noc_post), CUSTOMER_SERVICE),
        )
        .route("/api/tickets/:id/noc/diagnose", guarded(post(tickets::diagnose_post), NOC))
        .route(
            "/api/tickets/:id/technician/resolve",
            guarded(post(tickets::resolve_post), TECHNICIAN),
        )
}

fn customer_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/api/customers",
            guarded(get(customers::list_get), STAFF).merge(guarded(post(customers::create_post), CUSTOMER_SERVICE)),
        )
        .route(
            "/api/customers/:id",
            guarded(get(customers::show_get), STAFF)
                .merge(guarded(put(customers::update_put), CUSTOMER_SERVICE))
                .merge(guarded(delete(customers::delete_delete), OWNER)),
        )
        .route("/api/customers/:id/tickets", guarded(get(customers::tickets_get), STAFF))
}

fn report_routes() -> Router<AppState> {
    Router::new()
        .route("/api/reports/tickets", guarded(get(reports::tickets_get), STAFF))
        .route("/api/reports/trouble-types", guarded(get(reports::trouble_types_get), STAFF))
        .route("/api/reports/geographic", guarded(get(reports::geographic_get), STAFF))
        .route("/api/reports/summary", guarded(get(reports::summary_get), STAFF))
}
