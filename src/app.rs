use axum::{
    http::{header, HeaderValue, Method, Uri},
    middleware,
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::warn;

use crate::auth::{PasswordHasher, TokenService};
use crate::config::{AppConfig, SecurityConfig};
use crate::database::Store;
use crate::error::ApiError;
use crate::handlers;
use crate::middleware::jwt_auth_middleware;
use crate::services::{LoginService, TicketWorkflow};

/// Shared per-process dependencies, cloned into every handler
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub store: Arc<dyn Store>,
    pub tokens: Arc<TokenService>,
    pub passwords: PasswordHasher,
    pub workflow: TicketWorkflow<dyn Store>,
    pub logins: LoginService<dyn Store>,
}

impl AppState {
    pub fn new(config: AppConfig, store: Arc<dyn Store>, tokens: TokenService, passwords: PasswordHasher) -> Self {
        let tokens = Arc::new(tokens);
        Self {
            config: Arc::new(config),
            workflow: TicketWorkflow::new(Arc::clone(&store)),
            logins: LoginService::new(Arc::clone(&store), Arc::clone(&tokens), passwords.clone()),
            store,
            tokens,
            passwords,
        }
    }
}

pub fn router(state: AppState) -> Router {
    let protected = Router::new()
        .merge(handlers::protected::routes())
        .merge(handlers::elevated::routes())
        .route_layer(middleware::from_fn_with_state(state.clone(), jwt_auth_middleware));

    let mut app = Router::new()
        .merge(handlers::public::routes())
        .merge(protected)
        .fallback(fallback)
        .with_state(state.clone());

    if state.config.security.enable_cors {
        app = app.layer(cors_layer(&state.config.security));
    }
    if state.config.api.enable_request_logging {
        app = app.layer(TraceLayer::new_for_http());
    }
    app
}

async fn fallback(uri: Uri) -> ApiError {
    ApiError::not_found(format!("no route for {}", uri.path()))
}

pub fn cors_layer(security: &SecurityConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = security
        .cors_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin {:?}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::ORIGIN, header::CONTENT_TYPE, header::ACCEPT, header::AUTHORIZATION])
        .allow_credentials(true)
}
