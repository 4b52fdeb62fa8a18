use async_trait::async_trait;
use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
    middleware::{self, Next},
    response::Response,
    routing::MethodRouter,
};
use tracing::debug;

use crate::app::AppState;
use crate::error::ApiError;
use crate::types::{Principal, Role};

pub const MISSING_TOKEN: &str = "missing bearer token";
pub const INVALID_TOKEN: &str = "invalid or expired token";
pub const INSUFFICIENT_ROLE: &str = "insufficient role";

/// Verified caller attached to the request by `jwt_auth_middleware`
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AuthUser {
    pub subject_id: i64,
    pub principal: Principal,
    pub expires_at: i64,
}

impl AuthUser {
    pub fn role(&self) -> Option<Role> {
        self.principal.role()
    }

    /// The customer id when the caller is a customer
    pub fn customer_id(&self) -> Option<i64> {
        self.principal.is_customer().then_some(self.subject_id)
    }

    pub fn has_any_role(&self, allowed: &[Role]) -> bool {
        self.role().is_some_and(|role| allowed.contains(&role))
    }
}

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .copied()
            .ok_or_else(|| ApiError::unauthorized(MISSING_TOKEN))
    }
}

/// Token from an `Authorization: Bearer <token>` header
pub fn extract_bearer(headers: &HeaderMap) -> Result<&str, ApiError> {
    let value = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ApiError::unauthorized(MISSING_TOKEN))?;

    match value.trim().split_once(' ') {
        Some((scheme, token)) if scheme.eq_ignore_ascii_case("bearer") && !token.trim().is_empty() => {
            Ok(token.trim())
        }
        _ => Err(ApiError::unauthorized(MISSING_TOKEN)),
    }
}

/// Authentication: verify the bearer token and attach `AuthUser`.
pub async fn jwt_auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let verified = {
        let token = extract_bearer(request.headers())?;
        state.tokens.verify(token).map_err(|e| {
            debug!(error = %e, path = %request.uri().path(), "Rejected bearer token");
            ApiError::unauthorized(INVALID_TOKEN)
        })?
    };

    request.extensions_mut().insert(AuthUser {
        subject_id: verified.subject_id,
        principal: verified.principal,
        expires_at: verified.expires_at,
    });

    Ok(next.run(request).await)
}

/// Authorization: the attached caller must hold one of `allowed`.
pub async fn require_roles(allowed: &'static [Role], request: Request, next: Next) -> Result<Response, ApiError> {
    let user = request
        .extensions()
        .get::<AuthUser>()
        .copied()
        .ok_or_else(|| ApiError::unauthorized(MISSING_TOKEN))?;

    if !user.has_any_role(allowed) {
        debug!(
            subject_id = user.subject_id,
            role = %user.principal,
            path = %request.uri().path(),
            "Rejected by role guard"
        );
        return Err(ApiError::forbidden(INSUFFICIENT_ROLE));
    }

    Ok(next.run(request).await)
}

/// Wrap a method router so it only runs for the given staff roles.
/// Must sit beneath `jwt_auth_middleware`.
pub fn guarded<S>(route: MethodRouter<S>, allowed: &'static [Role]) -> MethodRouter<S>
where
    S: Clone + Send + Sync + 'static,
{
    route.route_layer(middleware::from_fn(move |request: Request, next: Next| {
        require_roles(allowed, request, next)
    }))
}
