// handlers/protected/auth.rs - GET /api/auth/whoami

use chrono::{TimeZone, Utc};
use serde_json::{json, Value};

use crate::middleware::{ApiResponse, ApiResult, AuthUser};

/// Echo the verified token; the role is as of issuance.
pub async fn whoami_get(user: AuthUser) -> ApiResult<Value> {
    let expires_at = Utc.timestamp_opt(user.expires_at, 0).single();

    Ok(ApiResponse::success(json!({
        "subject_id": user.subject_id,
        "role": user.principal,
        "kind": if user.principal.is_customer() { "customer" } else { "staff" },
        "expires_at": expires_at,
    })))
}
