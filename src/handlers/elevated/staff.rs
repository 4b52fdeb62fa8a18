// handlers/elevated/staff.rs - /api/staff, /api/employees, /api/roles

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::app::AppState;
use crate::database::models::{Employee, EmployeeChanges, NewEmployee};
use crate::database::{EmployeeStore, Page, PageQuery};
use crate::error::ApiError;
use crate::handlers::required;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::services::auth::normalize_email;
use crate::types::{AccountStatus, Role};

#[derive(Debug, Deserialize)]
pub struct CreateStaffRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: String,
    #[serde(default)]
    pub status: Option<AccountStatus>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateStaffRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub role: Option<String>,
    pub status: Option<AccountStatus>,
}

#[derive(Debug, Serialize)]
pub struct RoleInfo {
    pub name: Role,
    pub description: &'static str,
}

fn parse_role(raw: &str) -> Result<Role, ApiError> {
    raw.trim()
        .parse()
        .map_err(|e: crate::types::UnknownVariant| ApiError::field_error("role", e.to_string()))
}

pub async fn list_get(
    State(state): State<AppState>,
    query: Result<Query<PageQuery>, QueryRejection>,
) -> ApiResult<Page<Employee>> {
    let Query(query) = query?;
    let page = query.normalize(&state.config.api);
    Ok(ApiResponse::success(state.store.list_employees(&page).await?))
}

pub async fn show_get(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
) -> ApiResult<Employee> {
    let Path(id) = id?;
    Ok(ApiResponse::success(state.store.get_employee(id).await?))
}

pub async fn create_post(
    State(state): State<AppState>,
    payload: Result<Json<CreateStaffRequest>, JsonRejection>,
) -> ApiResult<Employee> {
    let Json(body) = payload?;
    let name = required("name", &body.name)?;
    let email = normalize_email(&required("email", &body.email)?);
    let role = parse_role(&body.role)?;
    if body.password.is_empty() {
        return Err(ApiError::field_error("password", "password is required"));
    }

    let password_hash = state.passwords.hash_blocking(body.password).await?;
    let employee = state
        .store
        .create_employee(NewEmployee {
            name,
            email,
            password_hash,
            role,
            status: body.status.unwrap_or_default(),
        })
        .await?;

    tracing::info!(employee_id = employee.id, role = %employee.role, "Staff member created");
    Ok(ApiResponse::created(employee))
}

pub async fn update_put(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
    payload: Result<Json<UpdateStaffRequest>, JsonRejection>,
) -> ApiResult<Employee> {
    let Path(id) = id?;
    let Json(body) = payload?;

    let role = body.role.as_deref().map(parse_role).transpose()?;
    let password_hash = match body.password.filter(|p| !p.is_empty()) {
        Some(password) => Some(state.passwords.hash_blocking(password).await?),
        None => None,
    };

    let changes = EmployeeChanges {
        name: body.name.as_deref().map(|v| required("name", v)).transpose()?,
        email: body
            .email
            .as_deref()
            .map(|v| required("email", v).map(|e| normalize_email(&e)))
            .transpose()?,
        password_hash,
        role,
        status: body.status,
    };

    // Role changes take effect at the next login; issued tokens keep their role
    let employee = state.store.update_employee(id, changes).await?;
    Ok(ApiResponse::success(employee))
}

pub async fn delete_delete(
    State(state): State<AppState>,
    user: AuthUser,
    id: Result<Path<i64>, PathRejection>,
) -> ApiResult<Value> {
    let Path(id) = id?;
    if user.subject_id == id {
        return Err(ApiError::conflict("owners cannot delete their own account"));
    }
    state.store.delete_employee(id).await?;
    tracing::info!(employee_id = id, "Staff member deleted");
    Ok(ApiResponse::success(json!({ "id": id, "deleted": true })))
}

pub async fn roles_get() -> ApiResult<Vec<RoleInfo>> {
    let roles = Role::ALL
        .into_iter()
        .map(|name| RoleInfo { name, description: name.description() })
        .collect();
    Ok(ApiResponse::success(roles))
}
