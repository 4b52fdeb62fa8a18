// handlers/protected/customers.rs - /api/customers CRUD (staff only)

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::app::AppState;
use crate::database::models::{Customer, CustomerChanges, NewCustomer, Ticket};
use crate::database::{CustomerStore, Page, PageQuery, TicketStore};
use crate::error::ApiError;
use crate::handlers::{optional, required};
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::auth::normalize_email;
use crate::types::AccountStatus;

#[derive(Debug, Deserialize)]
pub struct CreateCustomerRequest {
    pub name: String,
    pub phone: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub gps_lat: Option<f64>,
    #[serde(default)]
    pub gps_long: Option<f64>,
    #[serde(default)]
    pub status: Option<AccountStatus>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateCustomerRequest {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub address: Option<String>,
    pub gps_lat: Option<f64>,
    pub gps_long: Option<f64>,
    pub status: Option<AccountStatus>,
}

fn check_coordinates(lat: Option<f64>, long: Option<f64>) -> Result<(), ApiError> {
    if lat.is_some_and(|v| !(-90.0..=90.0).contains(&v)) {
        return Err(ApiError::field_error("gps_lat", "latitude must be between -90 and 90"));
    }
    if long.is_some_and(|v| !(-180.0..=180.0).contains(&v)) {
        return Err(ApiError::field_error("gps_long", "longitude must be between -180 and 180"));
    }
    Ok(())
}

pub async fn list_get(
    State(state): State<AppState>,
    query: Result<Query<PageQuery>, QueryRejection>,
) -> ApiResult<Page<Customer>> {
    let Query(query) = query?;
    let page = query.normalize(&state.config.api);
    Ok(ApiResponse::success(state.store.list_customers(&page).await?))
}

pub async fn show_get(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
) -> ApiResult<Customer> {
    let Path(id) = id?;
    Ok(ApiResponse::success(state.store.get_customer(id).await?))
}

pub async fn create_post(
    State(state): State<AppState>,
    payload: Result<Json<CreateCustomerRequest>, JsonRejection>,
) -> ApiResult<Customer> {
    let Json(body) = payload?;
    let name = required("name", &body.name)?;
    let phone = required("phone", &body.phone)?;
    let email = normalize_email(&required("email", &body.email)?);
    if body.password.is_empty() {
        return Err(ApiError::field_error("password", "password is required"));
    }
    check_coordinates(body.gps_lat, body.gps_long)?;

    // Hash before insert; a hashing failure aborts the create
    let password_hash = state.passwords.hash_blocking(body.password).await?;

    let customer = state
        .store
        .create_customer(NewCustomer {
            name,
            phone,
            email,
            password_hash,
            address: optional(body.address),
            gps_lat: body.gps_lat,
            gps_long: body.gps_long,
            status: body.status.unwrap_or_default(),
        })
        .await?;

    tracing::info!(customer_id = customer.id, "Customer created");
    Ok(ApiResponse::created(customer))
}

pub async fn update_put(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
    payload: Result<Json<UpdateCustomerRequest>, JsonRejection>,
) -> ApiResult<Customer> {
    let Path(id) = id?;
    let Json(body) = payload?;
    check_coordinates(body.gps_lat, body.gps_long)?;

    let password_hash = match body.password.filter(|p| !p.is_empty()) {
        Some(password) => Some(state.passwords.hash_blocking(password).await?),
        None => None,
    };

    let changes = CustomerChanges {
        name: body.name.as_deref().map(|v| required("name", v)).transpose()?,
        phone: body.phone.as_deref().map(|v| required("phone", v)).transpose()?,
        email: body
            .email
            .as_deref()
            .map(|v| required("email", v).map(|e| normalize_email(&e)))
            .transpose()?,
        password_hash,
        address: optional(body.address),
        gps_lat: body.gps_lat,
        gps_long: body.gps_long,
        status: body.status,
    };

    Ok(ApiResponse::success(state.store.update_customer(id, changes).await?))
}

pub async fn delete_delete(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
) -> ApiResult<Value> {
    let Path(id) = id?;
    state.store.delete_customer(id).await?;
    tracing::info!(customer_id = id, "Customer deleted");
    Ok(ApiResponse::success(json!({ "id": id, "deleted": true })))
}

pub async fn tickets_get(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
    query: Result<Query<PageQuery>, QueryRejection>,
) -> ApiResult<Page<Ticket>> {
    let Path(id) = id?;
    let Query(query) = query?;
    let page = query.normalize(&state.config.api);

    // Unknown customer is a 404 rather than an empty page
    state.store.get_customer(id).await?;
    Ok(ApiResponse::success(state.store.list_customer_tickets(id, &page).await?))
}
