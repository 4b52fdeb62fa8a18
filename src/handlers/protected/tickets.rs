// handlers/protected/tickets.rs - /api/tickets and the workflow transitions

use axum::{
    body::Bytes,
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    Json,
};
use serde::Deserialize;

use crate::app::AppState;
use crate::database::models::Ticket;
use crate::database::{Page, PageQuery, TicketStore};
use crate::error::ApiError;
use crate::handlers::optional_json;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::services::{TicketAction, TicketDraft};

#[derive(Debug, Deserialize)]
pub struct CreateTicketRequest {
    pub customer_id: i64,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "type", default)]
    pub ticket_type: Option<String>,
    #[serde(default)]
    pub note: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct NoteRequest {
    #[serde(default)]
    pub note: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct DiagnoseRequest {
    #[serde(default)]
    pub note: Option<String>,
    #[serde(default)]
    pub is_physical_problem: bool,
    #[serde(default)]
    pub resolved_by_noc: bool,
}

/// Newest first. Customers only see their own tickets.
pub async fn list_get(
    State(state): State<AppState>,
    user: AuthUser,
    query: Result<Query<PageQuery>, QueryRejection>,
) -> ApiResult<Page<Ticket>> {
    let Query(query) = query?;
    let page = query.normalize(&state.config.api);

    let tickets = match user.customer_id() {
        Some(customer_id) => state.store.list_customer_tickets(customer_id, &page).await?,
        None => state.store.list_tickets(&page).await?,
    };
    Ok(ApiResponse::success(tickets))
}

pub async fn show_get(
    State(state): State<AppState>,
    user: AuthUser,
    id: Result<Path<i64>, PathRejection>,
) -> ApiResult<Ticket> {
    let Path(id) = id?;
    let ticket = state.workflow.get(id).await?;

    // Another customer's ticket is reported as missing
    if user.customer_id().is_some_and(|customer_id| customer_id != ticket.customer_id) {
        return Err(ApiError::not_found(format!("ticket {} not found", id)));
    }
    Ok(ApiResponse::success(ticket))
}

pub async fn create_post(
    State(state): State<AppState>,
    payload: Result<Json<CreateTicketRequest>, JsonRejection>,
) -> ApiResult<Ticket> {
    let Json(body) = payload?;
    let ticket = state
        .workflow
        .create(TicketDraft {
            customer_id: body.customer_id,
            title: body.title,
            description: body.description,
            ticket_type: body.ticket_type,
            note: body.note,
        })
        .await?;
    Ok(ApiResponse::created(ticket))
}

pub async fn forward_noc_post(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
    body: Bytes,
) -> ApiResult<Ticket> {
    let Path(id) = id?;
    let NoteRequest { note } = optional_json(&body)?;
    let ticket = state.workflow.apply(id, TicketAction::ForwardToNoc { note }).await?;
    Ok(ApiResponse::success(ticket))
}

pub async fn diagnose_post(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
    body: Bytes,
) -> ApiResult<Ticket> {
    let Path(id) = id?;
    let DiagnoseRequest { note, is_physical_problem, resolved_by_noc } = optional_json(&body)?;
    let action = TicketAction::Diagnose { note, resolved_by_noc, is_physical_problem };
    let ticket = state.workflow.apply(id, action).await?;
    Ok(ApiResponse::success(ticket))
}

pub async fn resolve_post(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
    body: Bytes,
) -> ApiResult<Ticket> {
    let Path(id) = id?;
    let NoteRequest { note } = optional_json(&body)?;
    let ticket = state.workflow.apply(id, TicketAction::TechnicianResolve { note }).await?;
    Ok(ApiResponse::success(ticket))
}
