// handlers/protected/reports.rs - /api/reports/*

use axum::extract::{rejection::QueryRejection, Query, State};

use crate::app::AppState;
use crate::database::models::Ticket;
use crate::database::{Page, PageQuery, TicketStore};
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::reports::{self, GeographicReport, TicketSummary, TroubleTypeStat};

/// Paged ticket listing; `search` matches title or description.
pub async fn tickets_get(
    State(state): State<AppState>,
    query: Result<Query<PageQuery>, QueryRejection>,
) -> ApiResult<Page<Ticket>> {
    let Query(query) = query?;
    let page = query.normalize(&state.config.api);
    Ok(ApiResponse::success(state.store.list_tickets(&page).await?))
}

pub async fn trouble_types_get(State(state): State<AppState>) -> ApiResult<Vec<TroubleTypeStat>> {
    Ok(ApiResponse::success(reports::trouble_types(state.store.as_ref()).await?))
}

pub async fn geographic_get(State(state): State<AppState>) -> ApiResult<GeographicReport> {
    Ok(ApiResponse::success(reports::geographic(state.store.as_ref()).await?))
}

pub async fn summary_get(State(state): State<AppState>) -> ApiResult<TicketSummary> {
    Ok(ApiResponse::success(reports::summary(state.store.as_ref()).await?))
}
