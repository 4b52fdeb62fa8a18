use serde::Serialize;
use std::collections::BTreeMap;

use crate::database::{DatabaseError, GeoCount, ReportStore, TypeCount};
use crate::types::TicketStatus;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TicketSummary {
    pub total_tickets: i64,
    pub resolved_tickets: i64,
    /// Still waiting on customer service intake
    pub open_tickets: i64,
    /// With NOC, a technician, or diagnosed and awaiting closure
    pub in_progress_tickets: i64,
    pub by_status: BTreeMap<&'static str, i64>,
}

impl TicketSummary {
    pub fn from_counts(counts: &[(TicketStatus, i64)]) -> Self {
        let mut by_status: BTreeMap<&'static str, i64> =
            TicketStatus::ALL.iter().map(|s| (s.as_str(), 0)).collect();
        let mut summary = TicketSummary {
            total_tickets: 0,
            resolved_tickets: 0,
            open_tickets: 0,
            in_progress_tickets: 0,
            by_status: BTreeMap::new(),
        };

        for &(status, count) in counts {
            summary.total_tickets += count;
            *by_status.entry(status.as_str()).or_default() += count;
            match status {
                TicketStatus::Resolved => summary.resolved_tickets += count,
                TicketStatus::Received => summary.open_tickets += count,
                _ => summary.in_progress_tickets += count,
            }
        }

        summary.by_status = by_status;
        summary
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TroubleTypeStat {
    pub name: String,
    pub count: i64,
    pub percentage: f64,
}

pub fn trouble_type_stats(counts: Vec<TypeCount>) -> Vec<TroubleTypeStat> {
    let total: i64 = counts.iter().map(|c| c.count).sum();
    if total == 0 {
        return Vec::new();
    }
    counts
        .into_iter()
        .map(|c| TroubleTypeStat {
            percentage: c.count as f64 / total as f64 * 100.0,
            name: c.name,
            count: c.count,
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AreaStat {
    pub latitude: f64,
    pub longitude: f64,
    pub ticket_count: i64,
    pub area: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeographicReport {
    pub areas: Vec<AreaStat>,
    pub most_affected_area: Option<String>,
}

pub fn area_label(latitude: f64, longitude: f64) -> String {
    format!("Area {:.2}, {:.2}", latitude, longitude)
}

/// `groups` must already be ordered most tickets first.
pub fn geographic_report(groups: Vec<GeoCount>) -> GeographicReport {
    let areas: Vec<AreaStat> = groups
        .into_iter()
        .map(|g| AreaStat {
            area: area_label(g.latitude, g.longitude),
            latitude: g.latitude,
            longitude: g.longitude,
            ticket_count: g.ticket_count,
        })
        .collect();
    let most_affected_area = areas.first().map(|a| a.area.clone());
    GeographicReport { areas, most_affected_area }
}

pub async fn summary<S: ReportStore + ?Sized>(store: &S) -> Result<TicketSummary, DatabaseError> {
    Ok(TicketSummary::from_counts(&store.status_counts().await?))
}

pub async fn trouble_types<S: ReportStore + ?Sized>(store: &S) -> Result<Vec<TroubleTypeStat>, DatabaseError> {
    Ok(trouble_type_stats(store.trouble_type_counts().await?))
}

pub async fn geographic<S: ReportStore + ?Sized>(store: &S) -> Result<GeographicReport, DatabaseError> {
    Ok(geographic_report(store.geographic_counts().await?))
}
