use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

use crate::database::DatabaseError;
use crate::types::{Role, TicketStatus};

pub const DEFAULT_TICKET_TYPE: &str = "general";

/// A customer trouble report.
///
/// `assignee_role` is always `status.assignee()`; rows that disagree are
/// rejected when read.
#[derive(Debug, Clone, Serialize)]
pub struct Ticket {
    pub id: i64,
    pub customer_id: i64,
    pub title: String,
    #[serde(rename = "type")]
    pub ticket_type: String,
    pub description: String,
    pub status: TicketStatus,
    #[serde(rename = "current_assignee_role")]
    pub assignee_role: Role,
    pub customer_note: Option<String>,
    pub noc_note: Option<String>,
    pub technician_note: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow)]
pub struct TicketRow {
    pub id: i64,
    pub customer_id: i64,
    pub title: String,
    pub ticket_type: String,
    pub description: String,
    pub status: String,
    pub assignee_role: String,
    pub customer_note: Option<String>,
    pub noc_note: Option<String>,
    pub technician_note: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<TicketRow> for Ticket {
    type Error = DatabaseError;

    fn try_from(row: TicketRow) -> Result<Self, Self::Error> {
        let status: TicketStatus = row.status.parse()?;
        let assignee_role: Role = row.assignee_role.parse()?;
        if assignee_role != status.assignee() {
            return Err(DatabaseError::InvalidRow(format!(
                "ticket {} is {} but assigned to {}",
                row.id, status, assignee_role
            )));
        }

        Ok(Ticket {
            id: row.id,
            customer_id: row.customer_id,
            title: row.title,
            ticket_type: row.ticket_type,
            description: row.description,
            status,
            assignee_role,
            customer_note: row.customer_note,
            noc_note: row.noc_note,
            technician_note: row.technician_note,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Insert payload. The store derives the assignee from `status`.
#[derive(Debug, Clone)]
pub struct NewTicket {
    pub customer_id: i64,
    pub title: String,
    pub ticket_type: String,
    pub description: String,
    pub status: TicketStatus,
    pub customer_note: Option<String>,
}

/// One workflow step: the new status plus any notes it writes.
/// A `None` note keeps what is stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TicketMutation {
    pub status: TicketStatus,
    pub customer_note: Option<String>,
    pub noc_note: Option<String>,
    pub technician_note: Option<String>,
}

impl TicketMutation {
    pub fn to(status: TicketStatus) -> Self {
        Self { status, customer_note: None, noc_note: None, technician_note: None }
    }

    pub fn assignee(&self) -> Role {
        self.status.assignee()
    }

    pub fn apply_to(&self, ticket: &mut Ticket, now: DateTime<Utc>) {
        ticket.status = self.status;
        ticket.assignee_role = self.assignee();
        if let Some(note) = &self.customer_note {
            ticket.customer_note = Some(note.clone());
        }
        if let Some(note) = &self.noc_note {
            ticket.noc_note = Some(note.clone());
        }
        if let Some(note) = &self.technician_note {
            ticket.technician_note = Some(note.clone());
        }
        ticket.updated_at = now;
    }
}
