use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::database::models::{NewTicket, Ticket, TicketMutation, DEFAULT_TICKET_TYPE};
use crate::database::{DatabaseError, TicketStore};
use crate::types::{Role, TicketStatus};

/// Attempts per transition before a lost race is reported as `Conflict`.
pub const DEFAULT_MAX_ATTEMPTS: usize = 3;

#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("ticket {0} not found")]
    NotFound(i64),

    #[error("cannot {action} a ticket that is {from}")]
    InvalidTransition { action: &'static str, from: TicketStatus },

    #[error("ticket {0} kept changing underneath the update, try again")]
    Conflict(i64),

    #[error("{field}: {reason}")]
    Invalid { field: &'static str, reason: String },

    #[error(transparent)]
    Store(#[from] DatabaseError),
}

/// A workflow step requested against an existing ticket
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TicketAction {
    ForwardToNoc {
        note: Option<String>,
    },
    /// `resolved_by_noc` wins when both flags are set.
    Diagnose {
        note: Option<String>,
        resolved_by_noc: bool,
        is_physical_problem: bool,
    },
    TechnicianResolve {
        note: Option<String>,
    },
}

impl TicketAction {
    pub fn name(&self) -> &'static str {
        match self {
            TicketAction::ForwardToNoc { .. } => "forward to NOC",
            TicketAction::Diagnose { .. } => "diagnose",
            TicketAction::TechnicianResolve { .. } => "resolve",
        }
    }

    /// Role the route guard must require before this action reaches the engine
    pub fn required_role(&self) -> Role {
        match self {
            TicketAction::ForwardToNoc { .. } => Role::CustomerService,
            TicketAction::Diagnose { .. } => Role::Noc,
            TicketAction::TechnicianResolve { .. } => Role::Technician,
        }
    }
}

fn clean_note(note: &Option<String>) -> Option<String> {
    note.as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .map(str::to_string)
}

/// Transition table. Pure: decides the mutation for `action` taken on a
/// ticket currently in `from`, or refuses it.
pub fn plan(from: TicketStatus, action: &TicketAction) -> Result<TicketMutation, WorkflowError> {
    use crate::types::TicketStatus::*;

    let refuse = || WorkflowError::InvalidTransition { action: action.name(), from };

    match action {
        TicketAction::ForwardToNoc { note } => match from {
            Received => Ok(TicketMutation {
                customer_note: clean_note(note),
                ..TicketMutation::to(ForwardedToNoc)
            }),
            _ => Err(refuse()),
        },
        TicketAction::Diagnose { note, resolved_by_noc, is_physical_problem } => {
            let to = match (from, *resolved_by_noc, *is_physical_problem) {
                (ForwardedToNoc | Diagnosed, true, _) => Resolved,
                (ForwardedToNoc, false, true) => ForwardedToTechnician,
                (ForwardedToNoc, false, false) => Diagnosed,
                _ => return Err(refuse()),
            };
            Ok(TicketMutation { noc_note: clean_note(note), ..TicketMutation::to(to) })
        }
        TicketAction::TechnicianResolve { note } => match from {
            ForwardedToTechnician => Ok(TicketMutation {
                technician_note: clean_note(note),
                ..TicketMutation::to(Resolved)
            }),
            _ => Err(refuse()),
        },
    }
}

/// Fields for a new ticket, as taken from customer service
#[derive(Debug, Clone, Default)]
pub struct TicketDraft {
    pub customer_id: i64,
    pub title: String,
    pub description: String,
    pub ticket_type: Option<String>,
    pub note: Option<String>,
}

/// Applies workflow transitions through a `TicketStore`.
///
/// Each transition is read, validated against the table, then written with a
/// compare-and-set on the status that was read. Losing a race re-reads and
/// re-validates instead of overwriting.
pub struct TicketWorkflow<S: ?Sized> {
    store: Arc<S>,
    max_attempts: usize,
}

impl<S: ?Sized> Clone for TicketWorkflow<S> {
    fn clone(&self) -> Self {
        Self { store: Arc::clone(&self.store), max_attempts: self.max_attempts }
    }
}

impl<S: TicketStore + ?Sized> TicketWorkflow<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store, max_attempts: DEFAULT_MAX_ATTEMPTS }
    }

    pub async fn create(&self, draft: TicketDraft) -> Result<Ticket, WorkflowError> {
        let title = draft.title.trim();
        if title.is_empty() {
            return Err(WorkflowError::Invalid { field: "title", reason: "title is required".into() });
        }
        if draft.customer_id <= 0 {
            return Err(WorkflowError::Invalid {
                field: "customer_id",
                reason: "customer_id must be a positive id".into(),
            });
        }
        let ticket_type = draft
            .ticket_type
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .unwrap_or(DEFAULT_TICKET_TYPE)
            .to_string();

        let ticket = self
            .store
            .create_ticket(NewTicket {
                customer_id: draft.customer_id,
                title: title.to_string(),
                ticket_type,
                description: draft.description.trim().to_string(),
                status: TicketStatus::Received,
                customer_note: clean_note(&draft.note),
            })
            .await?;

        info!(ticket_id = ticket.id, customer_id = ticket.customer_id, "Ticket received");
        Ok(ticket)
    }

    pub async fn get(&self, id: i64) -> Result<Ticket, WorkflowError> {
        self.store.get_ticket(id).await.map_err(|e| match e {
            DatabaseError::NotFound(_) => WorkflowError::NotFound(id),
            other => WorkflowError::Store(other),
        })
    }

    pub async fn apply(&self, id: i64, action: TicketAction) -> Result<Ticket, WorkflowError> {
        for attempt in 1..=self.max_attempts {
            let current = self.get(id).await?;
            let mutation = plan(current.status, &action)?;
            let to = mutation.status;

            match self.store.update_ticket(id, current.status, mutation).await {
                Ok(ticket) => {
                    info!(ticket_id = id, from = %current.status, to = %to, action = action.name(), "Ticket transitioned");
                    return Ok(ticket);
                }
                Err(DatabaseError::Conflict(_)) => {
                    debug!(ticket_id = id, attempt, "Ticket changed during transition, re-reading");
                }
                Err(DatabaseError::NotFound(_)) => return Err(WorkflowError::NotFound(id)),
                Err(other) => return Err(WorkflowError::Store(other)),
            }
        }

        warn!(ticket_id = id, attempts = self.max_attempts, "Giving up on contended ticket");
        Err(WorkflowError::Conflict(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::models::NewCustomer;
    use crate::database::{CustomerStore, MemoryStore};
    use crate::types::AccountStatus;
    use crate::types::TicketStatus::*;

    fn diagnose(resolved_by_noc: bool, is_physical_problem: bool) -> TicketAction {
        TicketAction::Diagnose { note: Some("checked OLT".into()), resolved_by_noc, is_physical_problem }
    }

    fn forward() -> TicketAction {
        TicketAction::ForwardToNoc { note: None }
    }

    fn resolve() -> TicketAction {
        TicketAction::TechnicianResolve { note: Some("replaced ONT".into()) }
    }

    #[test]
    fn transition_table() {
        let cases = [
            (Received, forward(), Some(ForwardedToNoc)),
            (ForwardedToNoc, diagnose(true, false), Some(Resolved)),
            (ForwardedToNoc, diagnose(true, true), Some(Resolved)),
            (ForwardedToNoc, diagnose(false, true), Some(ForwardedToTechnician)),
            (ForwardedToNoc, diagnose(false, false), Some(Diagnosed)),
            (Diagnosed, diagnose(true, false), Some(Resolved)),
            (Diagnosed, diagnose(false, true), None),
            (Diagnosed, diagnose(false, false), None),
            (ForwardedToTechnician, resolve(), Some(Resolved)),
            (Received, diagnose(true, false), None),
            (Received, resolve(), None),
            (ForwardedToNoc, forward(), None),
            (ForwardedToNoc, resolve(), None),
            (Resolved, forward(), None),
            (Resolved, diagnose(true, false), None),
            (Resolved, resolve(), None),
        ];

        for (from, action, expected) in cases {
            let outcome = plan(from, &action);
            match expected {
                Some(to) => {
                    let mutation = outcome.unwrap_or_else(|e| panic!("{} from {}: {}", action.name(), from, e));
                    assert_eq!(mutation.status, to);
                    assert_eq!(mutation.assignee(), to.assignee());
                }
                None => assert!(
                    matches!(outcome, Err(WorkflowError::InvalidTransition { .. })),
                    "{} from {} should be refused",
                    action.name(),
                    from
                ),
            }
        }
    }

    #[test]
    fn notes_go_to_the_acting_role() {
        let m = plan(Received, &TicketAction::ForwardToNoc { note: Some("  please check  ".into()) }).unwrap();
        assert_eq!(m.customer_note.as_deref(), Some("please check"));
        assert_eq!((m.noc_note, m.technician_note), (None, None));

        let m = plan(ForwardedToNoc, &diagnose(false, true)).unwrap();
        assert_eq!(m.noc_note.as_deref(), Some("checked OLT"));
        assert_eq!(m.customer_note, None);

        let m = plan(ForwardedToTechnician, &TicketAction::TechnicianResolve { note: Some(" ".into()) }).unwrap();
        assert_eq!(m.technician_note, None);
    }

    #[test]
    fn actions_name_their_role() {
        assert_eq!(forward().required_role(), Role::CustomerService);
        assert_eq!(diagnose(false, false).required_role(), Role::Noc);
        assert_eq!(resolve().required_role(), Role::Technician);
    }

    async fn setup() -> (Arc<MemoryStore>, TicketWorkflow<MemoryStore>, i64) {
        let store = Arc::new(MemoryStore::new());
        let customer = store
            .create_customer(NewCustomer {
                name: "Budi".into(),
                phone: "0811".into(),
                email: "budi@example.com".into(),
                password_hash: "x".into(),
                address: None,
                gps_lat: None,
                gps_long: None,
                status: AccountStatus::Active,
            })
            .await
            .unwrap();
        let workflow = TicketWorkflow::new(Arc::clone(&store));
        (store, workflow, customer.id)
    }

    #[tokio::test]
    async fn full_escalation_keeps_assignee_in_step() {
        let (_store, workflow, customer_id) = setup().await;

        let ticket = workflow
            .create(TicketDraft { customer_id, title: "No signal".into(), ..Default::default() })
            .await
            .unwrap();
        assert_eq!((ticket.status, ticket.assignee_role), (Received, Role::CustomerService));
        assert_eq!(ticket.ticket_type, DEFAULT_TICKET_TYPE);

        let ticket = workflow.apply(ticket.id, forward()).await.unwrap();
        assert_eq!((ticket.status, ticket.assignee_role), (ForwardedToNoc, Role::Noc));

        let ticket = workflow.apply(ticket.id, diagnose(false, true)).await.unwrap();
        assert_eq!((ticket.status, ticket.assignee_role), (ForwardedToTechnician, Role::Technician));

        let ticket = workflow.apply(ticket.id, resolve()).await.unwrap();
        assert_eq!((ticket.status, ticket.assignee_role), (Resolved, Role::CustomerService));
        assert_eq!(ticket.noc_note.as_deref(), Some("checked OLT"));
        assert_eq!(ticket.technician_note.as_deref(), Some("replaced ONT"));
    }

    #[tokio::test]
    async fn refused_transition_leaves_ticket_untouched() {
        let (_store, workflow, customer_id) = setup().await;
        let ticket = workflow
            .create(TicketDraft { customer_id, title: "No signal".into(), ..Default::default() })
            .await
            .unwrap();

        let err = workflow.apply(ticket.id, resolve()).await.unwrap_err();
        assert!(matches!(err, WorkflowError::InvalidTransition { from: Received, .. }));

        let after = workflow.get(ticket.id).await.unwrap();
        assert_eq!(after.status, Received);
        assert_eq!(after.updated_at, ticket.updated_at);
        assert_eq!(after.technician_note, None);
    }

    #[tokio::test]
    async fn create_validates_input() {
        let (_store, workflow, customer_id) = setup().await;

        let err = workflow
            .create(TicketDraft { customer_id, title: "   ".into(), ..Default::default() })
            .await
            .unwrap_err();
        assert!(matches!(err, WorkflowError::Invalid { field: "title", .. }));

        let err = workflow
            .create(TicketDraft { customer_id: 999, title: "x".into(), ..Default::default() })
            .await
            .unwrap_err();
        assert!(matches!(err, WorkflowError::Store(DatabaseError::NotFound(_))));
    }

    #[tokio::test]
    async fn unknown_ticket_is_not_found() {
        let (_store, workflow, _) = setup().await;
        assert!(matches!(workflow.apply(77, forward()).await, Err(WorkflowError::NotFound(77))));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn racing_diagnoses_commit_exactly_once() {
        for _ in 0..20 {
            let (_store, workflow, customer_id) = setup().await;
            let ticket = workflow
                .create(TicketDraft { customer_id, title: "No signal".into(), ..Default::default() })
                .await
                .unwrap();
            workflow.apply(ticket.id, forward()).await.unwrap();

            let a = tokio::spawn({
                let workflow = workflow.clone();
                async move { workflow.apply(ticket.id, diagnose(true, false)).await }
            });
            let b = tokio::spawn({
                let workflow = workflow.clone();
                async move { workflow.apply(ticket.id, diagnose(false, true)).await }
            });
            let (a, b) = (a.await.unwrap(), b.await.unwrap());

            assert_eq!(a.is_ok() as u8 + b.is_ok() as u8, 1, "exactly one diagnose must commit");
            let loser = if a.is_ok() { b } else { a };
            assert!(matches!(loser, Err(WorkflowError::InvalidTransition { .. })));

            let stored = workflow.get(ticket.id).await.unwrap();
            assert!(matches!(stored.status, Resolved | ForwardedToTechnician));
            assert_eq!(stored.assignee_role, stored.status.assignee());
        }
    }
}
