pub mod auth;
pub mod reports;
pub mod workflow;

pub use auth::{LoginError, LoginResponse, LoginService};
pub use workflow::{TicketAction, TicketDraft, TicketWorkflow, WorkflowError};
