use async_trait::async_trait;
use serde::Serialize;

use crate::database::models::{
    Customer, CustomerChanges, Employee, EmployeeChanges, NewCustomer, NewEmployee, NewTicket, Ticket,
    TicketMutation,
};
use crate::database::pagination::{Page, PageRequest};
use crate::database::DatabaseError;
use crate::types::TicketStatus;

/// Identity lookups used at login. Absence is `Ok(None)`, not an error.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn find_employee_by_email(&self, email: &str) -> Result<Option<Employee>, DatabaseError>;

    /// Matches either the email or the phone column.
    async fn find_customer_by_email_or_phone(&self, identifier: &str) -> Result<Option<Customer>, DatabaseError>;
}

#[async_trait]
pub trait TicketStore: Send + Sync {
    async fn get_ticket(&self, id: i64) -> Result<Ticket, DatabaseError>;

    /// Fails with `NotFound` when the customer does not exist.
    async fn create_ticket(&self, ticket: NewTicket) -> Result<Ticket, DatabaseError>;

    /// Compare-and-set on status: applies `mutation` only while the stored
    /// status still equals `expected`. `Conflict` when it moved, `NotFound`
    /// when the id is unknown.
    async fn update_ticket(
        &self,
        id: i64,
        expected: TicketStatus,
        mutation: TicketMutation,
    ) -> Result<Ticket, DatabaseError>;

    /// Newest first; search matches title or description.
    async fn list_tickets(&self, page: &PageRequest) -> Result<Page<Ticket>, DatabaseError>;

    async fn list_customer_tickets(&self, customer_id: i64, page: &PageRequest) -> Result<Page<Ticket>, DatabaseError>;
}

#[async_trait]
pub trait CustomerStore: Send + Sync {
    /// Search matches name, phone or email.
    async fn list_customers(&self, page: &PageRequest) -> Result<Page<Customer>, DatabaseError>;
    async fn get_customer(&self, id: i64) -> Result<Customer, DatabaseError>;
    async fn create_customer(&self, customer: NewCustomer) -> Result<Customer, DatabaseError>;
    async fn update_customer(&self, id: i64, changes: CustomerChanges) -> Result<Customer, DatabaseError>;
    /// `Conflict` while tickets still reference the customer.
    async fn delete_customer(&self, id: i64) -> Result<(), DatabaseError>;
    async fn count_customers(&self) -> Result<i64, DatabaseError>;
}

#[async_trait]
pub trait EmployeeStore: Send + Sync {
    /// Search matches name or email.
    async fn list_employees(&self, page: &PageRequest) -> Result<Page<Employee>, DatabaseError>;
    async fn get_employee(&self, id: i64) -> Result<Employee, DatabaseError>;
    async fn create_employee(&self, employee: NewEmployee) -> Result<Employee, DatabaseError>;
    async fn update_employee(&self, id: i64, changes: EmployeeChanges) -> Result<Employee, DatabaseError>;
    async fn delete_employee(&self, id: i64) -> Result<(), DatabaseError>;
    async fn count_employees(&self) -> Result<i64, DatabaseError>;
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TypeCount {
    pub name: String,
    pub count: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeoCount {
    pub latitude: f64,
    pub longitude: f64,
    pub ticket_count: i64,
}

#[async_trait]
pub trait ReportStore: Send + Sync {
    async fn status_counts(&self) -> Result<Vec<(TicketStatus, i64)>, DatabaseError>;

    /// Ordered by name
    async fn trouble_type_counts(&self) -> Result<Vec<TypeCount>, DatabaseError>;

    /// Tickets grouped by customer coordinates, most tickets first.
    /// Customers without coordinates are left out.
    async fn geographic_counts(&self) -> Result<Vec<GeoCount>, DatabaseError>;
}

/// Everything the HTTP layer needs from a backend
#[async_trait]
pub trait Store: CredentialStore + TicketStore + CustomerStore + EmployeeStore + ReportStore {
    fn backend_name(&self) -> &'static str;

    async fn ping(&self) -> Result<(), DatabaseError>;
}
