use async_trait::async_trait;
use chrono::Utc;
use std::collections::BTreeMap;
use tokio::sync::RwLock;

use crate::database::models::{
    Customer, CustomerChanges, Employee, EmployeeChanges, NewCustomer, NewEmployee, NewTicket, Ticket,
    TicketMutation,
};
use crate::database::pagination::{Page, PageRequest};
use crate::database::store::{
    CredentialStore, CustomerStore, EmployeeStore, GeoCount, ReportStore, Store, TicketStore, TypeCount,
};
use crate::database::DatabaseError;
use crate::types::TicketStatus;

#[derive(Debug, Default)]
struct Tables {
    employees: BTreeMap<i64, Employee>,
    customers: BTreeMap<i64, Customer>,
    tickets: BTreeMap<i64, Ticket>,
    employee_seq: i64,
    customer_seq: i64,
    ticket_seq: i64,
}

fn next_id(seq: &mut i64) -> i64 {
    *seq += 1;
    *seq
}

impl Tables {
    fn check_employee_email(&self, email: &str, except: Option<i64>) -> Result<(), DatabaseError> {
        let taken = self
            .employees
            .values()
            .any(|e| e.email == email && Some(e.id) != except);
        if taken {
            return Err(DatabaseError::Conflict("email already registered".into()));
        }
        Ok(())
    }

    fn check_customer_contact(&self, email: &str, phone: &str, except: Option<i64>) -> Result<(), DatabaseError> {
        for customer in self.customers.values().filter(|c| Some(c.id) != except) {
            if customer.email == email {
                return Err(DatabaseError::Conflict("email already registered".into()));
            }
            if customer.phone == phone {
                return Err(DatabaseError::Conflict("phone already registered".into()));
            }
        }
        Ok(())
    }

    fn tickets_newest_first(&self, filter: impl Fn(&Ticket) -> bool) -> Vec<Ticket> {
        self.tickets.values().rev().filter(|t| filter(*t)).cloned().collect()
    }
}

/// Process-local store behind a single `RwLock`.
///
/// Every write runs under the write guard, so the compare-and-set in
/// `update_ticket` is atomic with respect to other writers.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CredentialStore for MemoryStore {
    async fn find_employee_by_email(&self, email: &str) -> Result<Option<Employee>, DatabaseError> {
        let tables = self.tables.read().await;
        Ok(tables.employees.values().find(|e| e.email == email).cloned())
    }

    async fn find_customer_by_email_or_phone(&self, identifier: &str) -> Result<Option<Customer>, DatabaseError> {
        let tables = self.tables.read().await;
        Ok(tables
            .customers
            .values()
            .find(|c| c.email == identifier || c.phone == identifier)
            .cloned())
    }
}

#[async_trait]
impl TicketStore for MemoryStore {
    async fn get_ticket(&self, id: i64) -> Result<Ticket, DatabaseError> {
        let tables = self.tables.read().await;
        tables
            .tickets
            .get(&id)
            .cloned()
            .ok_or_else(|| DatabaseError::NotFound(format!("ticket {} not found", id)))
    }

    async fn create_ticket(&self, ticket: NewTicket) -> Result<Ticket, DatabaseError> {
        let mut tables = self.tables.write().await;
        if !tables.customers.contains_key(&ticket.customer_id) {
            return Err(DatabaseError::NotFound(format!("customer {} not found", ticket.customer_id)));
        }

        let now = Utc::now();
        let id = next_id(&mut tables.ticket_seq);
        let created = Ticket {
            id,
            customer_id: ticket.customer_id,
            title: ticket.title,
            ticket_type: ticket.ticket_type,
            description: ticket.description,
            status: ticket.status,
            assignee_role: ticket.status.assignee(),
            customer_note: ticket.customer_note,
            noc_note: None,
            technician_note: None,
            created_at: now,
            updated_at: now,
        };
        tables.tickets.insert(id, created.clone());
        Ok(created)
    }

    async fn update_ticket(
        &self,
        id: i64,
        expected: TicketStatus,
        mutation: TicketMutation,
    ) -> Result<Ticket, DatabaseError> {
        let mut tables = self.tables.write().await;
        let ticket = tables
            .tickets
            .get_mut(&id)
            .ok_or_else(|| DatabaseError::NotFound(format!("ticket {} not found", id)))?;

        if ticket.status != expected {
            return Err(DatabaseError::Conflict(format!(
                "ticket {} is {}, expected {}",
                id, ticket.status, expected
            )));
        }

        mutation.apply_to(ticket, Utc::now());
        Ok(ticket.clone())
    }

    async fn list_tickets(&self, page: &PageRequest) -> Result<Page<Ticket>, DatabaseError> {
        let tables = self.tables.read().await;
        let rows = tables.tickets_newest_first(|t| page.matches(&[t.title.as_str(), t.description.as_str()]));
        Ok(Page::from_sorted(rows, page))
    }

    async fn list_customer_tickets(&self, customer_id: i64, page: &PageRequest) -> Result<Page<Ticket>, DatabaseError> {
        let tables = self.tables.read().await;
        let rows = tables.tickets_newest_first(|t| {
            t.customer_id == customer_id && page.matches(&[t.title.as_str(), t.description.as_str()])
        });
        Ok(Page::from_sorted(rows, page))
    }
}

#[async_trait]
impl CustomerStore for MemoryStore {
    async fn list_customers(&self, page: &PageRequest) -> Result<Page<Customer>, DatabaseError> {
        let tables = self.tables.read().await;
        let rows: Vec<Customer> = tables
            .customers
            .values()
            .filter(|c| page.matches(&[c.name.as_str(), c.phone.as_str(), c.email.as_str()]))
            .cloned()
            .collect();
        Ok(Page::from_sorted(rows, page))
    }

    async fn get_customer(&self, id: i64) -> Result<Customer, DatabaseError> {
        let tables = self.tables.read().await;
        tables
            .customers
            .get(&id)
            .cloned()
            .ok_or_else(|| DatabaseError::NotFound(format!("customer {} not found", id)))
    }

    async fn create_customer(&self, customer: NewCustomer) -> Result<Customer, DatabaseError> {
        let mut tables = self.tables.write().await;
        tables.check_customer_contact(&customer.email, &customer.phone, None)?;

        let now = Utc::now();
        let id = next_id(&mut tables.customer_seq);
        let created = Customer {
            id,
            name: customer.name,
            phone: customer.phone,
            email: customer.email,
            password_hash: customer.password_hash,
            address: customer.address,
            gps_lat: customer.gps_lat,
            gps_long: customer.gps_long,
            status: customer.status,
            created_at: now,
            updated_at: now,
        };
        tables.customers.insert(id, created.clone());
        Ok(created)
    }

    async fn update_customer(&self, id: i64, changes: CustomerChanges) -> Result<Customer, DatabaseError> {
        let mut tables = self.tables.write().await;
        let mut updated = tables
            .customers
            .get(&id)
            .cloned()
            .ok_or_else(|| DatabaseError::NotFound(format!("customer {} not found", id)))?;

        changes.apply_to(&mut updated);
        tables.check_customer_contact(&updated.email, &updated.phone, Some(id))?;
        updated.updated_at = Utc::now();
        tables.customers.insert(id, updated.clone());
        Ok(updated)
    }

    async fn delete_customer(&self, id: i64) -> Result<(), DatabaseError> {
        let mut tables = self.tables.write().await;
        if !tables.customers.contains_key(&id) {
            return Err(DatabaseError::NotFound(format!("customer {} not found", id)));
        }
        if tables.tickets.values().any(|t| t.customer_id == id) {
            return Err(DatabaseError::Conflict("customer still has tickets".into()));
        }
        tables.customers.remove(&id);
        Ok(())
    }

    async fn count_customers(&self) -> Result<i64, DatabaseError> {
        Ok(self.tables.read().await.customers.len() as i64)
    }
}

#[async_trait]
impl EmployeeStore for MemoryStore {
    async fn list_employees(&self, page: &PageRequest) -> Result<Page<Employee>, DatabaseError> {
        let tables = self.tables.read().await;
        let rows: Vec<Employee> = tables
            .employees
            .values()
            .filter(|e| page.matches(&[e.name.as_str(), e.email.as_str()]))
            .cloned()
            .collect();
        Ok(Page::from_sorted(rows, page))
    }

    async fn get_employee(&self, id: i64) -> Result<Employee, DatabaseError> {
        let tables = self.tables.read().await;
        tables
            .employees
            .get(&id)
            .cloned()
            .ok_or_else(|| DatabaseError::NotFound(format!("employee {} not found", id)))
    }

    async fn create_employee(&self, employee: NewEmployee) -> Result<Employee, DatabaseError> {
        let mut tables = self.tables.write().await;
        tables.check_employee_email(&employee.email, None)?;

        let now = Utc::now();
        let id = next_id(&mut tables.employee_seq);
        let created = Employee {
            id,
            name: employee.name,
            email: employee.email,
            password_hash: employee.password_hash,
            role: employee.role,
            status: employee.status,
            created_at: now,
            updated_at: now,
        };
        tables.employees.insert(id, created.clone());
        Ok(created)
    }

    async fn update_employee(&self, id: i64, changes: EmployeeChanges) -> Result<Employee, DatabaseError> {
        let mut tables = self.tables.write().await;
        let mut updated = tables
            .employees
            .get(&id)
            .cloned()
            .ok_or_else(|| DatabaseError::NotFound(format!("employee {} not found", id)))?;

        changes.apply_to(&mut updated);
        tables.check_employee_email(&updated.email, Some(id))?;
        updated.updated_at = Utc::now();
        tables.employees.insert(id, updated.clone());
        Ok(updated)
    }

    async fn delete_employee(&self, id: i64) -> Result<(), DatabaseError> {
        let mut tables = self.tables.write().await;
        tables
            .employees
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| DatabaseError::NotFound(format!("employee {} not found", id)))
    }

    async fn count_employees(&self) -> Result<i64, DatabaseError> {
        Ok(self.tables.read().await.employees.len() as i64)
    }
}

#[async_trait]
impl ReportStore for MemoryStore {
    async fn status_counts(&self) -> Result<Vec<(TicketStatus, i64)>, DatabaseError> {
        let tables = self.tables.read().await;
        Ok(TicketStatus::ALL
            .into_iter()
            .map(|status| {
                let count = tables.tickets.values().filter(|t| t.status == status).count() as i64;
                (status, count)
            })
            .filter(|(_, count)| *count > 0)
            .collect())
    }

    async fn trouble_type_counts(&self) -> Result<Vec<TypeCount>, DatabaseError> {
        let tables = self.tables.read().await;
        let mut counts: BTreeMap<&str, i64> = BTreeMap::new();
        for ticket in tables.tickets.values() {
            *counts.entry(ticket.ticket_type.as_str()).or_default() += 1;
        }
        Ok(counts
            .into_iter()
            .map(|(name, count)| TypeCount { name: name.to_string(), count })
            .collect())
    }

    async fn geographic_counts(&self) -> Result<Vec<GeoCount>, DatabaseError> {
        let tables = self.tables.read().await;
        let mut groups: Vec<GeoCount> = Vec::new();

        for ticket in tables.tickets.values() {
            let Some(customer) = tables.customers.get(&ticket.customer_id) else {
                continue;
            };
            let (Some(latitude), Some(longitude)) = (customer.gps_lat, customer.gps_long) else {
                continue;
            };
            match groups
                .iter_mut()
                .find(|g| g.latitude == latitude && g.longitude == longitude)
            {
                Some(group) => group.ticket_count += 1,
                None => groups.push(GeoCount { latitude, longitude, ticket_count: 1 }),
            }
        }

        groups.sort_by(|a, b| {
            b.ticket_count
                .cmp(&a.ticket_count)
                .then(a.latitude.total_cmp(&b.latitude))
                .then(a.longitude.total_cmp(&b.longitude))
        });
        Ok(groups)
    }
}

#[async_trait]
impl Store for MemoryStore {
    fn backend_name(&self) -> &'static str {
        "memory"
    }

    async fn ping(&self) -> Result<(), DatabaseError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AccountStatus, Role};

    fn customer(email: &str, phone: &str) -> NewCustomer {
        NewCustomer {
            name: "Budi".into(),
            phone: phone.into(),
            email: email.into(),
            password_hash: "x".into(),
            address: None,
            gps_lat: Some(-6.2),
            gps_long: Some(106.8),
            status: AccountStatus::Active,
        }
    }

    fn ticket(customer_id: i64, title: &str) -> NewTicket {
        NewTicket {
            customer_id,
            title: title.into(),
            ticket_type: "connection".into(),
            description: String::new(),
            status: TicketStatus::Received,
            customer_note: None,
        }
    }

    #[tokio::test]
    async fn customer_email_and_phone_are_unique() {
        let store = MemoryStore::new();
        store.create_customer(customer("a@example.com", "0811")).await.unwrap();

        let err = store.create_customer(customer("a@example.com", "0822")).await.unwrap_err();
        assert!(matches!(err, DatabaseError::Conflict(msg) if msg.contains("email")));

        let err = store.create_customer(customer("b@example.com", "0811")).await.unwrap_err();
        assert!(matches!(err, DatabaseError::Conflict(msg) if msg.contains("phone")));
    }

    #[tokio::test]
    async fn employee_email_is_unique_on_update() {
        let store = MemoryStore::new();
        let new = |email: &str| NewEmployee {
            name: "Staff".into(),
            email: email.into(),
            password_hash: "x".into(),
            role: Role::Noc,
            status: AccountStatus::Active,
        };
        store.create_employee(new("noc@example.com")).await.unwrap();
        let other = store.create_employee(new("noc2@example.com")).await.unwrap();

        let changes = EmployeeChanges { email: Some("noc@example.com".into()), ..Default::default() };
        assert!(matches!(
            store.update_employee(other.id, changes).await,
            Err(DatabaseError::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn update_is_compare_and_set() {
        let store = MemoryStore::new();
        let c = store.create_customer(customer("a@example.com", "0811")).await.unwrap();
        let t = store.create_ticket(ticket(c.id, "No signal")).await.unwrap();

        let forwarded = store
            .update_ticket(t.id, TicketStatus::Received, TicketMutation::to(TicketStatus::ForwardedToNoc))
            .await
            .unwrap();
        assert_eq!(forwarded.assignee_role, Role::Noc);

        let stale = store
            .update_ticket(t.id, TicketStatus::Received, TicketMutation::to(TicketStatus::ForwardedToNoc))
            .await;
        assert!(matches!(stale, Err(DatabaseError::Conflict(_))));

        let missing = store
            .update_ticket(999, TicketStatus::Received, TicketMutation::to(TicketStatus::ForwardedToNoc))
            .await;
        assert!(matches!(missing, Err(DatabaseError::NotFound(_))));
    }

    #[tokio::test]
    async fn ticket_requires_existing_customer_and_blocks_delete() {
        let store = MemoryStore::new();
        assert!(matches!(store.create_ticket(ticket(42, "x")).await, Err(DatabaseError::NotFound(_))));

        let c = store.create_customer(customer("a@example.com", "0811")).await.unwrap();
        store.create_ticket(ticket(c.id, "x")).await.unwrap();
        assert!(matches!(store.delete_customer(c.id).await, Err(DatabaseError::Conflict(_))));
    }

    #[tokio::test]
    async fn tickets_list_newest_first_with_search() {
        let store = MemoryStore::new();
        let c = store.create_customer(customer("a@example.com", "0811")).await.unwrap();
        for title in ["No signal", "Billing question", "Slow signal"] {
            store.create_ticket(ticket(c.id, title)).await.unwrap();
        }

        let page = store.list_tickets(&PageRequest::new(1, 10).with_search("signal")).await.unwrap();
        let titles: Vec<_> = page.items.iter().map(|t| t.title.as_str()).collect();
        assert_eq!(titles, vec!["Slow signal", "No signal"]);
        assert_eq!(page.total, 2);
    }

    #[tokio::test]
    async fn geographic_groups_by_coordinates() {
        let store = MemoryStore::new();
        let a = store.create_customer(customer("a@example.com", "0811")).await.unwrap();
        let mut far = customer("b@example.com", "0822");
        far.gps_lat = Some(-7.25);
        far.gps_long = Some(112.75);
        let b = store.create_customer(far).await.unwrap();
        let mut nowhere = customer("c@example.com", "0833");
        nowhere.gps_lat = None;
        let c = store.create_customer(nowhere).await.unwrap();

        for id in [a.id, b.id, b.id, c.id] {
            store.create_ticket(ticket(id, "x")).await.unwrap();
        }

        let groups = store.geographic_counts().await.unwrap();
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].ticket_count, 2);
        assert_eq!(groups[0].latitude, -7.25);
    }
}
