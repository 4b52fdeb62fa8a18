use async_trait::async_trait;
use sqlx::PgPool;

use crate::database::models::{
    Customer, CustomerChanges, CustomerRow, Employee, EmployeeChanges, EmployeeRow, NewCustomer, NewEmployee,
    NewTicket, Ticket, TicketMutation, TicketRow,
};
use crate::database::pagination::{Page, PageRequest};
use crate::database::store::{
    CredentialStore, CustomerStore, EmployeeStore, GeoCount, ReportStore, Store, TicketStore, TypeCount,
};
use crate::database::{DatabaseError, DatabaseManager};
use crate::types::TicketStatus;

const EMPLOYEE_COLUMNS: &str = "id, name, email, password_hash, role, status, created_at, updated_at";
const CUSTOMER_COLUMNS: &str =
    "id, name, phone, email, password_hash, address, gps_lat, gps_long, status, created_at, updated_at";
const TICKET_COLUMNS: &str = "id, customer_id, title, ticket_type, description, status, assignee_role, \
     customer_note, noc_note, technician_note, created_at, updated_at";

const UNIQUE_VIOLATION: &str = "23505";
const FOREIGN_KEY_VIOLATION: &str = "23503";

/// Translate constraint violations into store outcomes; everything else stays a driver error.
fn classify(err: sqlx::Error, foreign_key: impl FnOnce() -> DatabaseError) -> DatabaseError {
    if let sqlx::Error::Database(db) = &err {
        match db.code().as_deref() {
            Some(UNIQUE_VIOLATION) => {
                let reason = match db.constraint() {
                    Some("customers_phone_key") => "phone already registered",
                    Some("employees_email_key") | Some("customers_email_key") => "email already registered",
                    _ => "record already exists",
                };
                return DatabaseError::Conflict(reason.to_string());
            }
            Some(FOREIGN_KEY_VIOLATION) => return foreign_key(),
            _ => {}
        }
    }
    DatabaseError::Sqlx(err)
}

fn no_foreign_keys() -> DatabaseError {
    DatabaseError::QueryError("unexpected foreign key violation".into())
}

/// Postgres-backed store over a shared pool
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn ticket_page(&self, customer_id: Option<i64>, page: &PageRequest) -> Result<Page<Ticket>, DatabaseError> {
        let pattern = page.like_pattern();
        let filter = "($1::BIGINT IS NULL OR customer_id = $1) \
                      AND ($2::TEXT IS NULL OR title ILIKE $2 OR description ILIKE $2)";

        let count_sql = format!("SELECT COUNT(*) FROM trouble_tickets WHERE {}", filter);
        let rows_sql = format!(
            "SELECT {} FROM trouble_tickets WHERE {} ORDER BY created_at DESC, id DESC LIMIT $3 OFFSET $4",
            TICKET_COLUMNS, filter
        );

        let count = sqlx::query_scalar::<_, i64>(&count_sql)
            .bind(customer_id)
            .bind(pattern.as_deref())
            .fetch_one(&self.pool);
        let rows = sqlx::query_as::<_, TicketRow>(&rows_sql)
            .bind(customer_id)
            .bind(pattern.as_deref())
            .bind(page.limit)
            .bind(page.offset())
            .fetch_all(&self.pool);

        let (total, rows) = futures::try_join!(count, rows)?;
        let items = rows.into_iter().map(Ticket::try_from).collect::<Result<Vec<_>, _>>()?;
        Ok(Page::new(items, total, page))
    }
}

#[async_trait]
impl CredentialStore for PgStore {
    async fn find_employee_by_email(&self, email: &str) -> Result<Option<Employee>, DatabaseError> {
        let sql = format!("SELECT {} FROM employees WHERE email = $1", EMPLOYEE_COLUMNS);
        sqlx::query_as::<_, EmployeeRow>(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?
            .map(Employee::try_from)
            .transpose()
    }

    async fn find_customer_by_email_or_phone(&self, identifier: &str) -> Result<Option<Customer>, DatabaseError> {
        let sql = format!(
            "SELECT {} FROM customers WHERE email = $1 OR phone = $1 ORDER BY id LIMIT 1",
            CUSTOMER_COLUMNS
        );
        sqlx::query_as::<_, CustomerRow>(&sql)
            .bind(identifier)
            .fetch_optional(&self.pool)
            .await?
            .map(Customer::try_from)
            .transpose()
    }
}

#[async_trait]
impl TicketStore for PgStore {
    async fn get_ticket(&self, id: i64) -> Result<Ticket, DatabaseError> {
        let sql = format!("SELECT {} FROM trouble_tickets WHERE id = $1", TICKET_COLUMNS);
        sqlx::query_as::<_, TicketRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("ticket {} not found", id)))?
            .try_into()
    }

    async fn create_ticket(&self, ticket: NewTicket) -> Result<Ticket, DatabaseError> {
        let sql = format!(
            "INSERT INTO trouble_tickets \
               (customer_id, title, ticket_type, description, status, assignee_role, customer_note) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             RETURNING {}",
            TICKET_COLUMNS
        );
        let customer_id = ticket.customer_id;
        sqlx::query_as::<_, TicketRow>(&sql)
            .bind(ticket.customer_id)
            .bind(&ticket.title)
            .bind(&ticket.ticket_type)
            .bind(&ticket.description)
            .bind(ticket.status.as_str())
            .bind(ticket.status.assignee().as_str())
            .bind(&ticket.customer_note)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| classify(e, || DatabaseError::NotFound(format!("customer {} not found", customer_id))))?
            .try_into()
    }

    async fn update_ticket(
        &self,
        id: i64,
        expected: TicketStatus,
        mutation: TicketMutation,
    ) -> Result<Ticket, DatabaseError> {
        // Single conditional statement; the row lock serializes racing writers
        let sql = format!(
            "UPDATE trouble_tickets SET \
               status = $3, \
               assignee_role = $4, \
               customer_note = COALESCE($5, customer_note), \
               noc_note = COALESCE($6, noc_note), \
               technician_note = COALESCE($7, technician_note), \
               updated_at = NOW() \
             WHERE id = $1 AND status = $2 \
             RETURNING {}",
            TICKET_COLUMNS
        );
        let updated = sqlx::query_as::<_, TicketRow>(&sql)
            .bind(id)
            .bind(expected.as_str())
            .bind(mutation.status.as_str())
            .bind(mutation.assignee().as_str())
            .bind(&mutation.customer_note)
            .bind(&mutation.noc_note)
            .bind(&mutation.technician_note)
            .fetch_optional(&self.pool)
            .await?;

        if let Some(row) = updated {
            return row.try_into();
        }

        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM trouble_tickets WHERE id = $1)")
            .bind(id)
            .fetch_one(&self.pool)
            .await?;
        if exists {
            Err(DatabaseError::Conflict(format!("ticket {} is no longer {}", id, expected)))
        } else {
            Err(DatabaseError::NotFound(format!("ticket {} not found", id)))
        }
    }

    async fn list_tickets(&self, page: &PageRequest) -> Result<Page<Ticket>, DatabaseError> {
        self.ticket_page(None, page).await
    }

    async fn list_customer_tickets(&self, customer_id: i64, page: &PageRequest) -> Result<Page<Ticket>, DatabaseError> {
        self.ticket_page(Some(customer_id), page).await
    }
}

#[async_trait]
impl CustomerStore for PgStore {
    async fn list_customers(&self, page: &PageRequest) -> Result<Page<Customer>, DatabaseError> {
        let pattern = page.like_pattern();
        let filter = "$1::TEXT IS NULL OR name ILIKE $1 OR phone ILIKE $1 OR email ILIKE $1";

        let count_sql = format!("SELECT COUNT(*) FROM customers WHERE {}", filter);
        let rows_sql = format!(
            "SELECT {} FROM customers WHERE {} ORDER BY id LIMIT $2 OFFSET $3",
            CUSTOMER_COLUMNS, filter
        );

        let count = sqlx::query_scalar::<_, i64>(&count_sql)
            .bind(pattern.as_deref())
            .fetch_one(&self.pool);
        let rows = sqlx::query_as::<_, CustomerRow>(&rows_sql)
            .bind(pattern.as_deref())
            .bind(page.limit)
            .bind(page.offset())
            .fetch_all(&self.pool);

        let (total, rows) = futures::try_join!(count, rows)?;
        let items = rows.into_iter().map(Customer::try_from).collect::<Result<Vec<_>, _>>()?;
        Ok(Page::new(items, total, page))
    }

    async fn get_customer(&self, id: i64) -> Result<Customer, DatabaseError> {
        let sql = format!("SELECT {} FROM customers WHERE id = $1", CUSTOMER_COLUMNS);
        sqlx::query_as::<_, CustomerRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("customer {} not found", id)))?
            .try_into()
    }

    async fn create_customer(&self, customer: NewCustomer) -> Result<Customer, DatabaseError> {
        let sql = format!(
            "INSERT INTO customers \
               (name, phone, email, password_hash, address, gps_lat, gps_long, status) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
             RETURNING {}",
            CUSTOMER_COLUMNS
        );
        sqlx::query_as::<_, CustomerRow>(&sql)
            .bind(&customer.name)
            .bind(&customer.phone)
            .bind(&customer.email)
            .bind(&customer.password_hash)
            .bind(&customer.address)
            .bind(customer.gps_lat)
            .bind(customer.gps_long)
            .bind(customer.status.as_str())
            .fetch_one(&self.pool)
            .await
            .map_err(|e| classify(e, no_foreign_keys))?
            .try_into()
    }

    async fn update_customer(&self, id: i64, changes: CustomerChanges) -> Result<Customer, DatabaseError> {
        let sql = format!(
            "UPDATE customers SET \
               name = COALESCE($2, name), \
               phone = COALESCE($3, phone), \
               email = COALESCE($4, email), \
               password_hash = COALESCE($5, password_hash), \
               address = COALESCE($6, address), \
               gps_lat = COALESCE($7, gps_lat), \
               gps_long = COALESCE($8, gps_long), \
               status = COALESCE($9, status), \
               updated_at = NOW() \
             WHERE id = $1 \
             RETURNING {}",
            CUSTOMER_COLUMNS
        );
        sqlx::query_as::<_, CustomerRow>(&sql)
            .bind(id)
            .bind(&changes.name)
            .bind(&changes.phone)
            .bind(&changes.email)
            .bind(&changes.password_hash)
            .bind(&changes.address)
            .bind(changes.gps_lat)
            .bind(changes.gps_long)
            .bind(changes.status.map(|s| s.as_str()))
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| classify(e, no_foreign_keys))?
            .ok_or_else(|| DatabaseError::NotFound(format!("customer {} not found", id)))?
            .try_into()
    }

    async fn delete_customer(&self, id: i64) -> Result<(), DatabaseError> {
        let result = sqlx::query("DELETE FROM customers WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| classify(e, || DatabaseError::Conflict("customer still has tickets".into())))?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::NotFound(format!("customer {} not found", id)));
        }
        Ok(())
    }

    async fn count_customers(&self) -> Result<i64, DatabaseError> {
        Ok(sqlx::query_scalar("SELECT COUNT(*) FROM customers")
            .fetch_one(&self.pool)
            .await?)
    }
}

#[async_trait]
impl EmployeeStore for PgStore {
    async fn list_employees(&self, page: &PageRequest) -> Result<Page<Employee>, DatabaseError> {
        let pattern = page.like_pattern();
        let filter = "$1::TEXT IS NULL OR name ILIKE $1 OR email ILIKE $1";

        let count_sql = format!("SELECT COUNT(*) FROM employees WHERE {}", filter);
        let rows_sql = format!(
            "SELECT {} FROM employees WHERE {} ORDER BY id LIMIT $2 OFFSET $3",
            EMPLOYEE_COLUMNS, filter
        );

        let count = sqlx::query_scalar::<_, i64>(&count_sql)
            .bind(pattern.as_deref())
            .fetch_one(&self.pool);
        let rows = sqlx::query_as::<_, EmployeeRow>(&rows_sql)
            .bind(pattern.as_deref())
            .bind(page.limit)
            .bind(page.offset())
            .fetch_all(&self.pool);

        let (total, rows) = futures::try_join!(count, rows)?;
        let items = rows.into_iter().map(Employee::try_from).collect::<Result<Vec<_>, _>>()?;
        Ok(Page::new(items, total, page))
    }

    async fn get_employee(&self, id: i64) -> Result<Employee, DatabaseError> {
        let sql = format!("SELECT {} FROM employees WHERE id = $1", EMPLOYEE_COLUMNS);
        sqlx::query_as::<_, EmployeeRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("employee {} not found", id)))?
            .try_into()
    }

    async fn create_employee(&self, employee: NewEmployee) -> Result<Employee, DatabaseError> {
        let sql = format!(
            "INSERT INTO employees (name, email, password_hash, role, status) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING {}",
            EMPLOYEE_COLUMNS
        );
        sqlx::query_as::<_, EmployeeRow>(&sql)
            .bind(&employee.name)
            .bind(&employee.email)
            .bind(&employee.password_hash)
            .bind(employee.role.as_str())
            .bind(employee.status.as_str())
            .fetch_one(&self.pool)
            .await
            .map_err(|e| classify(e, no_foreign_keys))?
            .try_into()
    }

    async fn update_employee(&self, id: i64, changes: EmployeeChanges) -> Result<Employee, DatabaseError> {
        let sql = format!(
            "UPDATE employees SET \
               name = COALESCE($2, name), \
               email = COALESCE($3, email), \
               password_hash = COALESCE($4, password_hash), \
               role = COALESCE($5, role), \
               status = COALESCE($6, status), \
               updated_at = NOW() \
             WHERE id = $1 \
             RETURNING {}",
            EMPLOYEE_COLUMNS
        );
        sqlx::query_as::<_, EmployeeRow>(&sql)
            .bind(id)
            .bind(&changes.name)
            .bind(&changes.email)
            .bind(&changes.password_hash)
            .bind(changes.role.map(|r| r.as_str()))
            .bind(changes.status.map(|s| s.as_str()))
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| classify(e, no_foreign_keys))?
            .ok_or_else(|| DatabaseError::NotFound(format!("employee {} not found", id)))?
            .try_into()
    }

    async fn delete_employee(&self, id: i64) -> Result<(), DatabaseError> {
        let result = sqlx::query("DELETE FROM employees WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(DatabaseError::NotFound(format!("employee {} not found", id)));
        }
        Ok(())
    }

    async fn count_employees(&self) -> Result<i64, DatabaseError> {
        Ok(sqlx::query_scalar("SELECT COUNT(*) FROM employees")
            .fetch_one(&self.pool)
            .await?)
    }
}

#[async_trait]
impl ReportStore for PgStore {
    async fn status_counts(&self) -> Result<Vec<(TicketStatus, i64)>, DatabaseError> {
        let rows: Vec<(String, i64)> =
            sqlx::query_as("SELECT status, COUNT(*) FROM trouble_tickets GROUP BY status ORDER BY status")
                .fetch_all(&self.pool)
                .await?;

        rows.into_iter()
            .map(|(status, count)| Ok::<_, DatabaseError>((status.parse::<TicketStatus>()?, count)))
            .collect()
    }

    async fn trouble_type_counts(&self) -> Result<Vec<TypeCount>, DatabaseError> {
        let rows: Vec<(String, i64)> = sqlx::query_as(
            "SELECT ticket_type, COUNT(*) FROM trouble_tickets GROUP BY ticket_type ORDER BY ticket_type",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|(name, count)| TypeCount { name, count }).collect())
    }

    async fn geographic_counts(&self) -> Result<Vec<GeoCount>, DatabaseError> {
        let rows: Vec<(f64, f64, i64)> = sqlx::query_as(
            "SELECT c.gps_lat, c.gps_long, COUNT(*) AS ticket_count \
             FROM trouble_tickets t \
             JOIN customers c ON t.customer_id = c.id \
             WHERE c.gps_lat IS NOT NULL AND c.gps_long IS NOT NULL \
             GROUP BY c.gps_lat, c.gps_long \
             ORDER BY ticket_count DESC, c.gps_lat, c.gps_long",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(latitude, longitude, ticket_count)| GeoCount { latitude, longitude, ticket_count })
            .collect())
    }
}

#[async_trait]
impl Store for PgStore {
    fn backend_name(&self) -> &'static str {
        "postgres"
    }

    async fn ping(&self) -> Result<(), DatabaseError> {
        DatabaseManager::health_check(&self.pool).await
    }
}
