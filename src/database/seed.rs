use thiserror::Error;
use tracing::info;

use crate::auth::{PasswordError, PasswordHasher};
use crate::database::models::{NewCustomer, NewEmployee};
use crate::database::{CustomerStore, DatabaseError, EmployeeStore, Store};
use crate::types::{AccountStatus, Role};

pub const DEMO_PASSWORD: &str = "password123";

pub const DEMO_STAFF: [(&str, &str, Role); 4] = [
    ("Admin Owner", "admin@example.com", Role::Owner),
    ("Customer Service", "cs@example.com", Role::CustomerService),
    ("NOC Engineer", "noc@example.com", Role::Noc),
    ("Field Technician", "tech@example.com", Role::Technician),
];

pub const DEMO_CUSTOMERS: [(&str, &str, &str, &str, f64, f64); 2] = [
    ("Customer One", "customer1@example.com", "081234567890", "Jl. Sudirman No. 1, Jakarta", -6.2088, 106.8456),
    ("Customer Two", "customer2@example.com", "081234567891", "Jl. Tunjungan No. 2, Surabaya", -7.2575, 112.7521),
];

#[derive(Debug, Error)]
pub enum SeedError {
    #[error(transparent)]
    Password(#[from] PasswordError),

    #[error(transparent)]
    Database(#[from] DatabaseError),
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SeedReport {
    pub employees: usize,
    pub customers: usize,
}

/// Insert the demo staff and customers into empty tables.
///
/// Each table is only seeded when it has no rows. The demo password is hashed
/// once and the digest shared; a hashing failure aborts before any insert.
pub async fn seed_demo_data(store: &dyn Store, hasher: &PasswordHasher) -> Result<SeedReport, SeedError> {
    let seed_employees = store.count_employees().await? == 0;
    let seed_customers = store.count_customers().await? == 0;
    let mut report = SeedReport::default();

    if !seed_employees && !seed_customers {
        info!("Demo data already present, skipping seed");
        return Ok(report);
    }

    let digest = hasher.hash_blocking(DEMO_PASSWORD.to_string()).await?;

    if seed_employees {
        for (name, email, role) in DEMO_STAFF {
            store
                .create_employee(NewEmployee {
                    name: name.to_string(),
                    email: email.to_string(),
                    password_hash: digest.clone(),
                    role,
                    status: AccountStatus::Active,
                })
                .await?;
            report.employees += 1;
        }
    }

    if seed_customers {
        for (name, email, phone, address, lat, long) in DEMO_CUSTOMERS {
            store
                .create_customer(NewCustomer {
                    name: name.to_string(),
                    phone: phone.to_string(),
                    email: email.to_string(),
                    password_hash: digest.clone(),
                    address: Some(address.to_string()),
                    gps_lat: Some(lat),
                    gps_long: Some(long),
                    status: AccountStatus::Active,
                })
                .await?;
            report.customers += 1;
        }
    }

    info!(employees = report.employees, customers = report.customers, "Seeded demo data");
    Ok(report)
}
