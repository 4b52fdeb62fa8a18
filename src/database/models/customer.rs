use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

use crate::database::DatabaseError;
use crate::types::AccountStatus;

/// Customer identity. Phone and email are each unique.
#[derive(Debug, Clone, Serialize)]
pub struct Customer {
    pub id: i64,
    pub name: String,
    pub phone: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub address: Option<String>,
    pub gps_lat: Option<f64>,
    pub gps_long: Option<f64>,
    pub status: AccountStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow)]
pub struct CustomerRow {
    pub id: i64,
    pub name: String,
    pub phone: String,
    pub email: String,
    pub password_hash: String,
    pub address: Option<String>,
    pub gps_lat: Option<f64>,
    pub gps_long: Option<f64>,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<CustomerRow> for Customer {
    type Error = DatabaseError;

    fn try_from(row: CustomerRow) -> Result<Self, Self::Error> {
        Ok(Customer {
            id: row.id,
            name: row.name,
            phone: row.phone,
            email: row.email,
            password_hash: row.password_hash,
            address: row.address,
            gps_lat: row.gps_lat,
            gps_long: row.gps_long,
            status: row.status.parse()?,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, Clone)]
pub struct NewCustomer {
    pub name: String,
    pub phone: String,
    pub email: String,
    pub password_hash: String,
    pub address: Option<String>,
    pub gps_lat: Option<f64>,
    pub gps_long: Option<f64>,
    pub status: AccountStatus,
}

#[derive(Debug, Clone, Default)]
pub struct CustomerChanges {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub password_hash: Option<String>,
    pub address: Option<String>,
    pub gps_lat: Option<f64>,
    pub gps_long: Option<f64>,
    pub status: Option<AccountStatus>,
}

impl CustomerChanges {
    pub fn apply_to(self, customer: &mut Customer) {
        if let Some(name) = self.name {
            customer.name = name;
        }
        if let Some(phone) = self.phone {
            customer.phone = phone;
        }
        if let Some(email) = self.email {
            customer.email = email;
        }
        if let Some(hash) = self.password_hash {
            customer.password_hash = hash;
        }
        if self.address.is_some() {
            customer.address = self.address;
        }
        if self.gps_lat.is_some() {
            customer.gps_lat = self.gps_lat;
        }
        if self.gps_long.is_some() {
            customer.gps_long = self.gps_long;
        }
        if let Some(status) = self.status {
            customer.status = status;
        }
    }
}
