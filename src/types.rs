/// Shared types used across the codebase

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Error raised when a role or status string is not one of the known literals
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind} '{value}'")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

/// Staff roles. Closed set; parsed once at the boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Owner,
    CustomerService,
    Noc,
    Technician,
}

impl Role {
    pub const ALL: [Role; 4] = [Role::Owner, Role::CustomerService, Role::Noc, Role::Technician];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Owner => "owner",
            Role::CustomerService => "customer_service",
            Role::Noc => "noc",
            Role::Technician => "technician",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Role::Owner => "Owner",
            Role::CustomerService => "Customer Service",
            Role::Noc => "Network Operations Center",
            Role::Technician => "Field Technician",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "owner" => Ok(Role::Owner),
            "customer_service" => Ok(Role::CustomerService),
            "noc" => Ok(Role::Noc),
            "technician" => Ok(Role::Technician),
            other => Err(UnknownVariant { kind: "role", value: other.to_string() }),
        }
    }
}

/// Trouble ticket lifecycle states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TicketStatus {
    Received,
    ForwardedToNoc,
    ForwardedToTechnician,
    Diagnosed,
    Resolved,
}

impl TicketStatus {
    pub const ALL: [TicketStatus; 5] = [
        TicketStatus::Received,
        TicketStatus::ForwardedToNoc,
        TicketStatus::ForwardedToTechnician,
        TicketStatus::Diagnosed,
        TicketStatus::Resolved,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TicketStatus::Received => "received",
            TicketStatus::ForwardedToNoc => "forwarded_to_noc",
            TicketStatus::ForwardedToTechnician => "forwarded_to_technician",
            TicketStatus::Diagnosed => "diagnosed",
            TicketStatus::Resolved => "resolved",
        }
    }

    /// The role that must act next on a ticket in this status.
    /// This is the only source of a ticket's assignee role.
    pub fn assignee(&self) -> Role {
        match self {
            TicketStatus::Received => Role::CustomerService,
            TicketStatus::ForwardedToNoc => Role::Noc,
            TicketStatus::ForwardedToTechnician => Role::Technician,
            TicketStatus::Diagnosed => Role::CustomerService,
            TicketStatus::Resolved => Role::CustomerService,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, TicketStatus::Resolved)
    }
}

impl fmt::Display for TicketStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TicketStatus {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TicketStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| UnknownVariant { kind: "ticket status", value: s.to_string() })
    }
}

/// Login eligibility of a staff or customer identity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountStatus {
    #[default]
    Active,
    Inactive,
}

impl AccountStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountStatus::Active => "active",
            AccountStatus::Inactive => "inactive",
        }
    }
}

impl FromStr for AccountStatus {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(AccountStatus::Active),
            "inactive" => Ok(AccountStatus::Inactive),
            other => Err(UnknownVariant { kind: "account status", value: other.to_string() }),
        }
    }
}

/// Who a bearer token speaks for: a staff member holding a role, or a customer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Principal {
    Staff(Role),
    Customer,
}

impl Principal {
    pub const CUSTOMER: &'static str = "customer";

    pub fn role(&self) -> Option<Role> {
        match self {
            Principal::Staff(role) => Some(*role),
            Principal::Customer => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Principal::Staff(role) => role.as_str(),
            Principal::Customer => Self::CUSTOMER,
        }
    }

    pub fn is_customer(&self) -> bool {
        matches!(self, Principal::Customer)
    }
}

impl fmt::Display for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Principal {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == Self::CUSTOMER {
            return Ok(Principal::Customer);
        }
        s.parse::<Role>()
            .map(Principal::Staff)
            .map_err(|_| UnknownVariant { kind: "principal", value: s.to_string() })
    }
}

// Principals travel as a single string claim ("noc", "customer", ...)
impl Serialize for Principal {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Principal {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}
