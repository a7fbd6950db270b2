use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Role {
    Customer,
    #[serde(rename = "Delivery Agent")]
    DeliveryAgent,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Customer => "Customer",
            Role::DeliveryAgent => "Delivery Agent",
            Role::Admin => "Admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "Customer" => Ok(Role::Customer),
            "Delivery Agent" => Ok(Role::DeliveryAgent),
            "Admin" => Ok(Role::Admin),
            other => Err(format!(
                "unknown role: {other}, expected Customer/Delivery Agent/Admin"
            )),
        }
    }
}

/// A directory identity. The bearer token is held by the directory's token
/// index and never serialized with the record.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

/// The authenticated caller of an operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub id: Uuid,
    pub role: Role,
    pub name: String,
}

impl Principal {
    pub fn new(id: Uuid, role: Role, name: impl Into<String>) -> Self {
        Self {
            id,
            role,
            name: name.into(),
        }
    }
}

impl From<&User> for Principal {
    fn from(user: &User) -> Self {
        Self::new(user.id, user.role, user.name.clone())
    }
}

/// Display projection of a user joined onto a parcel. Only the id and name
/// leave the directory; contact details stay behind the admin user listing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PartyRef {
    pub id: Uuid,
    pub name: String,
}

impl From<&User> for PartyRef {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
        }
    }
}
