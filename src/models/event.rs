use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::parcel::{Parcel, ParcelStatus};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StatusUpdate {
    pub parcel_id: Uuid,
    pub status: ParcelStatus,
    pub location: Option<String>,
}

/// Wire shape: `{"event": "new_booking", "data": {...}}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum LifecycleEvent {
    NewBooking(Parcel),
    StatusUpdate(StatusUpdate),
}

impl LifecycleEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            LifecycleEvent::NewBooking(_) => "new_booking",
            LifecycleEvent::StatusUpdate(_) => "status_update",
        }
    }

    pub fn parcel_id(&self) -> Uuid {
        match self {
            LifecycleEvent::NewBooking(parcel) => parcel.id,
            LifecycleEvent::StatusUpdate(update) => update.parcel_id,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Topic {
    All,
    Admins,
    Parcel(Uuid),
    Customer(Uuid),
    Agent(Uuid),
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Topic::All => f.write_str("all"),
            Topic::Admins => f.write_str("admins"),
            Topic::Parcel(id) => write!(f, "parcel:{id}"),
            Topic::Customer(id) => write!(f, "customer:{id}"),
            Topic::Agent(id) => write!(f, "agent:{id}"),
        }
    }
}

impl FromStr for Topic {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        match s {
            "" | "all" => return Ok(Topic::All),
            "admins" => return Ok(Topic::Admins),
            _ => {}
        }

        let (scope, raw_id) = s
            .split_once(':')
            .ok_or_else(|| format!("unknown topic: {s}"))?;
        let id = Uuid::parse_str(raw_id).map_err(|err| format!("invalid topic id {raw_id}: {err}"))?;

        match scope {
            "parcel" => Ok(Topic::Parcel(id)),
            "customer" => Ok(Topic::Customer(id)),
            "agent" => Ok(Topic::Agent(id)),
            other => Err(format!(
                "unknown topic scope: {other}, expected parcel/customer/agent"
            )),
        }
    }
}
