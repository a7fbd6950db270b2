use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum ParcelStatus {
    Booked,
    #[serde(rename = "Picked Up")]
    PickedUp,
    #[serde(rename = "In Transit")]
    InTransit,
    Delivered,
    Failed,
}

impl ParcelStatus {
    pub const ALL: [ParcelStatus; 5] = [
        ParcelStatus::Booked,
        ParcelStatus::PickedUp,
        ParcelStatus::InTransit,
        ParcelStatus::Delivered,
        ParcelStatus::Failed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ParcelStatus::Booked => "Booked",
            ParcelStatus::PickedUp => "Picked Up",
            ParcelStatus::InTransit => "In Transit",
            ParcelStatus::Delivered => "Delivered",
            ParcelStatus::Failed => "Failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, ParcelStatus::Delivered | ParcelStatus::Failed)
    }
}

impl fmt::Display for ParcelStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ParcelStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ParcelStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s.trim())
            .ok_or_else(|| {
                format!(
                    "unknown status: {s}, expected Booked/Picked Up/In Transit/Delivered/Failed"
                )
            })
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ParcelSize {
    Small,
    Medium,
    Large,
}

impl FromStr for ParcelSize {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "Small" => Ok(ParcelSize::Small),
            "Medium" => Ok(ParcelSize::Medium),
            "Large" => Ok(ParcelSize::Large),
            other => Err(format!(
                "unknown parcel size: {other}, expected Small/Medium/Large"
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum PaymentType {
    #[serde(rename = "COD")]
    Cod,
    Prepaid,
}

impl PaymentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentType::Cod => "COD",
            PaymentType::Prepaid => "Prepaid",
        }
    }
}

impl FromStr for PaymentType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "COD" => Ok(PaymentType::Cod),
            "Prepaid" => Ok(PaymentType::Prepaid),
            other => Err(format!("unknown payment type: {other}, expected COD/Prepaid")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ParcelDetails {
    #[serde(rename = "type")]
    pub kind: String,
    pub size: ParcelSize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TrackingEntry {
    pub status: ParcelStatus,
    pub location: Option<String>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Parcel {
    pub id: Uuid,
    pub customer: Uuid,
    pub pickup_address: String,
    pub delivery_address: String,
    pub parcel_details: ParcelDetails,
    pub payment_type: PaymentType,
    pub cod_amount: f64,
    pub status: ParcelStatus,
    pub delivery_agent: Option<Uuid>,
    pub tracking_history: Vec<TrackingEntry>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Bumped by the store on every successful save.
    #[serde(skip)]
    pub version: u64,
}

impl Parcel {
    /// Records a transition. Callers validate it first.
    pub fn apply_status(
        &mut self,
        status: ParcelStatus,
        location: Option<String>,
        at: DateTime<Utc>,
    ) {
        self.status = status;
        self.tracking_history.push(TrackingEntry {
            status,
            location,
            timestamp: at,
        });
        self.updated_at = at;
    }

    pub fn last_tracked_status(&self) -> Option<ParcelStatus> {
        self.tracking_history.last().map(|entry| entry.status)
    }
}

/// Raw booking input as submitted by a customer. Every field is optional so
/// that missing values surface as validation errors rather than decode
/// failures.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingRequest {
    pub pickup_address: Option<String>,
    pub delivery_address: Option<String>,
    pub parcel_details: Option<BookingDetails>,
    pub payment_type: Option<String>,
    pub cod_amount: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct BookingDetails {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub size: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_round_trips_through_display_names() {
        for status in ParcelStatus::ALL {
            assert_eq!(status.as_str().parse::<ParcelStatus>(), Ok(status));
        }
        assert!("Lost".parse::<ParcelStatus>().is_err());
        assert!("picked up".parse::<ParcelStatus>().is_err());
    }

    #[test]
    fn status_serializes_with_spaces() {
        let json = serde_json::to_string(&ParcelStatus::InTransit).unwrap();
        assert_eq!(json, "\"In Transit\"");
    }

    #[test]
    fn only_delivered_and_failed_are_terminal() {
        let terminal: Vec<_> = ParcelStatus::ALL
            .into_iter()
            .filter(ParcelStatus::is_terminal)
            .collect();
        assert_eq!(terminal, vec![ParcelStatus::Delivered, ParcelStatus::Failed]);
    }

    #[test]
    fn payment_type_uses_cod_acronym_on_the_wire() {
        assert_eq!(serde_json::to_string(&PaymentType::Cod).unwrap(), "\"COD\"");
        assert_eq!("COD".parse::<PaymentType>(), Ok(PaymentType::Cod));
    }
}
