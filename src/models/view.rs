use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::models::parcel::{Parcel, ParcelDetails, ParcelStatus, PaymentType, TrackingEntry};
use crate::models::user::PartyRef;

/// A parcel with its customer and agent references resolved for display.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParcelView {
    pub id: Uuid,
    pub customer: PartyRef,
    pub pickup_address: String,
    pub delivery_address: String,
    pub parcel_details: ParcelDetails,
    pub payment_type: PaymentType,
    pub cod_amount: f64,
    pub status: ParcelStatus,
    pub delivery_agent: Option<PartyRef>,
    pub tracking_history: Vec<TrackingEntry>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ParcelView {
    pub fn new(parcel: Parcel, customer: PartyRef, delivery_agent: Option<PartyRef>) -> Self {
        Self {
            id: parcel.id,
            customer,
            pickup_address: parcel.pickup_address,
            delivery_address: parcel.delivery_address,
            parcel_details: parcel.parcel_details,
            payment_type: parcel.payment_type,
            cod_amount: parcel.cod_amount,
            status: parcel.status,
            delivery_agent,
            tracking_history: parcel.tracking_history,
            created_at: parcel.created_at,
            updated_at: parcel.updated_at,
        }
    }
}
