use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::access::{authorize, Intent};
use crate::broadcast::Broadcaster;
use crate::directory::UserDirectory;
use crate::engine::transitions::TransitionPolicy;
use crate::error::AppError;
use crate::models::parcel::{
    BookingRequest, Parcel, ParcelDetails, ParcelSize, ParcelStatus, PaymentType, TrackingEntry,
};
use crate::models::user::Principal;
use crate::models::view::ParcelView;
use crate::observability::metrics::Metrics;
use crate::store::{ParcelFilter, ParcelStore, StoreError};

/// Applies bookings, assignments and status transitions to the store and
/// announces the customer-visible ones.
///
/// Every mutation is load, check, conditional save. A lost race reloads and
/// re-runs all checks, so a parcel is never assigned twice and a status
/// update never lands on a state it wasn't validated against.
pub struct LifecycleEngine {
    store: Arc<dyn ParcelStore>,
    directory: Arc<UserDirectory>,
    broadcaster: Broadcaster,
    metrics: Metrics,
    policy: TransitionPolicy,
    max_save_retries: u32,
}

impl LifecycleEngine {
    pub fn new(
        store: Arc<dyn ParcelStore>,
        directory: Arc<UserDirectory>,
        broadcaster: Broadcaster,
        metrics: Metrics,
        policy: TransitionPolicy,
        max_save_retries: u32,
    ) -> Self {
        Self {
            store,
            directory,
            broadcaster,
            metrics,
            policy,
            max_save_retries,
        }
    }

    pub fn book(&self, principal: &Principal, request: BookingRequest) -> Result<Parcel, AppError> {
        let result = authorize(Some(principal), Intent::Book, None)
            .and_then(|()| new_parcel(principal.id, request, Utc::now()))
            .and_then(|parcel| self.store.create(parcel).map_err(AppError::from));
        let parcel = self.observe("book", result)?;

        self.metrics.parcels_booked_total.inc();
        info!(parcel_id = %parcel.id, customer_id = %parcel.customer, "parcel booked");

        self.broadcaster.new_booking(&parcel);
        self.metrics
            .events_published_total
            .with_label_values(&["new_booking"])
            .inc();

        Ok(parcel)
    }

    /// Single-shot: a parcel that already has an agent is never reassigned.
    pub fn assign(
        &self,
        principal: &Principal,
        parcel_id: Uuid,
        agent_id: Uuid,
    ) -> Result<Parcel, AppError> {
        let result = authorize(Some(principal), Intent::Assign, None).and_then(|()| {
            self.mutate(parcel_id, |parcel| {
                if let Some(current) = parcel.delivery_agent {
                    return Err(AppError::InvalidState(format!(
                        "parcel {parcel_id} is already assigned to agent {current}"
                    )));
                }
                self.directory.require_agent(agent_id)?;

                parcel.delivery_agent = Some(agent_id);
                parcel.updated_at = Utc::now();
                Ok(())
            })
        });

        let outcome = if result.is_ok() { "success" } else { "rejected" };
        self.metrics
            .assignments_total
            .with_label_values(&[outcome])
            .inc();

        let parcel = self.observe("assign", result)?;
        info!(parcel_id = %parcel.id, agent_id = %agent_id, "agent assigned");
        Ok(parcel)
    }

    pub fn update_status(
        &self,
        principal: &Principal,
        parcel_id: Uuid,
        status: &str,
        location: Option<String>,
    ) -> Result<Parcel, AppError> {
        let requested = status.parse::<ParcelStatus>();
        let location = location
            .map(|location| location.trim().to_string())
            .filter(|location| !location.is_empty());

        let result = self.mutate(parcel_id, |parcel| {
            authorize(Some(principal), Intent::UpdateStatus, Some(&*parcel))?;
            let next = requested.clone().map_err(AppError::Validation)?;
            self.policy
                .check(parcel.status, next)
                .map_err(AppError::InvalidState)?;

            parcel.apply_status(next, location.clone(), Utc::now());
            Ok(())
        });
        let parcel = self.observe("update_status", result)?;

        self.metrics
            .status_updates_total
            .with_label_values(&[parcel.status.as_str()])
            .inc();
        info!(
            parcel_id = %parcel.id,
            agent_id = %principal.id,
            status = %parcel.status,
            location = location.as_deref().unwrap_or(""),
            "parcel status updated"
        );

        self.broadcaster.status_update(&parcel, location);
        self.metrics
            .events_published_total
            .with_label_values(&["status_update"])
            .inc();

        Ok(parcel)
    }

    /// Public lookup, no principal required.
    pub fn track(&self, parcel_id: Uuid) -> Result<ParcelView, AppError> {
        let parcel = self.observe("track", self.load(parcel_id))?;
        Ok(self.resolve(parcel))
    }

    pub fn history(&self, principal: &Principal) -> Result<Vec<ParcelView>, AppError> {
        authorize(Some(principal), Intent::ListOwnHistory, None)?;
        let parcels = self.store.list_by_customer(principal.id)?;
        Ok(self.resolve_all(parcels))
    }

    pub fn assigned(&self, principal: &Principal) -> Result<Vec<ParcelView>, AppError> {
        authorize(Some(principal), Intent::ListAssigned, None)?;
        let parcels = self.store.list_by_agent(principal.id)?;
        Ok(self.resolve_all(parcels))
    }

    pub fn list_all(
        &self,
        principal: &Principal,
        filter: &ParcelFilter,
    ) -> Result<Vec<ParcelView>, AppError> {
        authorize(Some(principal), Intent::ListAll, None)?;
        let parcels = self.store.list_all(filter)?;
        Ok(self.resolve_all(parcels))
    }

    /// Joins display names onto a stored parcel.
    pub fn resolve(&self, parcel: Parcel) -> ParcelView {
        let customer = self.directory.party(parcel.customer);
        let agent = parcel.delivery_agent.map(|id| self.directory.party(id));
        ParcelView::new(parcel, customer, agent)
    }

    fn resolve_all(&self, parcels: Vec<Parcel>) -> Vec<ParcelView> {
        parcels.into_iter().map(|parcel| self.resolve(parcel)).collect()
    }

    fn load(&self, parcel_id: Uuid) -> Result<Parcel, AppError> {
        self.store
            .get(parcel_id)?
            .ok_or_else(|| AppError::NotFound("Parcel not found".to_string()))
    }

    fn mutate<F>(&self, parcel_id: Uuid, mut apply: F) -> Result<Parcel, AppError>
    where
        F: FnMut(&mut Parcel) -> Result<(), AppError>,
    {
        let mut conflicts = 0;
        loop {
            let mut parcel = self.load(parcel_id)?;
            apply(&mut parcel)?;

            match self.store.save(parcel) {
                Ok(saved) => return Ok(saved),
                Err(StoreError::VersionConflict { id }) if conflicts < self.max_save_retries => {
                    conflicts += 1;
                    debug!(parcel_id = %id, conflicts, "concurrent modification; reloading");
                }
                Err(StoreError::VersionConflict { id }) => {
                    return Err(AppError::InvalidState(format!(
                        "parcel {id} is being modified concurrently, retry later"
                    )));
                }
                Err(err) => return Err(err.into()),
            }
        }
    }

    fn observe<T>(&self, operation: &str, result: Result<T, AppError>) -> Result<T, AppError> {
        if let Err(err) = &result {
            self.metrics
                .lifecycle_rejections_total
                .with_label_values(&[operation, err.kind()])
                .inc();
            warn!(operation, error = %err, "lifecycle operation rejected");
        }
        result
    }
}

/// Builds a freshly booked parcel: status Booked, one history entry at the
/// pickup address, COD amount zeroed unless the parcel is COD.
pub fn new_parcel(
    customer: Uuid,
    request: BookingRequest,
    now: DateTime<Utc>,
) -> Result<Parcel, AppError> {
    let pickup_address = required_text(request.pickup_address, "pickupAddress")?;
    let delivery_address = required_text(request.delivery_address, "deliveryAddress")?;

    let details = request
        .parcel_details
        .ok_or_else(|| AppError::Validation("parcelDetails is required".to_string()))?;
    let kind = required_text(details.kind, "parcelDetails.type")?;
    let size = details
        .size
        .ok_or_else(|| AppError::Validation("parcelDetails.size is required".to_string()))?
        .parse::<ParcelSize>()
        .map_err(AppError::Validation)?;

    let payment_type = request
        .payment_type
        .ok_or_else(|| AppError::Validation("paymentType is required".to_string()))?
        .parse::<PaymentType>()
        .map_err(AppError::Validation)?;

    let cod_amount = match payment_type {
        PaymentType::Prepaid => 0.0,
        PaymentType::Cod => {
            let amount = request.cod_amount.unwrap_or(0.0);
            if !amount.is_finite() || amount < 0.0 {
                return Err(AppError::Validation(
                    "codAmount must be a non-negative number".to_string(),
                ));
            }
            amount
        }
    };

    Ok(Parcel {
        id: Uuid::new_v4(),
        customer,
        tracking_history: vec![TrackingEntry {
            status: ParcelStatus::Booked,
            location: Some(pickup_address.clone()),
            timestamp: now,
        }],
        pickup_address,
        delivery_address,
        parcel_details: ParcelDetails { kind, size },
        payment_type,
        cod_amount,
        status: ParcelStatus::Booked,
        delivery_agent: None,
        created_at: now,
        updated_at: now,
        version: 0,
    })
}

fn required_text(value: Option<String>, field: &str) -> Result<String, AppError> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .ok_or_else(|| AppError::Validation(format!("{field} is required")))
}
