use chrono::{DateTime, TimeZone, Utc};
use serde::Serialize;

use crate::error::AppError;
use crate::models::parcel::{ParcelStatus, PaymentType};
use crate::store::{ParcelFilter, ParcelStore};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardMetrics {
    pub daily_bookings: usize,
    pub failed_deliveries: usize,
    pub total_cod_amount: f64,
}

/// Computed from a full scan on every call.
///
/// `day_start` bounds `daily_bookings`; the other two figures cover the
/// parcel's whole lifetime.
pub fn dashboard(
    store: &dyn ParcelStore,
    day_start: DateTime<Utc>,
) -> Result<DashboardMetrics, AppError> {
    let parcels = store.list_all(&ParcelFilter::default())?;

    let daily_bookings = parcels
        .iter()
        .filter(|parcel| parcel.created_at >= day_start)
        .count();
    let failed_deliveries = parcels
        .iter()
        .filter(|parcel| parcel.status == ParcelStatus::Failed)
        .count();
    let total_cod_amount = parcels
        .iter()
        .filter(|parcel| {
            parcel.payment_type == PaymentType::Cod && parcel.status == ParcelStatus::Delivered
        })
        .map(|parcel| parcel.cod_amount)
        .sum::<f64>();

    Ok(DashboardMetrics {
        daily_bookings,
        failed_deliveries,
        total_cod_amount,
    })
}

/// Midnight of `now`'s calendar day in its own time zone.
pub fn local_day_start<Tz: TimeZone>(now: &DateTime<Tz>) -> DateTime<Utc> {
    now.date_naive()
        .and_hms_opt(0, 0, 0)
        .and_then(|midnight| now.timezone().from_local_datetime(&midnight).earliest())
        .map(|start| start.with_timezone(&Utc))
        .unwrap_or_else(|| now.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::{Duration, FixedOffset};
    use uuid::Uuid;

    use super::*;
    use crate::models::parcel::{Parcel, ParcelDetails, ParcelSize, TrackingEntry};
    use crate::store::InMemoryParcelStore;

    fn stored(
        store: &InMemoryParcelStore,
        payment_type: PaymentType,
        cod_amount: f64,
        status: ParcelStatus,
        created_at: DateTime<Utc>,
    ) {
        store
            .create(Parcel {
                id: Uuid::new_v4(),
                customer: Uuid::from_u128(1),
                pickup_address: "A".to_string(),
                delivery_address: "B".to_string(),
                parcel_details: ParcelDetails {
                    kind: "Document".to_string(),
                    size: ParcelSize::Small,
                },
                payment_type,
                cod_amount,
                status,
                delivery_agent: None,
                tracking_history: vec![TrackingEntry {
                    status,
                    location: None,
                    timestamp: created_at,
                }],
                created_at,
                updated_at: created_at,
                version: 0,
            })
            .unwrap();
    }

    #[test]
    fn dashboard_over_delivered_cod_and_failed_parcels() {
        let store = Arc::new(InMemoryParcelStore::new());
        let now = Utc::now();
        stored(&store, PaymentType::Cod, 50.0, ParcelStatus::Delivered, now);
        stored(&store, PaymentType::Prepaid, 0.0, ParcelStatus::Failed, now);

        let metrics = dashboard(store.as_ref(), now - Duration::hours(1)).unwrap();
        assert_eq!(
            metrics,
            DashboardMetrics {
                daily_bookings: 2,
                failed_deliveries: 1,
                total_cod_amount: 50.0,
            }
        );
    }

    #[test]
    fn cod_total_only_counts_delivered_cod_parcels() {
        let store = InMemoryParcelStore::new();
        let now = Utc::now();
        stored(&store, PaymentType::Cod, 20.0, ParcelStatus::InTransit, now);
        stored(&store, PaymentType::Cod, 30.0, ParcelStatus::Failed, now);
        stored(&store, PaymentType::Cod, 12.5, ParcelStatus::Delivered, now);
        stored(&store, PaymentType::Cod, 7.5, ParcelStatus::Delivered, now);

        let metrics = dashboard(&store, now).unwrap();
        assert_eq!(metrics.total_cod_amount, 20.0);
    }

    #[test]
    fn daily_bookings_excludes_earlier_days_but_failures_do_not() {
        let store = InMemoryParcelStore::new();
        let now = Utc::now();
        let day_start = now - Duration::hours(2);
        stored(&store, PaymentType::Prepaid, 0.0, ParcelStatus::Failed, now - Duration::days(3));
        stored(&store, PaymentType::Prepaid, 0.0, ParcelStatus::Booked, day_start);

        let metrics = dashboard(&store, day_start).unwrap();
        assert_eq!(metrics.daily_bookings, 1);
        assert_eq!(metrics.failed_deliveries, 1);
    }

    #[test]
    fn empty_store_yields_zeroes() {
        let store = InMemoryParcelStore::new();
        let metrics = dashboard(&store, Utc::now()).unwrap();
        assert_eq!(metrics.daily_bookings, 0);
        assert_eq!(metrics.total_cod_amount, 0.0);
    }

    #[test]
    fn day_start_is_local_midnight() {
        let offset = FixedOffset::east_opt(2 * 3600).unwrap();
        let now = offset.with_ymd_and_hms(2024, 5, 10, 1, 30, 0).unwrap();

        let start = local_day_start(&now);
        assert_eq!(start, Utc.with_ymd_and_hms(2024, 5, 9, 22, 0, 0).unwrap());
    }
}
