use std::fmt::Display;

use chrono::TimeZone;
use serde::Serialize;

use crate::directory::UserDirectory;
use crate::error::AppError;
use crate::store::{ParcelFilter, ParcelStore};

const NO_CUSTOMER: &str = "N/A";
const NO_AGENT: &str = "Unassigned";

/// One flat line of the parcels report. Field renames are the column
/// headers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportRow {
    #[serde(rename = "ID")]
    pub id: String,
    #[serde(rename = "Customer")]
    pub customer: String,
    #[serde(rename = "Agent")]
    pub agent: String,
    #[serde(rename = "Status")]
    pub status: String,
    #[serde(rename = "Payment")]
    pub payment: String,
    #[serde(rename = "Booked On")]
    pub booked_on: String,
}

impl ReportRow {
    pub const HEADERS: [&'static str; 6] =
        ["ID", "Customer", "Agent", "Status", "Payment", "Booked On"];

    pub fn cells(&self) -> [&str; 6] {
        [
            &self.id,
            &self.customer,
            &self.agent,
            &self.status,
            &self.payment,
            &self.booked_on,
        ]
    }
}

/// Every parcel, oldest first, with names joined from the directory and
/// the booking date rendered in `tz`.
pub fn report_rows<Tz>(
    store: &dyn ParcelStore,
    directory: &UserDirectory,
    tz: &Tz,
) -> Result<Vec<ReportRow>, AppError>
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let parcels = store.list_all(&ParcelFilter::default())?;

    Ok(parcels
        .into_iter()
        .map(|parcel| ReportRow {
            id: parcel.id.to_string(),
            customer: directory
                .display_name(parcel.customer)
                .unwrap_or_else(|| NO_CUSTOMER.to_string()),
            agent: parcel
                .delivery_agent
                .and_then(|agent| directory.display_name(agent))
                .unwrap_or_else(|| NO_AGENT.to_string()),
            status: parcel.status.to_string(),
            payment: parcel.payment_type.as_str().to_string(),
            booked_on: parcel
                .created_at
                .with_timezone(tz)
                .format("%Y-%m-%d")
                .to_string(),
        })
        .collect())
}

pub fn render_csv(rows: &[ReportRow]) -> Result<Vec<u8>, AppError> {
    let mut writer = csv::Writer::from_writer(Vec::new());

    if rows.is_empty() {
        writer
            .write_record(ReportRow::HEADERS)
            .map_err(|err| AppError::Internal(format!("failed to write csv header: {err}")))?;
    }
    for row in rows {
        writer
            .serialize(row)
            .map_err(|err| AppError::Internal(format!("failed to write csv row: {err}")))?;
    }

    writer
        .into_inner()
        .map_err(|err| AppError::Internal(format!("failed to flush csv report: {err}")))
}

#[cfg(test)]
mod tests {
    use chrono::{FixedOffset, Utc};
    use uuid::Uuid;

    use super::*;
    use crate::directory::RegisterUserRequest;
    use crate::models::parcel::{
        Parcel, ParcelDetails, ParcelSize, ParcelStatus, PaymentType, TrackingEntry,
    };
    use crate::store::InMemoryParcelStore;

    fn row(id: &str, customer: &str) -> ReportRow {
        ReportRow {
            id: id.to_string(),
            customer: customer.to_string(),
            agent: "Unassigned".to_string(),
            status: "Booked".to_string(),
            payment: "COD".to_string(),
            booked_on: "2024-05-10".to_string(),
        }
    }

    #[test]
    fn rows_join_names_and_fall_back_when_missing() {
        let store = InMemoryParcelStore::new();
        let directory = UserDirectory::new();
        let agent = directory
            .register(RegisterUserRequest {
                name: Some("Dan".to_string()),
                email: Some("dan@example.com".to_string()),
                role: Some("Delivery Agent".to_string()),
            })
            .unwrap()
            .user;

        let created_at = Utc.with_ymd_and_hms(2024, 5, 9, 23, 0, 0).unwrap();
        let parcel = store
            .create(Parcel {
                id: Uuid::new_v4(),
                customer: Uuid::new_v4(),
                pickup_address: "A".to_string(),
                delivery_address: "B".to_string(),
                parcel_details: ParcelDetails {
                    kind: "Box".to_string(),
                    size: ParcelSize::Large,
                },
                payment_type: PaymentType::Cod,
                cod_amount: 10.0,
                status: ParcelStatus::InTransit,
                delivery_agent: Some(agent.id),
                tracking_history: vec![TrackingEntry {
                    status: ParcelStatus::InTransit,
                    location: None,
                    timestamp: created_at,
                }],
                created_at,
                updated_at: created_at,
                version: 0,
            })
            .unwrap();

        let tz = FixedOffset::east_opt(3 * 3600).unwrap();
        let rows = report_rows(&store, &directory, &tz).unwrap();

        assert_eq!(
            rows,
            vec![ReportRow {
                id: parcel.id.to_string(),
                customer: "N/A".to_string(),
                agent: "Dan".to_string(),
                status: "In Transit".to_string(),
                payment: "COD".to_string(),
                booked_on: "2024-05-10".to_string(),
            }]
        );
    }

    #[test]
    fn csv_has_header_and_quotes_commas() {
        let bytes = render_csv(&[row("p-1", "Smith, Jane")]).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        let mut lines = text.lines();

        assert_eq!(lines.next(), Some("ID,Customer,Agent,Status,Payment,Booked On"));
        assert_eq!(
            lines.next(),
            Some("p-1,\"Smith, Jane\",Unassigned,Booked,COD,2024-05-10")
        );
        assert_eq!(lines.next(), None);
    }

    #[test]
    fn empty_report_still_has_header() {
        let text = String::from_utf8(render_csv(&[]).unwrap()).unwrap();
        assert_eq!(text, "ID,Customer,Agent,Status,Payment,Booked On\n");
    }
}
