//! Role and ownership rules for every intent the service accepts.
//!
//! The rules are pure: callers pass the principal (if any) and, for
//! parcel-scoped intents, the parcel as currently stored.

use crate::error::AppError;
use crate::models::parcel::Parcel;
use crate::models::user::{Principal, Role};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    Book,
    ListOwnHistory,
    Assign,
    ListAll,
    Metrics,
    Export,
    ListUsers,
    ListAssigned,
    UpdateStatus,
    Track,
}

impl Intent {
    fn required_role(&self) -> Option<Role> {
        match self {
            Intent::Book | Intent::ListOwnHistory => Some(Role::Customer),
            Intent::Assign
            | Intent::ListAll
            | Intent::Metrics
            | Intent::Export
            | Intent::ListUsers => Some(Role::Admin),
            Intent::ListAssigned | Intent::UpdateStatus => Some(Role::DeliveryAgent),
            Intent::Track => None,
        }
    }
}

pub fn can_perform(principal: Option<&Principal>, intent: Intent, target: Option<&Parcel>) -> bool {
    authorize(principal, intent, target).is_ok()
}

/// Like [`can_perform`], but says which rule failed.
pub fn authorize(
    principal: Option<&Principal>,
    intent: Intent,
    target: Option<&Parcel>,
) -> Result<(), AppError> {
    let Some(required) = intent.required_role() else {
        return Ok(());
    };

    let principal = principal
        .ok_or_else(|| AppError::Unauthenticated("authentication required".to_string()))?;

    if principal.role != required {
        return Err(AppError::Forbidden(format!(
            "role {} is not allowed to perform this action, requires {}",
            principal.role, required
        )));
    }

    match (intent, target) {
        (Intent::UpdateStatus, Some(parcel)) if parcel.delivery_agent != Some(principal.id) => {
            Err(AppError::Forbidden(
                "not authorized to update this parcel".to_string(),
            ))
        }
        (Intent::UpdateStatus, None) => Err(AppError::Forbidden(
            "status updates require a target parcel".to_string(),
        )),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use uuid::Uuid;

    use super::*;
    use crate::models::parcel::{
        ParcelDetails, ParcelSize, ParcelStatus, PaymentType, TrackingEntry,
    };

    fn principal(role: Role, seed: u128) -> Principal {
        Principal::new(Uuid::from_u128(seed), role, "someone")
    }

    fn parcel_with_agent(agent: Option<u128>) -> Parcel {
        let now = Utc::now();
        Parcel {
            id: Uuid::new_v4(),
            customer: Uuid::from_u128(1),
            pickup_address: "A".to_string(),
            delivery_address: "B".to_string(),
            parcel_details: ParcelDetails {
                kind: "Box".to_string(),
                size: ParcelSize::Medium,
            },
            payment_type: PaymentType::Prepaid,
            cod_amount: 0.0,
            status: ParcelStatus::Booked,
            delivery_agent: agent.map(Uuid::from_u128),
            tracking_history: vec![TrackingEntry {
                status: ParcelStatus::Booked,
                location: Some("A".to_string()),
                timestamp: now,
            }],
            created_at: now,
            updated_at: now,
            version: 1,
        }
    }

    #[test]
    fn each_intent_requires_its_role() {
        let customer = principal(Role::Customer, 1);
        let agent = principal(Role::DeliveryAgent, 2);
        let admin = principal(Role::Admin, 3);

        assert!(can_perform(Some(&customer), Intent::Book, None));
        assert!(!can_perform(Some(&admin), Intent::Book, None));
        assert!(can_perform(Some(&customer), Intent::ListOwnHistory, None));

        for intent in [Intent::Assign, Intent::ListAll, Intent::Metrics, Intent::Export] {
            assert!(can_perform(Some(&admin), intent, None));
            assert!(!can_perform(Some(&customer), intent, None));
            assert!(!can_perform(Some(&agent), intent, None));
        }

        assert!(can_perform(Some(&agent), Intent::ListAssigned, None));
        assert!(!can_perform(Some(&admin), Intent::ListAssigned, None));
    }

    #[test]
    fn track_is_public() {
        assert!(can_perform(None, Intent::Track, None));
    }

    #[test]
    fn missing_principal_is_unauthenticated() {
        assert!(matches!(
            authorize(None, Intent::Book, None),
            Err(AppError::Unauthenticated(_))
        ));
    }

    #[test]
    fn role_mismatch_is_forbidden() {
        let admin = principal(Role::Admin, 3);
        assert!(matches!(
            authorize(Some(&admin), Intent::UpdateStatus, None),
            Err(AppError::Forbidden(_))
        ));
    }

    #[test]
    fn update_status_requires_assigned_agent() {
        let agent = principal(Role::DeliveryAgent, 2);
        let other_agent = principal(Role::DeliveryAgent, 9);

        let assigned = parcel_with_agent(Some(2));
        let unassigned = parcel_with_agent(None);

        assert!(can_perform(Some(&agent), Intent::UpdateStatus, Some(&assigned)));
        assert!(!can_perform(Some(&other_agent), Intent::UpdateStatus, Some(&assigned)));
        assert!(!can_perform(Some(&agent), Intent::UpdateStatus, Some(&unassigned)));
        assert!(!can_perform(Some(&agent), Intent::UpdateStatus, None));
    }
}
