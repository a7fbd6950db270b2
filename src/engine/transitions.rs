use crate::models::parcel::ParcelStatus;

/// How strictly status updates follow the lifecycle graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionPolicy {
    /// Only edges of [`allowed_next`] are accepted.
    Strict,
    /// Any recognized status is accepted, except out of a terminal status.
    Permissive,
}

/// Booked -> Picked Up -> In Transit -> {Delivered | Failed}
pub fn allowed_next(from: ParcelStatus) -> &'static [ParcelStatus] {
    match from {
        ParcelStatus::Booked => &[ParcelStatus::PickedUp],
        ParcelStatus::PickedUp => &[ParcelStatus::InTransit],
        ParcelStatus::InTransit => &[ParcelStatus::Delivered, ParcelStatus::Failed],
        ParcelStatus::Delivered | ParcelStatus::Failed => &[],
    }
}

impl TransitionPolicy {
    pub fn check(&self, from: ParcelStatus, to: ParcelStatus) -> Result<(), String> {
        if from.is_terminal() {
            return Err(format!("parcel is already {from}; no further updates allowed"));
        }

        match self {
            TransitionPolicy::Permissive => Ok(()),
            TransitionPolicy::Strict if allowed_next(from).contains(&to) => Ok(()),
            TransitionPolicy::Strict => {
                let expected: Vec<&str> =
                    allowed_next(from).iter().map(ParcelStatus::as_str).collect();
                Err(format!(
                    "cannot move parcel from {from} to {to}, expected {}",
                    expected.join(" or ")
                ))
            }
        }
    }
}
