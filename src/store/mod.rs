pub mod memory;

use thiserror::Error;
use uuid::Uuid;

use crate::models::parcel::{Parcel, ParcelStatus};

pub use memory::InMemoryParcelStore;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("parcel store unavailable: {0}")]
    Unavailable(String),

    #[error("parcel {id} was modified concurrently")]
    VersionConflict { id: Uuid },

    #[error("parcel {id} already exists")]
    AlreadyExists { id: Uuid },
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParcelFilter {
    pub status: Option<ParcelStatus>,
    pub customer: Option<Uuid>,
    pub agent: Option<Uuid>,
}

impl ParcelFilter {
    pub fn matches(&self, parcel: &Parcel) -> bool {
        self.status.is_none_or(|status| parcel.status == status)
            && self.customer.is_none_or(|customer| parcel.customer == customer)
            && self.agent.is_none_or(|agent| parcel.delivery_agent == Some(agent))
    }
}

/// Persistent parcel records. Implementations hold references only; name
/// resolution happens at read time in the caller.
///
/// `save` is conditional: it succeeds only when the stored record still has
/// the `version` carried by the argument, and returns the record with its
/// version bumped. Callers that lose the race get
/// [`StoreError::VersionConflict`] and must reload.
pub trait ParcelStore: Send + Sync {
    fn create(&self, parcel: Parcel) -> Result<Parcel, StoreError>;

    fn get(&self, id: Uuid) -> Result<Option<Parcel>, StoreError>;

    fn list_by_customer(&self, customer: Uuid) -> Result<Vec<Parcel>, StoreError> {
        self.list_all(&ParcelFilter {
            customer: Some(customer),
            ..ParcelFilter::default()
        })
    }

    fn list_by_agent(&self, agent: Uuid) -> Result<Vec<Parcel>, StoreError> {
        self.list_all(&ParcelFilter {
            agent: Some(agent),
            ..ParcelFilter::default()
        })
    }

    /// Matching parcels, oldest booking first.
    fn list_all(&self, filter: &ParcelFilter) -> Result<Vec<Parcel>, StoreError>;

    fn save(&self, parcel: Parcel) -> Result<Parcel, StoreError>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
