use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use uuid::Uuid;

use crate::models::parcel::Parcel;
use crate::store::{ParcelFilter, ParcelStore, StoreError};

/// DashMap-backed store. Each conditional save runs under the shard lock of
/// its key, which makes the version check and the write a single step.
#[derive(Default)]
pub struct InMemoryParcelStore {
    parcels: DashMap<Uuid, Parcel>,
}

impl InMemoryParcelStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ParcelStore for InMemoryParcelStore {
    fn create(&self, mut parcel: Parcel) -> Result<Parcel, StoreError> {
        match self.parcels.entry(parcel.id) {
            Entry::Occupied(_) => Err(StoreError::AlreadyExists { id: parcel.id }),
            Entry::Vacant(slot) => {
                parcel.version = 1;
                slot.insert(parcel.clone());
                Ok(parcel)
            }
        }
    }

    fn get(&self, id: Uuid) -> Result<Option<Parcel>, StoreError> {
        Ok(self.parcels.get(&id).map(|entry| entry.value().clone()))
    }

    fn list_all(&self, filter: &ParcelFilter) -> Result<Vec<Parcel>, StoreError> {
        let mut parcels: Vec<Parcel> = self
            .parcels
            .iter()
            .filter(|entry| filter.matches(entry.value()))
            .map(|entry| entry.value().clone())
            .collect();

        parcels.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(parcels)
    }

    fn save(&self, mut parcel: Parcel) -> Result<Parcel, StoreError> {
        let mut stored = self
            .parcels
            .get_mut(&parcel.id)
            .ok_or(StoreError::VersionConflict { id: parcel.id })?;

        if stored.version != parcel.version {
            return Err(StoreError::VersionConflict { id: parcel.id });
        }

        parcel.version += 1;
        *stored = parcel.clone();
        Ok(parcel)
    }

    fn len(&self) -> usize {
        self.parcels.len()
    }
}
