use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::{
    error::AppError,
    models::{NewTrip, SubResource, SubResourceKind, Trip, TripPatch},
};

use super::storage::TripStore;

/// Attempts per read-modify-write before a version conflict is reported.
const MAX_ATTEMPTS: usize = 3;

/// The trip aggregate: every mutation loads the current document, applies a
/// change and writes it back guarded by the stored version.
#[derive(Clone)]
pub struct TripService {
    store: Arc<dyn TripStore>,
}

impl TripService {
    pub fn new(store: Arc<dyn TripStore>) -> Self {
        Self { store }
    }

    pub async fn create(&self, owner_id: &str, new: NewTrip) -> Result<Trip, AppError> {
        let trip = Trip::create(owner_id, new)?;
        let stored = self.store.insert(&trip).await?;
        info!("created trip {} for {owner_id}", stored.id);
        Ok(stored)
    }

    pub async fn get(&self, id: &str) -> Result<Trip, AppError> {
        self.store.get(id).await?.ok_or(AppError::NotFound)
    }

    /// Trips the user owns or has been given access to, by start date.
    pub async fn list_for(&self, user_id: &str) -> Result<Vec<Trip>, AppError> {
        let mut trips: Vec<Trip> = self
            .store
            .list()
            .await?
            .into_iter()
            .filter(|trip| trip.can_view(user_id))
            .collect();
        trips.sort_by(|a, b| {
            a.start_date
                .cmp(&b.start_date)
                .then_with(|| a.name.cmp(&b.name))
        });
        Ok(trips)
    }

    pub async fn update(&self, id: &str, patch: TripPatch) -> Result<Trip, AppError> {
        self.mutate(id, |trip| trip.apply(patch.clone())).await
    }

    pub async fn append(&self, id: &str, item: SubResource) -> Result<Trip, AppError> {
        item.validate()?;
        let kind = item.kind();
        let trip = self
            .mutate(id, |trip| {
                trip.push(item.clone());
                Ok(())
            })
            .await?;
        debug!("appended to {kind} of trip {id} ({} now)", trip.len_of(kind));
        Ok(trip)
    }

    pub async fn replace(
        &self,
        id: &str,
        index: i64,
        item: SubResource,
    ) -> Result<Trip, AppError> {
        item.validate()?;
        self.mutate(id, |trip| trip.replace(index, item.clone())).await
    }

    pub async fn remove(
        &self,
        id: &str,
        kind: SubResourceKind,
        index: i64,
    ) -> Result<Trip, AppError> {
        self.mutate(id, |trip| trip.remove(kind, index).map(|_| ())).await
    }

    pub async fn delete(&self, id: &str) -> Result<bool, AppError> {
        let deleted = self.store.delete(id).await?;
        if deleted {
            info!("deleted trip {id}");
        }
        Ok(deleted)
    }

    /// Loads, changes and stores a trip, retrying when another writer got in
    /// between. A failing `change` leaves the stored trip untouched.
    pub async fn mutate<F>(&self, id: &str, mut change: F) -> Result<Trip, AppError>
    where
        F: FnMut(&mut Trip) -> Result<(), AppError> + Send,
    {
        let mut attempt = 1;
        loop {
            let mut trip = self.get(id).await?;
            let base_version = trip.version;
            change(&mut trip)?;
            trip.updated_at = Utc::now();
            match self.store.put(&trip, base_version).await {
                Err(AppError::Conflict { .. }) if attempt < MAX_ATTEMPTS => {
                    warn!("trip {id} changed underneath us, retrying (attempt {attempt})");
                    attempt += 1;
                }
                result => return result,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{models::RideLeg, services::storage::MemoryTripStore};
    use serde_json::json;

    fn service() -> TripService {
        TripService::new(Arc::new(MemoryTripStore::new()))
    }

    fn new_trip() -> NewTrip {
        NewTrip {
            name: "Kyoto".into(),
            start_date: "2025-04-01".parse().ok(),
            end_date: "2025-04-05".parse().ok(),
            ..Default::default()
        }
    }

    fn ride(pickup: &str) -> SubResource {
        SubResource::Ride(RideLeg {
            pickup: pickup.into(),
            dropoff: "KIX".into(),
            ..Default::default()
        })
    }

    #[tokio::test]
    async fn unknown_trip_is_not_found() {
        let service = service();
        assert!(matches!(service.get("missing").await, Err(AppError::NotFound)));
        assert!(matches!(
            service.append("missing", ride("a")).await,
            Err(AppError::NotFound)
        ));
        assert!(!service.delete("missing").await.unwrap());
    }

    #[tokio::test]
    async fn append_validates_required_fields() {
        let service = service();
        let trip = service.create("owner", new_trip()).await.unwrap();
        let item = SubResource::from_json(SubResourceKind::Hotels, json!({ "name": "Ryokan" }));
        let err = item.unwrap_err();
        assert!(err.to_string().contains("checkIn"));
        assert!(err.to_string().contains("checkOut"));

        let err = service
            .append(&trip.id, SubResource::Ride(RideLeg::default()))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert!(service.get(&trip.id).await.unwrap().rides.is_empty());
    }

    #[tokio::test]
    async fn bad_index_leaves_trip_unmodified() {
        let service = service();
        let trip = service.create("owner", new_trip()).await.unwrap();
        let trip = service.append(&trip.id, ride("Hotel")).await.unwrap();

        let err = service
            .remove(&trip.id, SubResourceKind::Rides, 5)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::IndexOutOfRange { len: 1, .. }));
        assert_eq!(service.get(&trip.id).await.unwrap(), trip);
    }

    #[tokio::test]
    async fn concurrent_appends_are_not_lost() {
        let service = service();
        let trip = service.create("owner", new_trip()).await.unwrap();

        let handles: Vec<_> = (0..2)
            .map(|n| {
                let service = service.clone();
                let id = trip.id.clone();
                tokio::spawn(async move {
                    service.append(&id, ride(&format!("stop {n}"))).await
                })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let stored = service.get(&trip.id).await.unwrap();
        assert_eq!(stored.rides.len(), 2);
        assert_eq!(stored.version, 2);
    }

    #[tokio::test]
    async fn lists_owned_and_shared_trips_by_start_date() {
        let service = service();
        let later = service
            .create(
                "owner",
                NewTrip {
                    name: "Later".into(),
                    start_date: "2025-08-01".parse().ok(),
                    end_date: "2025-08-02".parse().ok(),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        service.create("owner", new_trip()).await.unwrap();
        service.create("someone-else", new_trip()).await.unwrap();

        let names: Vec<_> = service
            .list_for("owner")
            .await
            .unwrap()
            .into_iter()
            .map(|t| t.name)
            .collect();
        assert_eq!(names, vec!["Kyoto", "Later"]);
        assert!(later.can_view("owner"));
        assert!(service.list_for("stranger").await.unwrap().is_empty());
    }
}
