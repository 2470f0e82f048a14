use chrono::Utc;
use tracing::info;

use crate::{
    error::AppError,
    models::{Checklist, SharedUser, Trip, UserChecklist},
};

use super::{
    trips::TripService,
    users::{normalize_email, UserDirectory},
};

/// The checklist a viewer sees: their own copy if they have one, otherwise
/// the trip default. The two are never merged.
pub fn checklist_for<'a>(trip: &'a Trip, viewer_id: &str) -> &'a Checklist {
    trip.user_checklists
        .get(viewer_id)
        .map(|personal| &personal.checklist)
        .unwrap_or(&trip.checklist)
}

/// The viewer's personal checklist, copied from the trip default on first use.
fn personal_checklist<'a>(trip: &'a mut Trip, viewer_id: &str) -> &'a mut UserChecklist {
    let default = trip.checklist.clone();
    let entry = trip
        .user_checklists
        .entry(viewer_id.to_string())
        .or_insert_with(|| UserChecklist {
            user_id: viewer_id.to_string(),
            checklist: default,
            updated_at: Utc::now(),
        });
    entry.updated_at = Utc::now();
    entry
}

/// Read access grants plus the per-viewer checklist overlay.
#[derive(Clone)]
pub struct SharingService {
    trips: TripService,
    users: UserDirectory,
}

impl SharingService {
    pub fn new(trips: TripService, users: UserDirectory) -> Self {
        Self { trips, users }
    }

    /// Grants read access to every address. Unknown addresses get a fresh
    /// identity; viewers already on the list and the owner are skipped.
    pub async fn share(
        &self,
        trip_id: &str,
        emails: &[String],
    ) -> Result<Vec<SharedUser>, AppError> {
        if emails.is_empty() {
            return Err(AppError::validation("at least one email address is required"));
        }
        let emails = emails
            .iter()
            .map(|raw| normalize_email(raw))
            .collect::<Result<Vec<_>, _>>()?;

        // Make sure the trip exists before creating identities for it.
        self.trips.get(trip_id).await?;

        let mut grants = Vec::with_capacity(emails.len());
        for email in &emails {
            let user = self.users.resolve_or_create(email).await?;
            grants.push(SharedUser {
                user_id: user.uuid,
                email: user.email,
                display_name: user.display_name,
                shared_at: Utc::now(),
            });
        }

        let trip = self
            .trips
            .mutate(trip_id, |trip| {
                for grant in &grants {
                    let known = trip.is_owner(&grant.user_id)
                        || trip.shared_user(&grant.user_id).is_some();
                    if !known {
                        trip.shared_with.push(grant.clone());
                    }
                }
                Ok(())
            })
            .await?;
        info!(
            "trip {trip_id} now shared with {} viewer(s)",
            trip.shared_with.len()
        );
        Ok(trip.shared_with)
    }

    /// Removes a viewer's access. Unknown viewers are ignored, and the
    /// viewer's personal checklist is kept.
    pub async fn revoke(
        &self,
        trip_id: &str,
        viewer_id: &str,
    ) -> Result<Vec<SharedUser>, AppError> {
        let trip = self
            .trips
            .mutate(trip_id, |trip| {
                trip.shared_with.retain(|shared| shared.user_id != viewer_id);
                Ok(())
            })
            .await?;
        info!("revoked {viewer_id} from trip {trip_id}");
        Ok(trip.shared_with)
    }

    pub async fn replace_checklist(
        &self,
        trip_id: &str,
        viewer_id: &str,
        checklist: Checklist,
    ) -> Result<UserChecklist, AppError> {
        let trip = self
            .trips
            .mutate(trip_id, |trip| {
                personal_checklist(trip, viewer_id).checklist = checklist.clone();
                Ok(())
            })
            .await?;
        stored_checklist(trip, viewer_id)
    }

    pub async fn toggle_item(
        &self,
        trip_id: &str,
        viewer_id: &str,
        category: &str,
        label: &str,
    ) -> Result<UserChecklist, AppError> {
        let trip = self
            .trips
            .mutate(trip_id, |trip| {
                personal_checklist(trip, viewer_id)
                    .checklist
                    .toggle(category, label)
                    .map(|_| ())
            })
            .await?;
        stored_checklist(trip, viewer_id)
    }

    pub async fn add_item(
        &self,
        trip_id: &str,
        viewer_id: &str,
        category: &str,
        label: &str,
    ) -> Result<UserChecklist, AppError> {
        let trip = self
            .trips
            .mutate(trip_id, |trip| {
                personal_checklist(trip, viewer_id)
                    .checklist
                    .add_custom(category, label)
            })
            .await?;
        stored_checklist(trip, viewer_id)
    }
}

fn stored_checklist(mut trip: Trip, viewer_id: &str) -> Result<UserChecklist, AppError> {
    trip.user_checklists
        .remove(viewer_id)
        .ok_or(AppError::NotFound)
}
