use std::sync::Arc;

use crate::{
    config::AppConfig,
    db::DbPool,
    services::{
        distance::DistanceService, flights::FlightSchedule, sharing::SharingService,
        storage::TripStore, trips::TripService, users::UserDirectory,
    },
};

#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub db: DbPool,
    pub trips: TripService,
    pub users: UserDirectory,
    pub sharing: SharingService,
    pub distance: Arc<dyn DistanceService>,
    pub flights: Arc<dyn FlightSchedule>,
}

impl AppState {
    pub fn new(
        config: AppConfig,
        db: DbPool,
        store: Arc<dyn TripStore>,
        distance: Arc<dyn DistanceService>,
        flights: Arc<dyn FlightSchedule>,
    ) -> Self {
        let trips = TripService::new(store);
        let users = UserDirectory::new(db.clone());
        let sharing = SharingService::new(trips.clone(), users.clone());
        Self {
            config,
            db,
            trips,
            users,
            sharing,
            distance,
            flights,
        }
    }
}
