use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::info;
use tripboard::config::{AppConfig, TripStoreKind};
use tripboard::db::{init_pool, run_migrations};
use tripboard::error::AppError;
use tripboard::routes::create_router;
use tripboard::services::{
    distance::DistanceMatrixClient,
    flights::FlightScheduleClient,
    storage::{FileTripStore, MemoryTripStore, TripStore},
};
use tripboard::state::AppState;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    init_logging();

    let config = AppConfig::from_env()?;
    let db = init_pool(&config.database_url).await?;
    run_migrations(&db).await?;

    let store: Arc<dyn TripStore> = match config.trip_store {
        TripStoreKind::File => {
            let store = FileTripStore::new(config.data_root.clone());
            store.ensure_structure().await?;
            info!("storing trips under {}", store.root().display());
            Arc::new(store)
        }
        TripStoreKind::Memory => {
            info!("storing trips in memory; nothing survives a restart");
            Arc::new(MemoryTripStore::new())
        }
    };

    let distance = DistanceMatrixClient::new(
        config.distance_api_url.clone(),
        config.distance_api_key.clone(),
        config.upstream_timeout,
    )?;
    let flights = FlightScheduleClient::new(
        config.flight_api_url.clone(),
        config.flight_api_key.clone(),
        config.upstream_timeout,
    )?;

    let state = AppState::new(
        config.clone(),
        db,
        store,
        Arc::new(distance),
        Arc::new(flights),
    );

    let app = create_router(state);

    let listener = TcpListener::bind(config.listen_addr).await?;
    info!("listening on {}", listener.local_addr()?);
    axum::serve(listener, app.into_make_service()).await?;

    Ok(())
}

fn init_logging() {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let fmt_layer = tracing_subscriber::fmt::layer().with_target(false);
    let filter_layer = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,tripboard=debug".into());

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(fmt_layer)
        .init();
}
