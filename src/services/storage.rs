use std::{
    collections::HashMap,
    path::{Path, PathBuf},
    sync::Arc,
};

use async_trait::async_trait;
use tokio::{
    fs,
    sync::{Mutex, RwLock},
};

use crate::{error::AppError, models::Trip};

/// Key/value storage of whole trip documents.
///
/// `put` is a compare-and-swap on `Trip::version`: it succeeds only when the
/// stored version still equals `expected_version`, and stores the trip with
/// the version incremented.
#[async_trait]
pub trait TripStore: Send + Sync {
    async fn get(&self, id: &str) -> Result<Option<Trip>, AppError>;
    async fn insert(&self, trip: &Trip) -> Result<Trip, AppError>;
    async fn put(&self, trip: &Trip, expected_version: u64) -> Result<Trip, AppError>;
    async fn delete(&self, id: &str) -> Result<bool, AppError>;
    async fn list(&self) -> Result<Vec<Trip>, AppError>;
}

fn check_version(id: &str, expected: u64, actual: u64) -> Result<(), AppError> {
    if expected == actual {
        Ok(())
    } else {
        Err(AppError::Conflict {
            id: id.to_string(),
            expected,
            actual,
        })
    }
}

/// In-memory storage for tests and throwaway instances.
#[derive(Default)]
pub struct MemoryTripStore {
    trips: RwLock<HashMap<String, Trip>>,
}

impl MemoryTripStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TripStore for MemoryTripStore {
    async fn get(&self, id: &str) -> Result<Option<Trip>, AppError> {
        Ok(self.trips.read().await.get(id).cloned())
    }

    async fn insert(&self, trip: &Trip) -> Result<Trip, AppError> {
        let mut trips = self.trips.write().await;
        if let Some(existing) = trips.get(&trip.id) {
            return Err(AppError::Conflict {
                id: trip.id.clone(),
                expected: 0,
                actual: existing.version,
            });
        }
        let mut stored = trip.clone();
        stored.version = 0;
        trips.insert(stored.id.clone(), stored.clone());
        Ok(stored)
    }

    async fn put(&self, trip: &Trip, expected_version: u64) -> Result<Trip, AppError> {
        let mut trips = self.trips.write().await;
        let current = trips.get(&trip.id).ok_or(AppError::NotFound)?;
        check_version(&trip.id, expected_version, current.version)?;
        let mut stored = trip.clone();
        stored.version = expected_version + 1;
        trips.insert(stored.id.clone(), stored.clone());
        Ok(stored)
    }

    async fn delete(&self, id: &str) -> Result<bool, AppError> {
        Ok(self.trips.write().await.remove(id).is_some())
    }

    async fn list(&self) -> Result<Vec<Trip>, AppError> {
        Ok(self.trips.read().await.values().cloned().collect())
    }
}

/// One pretty-printed JSON document per trip under `<root>/trips/`.
/// Writes are serialised through a single lock so the version check and the
/// file write happen together.
#[derive(Clone)]
pub struct FileTripStore {
    root: Arc<PathBuf>,
    write_lock: Arc<Mutex<()>>,
}

impl FileTripStore {
    pub fn new(root: PathBuf) -> Self {
        Self {
            root: Arc::new(root),
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn trips_dir(&self) -> PathBuf {
        self.root().join("trips")
    }

    pub async fn ensure_structure(&self) -> Result<(), AppError> {
        fs::create_dir_all(self.trips_dir()).await?;
        Ok(())
    }

    fn trip_path(&self, id: &str) -> Result<PathBuf, AppError> {
        if id.is_empty()
            || id.contains("..")
            || id.contains(|c: char| matches!(c, '/' | '\\') || c.is_control())
        {
            return Err(AppError::NotFound);
        }
        Ok(self.trips_dir().join(format!("{id}.json")))
    }

    async fn read_path(&self, path: &Path) -> Result<Option<Trip>, AppError> {
        if !fs::try_exists(path).await? {
            return Ok(None);
        }
        let raw = fs::read(path).await?;
        if raw.is_empty() {
            return Ok(None);
        }
        Ok(Some(serde_json::from_slice(&raw)?))
    }

    async fn write_trip(&self, trip: &Trip) -> Result<(), AppError> {
        fs::create_dir_all(self.trips_dir()).await?;
        let path = self.trip_path(&trip.id)?;
        let tmp = path.with_extension("json.tmp");
        let data = serde_json::to_vec_pretty(trip)?;
        fs::write(&tmp, data).await?;
        fs::rename(&tmp, &path).await?;
        Ok(())
    }
}

#[async_trait]
impl TripStore for FileTripStore {
    async fn get(&self, id: &str) -> Result<Option<Trip>, AppError> {
        match self.trip_path(id) {
            Ok(path) => self.read_path(&path).await,
            Err(AppError::NotFound) => Ok(None),
            Err(err) => Err(err),
        }
    }

    async fn insert(&self, trip: &Trip) -> Result<Trip, AppError> {
        let _guard = self.write_lock.lock().await;
        let path = self.trip_path(&trip.id)?;
        if let Some(existing) = self.read_path(&path).await? {
            return Err(AppError::Conflict {
                id: trip.id.clone(),
                expected: 0,
                actual: existing.version,
            });
        }
        let mut stored = trip.clone();
        stored.version = 0;
        self.write_trip(&stored).await?;
        Ok(stored)
    }

    async fn put(&self, trip: &Trip, expected_version: u64) -> Result<Trip, AppError> {
        let _guard = self.write_lock.lock().await;
        let path = self.trip_path(&trip.id)?;
        let current = self.read_path(&path).await?.ok_or(AppError::NotFound)?;
        check_version(&trip.id, expected_version, current.version)?;
        let mut stored = trip.clone();
        stored.version = expected_version + 1;
        self.write_trip(&stored).await?;
        Ok(stored)
    }

    async fn delete(&self, id: &str) -> Result<bool, AppError> {
        let _guard = self.write_lock.lock().await;
        let Ok(path) = self.trip_path(id) else {
            return Ok(false);
        };
        if !fs::try_exists(&path).await? {
            return Ok(false);
        }
        fs::remove_file(&path).await?;
        Ok(true)
    }

    async fn list(&self) -> Result<Vec<Trip>, AppError> {
        let dir = self.trips_dir();
        if !fs::try_exists(&dir).await? {
            return Ok(Vec::new());
        }
        let mut trips = Vec::new();
        let mut entries = fs::read_dir(&dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
                continue;
            }
            if let Some(trip) = self.read_path(&path).await? {
                trips.push(trip);
            }
        }
        Ok(trips)
    }
}
