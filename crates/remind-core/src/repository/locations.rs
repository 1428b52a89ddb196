use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use crate::db::DbPool;
use crate::error::CoreError;
use crate::models::{GeoPoint, LocationRecord};

/// Storage for geocoded points referenced by `Reminder::location_id`.
#[async_trait]
pub trait LocationStore: Send + Sync {
    async fn save_location(&self, address: &str, point: GeoPoint) -> Result<LocationRecord, CoreError>;
    async fn find_location(&self, id: &str) -> Result<Option<LocationRecord>, CoreError>;
    /// `NotFound` when no record has this id.
    async fn delete_location(&self, id: &str) -> Result<(), CoreError>;
}

pub struct SqliteLocationStore {
    pool: DbPool,
}

impl SqliteLocationStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LocationStore for SqliteLocationStore {
    async fn save_location(&self, address: &str, point: GeoPoint) -> Result<LocationRecord, CoreError> {
        let record = LocationRecord {
            id: Uuid::now_v7().to_string(),
            address: address.to_string(),
            lat: point.lat,
            lng: point.lng,
            created_at: Utc::now(),
        };

        sqlx::query("INSERT INTO locations (id, address, lat, lng, created_at) VALUES (?, ?, ?, ?, ?)")
            .bind(&record.id)
            .bind(&record.address)
            .bind(record.lat)
            .bind(record.lng)
            .bind(record.created_at)
            .execute(&self.pool)
            .await?;

        Ok(record)
    }

    async fn find_location(&self, id: &str) -> Result<Option<LocationRecord>, CoreError> {
        let record = sqlx::query_as("SELECT * FROM locations WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(record)
    }

    async fn delete_location(&self, id: &str) -> Result<(), CoreError> {
        let result = sqlx::query("DELETE FROM locations WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(CoreError::NotFound(format!("Location {}", id)));
        }
        Ok(())
    }
}
