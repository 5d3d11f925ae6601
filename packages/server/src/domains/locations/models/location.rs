use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use super::address::{Address, Coordinates};

/// Physical location where an organisation delivers services.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Location {
    pub id: Uuid,
    pub organization_id: Option<Uuid>,
    pub name: Option<String>,
    pub address_line_1: Option<String>,
    pub address_line_2: Option<String>,
    pub city: Option<String>,
    pub postal_code: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Location {
    /// View this row as the address value object the sync coordinator works on.
    pub fn address(&self) -> Address {
        let coordinates = match (self.longitude, self.latitude) {
            (Some(longitude), Some(latitude)) => Some(Coordinates {
                longitude,
                latitude,
            }),
            _ => None,
        };

        Address {
            address_line_1: self.address_line_1.clone(),
            address_line_2: self.address_line_2.clone(),
            city: self.city.clone(),
            postcode: self.postal_code.clone(),
            coordinates,
        }
    }
}

// =============================================================================
// SQL Queries - ALL queries must be in models/
// =============================================================================

impl Location {
    pub async fn find_by_id(id: Uuid, pool: &PgPool) -> Result<Self> {
        let location = sqlx::query_as::<_, Self>("SELECT * FROM locations WHERE id = $1")
            .bind(id)
            .fetch_one(pool)
            .await?;
        Ok(location)
    }

    pub async fn find_by_organization(organization_id: Uuid, pool: &PgPool) -> Result<Vec<Self>> {
        let locations = sqlx::query_as::<_, Self>(
            "SELECT * FROM locations WHERE organization_id = $1 ORDER BY name ASC",
        )
        .bind(organization_id)
        .fetch_all(pool)
        .await?;
        Ok(locations)
    }

    /// Locations carrying a postcode but no coordinates yet: the staleness
    /// the resync sweep eliminates.
    pub async fn find_missing_coordinates(pool: &PgPool) -> Result<Vec<Self>> {
        let locations = sqlx::query_as::<_, Self>(
            r#"
            SELECT * FROM locations
            WHERE postal_code IS NOT NULL
              AND (latitude IS NULL OR longitude IS NULL)
            ORDER BY updated_at ASC
            "#,
        )
        .fetch_all(pool)
        .await?;
        Ok(locations)
    }

    /// Write freshly resolved coordinates for one location. Only the
    /// coordinate fields move; the postcode and address lines stay untouched.
    pub async fn update_coordinates(
        id: Uuid,
        coordinates: Coordinates,
        pool: &PgPool,
    ) -> Result<Self> {
        let location = sqlx::query_as::<_, Self>(
            r#"
            UPDATE locations
            SET longitude = $2, latitude = $3, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(coordinates.longitude)
        .bind(coordinates.latitude)
        .fetch_one(pool)
        .await?;
        Ok(location)
    }
}
