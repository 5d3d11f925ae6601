//! Location maintenance actions.

use anyhow::Result;
use serde::Serialize;
use sqlx::PgPool;
use tracing::info;

use super::models::Location;
use super::sync::AddressSyncCoordinator;

/// Outcome of a coordinate resync sweep.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ResyncReport {
    pub scanned: usize,
    pub updated: usize,
    pub warnings: Vec<String>,
}

/// Backfill coordinates for locations that have a postcode but no stored
/// coordinates (e.g. rows imported before geocoding existed, or rows whose
/// earlier lookups failed transiently).
///
/// Failures stay warnings; one unresolvable postcode never stops the sweep.
pub async fn resync_missing_coordinates(
    coordinator: &AddressSyncCoordinator,
    pool: &PgPool,
) -> Result<ResyncReport> {
    let locations = Location::find_missing_coordinates(pool).await?;

    let mut report = ResyncReport {
        scanned: locations.len(),
        ..Default::default()
    };

    for location in locations {
        let synced = coordinator
            .sync(location.postal_code.as_deref(), location.address())
            .await;

        if let Some(warning) = synced.warning {
            report.warnings.push(format!("location {}: {}", location.id, warning));
            continue;
        }

        if let Some(coordinates) = synced.address.coordinates {
            Location::update_coordinates(location.id, coordinates, pool).await?;
            report.updated += 1;
        }
    }

    info!(
        scanned = report.scanned,
        updated = report.updated,
        warnings = report.warnings.len(),
        "location coordinate resync complete"
    );

    Ok(report)
}
