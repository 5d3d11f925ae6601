use axum::{extract::Extension, http::StatusCode, Json};
use tracing::error;

use crate::domains::locations::actions::{resync_missing_coordinates, ResyncReport};
use crate::server::app::AppState;

/// Backfill coordinates for locations that have a postcode but none stored.
pub async fn resync_locations_handler(
    Extension(state): Extension<AppState>,
) -> Result<Json<ResyncReport>, (StatusCode, String)> {
    match resync_missing_coordinates(&state.coordinator, &state.db_pool).await {
        Ok(report) => Ok(Json(report)),
        Err(e) => {
            error!(error = %e, "location coordinate resync failed");
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("location resync failed: {}", e),
            ))
        }
    }
}
