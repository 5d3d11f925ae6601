use axum::{extract::Extension, http::StatusCode, Json};
use chrono::Utc;
use tokio_util::sync::CancellationToken;
use tracing::error;

use crate::domains::verification::BatchReport;
use crate::server::app::AppState;

/// Manually trigger one verification scan and return the full batch report.
///
/// Diagnostics endpoint: the scheduled daily run uses the same scanner, so
/// operators can reproduce and inspect a run on demand.
pub async fn run_scan_handler(
    Extension(state): Extension<AppState>,
) -> Result<Json<BatchReport>, (StatusCode, String)> {
    let cancel = CancellationToken::new();

    match state.scanner.scan(Utc::now(), &cancel).await {
        Ok(report) => {
            report.log_summary();
            Ok(Json(report))
        }
        Err(e) => {
            error!(error = %e, "manual verification scan failed");
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("verification scan failed: {}", e),
            ))
        }
    }
}
