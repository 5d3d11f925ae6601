//! Scheduled background tasks using tokio-cron-scheduler.
//!
//! The verification scan runs on a fixed daily cadence. The cron trigger is
//! wrapped in an explicit scheduler type so operational tooling and tests use
//! the same entry point with a controlled clock instead of waiting for the
//! cron tick.
//!
//! ```text
//! VerificationScheduler (daily 09:00 UTC)
//!     │
//!     └─► VerificationScanner::scan(now)
//!             └─► reminders / demotions, summarised in the BatchReport
//! ```

use std::sync::Arc;

use anyhow::Result;
use chrono::{DateTime, Utc};
use tokio_cron_scheduler::{Job, JobScheduler};
use tokio_util::sync::CancellationToken;

use crate::domains::verification::{BatchReport, VerificationScanner};

/// Daily at 09:00 UTC.
const DEFAULT_SCHEDULE: &str = "0 0 9 * * *";

/// Owns the cron trigger for the verification scan and exposes the on-demand
/// synchronous entry point.
pub struct VerificationScheduler {
    scanner: Arc<VerificationScanner>,
    schedule: String,
    job_scheduler: Option<JobScheduler>,
}

impl VerificationScheduler {
    pub fn new(scanner: Arc<VerificationScanner>) -> Self {
        Self {
            scanner,
            schedule: DEFAULT_SCHEDULE.to_string(),
            job_scheduler: None,
        }
    }

    /// Override the cron expression (operational configuration).
    pub fn with_schedule(mut self, schedule: &str) -> Self {
        self.schedule = schedule.to_string();
        self
    }

    /// Register and start the daily scan job.
    pub async fn start(&mut self) -> Result<()> {
        let scheduler = JobScheduler::new().await?;

        let scan_scanner = Arc::clone(&self.scanner);
        let scan_job = Job::new_async(self.schedule.as_str(), move |_uuid, _lock| {
            let scanner = Arc::clone(&scan_scanner);
            Box::pin(async move {
                run_scheduled_scan(scanner).await;
            })
        })?;

        scheduler.add(scan_job).await?;
        scheduler.start().await?;

        tracing::info!(schedule = %self.schedule, "verification scan scheduled");
        self.job_scheduler = Some(scheduler);
        Ok(())
    }

    /// Stop the cron trigger. In-flight scans finish on their own.
    pub async fn stop(&mut self) -> Result<()> {
        if let Some(mut scheduler) = self.job_scheduler.take() {
            scheduler.shutdown().await?;
            tracing::info!("verification scheduler stopped");
        }
        Ok(())
    }

    /// Run one scan synchronously and return its report.
    ///
    /// The clock and cancellation signal are caller-supplied; this is the
    /// diagnostics path used by the manual HTTP trigger and by tests.
    pub async fn run_once(
        &self,
        now: DateTime<Utc>,
        cancel: &CancellationToken,
    ) -> Result<BatchReport> {
        self.scanner.scan(now, cancel).await
    }
}

/// Run one scheduled scan, logging the outcome. The full error list goes to
/// the logs; the scheduled path has no caller to return the report to.
async fn run_scheduled_scan(scanner: Arc<VerificationScanner>) {
    tracing::info!("running scheduled verification scan");

    let cancel = CancellationToken::new();
    match scanner.scan(Utc::now(), &cancel).await {
        Ok(report) => report.log_summary(),
        Err(e) => tracing::error!(error = %e, "scheduled verification scan failed"),
    }
}
