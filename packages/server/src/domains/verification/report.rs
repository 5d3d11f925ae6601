use serde::Serialize;
use uuid::Uuid;

/// Aggregate result of one verification scan run.
///
/// Counts are exact regardless of the order in which organisations were
/// processed; the order of `errors` is not guaranteed.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchReport {
    /// Organisations examined by this run.
    pub total: usize,
    /// Reminder emails accepted by the mail transport.
    pub reminders_sent: usize,
    /// Organisations demoted from verified to unverified.
    pub unverified_count: usize,
    /// Organisations without a notifiable administrator (not errors).
    pub skipped: usize,
    /// Set when cancellation stopped the run before all work was started.
    pub cancelled: bool,
    pub errors: Vec<BatchError>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchError {
    pub organization_id: Uuid,
    pub message: String,
}

impl BatchReport {
    /// Log the run outcome: one summary line plus one warning per error, so
    /// scheduled runs never drop failures silently.
    pub fn log_summary(&self) {
        tracing::info!(
            total = self.total,
            reminders_sent = self.reminders_sent,
            unverified = self.unverified_count,
            skipped = self.skipped,
            cancelled = self.cancelled,
            errors = self.errors.len(),
            "verification scan complete"
        );

        for error in &self.errors {
            tracing::warn!(
                organization_id = %error.organization_id,
                error = %error.message,
                "verification scan error"
            );
        }
    }
}
