//! The verification scan: classify every organisation and drive
//! notifications and state transitions, isolating per-organisation failures.

use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};
use uuid::Uuid;

use crate::domains::organization::commands::UnverifyOrganization;
use crate::domains::organization::models::Organization;
use crate::kernel::BaseOrganizationStore;

use super::decision::classify;
use super::notifications::NotificationDispatcher;
use super::report::{BatchError, BatchReport};

/// Configuration for the verification scan.
#[derive(Debug, Clone)]
pub struct ScanConfig {
    /// Maximum organisations processed concurrently. Kept small so one scan
    /// stays well inside the mail and geocode services' rate limits.
    pub worker_count: usize,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self { worker_count: 4 }
    }
}

/// Outcome of processing a single organisation.
enum UnitOutcome {
    /// No notifiable administrator: not an error, counted separately.
    Skipped,
    Processed {
        reminded: bool,
        unverified: bool,
        errors: Vec<String>,
    },
}

/// Scans all organisations, sends threshold notifications, and demotes stale
/// verified organisations.
///
/// One scan examines every candidate even when individual organisations fail;
/// only a failure to read the candidate set at all aborts the run.
pub struct VerificationScanner {
    store: Arc<dyn BaseOrganizationStore>,
    dispatcher: NotificationDispatcher,
    config: ScanConfig,
}

impl VerificationScanner {
    pub fn new(
        store: Arc<dyn BaseOrganizationStore>,
        dispatcher: NotificationDispatcher,
        config: ScanConfig,
    ) -> Self {
        Self {
            store,
            dispatcher,
            config,
        }
    }

    /// Run one scan pass at the given instant.
    ///
    /// `now` is injected so tests (and the manual trigger) control the clock.
    /// Cancellation stops starting new per-organisation work; units already
    /// in flight run to completion and are reflected in the report.
    pub async fn scan(
        &self,
        now: DateTime<Utc>,
        cancel: &CancellationToken,
    ) -> Result<BatchReport> {
        let organizations = self
            .store
            .find_candidates()
            .await
            .context("failed to load organisations for verification scan")?;

        info!(count = organizations.len(), "verification scan started");

        let mut report = BatchReport {
            total: organizations.len(),
            ..Default::default()
        };

        let mut pending = organizations.into_iter();
        let mut workers: JoinSet<(Uuid, UnitOutcome)> = JoinSet::new();

        loop {
            // Keep the pool full until cancellation is requested or the
            // candidate list runs dry.
            while !report.cancelled && workers.len() < self.config.worker_count {
                if cancel.is_cancelled() {
                    if pending.len() != 0 {
                        report.cancelled = true;
                    }
                    break;
                }

                let Some(organization) = pending.next() else {
                    break;
                };

                let store = Arc::clone(&self.store);
                let dispatcher = self.dispatcher.clone();
                workers.spawn(async move {
                    let id = organization.id;
                    let outcome = process_organization(store, dispatcher, organization, now).await;
                    (id, outcome)
                });
            }

            match workers.join_next().await {
                Some(Ok((id, outcome))) => apply_outcome(&mut report, id, outcome),
                Some(Err(e)) => {
                    error!(error = %e, "verification worker task failed");
                    report.errors.push(BatchError {
                        organization_id: Uuid::nil(),
                        message: format!("worker task failed: {}", e),
                    });
                }
                None => break,
            }
        }

        Ok(report)
    }
}

fn apply_outcome(report: &mut BatchReport, id: Uuid, outcome: UnitOutcome) {
    match outcome {
        UnitOutcome::Skipped => report.skipped += 1,
        UnitOutcome::Processed {
            reminded,
            unverified,
            errors,
        } => {
            if reminded {
                report.reminders_sent += 1;
            }
            if unverified {
                report.unverified_count += 1;
            }
            for message in errors {
                report.errors.push(BatchError {
                    organization_id: id,
                    message,
                });
            }
        }
    }
}

/// Process one organisation: classify, notify, and mutate.
///
/// Never returns an error; every failure is folded into the outcome so the
/// batch continues.
async fn process_organization(
    store: Arc<dyn BaseOrganizationStore>,
    dispatcher: NotificationDispatcher,
    organization: Organization,
    now: DateTime<Utc>,
) -> UnitOutcome {
    let administrator = match organization.selected_administrator() {
        Ok(Some(admin)) if !admin.email.trim().is_empty() => admin,
        Ok(_) => {
            debug!(
                organization_id = %organization.id,
                "no notifiable administrator; skipping"
            );
            return UnitOutcome::Skipped;
        }
        Err(e) => {
            return UnitOutcome::Processed {
                reminded: false,
                unverified: false,
                errors: vec![e.to_string()],
            };
        }
    };

    let decision = classify(now, &organization);
    debug!(
        organization_id = %organization.id,
        elapsed_days = decision.elapsed_days,
        remind = decision.remind,
        unverify = decision.unverify,
        "classified organisation"
    );

    let mut reminded = false;
    let mut unverified = false;
    let mut errors = Vec::new();

    if decision.remind {
        if dispatcher
            .send_reminder(&administrator.email, &organization.name, decision.elapsed_days)
            .await
        {
            reminded = true;
        } else {
            errors.push("reminder email was not accepted by the mail transport".to_string());
        }
    }

    if decision.unverify {
        if !dispatcher
            .send_expiry(&administrator.email, &organization.name)
            .await
        {
            errors.push("expiry email was not accepted by the mail transport".to_string());
        }

        // The state transition goes ahead even when the email did not: an
        // organisation must not stay verified because the mail provider is
        // down.
        let command = UnverifyOrganization {
            organization_id: organization.id,
        };
        match command.apply(store.as_ref()).await {
            Ok(()) => unverified = true,
            Err(e) => errors.push(e.to_string()),
        }
    }

    UnitOutcome::Processed {
        reminded,
        unverified,
        errors,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernel::test_dependencies::{
        organization_edited_days_ago, MockMailer, MockOrganizationStore,
    };
    use chrono::Duration;

    fn scanner(
        store: Arc<MockOrganizationStore>,
        mailer: Arc<MockMailer>,
    ) -> VerificationScanner {
        VerificationScanner::new(
            store,
            NotificationDispatcher::new(mailer),
            ScanConfig::default(),
        )
    }

    #[tokio::test]
    async fn reminder_sent_exactly_at_ninety_days() {
        let now = Utc::now();
        let org = organization_edited_days_ago(now, 90, true, "admin@example.org");
        let store = Arc::new(MockOrganizationStore::new().with_organization(org.clone()));
        let mailer = Arc::new(MockMailer::new());

        let report = scanner(store.clone(), mailer.clone())
            .scan(now, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(report.total, 1);
        assert_eq!(report.reminders_sent, 1);
        assert_eq!(report.unverified_count, 0);
        assert!(report.errors.is_empty());
        // Verified flag untouched by a reminder.
        assert!(store.get(org.id).unwrap().is_verified);
    }

    #[tokio::test]
    async fn no_reminder_off_the_ninety_day_mark() {
        let now = Utc::now();
        let store = Arc::new(
            MockOrganizationStore::new()
                .with_organization(organization_edited_days_ago(now, 89, true, "a@example.org"))
                .with_organization(organization_edited_days_ago(now, 91, true, "b@example.org")),
        );
        let mailer = Arc::new(MockMailer::new());

        let report = scanner(store, mailer.clone())
            .scan(now, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(report.reminders_sent, 0);
        assert!(mailer.sent().is_empty());
    }

    #[tokio::test]
    async fn stale_verified_organisation_is_demoted_without_resetting_the_clock() {
        let now = Utc::now();
        let org = organization_edited_days_ago(now, 105, true, "admin@example.org");
        let edited_at = org.last_substantive_edit_at;
        let store = Arc::new(MockOrganizationStore::new().with_organization(org.clone()));
        let mailer = Arc::new(MockMailer::new());

        let report = scanner(store.clone(), mailer.clone())
            .scan(now, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(report.unverified_count, 1);
        assert!(report.errors.is_empty());

        let stored = store.get(org.id).unwrap();
        assert!(!stored.is_verified);
        // The aging clock must not restart on expiry.
        assert_eq!(stored.last_substantive_edit_at, edited_at);
        // Expiry notice went to the selected administrator.
        assert!(mailer.sent_to("admin@example.org"));
    }

    #[tokio::test]
    async fn already_unverified_organisation_is_left_alone() {
        let now = Utc::now();
        let org = organization_edited_days_ago(now, 200, false, "admin@example.org");
        let store = Arc::new(MockOrganizationStore::new().with_organization(org));
        let mailer = Arc::new(MockMailer::new());

        let report = scanner(store.clone(), mailer)
            .scan(now, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(report.unverified_count, 0);
        assert!(store.unverify_calls().is_empty());
    }

    #[tokio::test]
    async fn organisation_without_selected_administrator_is_skipped() {
        let now = Utc::now();
        let mut org = organization_edited_days_ago(now, 90, true, "ignored@example.org");
        org.administrators = serde_json::json!([
            {"email": "one@example.org", "is_selected": false},
            {"email": "two@example.org", "is_selected": false},
        ]);
        let store = Arc::new(MockOrganizationStore::new().with_organization(org));
        let mailer = Arc::new(MockMailer::new());

        let report = scanner(store, mailer.clone())
            .scan(now, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(report.skipped, 1);
        assert_eq!(report.reminders_sent, 0);
        assert_eq!(report.unverified_count, 0);
        assert!(report.errors.is_empty());
        assert!(mailer.sent().is_empty());
    }

    #[tokio::test]
    async fn blank_administrator_email_is_skipped() {
        let now = Utc::now();
        let org = organization_edited_days_ago(now, 90, true, "  ");
        let store = Arc::new(MockOrganizationStore::new().with_organization(org));
        let mailer = Arc::new(MockMailer::new());

        let report = scanner(store, mailer)
            .scan(now, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(report.skipped, 1);
        assert!(report.errors.is_empty());
    }

    #[tokio::test]
    async fn mail_outage_still_demotes_and_reports_the_failure() {
        let now = Utc::now();
        let org = organization_edited_days_ago(now, 120, true, "admin@example.org");
        let store = Arc::new(MockOrganizationStore::new().with_organization(org.clone()));
        let mailer = Arc::new(MockMailer::new().with_delivery_failure());

        let report = scanner(store.clone(), mailer)
            .scan(now, &CancellationToken::new())
            .await
            .unwrap();

        // Mutation proceeded despite the failed expiry email.
        assert_eq!(report.unverified_count, 1);
        assert!(!store.get(org.id).unwrap().is_verified);
        assert_eq!(report.errors.len(), 1);
        assert!(report.errors[0].message.contains("expiry email"));
    }

    #[tokio::test]
    async fn per_organisation_failures_do_not_abort_the_batch() {
        let now = Utc::now();
        let mut broken = organization_edited_days_ago(now, 90, true, "x@example.org");
        broken.administrators = serde_json::json!("not a list");
        let healthy = organization_edited_days_ago(now, 90, true, "ok@example.org");

        let store = Arc::new(
            MockOrganizationStore::new()
                .with_organization(broken)
                .with_organization(healthy),
        );
        let mailer = Arc::new(MockMailer::new());

        let report = scanner(store, mailer.clone())
            .scan(now, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(report.total, 2);
        assert_eq!(report.reminders_sent, 1);
        assert_eq!(report.errors.len(), 1);
        assert!(mailer.sent_to("ok@example.org"));
    }

    #[tokio::test]
    async fn store_outage_aborts_the_run() {
        let store = Arc::new(MockOrganizationStore::new().with_find_failure());
        let mailer = Arc::new(MockMailer::new());

        let result = scanner(store, mailer)
            .scan(Utc::now(), &CancellationToken::new())
            .await;

        assert!(result.is_err());
    }

    #[tokio::test]
    async fn rescanning_the_same_instant_resends_the_reminder() {
        // No dedup state is persisted, so a second scan at the same instant
        // sends the day-90 reminder again. Current behaviour, asserted as such.
        let now = Utc::now();
        let org = organization_edited_days_ago(now, 90, true, "admin@example.org");
        let store = Arc::new(MockOrganizationStore::new().with_organization(org));
        let mailer = Arc::new(MockMailer::new());
        let scanner = scanner(store, mailer.clone());

        let first = scanner.scan(now, &CancellationToken::new()).await.unwrap();
        let second = scanner.scan(now, &CancellationToken::new()).await.unwrap();

        assert_eq!(first.reminders_sent, 1);
        assert_eq!(second.reminders_sent, 1);
        assert_eq!(mailer.sent().len(), 2);
    }

    #[tokio::test]
    async fn cancellation_stops_new_work_and_marks_the_report() {
        let now = Utc::now();
        let mut store = MockOrganizationStore::new();
        for i in 0..20 {
            store = store.with_organization(organization_edited_days_ago(
                now,
                50 + i,
                true,
                "admin@example.org",
            ));
        }
        let store = Arc::new(store);
        let mailer = Arc::new(MockMailer::new());

        let cancel = CancellationToken::new();
        cancel.cancel();

        let report = scanner(store, mailer.clone())
            .scan(now, &cancel)
            .await
            .unwrap();

        assert!(report.cancelled);
        assert!(mailer.sent().is_empty());
    }

    #[tokio::test]
    async fn future_edit_dates_trigger_nothing() {
        let now = Utc::now();
        let mut org = organization_edited_days_ago(now, 0, true, "admin@example.org");
        org.last_substantive_edit_at = now + Duration::days(3);
        let store = Arc::new(MockOrganizationStore::new().with_organization(org));
        let mailer = Arc::new(MockMailer::new());

        let report = scanner(store, mailer.clone())
            .scan(now, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(report.reminders_sent, 0);
        assert_eq!(report.unverified_count, 0);
        assert!(mailer.sent().is_empty());
    }
}
