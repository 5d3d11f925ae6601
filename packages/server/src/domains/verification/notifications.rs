use std::sync::Arc;

use tracing::{debug, warn};

use crate::kernel::{BaseMailer, OutboundEmail};

use super::decision::EXPIRY_THRESHOLD_DAYS;

/// Sends reminder and expiry emails for one organisation at a time.
///
/// Delivery failures are reported as `false`, never as errors: the caller
/// records them in the batch report, and the associated state mutation
/// proceeds regardless. There is no retry logic here; a missed email is
/// retried only insofar as the next scheduled scan re-classifies the
/// organisation.
#[derive(Clone)]
pub struct NotificationDispatcher {
    mailer: Arc<dyn BaseMailer>,
}

impl NotificationDispatcher {
    pub fn new(mailer: Arc<dyn BaseMailer>) -> Self {
        Self { mailer }
    }

    /// Send the day-90 reminder. Returns true only when the mail transport
    /// accepted the message.
    pub async fn send_reminder(&self, email: &str, org_name: &str, elapsed_days: i64) -> bool {
        let message = OutboundEmail {
            to: email.to_string(),
            subject: format!("Reminder: review the listing for {}", org_name),
            body: format!(
                "The details for {} were last updated {} days ago. Please review \
                 and confirm them; listings left unreviewed for {} days lose their \
                 verified status.",
                org_name, elapsed_days, EXPIRY_THRESHOLD_DAYS
            ),
        };

        self.deliver(message, "reminder").await
    }

    /// Send the expiry notice accompanying the unverify transition.
    pub async fn send_expiry(&self, email: &str, org_name: &str) -> bool {
        let message = OutboundEmail {
            to: email.to_string(),
            subject: format!("Verified status expired for {}", org_name),
            body: format!(
                "The listing for {} has not been reviewed within the verification \
                 window and is no longer marked as verified. Updating the listing \
                 details will make it eligible for verification again.",
                org_name
            ),
        };

        self.deliver(message, "expiry").await
    }

    async fn deliver(&self, message: OutboundEmail, kind: &str) -> bool {
        match self.mailer.send(&message).await {
            Ok(()) => {
                debug!(to = %message.to, kind, "notification accepted by mail transport");
                true
            }
            Err(e) => {
                warn!(to = %message.to, kind, error = %e, "notification delivery failed");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernel::test_dependencies::MockMailer;

    #[tokio::test]
    async fn reminder_reports_transport_acceptance() {
        let mailer = Arc::new(MockMailer::new());
        let dispatcher = NotificationDispatcher::new(mailer.clone());

        let ok = dispatcher
            .send_reminder("admin@example.org", "Helping Hands", 90)
            .await;

        assert!(ok);
        let sent = mailer.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, "admin@example.org");
        assert!(sent[0].subject.contains("Helping Hands"));
        assert!(sent[0].body.contains("90 days"));
    }

    #[tokio::test]
    async fn delivery_failure_returns_false_without_error() {
        let mailer = Arc::new(MockMailer::new().with_delivery_failure());
        let dispatcher = NotificationDispatcher::new(mailer);

        let ok = dispatcher.send_expiry("admin@example.org", "Helping Hands").await;

        assert!(!ok);
    }
}
