use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domains::organization::models::Organization;

/// Elapsed days at which the reminder email is sent. Exact match: a scan that
/// does not run on that day silently misses the reminder window (no marker is
/// persisted to catch up on missed runs).
pub const REMINDER_THRESHOLD_DAYS: i64 = 90;

/// Elapsed days at or beyond which a verified organisation is demoted.
pub const EXPIRY_THRESHOLD_DAYS: i64 = 100;

/// The classification of one organisation for one scan pass.
///
/// Derived state: computed fresh on every run from `now` and the stored
/// aging clock, never persisted. The two checks are evaluated independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VerificationDecision {
    pub organization_id: Uuid,
    pub elapsed_days: i64,
    pub remind: bool,
    pub unverify: bool,
}

/// Classify an organisation against the verification thresholds.
///
/// Elapsed days are whole UTC days since the last substantive edit,
/// truncated (millisecond-precision division, not calendar-day boundaries).
pub fn classify(now: DateTime<Utc>, organization: &Organization) -> VerificationDecision {
    let elapsed_days = (now - organization.last_substantive_edit_at).num_days();

    VerificationDecision {
        organization_id: organization.id,
        elapsed_days,
        remind: elapsed_days == REMINDER_THRESHOLD_DAYS,
        unverify: elapsed_days >= EXPIRY_THRESHOLD_DAYS && organization.is_verified,
    }
}
