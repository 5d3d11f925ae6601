//! Verification lifecycle engine.
//!
//! Organisations age against their last substantive edit. At 90 elapsed days
//! the selected administrator receives a reminder; at 100 days a verified
//! organisation is demoted to unverified and notified of the expiry.
//!
//! ```text
//! Scheduler (daily 09:00 UTC)
//!     │
//!     └─► VerificationScanner::scan(now)
//!             └─► For each organisation → classify elapsed days
//!                     ├─► NotificationDispatcher (reminder / expiry email)
//!                     └─► UnverifyOrganization (conditional state write)
//! ```
//!
//! Per-organisation failures are collected into the `BatchReport`; they never
//! abort the batch.

pub mod decision;
pub mod notifications;
pub mod report;
pub mod scanner;

pub use decision::{classify, VerificationDecision, EXPIRY_THRESHOLD_DAYS, REMINDER_THRESHOLD_DAYS};
pub use notifications::NotificationDispatcher;
pub use report::{BatchError, BatchReport};
pub use scanner::{ScanConfig, VerificationScanner};
