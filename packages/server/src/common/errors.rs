use thiserror::Error;

/// Error taxonomy for the organisation lifecycle engine.
///
/// Per-organisation failures during a scan are caught at the scanner boundary
/// and accumulated into the batch report; only a failure to reach the
/// persistence layer itself aborts a run.
#[derive(Error, Debug)]
pub enum LifecycleError {
    /// Network or external-service unavailability. Retried on the next
    /// scheduled run, never within the same run.
    #[error("transient external failure: {0}")]
    Transient(String),

    /// The referenced record or postcode no longer exists. Terminal.
    #[error("not found: {0}")]
    NotFound(String),

    /// The stored state changed between read and write. Terminal for this
    /// run; the organisation is revisited on the next scan.
    #[error("state changed concurrently: {0}")]
    Concurrency(String),

    /// Malformed stored data (e.g. an administrator list that does not
    /// deserialize). Terminal, logged, the record is skipped.
    #[error("validation failed: {0}")]
    Validation(String),
}
