// Trait definitions for dependency injection
//
// These are INFRASTRUCTURE traits only - no business logic. Lifecycle rules
// (when to remind, when to demote, when to re-geocode) are domain functions
// that use these traits.
//
// Naming convention: Base* for trait names (e.g., BaseMailer, BaseGeocoder)

use anyhow::Result;
use async_trait::async_trait;
use uuid::Uuid;

use crate::common::LifecycleError;
use crate::domains::locations::models::Coordinates;
use crate::domains::organization::models::Organization;

// =============================================================================
// Mail Trait (Infrastructure - transactional email delivery)
// =============================================================================

/// A fully composed email ready for the transport.
#[derive(Debug, Clone)]
pub struct OutboundEmail {
    pub to: String,
    pub subject: String,
    pub body: String,
}

#[async_trait]
pub trait BaseMailer: Send + Sync {
    /// Hand a message to the mail transport. `Ok(())` means the transport
    /// accepted it for delivery; any error means it did not.
    async fn send(&self, message: &OutboundEmail) -> Result<()>;
}

// =============================================================================
// Geocoder Trait (Infrastructure - postcode to coordinates)
// =============================================================================

#[async_trait]
pub trait BaseGeocoder: Send + Sync {
    /// Look up an already-normalized postcode.
    ///
    /// `Ok(None)` when the service states the postcode does not exist;
    /// `LifecycleError::Transient` for network or service trouble.
    async fn lookup(&self, postcode: &str) -> Result<Option<Coordinates>, LifecycleError>;
}

// =============================================================================
// Organization Store Trait (Infrastructure - persistence seam)
// =============================================================================

#[async_trait]
pub trait BaseOrganizationStore: Send + Sync {
    /// All organisations eligible for a verification scan. An error here is
    /// a persistence-layer failure and aborts the run.
    async fn find_candidates(&self) -> Result<Vec<Organization>>;

    /// Conditionally demote a verified organisation. Fails with `NotFound`
    /// when the row is gone and `Concurrency` when the stored flag was
    /// already false. Must not touch the aging clock.
    async fn unverify(&self, id: Uuid) -> Result<(), LifecycleError>;
}
