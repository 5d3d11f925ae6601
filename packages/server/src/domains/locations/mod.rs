//! Locations and address geocoding.
//!
//! Addresses carry an optional postcode and optional coordinates; the
//! invariant is that stored coordinates were derived from the stored
//! postcode. The sync coordinator re-resolves coordinates only when the
//! postcode actually changed (or coordinates are missing), so routine edits
//! never cost an external lookup.

pub mod actions;
pub mod models;
pub mod resolver;
pub mod sync;

pub use resolver::GeocodeResolver;
pub use sync::{AddressSyncCoordinator, SyncedAddress};
