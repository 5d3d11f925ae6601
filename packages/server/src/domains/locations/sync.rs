use tracing::{debug, warn};

use crate::common::normalize_postcode;

use super::models::Address;
use super::resolver::GeocodeResolver;

/// An address after synchronization, with any non-fatal warning raised along
/// the way. Warnings never block the surrounding entity write.
#[derive(Debug, Clone)]
pub struct SyncedAddress {
    pub address: Address,
    pub warning: Option<String>,
}

/// Keeps address coordinates consistent with the stored postcode.
///
/// Invoked from the entity-mutation path on organisation and service writes.
/// A lookup happens only when the normalized postcode changed or coordinates
/// are missing; an unchanged address costs nothing.
pub struct AddressSyncCoordinator {
    resolver: GeocodeResolver,
}

impl AddressSyncCoordinator {
    pub fn new(resolver: GeocodeResolver) -> Self {
        Self { resolver }
    }

    /// Synchronize one address against its previously stored postcode.
    ///
    /// On lookup failure (postcode unknown, or service unavailable) the
    /// previously stored coordinates are kept as they are, never nulled out,
    /// and the failure surfaces as a warning on the result.
    pub async fn sync(&self, old_postcode: Option<&str>, mut address: Address) -> SyncedAddress {
        let new_normalized = address
            .postcode
            .as_deref()
            .map(normalize_postcode)
            .filter(|p| !p.is_empty());
        let old_normalized = old_postcode
            .map(normalize_postcode)
            .filter(|p| !p.is_empty());

        let Some(postcode) = new_normalized else {
            // Nothing to resolve against; leave the address as supplied.
            return SyncedAddress {
                address,
                warning: None,
            };
        };

        if old_normalized.as_deref() == Some(postcode.as_str()) && address.coordinates.is_some() {
            debug!(postcode = %postcode, "postcode unchanged; keeping stored coordinates");
            return SyncedAddress {
                address,
                warning: None,
            };
        }

        let warning = match self.resolver.resolve(&postcode).await {
            Ok(Some(coordinates)) => {
                address.coordinates = Some(coordinates);
                None
            }
            Ok(None) => {
                let message = format!(
                    "postcode {} is not known to the lookup service; keeping stored coordinates",
                    postcode
                );
                warn!("{}", message);
                Some(message)
            }
            Err(e) => {
                let message = format!(
                    "coordinate lookup for postcode {} failed: {}; keeping stored coordinates",
                    postcode, e
                );
                warn!("{}", message);
                Some(message)
            }
        };

        SyncedAddress { address, warning }
    }

    /// Synchronize a batch of addresses updated together.
    ///
    /// Each entry is evaluated independently; identical postcodes within the
    /// batch resolve through the resolver's cache, so one network lookup
    /// serves them all.
    pub async fn sync_batch(
        &self,
        addresses: Vec<(Option<String>, Address)>,
    ) -> Vec<SyncedAddress> {
        let mut synced = Vec::with_capacity(addresses.len());
        for (old_postcode, address) in addresses {
            synced.push(self.sync(old_postcode.as_deref(), address).await);
        }
        synced
    }
}
