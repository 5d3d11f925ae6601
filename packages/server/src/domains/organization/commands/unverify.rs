use uuid::Uuid;

use crate::common::LifecycleError;
use crate::kernel::BaseOrganizationStore;

/// Command: demote an organization from verified to unverified.
///
/// Applied through the store's conditional update rather than read-then-save,
/// so overlapping scans cannot demote the same organization twice. The store
/// must leave the aging clock (`last_substantive_edit_at`) untouched; an
/// expired organization does not earn a fresh 90/100-day cycle by expiring.
#[derive(Debug, Clone)]
pub struct UnverifyOrganization {
    pub organization_id: Uuid,
}

impl UnverifyOrganization {
    pub async fn apply(&self, store: &dyn BaseOrganizationStore) -> Result<(), LifecycleError> {
        store.unverify(self.organization_id).await
    }
}
