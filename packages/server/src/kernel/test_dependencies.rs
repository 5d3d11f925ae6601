// TestDependencies - mock implementations for testing
//
// Provides deterministic in-memory stand-ins for the Base* traits so the
// lifecycle engine can be exercised without Postgres, a mail provider, or
// the postcode service.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde_json::json;
use uuid::Uuid;

use crate::common::{normalize_postcode, LifecycleError};
use crate::domains::locations::models::Coordinates;
use crate::domains::organization::models::Organization;

use super::traits::{BaseGeocoder, BaseMailer, BaseOrganizationStore, OutboundEmail};

// =============================================================================
// Fixtures
// =============================================================================

/// An organisation whose last substantive edit was exactly `days_ago` whole
/// days before `now`, with a single selected administrator.
pub fn organization_edited_days_ago(
    now: DateTime<Utc>,
    days_ago: i64,
    is_verified: bool,
    admin_email: &str,
) -> Organization {
    Organization {
        id: Uuid::new_v4(),
        name: format!("Org edited {} days ago", days_ago),
        is_verified,
        last_substantive_edit_at: now - Duration::days(days_ago),
        administrators: json!([
            {"email": admin_email, "is_selected": true},
        ]),
        created_at: now - Duration::days(days_ago + 30),
        updated_at: now - Duration::days(days_ago),
    }
}

// =============================================================================
// Mock Mailer
// =============================================================================

pub struct MockMailer {
    sent: Mutex<Vec<OutboundEmail>>,
    fail_delivery: Mutex<bool>,
}

impl MockMailer {
    pub fn new() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            fail_delivery: Mutex::new(false),
        }
    }

    /// Make every send fail, as if the mail provider were down.
    pub fn with_delivery_failure(self) -> Self {
        *self.fail_delivery.lock().unwrap() = true;
        self
    }

    /// All messages accepted by the transport so far.
    pub fn sent(&self) -> Vec<OutboundEmail> {
        self.sent.lock().unwrap().clone()
    }

    /// Whether any accepted message was addressed to `email`.
    pub fn sent_to(&self, email: &str) -> bool {
        self.sent.lock().unwrap().iter().any(|m| m.to == email)
    }
}

impl Default for MockMailer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BaseMailer for MockMailer {
    async fn send(&self, message: &OutboundEmail) -> Result<()> {
        if *self.fail_delivery.lock().unwrap() {
            return Err(anyhow!("mail provider unavailable"));
        }
        self.sent.lock().unwrap().push(message.clone());
        Ok(())
    }
}

// =============================================================================
// Mock Geocoder
// =============================================================================

pub struct MockGeocoder {
    responses: Mutex<HashMap<String, Option<Coordinates>>>,
    outage: Mutex<bool>,
    calls: Mutex<Vec<String>>,
}

impl MockGeocoder {
    pub fn new() -> Self {
        Self {
            responses: Mutex::new(HashMap::new()),
            outage: Mutex::new(false),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Register a known postcode with its coordinates.
    pub fn with_postcode(self, postcode: &str, longitude: f64, latitude: f64) -> Self {
        self.responses.lock().unwrap().insert(
            normalize_postcode(postcode),
            Some(Coordinates {
                longitude,
                latitude,
            }),
        );
        self
    }

    /// Register a postcode the service reports as nonexistent.
    pub fn with_unknown(self, postcode: &str) -> Self {
        self.responses
            .lock()
            .unwrap()
            .insert(normalize_postcode(postcode), None);
        self
    }

    /// Make every lookup fail transiently, as if the service were down.
    pub fn with_outage(self) -> Self {
        *self.outage.lock().unwrap() = true;
        self
    }

    /// Postcodes the service was asked about, in call order.
    pub fn lookups(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn lookup_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

impl Default for MockGeocoder {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BaseGeocoder for MockGeocoder {
    async fn lookup(&self, postcode: &str) -> Result<Option<Coordinates>, LifecycleError> {
        self.calls.lock().unwrap().push(postcode.to_string());

        if *self.outage.lock().unwrap() {
            return Err(LifecycleError::Transient(
                "postcode service unavailable".to_string(),
            ));
        }

        Ok(self
            .responses
            .lock()
            .unwrap()
            .get(postcode)
            .copied()
            .flatten())
    }
}

// =============================================================================
// Mock Organization Store
// =============================================================================

pub struct MockOrganizationStore {
    organizations: Arc<Mutex<Vec<Organization>>>,
    fail_find: Mutex<bool>,
    unverify_calls: Mutex<Vec<Uuid>>,
}

impl MockOrganizationStore {
    pub fn new() -> Self {
        Self {
            organizations: Arc::new(Mutex::new(Vec::new())),
            fail_find: Mutex::new(false),
            unverify_calls: Mutex::new(Vec::new()),
        }
    }

    pub fn with_organization(self, organization: Organization) -> Self {
        self.organizations.lock().unwrap().push(organization);
        self
    }

    /// Make `find_candidates` fail, as if the database were unreachable.
    pub fn with_find_failure(self) -> Self {
        *self.fail_find.lock().unwrap() = true;
        self
    }

    /// Current stored state of one organisation.
    pub fn get(&self, id: Uuid) -> Option<Organization> {
        self.organizations
            .lock()
            .unwrap()
            .iter()
            .find(|o| o.id == id)
            .cloned()
    }

    /// Every unverify attempt made against the store, in call order.
    pub fn unverify_calls(&self) -> Vec<Uuid> {
        self.unverify_calls.lock().unwrap().clone()
    }
}

impl Default for MockOrganizationStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BaseOrganizationStore for MockOrganizationStore {
    async fn find_candidates(&self) -> Result<Vec<Organization>> {
        if *self.fail_find.lock().unwrap() {
            return Err(anyhow!("database unavailable"));
        }
        Ok(self.organizations.lock().unwrap().clone())
    }

    async fn unverify(&self, id: Uuid) -> Result<(), LifecycleError> {
        self.unverify_calls.lock().unwrap().push(id);

        let mut organizations = self.organizations.lock().unwrap();
        let Some(organization) = organizations.iter_mut().find(|o| o.id == id) else {
            return Err(LifecycleError::NotFound(format!("organization {}", id)));
        };

        if !organization.is_verified {
            return Err(LifecycleError::Concurrency(format!(
                "organization {} was already unverified",
                id
            )));
        }

        // Mirrors the conditional UPDATE: only the flag and the bookkeeping
        // timestamp move; the aging clock stays put.
        organization.is_verified = false;
        organization.updated_at = Utc::now();
        Ok(())
    }
}
