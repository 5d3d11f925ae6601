use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use sqlx::PgPool;
use uuid::Uuid;

use crate::common::LifecycleError;
use crate::kernel::BaseOrganizationStore;

/// Organization - a support provider with a verification status and a set of
/// administrator contacts.
///
/// `last_substantive_edit_at` is the aging clock for the verification
/// lifecycle: reminder and expiry thresholds are measured against it.
/// `updated_at` is row bookkeeping and is deliberately separate, so that
/// system-driven writes (such as the unverify transition) never restart the
/// aging clock.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Organization {
    pub id: Uuid,
    pub name: String,
    pub is_verified: bool,
    pub last_substantive_edit_at: DateTime<Utc>,
    pub administrators: JsonValue, // ordered array of Administrator
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// An administrator contact stored in the organization's JSONB column.
///
/// At most one administrator should carry `is_selected = true`; that contact
/// is the sole recipient of lifecycle notifications.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Administrator {
    pub email: String,
    pub is_selected: bool,
}

impl Organization {
    /// Parse the stored administrator list.
    pub fn administrators(&self) -> Result<Vec<Administrator>, LifecycleError> {
        serde_json::from_value(self.administrators.clone()).map_err(|e| {
            LifecycleError::Validation(format!(
                "administrator list for organization {}: {}",
                self.id, e
            ))
        })
    }

    /// The canonical notification recipient: the first administrator flagged
    /// as selected. A list with several selected entries is normalised to
    /// first-selected-wins with a logged warning; none selected yields `None`.
    pub fn selected_administrator(&self) -> Result<Option<Administrator>, LifecycleError> {
        let mut selected = self
            .administrators()?
            .into_iter()
            .filter(|a| a.is_selected);

        let first = selected.next();
        if first.is_some() && selected.next().is_some() {
            tracing::warn!(
                organization_id = %self.id,
                "multiple administrators flagged as selected; using the first"
            );
        }
        Ok(first)
    }
}

// =============================================================================
// SQL Queries - ALL queries must be in models/
// =============================================================================

impl Organization {
    /// Find organization by ID
    pub async fn find_by_id(id: Uuid, pool: &PgPool) -> Result<Self> {
        let org = sqlx::query_as::<_, Organization>("SELECT * FROM organizations WHERE id = $1")
            .bind(id)
            .fetch_one(pool)
            .await?;
        Ok(org)
    }

    /// Find every organization, oldest edits first.
    ///
    /// The verification scan examines all of them; organisations without a
    /// notifiable administrator are skipped (and counted) in the scan itself
    /// so the batch report accounts for them.
    pub async fn find_all(pool: &PgPool) -> Result<Vec<Self>> {
        let orgs = sqlx::query_as::<_, Organization>(
            "SELECT * FROM organizations ORDER BY last_substantive_edit_at ASC",
        )
        .fetch_all(pool)
        .await?;
        Ok(orgs)
    }

    /// Conditionally flip `is_verified` from true to false.
    ///
    /// The WHERE clause is the optimistic-concurrency check: it only matches
    /// the state observed during the scan. Zero rows affected means either
    /// the row vanished (`NotFound`) or another run already demoted it
    /// (`Concurrency`). `last_substantive_edit_at` is not part of the write.
    pub async fn unverify(id: Uuid, pool: &PgPool) -> Result<(), LifecycleError> {
        let result = sqlx::query(
            r#"
            UPDATE organizations
            SET is_verified = FALSE, updated_at = NOW()
            WHERE id = $1 AND is_verified = TRUE
            "#,
        )
        .bind(id)
        .execute(pool)
        .await
        .map_err(|e| LifecycleError::Transient(format!("unverify write failed: {}", e)))?;

        if result.rows_affected() == 0 {
            let exists: bool =
                sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM organizations WHERE id = $1)")
                    .bind(id)
                    .fetch_one(pool)
                    .await
                    .map_err(|e| {
                        LifecycleError::Transient(format!("existence check failed: {}", e))
                    })?;

            if exists {
                return Err(LifecycleError::Concurrency(format!(
                    "organization {} was already unverified",
                    id
                )));
            }
            return Err(LifecycleError::NotFound(format!("organization {}", id)));
        }

        Ok(())
    }
}

// =============================================================================
// Postgres-backed store
// =============================================================================

/// Production implementation of `BaseOrganizationStore` backed by Postgres.
pub struct PostgresOrganizationStore {
    pool: PgPool,
}

impl PostgresOrganizationStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BaseOrganizationStore for PostgresOrganizationStore {
    async fn find_candidates(&self) -> Result<Vec<Organization>> {
        Organization::find_all(&self.pool).await
    }

    async fn unverify(&self, id: Uuid) -> Result<(), LifecycleError> {
        Organization::unverify(id, &self.pool).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn org_with_admins(admins: JsonValue) -> Organization {
        Organization {
            id: Uuid::new_v4(),
            name: "Test Org".to_string(),
            is_verified: true,
            last_substantive_edit_at: Utc::now(),
            administrators: admins,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn selected_administrator_returns_the_flagged_contact() {
        let org = org_with_admins(json!([
            {"email": "first@example.org", "is_selected": false},
            {"email": "second@example.org", "is_selected": true},
        ]));

        let admin = org.selected_administrator().unwrap().unwrap();
        assert_eq!(admin.email, "second@example.org");
    }

    #[test]
    fn no_selected_administrator_yields_none() {
        let org = org_with_admins(json!([
            {"email": "a@example.org", "is_selected": false},
            {"email": "b@example.org", "is_selected": false},
        ]));

        assert!(org.selected_administrator().unwrap().is_none());
    }

    #[test]
    fn multiple_selected_normalises_to_first() {
        let org = org_with_admins(json!([
            {"email": "winner@example.org", "is_selected": true},
            {"email": "ignored@example.org", "is_selected": true},
        ]));

        let admin = org.selected_administrator().unwrap().unwrap();
        assert_eq!(admin.email, "winner@example.org");
    }

    #[test]
    fn malformed_administrator_list_is_a_validation_error() {
        let org = org_with_admins(json!({"not": "an array"}));

        let err = org.selected_administrator().unwrap_err();
        assert!(matches!(err, LifecycleError::Validation(_)));
    }
}
