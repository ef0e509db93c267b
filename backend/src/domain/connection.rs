//! Linkage between a local user and an external identity-provider account.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::id::RecordId;

/// Persisted provider connection. The (`provider_name`, `provider_id`) pair
/// is unique: one external identity maps to at most one local user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Connection {
    pub id: RecordId,
    pub provider_name: String,
    pub provider_id: String,
    pub user_id: RecordId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Connection {
    /// Build a fresh connection with a generated id.
    pub fn create(
        provider_name: impl Into<String>,
        provider_id: impl Into<String>,
        user_id: RecordId,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: RecordId::random(),
            provider_name: provider_name.into(),
            provider_id: provider_id.into(),
            user_id,
            created_at: now,
            updated_at: now,
        }
    }
}
