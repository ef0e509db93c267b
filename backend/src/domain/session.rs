//! Server-side sessions referenced by the client-held cookie.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::id::RecordId;

/// How long a session stays valid after creation.
pub const SESSION_TTL_DAYS: i64 = 30;

/// Persisted session binding an opaque identifier to a user and an
/// expiration instant. The cookie carries only `id`, never credentials.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub id: RecordId,
    pub user_id: RecordId,
    pub expiration_date: DateTime<Utc>,
}

impl Session {
    /// Create a fresh session for `user_id` expiring [`SESSION_TTL_DAYS`]
    /// from `now`.
    pub fn create(user_id: RecordId, now: DateTime<Utc>) -> Self {
        Self {
            id: RecordId::random(),
            user_id,
            expiration_date: now + Duration::days(SESSION_TTL_DAYS),
        }
    }

    /// Whether the session is still usable at `now`.
    pub fn is_live(&self, now: DateTime<Utc>) -> bool {
        self.expiration_date > now
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn user_id() -> RecordId {
        RecordId::new("u1").expect("valid id")
    }

    #[rstest]
    fn create_sets_thirty_day_expiry() {
        let now = Utc::now();
        let session = Session::create(user_id(), now);
        assert_eq!(session.expiration_date, now + Duration::days(30));
        assert_eq!(session.user_id, user_id());
    }

    #[rstest]
    fn liveness_follows_expiration() {
        let now = Utc::now();
        let session = Session::create(user_id(), now);
        assert!(session.is_live(now));
        assert!(session.is_live(now + Duration::days(29)));
        assert!(!session.is_live(now + Duration::days(31)));
    }
}
