use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ServiceResult;

pub static SESSION_COLLECTION_NAME: &str = "sessions";

/// Server side half of a login. The cookie only names it, so deleting the
/// record ends the session right away.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionRecord {
    #[serde(rename = "_id", with = "bson::serde_helpers::uuid_1_as_binary")]
    pub id: Uuid,
    #[serde(with = "bson::serde_helpers::uuid_1_as_binary")]
    pub user_id: Uuid,
    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created: DateTime<Utc>,
    /// Backs the TTL index, must stay a BSON date.
    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub expires: DateTime<Utc>,
}

impl SessionRecord {
    pub fn new(user_id: Uuid, lifetime: Duration) -> SessionRecord {
        let now = Utc::now();
        SessionRecord {
            id: Uuid::new_v4(),
            user_id,
            created: now,
            expires: now + lifetime,
        }
    }

    pub fn is_expired(&self) -> bool {
        self.expires <= Utc::now()
    }
}

#[rocket::async_trait]
pub trait SessionDb {
    async fn insert_session(&self, session: &SessionRecord) -> ServiceResult<()>;

    async fn get_session(&self, id: Uuid) -> ServiceResult<Option<SessionRecord>>;

    async fn delete_session(&self, id: Uuid) -> ServiceResult<()>;
}
