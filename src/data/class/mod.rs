use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

pub mod db;

pub static CLASS_COLLECTION_NAME: &str = "classes";

/// A class taught by one teacher.
///
/// Students aren't linked by id: a student belongs to every class whose
/// `name` equals their `class_name`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Class {
    #[serde(rename = "_id", with = "bson::serde_helpers::uuid_1_as_binary")]
    pub id: Uuid,
    pub name: String,
    #[serde(with = "bson::serde_helpers::uuid_1_as_binary")]
    pub teacher_id: Uuid,
    #[serde(default = "Utc::now", with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created: DateTime<Utc>,
}

impl Class {
    pub fn new(name: impl ToString, teacher_id: Uuid) -> Class {
        Class {
            id: Uuid::new_v4(),
            name: name.to_string(),
            teacher_id,
            created: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ClassResponse {
    pub id: Uuid,
    pub name: String,
    /// Display name of the owning teacher, `null` when the account is gone.
    pub teacher: Option<String>,
}
