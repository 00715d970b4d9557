use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

pub mod db;

pub static RESOURCE_COLLECTION_NAME: &str = "resources";

/// Teacher authored material. `content` is opaque (markdown, JSON, ...).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Resource {
    #[serde(rename = "_id", with = "bson::serde_helpers::uuid_1_as_binary")]
    pub id: Uuid,
    pub title: String,
    /// Open set, e.g. `worksheet`, `visual`, `quiz`.
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub subject: Option<String>,
    /// Grade level label, e.g. `Year 5`.
    #[serde(default)]
    pub grade: Option<String>,
    #[serde(with = "bson::serde_helpers::uuid_1_as_binary")]
    pub teacher_id: Uuid,
    #[serde(default = "Utc::now", with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ResourceSummary {
    pub id: Uuid,
    pub title: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub subject: Option<String>,
    pub grade: Option<String>,
    /// `YYYY-MM-DD`
    pub created_at: String,
}

impl From<Resource> for ResourceSummary {
    fn from(r: Resource) -> Self {
        ResourceSummary {
            id: r.id,
            title: r.title,
            kind: r.kind,
            subject: r.subject,
            grade: r.grade,
            created_at: r.created.format("%Y-%m-%d").to_string(),
        }
    }
}
