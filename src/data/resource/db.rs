use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::ServiceResult;

use super::Resource;

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct ResourceCreateData {
    pub title: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub grade: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct ResourceFilter {
    pub kind: Option<String>,
    pub subject: Option<String>,
    pub author: Option<Uuid>,
}

impl ResourceFilter {
    pub fn matches(&self, resource: &Resource) -> bool {
        self.kind.as_ref().map_or(true, |kind| &resource.kind == kind)
            && self
                .subject
                .as_ref()
                .map_or(true, |subject| resource.subject.as_ref() == Some(subject))
            && self.author.map_or(true, |id| resource.teacher_id == id)
    }
}

#[rocket::async_trait]
pub trait ResourceDb {
    async fn insert_resource(&self, resource: &Resource) -> ServiceResult<()>;

    async fn get_resource(&self, id: Uuid) -> ServiceResult<Option<Resource>>;

    async fn list_resources(&self, filter: &ResourceFilter) -> ServiceResult<Vec<Resource>>;

    async fn delete_resource(&self, id: Uuid) -> ServiceResult<Option<Resource>>;
}
