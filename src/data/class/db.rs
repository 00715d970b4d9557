use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::ServiceResult;

use super::Class;

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct ClassCreateData {
    pub name: String,
}

#[derive(Debug, Clone, Default)]
pub struct ClassFilter {
    pub teacher: Option<Uuid>,
    pub name: Option<String>,
}

impl ClassFilter {
    pub fn owned_by(teacher: Uuid) -> ClassFilter {
        ClassFilter {
            teacher: Some(teacher),
            name: None,
        }
    }

    pub fn named(name: impl ToString) -> ClassFilter {
        ClassFilter {
            teacher: None,
            name: Some(name.to_string()),
        }
    }

    pub fn matches(&self, class: &Class) -> bool {
        self.teacher.map_or(true, |id| class.teacher_id == id)
            && self.name.as_ref().map_or(true, |name| &class.name == name)
    }
}

#[rocket::async_trait]
pub trait ClassDb {
    async fn insert_class(&self, class: &Class) -> ServiceResult<()>;

    async fn get_class(&self, id: Uuid) -> ServiceResult<Option<Class>>;

    async fn list_classes(&self, filter: &ClassFilter) -> ServiceResult<Vec<Class>>;

    /// Distinct class names, in first-seen order.
    async fn class_names(&self) -> ServiceResult<Vec<String>>;

    async fn delete_class(&self, id: Uuid) -> ServiceResult<Option<Class>>;
}
