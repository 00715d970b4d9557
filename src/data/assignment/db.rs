use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::ServiceResult;

use super::{Assignment, AssignmentStatus};

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct AssignmentCreateData {
    pub class_id: Uuid,
    pub title: String,
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    /// ISO 8601 date or date-time.
    #[serde(default)]
    pub due_date: Option<String>,
    #[serde(default)]
    pub status: Option<AssignmentStatus>,
}

#[rocket::async_trait]
pub trait AssignmentDb {
    async fn insert_assignment(&self, assignment: &Assignment) -> ServiceResult<()>;

    async fn get_assignment(&self, id: Uuid) -> ServiceResult<Option<Assignment>>;

    /// Assignments belonging to any of `classes`, in creation order.
    async fn assignments_in(&self, classes: &[Uuid]) -> ServiceResult<Vec<Assignment>>;
}
