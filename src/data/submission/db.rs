use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::ServiceResult;

use super::{Submission, SubmissionStatus};

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct SubmissionCreateData {
    pub assignment_id: Uuid,
    #[serde(default)]
    pub content: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct GradeData {
    #[serde(default)]
    pub grade: Option<String>,
    #[serde(default)]
    pub feedback: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct SubmissionFilter {
    /// `None` doesn't restrict, an empty list matches nothing.
    pub assignments: Option<Vec<Uuid>>,
    pub student: Option<Uuid>,
    pub ungraded_only: bool,
}

impl SubmissionFilter {
    pub fn for_assignment(id: Uuid) -> SubmissionFilter {
        SubmissionFilter {
            assignments: Some(vec![id]),
            ..Default::default()
        }
    }

    pub fn matches(&self, submission: &Submission) -> bool {
        self.assignments
            .as_ref()
            .map_or(true, |ids| ids.contains(&submission.assignment_id))
            && self.student.map_or(true, |id| submission.student_id == id)
            && !(self.ungraded_only && submission.status == SubmissionStatus::Graded)
    }
}

#[rocket::async_trait]
pub trait SubmissionDb {
    async fn insert_submission(&self, submission: &Submission) -> ServiceResult<()>;

    async fn get_submission(&self, id: Uuid) -> ServiceResult<Option<Submission>>;

    /// Matching submissions, oldest first.
    async fn list_submissions(&self, filter: &SubmissionFilter) -> ServiceResult<Vec<Submission>>;

    /// Overwrites grade and feedback and marks the submission graded.
    /// Concurrent calls are last-writer-wins. Returns `None` when the
    /// submission doesn't exist.
    async fn record_grade(
        &self,
        id: Uuid,
        grade: Option<String>,
        feedback: Option<String>,
    ) -> ServiceResult<Option<Submission>>;
}
