use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::data::submission::SubmissionStatus;

pub mod db;

pub static ASSIGNMENT_COLLECTION_NAME: &str = "assignments";

/// Set when the assignment is created. Submissions never change it.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum AssignmentStatus {
    #[default]
    Pending,
    Completed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Assignment {
    #[serde(rename = "_id", with = "bson::serde_helpers::uuid_1_as_binary")]
    pub id: Uuid,
    pub title: String,
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub due_date: Option<DateTime<Utc>>,
    #[serde(with = "bson::serde_helpers::uuid_1_as_binary")]
    pub class_id: Uuid,
    #[serde(default)]
    pub status: AssignmentStatus,
    #[serde(default = "Utc::now", with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created: DateTime<Utc>,
}

/// Progress of the caller on an assignment, as shown in the assignment
/// list. Teachers always see `pending`.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ProgressStatus {
    Pending,
    Submitted,
    Graded,
}

impl From<SubmissionStatus> for ProgressStatus {
    fn from(status: SubmissionStatus) -> Self {
        match status {
            SubmissionStatus::Submitted => ProgressStatus::Submitted,
            SubmissionStatus::Graded => ProgressStatus::Graded,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AssignmentView {
    pub id: Uuid,
    pub title: String,
    pub subject: Option<String>,
    pub description: Option<String>,
    pub due_date: Option<DateTime<Utc>>,
    pub status: AssignmentStatus,
    pub class_name: String,
    pub submission_status: ProgressStatus,
    pub grade: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AssignmentDetail {
    pub id: Uuid,
    pub title: String,
    pub subject: Option<String>,
    pub description: Option<String>,
    pub due_date: Option<DateTime<Utc>>,
    pub status: AssignmentStatus,
    pub class_id: Uuid,
}

impl From<Assignment> for AssignmentDetail {
    fn from(a: Assignment) -> Self {
        AssignmentDetail {
            id: a.id,
            title: a.title,
            subject: a.subject,
            description: a.description,
            due_date: a.due_date,
            status: a.status,
            class_id: a.class_id,
        }
    }
}
