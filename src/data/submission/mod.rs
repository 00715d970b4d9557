use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

pub mod db;

pub static SUBMISSION_COLLECTION_NAME: &str = "submissions";

/// `Submitted` moves to `Graded` only through grading. There is no way back.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum SubmissionStatus {
    Submitted,
    Graded,
}

impl SubmissionStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            SubmissionStatus::Submitted => "submitted",
            SubmissionStatus::Graded => "graded",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Submission {
    #[serde(rename = "_id", with = "bson::serde_helpers::uuid_1_as_binary")]
    pub id: Uuid,
    #[serde(with = "bson::serde_helpers::uuid_1_as_binary")]
    pub assignment_id: Uuid,
    #[serde(with = "bson::serde_helpers::uuid_1_as_binary")]
    pub student_id: Uuid,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub grade: Option<String>,
    #[serde(default)]
    pub feedback: Option<String>,
    pub status: SubmissionStatus,
    #[serde(default = "Utc::now", with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub submitted_at: DateTime<Utc>,
}

impl Submission {
    pub fn new(assignment_id: Uuid, student_id: Uuid, content: Option<String>) -> Submission {
        Submission {
            id: Uuid::new_v4(),
            assignment_id,
            student_id,
            content,
            grade: None,
            feedback: None,
            status: SubmissionStatus::Submitted,
            submitted_at: Utc::now(),
        }
    }
}

/// Row of the per-assignment submission roster.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SubmissionSummary {
    pub id: Uuid,
    pub student_name: Option<String>,
    pub content: Option<String>,
    pub submitted_at: DateTime<Utc>,
    pub grade: Option<String>,
    pub status: SubmissionStatus,
}

/// Row of a teacher's ungraded queue.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PendingSubmission {
    pub id: Uuid,
    pub student_name: Option<String>,
    pub assignment_title: String,
    pub submitted_at: DateTime<Utc>,
    pub status: SubmissionStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SubmissionDetail {
    pub id: Uuid,
    pub student_name: Option<String>,
    pub content: Option<String>,
    pub submitted_at: DateTime<Utc>,
    pub grade: Option<String>,
    pub feedback: Option<String>,
    pub status: SubmissionStatus,
    pub assignment_title: String,
    pub assignment_description: Option<String>,
}
