use std::collections::HashMap;

use chrono::Utc;
use uuid::Uuid;

use crate::caller::Caller;
use crate::data::assignment::db::AssignmentCreateData;
use crate::data::assignment::{Assignment, AssignmentDetail, AssignmentView, ProgressStatus};
use crate::data::class::db::ClassFilter;
use crate::data::class::Class;
use crate::data::submission::db::SubmissionFilter;
use crate::data::submission::Submission;
use crate::data::Store;
use crate::error::{ServiceError, ServiceResult};
use crate::util::parse_iso_date;

use super::roster::classes_named;

/// Assignment list of the caller. Students additionally get their own
/// progress, taken from their first submission of each assignment.
pub async fn list_visible(store: &dyn Store, caller: &Caller) -> ServiceResult<Vec<AssignmentView>> {
    let classes: Vec<Class> = match caller {
        Caller::Student(student) => classes_named(store, student.class_name.as_deref()).await?,
        Caller::Teacher(teacher) => store.list_classes(&ClassFilter::owned_by(teacher.id)).await?,
        Caller::Admin(_) => vec![],
    };
    if classes.is_empty() {
        return Ok(vec![]);
    }

    let class_ids: Vec<Uuid> = classes.iter().map(|it| it.id).collect();
    let class_names: HashMap<Uuid, String> = classes
        .into_iter()
        .map(|it| (it.id, it.name))
        .collect();
    let assignments = store.assignments_in(&class_ids).await?;

    let first: HashMap<Uuid, Submission> = match caller {
        Caller::Student(student) => {
            let filter = SubmissionFilter {
                assignments: Some(assignments.iter().map(|it| it.id).collect()),
                student: Some(student.id),
                ungraded_only: false,
            };
            // oldest first
            let mut first = HashMap::new();
            for it in store.list_submissions(&filter).await? {
                first.entry(it.assignment_id).or_insert(it);
            }
            first
        }
        _ => HashMap::new(),
    };

    Ok(assignments
        .into_iter()
        .map(|a| {
            let progress = first.get(&a.id);
            AssignmentView {
                class_name: class_names.get(&a.class_id).cloned().unwrap_or_default(),
                submission_status: progress
                    .map(|it| ProgressStatus::from(it.status))
                    .unwrap_or(ProgressStatus::Pending),
                grade: progress.and_then(|it| it.grade.clone()),
                id: a.id,
                title: a.title,
                subject: a.subject,
                description: a.description,
                due_date: a.due_date,
                status: a.status,
            }
        })
        .collect())
}

/// Only the teacher owning `class_id` may add to it. A missing class and a
/// foreign class both fail with [`ServiceError::InvalidClass`].
pub async fn create(
    store: &dyn Store,
    caller: &Caller,
    data: AssignmentCreateData,
) -> ServiceResult<Assignment> {
    let teacher = caller.teacher()?;

    match store.get_class(data.class_id).await? {
        Some(class) if class.teacher_id == teacher.id => {}
        _ => {
            tracing::debug!("teacher {} can't use class {}", teacher.id, data.class_id);
            return Err(ServiceError::InvalidClass);
        }
    }

    if data.title.trim().is_empty() {
        return Err(ServiceError::Validation("Title can't be empty.".to_string()));
    }

    let due_date = data
        .due_date
        .as_deref()
        .filter(|it| !it.is_empty())
        .map(parse_iso_date)
        .transpose()?;

    let assignment = Assignment {
        id: Uuid::new_v4(),
        title: data.title,
        subject: data.subject,
        description: data.description,
        due_date,
        class_id: data.class_id,
        status: data.status.unwrap_or_default(),
        created: Utc::now(),
    };
    store.insert_assignment(&assignment).await?;
    tracing::info!("Created assignment {} in class {}", assignment.id, assignment.class_id);

    Ok(assignment)
}

/// Readable by any signed in user.
pub async fn get(store: &dyn Store, id: Uuid) -> ServiceResult<AssignmentDetail> {
    Ok(AssignmentDetail::from(super::assignment(store, id).await?))
}
