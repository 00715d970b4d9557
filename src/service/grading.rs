use std::collections::HashMap;

use uuid::Uuid;

use crate::caller::{Caller, Teacher};
use crate::data::assignment::Assignment;
use crate::data::class::db::ClassFilter;
use crate::data::submission::db::SubmissionFilter;
use crate::data::submission::{
    PendingSubmission, Submission, SubmissionDetail, SubmissionSummary,
};
use crate::data::Store;
use crate::error::{ServiceError, ServiceResult};

use super::{assignment, class_of, name_of};

/// Walks assignment -> class -> teacher. Every hop can be `NotFound`.
async fn ensure_teaches(
    store: &dyn Store,
    teacher: &Teacher,
    assignment: &Assignment,
) -> ServiceResult<()> {
    let class = class_of(store, assignment).await?;
    if class.teacher_id != teacher.id {
        tracing::debug!(
            "teacher {} doesn't own class {} of assignment {}",
            teacher.id,
            class.id,
            assignment.id
        );
        return Err(ServiceError::forbidden("You don't teach this class."));
    }
    Ok(())
}

async fn submission(store: &dyn Store, id: Uuid) -> ServiceResult<Submission> {
    store
        .get_submission(id)
        .await?
        .ok_or_else(|| ServiceError::not_found("Submission", id))
}

/// Every call creates a new submission, earlier ones are kept.
pub async fn submit(
    store: &dyn Store,
    caller: &Caller,
    assignment_id: Uuid,
    content: Option<String>,
) -> ServiceResult<Submission> {
    let student = caller.student()?;
    let assignment = assignment(store, assignment_id).await?;

    let submission = Submission::new(assignment.id, student.id, content);
    store.insert_submission(&submission).await?;
    tracing::info!(
        "Student {} submitted {} for assignment {}",
        student.id,
        submission.id,
        assignment.id
    );

    Ok(submission)
}

pub async fn list_for_assignment(
    store: &dyn Store,
    caller: &Caller,
    assignment_id: Uuid,
) -> ServiceResult<Vec<SubmissionSummary>> {
    let teacher = caller.teacher()?;
    let assignment = assignment(store, assignment_id).await?;
    ensure_teaches(store, teacher, &assignment).await?;

    let submissions = store
        .list_submissions(&SubmissionFilter::for_assignment(assignment.id))
        .await?;

    let mut summaries = Vec::with_capacity(submissions.len());
    for s in submissions {
        summaries.push(SubmissionSummary {
            student_name: name_of(store, s.student_id).await?,
            id: s.id,
            content: s.content,
            submitted_at: s.submitted_at,
            grade: s.grade,
            status: s.status,
        });
    }
    Ok(summaries)
}

/// Visible to the teacher of the class and to the submitting student.
pub async fn get_submission(
    store: &dyn Store,
    caller: &Caller,
    id: Uuid,
) -> ServiceResult<SubmissionDetail> {
    let submission = submission(store, id).await?;
    let assignment = assignment(store, submission.assignment_id).await?;

    match caller {
        Caller::Teacher(teacher) => ensure_teaches(store, teacher, &assignment).await?,
        Caller::Student(student) if student.id == submission.student_id => {}
        Caller::Student(_) | Caller::Admin(_) => {
            tracing::debug!("{} {} denied submission {}", caller.role(), caller.id(), id);
            return Err(ServiceError::forbidden("You can't view this submission."));
        }
    }

    Ok(SubmissionDetail {
        student_name: name_of(store, submission.student_id).await?,
        id: submission.id,
        content: submission.content,
        submitted_at: submission.submitted_at,
        grade: submission.grade,
        feedback: submission.feedback,
        status: submission.status,
        assignment_title: assignment.title,
        assignment_description: assignment.description,
    })
}

/// Sets grade and feedback, replacing earlier values, and marks the
/// submission graded.
pub async fn grade(
    store: &dyn Store,
    caller: &Caller,
    id: Uuid,
    grade: Option<String>,
    feedback: Option<String>,
) -> ServiceResult<Submission> {
    let teacher = caller.teacher()?;
    let submission = submission(store, id).await?;
    let assignment = assignment(store, submission.assignment_id).await?;
    ensure_teaches(store, teacher, &assignment).await?;

    let graded = store
        .record_grade(id, grade, feedback)
        .await?
        .ok_or_else(|| ServiceError::not_found("Submission", id))?;
    tracing::info!("Teacher {} graded submission {}", teacher.id, id);

    Ok(graded)
}

/// Ungraded submissions across every class the teacher owns.
pub async fn list_pending(
    store: &dyn Store,
    caller: &Caller,
) -> ServiceResult<Vec<PendingSubmission>> {
    let teacher = caller.teacher()?;

    let classes = store.list_classes(&ClassFilter::owned_by(teacher.id)).await?;
    let class_ids: Vec<Uuid> = classes.iter().map(|it| it.id).collect();
    let titles: HashMap<Uuid, String> = store
        .assignments_in(&class_ids)
        .await?
        .into_iter()
        .map(|it| (it.id, it.title))
        .collect();

    let filter = SubmissionFilter {
        assignments: Some(titles.keys().copied().collect()),
        student: None,
        ungraded_only: true,
    };

    let mut pending = vec![];
    for s in store.list_submissions(&filter).await? {
        pending.push(PendingSubmission {
            student_name: name_of(store, s.student_id).await?,
            assignment_title: titles.get(&s.assignment_id).cloned().unwrap_or_default(),
            id: s.id,
            submitted_at: s.submitted_at,
            status: s.status,
        });
    }
    Ok(pending)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::assignment::db::AssignmentCreateData;
    use crate::data::assignment::db::AssignmentDb;
    use crate::data::class::db::ClassDb;
    use crate::data::class::db::ClassCreateData;
    use crate::data::memory::MemoryStore;
    use crate::data::submission::SubmissionStatus;
    use crate::data::user::db::UserSignupData;
    use crate::role::Role;
    use crate::service::{assignments, identity, roster};
    use crate::testing::{self, TEST_COST};

    struct Classroom {
        store: MemoryStore,
        teacher: Caller,
        student: Caller,
        assignment: Uuid,
    }

    async fn classroom() -> Classroom {
        let store = MemoryStore::new();
        let teacher = testing::enroll(&store, "tina", Role::Teacher, None).await;
        let student = testing::enroll(&store, "sid", Role::Student, Some("5A")).await;
        let class = roster::create(&store, &teacher, ClassCreateData { name: "5A".into() })
            .await
            .unwrap();
        let assignment = assignments::create(
            &store,
            &teacher,
            AssignmentCreateData {
                class_id: class.id,
                title: "Essay".into(),
                subject: None,
                description: Some("Write about spring".into()),
                due_date: None,
                status: None,
            },
        )
        .await
        .unwrap();

        Classroom {
            store,
            teacher,
            student,
            assignment: assignment.id,
        }
    }

    #[rocket::async_test]
    async fn submit_grade_and_pending_queue() {
        let store = MemoryStore::new();
        let teacher = testing::enroll(&store, "T", Role::Teacher, None).await;
        let class = roster::create(&store, &teacher, ClassCreateData { name: "5A".into() })
            .await
            .unwrap();

        let registered = identity::register(
            &store,
            UserSignupData {
                name: "S".into(),
                email: "s@example.com".into(),
                password: "pw".into(),
                role: Role::Student,
                pin: Some("1111".into()),
                class_name: Some("5A".into()),
            },
            TEST_COST,
        )
        .await
        .unwrap();
        let student = Caller::from(&registered);

        let a = assignments::create(
            &store,
            &teacher,
            AssignmentCreateData {
                class_id: class.id,
                title: "A".into(),
                subject: None,
                description: None,
                due_date: None,
                status: None,
            },
        )
        .await
        .unwrap();

        let submitted = submit(&store, &student, a.id, Some("hello".into()))
            .await
            .unwrap();
        assert_eq!(submitted.status, SubmissionStatus::Submitted);

        let pending = list_pending(&store, &teacher).await.unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].id, submitted.id);
        assert_eq!(pending[0].student_name.as_deref(), Some("S"));
        assert_eq!(pending[0].assignment_title, "A");

        let graded = grade(&store, &teacher, submitted.id, Some("B+".into()), Some("Nice".into()))
            .await
            .unwrap();
        assert_eq!(graded.status, SubmissionStatus::Graded);
        assert_eq!(graded.grade.as_deref(), Some("B+"));

        assert!(list_pending(&store, &teacher).await.unwrap().is_empty());
    }

    #[rocket::async_test]
    async fn regrading_keeps_only_the_last_values() {
        let room = classroom().await;
        let s = submit(&room.store, &room.student, room.assignment, Some("x".into()))
            .await
            .unwrap();

        grade(&room.store, &room.teacher, s.id, Some("C".into()), Some("Meh".into()))
            .await
            .unwrap();
        grade(&room.store, &room.teacher, s.id, Some("A".into()), Some("Great".into()))
            .await
            .unwrap();

        let detail = get_submission(&room.store, &room.student, s.id).await.unwrap();
        assert_eq!(detail.status, SubmissionStatus::Graded);
        assert_eq!(detail.grade.as_deref(), Some("A"));
        assert_eq!(detail.feedback.as_deref(), Some("Great"));
        assert_eq!(detail.assignment_title, "Essay");
        assert_eq!(detail.assignment_description.as_deref(), Some("Write about spring"));
    }

    #[rocket::async_test]
    async fn resubmitting_adds_rows() {
        let room = classroom().await;
        submit(&room.store, &room.student, room.assignment, Some("v1".into()))
            .await
            .unwrap();
        submit(&room.store, &room.student, room.assignment, Some("v2".into()))
            .await
            .unwrap();

        let roster = list_for_assignment(&room.store, &room.teacher, room.assignment)
            .await
            .unwrap();
        let contents: Vec<_> = roster.iter().map(|it| it.content.as_deref()).collect();
        assert_eq!(contents, vec![Some("v1"), Some("v2")]);
        assert!(roster.iter().all(|it| it.student_name.as_deref() == Some("sid")));
    }

    #[rocket::async_test]
    async fn only_students_submit_to_existing_assignments() {
        let room = classroom().await;

        assert!(matches!(
            submit(&room.store, &room.teacher, room.assignment, None).await,
            Err(ServiceError::Forbidden(_))
        ));
        assert!(matches!(
            submit(&room.store, &room.student, Uuid::new_v4(), None).await,
            Err(ServiceError::NotFound { kind: "Assignment", .. })
        ));
    }

    #[rocket::async_test]
    async fn ownership_chain_guards_teacher_operations() {
        let room = classroom().await;
        let stranger = testing::enroll(&room.store, "stranger", Role::Teacher, None).await;
        let classmate = testing::enroll(&room.store, "mate", Role::Student, Some("5A")).await;
        let admin = testing::enroll(&room.store, "adm", Role::Admin, None).await;
        let s = submit(&room.store, &room.student, room.assignment, None)
            .await
            .unwrap();

        assert!(matches!(
            list_for_assignment(&room.store, &stranger, room.assignment).await,
            Err(ServiceError::Forbidden(_))
        ));
        assert!(matches!(
            list_for_assignment(&room.store, &room.student, room.assignment).await,
            Err(ServiceError::Forbidden(_))
        ));
        assert!(matches!(
            grade(&room.store, &stranger, s.id, Some("F".into()), None).await,
            Err(ServiceError::Forbidden(_))
        ));
        assert!(matches!(
            grade(&room.store, &room.student, s.id, Some("A+".into()), None).await,
            Err(ServiceError::Forbidden(_))
        ));
        for denied in [&stranger, &classmate, &admin] {
            assert!(matches!(
                get_submission(&room.store, denied, s.id).await,
                Err(ServiceError::Forbidden(_))
            ));
        }
        assert!(get_submission(&room.store, &room.teacher, s.id).await.is_ok());

        assert!(matches!(
            grade(&room.store, &room.teacher, Uuid::new_v4(), None, None).await,
            Err(ServiceError::NotFound { kind: "Submission", .. })
        ));
        assert!(matches!(
            list_pending(&room.store, &room.student).await,
            Err(ServiceError::Forbidden(_))
        ));
    }

    #[rocket::async_test]
    async fn deleted_class_breaks_the_chain_with_not_found() {
        let room = classroom().await;
        let s = submit(&room.store, &room.student, room.assignment, None)
            .await
            .unwrap();
        let class_id = room
            .store
            .get_assignment(room.assignment)
            .await
            .unwrap()
            .unwrap()
            .class_id;
        room.store.delete_class(class_id).await.unwrap();

        assert!(matches!(
            grade(&room.store, &room.teacher, s.id, None, None).await,
            Err(ServiceError::NotFound { kind: "Class", .. })
        ));
    }
}
