use rocket::http::Status;
use rocket::serde::json::Json;
use rocket::State;
use uuid::Uuid;

use crate::data::submission::db::{GradeData, SubmissionCreateData};
use crate::data::submission::{PendingSubmission, SubmissionDetail, SubmissionSummary};
use crate::data::SharedStore;
use crate::resp::problem::Problem;
use crate::resp::session::Session;
use crate::resp::{Created, Message};
use crate::service::grading;

#[utoipa::path(
    post,
    path = "/submissions",
    request_body = SubmissionCreateData,
    responses(
        (status = 201, description = "Submission stored", body = Created),
        (status = 403, description = "Caller isn't a student", body = Problem),
        (status = 404, description = "No such assignment", body = Problem),
    ),
    security(("session" = []))
)]
#[post("/", format = "application/json", data = "<submission>")]
#[tracing::instrument(skip(store))]
pub async fn submission_create(
    submission: Json<SubmissionCreateData>,
    session: Session,
    store: &State<SharedStore>,
) -> Result<(Status, Json<Created>), Problem> {
    let SubmissionCreateData {
        assignment_id,
        content,
    } = submission.into_inner();
    let created = grading::submit(store.inner().as_ref(), &session.caller, assignment_id, content).await?;

    Ok((
        Status::Created,
        Json(Created::new("Assignment submitted", created.id)),
    ))
}

#[utoipa::path(
    get,
    path = "/submissions/assignment/{id}",
    params(("id" = Uuid, Path, description = "Assignment id")),
    responses(
        (status = 200, description = "Submissions for the assignment", body = Vec<SubmissionSummary>),
        (status = 403, description = "Caller doesn't teach the class", body = Problem),
        (status = 404, description = "No such assignment", body = Problem),
    ),
    security(("session" = []))
)]
#[get("/assignment/<id>")]
#[tracing::instrument(skip(store))]
pub async fn submission_list(
    id: Uuid,
    session: Session,
    store: &State<SharedStore>,
) -> Result<Json<Vec<SubmissionSummary>>, Problem> {
    Ok(Json(
        grading::list_for_assignment(store.inner().as_ref(), &session.caller, id).await?,
    ))
}

#[utoipa::path(
    get,
    path = "/submissions/pending",
    responses(
        (status = 200, description = "Ungraded submissions in the caller's classes", body = Vec<PendingSubmission>),
        (status = 403, description = "Caller isn't a teacher", body = Problem),
    ),
    security(("session" = []))
)]
#[get("/pending")]
#[tracing::instrument(skip(store))]
pub async fn submission_pending(
    session: Session,
    store: &State<SharedStore>,
) -> Result<Json<Vec<PendingSubmission>>, Problem> {
    Ok(Json(grading::list_pending(store.inner().as_ref(), &session.caller).await?))
}

#[utoipa::path(
    get,
    path = "/submissions/{id}",
    params(("id" = Uuid, Path, description = "Submission id")),
    responses(
        (status = 200, description = "Submission", body = SubmissionDetail),
        (status = 403, description = "Neither the teacher nor the author", body = Problem),
        (status = 404, description = "No such submission", body = Problem),
    ),
    security(("session" = []))
)]
#[get("/<id>")]
#[tracing::instrument(skip(store))]
pub async fn submission_get(
    id: Uuid,
    session: Session,
    store: &State<SharedStore>,
) -> Result<Json<SubmissionDetail>, Problem> {
    Ok(Json(grading::get_submission(store.inner().as_ref(), &session.caller, id).await?))
}

#[utoipa::path(
    post,
    path = "/submissions/{id}/grade",
    params(("id" = Uuid, Path, description = "Submission id")),
    request_body = GradeData,
    responses(
        (status = 200, description = "Grade saved", body = Message),
        (status = 403, description = "Caller doesn't teach the class", body = Problem),
        (status = 404, description = "No such submission", body = Problem),
    ),
    security(("session" = []))
)]
#[post("/<id>/grade", format = "application/json", data = "<grade>")]
#[tracing::instrument(skip(store))]
pub async fn submission_grade(
    id: Uuid,
    grade: Json<GradeData>,
    session: Session,
    store: &State<SharedStore>,
) -> Result<Json<Message>, Problem> {
    let GradeData { grade, feedback } = grade.into_inner();
    grading::grade(store.inner().as_ref(), &session.caller, id, grade, feedback).await?;
    Ok(Json(Message::new("Grade saved")))
}

#[cfg(test)]
mod submission_endpoints {
    use rocket::http::{ContentType, Cookie, Status};
    use rocket::local::asynchronous::Client;
    use serde_json::{json, Value};

    use crate::role::Role;
    use crate::testing;

    async fn created_id(client: &Client, uri: &str, cookie: &Cookie<'static>, body: Value) -> String {
        let response = client
            .post(uri.to_string())
            .cookie(cookie.clone())
            .header(ContentType::JSON)
            .body(body.to_string())
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::Created, "POST {} failed", uri);
        let created: Value = response.into_json().await.expect("json body");
        created["id"].as_str().expect("created id").to_string()
    }

    #[rocket::async_test]
    async fn submit_then_grade_clears_pending_queue() {
        let (client, _) = testing::client().await;
        let (teacher, _) = testing::signed_in(&client, "T", Role::Teacher, None).await;
        let class = created_id(&client, "/api/classes", &teacher, json!({"name": "5A"})).await;
        let (student, _) = testing::signed_in(&client, "S", Role::Student, Some("5A")).await;
        let assignment = created_id(
            &client,
            "/api/assignments",
            &teacher,
            json!({"class_id": class, "title": "A", "due_date": "2030-01-31"}),
        )
        .await;

        let listed: Vec<Value> = client
            .get("/api/assignments")
            .cookie(student.clone())
            .dispatch()
            .await
            .into_json()
            .await
            .expect("json body");
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0]["submission_status"], "pending");

        let submission = created_id(
            &client,
            "/api/submissions",
            &student,
            json!({"assignment_id": assignment, "content": "hello"}),
        )
        .await;

        let detail: Value = client
            .get(format!("/api/submissions/{}", submission))
            .cookie(student.clone())
            .dispatch()
            .await
            .into_json()
            .await
            .expect("json body");
        assert_eq!(detail["status"], "submitted");

        let pending: Vec<Value> = client
            .get("/api/submissions/pending")
            .cookie(teacher.clone())
            .dispatch()
            .await
            .into_json()
            .await
            .expect("json body");
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0]["id"], submission.as_str());

        let response = client
            .post(format!("/api/submissions/{}/grade", submission))
            .cookie(student.clone())
            .header(ContentType::JSON)
            .body(json!({"grade": "A+"}).to_string())
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::Forbidden);

        let response = client
            .post(format!("/api/submissions/{}/grade", submission))
            .cookie(teacher.clone())
            .header(ContentType::JSON)
            .body(json!({"grade": "B+", "feedback": "Nice"}).to_string())
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::Ok);

        let detail: Value = client
            .get(format!("/api/submissions/{}", submission))
            .cookie(teacher.clone())
            .dispatch()
            .await
            .into_json()
            .await
            .expect("json body");
        assert_eq!(detail["status"], "graded");
        assert_eq!(detail["grade"], "B+");
        assert_eq!(detail["feedback"], "Nice");

        let roster: Vec<Value> = client
            .get(format!("/api/submissions/assignment/{}", assignment))
            .cookie(teacher.clone())
            .dispatch()
            .await
            .into_json()
            .await
            .expect("json body");
        assert_eq!(roster.len(), 1);
        assert_eq!(roster[0]["student_name"], "S");

        let pending: Vec<Value> = client
            .get("/api/submissions/pending")
            .cookie(teacher)
            .dispatch()
            .await
            .into_json()
            .await
            .expect("json body");
        assert!(pending.is_empty());

        let listed: Vec<Value> = client
            .get("/api/assignments")
            .cookie(student)
            .dispatch()
            .await
            .into_json()
            .await
            .expect("json body");
        assert_eq!(listed[0]["submission_status"], "graded");
        assert_eq!(listed[0]["grade"], "B+");
    }
}
