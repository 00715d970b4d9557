use rocket::http::Status;
use rocket::serde::json::Json;
use rocket::State;
use uuid::Uuid;

use crate::data::assignment::db::AssignmentCreateData;
use crate::data::assignment::{AssignmentDetail, AssignmentView};
use crate::data::SharedStore;
use crate::resp::problem::Problem;
use crate::resp::session::Session;
use crate::resp::Created;
use crate::service::assignments;

#[utoipa::path(
    get,
    path = "/assignments",
    responses(
        (status = 200, description = "Assignments of the caller's classes", body = Vec<AssignmentView>),
        (status = 401, description = "No live session", body = Problem),
    ),
    security(("session" = []))
)]
#[get("/")]
#[tracing::instrument(skip(store))]
pub async fn assignment_list(
    session: Session,
    store: &State<SharedStore>,
) -> Result<Json<Vec<AssignmentView>>, Problem> {
    Ok(Json(assignments::list_visible(store.inner().as_ref(), &session.caller).await?))
}

#[utoipa::path(
    post,
    path = "/assignments",
    request_body = AssignmentCreateData,
    responses(
        (status = 201, description = "Assignment created", body = Created),
        (status = 400, description = "Class missing or not taught by the caller", body = Problem),
        (status = 403, description = "Caller isn't a teacher", body = Problem),
    ),
    security(("session" = []))
)]
#[post("/", format = "application/json", data = "<assignment>")]
#[tracing::instrument(skip(store))]
pub async fn assignment_create(
    assignment: Json<AssignmentCreateData>,
    session: Session,
    store: &State<SharedStore>,
) -> Result<(Status, Json<Created>), Problem> {
    let created = assignments::create(store.inner().as_ref(), &session.caller, assignment.into_inner()).await?;
    Ok((
        Status::Created,
        Json(Created::new("Assignment created", created.id)),
    ))
}

#[utoipa::path(
    get,
    path = "/assignments/{id}",
    params(("id" = Uuid, Path, description = "Assignment id")),
    responses(
        (status = 200, description = "Assignment", body = AssignmentDetail),
        (status = 404, description = "No such assignment", body = Problem),
    ),
    security(("session" = []))
)]
#[get("/<id>")]
#[tracing::instrument(skip(store))]
pub async fn assignment_get(
    id: Uuid,
    _session: Session,
    store: &State<SharedStore>,
) -> Result<Json<AssignmentDetail>, Problem> {
    Ok(Json(assignments::get(store.inner().as_ref(), id).await?))
}

#[cfg(test)]
mod assignment_endpoints {
    use rocket::http::{ContentType, Status};
    use serde_json::{json, Value};
    use uuid::Uuid;

    use crate::role::Role;
    use crate::testing;

    #[rocket::async_test]
    async fn invalid_class_is_bad_request() {
        let (client, _) = testing::client().await;
        let (teacher, _) = testing::signed_in(&client, "tia", Role::Teacher, None).await;

        let response = client
            .post("/api/assignments")
            .cookie(teacher)
            .header(ContentType::JSON)
            .body(json!({"class_id": Uuid::new_v4(), "title": "Ghost"}).to_string())
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::BadRequest);
        let problem: Value = response.into_json().await.expect("problem body");
        assert_eq!(problem["title"], "Invalid class");
    }

    #[rocket::async_test]
    async fn missing_assignment_is_not_found() {
        let (client, _) = testing::client().await;
        let (student, _) = testing::signed_in(&client, "stu", Role::Student, None).await;

        let response = client
            .get(format!("/api/assignments/{}", Uuid::new_v4()))
            .cookie(student)
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::NotFound);
    }
}
