use rocket::http::Status;
use rocket::serde::json::Json;
use rocket::State;
use uuid::Uuid;

use crate::data::class::db::ClassCreateData;
use crate::data::class::ClassResponse;
use crate::data::SharedStore;
use crate::resp::problem::Problem;
use crate::resp::session::Session;
use crate::resp::{Created, Message};
use crate::service::roster;

/// Classes visible to the caller: owned ones for teachers, the class named
/// like their own for students, all of them for admins.
#[utoipa::path(
    get,
    path = "/classes",
    responses(
        (status = 200, description = "Visible classes", body = Vec<ClassResponse>),
        (status = 401, description = "No live session", body = Problem),
    ),
    security(("session" = []))
)]
#[get("/")]
#[tracing::instrument(skip(store))]
pub async fn class_list(
    session: Session,
    store: &State<SharedStore>,
) -> Result<Json<Vec<ClassResponse>>, Problem> {
    Ok(Json(roster::list_visible(store.inner().as_ref(), &session.caller).await?))
}

#[utoipa::path(
    post,
    path = "/classes",
    request_body = ClassCreateData,
    responses(
        (status = 201, description = "Class created", body = Created),
        (status = 403, description = "Caller is a student", body = Problem),
    ),
    security(("session" = []))
)]
#[post("/", format = "application/json", data = "<class>")]
#[tracing::instrument(skip(store))]
pub async fn class_create(
    class: Json<ClassCreateData>,
    session: Session,
    store: &State<SharedStore>,
) -> Result<(Status, Json<Created>), Problem> {
    let class = roster::create(store.inner().as_ref(), &session.caller, class.into_inner()).await?;
    Ok((Status::Created, Json(Created::new("Class created", class.id))))
}

#[utoipa::path(
    get,
    path = "/classes/public",
    responses(
        (status = 200, description = "Every class", body = Vec<ClassResponse>),
    )
)]
#[get("/public")]
#[tracing::instrument(skip(store))]
pub async fn class_public(store: &State<SharedStore>) -> Result<Json<Vec<ClassResponse>>, Problem> {
    Ok(Json(roster::public_classes(store.inner().as_ref()).await?))
}

#[utoipa::path(
    delete,
    path = "/classes/{id}",
    params(("id" = Uuid, Path, description = "Class id")),
    responses(
        (status = 200, description = "Class deleted", body = Message),
        (status = 403, description = "Not the owner or an admin", body = Problem),
        (status = 404, description = "No such class", body = Problem),
    ),
    security(("session" = []))
)]
#[delete("/<id>")]
#[tracing::instrument(skip(store))]
pub async fn class_delete(
    id: Uuid,
    session: Session,
    store: &State<SharedStore>,
) -> Result<Json<Message>, Problem> {
    roster::delete(store.inner().as_ref(), &session.caller, id).await?;
    Ok(Json(Message::new("Class deleted")))
}
