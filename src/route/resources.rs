use rocket::http::Status;
use rocket::serde::json::Json;
use rocket::State;
use serde::Deserialize;
use utoipa::IntoParams;
use uuid::Uuid;

use crate::data::resource::db::ResourceCreateData;
use crate::data::resource::ResourceSummary;
use crate::data::SharedStore;
use crate::resp::problem::Problem;
use crate::resp::session::Session;
use crate::resp::{Created, Message};
use crate::service::library;

#[derive(Debug, Default, Deserialize, FromForm, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ResourceQuery {
    /// Resource type, e.g. `worksheet`.
    #[field(name = "type")]
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub subject: Option<String>,
}

#[utoipa::path(
    get,
    path = "/resources",
    params(ResourceQuery),
    responses(
        (status = 200, description = "Library entries", body = Vec<ResourceSummary>),
        (status = 401, description = "No live session", body = Problem),
    ),
    security(("session" = []))
)]
#[get("/?<query..>")]
#[tracing::instrument(skip(store))]
pub async fn resource_list(
    query: ResourceQuery,
    session: Session,
    store: &State<SharedStore>,
) -> Result<Json<Vec<ResourceSummary>>, Problem> {
    Ok(Json(
        library::list(store.inner().as_ref(), &session.caller, query.kind, query.subject).await?,
    ))
}

#[utoipa::path(
    post,
    path = "/resources",
    request_body = ResourceCreateData,
    responses(
        (status = 201, description = "Resource saved", body = Created),
        (status = 403, description = "Caller isn't a teacher", body = Problem),
    ),
    security(("session" = []))
)]
#[post("/", format = "application/json", data = "<resource>")]
#[tracing::instrument(skip(store))]
pub async fn resource_create(
    resource: Json<ResourceCreateData>,
    session: Session,
    store: &State<SharedStore>,
) -> Result<(Status, Json<Created>), Problem> {
    let created = library::create(store.inner().as_ref(), &session.caller, resource.into_inner()).await?;
    Ok((Status::Created, Json(Created::new("Resource saved", created.id))))
}

#[utoipa::path(
    delete,
    path = "/resources/{id}",
    params(("id" = Uuid, Path, description = "Resource id")),
    responses(
        (status = 200, description = "Resource deleted", body = Message),
        (status = 403, description = "Caller isn't the author", body = Problem),
        (status = 404, description = "No such resource", body = Problem),
    ),
    security(("session" = []))
)]
#[delete("/<id>")]
#[tracing::instrument(skip(store))]
pub async fn resource_delete(
    id: Uuid,
    session: Session,
    store: &State<SharedStore>,
) -> Result<Json<Message>, Problem> {
    library::delete(store.inner().as_ref(), &session.caller, id).await?;
    Ok(Json(Message::new("Resource deleted")))
}
