use rocket::http::Status;
use rocket::serde::json::Json;
use rocket::State;
use uuid::Uuid;

use crate::config::Config;
use crate::data::user::db::UserSignupData;
use crate::data::user::{DirectoryEntry, ManagedUser};
use crate::data::SharedStore;
use crate::resp::problem::Problem;
use crate::resp::session::Session;
use crate::resp::{Created, Message};
use crate::role::Role;
use crate::service::identity;

#[utoipa::path(
    get,
    path = "/users",
    responses(
        (status = 200, description = "Every account", body = Vec<ManagedUser>),
        (status = 403, description = "Caller isn't an admin", body = Problem),
    ),
    security(("session" = []))
)]
#[get("/")]
#[tracing::instrument(skip(store))]
pub async fn user_list(
    session: Session,
    store: &State<SharedStore>,
) -> Result<Json<Vec<ManagedUser>>, Problem> {
    Ok(Json(identity::list_users(store.inner().as_ref(), &session.caller).await?))
}

#[utoipa::path(
    get,
    path = "/users/public",
    params(
        ("role" = Option<Role>, Query, description = "Only users with this role"),
        ("class_name" = Option<String>, Query, description = "Only users of this class"),
    ),
    responses(
        (status = 200, description = "User directory", body = Vec<DirectoryEntry>),
        (status = 400, description = "Unknown role", body = Problem),
    )
)]
#[get("/public?<role>&<class_name>")]
#[tracing::instrument(skip(store))]
pub async fn user_directory(
    role: Option<&str>,
    class_name: Option<String>,
    store: &State<SharedStore>,
) -> Result<Json<Vec<DirectoryEntry>>, Problem> {
    let role = role
        .filter(|it| !it.is_empty())
        .map(str::parse::<Role>)
        .transpose()?;

    Ok(Json(
        identity::list_directory(store.inner().as_ref(), role, class_name).await?,
    ))
}

#[utoipa::path(
    post,
    path = "/users",
    request_body = UserSignupData,
    responses(
        (status = 201, description = "Account created", body = Created),
        (status = 403, description = "Caller isn't an admin", body = Problem),
        (status = 409, description = "Email already registered", body = Problem),
    ),
    security(("session" = []))
)]
#[post("/", format = "application/json", data = "<create_user>")]
#[tracing::instrument(skip(create_user, store, c))]
pub async fn user_create(
    create_user: Json<UserSignupData>,
    session: Session,
    store: &State<SharedStore>,
    c: &State<Config>,
) -> Result<(Status, Json<Created>), Problem> {
    let user = identity::create_user(
        store.inner().as_ref(),
        &session.caller,
        create_user.into_inner(),
        c.password_cost,
    )
    .await?;

    Ok((Status::Created, Json(Created::new("User created", user.id))))
}

#[utoipa::path(
    delete,
    path = "/users/{id}",
    params(("id" = Uuid, Path, description = "User id")),
    responses(
        (status = 200, description = "Account deleted", body = Message),
        (status = 400, description = "Admins can't delete themselves", body = Problem),
        (status = 403, description = "Caller isn't an admin", body = Problem),
        (status = 404, description = "No such user", body = Problem),
    ),
    security(("session" = []))
)]
#[delete("/<id>")]
#[tracing::instrument(skip(store))]
pub async fn user_delete(
    id: Uuid,
    session: Session,
    store: &State<SharedStore>,
) -> Result<Json<Message>, Problem> {
    identity::delete_user(store.inner().as_ref(), &session.caller, id).await?;
    Ok(Json(Message::new("User deleted")))
}
