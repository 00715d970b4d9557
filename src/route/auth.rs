use rocket::http::{CookieJar, Status};
use rocket::serde::json::Json;
use rocket::State;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::config::Config;
use crate::data::user::db::{ProfileUpdateData, UserLoginData, UserSignupData};
use crate::data::user::{PublicUser, UserResponse};
use crate::data::SharedStore;
use crate::resp::problem::{problems::auth_problem, Problem};
use crate::resp::session::{attach_cookie, remove_cookie, Session};
use crate::resp::{Created, Message};
use crate::role::Role;
use crate::security::Security;
use crate::service::{identity, roster};

/// Login and profile update answer.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserMessage {
    pub message: String,
    pub user: UserResponse,
}

#[utoipa::path(
    post,
    path = "/auth/register",
    request_body = UserSignupData,
    responses(
        (status = 201, description = "Account created", body = Created),
        (status = 400, description = "Invalid signup data", body = Problem),
        (status = 409, description = "Email already registered", body = Problem),
    )
)]
#[post("/register", format = "application/json", data = "<signup>")]
#[tracing::instrument(skip(signup, store, c))]
pub async fn register(
    signup: Json<UserSignupData>,
    store: &State<SharedStore>,
    c: &State<Config>,
) -> Result<(Status, Json<Created>), Problem> {
    let user = identity::register(store.inner().as_ref(), signup.into_inner(), c.password_cost).await?;

    Ok((
        Status::Created,
        Json(Created::new("User registered successfully", user.id)),
    ))
}

#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = UserLoginData,
    responses(
        (status = 200, description = "Logged in, session cookie set", body = UserMessage),
        (status = 401, description = "Invalid credentials", body = Problem),
    )
)]
#[post("/login", format = "application/json", data = "<login>")]
#[tracing::instrument(skip(login, cookies, store, security, c))]
pub async fn login(
    login: Json<UserLoginData>,
    cookies: &CookieJar<'_>,
    store: &State<SharedStore>,
    security: &State<Security>,
    c: &State<Config>,
) -> Result<Json<UserMessage>, Problem> {
    let credentials = login
        .credentials()
        .ok_or_else(|| auth_problem("Provide user_id and pin, or email and password."))?;

    let user = identity::authenticate(store.inner().as_ref(), credentials).await?;
    let session = identity::open_session(store.inner().as_ref(), &user, c.session_lifetime()).await?;
    attach_cookie(cookies, &session, security, c)?;

    Ok(Json(UserMessage {
        message: "Logged in successfully".to_string(),
        user: UserResponse::from(&user),
    }))
}

#[utoipa::path(
    post,
    path = "/auth/logout",
    responses(
        (status = 200, description = "Session closed", body = Message),
        (status = 401, description = "No live session", body = Problem),
    ),
    security(("session" = []))
)]
#[post("/logout")]
#[tracing::instrument(skip(cookies, store))]
pub async fn logout(
    session: Session,
    cookies: &CookieJar<'_>,
    store: &State<SharedStore>,
) -> Result<Json<Message>, Problem> {
    identity::close_session(store.inner().as_ref(), session.id).await?;
    remove_cookie(cookies);

    Ok(Json(Message::new("Logged out successfully")))
}

#[utoipa::path(
    get,
    path = "/auth/me",
    responses(
        (status = 200, description = "Current identity", body = UserResponse),
        (status = 401, description = "No live session", body = Problem),
    ),
    security(("session" = []))
)]
#[get("/me")]
#[tracing::instrument(skip(store))]
pub async fn me(session: Session, store: &State<SharedStore>) -> Result<Json<UserResponse>, Problem> {
    let user = identity::me(store.inner().as_ref(), &session.caller).await?;
    Ok(Json(UserResponse::from(&user)))
}

#[utoipa::path(
    put,
    path = "/auth/profile",
    request_body = ProfileUpdateData,
    responses(
        (status = 200, description = "Profile updated", body = UserMessage),
        (status = 400, description = "New PIN isn't 4 digits", body = Problem),
        (status = 403, description = "Current PIN doesn't match", body = Problem),
    ),
    security(("session" = []))
)]
#[put("/profile", format = "application/json", data = "<update>")]
#[tracing::instrument(skip(update, store))]
pub async fn update_profile(
    update: Json<ProfileUpdateData>,
    session: Session,
    store: &State<SharedStore>,
) -> Result<Json<UserMessage>, Problem> {
    let user = identity::update_profile(store.inner().as_ref(), &session.caller, update.into_inner()).await?;

    Ok(Json(UserMessage {
        message: "Profile updated successfully".to_string(),
        user: UserResponse::from(&user),
    }))
}

#[utoipa::path(
    get,
    path = "/auth/public/classes",
    responses(
        (status = 200, description = "Distinct class names", body = Vec<String>),
    )
)]
#[get("/public/classes")]
#[tracing::instrument(skip(store))]
pub async fn public_class_names(store: &State<SharedStore>) -> Result<Json<Vec<String>>, Problem> {
    Ok(Json(roster::public_class_names(store.inner().as_ref()).await?))
}

#[utoipa::path(
    get,
    path = "/auth/public/users",
    params(
        ("role" = Option<Role>, Query, description = "Only users with this role"),
        ("class_name" = Option<String>, Query, description = "Only students of this class"),
    ),
    responses(
        (status = 200, description = "Login selection list", body = Vec<PublicUser>),
        (status = 400, description = "Unknown role", body = Problem),
    )
)]
#[get("/public/users?<role>&<class_name>")]
#[tracing::instrument(skip(store))]
pub async fn public_users(
    role: Option<&str>,
    class_name: Option<String>,
    store: &State<SharedStore>,
) -> Result<Json<Vec<PublicUser>>, Problem> {
    let role = role
        .filter(|it| !it.is_empty())
        .map(str::parse::<Role>)
        .transpose()?;

    Ok(Json(
        identity::list_public(store.inner().as_ref(), role, class_name).await?,
    ))
}

#[cfg(test)]
mod auth_endpoints {
    use rocket::http::{ContentType, Status};
    use serde_json::{json, Value};

    use crate::role::Role;
    use crate::testing::{self, TEST_PASSWORD};

    #[rocket::async_test]
    async fn register_login_me_logout() {
        let (client, _) = testing::client().await;
        let (cookie, id) = testing::signed_in(&client, "stu", Role::Student, Some("5A")).await;

        let response = client.get("/api/auth/me").cookie(cookie.clone()).dispatch().await;
        assert_eq!(response.status(), Status::Ok);
        let me: Value = response.into_json().await.expect("json body");
        assert_eq!(me["id"], id.to_string());
        assert_eq!(me["role"], "student");
        assert_eq!(me["className"], "5A");

        let response = client
            .post("/api/auth/logout")
            .cookie(cookie.clone())
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::Ok);

        let response = client.get("/api/auth/me").cookie(cookie).dispatch().await;
        assert_eq!(response.status(), Status::Unauthorized, "session must be dead");
        assert_eq!(
            response.content_type(),
            Some(ContentType::new("application", "problem+json"))
        );
    }

    #[rocket::async_test]
    async fn duplicate_registration_conflicts() {
        let (client, _) = testing::client().await;
        testing::signed_in(&client, "dup", Role::Teacher, None).await;

        let response = client
            .post("/api/auth/register")
            .header(ContentType::JSON)
            .body(
                json!({
                    "name": "Dup",
                    "email": "dup@example.com",
                    "password": "whatever",
                    "role": "student",
                })
                .to_string(),
            )
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::Conflict);
    }

    #[rocket::async_test]
    async fn pin_login_and_wrong_pin() {
        let (client, _) = testing::client().await;
        let (_, id) = testing::signed_in(&client, "pinny", Role::Student, Some("5A")).await;

        let response = client
            .post("/api/auth/login")
            .header(ContentType::JSON)
            .body(json!({"user_id": id, "pin": "9999"}).to_string())
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::Unauthorized);

        let response = client
            .post("/api/auth/login")
            .header(ContentType::JSON)
            .body(json!({"user_id": id, "pin": "1234"}).to_string())
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::Ok);
        assert!(testing::session_cookie(&response).is_some());
        let body: Value = response.into_json().await.expect("json body");
        assert_eq!(body["user"]["name"], "pinny");

        let response = client
            .post("/api/auth/login")
            .header(ContentType::JSON)
            .body(json!({"email": "pinny@example.com", "password": format!("{}x", TEST_PASSWORD)}).to_string())
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::Unauthorized);
    }

    #[rocket::async_test]
    async fn profile_update_and_public_lists() {
        let (client, _) = testing::client().await;
        let (cookie, _) = testing::signed_in(&client, "ann", Role::Student, Some("5A")).await;
        testing::signed_in(&client, "bob", Role::Student, Some("5B")).await;

        let response = client
            .put("/api/auth/profile")
            .cookie(cookie.clone())
            .header(ContentType::JSON)
            .body(json!({"currentPin": "0000", "name": "Anne"}).to_string())
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::Forbidden);

        let response = client
            .put("/api/auth/profile")
            .cookie(cookie.clone())
            .header(ContentType::JSON)
            .body(json!({"currentPin": "1234", "pin": "12"}).to_string())
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::BadRequest);

        let response = client
            .put("/api/auth/profile")
            .cookie(cookie)
            .header(ContentType::JSON)
            .body(json!({"currentPin": "1234", "name": "Anne"}).to_string())
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::Ok);
        let body: Value = response.into_json().await.expect("json body");
        assert_eq!(body["user"]["name"], "Anne");

        let response = client
            .get("/api/auth/public/users?role=student&class_name=5A")
            .dispatch()
            .await;
        let users: Vec<Value> = response.into_json().await.expect("json body");
        assert_eq!(users.len(), 1);
        assert_eq!(users[0]["name"], "Anne");

        let response = client.get("/api/auth/public/users?role=janitor").dispatch().await;
        assert_eq!(response.status(), Status::BadRequest);
    }
}
