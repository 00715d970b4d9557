use std::collections::BTreeMap;

use rocket::http::Status;
use rocket::serde::json::{json, Json, Value};
use rocket::{Build, Catcher, Request, Rocket, Route};

pub mod ai;
pub mod assignments;
pub mod auth;
pub mod classes;
pub mod resources;
pub mod submissions;
pub mod users;

use self::ai::*;
use self::assignments::*;
use self::auth::*;
use self::classes::*;
use self::resources::*;
use self::submissions::*;
use self::users::*;

use utoipa::OpenApi;

use crate::{
    ai as advisor,
    data::{
        assignment::{db::AssignmentCreateData, AssignmentDetail, AssignmentView, ProgressStatus},
        class::{db::ClassCreateData, ClassResponse},
        resource::{db::ResourceCreateData, ResourceSummary},
        submission::{
            db::{GradeData, SubmissionCreateData},
            PendingSubmission, SubmissionDetail, SubmissionStatus, SubmissionSummary,
        },
        user::{
            db::{ProfileUpdateData, UserLoginData, UserSignupData},
            DirectoryEntry, ManagedUser, PublicUser, UserResponse,
        },
    },
    resp::{
        problem::{problems::parse_problem, GuardProblem, Problem},
        session::doc::SessionAuth,
        Created, Message,
    },
    role::Role,
};

#[derive(OpenApi)]
#[openapi(
    paths(
        auth::register,
        auth::login,
        auth::logout,
        auth::me,
        auth::update_profile,
        auth::public_class_names,
        auth::public_users,
        class_list,
        class_create,
        class_public,
        class_delete,
        assignment_list,
        assignment_create,
        assignment_get,
        submission_create,
        submission_list,
        submission_pending,
        submission_get,
        submission_grade,
        resource_list,
        resource_create,
        resource_delete,
        user_list,
        user_directory,
        user_create,
        user_delete,
        ai_chat,
        ai_grade
    ),
    components(schemas(
        Role,
        UserSignupData,
        UserLoginData,
        ProfileUpdateData,
        UserResponse,
        UserMessage,
        PublicUser,
        DirectoryEntry,
        ManagedUser,
        ClassCreateData,
        ClassResponse,
        AssignmentCreateData,
        AssignmentView,
        AssignmentDetail,
        ProgressStatus,
        SubmissionCreateData,
        GradeData,
        SubmissionStatus,
        SubmissionSummary,
        SubmissionDetail,
        PendingSubmission,
        ResourceCreateData,
        ResourceSummary,
        advisor::ChatRequest,
        advisor::ChatReply,
        advisor::GradeRequest,
        advisor::GradeSuggestion,
        Created,
        Message,
        Problem
    )),
    modifiers(&SessionAuth, &API_PREFIX)
)]
pub struct ApiDoc;

pub struct PathPrefix(pub &'static str);
static API_PREFIX: PathPrefix = PathPrefix("/api");

impl utoipa::Modify for PathPrefix {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let mut new_paths = BTreeMap::new();

        for (path, item) in std::mem::take(&mut openapi.paths.paths) {
            new_paths.insert(self.0.to_string() + path.as_ref(), item);
        }

        openapi.paths.paths = new_paths;
    }
}

#[get("/health")]
pub fn health() -> Value {
    json!({ "status": "ok" })
}

#[get("/openapi.json")]
pub fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

pub fn api_auth() -> Vec<Route> {
    routes![
        auth::register,
        auth::login,
        auth::logout,
        auth::me,
        auth::update_profile,
        auth::public_class_names,
        auth::public_users
    ]
}

pub fn mount_api(rocket: Rocket<Build>) -> Rocket<Build> {
    rocket
        .mount("/api/auth", api_auth())
        .mount(
            "/api/classes",
            routes![class_list, class_create, class_public, class_delete],
        )
        .mount(
            "/api/assignments",
            routes![assignment_list, assignment_create, assignment_get],
        )
        .mount(
            "/api/submissions",
            routes![
                submission_create,
                submission_list,
                submission_pending,
                submission_get,
                submission_grade
            ],
        )
        .mount(
            "/api/resources",
            routes![resource_list, resource_create, resource_delete],
        )
        .mount("/api/users", routes![user_list, user_directory, user_create, user_delete])
        .mount("/api/ai", routes![ai_chat, ai_grade])
        .mount("/api", routes![openapi_json])
        .mount("/", routes![health])
}

/// Answers with the problem a request guard cached, if any.
#[catch(default)]
fn problem_catcher(status: Status, req: &Request) -> Problem {
    if let GuardProblem(Some(problem)) = req.local_cache(GuardProblem::default) {
        return problem.clone();
    }

    let mut problem = match status {
        s if s == Status::BadRequest || s == Status::UnprocessableEntity => {
            let mut problem = parse_problem();
            problem.status = status;
            problem
        }
        _ => Problem::new_untyped(status, status.reason().unwrap_or("Problem")),
    };
    problem.instance_uri(req.uri().to_string());
    problem
}

pub fn problem_catchers() -> Vec<Catcher> {
    catchers![problem_catcher]
}

#[cfg(test)]
mod api_endpoints {
    use rocket::http::{ContentType, Status};
    use serde_json::Value;

    use crate::testing;

    #[rocket::async_test]
    async fn health_and_openapi_are_public() {
        let (client, _) = testing::client().await;

        let health: Value = client
            .get("/health")
            .dispatch()
            .await
            .into_json()
            .await
            .expect("json body");
        assert_eq!(health["status"], "ok");

        let doc: Value = client
            .get("/api/openapi.json")
            .dispatch()
            .await
            .into_json()
            .await
            .expect("json body");
        assert!(doc["paths"]["/api/submissions/{id}/grade"].is_object());
        assert!(doc["components"]["securitySchemes"]["session"].is_object());
    }

    #[rocket::async_test]
    async fn missing_session_is_a_problem_document() {
        let (client, _) = testing::client().await;

        let response = client.get("/api/assignments").dispatch().await;
        assert_eq!(response.status(), Status::Unauthorized);
        assert_eq!(
            response.content_type(),
            Some(ContentType::new("application", "problem+json"))
        );
        let problem: Value = response.into_json().await.expect("problem body");
        assert_eq!(problem["status"], 401);
        assert_eq!(problem["detail"], "No session cookie.");
    }

    #[rocket::async_test]
    async fn malformed_body_is_rejected() {
        let (client, _) = testing::client().await;

        let response = client
            .post("/api/auth/login")
            .header(ContentType::JSON)
            .body("{not json")
            .dispatch()
            .await;
        assert!(response.status() == Status::BadRequest || response.status() == Status::UnprocessableEntity);
        let problem: Value = response.into_json().await.expect("problem body");
        assert_eq!(problem["title"], "There was a problem parsing part of the request.");
    }
}
