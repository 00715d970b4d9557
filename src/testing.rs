//! Fixtures shared by unit and endpoint tests.
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use chrono::Utc;
use rocket::http::{ContentType, Cookie, Status};
use rocket::local::asynchronous::{Client, LocalResponse};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::ai::{Advisor, CompletionProvider};
use crate::caller::Caller;
use crate::config::{Config, Storage};
use crate::data::memory::MemoryStore;
use crate::data::user::{PasswordHash, Pin, User};
use crate::data::{SharedStore, Store};
use crate::error::{ServiceError, ServiceResult};
use crate::resp::session::AUTH_COOKIE_NAME;
use crate::role::Role;
use crate::security::Security;

/// Lowest bcrypt cost, keeps hashing fast in tests.
pub const TEST_COST: u32 = 4;

pub const TEST_PASSWORD: &str = "s3cret-pass";

pub fn user_record(name: &str, role: Role, class_name: Option<&str>) -> User {
    User {
        id: Uuid::new_v4(),
        name: name.to_string(),
        email: format!("{}@example.com", name),
        pw_hash: PasswordHash::new(TEST_PASSWORD, TEST_COST).expect("hashing works"),
        role,
        pin: Some(Pin::parse("1234").expect("valid pin")),
        class_name: class_name.map(str::to_string),
        created: Utc::now(),
    }
}

/// Stores a new user and returns the caller acting as them.
pub async fn enroll(
    store: &dyn Store,
    name: &str,
    role: Role,
    class_name: Option<&str>,
) -> Caller {
    let user = user_record(name, role, class_name);
    store.insert_user(&user).await.expect("user stored");
    Caller::from(&user)
}

/// Replays canned completions in order, then fails as if the provider were
/// down. Records every prompt it receives.
#[derive(Debug, Default)]
pub struct ScriptedProvider {
    replies: Mutex<VecDeque<String>>,
    pub prompts: Mutex<Vec<String>>,
}

impl ScriptedProvider {
    pub fn new<S: ToString>(replies: impl IntoIterator<Item = S>) -> ScriptedProvider {
        ScriptedProvider {
            replies: Mutex::new(replies.into_iter().map(|it| it.to_string()).collect()),
            prompts: Mutex::new(vec![]),
        }
    }
}

#[rocket::async_trait]
impl CompletionProvider for ScriptedProvider {
    async fn complete(&self, prompt: &str) -> ServiceResult<String> {
        self.prompts
            .lock()
            .expect("prompt log poisoned")
            .push(prompt.to_string());
        self.replies
            .lock()
            .expect("reply queue poisoned")
            .pop_front()
            .ok_or_else(|| ServiceError::Upstream("provider unavailable".to_string()))
    }
}

pub fn test_config() -> Config {
    let mut config: Config = serde_yaml::from_str("storage: memory").expect("valid yaml");
    config.password_cost = TEST_COST;
    config.secure_cookies = false;
    config.storage = Storage::Memory;
    config
}

/// Local client over a fresh in-memory store.
pub async fn client_with(advisor: Advisor) -> (Client, SharedStore) {
    let store: SharedStore = Arc::new(MemoryStore::new());
    let rocket = crate::assemble(
        test_config(),
        Security::from_secret("test-session-secret"),
        store.clone(),
        advisor,
    )
    .expect("valid rocket");
    let client = Client::untracked(rocket).await.expect("valid rocket instance");
    (client, store)
}

pub async fn client() -> (Client, SharedStore) {
    client_with(Advisor::disabled()).await
}

pub fn session_cookie(response: &LocalResponse<'_>) -> Option<Cookie<'static>> {
    response.cookies().get(AUTH_COOKIE_NAME).cloned()
}

/// Registers through the API and logs in with the password, returning the
/// session cookie and the user id.
pub async fn signed_in(
    client: &Client,
    name: &str,
    role: Role,
    class_name: Option<&str>,
) -> (Cookie<'static>, Uuid) {
    let response = client
        .post("/api/auth/register")
        .header(ContentType::JSON)
        .body(
            json!({
                "name": name,
                "email": format!("{}@example.com", name),
                "password": TEST_PASSWORD,
                "role": role,
                "pin": "1234",
                "class_name": class_name,
            })
            .to_string(),
        )
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Created, "registration failed");
    let created: Value = response.into_json().await.expect("json body");
    let id = created["id"]
        .as_str()
        .and_then(|it| Uuid::parse_str(it).ok())
        .expect("created user id");

    let response = client
        .post("/api/auth/login")
        .header(ContentType::JSON)
        .body(
            json!({
                "email": format!("{}@example.com", name),
                "password": TEST_PASSWORD,
            })
            .to_string(),
        )
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Ok, "login failed");
    let cookie = session_cookie(&response).expect("session cookie set");

    (cookie, id)
}
