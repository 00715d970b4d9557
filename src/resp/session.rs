use chrono::{DateTime, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use rocket::http::{Cookie, CookieJar, SameSite, Status};
use rocket::outcome::Outcome;
use rocket::request::{self, FromRequest, Request};
use rocket::time::OffsetDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::caller::Caller;
use crate::config::Config;
use crate::data::session::SessionRecord;
use crate::data::SharedStore;
use crate::resp::problem::{problems::auth_problem, GuardProblem, Problem};
use crate::security::Security;
use crate::service::identity;
use crate::util::date_time_as_unix_seconds;

pub static AUTH_COOKIE_NAME: &str = "session";

/// Claims of the session cookie. Only names a [`SessionRecord`]; the record
/// decides whether the session is still alive.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionToken {
    #[serde(with = "date_time_as_unix_seconds")]
    iat: DateTime<Utc>,
    #[serde(with = "date_time_as_unix_seconds")]
    exp: DateTime<Utc>,
    pub sid: Uuid,
    pub user: Uuid,
}

impl SessionToken {
    pub fn new(session: &SessionRecord) -> SessionToken {
        SessionToken {
            iat: session.created,
            exp: session.expires,
            sid: session.id,
            user: session.user_id,
        }
    }

    pub fn encode_jwt(&self, key: impl AsRef<[u8]>) -> Result<String, jsonwebtoken::errors::Error> {
        let header = Header::new(Algorithm::HS256);
        encode(&header, &self, &EncodingKey::from_secret(key.as_ref()))
    }

    pub fn decode_jwt(
        token: &str,
        key: impl AsRef<[u8]>,
    ) -> Result<SessionToken, jsonwebtoken::errors::Error> {
        decode::<SessionToken>(
            token,
            &DecodingKey::from_secret(key.as_ref()),
            &Validation::new(Algorithm::HS256),
        )
        .map(|data| data.claims)
    }

    pub fn cookie(
        &self,
        key: impl AsRef<[u8]>,
        secure: bool,
    ) -> Result<Cookie<'static>, jsonwebtoken::errors::Error> {
        Ok(Cookie::build((AUTH_COOKIE_NAME, self.encode_jwt(key)?))
            .secure(secure)
            .expires(OffsetDateTime::from_unix_timestamp(self.exp.timestamp()).ok())
            .path("/")
            .same_site(SameSite::Lax)
            .http_only(true)
            .build())
    }
}

pub fn extract_claims(cookies: &CookieJar, key: impl AsRef<[u8]>) -> Result<SessionToken, Problem> {
    let token = match cookies.get(AUTH_COOKIE_NAME) {
        Some(jwt) => jwt.value().to_owned(),
        None => return Err(auth_problem("No session cookie.")),
    };
    tracing::trace!("extracted session token from cookie");

    let claims = SessionToken::decode_jwt(&token, key).map_err(Problem::from)?;
    tracing::debug!("decoded session {} for user: {}", claims.sid, claims.user);

    Ok(claims)
}

/// Request guard for protected endpoints: a live session and the user it
/// belongs to.
#[derive(Debug, Clone)]
pub struct Session {
    pub id: Uuid,
    pub caller: Caller,
}

fn reject(req: &Request<'_>, status: Status, problem: Problem) -> request::Outcome<Session, Problem> {
    req.local_cache(|| GuardProblem(Some(problem.clone())));
    Outcome::Error((status, problem))
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for Session {
    type Error = Problem;

    async fn from_request(req: &'r Request<'_>) -> request::Outcome<Self, Self::Error> {
        let (Some(security), Some(store)) = (
            req.rocket().state::<Security>(),
            req.rocket().state::<SharedStore>(),
        ) else {
            tracing::error!("session guard used without managed Security and store");
            return reject(req, Status::InternalServerError, Problem::default());
        };

        let claims = match extract_claims(req.cookies(), &security.session_key) {
            Ok(it) => it,
            Err(e) => {
                tracing::debug!("unable to extract claims from cookies");
                return reject(req, Status::Unauthorized, e);
            }
        };

        match identity::resolve_session(store.as_ref(), claims.sid, claims.user).await {
            Ok(user) => Outcome::Success(Session {
                id: claims.sid,
                caller: Caller::from(&user),
            }),
            Err(e) => {
                let problem = Problem::from(e);
                reject(req, problem.status, problem)
            }
        }
    }
}

/// Adds the login cookie for `session`.
pub fn attach_cookie(
    cookies: &CookieJar<'_>,
    session: &SessionRecord,
    security: &Security,
    c: &Config,
) -> Result<(), Problem> {
    let cookie = SessionToken::new(session).cookie(&security.session_key, c.secure_cookies)?;
    cookies.add(cookie);
    Ok(())
}

pub fn remove_cookie(cookies: &CookieJar<'_>) {
    cookies.remove(Cookie::build(AUTH_COOKIE_NAME).path("/"));
}

pub mod doc {
    use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};

    #[derive(Clone, Copy)]
    pub struct SessionAuth;

    impl utoipa::Modify for SessionAuth {
        fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
            if let Some(components) = openapi.components.as_mut() {
                components.add_security_scheme(
                    "session",
                    SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::new(
                        super::AUTH_COOKIE_NAME,
                    ))),
                )
            }
        }
    }
}
