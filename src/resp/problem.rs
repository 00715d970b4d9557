use std::io::Cursor;

use rocket::http::hyper::header::CONTENT_LANGUAGE;
use rocket::http::ContentType;
use rocket::http::Status;
use rocket::response::Responder;
use rocket::{response, Request, Response};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt::{Display, Formatter};
use utoipa::ToSchema;

use crate::error::ServiceError;

/// Implements [RFC7807](https://tools.ietf.org/html/rfc7807).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Problem {
    #[serde(skip)]
    pub status: Status,
    pub type_uri: String,
    pub title: String,

    pub detail: Option<String>,
    pub instance_uri: Option<String>,

    pub body: Map<String, Value>,
}

impl Default for Problem {
    fn default() -> Self {
        Problem {
            status: Status::InternalServerError,
            type_uri: "about:blank".to_string(),
            title: "Problem".to_string(),
            detail: None,
            instance_uri: None,
            body: Map::new(),
        }
    }
}

impl Problem {
    pub fn new_untyped(status: Status, title: impl ToString) -> Problem {
        Problem {
            status,
            type_uri: "about:blank".to_string(),
            title: title.to_string(),
            ..Default::default()
        }
    }

    pub fn detail(&mut self, value: impl ToString) -> &mut Problem {
        self.detail = Some(value.to_string());
        self
    }

    pub fn instance_uri(&mut self, value: String) -> &mut Problem {
        self.instance_uri = Some(value);
        self
    }

    pub fn insert<V: Serialize>(&mut self, key: impl ToString, value: V) -> &mut Problem {
        self.body.insert(
            key.to_string(),
            serde_json::to_value(value).expect("data must be JSON serializable"),
        );
        self
    }

    /// JSON document sent to the client.
    pub fn to_body(&self) -> Map<String, Value> {
        let mut body = self.body.clone();

        // Following are required by rfc7807
        body.insert(String::from("type"), Value::from(self.type_uri.clone()));
        body.insert(String::from("title"), Value::from(self.title.clone()));

        // Optional parameters as specified by rfc7807
        if let Some(detail) = &self.detail {
            body.insert(String::from("detail"), Value::from(detail.clone()));
        }
        body.insert(String::from("status"), Value::from(self.status.code));
        if let Some(instance) = &self.instance_uri {
            body.insert(String::from("instance"), Value::from(instance.clone()));
        }

        body
    }
}

/// Problem a request guard failed with. Cached on the request so catchers
/// can answer with it.
#[derive(Debug, Clone, Default)]
pub struct GuardProblem(pub Option<Problem>);

impl Display for Problem {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.status, self.title)
    }
}

impl std::error::Error for Problem {}

impl<'r> Responder<'r, 'static> for Problem {
    fn respond_to(self, _: &'r Request<'_>) -> response::Result<'static> {
        let body_string = serde_json::to_string(&self.to_body())
            .expect("JSON map keys and values must be JSON serializable");

        Response::build()
            .status(self.status)
            .header(ContentType::new("application", "problem+json"))
            .raw_header(CONTENT_LANGUAGE.as_str(), "en")
            .sized_body(body_string.len(), Cursor::new(body_string))
            .ok()
    }
}

pub mod problems {
    use crate::resp::problem::Problem;
    use rocket::http::Status;

    #[inline]
    pub fn parse_problem() -> Problem {
        Problem::new_untyped(
            Status::BadRequest,
            "There was a problem parsing part of the request.",
        )
    }

    #[inline]
    pub fn auth_problem(detail: impl ToString) -> Problem {
        Problem::new_untyped(Status::Unauthorized, "Unable to authorize user.")
            .detail(detail)
            .clone()
    }
}

impl From<ServiceError> for Problem {
    fn from(e: ServiceError) -> Self {
        match e {
            ServiceError::Validation(detail) => {
                Problem::new_untyped(Status::BadRequest, "Invalid request.")
                    .detail(detail)
                    .clone()
            }
            ServiceError::Unauthorized(detail) => problems::auth_problem(detail),
            ServiceError::Forbidden(detail) => {
                Problem::new_untyped(Status::Forbidden, "Unauthorized")
                    .detail(detail)
                    .clone()
            }
            ServiceError::NotFound { kind, id } => {
                Problem::new_untyped(Status::NotFound, format!("{} doesn't exist.", kind))
                    .insert("id", id.to_string())
                    .clone()
            }
            ServiceError::Conflict(detail) => {
                Problem::new_untyped(Status::Conflict, "Already exists.")
                    .detail(detail)
                    .clone()
            }
            ServiceError::InvalidClass => Problem::new_untyped(Status::BadRequest, "Invalid class")
                .detail("Class doesn't exist or isn't taught by you.")
                .clone(),
            ServiceError::ServiceUnavailable(detail) => {
                Problem::new_untyped(Status::ServiceUnavailable, "AI service not configured.")
                    .detail(detail)
                    .clone()
            }
            ServiceError::Upstream(detail) => {
                Problem::new_untyped(Status::BadGateway, "AI service request failed.")
                    .detail(detail)
                    .clone()
            }
            ServiceError::Database(e) => Problem::from(e),
            ServiceError::Internal(detail) => {
                tracing::error!("internal error: {}", detail);
                Problem::new_untyped(
                    Status::InternalServerError,
                    "Server failed while processing request.",
                )
            }
        }
    }
}

#[allow(dead_code)]
impl From<mongodb::error::Error> for Problem {
    fn from(e: mongodb::error::Error) -> Self {
        use mongodb::error::ErrorKind;

        tracing::error!("MongoDB error: {}", e);

        fn mongodb_problem() -> Problem {
            Problem::new_untyped(
                Status::InternalServerError,
                "MongoDB failed while processing request.",
            )
        }

        fn access_problem() -> Problem {
            Problem::new_untyped(
                Status::InternalServerError,
                "Server was unable to access MongoDB.",
            )
        }

        fn bad_db_request() -> Problem {
            Problem::new_untyped(
                Status::InternalServerError,
                "MongoDB was unable to process bad server request.",
            )
        }

        fn bson_problem() -> Problem {
            Problem::new_untyped(
                Status::InternalServerError,
                "There was a problem with handling MongoDB bson.",
            )
        }

        match e.kind.as_ref() {
            ErrorKind::InvalidArgument { .. } => bad_db_request(),
            ErrorKind::Authentication { .. } => access_problem(),
            ErrorKind::BsonDeserialization(_) => bson_problem(),
            ErrorKind::BsonSerialization(_) => bson_problem(),
            ErrorKind::BulkWrite(_) => bad_db_request(),
            ErrorKind::Command(_) => bad_db_request(),
            ErrorKind::DnsResolve { .. } => access_problem(),
            ErrorKind::Internal { .. } => mongodb_problem(),
            ErrorKind::Io(_) => mongodb_problem()
                .detail("An IO error occurred. Submitted data might not be properly stored.")
                .clone(),
            ErrorKind::ConnectionPoolCleared { .. } => mongodb_problem(),
            ErrorKind::InvalidResponse { .. } => mongodb_problem(),
            ErrorKind::ServerSelection { .. } => access_problem(),
            ErrorKind::SessionsNotSupported => mongodb_problem(),
            ErrorKind::InvalidTlsConfig { .. } => access_problem(),
            ErrorKind::Write(_) => mongodb_problem()
                .detail("A write error occurred. Submitted data might not be properly stored.")
                .clone(),
            ErrorKind::Transaction { .. } => mongodb_problem(),
            ErrorKind::IncompatibleServer { .. } => access_problem(),
            _ => mongodb_problem(),
        }
    }
}

impl From<jsonwebtoken::errors::Error> for Problem {
    fn from(e: jsonwebtoken::errors::Error) -> Self {
        use jsonwebtoken::errors::ErrorKind;

        match e.into_kind() {
            ErrorKind::ExpiredSignature => problems::auth_problem("Expired session."),
            _ => problems::auth_problem("Malformed session cookie."),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn taxonomy_maps_to_statuses() {
        let cases = [
            (ServiceError::Validation("x".into()), Status::BadRequest),
            (ServiceError::InvalidClass, Status::BadRequest),
            (ServiceError::Unauthorized("x".into()), Status::Unauthorized),
            (ServiceError::forbidden("x"), Status::Forbidden),
            (ServiceError::not_found("Class", Uuid::nil()), Status::NotFound),
            (ServiceError::Conflict("x".into()), Status::Conflict),
            (ServiceError::ServiceUnavailable("x".into()), Status::ServiceUnavailable),
            (ServiceError::Upstream("x".into()), Status::BadGateway),
            (ServiceError::Internal("x".into()), Status::InternalServerError),
        ];

        for (error, status) in cases {
            assert_eq!(Problem::from(error).status, status);
        }
    }

    #[test]
    fn body_carries_rfc7807_members() {
        let id = Uuid::new_v4();
        let body = Problem::from(ServiceError::not_found("Submission", id)).to_body();

        assert_eq!(body["status"], 404);
        assert_eq!(body["title"], "Submission doesn't exist.");
        assert_eq!(body["type"], "about:blank");
        assert_eq!(body["id"], id.to_string());
    }
}
