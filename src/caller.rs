use uuid::Uuid;

use crate::data::user::User;
use crate::error::{ServiceError, ServiceResult};
use crate::role::Role;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Teacher {
    pub id: Uuid,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Student {
    pub id: Uuid,
    pub name: String,
    pub class_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Admin {
    pub id: Uuid,
    pub name: String,
}

/// The authenticated user of a request, resolved fresh from the store on
/// every request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Caller {
    Teacher(Teacher),
    Student(Student),
    Admin(Admin),
}

impl From<&User> for Caller {
    fn from(user: &User) -> Self {
        match user.role {
            Role::Teacher => Caller::Teacher(Teacher {
                id: user.id,
                name: user.name.clone(),
            }),
            Role::Student => Caller::Student(Student {
                id: user.id,
                name: user.name.clone(),
                class_name: user.class_name.clone(),
            }),
            Role::Admin => Caller::Admin(Admin {
                id: user.id,
                name: user.name.clone(),
            }),
        }
    }
}

impl Caller {
    pub fn id(&self) -> Uuid {
        match self {
            Caller::Teacher(t) => t.id,
            Caller::Student(s) => s.id,
            Caller::Admin(a) => a.id,
        }
    }

    pub fn role(&self) -> Role {
        match self {
            Caller::Teacher(_) => Role::Teacher,
            Caller::Student(_) => Role::Student,
            Caller::Admin(_) => Role::Admin,
        }
    }

    pub fn teacher(&self) -> ServiceResult<&Teacher> {
        match self {
            Caller::Teacher(t) => Ok(t),
            other => Err(other.denied(Role::Teacher)),
        }
    }

    pub fn student(&self) -> ServiceResult<&Student> {
        match self {
            Caller::Student(s) => Ok(s),
            other => Err(other.denied(Role::Student)),
        }
    }

    pub fn admin(&self) -> ServiceResult<&Admin> {
        match self {
            Caller::Admin(a) => Ok(a),
            other => Err(other.denied(Role::Admin)),
        }
    }

    fn denied(&self, required: Role) -> ServiceError {
        tracing::debug!(
            "{} {} denied, {} role required",
            self.role(),
            self.id(),
            required
        );
        ServiceError::forbidden(format!("Only a {} can do this.", required))
    }
}
