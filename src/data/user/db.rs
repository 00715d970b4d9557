use chrono::Utc;
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::{ServiceError, ServiceResult};
use crate::role::Role;

use super::{PasswordHash, Pin, User};

#[derive(Clone, Deserialize, ToSchema)]
pub struct UserSignupData {
    pub name: String,
    #[schema(format = "email")]
    pub email: String,
    #[schema(format = "password")]
    pub password: String,
    pub role: Role,
    #[serde(default)]
    pub pin: Option<String>,
    #[serde(default)]
    pub class_name: Option<String>,
}

impl std::fmt::Debug for UserSignupData {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "UserSignupData:{}<{}>", self.name, self.email)
    }
}

impl UserSignupData {
    pub fn validate(&self) -> ServiceResult<()> {
        if self.name.trim().is_empty() {
            return Err(ServiceError::Validation("Name can't be empty.".to_string()));
        }

        if !self.email.contains('@') {
            return Err(ServiceError::Validation(format!(
                "'{}' is not a valid e-mail address.",
                self.email
            )));
        }

        if self.password.is_empty() {
            return Err(ServiceError::Validation(
                "Password can't be empty.".to_string(),
            ));
        }

        if let Some(pin) = self.initial_pin() {
            Pin::parse(pin)?;
        }

        Ok(())
    }

    fn initial_pin(&self) -> Option<&str> {
        self.pin.as_deref().filter(|pin| !pin.is_empty())
    }

    /// Hashes the password and builds the stored record. Call
    /// [`validate`](Self::validate) first.
    pub fn into_user(self, password_cost: u32) -> ServiceResult<User> {
        let pin = self.initial_pin().map(Pin::parse).transpose()?;
        let pw_hash = PasswordHash::new(&self.password, password_cost)?;

        let id = Uuid::new_v4();
        tracing::info!("Creating a new {} with UUID: {}", self.role, id);

        Ok(User {
            id,
            name: self.name,
            email: self.email,
            pw_hash,
            role: self.role,
            pin,
            class_name: self.class_name.filter(|name| !name.is_empty()),
            created: Utc::now(),
        })
    }
}

/// Login body. Carries either `user_id` + `pin` (picked from the public
/// user list) or the `email` + `password` fallback.
#[derive(Clone, Default, Deserialize, ToSchema)]
pub struct UserLoginData {
    #[serde(default)]
    pub user_id: Option<Uuid>,
    #[serde(default)]
    pub pin: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    #[schema(format = "password")]
    pub password: Option<String>,
}

#[derive(Debug, Clone, Copy)]
pub enum Credentials<'a> {
    Pin { user_id: Uuid, pin: &'a str },
    Password { email: &'a str, password: &'a str },
}

impl UserLoginData {
    /// PIN login wins when both credential pairs are present.
    pub fn credentials(&self) -> Option<Credentials<'_>> {
        if let (Some(user_id), Some(pin)) = (self.user_id, self.pin.as_deref()) {
            return Some(Credentials::Pin { user_id, pin });
        }
        match (self.email.as_deref(), self.password.as_deref()) {
            (Some(email), Some(password)) => Some(Credentials::Password { email, password }),
            _ => None,
        }
    }
}

impl std::fmt::Debug for UserLoginData {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> std::fmt::Result {
        match (self.user_id, &self.email) {
            (Some(id), _) => write!(f, "UserLoginData:pin:{}", id),
            (None, Some(email)) => write!(f, "UserLoginData:email:{}", email),
            (None, None) => write!(f, "UserLoginData:empty"),
        }
    }
}

#[derive(Clone, Deserialize, ToSchema)]
pub struct ProfileUpdateData {
    #[serde(rename = "currentPin", default)]
    pub current_pin: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub pin: Option<String>,
}

impl std::fmt::Debug for ProfileUpdateData {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ProfileUpdateData:{:?}", self.name)
    }
}

#[derive(Debug, Clone, Default)]
pub struct UserFilter {
    pub role: Option<Role>,
    pub class_name: Option<String>,
}

impl UserFilter {
    pub fn matches(&self, user: &User) -> bool {
        self.role.map_or(true, |role| user.role == role)
            && self
                .class_name
                .as_ref()
                .map_or(true, |name| user.class_name.as_ref() == Some(name))
    }
}

#[rocket::async_trait]
pub trait UserDb {
    /// Fails with [`ServiceError::Conflict`] if the email is taken.
    async fn insert_user(&self, user: &User) -> ServiceResult<()>;

    async fn get_user(&self, id: Uuid) -> ServiceResult<Option<User>>;

    async fn find_user_by_email(&self, email: &str) -> ServiceResult<Option<User>>;

    async fn list_users(&self, filter: &UserFilter) -> ServiceResult<Vec<User>>;

    /// Replaces the stored record with the same id.
    async fn update_user(&self, user: &User) -> ServiceResult<()>;

    async fn delete_user(&self, id: Uuid) -> ServiceResult<Option<User>>;
}

pub fn email_taken(email: &str) -> ServiceError {
    ServiceError::Conflict(format!("Email '{}' already exists.", email))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signup(pin: Option<&str>) -> UserSignupData {
        UserSignupData {
            name: "Ada".to_string(),
            email: "ada@example.com".to_string(),
            password: "analytical".to_string(),
            role: Role::Student,
            pin: pin.map(str::to_string),
            class_name: Some("5A".to_string()),
        }
    }

    #[test]
    fn signup_rejects_malformed_pin() {
        assert!(signup(Some("12")).validate().is_err());
        assert!(signup(Some("1234")).validate().is_ok());
        assert!(signup(None).validate().is_ok());
    }

    #[test]
    fn empty_pin_means_no_pin() {
        let user = signup(Some("")).into_user(4).unwrap();
        assert!(user.pin.is_none());
        assert_eq!(user.class_name.as_deref(), Some("5A"));
    }

    #[test]
    fn login_data_picks_credentials_by_fields() {
        let pin: UserLoginData = serde_json::from_str(
            r#"{"user_id":"67e55044-10b1-426f-9247-bb680e5fe0c8","pin":"1234"}"#,
        )
        .unwrap();
        assert!(matches!(pin.credentials(), Some(Credentials::Pin { pin: "1234", .. })));

        let password: UserLoginData =
            serde_json::from_str(r#"{"email":"a@b.c","password":"x"}"#).unwrap();
        assert!(matches!(
            password.credentials(),
            Some(Credentials::Password { email: "a@b.c", .. })
        ));

        let partial: UserLoginData = serde_json::from_str(r#"{"email":"a@b.c"}"#).unwrap();
        assert!(partial.credentials().is_none());
    }
}
