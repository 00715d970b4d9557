use base64::Engine;
use chrono::{DateTime, Utc};
use derive_more::Deref;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::convert::TryFrom;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::{ServiceError, ServiceResult};
use crate::role::Role;
use crate::util::base64_engine;

pub mod db;

pub static USER_COLLECTION_NAME: &str = "users";

/// bcrypt hash of the SHA-256 digest of a password.
///
/// The digest keeps long passwords from being cut at bcrypt's 72 byte limit.
#[derive(Debug, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PasswordHash(String);

fn prehash(password: &str) -> String {
    let mut sha = Sha256::new();
    sha2::Digest::update(&mut sha, password.as_bytes());
    base64_engine().encode(sha.finalize())
}

impl PasswordHash {
    pub fn new(password: impl AsRef<str>, cost: u32) -> ServiceResult<PasswordHash> {
        let hash = bcrypt::hash(prehash(password.as_ref()), cost)?;
        Ok(PasswordHash(hash))
    }

    pub fn verify(&self, password: impl AsRef<str>) -> bool {
        bcrypt::verify(prehash(password.as_ref()), &self.0).unwrap_or(false)
    }
}

/// Four ASCII digit login PIN.
#[derive(Debug, Clone, Eq, PartialEq, Hash, Deref, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Pin(String);

impl Pin {
    pub fn parse(value: impl Into<String>) -> ServiceResult<Pin> {
        let value = value.into();
        if value.len() == 4 && value.bytes().all(|b| b.is_ascii_digit()) {
            Ok(Pin(value))
        } else {
            Err(ServiceError::Validation("PIN must be 4 digits".to_string()))
        }
    }

    /// Exact comparison. PINs are a convenience login and are stored as is.
    pub fn matches(&self, candidate: &str) -> bool {
        self.0 == candidate
    }
}

impl TryFrom<String> for Pin {
    type Error = ServiceError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Pin::parse(value)
    }
}

impl From<Pin> for String {
    fn from(pin: Pin) -> Self {
        pin.0
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    #[serde(rename = "_id", with = "bson::serde_helpers::uuid_1_as_binary")]
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub pw_hash: PasswordHash,
    pub role: Role,
    #[serde(default)]
    pub pin: Option<Pin>,
    /// Name of the class a student belongs to. Matched against `Class::name`.
    #[serde(default)]
    pub class_name: Option<String>,
    #[serde(default = "Utc::now", with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created: DateTime<Utc>,
}

/// Identity as returned by `/api/auth/me`, login and profile updates.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserResponse {
    pub id: Uuid,
    pub name: String,
    pub role: Role,
    pub email: String,
    #[serde(rename = "className")]
    pub class_name: Option<String>,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        UserResponse {
            id: user.id,
            name: user.name.clone(),
            role: user.role,
            email: user.email.clone(),
            class_name: user.class_name.clone(),
        }
    }
}

/// Login selection entry. Readable without a session.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PublicUser {
    pub id: Uuid,
    pub name: String,
    pub role: Role,
    #[serde(rename = "className")]
    pub class_name: Option<String>,
}

impl From<User> for PublicUser {
    fn from(user: User) -> Self {
        PublicUser {
            id: user.id,
            name: user.name,
            role: user.role,
            class_name: user.class_name,
        }
    }
}

/// Entry of the public user directory.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DirectoryEntry {
    pub id: Uuid,
    pub name: String,
    pub role: Role,
    pub class_name: Option<String>,
}

impl From<User> for DirectoryEntry {
    fn from(user: User) -> Self {
        DirectoryEntry {
            id: user.id,
            name: user.name,
            role: user.role,
            class_name: user.class_name,
        }
    }
}

/// Row of the admin user table.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ManagedUser {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub status: String,
}

impl From<User> for ManagedUser {
    fn from(user: User) -> Self {
        ManagedUser {
            id: user.id,
            name: user.name,
            email: user.email,
            role: user.role,
            // accounts can't be suspended yet
            status: "active".to_string(),
        }
    }
}
