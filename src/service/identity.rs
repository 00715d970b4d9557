use chrono::Duration;
use uuid::Uuid;

use crate::caller::Caller;
use crate::data::session::SessionRecord;
use crate::data::user::db::{Credentials, ProfileUpdateData, UserFilter, UserSignupData};
use crate::data::user::{DirectoryEntry, ManagedUser, Pin, PublicUser, User};
use crate::data::Store;
use crate::error::{ServiceError, ServiceResult};
use crate::role::Role;

fn bad_login() -> ServiceError {
    ServiceError::Unauthorized("Invalid credentials.".to_string())
}

/// bcrypt is CPU bound, keep it off the async workers.
async fn blocking<T, F>(f: F) -> ServiceResult<T>
where
    F: FnOnce() -> ServiceResult<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| ServiceError::Internal(format!("hashing task failed: {}", e)))?
}

pub async fn register(
    store: &dyn Store,
    data: UserSignupData,
    password_cost: u32,
) -> ServiceResult<User> {
    data.validate()?;

    if store.find_user_by_email(&data.email).await?.is_some() {
        return Err(crate::data::user::db::email_taken(&data.email));
    }

    let user = blocking(move || data.into_user(password_cost)).await?;
    store.insert_user(&user).await?;
    tracing::info!("Registered {} {}", user.role, user.id);

    Ok(user)
}

/// Resolves credentials to a user. Every failure looks the same to the
/// client, whether the account exists or not.
pub async fn authenticate(store: &dyn Store, credentials: Credentials<'_>) -> ServiceResult<User> {
    match credentials {
        Credentials::Pin { user_id, pin } => {
            let user = store.get_user(user_id).await?.ok_or_else(bad_login)?;
            match &user.pin {
                Some(stored) if stored.matches(pin) => Ok(user),
                _ => {
                    tracing::debug!("PIN login rejected for {}", user_id);
                    Err(bad_login())
                }
            }
        }
        Credentials::Password { email, password } => {
            let user = store.find_user_by_email(email).await?.ok_or_else(bad_login)?;
            let hash = user.pw_hash.clone();
            let password = password.to_string();
            if blocking(move || Ok(hash.verify(password))).await? {
                Ok(user)
            } else {
                tracing::debug!("password login rejected for {}", user.id);
                Err(bad_login())
            }
        }
    }
}

pub async fn open_session(
    store: &dyn Store,
    user: &User,
    lifetime: Duration,
) -> ServiceResult<SessionRecord> {
    let session = SessionRecord::new(user.id, lifetime);
    store.insert_session(&session).await?;
    tracing::info!("Opened session {} for {}", session.id, user.id);
    Ok(session)
}

pub async fn close_session(store: &dyn Store, session: Uuid) -> ServiceResult<()> {
    store.delete_session(session).await?;
    tracing::info!("Closed session {}", session);
    Ok(())
}

/// Checks that the session is alive and belongs to `user_id`, then loads the
/// current user record.
pub async fn resolve_session(store: &dyn Store, session: Uuid, user_id: Uuid) -> ServiceResult<User> {
    let expired = || ServiceError::Unauthorized("Session expired or logged out.".to_string());

    let record = store.get_session(session).await?.ok_or_else(expired)?;
    if record.is_expired() {
        store.delete_session(record.id).await?;
        tracing::debug!("Removed expired session {}", record.id);
        return Err(expired());
    }
    if record.user_id != user_id {
        return Err(expired());
    }

    store
        .get_user(user_id)
        .await?
        .ok_or_else(|| ServiceError::Unauthorized("User no longer exists.".to_string()))
}

pub async fn me(store: &dyn Store, caller: &Caller) -> ServiceResult<User> {
    store
        .get_user(caller.id())
        .await?
        .ok_or_else(|| ServiceError::not_found("User", caller.id()))
}

/// Self-service edit. `current_pin` must equal the stored PIN; a new PIN is
/// checked before anything is written.
pub async fn update_profile(
    store: &dyn Store,
    caller: &Caller,
    data: ProfileUpdateData,
) -> ServiceResult<User> {
    let mut user = me(store, caller).await?;

    let confirmed = match (&user.pin, data.current_pin.as_deref()) {
        (Some(stored), Some(given)) => stored.matches(given),
        _ => false,
    };
    if !confirmed {
        tracing::debug!("profile update for {} rejected, wrong PIN", user.id);
        return Err(ServiceError::forbidden("Invalid current PIN."));
    }

    let new_pin = data
        .pin
        .filter(|pin| !pin.is_empty())
        .map(Pin::parse)
        .transpose()?;

    if let Some(name) = data.name {
        user.name = name;
    }
    if let Some(pin) = new_pin {
        user.pin = Some(pin);
    }

    store.update_user(&user).await?;
    tracing::info!("Updated profile of {}", user.id);

    Ok(user)
}

/// Login selection list. The class filter only applies to students.
pub async fn list_public(
    store: &dyn Store,
    role: Option<Role>,
    class_name: Option<String>,
) -> ServiceResult<Vec<PublicUser>> {
    let filter = UserFilter {
        role,
        class_name: class_name.filter(|_| role == Some(Role::Student)),
    };

    Ok(store
        .list_users(&filter)
        .await?
        .into_iter()
        .map(PublicUser::from)
        .collect())
}

/// Directory listing, both filters apply to every role.
pub async fn list_directory(
    store: &dyn Store,
    role: Option<Role>,
    class_name: Option<String>,
) -> ServiceResult<Vec<DirectoryEntry>> {
    let filter = UserFilter {
        role,
        class_name: class_name.filter(|name| !name.is_empty()),
    };

    Ok(store
        .list_users(&filter)
        .await?
        .into_iter()
        .map(DirectoryEntry::from)
        .collect())
}

pub async fn list_users(store: &dyn Store, caller: &Caller) -> ServiceResult<Vec<ManagedUser>> {
    caller.admin()?;

    Ok(store
        .list_users(&UserFilter::default())
        .await?
        .into_iter()
        .map(ManagedUser::from)
        .collect())
}

pub async fn create_user(
    store: &dyn Store,
    caller: &Caller,
    data: UserSignupData,
    password_cost: u32,
) -> ServiceResult<User> {
    let admin = caller.admin()?;
    tracing::info!("Admin {} creating account <{}>", admin.id, data.email);
    register(store, data, password_cost).await
}

pub async fn delete_user(store: &dyn Store, caller: &Caller, id: Uuid) -> ServiceResult<()> {
    let admin = caller.admin()?;

    if store.get_user(id).await?.is_none() {
        return Err(ServiceError::not_found("User", id));
    }
    if admin.id == id {
        return Err(ServiceError::Validation(
            "Cannot delete yourself.".to_string(),
        ));
    }

    store.delete_user(id).await?;
    tracing::info!("Admin {} deleted user {}", admin.id, id);

    Ok(())
}
