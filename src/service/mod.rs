//! Classroom operations. Each takes the store and, when the operation is
//! protected, the [`Caller`](crate::caller::Caller) of the request.
//!
//! Route handlers only translate HTTP to these calls, so every role and
//! ownership check lives here.
use uuid::Uuid;

use crate::data::assignment::Assignment;
use crate::data::class::Class;
use crate::data::Store;
use crate::error::{ServiceError, ServiceResult};

pub mod assignments;
pub mod grading;
pub mod identity;
pub mod library;
pub mod roster;
pub mod seed;

async fn class_of(store: &dyn Store, assignment: &Assignment) -> ServiceResult<Class> {
    store
        .get_class(assignment.class_id)
        .await?
        .ok_or_else(|| ServiceError::not_found("Class", assignment.class_id))
}

async fn assignment(store: &dyn Store, id: Uuid) -> ServiceResult<Assignment> {
    store
        .get_assignment(id)
        .await?
        .ok_or_else(|| ServiceError::not_found("Assignment", id))
}

/// Display name of a user, `None` when the account no longer resolves.
async fn name_of(store: &dyn Store, id: Uuid) -> ServiceResult<Option<String>> {
    Ok(store.get_user(id).await?.map(|user| user.name))
}
