use uuid::Uuid;

use crate::caller::Caller;
use crate::data::class::db::{ClassCreateData, ClassFilter};
use crate::data::class::{Class, ClassResponse};
use crate::data::Store;
use crate::error::{ServiceError, ServiceResult};

use super::name_of;

/// Classes a student belongs to. Membership is by class name.
pub(crate) async fn classes_named(
    store: &dyn Store,
    class_name: Option<&str>,
) -> ServiceResult<Vec<Class>> {
    match class_name {
        Some(name) => store.list_classes(&ClassFilter::named(name)).await,
        None => Ok(vec![]),
    }
}

async fn describe(store: &dyn Store, classes: Vec<Class>) -> ServiceResult<Vec<ClassResponse>> {
    let mut described = Vec::with_capacity(classes.len());
    for class in classes {
        described.push(ClassResponse {
            teacher: name_of(store, class.teacher_id).await?,
            id: class.id,
            name: class.name,
        });
    }
    Ok(described)
}

pub async fn list_visible(store: &dyn Store, caller: &Caller) -> ServiceResult<Vec<ClassResponse>> {
    let classes = match caller {
        Caller::Teacher(teacher) => store.list_classes(&ClassFilter::owned_by(teacher.id)).await?,
        Caller::Student(student) => classes_named(store, student.class_name.as_deref()).await?,
        Caller::Admin(_) => store.list_classes(&ClassFilter::default()).await?,
    };

    describe(store, classes).await
}

/// The caller becomes the owner, admins included.
pub async fn create(store: &dyn Store, caller: &Caller, data: ClassCreateData) -> ServiceResult<Class> {
    let owner = match caller {
        Caller::Teacher(teacher) => teacher.id,
        Caller::Admin(admin) => admin.id,
        Caller::Student(_) => {
            return Err(ServiceError::forbidden(
                "Only a teacher or admin can create classes.",
            ))
        }
    };

    let name = data.name.trim();
    if name.is_empty() {
        return Err(ServiceError::Validation("Class name can't be empty.".to_string()));
    }

    let class = Class::new(name, owner);
    store.insert_class(&class).await?;
    tracing::info!("Created class '{}' ({}) owned by {}", class.name, class.id, owner);

    Ok(class)
}

pub async fn delete(store: &dyn Store, caller: &Caller, id: Uuid) -> ServiceResult<()> {
    let class = store
        .get_class(id)
        .await?
        .ok_or_else(|| ServiceError::not_found("Class", id))?;

    let allowed = match caller {
        Caller::Admin(_) => true,
        Caller::Teacher(teacher) => class.teacher_id == teacher.id,
        Caller::Student(_) => false,
    };
    if !allowed {
        tracing::debug!("{} {} may not delete class {}", caller.role(), caller.id(), id);
        return Err(ServiceError::forbidden("You can't delete this class."));
    }

    store.delete_class(id).await?;
    tracing::info!("Deleted class {}", id);

    Ok(())
}

pub async fn public_classes(store: &dyn Store) -> ServiceResult<Vec<ClassResponse>> {
    let classes = store.list_classes(&ClassFilter::default()).await?;
    describe(store, classes).await
}

pub async fn public_class_names(store: &dyn Store) -> ServiceResult<Vec<String>> {
    store.class_names().await
}
