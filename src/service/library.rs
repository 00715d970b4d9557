use chrono::Utc;
use uuid::Uuid;

use crate::caller::Caller;
use crate::data::resource::db::{ResourceCreateData, ResourceFilter};
use crate::data::resource::{Resource, ResourceSummary};
use crate::data::Store;
use crate::error::{ServiceError, ServiceResult};

/// Teachers only see what they authored, everyone else sees the whole
/// library.
pub async fn list(
    store: &dyn Store,
    caller: &Caller,
    kind: Option<String>,
    subject: Option<String>,
) -> ServiceResult<Vec<ResourceSummary>> {
    let filter = ResourceFilter {
        kind: kind.filter(|it| !it.is_empty()),
        subject: subject.filter(|it| !it.is_empty()),
        author: match caller {
            Caller::Teacher(teacher) => Some(teacher.id),
            Caller::Student(_) | Caller::Admin(_) => None,
        },
    };

    Ok(store
        .list_resources(&filter)
        .await?
        .into_iter()
        .map(ResourceSummary::from)
        .collect())
}

pub async fn create(
    store: &dyn Store,
    caller: &Caller,
    data: ResourceCreateData,
) -> ServiceResult<Resource> {
    let teacher = caller.teacher()?;

    if data.title.trim().is_empty() || data.kind.trim().is_empty() {
        return Err(ServiceError::Validation(
            "Resource needs a title and a type.".to_string(),
        ));
    }

    let resource = Resource {
        id: Uuid::new_v4(),
        title: data.title,
        kind: data.kind,
        content: data.content,
        subject: data.subject,
        grade: data.grade,
        teacher_id: teacher.id,
        created: Utc::now(),
    };
    store.insert_resource(&resource).await?;
    tracing::info!("Teacher {} saved resource {}", teacher.id, resource.id);

    Ok(resource)
}

/// Author only, whatever the role.
pub async fn delete(store: &dyn Store, caller: &Caller, id: Uuid) -> ServiceResult<()> {
    let resource = store
        .get_resource(id)
        .await?
        .ok_or_else(|| ServiceError::not_found("Resource", id))?;

    if resource.teacher_id != caller.id() {
        tracing::debug!("{} {} may not delete resource {}", caller.role(), caller.id(), id);
        return Err(ServiceError::forbidden("Only the author can delete a resource."));
    }

    store.delete_resource(id).await?;
    tracing::info!("Deleted resource {}", id);

    Ok(())
}
