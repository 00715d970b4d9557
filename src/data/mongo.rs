//! [`Store`](super::Store) on a MongoDB database, one collection per entity.
use std::time::Duration;

use bson::{doc, Bson, Document};
use mongodb::error::{ErrorKind, WriteFailure};
use mongodb::options::{FindOneAndUpdateOptions, FindOptions, IndexOptions, ReturnDocument};
use mongodb::{Database, IndexModel};
use rocket::futures::TryStreamExt;
use uuid::Uuid;

use crate::error::{ServiceError, ServiceResult};

use super::assignment::db::AssignmentDb;
use super::assignment::{Assignment, ASSIGNMENT_COLLECTION_NAME};
use super::class::db::{ClassDb, ClassFilter};
use super::class::{Class, CLASS_COLLECTION_NAME};
use super::filter;
use super::resource::db::{ResourceDb, ResourceFilter};
use super::resource::{Resource, RESOURCE_COLLECTION_NAME};
use super::session::{SessionDb, SessionRecord, SESSION_COLLECTION_NAME};
use super::submission::db::{SubmissionDb, SubmissionFilter};
use super::submission::{Submission, SubmissionStatus, SUBMISSION_COLLECTION_NAME};
use super::user::db::{email_taken, UserDb, UserFilter};
use super::user::{User, USER_COLLECTION_NAME};

const DUPLICATE_KEY: i32 = 11000;

/// Creates the indexes the store relies on. Safe to run on every start.
pub async fn prepare(db: &Database) -> Result<(), mongodb::error::Error> {
    let email_index = IndexModel::builder()
        .keys(doc! { "email": 1 })
        .options(IndexOptions::builder().unique(true).build())
        .build();

    db.collection::<User>(USER_COLLECTION_NAME)
        .create_index(email_index, None)
        .await?;

    let expiry_index = IndexModel::builder()
        .keys(doc! { "expires": 1 })
        .options(IndexOptions::builder().expire_after(Duration::ZERO).build())
        .build();

    db.collection::<SessionRecord>(SESSION_COLLECTION_NAME)
        .create_index(expiry_index, None)
        .await?;

    Ok(())
}

/// Insertion order: `_id`s are random, so sort on the creation timestamp.
fn oldest_first(field: &str) -> FindOptions {
    let mut sort = Document::new();
    sort.insert(field, 1);
    FindOptions::builder().sort(sort).build()
}

fn is_duplicate_key(e: &mongodb::error::Error) -> bool {
    matches!(
        e.kind.as_ref(),
        ErrorKind::Write(WriteFailure::WriteError(write)) if write.code == DUPLICATE_KEY
    )
}

#[rocket::async_trait]
impl UserDb for Database {
    async fn insert_user(&self, user: &User) -> ServiceResult<()> {
        match self
            .collection::<User>(USER_COLLECTION_NAME)
            .insert_one(user, None)
            .await
        {
            Ok(_) => Ok(()),
            Err(e) if is_duplicate_key(&e) => Err(email_taken(&user.email)),
            Err(e) => Err(e.into()),
        }
    }

    async fn get_user(&self, id: Uuid) -> ServiceResult<Option<User>> {
        Ok(self
            .collection::<User>(USER_COLLECTION_NAME)
            .find_one(filter::by_id(id), None)
            .await?)
    }

    async fn find_user_by_email(&self, email: &str) -> ServiceResult<Option<User>> {
        Ok(self
            .collection::<User>(USER_COLLECTION_NAME)
            .find_one(filter::by_email(email), None)
            .await?)
    }

    async fn list_users(&self, user_filter: &UserFilter) -> ServiceResult<Vec<User>> {
        let mut query = doc! {};
        if let Some(role) = user_filter.role {
            query.insert("role", role.as_str());
        }
        if let Some(class_name) = &user_filter.class_name {
            query.insert("class_name", class_name.as_str());
        }

        let users = self
            .collection::<User>(USER_COLLECTION_NAME)
            .find(query, oldest_first("created"))
            .await?
            .try_collect()
            .await?;
        Ok(users)
    }

    async fn update_user(&self, user: &User) -> ServiceResult<()> {
        self.collection::<User>(USER_COLLECTION_NAME)
            .replace_one(filter::by_id(user.id), user, None)
            .await?;
        Ok(())
    }

    async fn delete_user(&self, id: Uuid) -> ServiceResult<Option<User>> {
        Ok(self
            .collection::<User>(USER_COLLECTION_NAME)
            .find_one_and_delete(filter::by_id(id), None)
            .await?)
    }
}

#[rocket::async_trait]
impl ClassDb for Database {
    async fn insert_class(&self, class: &Class) -> ServiceResult<()> {
        self.collection::<Class>(CLASS_COLLECTION_NAME)
            .insert_one(class, None)
            .await?;
        Ok(())
    }

    async fn get_class(&self, id: Uuid) -> ServiceResult<Option<Class>> {
        Ok(self
            .collection::<Class>(CLASS_COLLECTION_NAME)
            .find_one(filter::by_id(id), None)
            .await?)
    }

    async fn list_classes(&self, class_filter: &ClassFilter) -> ServiceResult<Vec<Class>> {
        let mut query = doc! {};
        if let Some(teacher) = class_filter.teacher {
            query.insert("teacher_id", filter::uuid(teacher));
        }
        if let Some(name) = &class_filter.name {
            query.insert("name", name.as_str());
        }

        let classes = self
            .collection::<Class>(CLASS_COLLECTION_NAME)
            .find(query, oldest_first("created"))
            .await?
            .try_collect()
            .await?;
        Ok(classes)
    }

    async fn class_names(&self) -> ServiceResult<Vec<String>> {
        let names = self
            .collection::<Class>(CLASS_COLLECTION_NAME)
            .distinct("name", None, None)
            .await?
            .into_iter()
            .filter_map(|name| match name {
                Bson::String(name) => Some(name),
                _ => None,
            })
            .collect();
        Ok(names)
    }

    async fn delete_class(&self, id: Uuid) -> ServiceResult<Option<Class>> {
        Ok(self
            .collection::<Class>(CLASS_COLLECTION_NAME)
            .find_one_and_delete(filter::by_id(id), None)
            .await?)
    }
}

#[rocket::async_trait]
impl AssignmentDb for Database {
    async fn insert_assignment(&self, assignment: &Assignment) -> ServiceResult<()> {
        self.collection::<Assignment>(ASSIGNMENT_COLLECTION_NAME)
            .insert_one(assignment, None)
            .await?;
        Ok(())
    }

    async fn get_assignment(&self, id: Uuid) -> ServiceResult<Option<Assignment>> {
        Ok(self
            .collection::<Assignment>(ASSIGNMENT_COLLECTION_NAME)
            .find_one(filter::by_id(id), None)
            .await?)
    }

    async fn assignments_in(&self, classes: &[Uuid]) -> ServiceResult<Vec<Assignment>> {
        if classes.is_empty() {
            return Ok(vec![]);
        }

        let assignments = self
            .collection::<Assignment>(ASSIGNMENT_COLLECTION_NAME)
            .find(
                doc! { "class_id": filter::uuid_in(classes) },
                oldest_first("created"),
            )
            .await?
            .try_collect()
            .await?;
        Ok(assignments)
    }
}

#[rocket::async_trait]
impl SubmissionDb for Database {
    async fn insert_submission(&self, submission: &Submission) -> ServiceResult<()> {
        self.collection::<Submission>(SUBMISSION_COLLECTION_NAME)
            .insert_one(submission, None)
            .await?;
        Ok(())
    }

    async fn get_submission(&self, id: Uuid) -> ServiceResult<Option<Submission>> {
        Ok(self
            .collection::<Submission>(SUBMISSION_COLLECTION_NAME)
            .find_one(filter::by_id(id), None)
            .await?)
    }

    async fn list_submissions(
        &self,
        submission_filter: &SubmissionFilter,
    ) -> ServiceResult<Vec<Submission>> {
        let mut query = doc! {};
        if let Some(assignments) = &submission_filter.assignments {
            if assignments.is_empty() {
                return Ok(vec![]);
            }
            query.insert("assignment_id", filter::uuid_in(assignments));
        }
        if let Some(student) = submission_filter.student {
            query.insert("student_id", filter::uuid(student));
        }
        if submission_filter.ungraded_only {
            query.insert("status", doc! { "$ne": SubmissionStatus::Graded.as_str() });
        }

        let submissions = self
            .collection::<Submission>(SUBMISSION_COLLECTION_NAME)
            .find(query, oldest_first("submitted_at"))
            .await?
            .try_collect()
            .await?;
        Ok(submissions)
    }

    async fn record_grade(
        &self,
        id: Uuid,
        grade: Option<String>,
        feedback: Option<String>,
    ) -> ServiceResult<Option<Submission>> {
        let update = doc! {
            "$set": {
                "grade": grade,
                "feedback": feedback,
                "status": SubmissionStatus::Graded.as_str(),
            }
        };
        let options = FindOneAndUpdateOptions::builder()
            .return_document(ReturnDocument::After)
            .build();

        Ok(self
            .collection::<Submission>(SUBMISSION_COLLECTION_NAME)
            .find_one_and_update(filter::by_id(id), update, options)
            .await?)
    }
}

#[rocket::async_trait]
impl ResourceDb for Database {
    async fn insert_resource(&self, resource: &Resource) -> ServiceResult<()> {
        self.collection::<Resource>(RESOURCE_COLLECTION_NAME)
            .insert_one(resource, None)
            .await?;
        Ok(())
    }

    async fn get_resource(&self, id: Uuid) -> ServiceResult<Option<Resource>> {
        Ok(self
            .collection::<Resource>(RESOURCE_COLLECTION_NAME)
            .find_one(filter::by_id(id), None)
            .await?)
    }

    async fn list_resources(&self, resource_filter: &ResourceFilter) -> ServiceResult<Vec<Resource>> {
        let mut query = doc! {};
        if let Some(kind) = &resource_filter.kind {
            query.insert("type", kind.as_str());
        }
        if let Some(subject) = &resource_filter.subject {
            query.insert("subject", subject.as_str());
        }
        if let Some(author) = resource_filter.author {
            query.insert("teacher_id", filter::uuid(author));
        }

        let resources = self
            .collection::<Resource>(RESOURCE_COLLECTION_NAME)
            .find(query, oldest_first("created"))
            .await?
            .try_collect()
            .await?;
        Ok(resources)
    }

    async fn delete_resource(&self, id: Uuid) -> ServiceResult<Option<Resource>> {
        Ok(self
            .collection::<Resource>(RESOURCE_COLLECTION_NAME)
            .find_one_and_delete(filter::by_id(id), None)
            .await?)
    }
}

#[rocket::async_trait]
impl SessionDb for Database {
    async fn insert_session(&self, session: &SessionRecord) -> ServiceResult<()> {
        self.collection::<SessionRecord>(SESSION_COLLECTION_NAME)
            .insert_one(session, None)
            .await?;
        Ok(())
    }

    async fn get_session(&self, id: Uuid) -> ServiceResult<Option<SessionRecord>> {
        Ok(self
            .collection::<SessionRecord>(SESSION_COLLECTION_NAME)
            .find_one(filter::by_id(id), None)
            .await?)
    }

    async fn delete_session(&self, id: Uuid) -> ServiceResult<()> {
        self.collection::<SessionRecord>(SESSION_COLLECTION_NAME)
            .delete_one(filter::by_id(id), None)
            .await
            .map_err(ServiceError::from)?;
        Ok(())
    }
}
