//! In-process [`Store`](super::Store) used by tests and by `storage: memory`.
//!
//! Records live in insertion ordered vectors. Every method takes the lock
//! once, so each write is atomic like a single MongoDB document write.
use std::collections::HashMap;

use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::ServiceResult;

use super::assignment::db::AssignmentDb;
use super::assignment::Assignment;
use super::class::db::{ClassDb, ClassFilter};
use super::class::Class;
use super::resource::db::{ResourceDb, ResourceFilter};
use super::resource::Resource;
use super::session::{SessionDb, SessionRecord};
use super::submission::db::{SubmissionDb, SubmissionFilter};
use super::submission::{Submission, SubmissionStatus};
use super::user::db::{email_taken, UserDb, UserFilter};
use super::user::User;

#[derive(Debug, Default)]
pub struct MemoryStore {
    users: RwLock<Vec<User>>,
    classes: RwLock<Vec<Class>>,
    assignments: RwLock<Vec<Assignment>>,
    submissions: RwLock<Vec<Submission>>,
    resources: RwLock<Vec<Resource>>,
    sessions: RwLock<HashMap<Uuid, SessionRecord>>,
}

impl MemoryStore {
    pub fn new() -> MemoryStore {
        MemoryStore::default()
    }
}

fn remove_by<T>(items: &mut Vec<T>, pred: impl Fn(&T) -> bool) -> Option<T> {
    items.iter().position(pred).map(|at| items.remove(at))
}

#[rocket::async_trait]
impl UserDb for MemoryStore {
    async fn insert_user(&self, user: &User) -> ServiceResult<()> {
        let mut users = self.users.write().await;
        if users.iter().any(|it| it.email == user.email) {
            return Err(email_taken(&user.email));
        }
        users.push(user.clone());
        Ok(())
    }

    async fn get_user(&self, id: Uuid) -> ServiceResult<Option<User>> {
        Ok(self.users.read().await.iter().find(|it| it.id == id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> ServiceResult<Option<User>> {
        Ok(self
            .users
            .read()
            .await
            .iter()
            .find(|it| it.email == email)
            .cloned())
    }

    async fn list_users(&self, filter: &UserFilter) -> ServiceResult<Vec<User>> {
        Ok(self
            .users
            .read()
            .await
            .iter()
            .filter(|it| filter.matches(it))
            .cloned()
            .collect())
    }

    async fn update_user(&self, user: &User) -> ServiceResult<()> {
        let mut users = self.users.write().await;
        if let Some(stored) = users.iter_mut().find(|it| it.id == user.id) {
            *stored = user.clone();
        }
        Ok(())
    }

    async fn delete_user(&self, id: Uuid) -> ServiceResult<Option<User>> {
        Ok(remove_by(&mut *self.users.write().await, |it| it.id == id))
    }
}

#[rocket::async_trait]
impl ClassDb for MemoryStore {
    async fn insert_class(&self, class: &Class) -> ServiceResult<()> {
        self.classes.write().await.push(class.clone());
        Ok(())
    }

    async fn get_class(&self, id: Uuid) -> ServiceResult<Option<Class>> {
        Ok(self
            .classes
            .read()
            .await
            .iter()
            .find(|it| it.id == id)
            .cloned())
    }

    async fn list_classes(&self, filter: &ClassFilter) -> ServiceResult<Vec<Class>> {
        Ok(self
            .classes
            .read()
            .await
            .iter()
            .filter(|it| filter.matches(it))
            .cloned()
            .collect())
    }

    async fn class_names(&self) -> ServiceResult<Vec<String>> {
        let mut names: Vec<String> = vec![];
        for class in self.classes.read().await.iter() {
            if !names.contains(&class.name) {
                names.push(class.name.clone());
            }
        }
        Ok(names)
    }

    async fn delete_class(&self, id: Uuid) -> ServiceResult<Option<Class>> {
        Ok(remove_by(&mut *self.classes.write().await, |it| it.id == id))
    }
}

#[rocket::async_trait]
impl AssignmentDb for MemoryStore {
    async fn insert_assignment(&self, assignment: &Assignment) -> ServiceResult<()> {
        self.assignments.write().await.push(assignment.clone());
        Ok(())
    }

    async fn get_assignment(&self, id: Uuid) -> ServiceResult<Option<Assignment>> {
        Ok(self
            .assignments
            .read()
            .await
            .iter()
            .find(|it| it.id == id)
            .cloned())
    }

    async fn assignments_in(&self, classes: &[Uuid]) -> ServiceResult<Vec<Assignment>> {
        Ok(self
            .assignments
            .read()
            .await
            .iter()
            .filter(|it| classes.contains(&it.class_id))
            .cloned()
            .collect())
    }
}

#[rocket::async_trait]
impl SubmissionDb for MemoryStore {
    async fn insert_submission(&self, submission: &Submission) -> ServiceResult<()> {
        self.submissions.write().await.push(submission.clone());
        Ok(())
    }

    async fn get_submission(&self, id: Uuid) -> ServiceResult<Option<Submission>> {
        Ok(self
            .submissions
            .read()
            .await
            .iter()
            .find(|it| it.id == id)
            .cloned())
    }

    async fn list_submissions(&self, filter: &SubmissionFilter) -> ServiceResult<Vec<Submission>> {
        Ok(self
            .submissions
            .read()
            .await
            .iter()
            .filter(|it| filter.matches(it))
            .cloned()
            .collect())
    }

    async fn record_grade(
        &self,
        id: Uuid,
        grade: Option<String>,
        feedback: Option<String>,
    ) -> ServiceResult<Option<Submission>> {
        let mut submissions = self.submissions.write().await;
        Ok(submissions.iter_mut().find(|it| it.id == id).map(|it| {
            it.grade = grade;
            it.feedback = feedback;
            it.status = SubmissionStatus::Graded;
            it.clone()
        }))
    }
}

#[rocket::async_trait]
impl ResourceDb for MemoryStore {
    async fn insert_resource(&self, resource: &Resource) -> ServiceResult<()> {
        self.resources.write().await.push(resource.clone());
        Ok(())
    }

    async fn get_resource(&self, id: Uuid) -> ServiceResult<Option<Resource>> {
        Ok(self
            .resources
            .read()
            .await
            .iter()
            .find(|it| it.id == id)
            .cloned())
    }

    async fn list_resources(&self, filter: &ResourceFilter) -> ServiceResult<Vec<Resource>> {
        Ok(self
            .resources
            .read()
            .await
            .iter()
            .filter(|it| filter.matches(it))
            .cloned()
            .collect())
    }

    async fn delete_resource(&self, id: Uuid) -> ServiceResult<Option<Resource>> {
        Ok(remove_by(&mut *self.resources.write().await, |it| it.id == id))
    }
}

#[rocket::async_trait]
impl SessionDb for MemoryStore {
    async fn insert_session(&self, session: &SessionRecord) -> ServiceResult<()> {
        self.sessions
            .write()
            .await
            .insert(session.id, session.clone());
        Ok(())
    }

    async fn get_session(&self, id: Uuid) -> ServiceResult<Option<SessionRecord>> {
        Ok(self.sessions.read().await.get(&id).cloned())
    }

    async fn delete_session(&self, id: Uuid) -> ServiceResult<()> {
        self.sessions.write().await.remove(&id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::class::db::ClassFilter;
    use crate::error::ServiceError;
    use crate::testing;

    #[rocket::async_test]
    async fn duplicate_email_is_a_conflict() {
        let store = MemoryStore::new();
        let first = testing::user_record("dup", crate::role::Role::Teacher, None);
        let mut second = testing::user_record("other", crate::role::Role::Student, None);
        second.email = first.email.clone();

        store.insert_user(&first).await.unwrap();
        assert!(matches!(
            store.insert_user(&second).await,
            Err(ServiceError::Conflict(_))
        ));
        assert_eq!(store.list_users(&UserFilter::default()).await.unwrap().len(), 1);
    }

    #[rocket::async_test]
    async fn class_names_are_distinct_and_ordered() {
        let store = MemoryStore::new();
        let teacher = Uuid::new_v4();
        for name in ["5B", "5A", "5B"] {
            store.insert_class(&Class::new(name, teacher)).await.unwrap();
        }

        assert_eq!(store.class_names().await.unwrap(), vec!["5B", "5A"]);
        assert_eq!(
            store
                .list_classes(&ClassFilter::named("5B"))
                .await
                .unwrap()
                .len(),
            2
        );
    }

    #[rocket::async_test]
    async fn record_grade_overwrites() {
        let store = MemoryStore::new();
        let submission = Submission::new(Uuid::new_v4(), Uuid::new_v4(), None);
        store.insert_submission(&submission).await.unwrap();

        store
            .record_grade(submission.id, Some("C".into()), Some("first".into()))
            .await
            .unwrap();
        let graded = store
            .record_grade(submission.id, Some("A".into()), None)
            .await
            .unwrap()
            .expect("submission exists");

        assert_eq!(graded.status, SubmissionStatus::Graded);
        assert_eq!(graded.grade.as_deref(), Some("A"));
        assert_eq!(graded.feedback, None);
        assert!(store
            .record_grade(Uuid::new_v4(), None, None)
            .await
            .unwrap()
            .is_none());
    }
}
