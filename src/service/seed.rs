//! Demo school used for local development: two classes, three teachers,
//! three students, two admins, a few assignments and library entries.
//!
//! Every demo account signs in with [`DEMO_PASSWORD`] or PIN [`DEMO_PIN`].
use chrono::{Duration, Utc};

use crate::caller::Caller;
use crate::data::assignment::db::AssignmentCreateData;
use crate::data::class::db::ClassCreateData;
use crate::data::resource::db::ResourceCreateData;
use crate::data::user::db::{UserFilter, UserSignupData};
use crate::data::user::User;
use crate::data::Store;
use crate::error::{ServiceError, ServiceResult};
use crate::role::Role;

use super::{assignments, identity, library, roster};

pub const DEMO_PASSWORD: &str = "password";
pub const DEMO_PIN: &str = "1234";

/// What [`demo_school`] stored.
#[derive(Debug, Default, Clone, Copy, Eq, PartialEq)]
pub struct SeedReport {
    pub users: usize,
    pub classes: usize,
    pub assignments: usize,
    pub resources: usize,
}

const ACCOUNTS: [(&str, &str, Role, Option<&str>); 8] = [
    ("Mr. Johnson", "johnson@school.org", Role::Teacher, None),
    ("Ms. Garcia", "garcia@school.org", Role::Teacher, None),
    ("Mrs. Thompson", "thompson@school.org", Role::Teacher, None),
    ("Emma Wilson", "emma@school.org", Role::Student, Some("Grade 5A")),
    ("James Chen", "james@school.org", Role::Student, Some("Grade 5A")),
    ("Sofia Martinez", "sofia@school.org", Role::Student, Some("Grade 5B")),
    ("Dr. Anderson", "admin@school.org", Role::Admin, None),
    ("Ms. Roberts", "roberts@school.org", Role::Admin, None),
];

/// (title, subject, description, days until due)
const ASSIGNMENTS: [(&str, &str, &str, i64); 3] = [
    (
        "Write a short story about your summer vacation",
        "English",
        "Write a creative short story (200-300 words) about a memorable summer vacation experience.",
        5,
    ),
    (
        "Complete math worksheet: Fractions",
        "Mathematics",
        "Complete the attached worksheet on adding and subtracting fractions with unlike denominators.",
        2,
    ),
    (
        "Science project: Water cycle diagram",
        "Science",
        "Create a colorful diagram showing the water cycle with labels for evaporation, condensation, and precipitation.",
        7,
    ),
];

/// Fills an empty store with the demo school. Refuses with
/// [`ServiceError::Conflict`] once any account exists, so it never mixes
/// with real data.
pub async fn demo_school(store: &dyn Store, password_cost: u32) -> ServiceResult<SeedReport> {
    if !store.list_users(&UserFilter::default()).await?.is_empty() {
        return Err(ServiceError::Conflict(
            "Store already holds accounts, not seeding.".to_string(),
        ));
    }

    let mut report = SeedReport::default();
    let mut users: Vec<User> = Vec::with_capacity(ACCOUNTS.len());
    for (name, email, role, class_name) in ACCOUNTS {
        let signup = UserSignupData {
            name: name.to_string(),
            email: email.to_string(),
            password: DEMO_PASSWORD.to_string(),
            role,
            pin: Some(DEMO_PIN.to_string()),
            class_name: class_name.map(str::to_string),
        };
        users.push(identity::register(store, signup, password_cost).await?);
        report.users += 1;
    }

    let johnson = Caller::from(&users[0]);
    let garcia = Caller::from(&users[1]);

    let class_5a = roster::create(store, &johnson, ClassCreateData { name: "Grade 5A".to_string() }).await?;
    roster::create(store, &garcia, ClassCreateData { name: "Grade 5B".to_string() }).await?;
    report.classes += 2;

    for (title, subject, description, days) in ASSIGNMENTS {
        let due = (Utc::now() + Duration::days(days)).format("%Y-%m-%d").to_string();
        let data = AssignmentCreateData {
            class_id: class_5a.id,
            title: title.to_string(),
            subject: Some(subject.to_string()),
            description: Some(description.to_string()),
            due_date: Some(due),
            status: None,
        };
        assignments::create(store, &johnson, data).await?;
        report.assignments += 1;
    }

    let resources = [
        (
            &johnson,
            "Fractions Guide",
            "worksheet",
            "Mathematics",
            "A comprehensive guide on understanding and working with fractions...",
        ),
        (
            &garcia,
            "Water Cycle Explanation",
            "video",
            "Science",
            "Video explaining the water cycle process...",
        ),
    ];
    for (author, title, kind, subject, content) in resources {
        let data = ResourceCreateData {
            title: title.to_string(),
            kind: kind.to_string(),
            content: Some(content.to_string()),
            subject: Some(subject.to_string()),
            grade: Some("Grade 5".to_string()),
        };
        library::create(store, author, data).await?;
        report.resources += 1;
    }

    tracing::info!(
        "Seeded demo school: {} users, {} classes, {} assignments, {} resources",
        report.users,
        report.classes,
        report.assignments,
        report.resources
    );

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::memory::MemoryStore;
    use crate::data::user::db::{Credentials, UserDb};
    use crate::testing::TEST_COST;

    #[rocket::async_test]
    async fn seeds_an_empty_store_once() {
        let store = MemoryStore::new();

        let report = demo_school(&store, TEST_COST).await.unwrap();
        assert_eq!(
            report,
            SeedReport {
                users: 8,
                classes: 2,
                assignments: 3,
                resources: 2,
            }
        );

        let emma = identity::authenticate(
            &store,
            Credentials::Password {
                email: "emma@school.org",
                password: DEMO_PASSWORD,
            },
        )
        .await
        .unwrap();
        let visible = assignments::list_visible(&store, &Caller::from(&emma)).await.unwrap();
        assert_eq!(visible.len(), 3);

        let sofia = store
            .list_users(&UserFilter {
                role: Some(Role::Student),
                class_name: Some("Grade 5B".to_string()),
            })
            .await
            .unwrap();
        assert_eq!(sofia.len(), 1);
        let nothing_due = assignments::list_visible(&store, &Caller::from(&sofia[0])).await.unwrap();
        assert!(nothing_due.is_empty());

        assert!(matches!(
            demo_school(&store, TEST_COST).await,
            Err(ServiceError::Conflict(_))
        ));
    }
}
