use std::sync::Arc;

pub mod assignment;
pub mod class;
pub mod filter;
pub mod memory;
pub mod mongo;
pub mod resource;
pub mod session;
pub mod submission;
pub mod user;

use assignment::db::AssignmentDb;
use class::db::ClassDb;
use resource::db::ResourceDb;
use session::SessionDb;
use submission::db::SubmissionDb;
use user::db::UserDb;

/// Everything the services persist. Implemented by [`memory::MemoryStore`]
/// and by [`mongodb::Database`].
pub trait Store:
    UserDb + ClassDb + AssignmentDb + SubmissionDb + ResourceDb + SessionDb + Send + Sync
{
}

impl<T> Store for T where
    T: UserDb + ClassDb + AssignmentDb + SubmissionDb + ResourceDb + SessionDb + Send + Sync
{
}

pub type SharedStore = Arc<dyn Store>;
