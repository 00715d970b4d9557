use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

pub mod problem;
pub mod session;

/// Body of a `201 Created` answer.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Created {
    pub message: String,
    pub id: Uuid,
}

impl Created {
    pub fn new(message: impl ToString, id: Uuid) -> Created {
        Created {
            message: message.to_string(),
            id,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Message {
    pub message: String,
}

impl Message {
    pub fn new(message: impl ToString) -> Message {
        Message {
            message: message.to_string(),
        }
    }
}
