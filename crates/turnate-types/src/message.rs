use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A message posted to a channel
///
/// `thread_id` points at the root message this one replies to. Roots have no
/// parent and replies are never nested further.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: Uuid,
    pub channel_id: Uuid,
    pub user_id: Uuid,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thread_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl Message {
    pub fn is_root(&self) -> bool {
        self.thread_id.is_none()
    }
}

/// Message as returned to a caller
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageView {
    #[serde(flatten)]
    pub message: Message,
    pub username: String,
    #[serde(skip_serializing_if = "is_zero")]
    pub reply_count: usize,
}

fn is_zero(n: &usize) -> bool {
    *n == 0
}
