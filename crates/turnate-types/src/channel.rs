use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Channel visibility
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ChannelType {
    #[default]
    Public,
    Private,
}

impl ChannelType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Public => "public",
            Self::Private => "private",
        }
    }

    pub fn is_private(&self) -> bool {
        matches!(self, Self::Private)
    }
}

/// A shared channel (the resource guarded by authorization)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelInfo {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    #[serde(rename = "type")]
    pub channel_type: ChannelType,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
}

/// Existence-only relation: presence grants access
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Membership {
    pub channel_id: Uuid,
    pub user_id: Uuid,
}

/// Channel as returned to a caller
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelView {
    #[serde(flatten)]
    pub channel: ChannelInfo,
    pub member_count: usize,
    pub is_member: bool,
}
