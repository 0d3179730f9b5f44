// ============================================================================
// Storage Seams
// ============================================================================
//
// The gateway never owns persistence. Users, channels, memberships and
// messages are reached through these traits; `memory` provides in-process
// implementations and a database-backed service plugs in the same way.
//
// ============================================================================

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use turnate_error::AppResult;
use turnate_types::{ChannelInfo, Message, Principal, UserUpdate};
use uuid::Uuid;

/// Authoritative user registry consulted on every authenticated request
#[async_trait]
pub trait UserRegistry: Send + Sync {
    async fn find_user(&self, user_id: Uuid) -> AppResult<Option<Principal>>;

    async fn find_by_username(&self, username: &str) -> AppResult<Option<Principal>>;

    /// Apply a profile change; `Ok(None)` if the user does not exist
    async fn update_user(
        &self,
        user_id: Uuid,
        update: &UserUpdate,
    ) -> AppResult<Option<Principal>>;

    /// Refresh the last-seen timestamp
    async fn touch_last_seen(&self, user_id: Uuid, at: DateTime<Utc>) -> AppResult<()>;
}

/// Channels and memberships
#[async_trait]
pub trait ChannelDirectory: Send + Sync {
    async fn find_channel(&self, channel_id: Uuid) -> AppResult<Option<ChannelInfo>>;

    async fn find_channel_by_name(&self, name: &str) -> AppResult<Option<ChannelInfo>>;

    async fn list_channels(&self) -> AppResult<Vec<ChannelInfo>>;

    /// Insert a channel; fails with `Conflict` if the name is taken
    async fn insert_channel(&self, channel: ChannelInfo) -> AppResult<()>;

    async fn is_member(&self, channel_id: Uuid, user_id: Uuid) -> AppResult<bool>;

    /// Returns false if the membership already existed
    async fn add_member(&self, channel_id: Uuid, user_id: Uuid) -> AppResult<bool>;

    /// Returns false if there was no membership to remove
    async fn remove_member(&self, channel_id: Uuid, user_id: Uuid) -> AppResult<bool>;

    async fn members(&self, channel_id: Uuid) -> AppResult<Vec<Uuid>>;

    /// Channels `user_id` belongs to
    async fn memberships(&self, user_id: Uuid) -> AppResult<Vec<Uuid>>;
}

/// Channel messages and their threads
#[async_trait]
pub trait MessageStore: Send + Sync {
    async fn find_message(&self, message_id: Uuid) -> AppResult<Option<Message>>;

    async fn insert_message(&self, message: Message) -> AppResult<()>;

    /// Root messages of a channel, newest first
    async fn root_messages(
        &self,
        channel_id: Uuid,
        limit: usize,
        offset: usize,
    ) -> AppResult<Vec<Message>>;

    /// Replies to a root message, oldest first
    async fn replies(&self, root_id: Uuid, limit: usize, offset: usize) -> AppResult<Vec<Message>>;

    async fn reply_count(&self, root_id: Uuid) -> AppResult<usize>;

    /// Root messages in any of `channel_ids` created after `since`, newest first
    async fn recent_roots(
        &self,
        channel_ids: &[Uuid],
        since: DateTime<Utc>,
        limit: usize,
    ) -> AppResult<Vec<Message>>;
}
