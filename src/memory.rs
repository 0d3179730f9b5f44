// ============================================================================
// In-Memory Stores
// ============================================================================
//
// Process-local implementations of the storage traits, used by tests and
// single-node deployments that do not need persistence.
//
// ============================================================================

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use turnate_error::{AppError, AppResult};
use turnate_types::{ChannelInfo, Membership, Message, Principal, UserRole, UserUpdate};
use uuid::Uuid;

use crate::registry::{ChannelDirectory, MessageStore, UserRegistry};

#[derive(Default)]
pub struct InMemoryUserRegistry {
    users: RwLock<HashMap<Uuid, Principal>>,
    fail_last_seen: AtomicBool,
}

impl InMemoryUserRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, principal: Principal) {
        self.users.write().await.insert(principal.id, principal);
    }

    pub async fn remove(&self, user_id: Uuid) -> Option<Principal> {
        self.users.write().await.remove(&user_id)
    }

    pub async fn set_active(&self, user_id: Uuid, active: bool) {
        if let Some(user) = self.users.write().await.get_mut(&user_id) {
            user.is_active = active;
        }
    }

    pub async fn set_role(&self, user_id: Uuid, role: UserRole) {
        if let Some(user) = self.users.write().await.get_mut(&user_id) {
            user.role = role;
        }
    }

    /// Make every last-seen refresh fail, to exercise the best-effort path
    pub fn fail_last_seen_updates(&self, fail: bool) {
        self.fail_last_seen.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl UserRegistry for InMemoryUserRegistry {
    async fn find_user(&self, user_id: Uuid) -> AppResult<Option<Principal>> {
        Ok(self.users.read().await.get(&user_id).cloned())
    }

    async fn find_by_username(&self, username: &str) -> AppResult<Option<Principal>> {
        Ok(self
            .users
            .read()
            .await
            .values()
            .find(|user| user.username == username)
            .cloned())
    }

    async fn update_user(
        &self,
        user_id: Uuid,
        update: &UserUpdate,
    ) -> AppResult<Option<Principal>> {
        let mut users = self.users.write().await;
        Ok(users.get_mut(&user_id).map(|user| {
            update.apply(user);
            user.clone()
        }))
    }

    async fn touch_last_seen(&self, user_id: Uuid, at: DateTime<Utc>) -> AppResult<()> {
        if self.fail_last_seen.load(Ordering::SeqCst) {
            return Err(AppError::internal("last-seen store unavailable"));
        }
        if let Some(user) = self.users.write().await.get_mut(&user_id) {
            user.last_seen_at = Some(at);
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryChannelDirectory {
    channels: RwLock<HashMap<Uuid, ChannelInfo>>,
    memberships: RwLock<HashSet<Membership>>,
}

impl InMemoryChannelDirectory {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ChannelDirectory for InMemoryChannelDirectory {
    async fn find_channel(&self, channel_id: Uuid) -> AppResult<Option<ChannelInfo>> {
        Ok(self.channels.read().await.get(&channel_id).cloned())
    }

    async fn find_channel_by_name(&self, name: &str) -> AppResult<Option<ChannelInfo>> {
        Ok(self
            .channels
            .read()
            .await
            .values()
            .find(|channel| channel.name == name)
            .cloned())
    }

    async fn list_channels(&self) -> AppResult<Vec<ChannelInfo>> {
        let mut channels: Vec<ChannelInfo> = self.channels.read().await.values().cloned().collect();
        channels.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(channels)
    }

    async fn insert_channel(&self, channel: ChannelInfo) -> AppResult<()> {
        let mut channels = self.channels.write().await;
        if channels.values().any(|existing| existing.name == channel.name) {
            return Err(AppError::conflict("Channel name already exists"));
        }
        channels.insert(channel.id, channel);
        Ok(())
    }

    async fn is_member(&self, channel_id: Uuid, user_id: Uuid) -> AppResult<bool> {
        Ok(self
            .memberships
            .read()
            .await
            .contains(&Membership {
                channel_id,
                user_id,
            }))
    }

    async fn add_member(&self, channel_id: Uuid, user_id: Uuid) -> AppResult<bool> {
        Ok(self.memberships.write().await.insert(Membership {
            channel_id,
            user_id,
        }))
    }

    async fn remove_member(&self, channel_id: Uuid, user_id: Uuid) -> AppResult<bool> {
        Ok(self.memberships.write().await.remove(&Membership {
            channel_id,
            user_id,
        }))
    }

    async fn members(&self, channel_id: Uuid) -> AppResult<Vec<Uuid>> {
        Ok(self
            .memberships
            .read()
            .await
            .iter()
            .filter(|m| m.channel_id == channel_id)
            .map(|m| m.user_id)
            .collect())
    }

    async fn memberships(&self, user_id: Uuid) -> AppResult<Vec<Uuid>> {
        Ok(self
            .memberships
            .read()
            .await
            .iter()
            .filter(|m| m.user_id == user_id)
            .map(|m| m.channel_id)
            .collect())
    }
}

#[derive(Default)]
pub struct InMemoryMessageStore {
    messages: RwLock<Vec<Message>>,
}

impl InMemoryMessageStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MessageStore for InMemoryMessageStore {
    async fn find_message(&self, message_id: Uuid) -> AppResult<Option<Message>> {
        Ok(self
            .messages
            .read()
            .await
            .iter()
            .find(|m| m.id == message_id)
            .cloned())
    }

    async fn insert_message(&self, message: Message) -> AppResult<()> {
        self.messages.write().await.push(message);
        Ok(())
    }

    async fn root_messages(
        &self,
        channel_id: Uuid,
        limit: usize,
        offset: usize,
    ) -> AppResult<Vec<Message>> {
        // Insertion order is chronological
        Ok(self
            .messages
            .read()
            .await
            .iter()
            .rev()
            .filter(|m| m.channel_id == channel_id && m.is_root())
            .skip(offset)
            .take(limit)
            .cloned()
            .collect())
    }

    async fn replies(&self, root_id: Uuid, limit: usize, offset: usize) -> AppResult<Vec<Message>> {
        Ok(self
            .messages
            .read()
            .await
            .iter()
            .filter(|m| m.thread_id == Some(root_id))
            .skip(offset)
            .take(limit)
            .cloned()
            .collect())
    }

    async fn reply_count(&self, root_id: Uuid) -> AppResult<usize> {
        Ok(self
            .messages
            .read()
            .await
            .iter()
            .filter(|m| m.thread_id == Some(root_id))
            .count())
    }

    async fn recent_roots(
        &self,
        channel_ids: &[Uuid],
        since: DateTime<Utc>,
        limit: usize,
    ) -> AppResult<Vec<Message>> {
        Ok(self
            .messages
            .read()
            .await
            .iter()
            .rev()
            .filter(|m| m.is_root() && m.created_at > since && channel_ids.contains(&m.channel_id))
            .take(limit)
            .cloned()
            .collect())
    }
}
