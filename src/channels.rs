// ============================================================================
// Channel Operations
// ============================================================================
//
// Every operation loads the channel, gathers `AccessFacts` for the caller and
// asks `access` for a decision before touching storage.
//
// ============================================================================

use std::sync::Arc;

use chrono::{Duration, Utc};
use serde::Deserialize;
use turnate_error::{AppError, AppResult};
use turnate_types::{
    AuthContext, ChannelInfo, ChannelType, ChannelView, Message, MessageView, Principal,
};
use uuid::Uuid;

use crate::access::{self, AccessFacts, ChannelAction};
use crate::registry::{ChannelDirectory, MessageStore, UserRegistry};
use crate::utils::{normalize_channel_name, sanitize_string};

const DEFAULT_PAGE_SIZE: usize = 50;
const MAX_PAGE_SIZE: usize = 100;
const MAX_NAME_LEN: usize = 100;
const MAX_DESCRIPTION_LEN: usize = 500;
const MAX_CONTENT_LEN: usize = 4000;
const RECENT_WINDOW_HOURS: i64 = 24;
const RECENT_LIMIT: usize = 20;

#[derive(Debug, Clone, Deserialize)]
pub struct CreateChannel {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, rename = "type")]
    pub channel_type: ChannelType,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PostMessage {
    pub content: String,
    #[serde(default)]
    pub thread_id: Option<Uuid>,
}

/// Pagination window, clamped to sane values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(from = "RawPage")]
pub struct Page {
    pub limit: usize,
    pub offset: usize,
}

#[derive(Debug, Deserialize)]
struct RawPage {
    limit: Option<i64>,
    offset: Option<i64>,
}

impl From<RawPage> for Page {
    fn from(raw: RawPage) -> Self {
        Page::new(raw.limit, raw.offset)
    }
}

impl Page {
    pub fn new(limit: Option<i64>, offset: Option<i64>) -> Self {
        let limit = match limit {
            Some(n) if n > 0 && (n as usize) <= MAX_PAGE_SIZE => n as usize,
            _ => DEFAULT_PAGE_SIZE,
        };
        let offset = offset.filter(|n| *n > 0).unwrap_or(0) as usize;
        Self { limit, offset }
    }
}

impl Default for Page {
    fn default() -> Self {
        Page::new(None, None)
    }
}

pub struct ChannelService {
    directory: Arc<dyn ChannelDirectory>,
    messages: Arc<dyn MessageStore>,
    users: Arc<dyn UserRegistry>,
    default_channel: String,
}

impl ChannelService {
    pub fn new(
        directory: Arc<dyn ChannelDirectory>,
        messages: Arc<dyn MessageStore>,
        users: Arc<dyn UserRegistry>,
        default_channel: impl Into<String>,
    ) -> Self {
        Self {
            directory,
            messages,
            users,
            default_channel: default_channel.into(),
        }
    }

    /// Create the default channel if it does not exist yet
    pub async fn ensure_default_channel(&self, owner: Uuid) -> AppResult<ChannelInfo> {
        if let Some(existing) = self.directory.find_channel_by_name(&self.default_channel).await? {
            return Ok(existing);
        }

        let channel = ChannelInfo {
            id: Uuid::new_v4(),
            name: self.default_channel.clone(),
            description: "General discussion".to_string(),
            channel_type: ChannelType::Public,
            created_by: owner,
            created_at: Utc::now(),
        };
        self.directory.insert_channel(channel.clone()).await?;
        tracing::info!(channel = %channel.name, "Default channel created");
        Ok(channel)
    }

    pub async fn create_channel(
        &self,
        caller: &AuthContext,
        request: CreateChannel,
    ) -> AppResult<ChannelView> {
        access::authorize_create(caller.role, request.channel_type)?;

        let name = normalize_channel_name(&request.name);
        if name.is_empty() || name.chars().count() > MAX_NAME_LEN {
            return Err(AppError::validation(format!(
                "Channel name must be between 1 and {} characters",
                MAX_NAME_LEN
            )));
        }
        let description = sanitize_string(&request.description);
        if description.chars().count() > MAX_DESCRIPTION_LEN {
            return Err(AppError::validation("Channel description is too long"));
        }
        if self.directory.find_channel_by_name(&name).await?.is_some() {
            return Err(AppError::conflict("Channel name already exists"));
        }

        let channel = ChannelInfo {
            id: Uuid::new_v4(),
            name,
            description,
            channel_type: request.channel_type,
            created_by: caller.user_id,
            created_at: Utc::now(),
        };
        self.directory.insert_channel(channel.clone()).await?;
        self.directory.add_member(channel.id, caller.user_id).await?;

        tracing::info!(
            channel_id = %channel.id,
            channel_type = %channel.channel_type.as_str(),
            "Channel created"
        );
        self.view(channel, true).await
    }

    pub async fn list_channels(&self, caller: &AuthContext) -> AppResult<Vec<ChannelView>> {
        let mut visible = Vec::new();
        for channel in self.directory.list_channels().await? {
            let facts = self.facts(caller, &channel).await?;
            if access::is_listed(&facts) {
                visible.push(self.view(channel, facts.is_member).await?);
            }
        }
        Ok(visible)
    }

    pub async fn get_channel(&self, caller: &AuthContext, channel_id: Uuid) -> AppResult<ChannelView> {
        let (channel, facts) = self.authorized(caller, channel_id, ChannelAction::View).await?;
        self.view(channel, facts.is_member).await
    }

    pub async fn members(&self, caller: &AuthContext, channel_id: Uuid) -> AppResult<Vec<Principal>> {
        self.authorized(caller, channel_id, ChannelAction::View).await?;

        let mut members = Vec::new();
        for user_id in self.directory.members(channel_id).await? {
            if let Some(user) = self.users.find_user(user_id).await? {
                members.push(user);
            }
        }
        members.sort_by(|a, b| a.username.cmp(&b.username));
        Ok(members)
    }

    pub async fn join(&self, caller: &AuthContext, channel_id: Uuid) -> AppResult<()> {
        self.authorized(caller, channel_id, ChannelAction::Join).await?;

        if !self.directory.add_member(channel_id, caller.user_id).await? {
            return Err(AppError::conflict("Already a member of this channel"));
        }
        tracing::debug!(channel_id = %channel_id, "Joined channel");
        Ok(())
    }

    pub async fn leave(&self, caller: &AuthContext, channel_id: Uuid) -> AppResult<()> {
        self.authorized(caller, channel_id, ChannelAction::Leave).await?;

        if !self.directory.remove_member(channel_id, caller.user_id).await? {
            return Err(AppError::not_found("Not a member of this channel"));
        }
        tracing::debug!(channel_id = %channel_id, "Left channel");
        Ok(())
    }

    pub async fn post_message(
        &self,
        caller: &AuthContext,
        channel_id: Uuid,
        request: PostMessage,
    ) -> AppResult<MessageView> {
        self.authorized(caller, channel_id, ChannelAction::Post).await?;

        let content = sanitize_string(&request.content);
        if content.is_empty() || content.chars().count() > MAX_CONTENT_LEN {
            return Err(AppError::validation(format!(
                "Message content must be between 1 and {} characters",
                MAX_CONTENT_LEN
            )));
        }
        if let Some(thread_id) = request.thread_id {
            let parent = self.messages.find_message(thread_id).await?;
            access::validate_thread_parent(channel_id, parent.as_ref())?;
        }

        let message = Message {
            id: Uuid::new_v4(),
            channel_id,
            user_id: caller.user_id,
            content,
            thread_id: request.thread_id,
            created_at: Utc::now(),
        };
        self.messages.insert_message(message.clone()).await?;

        Ok(MessageView {
            message,
            username: caller.username.clone(),
            reply_count: 0,
        })
    }

    /// Root messages of a channel in chronological order
    pub async fn messages(
        &self,
        caller: &AuthContext,
        channel_id: Uuid,
        page: Page,
    ) -> AppResult<Vec<MessageView>> {
        self.authorized(caller, channel_id, ChannelAction::View).await?;

        let mut roots = self
            .messages
            .root_messages(channel_id, page.limit, page.offset)
            .await?;
        roots.reverse();
        self.message_views(roots).await
    }

    pub async fn thread_replies(
        &self,
        caller: &AuthContext,
        channel_id: Uuid,
        root_id: Uuid,
        page: Page,
    ) -> AppResult<Vec<MessageView>> {
        self.authorized(caller, channel_id, ChannelAction::View).await?;

        match self.messages.find_message(root_id).await? {
            Some(root) if root.channel_id == channel_id && root.is_root() => {}
            _ => return Err(AppError::not_found("Thread not found")),
        }

        let replies = self.messages.replies(root_id, page.limit, page.offset).await?;
        self.message_views(replies).await
    }

    /// Root messages from the caller's channels in the last day, newest first
    pub async fn recent_messages(&self, caller: &AuthContext) -> AppResult<Vec<MessageView>> {
        let channel_ids = self.directory.memberships(caller.user_id).await?;
        if channel_ids.is_empty() {
            return Ok(Vec::new());
        }

        let since = Utc::now() - Duration::hours(RECENT_WINDOW_HOURS);
        let recent = self
            .messages
            .recent_roots(&channel_ids, since, RECENT_LIMIT)
            .await?;
        self.message_views(recent).await
    }

    async fn authorized(
        &self,
        caller: &AuthContext,
        channel_id: Uuid,
        action: ChannelAction,
    ) -> AppResult<(ChannelInfo, AccessFacts)> {
        let channel = self
            .directory
            .find_channel(channel_id)
            .await?
            .ok_or_else(|| AppError::not_found("Channel not found"))?;
        let facts = self.facts(caller, &channel).await?;

        if let Err(err) = access::authorize(action, &facts) {
            tracing::debug!(
                channel_id = %channel_id,
                action = ?action,
                error = %err,
                "Channel access denied"
            );
            return Err(err);
        }
        Ok((channel, facts))
    }

    async fn facts(&self, caller: &AuthContext, channel: &ChannelInfo) -> AppResult<AccessFacts> {
        Ok(AccessFacts {
            role: caller.role,
            visibility: channel.channel_type,
            is_member: self.directory.is_member(channel.id, caller.user_id).await?,
            is_default: channel.name == self.default_channel,
        })
    }

    async fn view(&self, channel: ChannelInfo, is_member: bool) -> AppResult<ChannelView> {
        let member_count = self.directory.members(channel.id).await?.len();
        Ok(ChannelView {
            channel,
            member_count,
            is_member,
        })
    }

    async fn message_views(&self, messages: Vec<Message>) -> AppResult<Vec<MessageView>> {
        let mut views = Vec::with_capacity(messages.len());
        for message in messages {
            let username = self
                .users
                .find_user(message.user_id)
                .await?
                .map(|user| user.username)
                .unwrap_or_else(|| "unknown".to_string());
            let reply_count = if message.is_root() {
                self.messages.reply_count(message.id).await?
            } else {
                0
            };
            views.push(MessageView {
                message,
                username,
                reply_count,
            });
        }
        Ok(views)
    }
}
