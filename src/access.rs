// ============================================================================
// Resource Authorization
// ============================================================================
//
// Deterministic rules over (role, membership, visibility, default-channel),
// plus the profile-update rule over (role, caller, target).
// No I/O happens here: callers gather the facts once and every channel
// operation asks the same questions.
//
// ============================================================================

use turnate_error::{AppError, AppResult};
use turnate_types::{ChannelType, Message, UserRole};
use uuid::Uuid;

/// Everything a channel decision depends on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccessFacts {
    pub role: UserRole,
    pub visibility: ChannelType,
    pub is_member: bool,
    /// The distinguished channel nobody may leave
    pub is_default: bool,
}

impl AccessFacts {
    fn is_admin(&self) -> bool {
        self.role.is_admin()
    }

    fn is_private(&self) -> bool {
        self.visibility.is_private()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelAction {
    /// Read the channel, its members, messages or thread replies
    View,
    Post,
    Join,
    Leave,
}

/// Whether a channel appears in the caller's listing
pub fn is_listed(facts: &AccessFacts) -> bool {
    facts.is_admin() || !facts.is_private() || facts.is_member
}

pub fn authorize(action: ChannelAction, facts: &AccessFacts) -> AppResult<()> {
    match action {
        ChannelAction::View => {
            if facts.is_private() && !facts.is_member && !facts.is_admin() {
                return Err(AppError::forbidden("Access denied to private channel"));
            }
        }
        ChannelAction::Post => {
            if facts.is_private() && !facts.is_member && !facts.is_admin() {
                return Err(AppError::forbidden("Access denied to private channel"));
            }
            // Admins bypass the private gate only; public channels still need a join
            if !facts.is_private() && !facts.is_member {
                return Err(AppError::forbidden("Must join channel to post messages"));
            }
        }
        ChannelAction::Join => {
            if facts.is_private() && !facts.is_admin() {
                return Err(AppError::forbidden("Cannot join private channel"));
            }
            if facts.is_member {
                return Err(AppError::conflict("Already a member of this channel"));
            }
        }
        ChannelAction::Leave => {
            if !facts.is_member {
                return Err(AppError::not_found("Not a member of this channel"));
            }
            if facts.is_default {
                return Err(AppError::forbidden("Cannot leave the default channel"));
            }
        }
    }
    Ok(())
}

pub fn authorize_create(role: UserRole, visibility: ChannelType) -> AppResult<()> {
    if visibility.is_private() && !role.is_admin() {
        return Err(AppError::forbidden("Only admins can create private channels"));
    }
    Ok(())
}

/// Profiles are edited by their owner or an admin; role and activation by admins only
pub fn authorize_user_update(
    caller_role: UserRole,
    caller_id: Uuid,
    target_id: Uuid,
    changes_role_or_status: bool,
) -> AppResult<()> {
    if caller_role.is_admin() {
        return Ok(());
    }
    if caller_id != target_id {
        return Err(AppError::forbidden("Permission denied"));
    }
    if changes_role_or_status {
        return Err(AppError::forbidden("Only admins can update role and status"));
    }
    Ok(())
}

/// A reply must point at an existing root message of the same channel
pub fn validate_thread_parent(channel_id: Uuid, parent: Option<&Message>) -> AppResult<()> {
    match parent {
        Some(parent) if parent.channel_id == channel_id && parent.is_root() => Ok(()),
        _ => Err(AppError::validation("Invalid thread message")),
    }
}
