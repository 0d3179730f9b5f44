// ============================================================================
// User Profile Operations
// ============================================================================
//
// Profile edits go through the same decision table as channel operations.
// Deactivating a user here is what makes their outstanding sessions fail on
// the next request.
//
// ============================================================================

use std::sync::Arc;

use turnate_error::{AppError, AppResult};
use turnate_types::{AuthContext, Principal, UserUpdate};
use uuid::Uuid;

use crate::access;
use crate::registry::UserRegistry;
use crate::utils::sanitize_string;

const MAX_DISPLAY_NAME_LEN: usize = 100;

pub struct UserService {
    users: Arc<dyn UserRegistry>,
}

impl UserService {
    pub fn new(users: Arc<dyn UserRegistry>) -> Self {
        Self { users }
    }

    pub async fn get_user(&self, user_id: Uuid) -> AppResult<Principal> {
        self.users
            .find_user(user_id)
            .await?
            .ok_or_else(|| AppError::not_found("User not found"))
    }

    pub async fn update_user(
        &self,
        caller: &AuthContext,
        target_id: Uuid,
        mut update: UserUpdate,
    ) -> AppResult<Principal> {
        self.get_user(target_id).await?;
        access::authorize_user_update(
            caller.role,
            caller.user_id,
            target_id,
            update.changes_role_or_status(),
        )?;

        if let Some(display_name) = update.display_name.take() {
            let display_name = sanitize_string(&display_name);
            if display_name.is_empty() || display_name.chars().count() > MAX_DISPLAY_NAME_LEN {
                return Err(AppError::validation(format!(
                    "Display name must be between 1 and {} characters",
                    MAX_DISPLAY_NAME_LEN
                )));
            }
            update.display_name = Some(display_name);
        }

        let updated = self
            .users
            .update_user(target_id, &update)
            .await?
            .ok_or_else(|| AppError::not_found("User not found"))?;

        if update.changes_role_or_status() {
            tracing::info!(
                target_user = %target_id,
                role = %updated.role,
                is_active = updated.is_active,
                "User role or status changed"
            );
        }
        Ok(updated)
    }
}
