//! Session lookup.

use super::State;
use crate::db::{User, UserRepository};
use crate::{GatorError, Result};

/// Resolve the logged-in user from the configuration.
///
/// Fails with [`GatorError::NotAuthenticated`] if nobody is logged in or
/// the configured user no longer exists.
pub async fn require_user(state: &State) -> Result<User> {
    let name = state
        .config
        .session
        .current_user
        .as_deref()
        .ok_or_else(|| GatorError::NotAuthenticated("run `gator login <name>` first".to_string()))?;

    UserRepository::new(state.db.pool())
        .get_by_name(name)
        .await?
        .ok_or_else(|| GatorError::NotAuthenticated(format!("user {} no longer exists", name)))
}
