//! User commands: register, login, users, reset.

use std::io::Write;

use tracing::info;

use super::State;
use crate::db::{NewUser, UserRepository};
use crate::{GatorError, Result};

/// Create a user and make them the current user.
pub async fn handle_register<W: Write>(state: &mut State, name: &str, out: &mut W) -> Result<()> {
    let user = UserRepository::new(state.db.pool())
        .create(&NewUser::new(name))
        .await?;
    info!("Registered user {}", user.name);

    state.config.set_user(&user.name, &state.config_path)?;
    writeln!(out, "User {} has been created and logged in.", user.name)?;
    Ok(())
}

/// Log in as an existing user.
pub async fn handle_login<W: Write>(state: &mut State, name: &str, out: &mut W) -> Result<()> {
    let name = name.trim();
    let user = UserRepository::new(state.db.pool())
        .get_by_name(name)
        .await?
        .ok_or_else(|| GatorError::NotFound(format!("user {}", name)))?;

    state.config.set_user(&user.name, &state.config_path)?;
    writeln!(out, "User {} has been set.", user.name)?;
    Ok(())
}

/// List all users, marking the current one.
pub async fn handle_users<W: Write>(state: &State, out: &mut W) -> Result<()> {
    let users = UserRepository::new(state.db.pool()).list().await?;
    let current = state.config.session.current_user.as_deref();

    for user in users {
        if Some(user.name.as_str()) == current {
            writeln!(out, "* {} (current)", user.name)?;
        } else {
            writeln!(out, "* {}", user.name)?;
        }
    }
    Ok(())
}

/// Delete every user along with their feeds, follows and posts.
pub async fn handle_reset<W: Write>(state: &State, out: &mut W) -> Result<()> {
    let deleted = UserRepository::new(state.db.pool()).delete_all().await?;
    info!("Reset database ({} user(s) deleted)", deleted);

    writeln!(out, "Database reset: {} user(s) deleted.", deleted)?;
    Ok(())
}
