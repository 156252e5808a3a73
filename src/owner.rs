use crate::config::Config;
use crate::error::{Result, TaskError};
use crate::models::User;
use crate::storage::Store;

/// Resolves the acting user from `--user` / `TASKMASTER_USER`.
///
/// Fails with `InvalidInput` when no user was given and `NotFound` when the
/// username is not registered.
pub fn resolve_owner(store: &impl Store, config: &Config) -> Result<User> {
    let username = config.user.as_deref().ok_or_else(|| {
        TaskError::invalid("no user selected; pass --user or set TASKMASTER_USER")
    })?;
    store.find_user_by_username(username.trim())
}
