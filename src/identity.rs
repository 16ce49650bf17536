//! The signed-in user for this session.
//!
//! The cached copy in storage is authoritative until a refresh from the
//! remote API succeeds. Writes go straight through to storage.

use parking_lot::RwLock;
use std::sync::Arc;

use crate::client::MusicApi;
use crate::error::AppResult;
use crate::models::User;
use crate::storage::{self, KeyValueStorage, SharedStorage, TOKEN_KEY, USER_KEY};

pub struct IdentityStore {
    storage: SharedStorage,
    user: RwLock<Option<User>>,
}

impl IdentityStore {
    /// Hydrate from storage. An unreadable cached user counts as signed out.
    pub fn load(storage: SharedStorage) -> Self {
        let mut user: Option<User> = storage::load_json(storage.as_ref(), USER_KEY);

        if let Some(user) = user.as_mut() {
            if user.token.is_none() {
                user.token = storage.get(TOKEN_KEY).ok().flatten();
            }
            tracing::info!(user_id = %user.id, name = %user.name, "Restored cached user");
        }

        Self {
            storage,
            user: RwLock::new(user),
        }
    }

    pub fn current(&self) -> Option<User> {
        self.user.read().clone()
    }

    pub fn is_signed_in(&self) -> bool {
        self.user.read().is_some()
    }

    /// Auth token of the signed-in user, falling back to the token slot.
    pub fn token(&self) -> Option<String> {
        if let Some(token) = self.user.read().as_ref().and_then(|u| u.token.clone()) {
            return Some(token);
        }
        self.storage.get(TOKEN_KEY).ok().flatten()
    }

    /// Replace the signed-in user and write it through to storage.
    pub fn set_user(&self, user: User) -> AppResult<()> {
        storage::save_json(self.storage.as_ref(), USER_KEY, &user)?;
        if let Some(token) = &user.token {
            self.storage.set(TOKEN_KEY, token)?;
        }

        tracing::info!(user_id = %user.id, role = ?user.role, "User signed in");
        *self.user.write() = Some(user);
        Ok(())
    }

    /// Forget the user and token, in memory and in storage.
    pub fn logout(&self) -> AppResult<()> {
        // Storage first, so a failed write leaves the user signed in everywhere.
        self.storage.remove(USER_KEY)?;
        self.storage.remove(TOKEN_KEY)?;
        let previous = self.user.write().take();

        if let Some(user) = previous {
            tracing::info!(user_id = %user.id, "User logged out");
        }
        Ok(())
    }

    /// Reconcile the cached user with the remote profile.
    ///
    /// Failures are logged and leave the cached copy in place.
    pub async fn refresh(&self, api: &dyn MusicApi) {
        let Some(user_id) = self.user.read().as_ref().map(|u| u.id.clone()) else {
            return;
        };

        let remote = match api.fetch_user(&user_id).await {
            Ok(remote) => remote,
            Err(e) => {
                tracing::warn!(user_id = %user_id, error = %e, "User refresh failed, keeping cached copy");
                return;
            }
        };

        let updated = {
            let mut guard = self.user.write();
            match guard.as_mut() {
                // Logged out, or switched user, while the request was in flight.
                Some(user) if user.id == user_id => {
                    user.reconcile(&remote);
                    user.clone()
                }
                _ => return,
            }
        };

        if let Err(e) = storage::save_json(self.storage.as_ref(), USER_KEY, &updated) {
            tracing::warn!(error = %e, "Failed to persist refreshed user");
        }
        tracing::debug!(user_id = %updated.id, balance = updated.balance, "Refreshed user profile");
    }

    /// Fire-and-forget [`refresh`](Self::refresh) on the current runtime.
    pub fn spawn_refresh(self: &Arc<Self>, api: Arc<dyn MusicApi>) {
        let identity = self.clone();
        tokio::spawn(async move {
            identity.refresh(api.as_ref()).await;
        });
    }
}
