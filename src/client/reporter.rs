//! Recently-played reporting through the remote API.

use std::sync::Arc;
use tokio::runtime::Handle;

use super::MusicApi;
use crate::identity::IdentityStore;
use crate::models::Track;
use crate::player::PlayReporter;

/// Reports played tracks for the signed-in user, fire-and-forget.
pub struct ApiPlayReporter {
    api: Arc<dyn MusicApi>,
    identity: Arc<IdentityStore>,
    runtime: Handle,
}

impl ApiPlayReporter {
    pub fn new(api: Arc<dyn MusicApi>, identity: Arc<IdentityStore>, runtime: Handle) -> Self {
        Self {
            api,
            identity,
            runtime,
        }
    }
}

impl PlayReporter for ApiPlayReporter {
    fn report_played(&self, track: &Track) {
        let Some(user) = self.identity.current() else {
            tracing::debug!(track_id = %track.id, "No signed-in user, skipping recently-played report");
            return;
        };

        let api = self.api.clone();
        let track_id = track.id.clone();
        self.runtime.spawn(async move {
            match api.mark_recently_played(&user.id, &track_id).await {
                Ok(()) => tracing::debug!(user_id = %user.id, track_id = %track_id, "Recently played recorded"),
                Err(e) => tracing::warn!(
                    user_id = %user.id,
                    track_id = %track_id,
                    error = %e,
                    "Failed to record recently played"
                ),
            }
        });
    }
}
