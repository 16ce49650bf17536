//! Client for the remote music REST API.

pub mod http;
pub mod reporter;
#[cfg(test)]
pub mod testing;

use async_trait::async_trait;

use crate::error::AppResult;
use crate::models::{Album, Artist, AuthSession, NftCollection, PaymentRecord, Track, User};

pub use http::HttpApiClient;
pub use reporter::ApiPlayReporter;

/// Operations offered by the remote API.
#[async_trait]
pub trait MusicApi: Send + Sync {
    async fn list_artists(&self) -> AppResult<Vec<Artist>>;

    async fn get_artist(&self, id: &str) -> AppResult<Artist>;

    async fn list_albums(&self) -> AppResult<Vec<Album>>;

    async fn get_album(&self, id: &str) -> AppResult<Album>;

    async fn list_tracks(&self) -> AppResult<Vec<Track>>;

    async fn get_track(&self, id: &str) -> AppResult<Track>;

    /// Mark `track_id` as recently played by `user_id`.
    async fn mark_recently_played(&self, user_id: &str, track_id: &str) -> AppResult<()>;

    /// Fetch a user profile.
    async fn fetch_user(&self, user_id: &str) -> AppResult<User>;

    /// Exchange a signed message for a session.
    async fn wallet_login(
        &self,
        public_key: &str,
        message: &str,
        signature: &str,
    ) -> AppResult<AuthSession>;

    async fn list_collections(&self) -> AppResult<Vec<NftCollection>>;

    /// Record a crypto payment, confirmed or failed.
    async fn record_payment(&self, record: &PaymentRecord) -> AppResult<()>;
}
