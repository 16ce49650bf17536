//! reqwest implementation of [`MusicApi`].

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

use super::MusicApi;
use crate::error::{AppError, AppResult};
use crate::models::{Album, Artist, AuthSession, NftCollection, PaymentRecord, Track, User};
use crate::storage::{KeyValueStorage, SharedStorage, TOKEN_KEY};

/// Default User-Agent.
pub const DEFAULT_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// HTTP client for the remote API.
///
/// The auth token is read from the token storage slot on every request, so a
/// login or logout takes effect without rebuilding the client.
#[derive(Clone)]
pub struct HttpApiClient {
    client: Client,
    base: Url,
    storage: SharedStorage,
}

impl HttpApiClient {
    /// Create a client for `base_url` (for example `http://localhost:5000/api`).
    pub fn new(
        base_url: &str,
        timeout: Duration,
        storage: SharedStorage,
    ) -> AppResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(DEFAULT_USER_AGENT)
            .build()?;
        Self::with_client(client, base_url, storage)
    }

    /// Create a client around an existing reqwest client.
    pub fn with_client(
        client: Client,
        base_url: &str,
        storage: SharedStorage,
    ) -> AppResult<Self> {
        // A trailing slash makes `Url::join` append rather than replace the last segment.
        let mut base = Url::parse(base_url)?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        Ok(Self {
            client,
            base,
            storage,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    fn url(&self, path: &str) -> AppResult<Url> {
        Ok(self.base.join(path.trim_start_matches('/'))?)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match self.storage.get(TOKEN_KEY) {
            Ok(Some(token)) if !token.is_empty() => request.bearer_auth(token),
            Ok(_) => request,
            Err(e) => {
                tracing::warn!(error = %e, "Could not read auth token, sending request anonymously");
                request
            }
        }
    }

    async fn check(response: Response) -> AppResult<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<serde_json::Value>(&body)
            .ok()
            .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(str::to_string))
            .unwrap_or_else(|| {
                status
                    .canonical_reason()
                    .unwrap_or("request failed")
                    .to_string()
            });

        Err(AppError::Remote {
            status: status.as_u16(),
            message,
        })
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> AppResult<T> {
        let url = self.url(path)?;
        tracing::debug!(%url, "GET");

        let response = self.authorize(self.client.get(url)).send().await?;
        let response = Self::check(response).await?;
        Ok(response.json::<T>().await?)
    }

    async fn post_json<B: serde::Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> AppResult<Response> {
        let url = self.url(path)?;
        tracing::debug!(%url, "POST");

        let response = self
            .authorize(self.client.post(url))
            .json(body)
            .send()
            .await?;
        Self::check(response).await
    }
}

#[async_trait]
impl MusicApi for HttpApiClient {
    async fn list_artists(&self) -> AppResult<Vec<Artist>> {
        self.get_json("artists").await
    }

    async fn get_artist(&self, id: &str) -> AppResult<Artist> {
        self.get_json(&format!("artists/{id}")).await
    }

    async fn list_albums(&self) -> AppResult<Vec<Album>> {
        self.get_json("albums").await
    }

    async fn get_album(&self, id: &str) -> AppResult<Album> {
        self.get_json(&format!("albums/{id}")).await
    }

    async fn list_tracks(&self) -> AppResult<Vec<Track>> {
        self.get_json("tracks").await
    }

    async fn get_track(&self, id: &str) -> AppResult<Track> {
        self.get_json(&format!("tracks/{id}")).await
    }

    async fn mark_recently_played(&self, user_id: &str, track_id: &str) -> AppResult<()> {
        self.post_json(
            &format!("users/{user_id}/recently-played"),
            &json!({ "trackId": track_id }),
        )
        .await?;
        Ok(())
    }

    async fn fetch_user(&self, user_id: &str) -> AppResult<User> {
        self.get_json(&format!("users/{user_id}")).await
    }

    async fn wallet_login(
        &self,
        public_key: &str,
        message: &str,
        signature: &str,
    ) -> AppResult<AuthSession> {
        let response = self
            .post_json(
                "auth/wallet",
                &json!({
                    "publicKey": public_key,
                    "message": message,
                    "signature": signature,
                }),
            )
            .await?;
        Ok(response.json::<AuthSession>().await?)
    }

    async fn list_collections(&self) -> AppResult<Vec<NftCollection>> {
        self.get_json("nft/collections").await
    }

    async fn record_payment(&self, record: &PaymentRecord) -> AppResult<()> {
        self.post_json("payments", record).await?;
        Ok(())
    }
}
