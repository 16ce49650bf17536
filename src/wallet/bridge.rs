//! [`WalletProvider`] backed by a local signer bridge over HTTP.
//!
//! The bridge holds the keys and talks to the cluster. It exposes:
//!
//! - `GET  public-key` → `{"publicKey"}`
//! - `POST sign` with `{"message": hex}` → `{"signature": hex}`
//! - `POST transfer` with `{"recipient", "lamports"}` → `{"signature"}`,
//!   answered once the transaction is confirmed.

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use url::Url;

use super::WalletProvider;
use crate::client::http::DEFAULT_USER_AGENT;
use crate::error::{AppError, AppResult};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PublicKeyResponse {
    public_key: String,
}

#[derive(Debug, Deserialize)]
struct SignatureResponse {
    signature: String,
}

/// HTTP client for a wallet bridge.
#[derive(Clone)]
pub struct WalletBridge {
    client: Client,
    base: Url,
}

impl WalletBridge {
    pub fn new(base_url: &str, timeout: Duration) -> AppResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(DEFAULT_USER_AGENT)
            .build()?;

        let mut base = Url::parse(base_url)?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        Ok(Self { client, base })
    }

    fn url(&self, path: &str) -> AppResult<Url> {
        Ok(self.base.join(path)?)
    }

    /// Status and reason of a refused request.
    async fn refusal(response: Response) -> (u16, String) {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<serde_json::Value>(&body)
            .ok()
            .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(str::to_string))
            .unwrap_or_else(|| status.canonical_reason().unwrap_or("refused").to_string());
        (status.as_u16(), message)
    }
}

#[async_trait]
impl WalletProvider for WalletBridge {
    async fn connect(&self) -> AppResult<String> {
        let response = self
            .client
            .get(self.url("public-key")?)
            .send()
            .await
            .map_err(|e| AppError::WalletUnavailable(format!("Wallet bridge unreachable: {e}")))?;

        if !response.status().is_success() {
            let (status, message) = Self::refusal(response).await;
            return Err(AppError::WalletUnavailable(format!(
                "Wallet refused to connect ({status}): {message}"
            )));
        }

        let body: PublicKeyResponse = response.json().await?;
        tracing::debug!(public_key = %body.public_key, "Wallet connected");
        Ok(body.public_key)
    }

    async fn sign_message(&self, message: &[u8]) -> AppResult<Vec<u8>> {
        let response = self
            .client
            .post(self.url("sign")?)
            .json(&json!({ "message": hex::encode(message) }))
            .send()
            .await?;

        if !response.status().is_success() {
            let (_, message) = Self::refusal(response).await;
            return Err(AppError::Unauthorized(format!("Signature rejected: {message}")));
        }

        let body: SignatureResponse = response.json().await?;
        hex::decode(&body.signature)
            .map_err(|e| AppError::Unauthorized(format!("Malformed signature from wallet: {e}")))
    }

    async fn transfer(&self, recipient: &str, lamports: u64) -> AppResult<String> {
        let response = self
            .client
            .post(self.url("transfer")?)
            .json(&json!({ "recipient": recipient, "lamports": lamports }))
            .send()
            .await
            .map_err(|e| AppError::Transaction(e.to_string()))?;

        if !response.status().is_success() {
            let (_, message) = Self::refusal(response).await;
            return Err(AppError::Transaction(message));
        }

        let body: SignatureResponse = response
            .json()
            .await
            .map_err(|e| AppError::Transaction(e.to_string()))?;
        Ok(body.signature)
    }
}
