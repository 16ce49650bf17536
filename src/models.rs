//! Domain models shared by the stores, the remote API client and the control API.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::client::MusicApi;
use crate::identity::IdentityStore;
use crate::player::PlayerStore;
use crate::wallet::WalletProvider;

/// Shared state handed to control API handlers.
#[derive(Clone)]
pub struct AppState {
    pub player: Arc<Mutex<PlayerStore>>,
    pub identity: Arc<IdentityStore>,
    pub api: Arc<dyn MusicApi>,
    /// `None` when no wallet is configured; wallet routes then answer 503.
    pub wallet: Option<Arc<dyn WalletProvider>>,
}

/// Artist reference embedded in tracks and albums.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtistRef {
    pub id: String,
    pub name: String,
}

/// A playable track as returned by the remote API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Track {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub artists: Vec<ArtistRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover: Option<String>,
    /// Length in seconds.
    #[serde(default)]
    pub duration: f64,
    /// Stream URL handed to the audio primitive.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio: Option<String>,
}

impl Track {
    /// Comma-separated artist names, for logs and display.
    pub fn artist_names(&self) -> String {
        self.artists
            .iter()
            .map(|a| a.name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Album {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub artists: Vec<ArtistRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover: Option<String>,
    #[serde(default)]
    pub tracks: Vec<Track>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Artist {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    #[serde(default)]
    pub albums: Vec<Album>,
    #[serde(default)]
    pub tracks: Vec<Track>,
}

/// User role as reported by the remote API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Artist,
    Admin,
    #[default]
    #[serde(other)]
    User,
}

/// The authenticated user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    /// Token balance.
    #[serde(default)]
    pub balance: f64,
    /// Auth token, only present on locally cached copies.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wallet_address: Option<String>,
}

impl User {
    /// Copy the server-owned profile fields from `remote`, keeping local identity and token.
    pub fn reconcile(&mut self, remote: &User) {
        self.name = remote.name.clone();
        self.role = remote.role;
        self.avatar = remote.avatar.clone();
        self.balance = remote.balance;
        if remote.wallet_address.is_some() {
            self.wallet_address = remote.wallet_address.clone();
        }
    }
}

/// Result of a successful wallet login.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthSession {
    pub user: User,
    pub token: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NftCollection {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    /// Mint price in SOL.
    #[serde(default)]
    pub price: f64,
    /// Creator wallet address.
    #[serde(default)]
    pub creator: String,
}

/// Status string for a confirmed transfer.
pub const PAYMENT_CONFIRMED: &str = "confirmed";

/// A crypto payment as recorded with the remote API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRecord {
    pub id: Uuid,
    pub user_id: String,
    pub recipient: String,
    pub lamports: u64,
    pub purpose: String,
    pub signature: Option<String>,
    /// `confirmed` or `failed: <reason>`.
    pub status: String,
    pub created_at: DateTime<Utc>,
}

impl PaymentRecord {
    pub fn is_confirmed(&self) -> bool {
        self.status == PAYMENT_CONFIRMED
    }
}
