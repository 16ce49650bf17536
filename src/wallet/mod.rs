//! Wallet sign-in and SOL payments.
//!
//! The wallet itself (key custody, signing, RPC submission) lives behind
//! [`WalletProvider`]. These flows only relay its results to the remote API.

pub mod bridge;
#[cfg(test)]
pub mod testing;

pub use bridge::WalletBridge;

use async_trait::async_trait;
use chrono::Utc;
use rand::RngCore;
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::client::MusicApi;
use crate::error::{AppError, AppResult};
use crate::identity::IdentityStore;
use crate::models::{PaymentRecord, User, PAYMENT_CONFIRMED};

lazy_static::lazy_static! {
    static ref SOLANA_ADDRESS_REGEX: regex::Regex =
        regex::Regex::new(r"^[1-9A-HJ-NP-Za-km-z]{32,44}$").unwrap();
}

/// Prefix of the message signed at sign-in.
pub const SIGN_IN_PREFIX: &str = "Sign in to Sonance: ";

/// A browser-style wallet: connect, sign, transfer.
#[async_trait]
pub trait WalletProvider: Send + Sync {
    /// Connect and return the wallet's public key.
    async fn connect(&self) -> AppResult<String>;

    /// Sign an arbitrary message.
    async fn sign_message(&self, message: &[u8]) -> AppResult<Vec<u8>>;

    /// Sign, send and confirm a SOL transfer. Returns the transaction signature.
    async fn transfer(&self, recipient: &str, lamports: u64) -> AppResult<String>;
}

/// A payment to make before a purchase or mint request.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct PaymentRequest {
    /// Base58 recipient address.
    #[validate(regex(path = "SOLANA_ADDRESS_REGEX", message = "Recipient is not a valid address"))]
    pub recipient: String,
    #[validate(range(min = 1, message = "Amount must be at least one lamport"))]
    pub lamports: u64,
    /// What the payment is for, e.g. `nft-purchase`.
    #[validate(length(min = 1, max = 64, message = "Purpose must be 1-64 characters"))]
    pub purpose: String,
}

fn sign_in_message() -> String {
    let mut nonce = [0u8; 16];
    rand::thread_rng().fill_bytes(&mut nonce);
    format!("{SIGN_IN_PREFIX}{}", hex::encode(nonce))
}

/// Sign in by signing a one-time message with the wallet.
pub async fn sign_in(
    wallet: Option<&dyn WalletProvider>,
    api: &dyn MusicApi,
    identity: &IdentityStore,
) -> AppResult<User> {
    let wallet = wallet.ok_or_else(AppError::no_wallet)?;

    let public_key = wallet.connect().await?;
    let message = sign_in_message();
    let signature = wallet.sign_message(message.as_bytes()).await?;

    let session = api
        .wallet_login(&public_key, &message, &hex::encode(signature))
        .await?;

    let mut user = session.user;
    user.token = Some(session.token);
    if user.wallet_address.is_none() {
        user.wallet_address = Some(public_key);
    }
    identity.set_user(user.clone())?;
    Ok(user)
}

/// Transfer SOL and record the outcome with the remote API.
///
/// A failed transfer is not an error: it yields a record whose status
/// carries the reason. Nothing is retried.
pub async fn send_payment(
    wallet: Option<&dyn WalletProvider>,
    api: &dyn MusicApi,
    identity: &IdentityStore,
    request: &PaymentRequest,
) -> AppResult<PaymentRecord> {
    request
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;
    let wallet = wallet.ok_or_else(AppError::no_wallet)?;
    let user = identity.current().ok_or_else(AppError::not_signed_in)?;

    let (signature, status) = match wallet.transfer(&request.recipient, request.lamports).await {
        Ok(signature) => (Some(signature), PAYMENT_CONFIRMED.to_string()),
        Err(e) => {
            tracing::warn!(
                recipient = %request.recipient,
                lamports = request.lamports,
                error = %e,
                "Transfer failed"
            );
            (None, format!("failed: {e}"))
        }
    };

    let record = PaymentRecord {
        id: Uuid::new_v4(),
        user_id: user.id,
        recipient: request.recipient.clone(),
        lamports: request.lamports,
        purpose: request.purpose.clone(),
        signature,
        status,
        created_at: Utc::now(),
    };

    if let Err(e) = api.record_payment(&record).await {
        tracing::warn!(payment_id = %record.id, error = %e, "Failed to record payment");
    } else {
        tracing::info!(payment_id = %record.id, status = %record.status, "Payment recorded");
    }

    Ok(record)
}
