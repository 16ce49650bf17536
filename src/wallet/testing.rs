//! Scripted [`WalletProvider`] for unit tests.

use async_trait::async_trait;
use parking_lot::Mutex;

use super::WalletProvider;
use crate::error::{AppError, AppResult};

pub const FAKE_PUBLIC_KEY: &str = "WalletPubKey1111111111111111111111111111111";

#[derive(Default)]
pub struct FakeWallet {
    /// Every message signed, as text.
    pub signed: Mutex<Vec<String>>,
    pub reject_transfer: bool,
}

#[async_trait]
impl WalletProvider for FakeWallet {
    async fn connect(&self) -> AppResult<String> {
        Ok(FAKE_PUBLIC_KEY.into())
    }

    async fn sign_message(&self, message: &[u8]) -> AppResult<Vec<u8>> {
        self.signed
            .lock()
            .push(String::from_utf8_lossy(message).into_owned());
        Ok(vec![0xde, 0xad, 0xbe, 0xef])
    }

    async fn transfer(&self, _recipient: &str, _lamports: u64) -> AppResult<String> {
        if self.reject_transfer {
            Err(AppError::Transaction("User rejected the request".into()))
        } else {
            Ok("5sigTx".into())
        }
    }
}
