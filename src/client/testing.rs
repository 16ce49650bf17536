//! In-memory [`MusicApi`] fake for unit tests.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;

use super::MusicApi;
use crate::error::{AppError, AppResult};
use crate::models::{Album, Artist, AuthSession, NftCollection, PaymentRecord, Track, User};

#[derive(Default)]
pub struct FakeApi {
    pub users: Mutex<HashMap<String, User>>,
    pub tracks: Mutex<Vec<Track>>,
    pub login: Mutex<Option<AuthSession>>,
    pub payments: Mutex<Vec<PaymentRecord>>,
    /// When set, every call fails with the produced error.
    pub fail_with: Mutex<Option<fn() -> AppError>>,
    /// `operation:args` for every call, in order.
    pub calls: Mutex<Vec<String>>,
}

impl FakeApi {
    fn record(&self, call: String) -> AppResult<()> {
        self.calls.lock().push(call);
        match *self.fail_with.lock() {
            Some(make_error) => Err(make_error()),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl MusicApi for FakeApi {
    async fn list_artists(&self) -> AppResult<Vec<Artist>> {
        self.record("list_artists".into())?;
        Ok(Vec::new())
    }

    async fn get_artist(&self, id: &str) -> AppResult<Artist> {
        self.record(format!("get_artist:{id}"))?;
        Err(AppError::NotFound(format!("artist {id}")))
    }

    async fn list_albums(&self) -> AppResult<Vec<Album>> {
        self.record("list_albums".into())?;
        Ok(Vec::new())
    }

    async fn get_album(&self, id: &str) -> AppResult<Album> {
        self.record(format!("get_album:{id}"))?;
        Err(AppError::NotFound(format!("album {id}")))
    }

    async fn list_tracks(&self) -> AppResult<Vec<Track>> {
        self.record("list_tracks".into())?;
        Ok(self.tracks.lock().clone())
    }

    async fn get_track(&self, id: &str) -> AppResult<Track> {
        self.record(format!("get_track:{id}"))?;
        self.tracks
            .lock()
            .iter()
            .find(|t| t.id == id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("track {id}")))
    }

    async fn mark_recently_played(&self, user_id: &str, track_id: &str) -> AppResult<()> {
        self.record(format!("mark_recently_played:{user_id}:{track_id}"))
    }

    async fn fetch_user(&self, user_id: &str) -> AppResult<User> {
        self.record(format!("fetch_user:{user_id}"))?;
        self.users
            .lock()
            .get(user_id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("user {user_id}")))
    }

    async fn wallet_login(
        &self,
        public_key: &str,
        _message: &str,
        _signature: &str,
    ) -> AppResult<AuthSession> {
        self.record(format!("wallet_login:{public_key}"))?;
        self.login
            .lock()
            .clone()
            .ok_or_else(|| AppError::Unauthorized("signature rejected".into()))
    }

    async fn list_collections(&self) -> AppResult<Vec<NftCollection>> {
        self.record("list_collections".into())?;
        Ok(Vec::new())
    }

    async fn record_payment(&self, record: &PaymentRecord) -> AppResult<()> {
        self.record(format!("record_payment:{}", record.status))?;
        self.payments.lock().push(record.clone());
        Ok(())
    }
}
