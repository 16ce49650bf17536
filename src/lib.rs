//! Sonance - headless player-session service for a music-streaming client.
//!
//! Owns the player session and the signed-in user, persists both to a
//! key/value store, reports listening to the remote REST API, and exposes a
//! local control API for a UI to drive.

pub mod api;
pub mod client;
pub mod config;
pub mod error;
pub mod identity;
pub mod models;
pub mod player;
pub mod storage;
pub mod wallet;
