//! Local control API.

pub mod catalog;
pub mod health;
pub mod player;
pub mod session;
pub mod wallet;
