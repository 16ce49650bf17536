//! Player session: the store, its audio primitive, and play reporting.

pub mod clock;
pub mod primitive;
pub mod session;
pub mod store;
pub mod tracker;

pub use clock::{ClockDriver, ClockPrimitive};
pub use primitive::{AudioPrimitive, PrimitiveEvent};
pub use session::PlayerSession;
pub use store::{PlayReporter, PlayerOptions, PlayerStore};
pub use tracker::MAX_TICK_SECS;
