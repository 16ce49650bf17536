//! The audio playback primitive the player store drives.

use std::sync::mpsc::Sender;

use crate::models::Track;

/// Signals emitted by a primitive while it plays.
#[derive(Debug, Clone, PartialEq)]
pub enum PrimitiveEvent {
    /// Playback position changed, in seconds.
    TimeUpdate(f64),
    /// The loaded source reported its duration, in seconds.
    DurationChange(f64),
    /// The loaded source played to its end.
    Ended,
}

/// An audio element: one loaded source, transport commands, gain.
///
/// Commands are fire-and-forget. Load or playback failures surface, if at
/// all, through the primitive's own event stream.
pub trait AudioPrimitive: Send {
    /// Register the channel events are sent to. Called once by the owner.
    fn subscribe(&mut self, events: Sender<PrimitiveEvent>);

    /// Replace the loaded source and rewind to 0.
    fn load(&mut self, track: &Track);

    fn play(&mut self);

    fn pause(&mut self);

    /// Move to `position` seconds.
    fn seek(&mut self, position: f64);

    /// Set gain, 0.0 to 1.0.
    fn set_volume(&mut self, volume: f64);

    fn set_muted(&mut self, muted: bool);
}
