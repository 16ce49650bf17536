//! Headless primitive: a wall-clock transport with no audio output.
//!
//! The daemon uses it to keep session time moving for an external renderer.
//! The store owns the `ClockPrimitive`; a `ClockDriver` sharing its state is
//! ticked from a timer and emits the events.

use parking_lot::Mutex;
use std::sync::mpsc::Sender;
use std::sync::Arc;
use std::time::Instant;

use super::primitive::{AudioPrimitive, PrimitiveEvent};
use super::store::PlayerStore;
use crate::models::Track;

#[derive(Debug, Default)]
struct ClockState {
    loaded: Option<String>,
    position: f64,
    duration: f64,
    playing: bool,
    volume: f64,
    muted: bool,
    last_tick: Option<Instant>,
    events: Option<Sender<PrimitiveEvent>>,
}

impl ClockState {
    fn emit(&self, event: PrimitiveEvent) {
        if let Some(events) = &self.events {
            // The store dropping its receiver just means nobody listens any more.
            let _ = events.send(event);
        }
    }
}

/// The primitive half, handed to the player store.
#[derive(Debug, Clone)]
pub struct ClockPrimitive {
    state: Arc<Mutex<ClockState>>,
}

/// The timer half, kept by whoever owns the tick loop.
#[derive(Debug, Clone)]
pub struct ClockDriver {
    state: Arc<Mutex<ClockState>>,
}

impl ClockPrimitive {
    pub fn new() -> (Self, ClockDriver) {
        let state = Arc::new(Mutex::new(ClockState {
            volume: 1.0,
            ..ClockState::default()
        }));
        (
            Self {
                state: state.clone(),
            },
            ClockDriver { state },
        )
    }
}

impl AudioPrimitive for ClockPrimitive {
    fn subscribe(&mut self, events: Sender<PrimitiveEvent>) {
        self.state.lock().events = Some(events);
    }

    fn load(&mut self, track: &Track) {
        let mut state = self.state.lock();
        state.loaded = Some(track.id.clone());
        state.position = 0.0;
        state.duration = track.duration.max(0.0);
        state.playing = false;
        state.last_tick = None;
        tracing::debug!(track_id = %track.id, source = ?track.audio, "Clock loaded source");
        state.emit(PrimitiveEvent::DurationChange(state.duration));
    }

    fn play(&mut self) {
        let mut state = self.state.lock();
        if state.loaded.is_some() {
            // Playing an ended source starts it over.
            if state.duration > 0.0 && state.position >= state.duration {
                state.position = 0.0;
            }
            state.playing = true;
            state.last_tick = Some(Instant::now());
        }
    }

    fn pause(&mut self) {
        let mut state = self.state.lock();
        state.playing = false;
        state.last_tick = None;
    }

    fn seek(&mut self, position: f64) {
        let mut state = self.state.lock();
        state.position = position.max(0.0);
        if state.playing {
            state.last_tick = Some(Instant::now());
        }
    }

    fn set_volume(&mut self, volume: f64) {
        self.state.lock().volume = volume.clamp(0.0, 1.0);
    }

    fn set_muted(&mut self, muted: bool) {
        self.state.lock().muted = muted;
    }
}

impl ClockDriver {
    /// Advance by the wall time elapsed since the previous tick.
    pub fn tick(&self) {
        let now = Instant::now();
        let mut state = self.state.lock();
        let elapsed = state
            .last_tick
            .map(|last| now.duration_since(last).as_secs_f64())
            .unwrap_or(0.0);
        state.last_tick = state.playing.then_some(now);
        drop(state);
        self.advance(elapsed);
    }

    /// Tick and apply the resulting events to `player` in one step.
    ///
    /// Taking the store by `&mut` means the caller holds the player lock
    /// across both, so no action can land between an event and its handling.
    pub fn drive(&self, player: &mut PlayerStore) -> usize {
        self.tick();
        player.pump_events()
    }

    /// Advance a playing clock by `secs`, emitting a time update and, at the
    /// end of the source, an end signal.
    pub fn advance(&self, secs: f64) {
        let mut state = self.state.lock();
        if !state.playing || state.loaded.is_none() {
            return;
        }

        state.position += secs.max(0.0);
        let ended = state.duration > 0.0 && state.position >= state.duration;
        if ended {
            state.position = state.duration;
            state.playing = false;
            state.last_tick = None;
        }

        state.emit(PrimitiveEvent::TimeUpdate(state.position));
        if ended {
            state.emit(PrimitiveEvent::Ended);
        }
    }

    pub fn position(&self) -> f64 {
        self.state.lock().position
    }

    pub fn is_playing(&self) -> bool {
        self.state.lock().playing
    }
}
