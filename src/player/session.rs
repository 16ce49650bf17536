//! The persisted player session snapshot.

use serde::{Deserialize, Serialize};

use crate::models::Track;

pub const DEFAULT_VOLUME: u8 = 100;
pub const MAX_VOLUME: u8 = 100;

/// What is playing, where, and how loud.
///
/// Serialized as-is into the `playerState` storage slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PlayerSession {
    pub current_track: Option<Track>,
    /// Position in seconds.
    pub current_time: f64,
    /// Duration of the loaded track in seconds.
    pub duration: f64,
    /// 0-100.
    pub volume: u8,
    pub is_muted: bool,
    pub is_repeat: bool,
    pub is_playing: bool,
}

impl Default for PlayerSession {
    fn default() -> Self {
        Self {
            current_track: None,
            current_time: 0.0,
            duration: 0.0,
            volume: DEFAULT_VOLUME,
            is_muted: false,
            is_repeat: false,
            is_playing: false,
        }
    }
}

impl PlayerSession {
    /// Muted either explicitly or by a zero volume.
    pub fn effectively_muted(&self) -> bool {
        self.is_muted || self.volume == 0
    }

    /// Volume as the 0.0-1.0 gain the primitive expects.
    pub fn gain(&self) -> f64 {
        f64::from(self.volume.min(MAX_VOLUME)) / f64::from(MAX_VOLUME)
    }

    pub fn is_current(&self, track: &Track) -> bool {
        self.current_track
            .as_ref()
            .is_some_and(|current| current.id == track.id)
    }

    /// Bring a hydrated snapshot back within its invariants.
    ///
    /// Playback never resumes without a user gesture, so `is_playing` is
    /// always cleared.
    pub(crate) fn sanitize_hydrated(mut self) -> Self {
        self.volume = self.volume.min(MAX_VOLUME);
        if !self.current_time.is_finite() || self.current_time < 0.0 {
            self.current_time = 0.0;
        }
        if !self.duration.is_finite() || self.duration < 0.0 {
            self.duration = 0.0;
        }
        if self.current_track.is_none() {
            self.current_time = 0.0;
            self.duration = 0.0;
        }
        self.is_playing = false;
        self
    }
}
