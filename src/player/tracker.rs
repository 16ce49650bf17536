//! Dwell tracking for recently-played reports.

/// Largest position step still counted as playback rather than a seek.
pub const MAX_TICK_SECS: f64 = 2.0;

/// Accumulates played time for the loaded track and fires once at a threshold.
#[derive(Debug, Clone)]
pub struct PlayTracker {
    threshold: f64,
    last_position: Option<f64>,
    played: f64,
    reported: bool,
}

impl PlayTracker {
    pub fn new(threshold: f64) -> Self {
        Self {
            threshold,
            last_position: None,
            played: 0.0,
            reported: false,
        }
    }

    /// Start a fresh listen at `position`.
    pub fn reset(&mut self, position: f64) {
        self.last_position = Some(position);
        self.played = 0.0;
        self.reported = false;
    }

    /// Re-anchor after a jump so the jump itself is not counted.
    pub fn seek(&mut self, position: f64) {
        if self.last_position.is_some() {
            self.last_position = Some(position);
        }
    }

    /// Feed a new position. Returns `true` exactly once per listen, on the
    /// update that brings played time to the threshold.
    pub fn observe(&mut self, position: f64, playing: bool) -> bool {
        let Some(last) = self.last_position else {
            return false;
        };
        self.last_position = Some(position);

        let delta = position - last;
        if playing && delta > 0.0 && delta <= MAX_TICK_SECS {
            self.played += delta;
        }

        if !self.reported && self.played >= self.threshold {
            self.reported = true;
            return true;
        }
        false
    }

    pub fn played(&self) -> f64 {
        self.played
    }

    pub fn has_reported(&self) -> bool {
        self.reported
    }
}
