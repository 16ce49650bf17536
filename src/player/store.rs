//! The player store: single owner of the player session.
//!
//! Every action mutates the session, applies the matching primitive command
//! and persists the full snapshot. Primitive events arrive over a channel
//! registered once at construction and are applied by [`PlayerStore::pump_events`].

use std::sync::mpsc::{self, Receiver};
use std::sync::Arc;

use super::primitive::{AudioPrimitive, PrimitiveEvent};
use super::session::{PlayerSession, MAX_VOLUME};
use super::tracker::PlayTracker;
use crate::models::Track;
use crate::storage::{self, SharedStorage, PLAYER_STATE_KEY};

/// Seconds of playback before a track counts as played.
pub const DEFAULT_PLAYED_THRESHOLD_SECS: f64 = 10.0;

/// Receives one-shot recently-played reports.
///
/// Implementations must not block; network work is spawned.
pub trait PlayReporter: Send + Sync {
    fn report_played(&self, track: &Track);
}

/// Tunables for a player store.
#[derive(Debug, Clone)]
pub struct PlayerOptions {
    pub played_threshold_secs: f64,
}

impl Default for PlayerOptions {
    fn default() -> Self {
        Self {
            played_threshold_secs: DEFAULT_PLAYED_THRESHOLD_SECS,
        }
    }
}

pub struct PlayerStore {
    session: PlayerSession,
    primitive: Box<dyn AudioPrimitive>,
    events: Receiver<PrimitiveEvent>,
    storage: SharedStorage,
    reporter: Arc<dyn PlayReporter>,
    tracker: PlayTracker,
}

impl PlayerStore {
    /// Create the store, subscribe to the primitive and hydrate from storage.
    pub fn new(
        mut primitive: Box<dyn AudioPrimitive>,
        storage: SharedStorage,
        reporter: Arc<dyn PlayReporter>,
        options: PlayerOptions,
    ) -> Self {
        let (tx, events) = mpsc::channel();
        primitive.subscribe(tx);

        let mut store = Self {
            session: PlayerSession::default(),
            primitive,
            events,
            storage,
            reporter,
            tracker: PlayTracker::new(options.played_threshold_secs),
        };
        store.hydrate();
        store
    }

    fn hydrate(&mut self) {
        let Some(saved) =
            storage::load_json::<PlayerSession>(self.storage.as_ref(), PLAYER_STATE_KEY)
        else {
            tracing::debug!("No saved player session, starting fresh");
            return;
        };

        let session = saved.sanitize_hydrated();
        if let Some(track) = &session.current_track {
            self.primitive.load(track);
            self.primitive.seek(session.current_time);
            self.tracker.reset(session.current_time);
            tracing::info!(
                track_id = %track.id,
                title = %track.title,
                position = session.current_time,
                "Restored player session (paused)"
            );
        }
        self.primitive.set_volume(session.gain());
        self.primitive.set_muted(session.effectively_muted());
        self.session = session;
    }

    /// Current session snapshot.
    pub fn session(&self) -> &PlayerSession {
        &self.session
    }

    /// Load `track` at position 0 and start playing it.
    pub fn play_track(&mut self, track: &Track) {
        self.primitive.load(track);
        self.primitive.play();

        self.session.current_track = Some(track.clone());
        self.session.current_time = 0.0;
        self.session.duration = track.duration.max(0.0);
        self.session.is_playing = true;
        self.tracker.reset(0.0);

        tracing::info!(
            track_id = %track.id,
            title = %track.title,
            artists = %track.artist_names(),
            "Playing track"
        );
        self.persist();
    }

    /// Toggle if `track` is already current, otherwise play it.
    pub fn play_or_toggle(&mut self, track: &Track) {
        if self.session.is_current(track) {
            self.toggle_play();
        } else {
            self.play_track(track);
        }
    }

    /// Flip between playing and paused. Does nothing with no track loaded.
    pub fn toggle_play(&mut self) {
        if self.session.current_track.is_none() {
            tracing::debug!("Toggle ignored, nothing loaded");
            return;
        }

        self.session.is_playing = !self.session.is_playing;
        if self.session.is_playing {
            // Resuming a finished track starts it over, as the primitive does.
            if self.session.duration > 0.0 && self.session.current_time >= self.session.duration {
                self.session.current_time = 0.0;
                self.tracker.seek(0.0);
            }
            self.primitive.play();
        } else {
            self.primitive.pause();
        }
        self.persist();
    }

    /// Seek to `time` seconds.
    pub fn set_current_time(&mut self, time: f64) {
        let mut time = if time.is_finite() { time.max(0.0) } else { 0.0 };
        if self.session.duration > 0.0 {
            time = time.min(self.session.duration);
        }

        self.session.current_time = time;
        self.primitive.seek(time);
        self.tracker.seek(time);
        self.persist();
    }

    pub fn set_duration(&mut self, duration: f64) {
        self.session.duration = if duration.is_finite() {
            duration.max(0.0)
        } else {
            0.0
        };
        self.persist();
    }

    /// Set volume (0-100). Zero mutes; any other value unmutes.
    pub fn set_volume(&mut self, volume: u8) {
        let volume = volume.min(MAX_VOLUME);
        self.session.volume = volume;
        if volume == 0 {
            self.session.is_muted = true;
        } else if self.session.is_muted {
            self.session.is_muted = false;
        }

        self.primitive.set_volume(self.session.gain());
        self.primitive.set_muted(self.session.effectively_muted());
        self.persist();
    }

    pub fn toggle_mute(&mut self) {
        self.session.is_muted = !self.session.is_muted;
        self.primitive.set_muted(self.session.effectively_muted());
        self.persist();
    }

    pub fn toggle_repeat(&mut self) {
        self.session.is_repeat = !self.session.is_repeat;
        self.persist();
    }

    /// Apply every event the primitive has sent since the last call.
    pub fn pump_events(&mut self) -> usize {
        let pending: Vec<PrimitiveEvent> = self.events.try_iter().collect();
        let count = pending.len();
        for event in pending {
            match event {
                PrimitiveEvent::TimeUpdate(time) => self.on_time_update(time),
                PrimitiveEvent::DurationChange(duration) => self.on_duration_change(duration),
                PrimitiveEvent::Ended => self.on_ended(),
            }
        }
        count
    }

    /// Position reported by the primitive.
    pub fn on_time_update(&mut self, time: f64) {
        if !time.is_finite() {
            return;
        }
        self.session.current_time = time.max(0.0);

        if self.session.current_track.is_some()
            && self.tracker.observe(self.session.current_time, self.session.is_playing)
        {
            if let Some(track) = &self.session.current_track {
                tracing::info!(
                    track_id = %track.id,
                    played_secs = self.tracker.played(),
                    "Reporting recently played"
                );
                self.reporter.report_played(track);
            }
        }
        self.persist();
    }

    /// Duration reported by the primitive once the source is loaded.
    pub fn on_duration_change(&mut self, duration: f64) {
        if duration.is_finite() && duration > 0.0 {
            self.set_duration(duration);
        }
    }

    /// The loaded source played to its end.
    pub fn on_ended(&mut self) {
        if self.session.is_repeat && self.session.current_track.is_some() {
            self.session.current_time = 0.0;
            self.session.is_playing = true;
            self.primitive.seek(0.0);
            self.primitive.play();
            self.tracker.reset(0.0);
            tracing::debug!("Track ended, repeating");
        } else {
            self.session.is_playing = false;
            tracing::debug!("Track ended");
        }
        self.persist();
    }

    fn persist(&self) {
        let snapshot = match serde_json::to_value(&self.session) {
            Ok(snapshot) => snapshot,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to serialize player session");
                return;
            }
        };

        if let Err(e) = storage::merge_json(self.storage.as_ref(), PLAYER_STATE_KEY, snapshot) {
            tracing::warn!(error = %e, "Failed to persist player session");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::player::{ClockDriver, ClockPrimitive};
    use crate::storage::{KeyValueStorage, MemoryStorage};
    use parking_lot::Mutex;
    use std::sync::mpsc::Sender;

    #[derive(Debug, Clone, PartialEq)]
    enum Command {
        Load(String),
        Play,
        Pause,
        Seek(f64),
        Volume(f64),
        Muted(bool),
    }

    #[derive(Clone, Default)]
    struct RecordingPrimitive {
        commands: Arc<Mutex<Vec<Command>>>,
        events: Arc<Mutex<Option<Sender<PrimitiveEvent>>>>,
    }

    impl RecordingPrimitive {
        fn take(&self) -> Vec<Command> {
            std::mem::take(&mut *self.commands.lock())
        }

        fn send(&self, event: PrimitiveEvent) {
            if let Some(tx) = self.events.lock().as_ref() {
                tx.send(event).unwrap();
            }
        }
    }

    impl AudioPrimitive for RecordingPrimitive {
        fn subscribe(&mut self, events: Sender<PrimitiveEvent>) {
            *self.events.lock() = Some(events);
        }
        fn load(&mut self, track: &Track) {
            self.commands.lock().push(Command::Load(track.id.clone()));
        }
        fn play(&mut self) {
            self.commands.lock().push(Command::Play);
        }
        fn pause(&mut self) {
            self.commands.lock().push(Command::Pause);
        }
        fn seek(&mut self, position: f64) {
            self.commands.lock().push(Command::Seek(position));
        }
        fn set_volume(&mut self, volume: f64) {
            self.commands.lock().push(Command::Volume(volume));
        }
        fn set_muted(&mut self, muted: bool) {
            self.commands.lock().push(Command::Muted(muted));
        }
    }

    #[derive(Default)]
    struct RecordingReporter {
        reported: Mutex<Vec<String>>,
    }

    impl RecordingReporter {
        fn count(&self) -> usize {
            self.reported.lock().len()
        }
    }

    impl PlayReporter for RecordingReporter {
        fn report_played(&self, track: &Track) {
            self.reported.lock().push(track.id.clone());
        }
    }

    struct Harness {
        store: PlayerStore,
        primitive: RecordingPrimitive,
        reporter: Arc<RecordingReporter>,
        storage: Arc<MemoryStorage>,
    }

    fn harness_with(storage: Arc<MemoryStorage>) -> Harness {
        let primitive = RecordingPrimitive::default();
        let reporter = Arc::new(RecordingReporter::default());
        let store = PlayerStore::new(
            Box::new(primitive.clone()),
            storage.clone(),
            reporter.clone(),
            PlayerOptions::default(),
        );
        Harness {
            store,
            primitive,
            reporter,
            storage,
        }
    }

    fn harness() -> Harness {
        harness_with(Arc::new(MemoryStorage::new()))
    }

    fn track(id: &str) -> Track {
        Track {
            id: id.into(),
            title: format!("Track {id}"),
            artists: vec![],
            cover: None,
            duration: 180.0,
            audio: Some(format!("https://cdn.example.com/{id}.mp3")),
        }
    }

    fn tick_until(store: &mut PlayerStore, from: f64, to: f64) {
        let mut pos = from;
        while pos < to {
            pos += 0.5;
            store.on_time_update(pos);
        }
    }

    #[test]
    fn test_play_track_loads_and_persists() {
        let mut h = harness();
        h.store.play_track(&track("a"));

        assert_eq!(
            h.primitive.take(),
            vec![Command::Load("a".into()), Command::Play]
        );
        let session = h.store.session();
        assert!(session.is_playing);
        assert_eq!(session.current_time, 0.0);
        assert_eq!(session.duration, 180.0);

        let saved: PlayerSession =
            storage::load_json(h.storage.as_ref(), PLAYER_STATE_KEY).unwrap();
        assert_eq!(saved.current_track.unwrap().id, "a");
        assert!(saved.is_playing);
    }

    #[test]
    fn test_play_or_toggle_twice_matches_play_then_toggle() {
        let mut toggled = harness();
        toggled.store.play_or_toggle(&track("a"));
        toggled.store.play_or_toggle(&track("a"));

        let mut explicit = harness();
        explicit.store.play_track(&track("a"));
        explicit.store.toggle_play();

        assert_eq!(toggled.store.session(), explicit.store.session());
        assert_eq!(toggled.primitive.take(), explicit.primitive.take());
        assert!(!toggled.store.session().is_playing);
    }

    #[test]
    fn test_play_or_toggle_compares_by_id() {
        let mut h = harness();
        h.store.play_track(&track("a"));
        let mut renamed = track("a");
        renamed.title = "Different title".into();

        h.store.play_or_toggle(&renamed);
        assert!(!h.store.session().is_playing);

        h.store.play_or_toggle(&track("b"));
        assert!(h.store.session().is_playing);
        assert_eq!(h.store.session().current_track.as_ref().unwrap().id, "b");
    }

    #[test]
    fn test_toggle_without_track_is_noop() {
        let mut h = harness();
        h.primitive.take();
        h.store.toggle_play();
        assert!(!h.store.session().is_playing);
        assert!(h.primitive.take().is_empty());
        assert!(h.storage.get(PLAYER_STATE_KEY).unwrap().is_none());
    }

    #[test]
    fn test_volume_zero_mutes_and_nonzero_unmutes() {
        let mut h = harness();
        for (volume, muted) in [(40, false), (0, true), (0, true), (25, false), (100, false)] {
            h.store.set_volume(volume);
            assert_eq!(h.store.session().is_muted, muted, "after set_volume({volume})");
        }
    }

    #[test]
    fn test_toggle_mute_overrides_until_next_volume() {
        let mut h = harness();
        h.store.set_volume(60);
        h.store.toggle_mute();
        assert!(h.store.session().is_muted);

        h.store.set_volume(30);
        assert!(!h.store.session().is_muted);

        h.store.set_volume(0);
        h.store.toggle_mute();
        assert!(!h.store.session().is_muted);
        assert!(h.store.session().effectively_muted());
    }

    #[test]
    fn test_volume_is_clamped_and_applied() {
        let mut h = harness();
        h.primitive.take();
        h.store.set_volume(250);
        assert_eq!(h.store.session().volume, 100);
        assert_eq!(
            h.primitive.take(),
            vec![Command::Volume(1.0), Command::Muted(false)]
        );
    }

    #[test]
    fn test_seek_clamps_to_duration() {
        let mut h = harness();
        h.store.play_track(&track("a"));
        h.primitive.take();

        h.store.set_current_time(500.0);
        assert_eq!(h.store.session().current_time, 180.0);
        h.store.set_current_time(-5.0);
        assert_eq!(h.store.session().current_time, 0.0);
        assert_eq!(
            h.primitive.take(),
            vec![Command::Seek(180.0), Command::Seek(0.0)]
        );
    }

    #[test]
    fn test_recently_played_fires_once_after_threshold() {
        let mut h = harness();
        h.store.play_track(&track("a"));

        tick_until(&mut h.store, 0.0, 9.5);
        assert_eq!(h.reporter.count(), 0);

        h.store.on_time_update(10.0);
        assert_eq!(h.reporter.count(), 1);

        tick_until(&mut h.store, 10.0, 60.0);
        assert_eq!(h.reporter.count(), 1);
    }

    #[test]
    fn test_backward_seek_does_not_count_toward_threshold() {
        let mut h = harness();
        h.store.play_track(&track("a"));

        tick_until(&mut h.store, 0.0, 8.0);
        h.store.set_current_time(2.0);
        tick_until(&mut h.store, 2.0, 3.5);
        assert_eq!(h.reporter.count(), 0);

        h.store.on_time_update(4.0);
        assert_eq!(h.reporter.count(), 1);
    }

    #[test]
    fn test_forward_seek_does_not_count_toward_threshold() {
        let mut h = harness();
        h.store.play_track(&track("a"));

        h.store.set_current_time(100.0);
        h.store.on_time_update(100.5);
        h.store.on_time_update(150.0);
        assert_eq!(h.reporter.count(), 0);
    }

    #[test]
    fn test_paused_time_does_not_count() {
        let mut h = harness();
        h.store.play_track(&track("a"));
        h.store.toggle_play();

        tick_until(&mut h.store, 0.0, 20.0);
        assert_eq!(h.reporter.count(), 0);
    }

    #[test]
    fn test_replaying_same_track_resets_counter() {
        let mut h = harness();
        h.store.play_track(&track("a"));
        tick_until(&mut h.store, 0.0, 10.0);
        assert_eq!(h.reporter.count(), 1);

        h.store.play_track(&track("a"));
        tick_until(&mut h.store, 0.0, 9.5);
        assert_eq!(h.reporter.count(), 1);
        h.store.on_time_update(10.0);
        assert_eq!(h.reporter.count(), 2);
        assert_eq!(*h.reporter.reported.lock(), vec!["a", "a"]);
    }

    #[test]
    fn test_time_update_without_track_does_not_report() {
        let mut h = harness();
        tick_until(&mut h.store, 0.0, 20.0);
        assert_eq!(h.reporter.count(), 0);
        assert_eq!(h.store.session().current_time, 20.0);
    }

    #[test]
    fn test_ended_with_repeat_restarts() {
        let mut h = harness();
        h.store.play_track(&track("a"));
        h.store.toggle_repeat();
        h.store.on_time_update(1.0);
        h.primitive.take();

        h.store.on_ended();

        let session = h.store.session();
        assert_eq!(session.current_time, 0.0);
        assert!(session.is_playing);
        assert_eq!(h.primitive.take(), vec![Command::Seek(0.0), Command::Play]);
    }

    #[test]
    fn test_ended_without_repeat_stops_in_place() {
        let mut h = harness();
        h.store.play_track(&track("a"));
        h.store.on_time_update(1.5);

        h.store.on_ended();

        let session = h.store.session();
        assert!(!session.is_playing);
        assert_eq!(session.current_time, 1.5);

        let saved: PlayerSession =
            storage::load_json(h.storage.as_ref(), PLAYER_STATE_KEY).unwrap();
        assert!(!saved.is_playing);
    }

    #[test]
    fn test_pump_events_applies_primitive_signals() {
        let mut h = harness();
        h.store.play_track(&track("a"));

        h.primitive.send(PrimitiveEvent::DurationChange(200.0));
        h.primitive.send(PrimitiveEvent::TimeUpdate(0.5));
        h.primitive.send(PrimitiveEvent::Ended);

        assert_eq!(h.store.pump_events(), 3);
        let session = h.store.session();
        assert_eq!(session.duration, 200.0);
        assert_eq!(session.current_time, 0.5);
        assert!(!session.is_playing);
        assert_eq!(h.store.pump_events(), 0);
    }

    #[test]
    fn test_reload_restores_session_but_not_playing() {
        let storage = Arc::new(MemoryStorage::new());
        {
            let mut h = harness_with(storage.clone());
            h.store.play_track(&track("a"));
            h.store.on_time_update(1.5);
            h.store.on_time_update(2.0);
            h.store.set_volume(35);
            h.store.toggle_mute();
            h.store.toggle_repeat();
            h.store.set_duration(175.0);
            assert!(h.store.session().is_playing);
        }

        let h = harness_with(storage);
        let session = h.store.session();
        assert_eq!(session.current_track.as_ref().unwrap().id, "a");
        assert_eq!(session.current_time, 2.0);
        assert_eq!(session.duration, 175.0);
        assert_eq!(session.volume, 35);
        assert!(session.is_muted);
        assert!(session.is_repeat);
        assert!(!session.is_playing);

        assert_eq!(
            h.primitive.take(),
            vec![
                Command::Load("a".into()),
                Command::Seek(2.0),
                Command::Volume(0.35),
                Command::Muted(true),
            ]
        );
    }

    #[test]
    fn test_hydrated_track_resumes_with_toggle() {
        let storage = Arc::new(MemoryStorage::new());
        {
            let mut h = harness_with(storage.clone());
            h.store.play_track(&track("a"));
        }

        let mut h = harness_with(storage);
        h.primitive.take();
        h.store.toggle_play();
        assert!(h.store.session().is_playing);
        assert_eq!(h.primitive.take(), vec![Command::Play]);
    }

    #[test]
    fn test_corrupt_slot_uses_defaults() {
        let storage = Arc::new(MemoryStorage::new());
        storage.set(PLAYER_STATE_KEY, "{{{").unwrap();

        let h = harness_with(storage);
        assert_eq!(h.store.session(), &PlayerSession::default());
    }

    #[test]
    fn test_persist_merges_into_existing_slot() {
        let storage = Arc::new(MemoryStorage::new());
        storage
            .set(PLAYER_STATE_KEY, r#"{"queueHint":"keep-me","volume":20}"#)
            .unwrap();

        let mut h = harness_with(storage.clone());
        assert_eq!(h.store.session().volume, 20);
        h.store.toggle_repeat();

        let raw: serde_json::Value =
            storage::load_json(storage.as_ref(), PLAYER_STATE_KEY).unwrap();
        assert_eq!(raw["queueHint"], "keep-me");
        assert_eq!(raw["isRepeat"], true);
    }

    fn clock_harness() -> (PlayerStore, ClockDriver, Arc<RecordingReporter>) {
        let (clock, driver) = ClockPrimitive::new();
        let reporter = Arc::new(RecordingReporter::default());
        let store = PlayerStore::new(
            Box::new(clock),
            Arc::new(MemoryStorage::new()),
            reporter.clone(),
            PlayerOptions::default(),
        );
        (store, driver, reporter)
    }

    fn short_track(id: &str, duration: f64) -> Track {
        Track {
            duration,
            ..track(id)
        }
    }

    #[test]
    fn test_clock_ticks_report_once_past_threshold() {
        let (mut store, driver, reporter) = clock_harness();
        store.play_track(&track("a"));

        for _ in 0..60 {
            driver.advance(0.25);
            store.pump_events();
        }

        assert_eq!(store.session().current_time, 15.0);
        assert_eq!(reporter.count(), 1);
    }

    #[test]
    fn test_toggle_after_end_resumes_from_start() {
        let (mut store, driver, _reporter) = clock_harness();
        store.play_track(&short_track("a", 60.0));
        driver.advance(61.0);
        store.pump_events();
        assert!(!store.session().is_playing);
        assert_eq!(store.session().current_time, 60.0);

        store.toggle_play();
        assert_eq!(store.session().current_time, 0.0);
        driver.advance(0.25);
        store.pump_events();

        let session = store.session();
        assert!(session.is_playing);
        assert_eq!(session.current_time, 0.25);
        assert!(driver.is_playing());
    }

    #[test]
    fn test_drive_leaves_no_events_for_the_next_action() {
        let (mut store, driver, _reporter) = clock_harness();
        store.play_track(&short_track("a", 0.01));
        std::thread::sleep(std::time::Duration::from_millis(30));

        assert!(driver.drive(&mut store) > 0);
        assert!(!store.session().is_playing);

        // Events from the finished track were already applied, so the new
        // track is not stopped by a stale end signal.
        store.play_track(&track("b"));
        assert_eq!(store.pump_events(), 1);
        assert!(store.session().is_playing);
        assert_eq!(store.session().current_track.as_ref().unwrap().id, "b");
    }
}
