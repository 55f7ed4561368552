//! Local single-player frame loop
//!
//! The renderer calls `frame` once per displayed frame with the elapsed
//! time; the step clamps oversized deltas itself.

use crate::audio::{CueQueue, Tone};
use crate::settings::MatchSettings;
use crate::sim::events::GameEvent;
use crate::sim::snapshot::Snapshot;
use crate::sim::state::{GameState, Seat};
use crate::sim::tick::Intent;
use crate::tuning::Tuning;

const LOCAL_SEAT: Seat = 0;

/// Everything a frame produced for the feedback collaborators
#[derive(Debug, Clone, Default)]
pub struct FrameOutput {
    pub events: Vec<GameEvent>,
    /// Tones due this frame
    pub tones: Vec<Tone>,
}

/// Game instance holding all state for a local match
pub struct SoloHarness {
    state: GameState,
    settings: MatchSettings,
    tuning: Tuning,
    cues: CueQueue,
    pending: Vec<Intent>,
}

impl SoloHarness {
    pub fn new(settings: MatchSettings, tuning: Tuning) -> Self {
        let state = GameState::new(&settings, tuning.clone());
        let cues = CueQueue::from_settings(&settings);
        Self {
            state,
            settings,
            tuning,
            cues,
            pending: Vec::new(),
        }
    }

    pub fn set_target_angle(&mut self, angle: f32) {
        self.pending.push(Intent::target_angle(LOCAL_SEAT, angle));
    }

    pub fn set_directional_impulse(&mut self, dir: i8) {
        self.pending.push(Intent::directional(LOCAL_SEAT, dir));
    }

    pub fn request_ring_switch(&mut self) {
        self.pending.push(Intent::ring_switch(LOCAL_SEAT));
    }

    /// Pause or resume; returns true if now paused
    pub fn toggle_pause(&mut self) -> bool {
        let paused = self.state.is_running();
        self.state.set_paused(paused);
        log::info!("{}", if paused { "Paused" } else { "Resumed" });
        paused
    }

    /// Run one simulation step for this frame
    pub fn frame(&mut self, dt: f32) -> FrameOutput {
        let intents = std::mem::take(&mut self.pending);
        let events = self.state.step(&intents, dt);
        self.cues.push_events(&events);
        let tones = self.cues.drain_due(dt);
        FrameOutput { events, tones }
    }

    pub fn snapshot(&self) -> Snapshot {
        self.state.snapshot()
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn is_over(&self) -> bool {
        self.state.is_over()
    }

    /// Start a fresh round with a new seed
    pub fn restart(&mut self, seed: u64) {
        self.settings.seed = seed;
        self.state = GameState::new(&self.settings, self.tuning.clone());
        self.pending.clear();
        self.cues.clear();
        log::info!("Game restarted with seed: {}", seed);
    }
}
