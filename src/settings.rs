//! Match settings and difficulty presets
//!
//! Chosen by the harness before a round starts; immutable for the match.

use serde::{Deserialize, Serialize};

use crate::sim::ai::DEFAULT_ROSTER;

/// Difficulty preset levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Difficulty {
    Easy,
    #[default]
    Normal,
    Hard,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "Easy",
            Difficulty::Normal => "Normal",
            Difficulty::Hard => "Hard",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "easy" => Some(Difficulty::Easy),
            "normal" | "norm" => Some(Difficulty::Normal),
            "hard" => Some(Difficulty::Hard),
            _ => None,
        }
    }

    /// Multiplier on AI max angular speed
    pub fn ai_speed_scale(&self) -> f32 {
        match self {
            Difficulty::Easy => 0.75,
            Difficulty::Normal => 1.0,
            Difficulty::Hard => 1.2,
        }
    }

    /// Multiplier on AI re-evaluation intervals (lower = sharper)
    pub fn reaction_scale(&self) -> f32 {
        match self {
            Difficulty::Easy => 1.5,
            Difficulty::Normal => 1.0,
            Difficulty::Hard => 0.7,
        }
    }

    /// Multiplier on the regular ball spawn interval
    pub fn spawn_interval_scale(&self) -> f32 {
        match self {
            Difficulty::Easy => 1.25,
            Difficulty::Normal => 1.0,
            Difficulty::Hard => 0.8,
        }
    }
}

/// Per-match settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchSettings {
    /// Seed for the match RNG
    pub seed: u64,
    pub difficulty: Difficulty,
    /// Number of human seats (1 = solo)
    pub seats: u8,
    /// AI opponents by profile name, in paddle order
    pub ai_roster: Vec<String>,

    // === Audio cues ===
    /// Master volume (0.0 - 1.0)
    pub master_volume: f32,
    /// Sound effects volume (0.0 - 1.0)
    pub sfx_volume: f32,
    pub muted: bool,
}

impl Default for MatchSettings {
    fn default() -> Self {
        Self {
            seed: 0,
            difficulty: Difficulty::Normal,
            seats: 1,
            ai_roster: DEFAULT_ROSTER.iter().map(|s| s.to_string()).collect(),
            master_volume: 0.8,
            sfx_volume: 1.0,
            muted: false,
        }
    }
}

impl MatchSettings {
    /// Solo match with the default roster
    pub fn solo(seed: u64) -> Self {
        Self {
            seed,
            ..Self::default()
        }
    }

    /// Cooperative multiplayer match
    pub fn multiplayer(seed: u64, seats: u8) -> Self {
        Self {
            seed,
            seats: seats.max(1),
            ..Self::default()
        }
    }

    pub fn is_solo(&self) -> bool {
        self.seats <= 1
    }

    /// Effective cue volume (respects mute)
    pub fn effective_volume(&self) -> f32 {
        if self.muted {
            0.0
        } else {
            (self.master_volume * self.sfx_volume).clamp(0.0, 1.0)
        }
    }
}
