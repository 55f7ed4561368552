//! Power-up pickups and the timed effects they grant
//!
//! Effects compose: arc bonuses and paddle speed bonuses add up, ball speed
//! and points multipliers multiply. Expiry is a wall-clock comparison
//! against simulation time.

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::state::EntityId;
use crate::tuning::PowerUpTuning;

/// Power-up types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PowerUpKind {
    WidePaddle,
    NarrowPaddle,
    PaddleSpeed,
    SlowBalls,
    FastBalls,
    DoublePoints,
}

impl PowerUpKind {
    pub const ALL: [PowerUpKind; 6] = [
        PowerUpKind::WidePaddle,
        PowerUpKind::NarrowPaddle,
        PowerUpKind::PaddleSpeed,
        PowerUpKind::SlowBalls,
        PowerUpKind::FastBalls,
        PowerUpKind::DoublePoints,
    ];

    /// Debuffs the player would rather not collect
    pub fn is_negative(&self) -> bool {
        matches!(self, PowerUpKind::NarrowPaddle | PowerUpKind::FastBalls)
    }

    /// Uniform pick across all kinds
    pub fn roll<R: Rng>(rng: &mut R) -> Self {
        Self::ALL[rng.random_range(0..Self::ALL.len())]
    }
}

/// A pickup entity drifting outward from the center
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PowerUp {
    pub id: EntityId,
    pub kind: PowerUpKind,
    pub pos: Vec2,
    pub vel: Vec2,
    pub base_radius: f32,
    pub spawn_progress: f32,
    pub escaped: bool,
}

impl PowerUp {
    pub fn new(id: EntityId, kind: PowerUpKind, pos: Vec2, vel: Vec2, base_radius: f32) -> Self {
        Self {
            id,
            kind,
            pos,
            vel,
            base_radius,
            spawn_progress: 0.0,
            escaped: false,
        }
    }

    pub fn radius(&self) -> f32 {
        self.base_radius * crate::ease_out_cubic(self.spawn_progress)
    }

    pub fn integrate(&mut self, dt: f32, spawn_duration: f32) {
        self.spawn_progress = (self.spawn_progress + dt / spawn_duration).min(1.0);
        self.pos += self.vel * dt;
    }
}

/// A timed buff or debuff
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ActiveEffect {
    pub kind: PowerUpKind,
    /// Copied from the tuning table when granted
    pub magnitude: f32,
    /// Simulation time at which the effect lapses
    pub expiry_time: f32,
}

/// All currently running effects (instances stack)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ActiveEffects {
    pub effects: Vec<ActiveEffect>,
}

impl ActiveEffects {
    pub fn add(&mut self, kind: PowerUpKind, now: f32, tuning: &PowerUpTuning) {
        let effect = tuning.effect(kind);
        self.effects.push(ActiveEffect {
            kind,
            magnitude: effect.magnitude,
            expiry_time: now + effect.duration,
        });
    }

    /// Drop lapsed effects, returning their kinds
    pub fn prune(&mut self, now: f32) -> Vec<PowerUpKind> {
        let mut expired = Vec::new();
        self.effects.retain(|effect| {
            if now >= effect.expiry_time {
                expired.push(effect.kind);
                false
            } else {
                true
            }
        });
        expired
    }

    pub fn clear(&mut self) {
        self.effects.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.effects.is_empty()
    }

    /// Sum of arc width bonuses (may be negative)
    pub fn arc_bonus(&self) -> f32 {
        self.effects
            .iter()
            .filter(|e| matches!(e.kind, PowerUpKind::WidePaddle | PowerUpKind::NarrowPaddle))
            .map(|e| e.magnitude)
            .sum()
    }

    /// Sum of paddle max speed bonuses
    pub fn paddle_speed_bonus(&self) -> f32 {
        self.effects
            .iter()
            .filter(|e| e.kind == PowerUpKind::PaddleSpeed)
            .map(|e| e.magnitude)
            .sum()
    }

    /// Product of ball speed multipliers
    pub fn ball_speed_multiplier(&self) -> f32 {
        self.effects
            .iter()
            .filter(|e| matches!(e.kind, PowerUpKind::SlowBalls | PowerUpKind::FastBalls))
            .map(|e| e.magnitude)
            .product()
    }

    /// Product of points multipliers
    pub fn points_multiplier(&self) -> f32 {
        self.effects
            .iter()
            .filter(|e| e.kind == PowerUpKind::DoublePoints)
            .map(|e| e.magnitude)
            .product()
    }

    /// Target paddle arc width given the base width and a floor
    pub fn target_arc_width(&self, base: f32, floor: f32) -> f32 {
        (base + self.arc_bonus()).max(floor)
    }
}
