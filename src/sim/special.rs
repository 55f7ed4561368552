//! Capture objective lifecycle
//!
//! ```text
//! (none) ──spawn──▶ Active ──timer──▶ ReadyToReturn ──hit──▶ Returning
//!                                                              │   ▲
//!                                             claim zone held  │   │ left zone (claim resets)
//!                                                              ▼   │
//!                                                         ForceCapture ──▶ Captured
//! Active / ReadyToReturn / Returning ──outside arena──▶ Escaped (round over)
//! ```

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::arena::Arena;
use super::state::{Ball, EntityId};
use crate::tuning::{BallTuning, SpecialTuning};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SpecialState {
    Active,
    /// Timer elapsed; the next paddle hit starts the return
    ReadyToReturn,
    Returning,
    /// Velocity locked toward center; deflections ignored
    ForceCapture,
}

/// Terminal results of a step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpecialOutcome {
    Captured,
    Escaped,
}

/// The singleton capture objective
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpecialBall {
    pub ball: Ball,
    pub state: SpecialState,
    /// Seconds spent in Active
    pub active_time: f32,
    /// Seconds spent returning (Returning + ForceCapture)
    pub return_time: f32,
    /// Continuous seconds inside the claim zone
    pub claim_time: f32,
    /// 0 → 1 as it nears the center while returning
    pub shrink_progress: f32,
}

impl SpecialBall {
    /// Spawn at the arena center heading outward along `angle`
    pub fn spawn(
        id: EntityId,
        arena: &Arena,
        angle: f32,
        ball_tuning: &BallTuning,
        tuning: &SpecialTuning,
    ) -> Self {
        let speed = ball_tuning.base_speed * tuning.speed_factor;
        let vel = Vec2::from_angle(angle) * speed;
        Self {
            ball: Ball::new(id, arena.center, vel, tuning.base_radius),
            state: SpecialState::Active,
            active_time: 0.0,
            return_time: 0.0,
            claim_time: 0.0,
            shrink_progress: 0.0,
        }
    }

    pub fn id(&self) -> EntityId {
        self.ball.id
    }

    /// Effective collision radius including shrink
    pub fn radius(&self, tuning: &SpecialTuning) -> f32 {
        self.ball.radius() * (1.0 - self.shrink_progress * (1.0 - tuning.min_shrink_scale))
    }

    pub fn is_returning(&self) -> bool {
        matches!(self.state, SpecialState::Returning | SpecialState::ForceCapture)
    }

    /// Paddles no longer deflect it once capture is forced
    pub fn accepts_hits(&self) -> bool {
        self.state != SpecialState::ForceCapture && self.ball.hit_cooldown <= 0.0
    }

    /// Claim progress 0..1 for display
    pub fn claim_progress(&self, tuning: &SpecialTuning) -> f32 {
        (self.claim_time / tuning.claim_time).clamp(0.0, 1.0)
    }

    /// Register a paddle deflection; returns the new state if it changed
    pub fn on_hit(&mut self, cooldown: f32) -> Option<SpecialState> {
        self.ball.hit_cooldown = cooldown;
        if self.state == SpecialState::ReadyToReturn {
            self.state = SpecialState::Returning;
            log::debug!("Special {} returning", self.ball.id);
            return Some(self.state);
        }
        None
    }

    /// Advance timers, steering and position; returns the new state if it changed
    pub fn advance(
        &mut self,
        dt: f32,
        arena: &Arena,
        tuning: &SpecialTuning,
        ball_tuning: &BallTuning,
    ) -> Option<SpecialState> {
        let mut changed = None;

        if self.state == SpecialState::Active {
            self.active_time += dt;
            if self.active_time >= tuning.active_duration {
                self.state = SpecialState::ReadyToReturn;
                changed = Some(self.state);
            }
        }

        if self.is_returning() {
            self.return_time += dt;
        }

        let dist = arena.distance_from_center(self.ball.pos);
        let toward = arena.toward_center(self.ball.pos);

        if self.state == SpecialState::Returning {
            if self.claim_time >= tuning.claim_time {
                self.state = SpecialState::ForceCapture;
                changed = Some(self.state);
                log::debug!("Special {} force capture", self.ball.id);
            } else {
                if dist <= arena.outer_radius * tuning.gravity_range_ratio {
                    let speed = self.ball.vel.length();
                    let biased = self.ball.vel + toward * tuning.gravity_strength * dt;
                    self.ball.vel = biased.normalize_or(toward) * speed;
                }
                if dist <= arena.outer_radius * tuning.claim_radius_ratio {
                    self.claim_time += dt;
                } else {
                    self.claim_time = 0.0;
                }
            }
        }

        if self.state == SpecialState::ForceCapture {
            self.ball.vel = toward * tuning.capture_speed;
            self.ball.speed_multiplier = 1.0;
            self.ball.spin = 0.0;
        }

        if self.is_returning() {
            let start = arena.outer_radius * tuning.shrink_start_ratio;
            self.shrink_progress = self
                .shrink_progress
                .max((1.0 - dist / start).clamp(0.0, 1.0));
        }

        self.ball.integrate(dt, ball_tuning, 1.0);
        changed
    }

    /// Check for capture or escape after movement
    pub fn outcome(&self, arena: &Arena, tuning: &SpecialTuning) -> Option<SpecialOutcome> {
        let dist = arena.distance_from_center(self.ball.pos);
        if self.is_returning() && dist <= tuning.capture_radius {
            return Some(SpecialOutcome::Captured);
        }
        if self.state != SpecialState::ForceCapture
            && dist >= arena.outer_radius
            && self.ball.hit_cooldown <= 0.0
        {
            return Some(SpecialOutcome::Escaped);
        }
        None
    }
}
