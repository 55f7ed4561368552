//! Immutable per-tick views for rendering and network collaborators
//!
//! A snapshot carries only current position and velocity per entity.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::arena::Ring;
use super::powerup::PowerUpKind;
use super::special::SpecialState;
use super::state::{EntityId, GameState, PaddleOwner, RoundState};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaddleView {
    pub id: EntityId,
    pub owner: PaddleOwner,
    pub angle: f32,
    pub angular_velocity: f32,
    pub arc_width: f32,
    pub ring: Ring,
    /// Current centerline radius (interpolated mid-switch)
    pub radius: f32,
    pub transition_progress: Option<f32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BallView {
    pub id: EntityId,
    pub pos: Vec2,
    /// Effective velocity
    pub vel: Vec2,
    pub radius: f32,
    pub escaped: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpecialView {
    pub id: EntityId,
    pub pos: Vec2,
    pub vel: Vec2,
    pub radius: f32,
    pub state: SpecialState,
    pub shrink_progress: f32,
    pub claim_progress: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PowerUpView {
    pub id: EntityId,
    pub kind: PowerUpKind,
    pub pos: Vec2,
    pub vel: Vec2,
    pub radius: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EffectView {
    pub kind: PowerUpKind,
    /// Seconds left
    pub remaining: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub time: f32,
    pub paddles: Vec<PaddleView>,
    pub balls: Vec<BallView>,
    pub special: Option<SpecialView>,
    pub powerups: Vec<PowerUpView>,
    pub active_effects: Vec<EffectView>,
    pub score: u64,
    pub combo_count: u32,
    pub combo_multiplier: f32,
    pub round_state: RoundState,
}

impl Snapshot {
    pub fn capture(state: &GameState) -> Self {
        let ball_mult = state.effects.ball_speed_multiplier();
        Self {
            time: state.time,
            paddles: state
                .paddles
                .iter()
                .map(|p| PaddleView {
                    id: p.id,
                    owner: p.owner,
                    angle: p.angle,
                    angular_velocity: p.angular_velocity,
                    arc_width: p.arc_width,
                    ring: p.ring,
                    radius: p.radius(&state.arena),
                    transition_progress: p.transition.map(|t| t.progress),
                })
                .collect(),
            balls: state
                .balls
                .iter()
                .map(|b| BallView {
                    id: b.id,
                    pos: b.pos,
                    vel: b.effective_velocity(ball_mult),
                    radius: b.radius(),
                    escaped: b.escaped,
                })
                .collect(),
            special: state.special.as_ref().map(|s| SpecialView {
                id: s.id(),
                pos: s.ball.pos,
                vel: s.ball.effective_velocity(1.0),
                radius: s.radius(&state.tuning.special),
                state: s.state,
                shrink_progress: s.shrink_progress,
                claim_progress: s.claim_progress(&state.tuning.special),
            }),
            powerups: state
                .powerups
                .iter()
                .map(|p| PowerUpView {
                    id: p.id,
                    kind: p.kind,
                    pos: p.pos,
                    vel: p.vel,
                    radius: p.radius(),
                })
                .collect(),
            active_effects: state
                .effects
                .effects
                .iter()
                .map(|e| EffectView {
                    kind: e.kind,
                    remaining: (e.expiry_time - state.time).max(0.0),
                })
                .collect(),
            score: state.score,
            combo_count: state.combo.count,
            combo_multiplier: state.combo_multiplier(),
            round_state: state.round,
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
