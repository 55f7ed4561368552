//! Discrete feedback events emitted by a simulation step
//!
//! Consumed by audio, rendering and network collaborators. Events carry
//! everything the consumer needs; nothing refers back into live state.

use serde::{Deserialize, Serialize};

use super::powerup::PowerUpKind;
use super::special::SpecialState;
use super::state::{EntityId, RoundStats};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GameEvent {
    /// A paddle deflected a regular ball
    PaddleHit {
        paddle: EntityId,
        ball: EntityId,
        edge_hit: bool,
        /// Momentum boost imparted (1.0 = none)
        momentum: f32,
        /// Points awarded (0 for AI hits)
        points: u64,
    },
    /// A paddle deflected the capture objective
    SpecialHit {
        paddle: EntityId,
        state: SpecialState,
    },
    SpecialSpawned {
        id: EntityId,
    },
    SpecialStateChanged {
        state: SpecialState,
    },
    PowerUpCollected {
        kind: PowerUpKind,
        paddle: EntityId,
    },
    /// An AI paddle consumed a pickup before a player could
    PowerUpDenied {
        kind: PowerUpKind,
        paddle: EntityId,
    },
    EffectExpired {
        kind: PowerUpKind,
    },
    RingSwitchOk {
        paddle: EntityId,
    },
    RingSwitchBlocked {
        paddle: EntityId,
    },
    PaddleCollision {
        a: EntityId,
        b: EntityId,
        /// 0..1
        intensity: f32,
    },
    NearMiss {
        ball: EntityId,
        paddle: EntityId,
        bonus: u64,
    },
    BallEscaped {
        ball: EntityId,
    },
    BallCaptured {
        bonus: u64,
    },
    ComboMilestone {
        level: u32,
    },
    /// The capture objective left the arena uncaptured
    SpecialEscaped,
    RoundEnded {
        score: u64,
        stats: RoundStats,
    },
}
