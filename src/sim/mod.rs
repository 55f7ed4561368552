//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Seeded RNG only (one generator, owned by `GameState`)
//! - Stable iteration order (players, then AIs; entities by ID)
//! - No rendering, audio or platform dependencies

pub mod ai;
pub mod arc;
pub mod arena;
pub mod collision;
pub mod events;
pub mod powerup;
pub mod scoring;
pub mod snapshot;
pub mod special;
pub mod state;
pub mod tick;

pub use ai::{AiController, AiProfile};
pub use arc::ArcSegment;
pub use arena::{Arena, Ring, RingTransition};
pub use collision::{CollisionResult, point_arc_collision, resolve_paddle_collisions};
pub use events::GameEvent;
pub use powerup::{ActiveEffects, PowerUp, PowerUpKind};
pub use scoring::ComboState;
pub use snapshot::Snapshot;
pub use special::{SpecialBall, SpecialState};
pub use state::{Ball, EntityId, GameState, Paddle, PaddleOwner, RoundState, RoundStats, Seat};
pub use tick::{Intent, IntentKind, step};
