//! Orbit Arena - circular arena physics, collision and AI core
//!
//! Core modules:
//! - `sim`: Deterministic simulation (geometry, collisions, special ball, scoring, AI)
//! - `harness`: Solo frame loop and networked authority wrapping the simulation
//! - `audio`: Feedback cue queue for the external audio collaborator
//! - `tuning`: Data-driven game balance
//! - `settings`: Match settings and difficulty presets

pub mod audio;
pub mod harness;
pub mod settings;
pub mod sim;
pub mod tuning;

pub use settings::{Difficulty, MatchSettings};
pub use tuning::{Tuning, TuningError};

use glam::Vec2;

/// Simulation configuration constants
pub mod consts {
    /// Fixed simulation timestep used by the networked authority (60 Hz)
    pub const SIM_DT: f32 = 1.0 / 60.0;
    /// Largest delta a single step will integrate; bigger frames are clamped
    pub const MAX_STEP_DT: f32 = 1.0 / 30.0;
    /// Maximum catch-up ticks per authority advance to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;
    /// Snapshot broadcast interval for the networked harness (20 Hz)
    pub const BROADCAST_INTERVAL: f32 = 1.0 / 20.0;
    /// Spawn progress within this distance of 1.0 snaps to fully grown
    pub const SPAWN_SNAP_EPSILON: f32 = 1e-4;
}

/// Normalized angle to [-π, π); non-finite input stays non-finite
#[inline]
pub fn normalize_angle(angle: f32) -> f32 {
    use std::f32::consts::{PI, TAU};
    if (-PI..PI).contains(&angle) {
        return angle;
    }
    let wrapped = (angle + PI).rem_euclid(TAU) - PI;
    // rem_euclid may round up to TAU
    if wrapped >= PI { wrapped - TAU } else { wrapped }
}

/// Signed shortest angular difference `to - from`, in [-π, π)
#[inline]
pub fn angle_delta(from: f32, to: f32) -> f32 {
    normalize_angle(to - from)
}

/// Convert polar (r, theta) to cartesian (x, y)
#[inline]
pub fn polar_to_cartesian(r: f32, theta: f32) -> Vec2 {
    Vec2::new(r * theta.cos(), r * theta.sin())
}

/// Convert cartesian (x, y) to polar (r, theta)
#[inline]
pub fn cartesian_to_polar(pos: Vec2) -> (f32, f32) {
    (pos.length(), pos.y.atan2(pos.x))
}

/// Outgoing cubic ease, 0 → 1
#[inline]
pub fn ease_out_cubic(t: f32) -> f32 {
    let inv = 1.0 - t.clamp(0.0, 1.0);
    1.0 - inv * inv * inv
}
