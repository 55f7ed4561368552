//! Arena geometry: fixed center, two ring radii, ring transitions

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::tuning::ArenaTuning;
use crate::{cartesian_to_polar, ease_out_cubic, polar_to_cartesian};

/// One of the two radius tiers a paddle may occupy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Ring {
    Outer,
    Inner,
}

impl Ring {
    pub fn other(self) -> Self {
        match self {
            Ring::Outer => Ring::Inner,
            Ring::Inner => Ring::Outer,
        }
    }
}

/// Animated move between rings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RingTransition {
    /// 0 at departure, 1 on arrival
    pub progress: f32,
    pub from: Ring,
    pub to: Ring,
}

impl RingTransition {
    pub fn new(from: Ring) -> Self {
        Self {
            progress: 0.0,
            from,
            to: from.other(),
        }
    }

    /// Advance by `dt`; returns true once the destination is reached
    pub fn advance(&mut self, dt: f32, duration: f32) -> bool {
        self.progress = (self.progress + dt / duration).min(1.0);
        self.progress >= 1.0
    }

    /// +1 when moving inward, -1 when moving outward
    pub fn direction_sign(&self) -> f32 {
        match self.to {
            Ring::Inner => 1.0,
            Ring::Outer => -1.0,
        }
    }
}

/// Circular arena, fixed for the match
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Arena {
    pub center: Vec2,
    pub outer_radius: f32,
    pub inner_radius: f32,
}

impl Arena {
    pub fn new(center: Vec2, outer_radius: f32, inner_ratio: f32) -> Self {
        Self {
            center,
            outer_radius,
            inner_radius: outer_radius * inner_ratio,
        }
    }

    pub fn from_tuning(tuning: &ArenaTuning) -> Self {
        Self::new(tuning.center, tuning.outer_radius, tuning.inner_ratio)
    }

    pub fn ring_radius(&self, ring: Ring) -> f32 {
        match ring {
            Ring::Outer => self.outer_radius,
            Ring::Inner => self.inner_radius,
        }
    }

    /// Radius of a paddle mid-transition (eased)
    pub fn transition_radius(&self, transition: &RingTransition) -> f32 {
        let from = self.ring_radius(transition.from);
        let to = self.ring_radius(transition.to);
        from + (to - from) * ease_out_cubic(transition.progress)
    }

    /// Position relative to the arena center in polar form (distance, angle)
    #[inline]
    pub fn to_polar(&self, pos: Vec2) -> (f32, f32) {
        cartesian_to_polar(pos - self.center)
    }

    /// World position from polar coordinates around the center
    #[inline]
    pub fn from_polar(&self, r: f32, theta: f32) -> Vec2 {
        self.center + polar_to_cartesian(r, theta)
    }

    #[inline]
    pub fn distance_from_center(&self, pos: Vec2) -> f32 {
        (pos - self.center).length()
    }

    /// Unit vector from `pos` toward the center (zero at the center)
    #[inline]
    pub fn toward_center(&self, pos: Vec2) -> Vec2 {
        (self.center - pos).normalize_or_zero()
    }
}
