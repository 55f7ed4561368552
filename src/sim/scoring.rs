//! Combo counter and points formulas
//!
//! Combo decays gradually: once `combo_timeout` seconds pass without a
//! scoring hit, the count drops by one at most every `combo_decay_interval`
//! seconds. The check runs once per simulation step.

use serde::{Deserialize, Serialize};

use crate::tuning::ScoringTuning;

/// Consecutive-hit counter
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ComboState {
    pub count: u32,
    pub last_hit_time: f32,
    pub max_count: u32,
    last_decay_time: f32,
}

impl ComboState {
    /// Record a scoring hit; returns the milestone crossed, if any
    pub fn register_hit(&mut self, now: f32, milestones: &[u32]) -> Option<u32> {
        self.count += 1;
        self.last_hit_time = now;
        self.max_count = self.max_count.max(self.count);
        milestones.iter().copied().find(|&m| m == self.count)
    }

    /// Per-step inactivity check; returns true if the count dropped
    pub fn decay(&mut self, now: f32, timeout: f32, interval: f32) -> bool {
        if self.count == 0 || now - self.last_hit_time <= timeout {
            return false;
        }
        if now - self.last_decay_time < interval {
            return false;
        }
        self.count -= 1;
        self.last_decay_time = now;
        true
    }

    /// Scoring multiplier: 1 + count × step
    pub fn multiplier(&self, step: f32) -> f32 {
        1.0 + self.count as f32 * step
    }
}

/// Fraction of full maturity reached at `age`
#[inline]
pub fn maturity(age: f32, maturity_time: f32) -> f32 {
    (age / maturity_time).clamp(0.0, 1.0)
}

/// Bonus for keeping a ball alive; monotone in age, capped once mature
pub fn age_bonus(age: f32, maturity_time: f32, max_bonus: u32) -> u32 {
    (maturity(age, maturity_time) * max_bonus as f32).floor() as u32
}

/// Speed multiplier imparted by a moving paddle at contact
pub fn momentum_boost(paddle_velocity: f32, k: f32, max_boost: f32) -> f32 {
    1.0 + (paddle_velocity.abs() * k).min(max_boost - 1.0)
}

/// Inputs to a single hit's score
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HitFactors {
    pub age_bonus: u32,
    pub edge_hit: bool,
    pub momentum: f32,
    pub mid_switch: bool,
}

/// floor((base + age + edge + speed + transfer) × points × combo)
pub fn hit_points(
    factors: &HitFactors,
    tuning: &ScoringTuning,
    points_multiplier: f32,
    combo_multiplier: f32,
) -> u64 {
    let mut raw = tuning.base_points + factors.age_bonus;
    if factors.edge_hit {
        raw += tuning.edge_bonus;
    }
    if factors.momentum > tuning.speed_threshold {
        raw += tuning.speed_bonus;
    }
    if factors.mid_switch {
        raw += tuning.transfer_bonus;
    }
    (raw as f32 * points_multiplier * combo_multiplier).floor() as u64
}

/// floor(returnTime × rate × points × combo)
pub fn capture_bonus(
    return_time: f32,
    rate: f32,
    points_multiplier: f32,
    combo_multiplier: f32,
) -> u64 {
    (return_time.max(0.0) * rate * points_multiplier * combo_multiplier).floor() as u64
}

/// Near-miss award scaled by proximity (1 = grazing the arc tip)
pub fn near_miss_bonus(proximity: f32, max_bonus: u32, points_multiplier: f32) -> u64 {
    (proximity.clamp(0.0, 1.0) * max_bonus as f32 * points_multiplier).floor() as u64
}
