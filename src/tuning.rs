//! Data-driven game balance
//!
//! Every numeric constant the simulation uses lives here so matches can be
//! rebalanced from a JSON file. Each section is `#[serde(default)]`, so a
//! partial file only overrides the values it names.

use std::path::Path;

use glam::Vec2;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::settings::Difficulty;
use crate::sim::powerup::PowerUpKind;

/// Errors raised while loading or validating tuning data
#[derive(Debug, Error)]
pub enum TuningError {
    #[error("failed to read tuning file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse tuning JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid tuning value `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Arena geometry
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ArenaTuning {
    pub center: Vec2,
    pub outer_radius: f32,
    /// Inner ring radius as a fraction of the outer radius
    pub inner_ratio: f32,
}

impl Default for ArenaTuning {
    fn default() -> Self {
        Self {
            center: Vec2::ZERO,
            outer_radius: 300.0,
            inner_ratio: 0.7,
        }
    }
}

/// Paddle movement and shape
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PaddleTuning {
    pub thickness: f32,
    pub base_arc_width: f32,
    pub min_arc_width: f32,
    /// How quickly arc width chases its effect-driven target (1/s)
    pub arc_lerp_rate: f32,
    /// rad/s
    pub base_max_speed: f32,
    /// rad/s²
    pub acceleration: f32,
    /// rad/s² when no input is driving the paddle
    pub brake: f32,
    /// Desired angular velocity per radian of remaining distance
    pub steer_gain: f32,
    pub ring_switch_duration: f32,
    /// Minimum separation between same-ring paddles, in arc widths
    pub collision_buffer: f32,
}

impl Default for PaddleTuning {
    fn default() -> Self {
        Self {
            thickness: 14.0,
            base_arc_width: 0.55,
            min_arc_width: 0.2,
            arc_lerp_rate: 8.0,
            base_max_speed: 5.0,
            acceleration: 30.0,
            brake: 40.0,
            steer_gain: 8.0,
            ring_switch_duration: 0.3,
            collision_buffer: 1.05,
        }
    }
}

/// Regular ball behaviour
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BallTuning {
    pub base_radius: f32,
    pub base_speed: f32,
    pub spawn_duration: f32,
    pub maturity_time: f32,
    pub max_age_bonus: u32,
    pub hit_cooldown: f32,
    /// Boost gained per rad/s of paddle velocity at contact
    pub momentum_k: f32,
    pub max_boost: f32,
    /// Exponential decay rate of the speed multiplier back to 1 (1/s)
    pub boost_decay: f32,
    /// Exponential decay rate of spin (1/s)
    pub spin_decay: f32,
    /// Spin imparted by a mid-switch hit (rad/s applied to velocity direction)
    pub transfer_spin: f32,
    pub transfer_speed_multiplier: f32,
    /// Escaped balls are removed once this far beyond the arena edge
    pub offscreen_margin: f32,
    /// Edge factor above which a band hit counts as an edge hit
    pub edge_threshold: f32,
}

impl Default for BallTuning {
    fn default() -> Self {
        Self {
            base_radius: 8.0,
            base_speed: 140.0,
            spawn_duration: 0.4,
            maturity_time: 8.0,
            max_age_bonus: 20,
            hit_cooldown: 0.15,
            momentum_k: 0.08,
            max_boost: 1.8,
            boost_decay: 1.5,
            spin_decay: 2.0,
            transfer_spin: 1.6,
            transfer_speed_multiplier: 1.25,
            offscreen_margin: 60.0,
            edge_threshold: 0.7,
        }
    }
}

/// Capture objective lifecycle
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SpecialTuning {
    pub spawn_interval: f32,
    pub base_radius: f32,
    /// Launch speed as a fraction of the regular ball speed
    pub speed_factor: f32,
    pub active_duration: f32,
    /// Gravity pull begins inside this fraction of the outer radius
    pub gravity_range_ratio: f32,
    /// Acceleration toward the center while returning (px/s²)
    pub gravity_strength: f32,
    pub claim_radius_ratio: f32,
    pub claim_time: f32,
    pub capture_radius: f32,
    pub capture_speed: f32,
    /// Shrinking starts inside this fraction of the outer radius
    pub shrink_start_ratio: f32,
    /// Radius scale reached at full shrink
    pub min_shrink_scale: f32,
    pub hit_cooldown: f32,
}

impl Default for SpecialTuning {
    fn default() -> Self {
        Self {
            spawn_interval: 10.0,
            base_radius: 12.0,
            speed_factor: 0.6,
            active_duration: 12.0,
            gravity_range_ratio: 0.75,
            gravity_strength: 180.0,
            claim_radius_ratio: 0.3,
            claim_time: 1.5,
            capture_radius: 18.0,
            capture_speed: 220.0,
            shrink_start_ratio: 0.45,
            min_shrink_scale: 0.4,
            hit_cooldown: 0.2,
        }
    }
}

/// Points economy
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringTuning {
    pub base_points: u32,
    pub edge_bonus: u32,
    pub speed_bonus: u32,
    /// Momentum boost above which the speed bonus applies
    pub speed_threshold: f32,
    pub transfer_bonus: u32,
    pub combo_timeout: f32,
    pub combo_decay_interval: f32,
    pub combo_step: f32,
    pub combo_milestones: Vec<u32>,
    pub near_miss_max: u32,
    pub near_miss_angular_band: f32,
    pub near_miss_radial_band: f32,
    /// Capture points per second of return time
    pub capture_rate: f32,
}

impl Default for ScoringTuning {
    fn default() -> Self {
        Self {
            base_points: 10,
            edge_bonus: 15,
            speed_bonus: 10,
            speed_threshold: 1.3,
            transfer_bonus: 25,
            combo_timeout: 2.0,
            combo_decay_interval: 0.3,
            combo_step: 0.1,
            combo_milestones: vec![5, 10, 20, 35, 50],
            near_miss_max: 15,
            near_miss_angular_band: 0.15,
            near_miss_radial_band: 16.0,
            capture_rate: 20.0,
        }
    }
}

/// Opponent decision making
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AiTuning {
    /// Re-evaluation interval at reaction speed 1.0
    pub min_reevaluate: f32,
    /// Re-evaluation interval at reaction speed 0.0
    pub max_reevaluate: f32,
    pub reachability_weight: f32,
    pub noise_scale: f32,
    pub target_floor: f32,
    pub lead_time_max: f32,
    /// Max speed fraction kept by the slowest-reacting profile
    pub speed_floor_ratio: f32,
    /// Global multiplier on AI max speed (difficulty knob)
    pub speed_scale: f32,
    /// Probability per second of a spontaneous ring switch at risk tolerance 1.0
    pub ring_switch_chance: f32,
    pub ring_switch_cooldown: f32,
    pub lookahead: f32,
    /// Probability per second that the wander drift reverses
    pub wander_flip_chance: f32,
    pub priority_ball: f32,
    pub priority_powerup: f32,
    pub priority_powerup_negative: f32,
    pub priority_special: f32,
    pub priority_special_returning: f32,
}

impl Default for AiTuning {
    fn default() -> Self {
        Self {
            min_reevaluate: 0.08,
            max_reevaluate: 0.6,
            reachability_weight: 0.8,
            noise_scale: 0.15,
            target_floor: 0.35,
            lead_time_max: 0.8,
            speed_floor_ratio: 0.6,
            speed_scale: 1.0,
            ring_switch_chance: 0.08,
            ring_switch_cooldown: 2.0,
            lookahead: 0.15,
            wander_flip_chance: 0.2,
            priority_ball: 0.5,
            priority_powerup: 0.4,
            priority_powerup_negative: 0.15,
            priority_special: 0.7,
            priority_special_returning: 1.0,
        }
    }
}

/// One timed effect
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EffectTuning {
    /// Seconds
    pub duration: f32,
    /// Radians for arc effects, rad/s for paddle speed, a factor for multipliers
    pub magnitude: f32,
}

impl EffectTuning {
    const fn new(duration: f32, magnitude: f32) -> Self {
        Self { duration, magnitude }
    }
}

/// Pickup spawning and effect table
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PowerUpTuning {
    /// Chance a spawn tick produces a powerup instead of a ball
    pub chance: f32,
    pub max_live: usize,
    pub radius: f32,
    pub speed: f32,
    pub wide_paddle: EffectTuning,
    pub narrow_paddle: EffectTuning,
    pub paddle_speed: EffectTuning,
    pub slow_balls: EffectTuning,
    pub fast_balls: EffectTuning,
    pub double_points: EffectTuning,
}

impl Default for PowerUpTuning {
    fn default() -> Self {
        Self {
            chance: 0.15,
            max_live: 3,
            radius: 10.0,
            speed: 100.0,
            wide_paddle: EffectTuning::new(8.0, 0.2),
            narrow_paddle: EffectTuning::new(6.0, -0.15),
            paddle_speed: EffectTuning::new(8.0, 1.5),
            slow_balls: EffectTuning::new(6.0, 0.7),
            fast_balls: EffectTuning::new(5.0, 1.35),
            double_points: EffectTuning::new(10.0, 2.0),
        }
    }
}

impl PowerUpTuning {
    pub fn effect(&self, kind: PowerUpKind) -> EffectTuning {
        match kind {
            PowerUpKind::WidePaddle => self.wide_paddle,
            PowerUpKind::NarrowPaddle => self.narrow_paddle,
            PowerUpKind::PaddleSpeed => self.paddle_speed,
            PowerUpKind::SlowBalls => self.slow_balls,
            PowerUpKind::FastBalls => self.fast_balls,
            PowerUpKind::DoublePoints => self.double_points,
        }
    }
}

/// Regular spawn cadence and soft caps
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SpawnTuning {
    pub ball_interval: f32,
    pub max_balls: usize,
}

impl Default for SpawnTuning {
    fn default() -> Self {
        Self {
            ball_interval: 1.4,
            max_balls: 10,
        }
    }
}

/// Complete balance table
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    pub arena: ArenaTuning,
    pub paddle: PaddleTuning,
    pub ball: BallTuning,
    pub special: SpecialTuning,
    pub scoring: ScoringTuning,
    pub ai: AiTuning,
    pub powerup: PowerUpTuning,
    pub spawn: SpawnTuning,
}

impl Tuning {
    /// Parse and validate tuning from JSON text
    pub fn from_json(json: &str) -> Result<Self, TuningError> {
        let tuning: Tuning = serde_json::from_str(json)?;
        tuning.validate()?;
        Ok(tuning)
    }

    /// Load and validate tuning from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, TuningError> {
        let text = std::fs::read_to_string(path.as_ref())?;
        let tuning = Self::from_json(&text)?;
        log::info!("Loaded tuning from {}", path.as_ref().display());
        Ok(tuning)
    }

    /// Apply a difficulty preset on top of this table
    pub fn with_difficulty(mut self, difficulty: Difficulty) -> Self {
        self.ai.speed_scale *= difficulty.ai_speed_scale();
        self.ai.min_reevaluate *= difficulty.reaction_scale();
        self.ai.max_reevaluate *= difficulty.reaction_scale();
        self.spawn.ball_interval *= difficulty.spawn_interval_scale();
        self
    }

    /// Reject tables the simulation cannot run with
    pub fn validate(&self) -> Result<(), TuningError> {
        fn positive(field: &'static str, value: f32) -> Result<(), TuningError> {
            if value > 0.0 && value.is_finite() {
                Ok(())
            } else {
                Err(TuningError::Invalid {
                    field,
                    reason: format!("must be positive, got {value}"),
                })
            }
        }

        positive("arena.outer_radius", self.arena.outer_radius)?;
        if !(self.arena.inner_ratio > 0.0 && self.arena.inner_ratio < 1.0) {
            return Err(TuningError::Invalid {
                field: "arena.inner_ratio",
                reason: format!("must lie in (0, 1), got {}", self.arena.inner_ratio),
            });
        }
        positive("paddle.thickness", self.paddle.thickness)?;
        positive("paddle.min_arc_width", self.paddle.min_arc_width)?;
        if self.paddle.base_arc_width < self.paddle.min_arc_width {
            return Err(TuningError::Invalid {
                field: "paddle.base_arc_width",
                reason: "must not be below paddle.min_arc_width".into(),
            });
        }
        positive("paddle.base_max_speed", self.paddle.base_max_speed)?;
        positive("paddle.ring_switch_duration", self.paddle.ring_switch_duration)?;
        positive("ball.spawn_duration", self.ball.spawn_duration)?;
        positive("ball.maturity_time", self.ball.maturity_time)?;
        if self.ball.max_boost < 1.0 {
            return Err(TuningError::Invalid {
                field: "ball.max_boost",
                reason: "must be at least 1.0".into(),
            });
        }
        positive("special.claim_time", self.special.claim_time)?;
        positive("special.spawn_interval", self.special.spawn_interval)?;
        let claim_radius = self.arena.outer_radius * self.special.claim_radius_ratio;
        if self.special.capture_radius >= claim_radius {
            return Err(TuningError::Invalid {
                field: "special.capture_radius",
                reason: format!("must be smaller than the claim zone radius {claim_radius}"),
            });
        }
        positive("scoring.combo_timeout", self.scoring.combo_timeout)?;
        if self.scoring.combo_milestones.windows(2).any(|w| w[0] >= w[1]) {
            return Err(TuningError::Invalid {
                field: "scoring.combo_milestones",
                reason: "must be strictly ascending".into(),
            });
        }
        if self.ai.min_reevaluate > self.ai.max_reevaluate {
            return Err(TuningError::Invalid {
                field: "ai.min_reevaluate",
                reason: "must not exceed ai.max_reevaluate".into(),
            });
        }
        positive("spawn.ball_interval", self.spawn.ball_interval)?;
        let p = &self.powerup;
        positive("powerup.wide_paddle.duration", p.wide_paddle.duration)?;
        positive("powerup.narrow_paddle.duration", p.narrow_paddle.duration)?;
        positive("powerup.paddle_speed.duration", p.paddle_speed.duration)?;
        positive("powerup.slow_balls.duration", p.slow_balls.duration)?;
        positive("powerup.fast_balls.duration", p.fast_balls.duration)?;
        positive("powerup.double_points.duration", p.double_points.duration)?;
        positive("powerup.slow_balls.magnitude", self.powerup.slow_balls.magnitude)?;
        positive("powerup.fast_balls.magnitude", self.powerup.fast_balls.magnitude)?;
        positive("powerup.double_points.magnitude", self.powerup.double_points.magnitude)?;
        Ok(())
    }
}
