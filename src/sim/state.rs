//! Game state and core simulation types
//!
//! `GameState` is the single simulation object a harness owns. Nothing in
//! the simulation lives in process-wide globals.

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::ai::{AiController, AiProfile};
use super::arc::ArcSegment;
use super::arena::{Arena, Ring, RingTransition};
use super::events::GameEvent;
use super::powerup::{ActiveEffects, PowerUp};
use super::scoring::ComboState;
use super::snapshot::Snapshot;
use super::special::SpecialBall;
use super::tick::Intent;
use crate::settings::MatchSettings;
use crate::tuning::{BallTuning, PaddleTuning, Tuning};
use crate::{angle_delta, ease_out_cubic, normalize_angle};

pub type EntityId = u32;

/// Human player slot (0 in solo)
pub type Seat = u8;

/// Lifecycle of a round
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoundState {
    Running,
    Paused,
    /// Terminal: the capture objective escaped
    Stopped,
}

/// Who drives a paddle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaddleOwner {
    Player { seat: Seat },
    /// Index into the AI roster
    Ai { profile: usize },
}

/// Persisted player steering intent
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PaddleControl {
    /// Steer toward this angle
    pub target_angle: Option<f32>,
    /// -1, 0 or 1; overrides `target_angle` while non-zero
    pub direction: i8,
}

/// A paddle arc riding one of the two rings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Paddle {
    pub id: EntityId,
    pub owner: PaddleOwner,
    /// Current angle (radians, center of paddle arc)
    pub angle: f32,
    pub angular_velocity: f32,
    /// Angular width of paddle (radians), animates toward its target
    pub arc_width: f32,
    pub ring: Ring,
    pub transition: Option<RingTransition>,
    pub control: PaddleControl,
}

impl Paddle {
    pub fn new(id: EntityId, owner: PaddleOwner, angle: f32, arc_width: f32) -> Self {
        Self {
            id,
            owner,
            angle: normalize_angle(angle),
            angular_velocity: 0.0,
            arc_width,
            ring: Ring::Outer,
            transition: None,
            control: PaddleControl::default(),
        }
    }

    pub fn is_player(&self) -> bool {
        matches!(self.owner, PaddleOwner::Player { .. })
    }

    pub fn seat(&self) -> Option<Seat> {
        match self.owner {
            PaddleOwner::Player { seat } => Some(seat),
            PaddleOwner::Ai { .. } => None,
        }
    }

    /// Ring this paddle occupies for overlap purposes (destination while switching)
    pub fn effective_ring(&self) -> Ring {
        self.transition.map_or(self.ring, |t| t.to)
    }

    pub fn is_transitioning(&self) -> bool {
        self.transition.is_some()
    }

    /// Current centerline radius, interpolated mid-switch
    pub fn radius(&self, arena: &Arena) -> f32 {
        match &self.transition {
            Some(t) => arena.transition_radius(t),
            None => arena.ring_radius(self.ring),
        }
    }

    /// Get the paddle as an ArcSegment for collision detection
    pub fn as_arc(&self, arena: &Arena, thickness: f32) -> ArcSegment {
        ArcSegment::new(self.radius(arena), thickness, self.angle, self.arc_width)
    }

    /// Begin moving to the other ring
    pub fn start_ring_switch(&mut self) {
        self.transition = Some(RingTransition::new(self.ring));
    }

    /// Advance an in-flight ring switch
    pub fn advance_transition(&mut self, dt: f32, duration: f32) {
        if let Some(t) = &mut self.transition {
            if t.advance(dt, duration) {
                self.ring = t.to;
                self.transition = None;
            }
        }
    }

    /// Ease arc width toward `target`; never drops below `floor`
    pub fn animate_arc_width(&mut self, target: f32, dt: f32, rate: f32, floor: f32) {
        let blend = (rate * dt).min(1.0);
        self.arc_width = (self.arc_width + (target - self.arc_width) * blend).max(floor);
    }

    /// Angular velocity the player's control asks for
    pub fn desired_velocity(&self, tuning: &PaddleTuning, max_speed: f32) -> f32 {
        if self.control.direction != 0 {
            return self.control.direction.signum() as f32 * max_speed;
        }
        match self.control.target_angle {
            Some(target) => {
                (angle_delta(self.angle, target) * tuning.steer_gain).clamp(-max_speed, max_speed)
            }
            None => 0.0,
        }
    }

    /// Accelerate toward `desired` and integrate the angle.
    ///
    /// Braking (desired == 0) uses the stronger brake rate. The resulting
    /// speed never exceeds `max_speed`.
    pub fn drive(&mut self, desired: f32, dt: f32, tuning: &PaddleTuning, max_speed: f32) {
        let rate = if desired == 0.0 {
            tuning.brake
        } else {
            tuning.acceleration
        };
        let max_change = rate * dt;
        self.angular_velocity += (desired - self.angular_velocity).clamp(-max_change, max_change);
        self.clamp_speed(max_speed);
        self.angle = normalize_angle(self.angle + self.angular_velocity * dt);
    }

    pub fn clamp_speed(&mut self, max_speed: f32) {
        self.angular_velocity = self.angular_velocity.clamp(-max_speed, max_speed);
    }
}

/// A transient scoring ball
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ball {
    pub id: EntityId,
    pub pos: Vec2,
    /// Base velocity; effective velocity adds the momentum multiplier and effects
    pub vel: Vec2,
    pub base_radius: f32,
    /// 0 → 1 growth after spawning
    pub spawn_progress: f32,
    /// Seconds alive
    pub age: f32,
    /// ≥ 1, decays back to 1
    pub speed_multiplier: f32,
    /// Angular rate applied to the velocity direction, decays
    pub spin: f32,
    pub hit_cooldown: f32,
    pub escaped: bool,
    pub last_hit_by: Option<EntityId>,
    pub near_miss_awarded: bool,
}

impl Ball {
    pub fn new(id: EntityId, pos: Vec2, vel: Vec2, base_radius: f32) -> Self {
        Self {
            id,
            pos,
            vel,
            base_radius,
            spawn_progress: 0.0,
            age: 0.0,
            speed_multiplier: 1.0,
            spin: 0.0,
            hit_cooldown: 0.0,
            escaped: false,
            last_hit_by: None,
            near_miss_awarded: false,
        }
    }

    /// Displayed (and collision) radius, eased in while spawning
    pub fn radius(&self) -> f32 {
        self.base_radius * ease_out_cubic(self.spawn_progress)
    }

    pub fn effective_velocity(&self, effect_multiplier: f32) -> Vec2 {
        self.vel * self.speed_multiplier * effect_multiplier
    }

    /// Age, grow, curve, decay and move the ball by one step
    pub fn integrate(&mut self, dt: f32, tuning: &BallTuning, effect_multiplier: f32) {
        self.age += dt;
        self.spawn_progress = (self.spawn_progress + dt / tuning.spawn_duration).min(1.0);
        if self.spawn_progress >= 1.0 - crate::consts::SPAWN_SNAP_EPSILON {
            self.spawn_progress = 1.0;
        }
        self.hit_cooldown = (self.hit_cooldown - dt).max(0.0);

        if self.spin != 0.0 {
            self.vel = Vec2::from_angle(self.spin * dt).rotate(self.vel);
            self.spin *= (-tuning.spin_decay * dt).exp();
            if self.spin.abs() < 1e-3 {
                self.spin = 0.0;
            }
        }
        if self.speed_multiplier > 1.0 {
            self.speed_multiplier = 1.0 + (self.speed_multiplier - 1.0) * (-tuning.boost_decay * dt).exp();
        }

        self.pos += self.effective_velocity(effect_multiplier) * dt;
    }
}

/// Final and running statistics for a round
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RoundStats {
    pub score: u64,
    pub duration: f32,
    pub hits: u32,
    pub edge_hits: u32,
    pub max_combo: u32,
    pub captures: u32,
    pub near_misses: u32,
    pub balls_escaped: u32,
    pub powerups_collected: u32,
}

/// Complete simulation state
#[derive(Debug, Clone)]
pub struct GameState {
    pub tuning: Tuning,
    pub arena: Arena,
    pub rng: Pcg32,
    /// Simulation clock in seconds
    pub time: f32,
    pub round: RoundState,
    pub score: u64,
    pub combo: ComboState,
    /// Human paddles in seat order, then AI paddles in roster order
    pub paddles: Vec<Paddle>,
    /// One controller per AI paddle, roster order
    pub ai: Vec<AiController>,
    /// Sorted by id
    pub balls: Vec<Ball>,
    pub special: Option<SpecialBall>,
    /// Sorted by id
    pub powerups: Vec<PowerUp>,
    pub effects: ActiveEffects,
    pub stats: RoundStats,
    /// Seconds until the next ball/powerup spawn tick
    pub spawn_timer: f32,
    /// Seconds until the capture objective spawns (while none exists)
    pub special_spawn_timer: f32,
    next_id: EntityId,
}

impl GameState {
    /// Create a new match from settings and a balance table
    pub fn new(settings: &MatchSettings, tuning: Tuning) -> Self {
        let tuning = tuning.with_difficulty(settings.difficulty);
        let arena = Arena::from_tuning(&tuning.arena);

        let profiles: Vec<AiProfile> = settings
            .ai_roster
            .iter()
            .filter_map(|name| {
                let profile = AiProfile::preset(name);
                if profile.is_none() {
                    log::warn!("Unknown AI profile '{}' skipped", name);
                }
                profile
            })
            .collect();

        let seats = settings.seats.max(1);
        let total = seats as usize + profiles.len();
        let spacing = std::f32::consts::TAU / total as f32;
        let start = -std::f32::consts::FRAC_PI_2; // First player at bottom

        let mut state = Self {
            spawn_timer: tuning.spawn.ball_interval,
            special_spawn_timer: tuning.special.spawn_interval,
            tuning,
            arena,
            rng: Pcg32::seed_from_u64(settings.seed),
            time: 0.0,
            round: RoundState::Running,
            score: 0,
            combo: ComboState::default(),
            paddles: Vec::with_capacity(total),
            ai: Vec::with_capacity(profiles.len()),
            balls: Vec::new(),
            special: None,
            powerups: Vec::new(),
            effects: ActiveEffects::default(),
            stats: RoundStats::default(),
            next_id: 1,
        };

        let width = state.tuning.paddle.base_arc_width;
        for seat in 0..seats {
            let id = state.next_entity_id();
            let angle = start + seat as f32 * spacing;
            state
                .paddles
                .push(Paddle::new(id, PaddleOwner::Player { seat }, angle, width));
        }
        for (index, profile) in profiles.into_iter().enumerate() {
            let id = state.next_entity_id();
            let angle = start + (seats as usize + index) as f32 * spacing;
            state
                .paddles
                .push(Paddle::new(id, PaddleOwner::Ai { profile: index }, angle, width));
            state.ai.push(AiController::new(id, profile, angle));
        }

        log::info!(
            "Round started: seed={} seats={} ai={} arena={}",
            settings.seed,
            seats,
            state.ai.len(),
            state.arena.outer_radius
        );
        state
    }

    /// Allocate a new entity ID
    pub fn next_entity_id(&mut self) -> EntityId {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    pub fn is_running(&self) -> bool {
        self.round == RoundState::Running
    }

    pub fn is_over(&self) -> bool {
        self.round == RoundState::Stopped
    }

    /// Pause or resume; a stopped round stays stopped
    pub fn set_paused(&mut self, paused: bool) {
        self.round = match (self.round, paused) {
            (RoundState::Stopped, _) => RoundState::Stopped,
            (_, true) => RoundState::Paused,
            (_, false) => RoundState::Running,
        };
    }

    pub fn paddle_for_seat(&self, seat: Seat) -> Option<usize> {
        self.paddles.iter().position(|p| p.seat() == Some(seat))
    }

    pub fn paddle_index(&self, id: EntityId) -> Option<usize> {
        self.paddles.iter().position(|p| p.id == id)
    }

    /// Max angular speed for a paddle, including effect bonuses for players
    pub fn max_speed(&self, paddle: &Paddle) -> f32 {
        let base = self.tuning.paddle.base_max_speed;
        match paddle.owner {
            PaddleOwner::Player { .. } => base + self.effects.paddle_speed_bonus(),
            PaddleOwner::Ai { profile } => self
                .ai
                .get(profile)
                .map_or(base, |c| c.profile.max_speed(base, &self.tuning.ai)),
        }
    }

    /// Current combo multiplier
    pub fn combo_multiplier(&self) -> f32 {
        self.combo.multiplier(self.tuning.scoring.combo_step)
    }

    /// Advance one step; see [`tick::step`](super::tick::step)
    pub fn step(&mut self, intents: &[Intent], dt: f32) -> Vec<GameEvent> {
        super::tick::step(self, intents, dt)
    }

    /// Read-only view for rendering and network collaborators
    pub fn snapshot(&self) -> Snapshot {
        Snapshot::capture(self)
    }

    /// Ensure entities are sorted by ID for deterministic iteration
    pub fn normalize_order(&mut self) {
        self.balls.sort_by_key(|b| b.id);
        self.powerups.sort_by_key(|p| p.id);
    }
}
