//! AI opponents
//!
//! Each AI paddle owns an `AiController` holding an immutable `AiProfile`.
//! Target choice is a single weighted score over every live candidate; the
//! profile's numbers shape the outcome. The only qualitative branch is the
//! inner-ring-preferring strategy for ring switching.

use glam::Vec2;
use rand::Rng;

use super::arena::{Arena, Ring};
use super::collision::find_blocking_paddle;
use super::special::SpecialState;
use super::state::{EntityId, GameState, Paddle};
use crate::angle_delta;
use crate::tuning::{AiTuning, Tuning};

/// Opponents seated when the settings do not name any
pub const DEFAULT_ROSTER: [&str; 3] = ["hunter", "guardian", "drifter"];

/// Personality traits, fixed for the match
#[derive(Debug, Clone, PartialEq)]
pub struct AiProfile {
    pub name: String,
    /// 0..1, higher re-targets sooner, moves faster and with less noise
    pub reaction_speed: f32,
    /// 0..1, weighs urgency and target type over zone comfort
    pub aggression: f32,
    /// 0..1, scales the chance of spontaneous ring switches
    pub risk_tolerance: f32,
    /// Preferred distance from center as a fraction of the arena radius
    pub preferred_zone: f32,
    /// Idle drift rate (rad/s)
    pub wander_speed: f32,
    pub inner_ring_preference: bool,
}

impl AiProfile {
    /// Look up a built-in personality by name
    pub fn preset(name: &str) -> Option<Self> {
        let (reaction_speed, aggression, risk_tolerance, preferred_zone, wander_speed, inner) =
            match name.to_lowercase().as_str() {
                "hunter" => (0.85, 0.9, 0.7, 0.8, 0.6, false),
                "guardian" => (0.6, 0.35, 0.2, 0.95, 0.3, false),
                "drifter" => (0.35, 0.5, 0.5, 0.6, 1.0, false),
                "diver" => (0.7, 0.6, 0.8, 0.4, 0.5, true),
                "sentinel" => (0.5, 0.2, 0.1, 0.9, 0.2, false),
                _ => return None,
            };
        Some(Self {
            name: name.to_lowercase(),
            reaction_speed,
            aggression,
            risk_tolerance,
            preferred_zone,
            wander_speed,
            inner_ring_preference: inner,
        })
    }

    /// Seconds between target re-evaluations
    pub fn reevaluate_interval(&self, tuning: &AiTuning) -> f32 {
        let reaction = self.reaction_speed.clamp(0.0, 1.0);
        tuning.max_reevaluate - (tuning.max_reevaluate - tuning.min_reevaluate) * reaction
    }

    /// Personality-scaled max angular speed
    pub fn max_speed(&self, base: f32, tuning: &AiTuning) -> f32 {
        let reaction = self.reaction_speed.clamp(0.0, 1.0);
        base * (tuning.speed_floor_ratio + (1.0 - tuning.speed_floor_ratio) * reaction) * tuning.speed_scale
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetKind {
    Ball,
    PowerUp { negative: bool },
    Special { returning: bool },
}

/// Something an AI paddle might chase
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candidate {
    pub id: EntityId,
    pub kind: TargetKind,
    pub pos: Vec2,
    /// Effective velocity
    pub vel: Vec2,
}

/// Collect every live chase target in deterministic order
pub fn gather_candidates(state: &GameState) -> Vec<Candidate> {
    let ball_mult = state.effects.ball_speed_multiplier();
    let mut candidates: Vec<Candidate> = state
        .balls
        .iter()
        .filter(|b| !b.escaped)
        .map(|b| Candidate {
            id: b.id,
            kind: TargetKind::Ball,
            pos: b.pos,
            vel: b.effective_velocity(ball_mult),
        })
        .collect();

    candidates.extend(state.powerups.iter().filter(|p| !p.escaped).map(|p| Candidate {
        id: p.id,
        kind: TargetKind::PowerUp {
            negative: p.kind.is_negative(),
        },
        pos: p.pos,
        vel: p.vel,
    }));

    if let Some(special) = state
        .special
        .as_ref()
        .filter(|s| s.state != SpecialState::ForceCapture)
    {
        candidates.push(Candidate {
            id: special.id(),
            kind: TargetKind::Special {
                returning: special.is_returning(),
            },
            pos: special.ball.pos,
            vel: special.ball.effective_velocity(1.0),
        });
    }
    candidates
}

/// Weighted desirability of chasing `candidate` from `paddle_angle`
pub fn score_candidate(
    profile: &AiProfile,
    tuning: &AiTuning,
    arena: &Arena,
    paddle_angle: f32,
    candidate: &Candidate,
    noise: f32,
) -> f32 {
    let (dist, theta) = arena.to_polar(candidate.pos);
    let radial = (dist / arena.outer_radius).clamp(0.0, 1.0);

    let urgency = radial;
    let reachability = 1.0 - angle_delta(paddle_angle, theta).abs() / std::f32::consts::PI;
    let zone = 1.0 - (radial - profile.preferred_zone).abs();
    let priority = match candidate.kind {
        TargetKind::Ball => tuning.priority_ball,
        TargetKind::PowerUp { negative: false } => tuning.priority_powerup,
        TargetKind::PowerUp { negative: true } => tuning.priority_powerup_negative,
        TargetKind::Special { returning: false } => tuning.priority_special,
        TargetKind::Special { returning: true } => tuning.priority_special_returning,
    };

    urgency * profile.aggression
        + reachability * tuning.reachability_weight
        + zone * (1.0 - profile.aggression)
        + priority * profile.aggression
        + noise
}

/// Highest-scoring candidate above the floor; ties keep the earlier one
pub fn select_target<R: Rng>(
    profile: &AiProfile,
    tuning: &AiTuning,
    arena: &Arena,
    paddle_angle: f32,
    candidates: &[Candidate],
    rng: &mut R,
) -> Option<Candidate> {
    let noise_amp = tuning.noise_scale * (1.0 - profile.reaction_speed.clamp(0.0, 1.0));
    let mut best: Option<(Candidate, f32)> = None;
    for candidate in candidates {
        let noise = rng.random_range(-1.0f32..=1.0) * noise_amp;
        let score = score_candidate(profile, tuning, arena, paddle_angle, candidate, noise);
        if best.is_none_or(|(_, s)| score > s) {
            best = Some((*candidate, score));
        }
    }
    best.filter(|(_, score)| *score >= tuning.target_floor)
        .map(|(candidate, _)| candidate)
}

/// Angle at which `candidate` will cross `ring_radius`, looking at most `max_lead` seconds ahead
pub fn lead_angle(arena: &Arena, candidate: &Candidate, ring_radius: f32, max_lead: f32) -> f32 {
    let p = candidate.pos - arena.center;
    let v = candidate.vel;
    let a = v.length_squared();
    let t = if a > 1e-6 {
        let b = 2.0 * p.dot(v);
        let c = p.length_squared() - ring_radius * ring_radius;
        let disc = b * b - 4.0 * a * c;
        if disc >= 0.0 {
            let sqrt = disc.sqrt();
            let near = (-b - sqrt) / (2.0 * a);
            let far = (-b + sqrt) / (2.0 * a);
            let crossing = if near > 0.0 { near } else { far };
            crossing.clamp(0.0, max_lead)
        } else {
            0.0
        }
    } else {
        0.0
    };
    let aim = p + v * t;
    aim.y.atan2(aim.x)
}

/// What an AI wants its paddle to do this step
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AiCommand {
    pub desired_velocity: f32,
    pub request_ring_switch: bool,
}

/// Read-only world view handed to `AiController::think`
pub struct AiContext<'a> {
    pub arena: &'a Arena,
    pub tuning: &'a Tuning,
    pub paddles: &'a [Paddle],
    pub candidates: &'a [Candidate],
}

/// Current pursuit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AiTarget {
    pub id: EntityId,
    pub kind: TargetKind,
}

/// Per-opponent decision state
#[derive(Debug, Clone)]
pub struct AiController {
    pub paddle_id: EntityId,
    pub profile: AiProfile,
    pub target: Option<AiTarget>,
    /// Seconds until the next re-evaluation
    pub reevaluate_in: f32,
    pub wander_angle: f32,
    /// +1 or -1
    pub wander_dir: f32,
    pub ring_switch_cooldown: f32,
}

impl AiController {
    pub fn new(paddle_id: EntityId, profile: AiProfile, angle: f32) -> Self {
        Self {
            paddle_id,
            profile,
            target: None,
            reevaluate_in: 0.0,
            wander_angle: angle,
            wander_dir: 1.0,
            ring_switch_cooldown: 0.0,
        }
    }

    /// Decide this step's movement and ring switch
    pub fn think<R: Rng>(&mut self, ctx: &AiContext<'_>, rng: &mut R, dt: f32) -> AiCommand {
        let Some(paddle) = ctx.paddles.iter().find(|p| p.id == self.paddle_id) else {
            return AiCommand::default();
        };
        let ai = &ctx.tuning.ai;

        self.reevaluate_in -= dt;
        self.ring_switch_cooldown = (self.ring_switch_cooldown - dt).max(0.0);

        let mut current = self
            .target
            .and_then(|t| ctx.candidates.iter().find(|c| c.id == t.id).copied());
        if current.is_none() {
            // Lost targets are dropped; a new one waits for the timer
            self.target = None;
        }
        if self.reevaluate_in <= 0.0 {
            current = select_target(&self.profile, ai, ctx.arena, paddle.angle, ctx.candidates, rng);
            self.target = current.map(|c| AiTarget { id: c.id, kind: c.kind });
            self.reevaluate_in = self.profile.reevaluate_interval(ai);
        }

        let aim = match &current {
            Some(candidate) => lead_angle(ctx.arena, candidate, paddle.radius(ctx.arena), ai.lead_time_max),
            None => self.wander(rng, dt, ai.wander_flip_chance),
        };

        let max_speed = self.profile.max_speed(ctx.tuning.paddle.base_max_speed, ai);
        let desired = (angle_delta(paddle.angle, aim) * ctx.tuning.paddle.steer_gain).clamp(-max_speed, max_speed);
        let desired = self.avoid_collision(ctx, paddle, desired);

        AiCommand {
            desired_velocity: desired,
            request_ring_switch: self.wants_ring_switch(ctx, paddle, current.as_ref(), rng, dt),
        }
    }

    fn wander<R: Rng>(&mut self, rng: &mut R, dt: f32, flip_chance: f32) -> f32 {
        if rng.random_bool(f64::from((flip_chance * dt).clamp(0.0, 1.0))) {
            self.wander_dir = -self.wander_dir;
        }
        self.wander_angle = crate::normalize_angle(self.wander_angle + self.wander_dir * self.profile.wander_speed * dt);
        self.wander_angle
    }

    /// Reject a direction whose predicted arc runs into an occupied one
    fn avoid_collision(&self, ctx: &AiContext<'_>, paddle: &Paddle, desired: f32) -> f32 {
        if desired == 0.0 {
            return desired;
        }
        let blocked = |velocity: f32| {
            let predicted = paddle.angle + velocity * ctx.tuning.ai.lookahead;
            find_blocking_paddle(
                ctx.paddles,
                paddle.id,
                paddle.effective_ring(),
                predicted,
                paddle.arc_width,
                ctx.tuning.paddle.collision_buffer,
            )
            .is_some_and(|index| {
                let other = ctx.paddles[index].angle;
                angle_delta(predicted, other).abs() < angle_delta(paddle.angle, other).abs()
            })
        };

        if !blocked(desired) {
            desired
        } else if !blocked(-desired) {
            -desired
        } else {
            0.0
        }
    }

    fn wants_ring_switch<R: Rng>(
        &mut self,
        ctx: &AiContext<'_>,
        paddle: &Paddle,
        target: Option<&Candidate>,
        rng: &mut R,
        dt: f32,
    ) -> bool {
        if paddle.is_transitioning() || self.ring_switch_cooldown > 0.0 {
            return false;
        }

        let wants = if self.profile.inner_ring_preference {
            let boundary = (ctx.arena.inner_radius + ctx.arena.outer_radius) / 2.0;
            let preferred = match target {
                Some(c) if ctx.arena.distance_from_center(c.pos) > boundary => Ring::Outer,
                _ => Ring::Inner,
            };
            preferred != paddle.ring
        } else {
            let chance = ctx.tuning.ai.ring_switch_chance * self.profile.risk_tolerance * dt;
            rng.random_bool(f64::from(chance.clamp(0.0, 1.0)))
        };

        if wants {
            self.ring_switch_cooldown = ctx.tuning.ai.ring_switch_cooldown;
        }
        wants
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::state::PaddleOwner;
    use crate::polar_to_cartesian;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn arena() -> Arena {
        Arena::new(Vec2::ZERO, 300.0, 0.7)
    }

    fn ball_at(id: EntityId, r: f32, theta: f32) -> Candidate {
        Candidate {
            id,
            kind: TargetKind::Ball,
            pos: polar_to_cartesian(r, theta),
            vel: Vec2::ZERO,
        }
    }

    fn focused(aggression: f32) -> AiProfile {
        AiProfile {
            name: "test".into(),
            reaction_speed: 1.0,
            aggression,
            risk_tolerance: 0.0,
            preferred_zone: 0.5,
            wander_speed: 0.5,
            inner_ring_preference: false,
        }
    }

    #[test]
    fn test_presets() {
        assert!(AiProfile::preset("Hunter").is_some());
        assert!(AiProfile::preset("diver").is_some_and(|p| p.inner_ring_preference));
        assert!(AiProfile::preset("nobody").is_none());
        for name in DEFAULT_ROSTER {
            assert!(AiProfile::preset(name).is_some());
        }
    }

    #[test]
    fn test_faster_reaction_reevaluates_sooner_and_moves_faster() {
        let tuning = AiTuning::default();
        let quick = AiProfile::preset("hunter").unwrap_or_else(|| focused(0.5));
        let slow = AiProfile::preset("drifter").unwrap_or_else(|| focused(0.5));
        assert!(quick.reevaluate_interval(&tuning) < slow.reevaluate_interval(&tuning));
        assert!(quick.max_speed(5.0, &tuning) > slow.max_speed(5.0, &tuning));
        assert!((focused(0.5).max_speed(5.0, &tuning) - 5.0).abs() < 1e-5);
    }

    #[test]
    fn test_aggressive_ai_prefers_reachable_ball() {
        let tuning = AiTuning::default();
        let mut rng = Pcg32::seed_from_u64(3);
        let candidates = [ball_at(1, 200.0, 2.0), ball_at(2, 200.0, 0.4)];
        let picked = select_target(&focused(0.9), &tuning, &arena(), 0.0, &candidates, &mut rng);
        assert_eq!(picked.map(|c| c.id), Some(2));
    }

    #[test]
    fn test_negative_powerup_weighted_lower() {
        let tuning = AiTuning::default();
        let profile = focused(0.8);
        let mut good = ball_at(1, 150.0, 0.3);
        good.kind = TargetKind::PowerUp { negative: false };
        let mut bad = good;
        bad.kind = TargetKind::PowerUp { negative: true };
        let a = arena();
        assert!(
            score_candidate(&profile, &tuning, &a, 0.0, &good, 0.0)
                > score_candidate(&profile, &tuning, &a, 0.0, &bad, 0.0)
        );
    }

    #[test]
    fn test_returning_special_outranks_ball() {
        let tuning = AiTuning::default();
        let mut rng = Pcg32::seed_from_u64(9);
        let mut special = ball_at(5, 150.0, 0.6);
        special.kind = TargetKind::Special { returning: true };
        let candidates = [ball_at(1, 150.0, 0.5), special];
        let picked = select_target(&focused(0.8), &tuning, &arena(), 0.0, &candidates, &mut rng);
        assert_eq!(picked.map(|c| c.id), Some(5));
    }

    #[test]
    fn test_no_candidates_means_no_target() {
        let mut rng = Pcg32::seed_from_u64(1);
        let picked = select_target(&focused(0.5), &AiTuning::default(), &arena(), 0.0, &[], &mut rng);
        assert!(picked.is_none());
    }

    #[test]
    fn test_lead_angle_predicts_crossing() {
        let a = arena();
        // Moving tangentially from (100, 0) at 100 px/s: crosses r=300 well beyond max lead
        let candidate = Candidate {
            id: 1,
            kind: TargetKind::Ball,
            pos: Vec2::new(100.0, 0.0),
            vel: Vec2::new(0.0, 100.0),
        };
        let aim = lead_angle(&a, &candidate, 300.0, 0.8);
        let expected = 80.0f32.atan2(100.0);
        assert!((aim - expected).abs() < 1e-4);

        // Radial motion keeps the same angle
        let radial = Candidate {
            vel: Vec2::new(100.0, 0.0),
            ..candidate
        };
        assert!(lead_angle(&a, &radial, 300.0, 0.8).abs() < 1e-5);
    }

    fn context_fixture() -> (Tuning, Vec<Paddle>) {
        let tuning = Tuning::default();
        let me = Paddle::new(1, PaddleOwner::Ai { profile: 0 }, 0.0, 0.55);
        let other = Paddle::new(2, PaddleOwner::Player { seat: 0 }, 0.62, 0.55);
        (tuning, vec![me, other])
    }

    #[test]
    fn test_avoidance_refuses_to_drive_into_neighbor() {
        let (tuning, paddles) = context_fixture();
        let a = arena();
        let ctx = AiContext {
            arena: &a,
            tuning: &tuning,
            paddles: &paddles,
            candidates: &[],
        };
        let controller = AiController::new(1, focused(0.5), 0.0);
        // Heading toward the neighbor is rejected in favor of backing off
        assert_eq!(controller.avoid_collision(&ctx, &paddles[0], 4.0), -4.0);
        // Moving away is fine
        assert_eq!(controller.avoid_collision(&ctx, &paddles[0], -4.0), -4.0);
    }

    #[test]
    fn test_boxed_in_paddle_stops() {
        let (tuning, mut paddles) = context_fixture();
        paddles.push(Paddle::new(3, PaddleOwner::Ai { profile: 1 }, -0.62, 0.55));
        let a = arena();
        let ctx = AiContext {
            arena: &a,
            tuning: &tuning,
            paddles: &paddles,
            candidates: &[],
        };
        let controller = AiController::new(1, focused(0.5), 0.0);
        assert_eq!(controller.avoid_collision(&ctx, &paddles[0], 4.0), 0.0);
    }

    #[test]
    fn test_inner_preferring_profile_dives_for_close_targets() {
        let tuning = Tuning::default();
        let paddles = vec![Paddle::new(1, PaddleOwner::Ai { profile: 0 }, 0.0, 0.55)];
        let candidates = [ball_at(7, 60.0, 0.1)];
        let a = arena();
        let ctx = AiContext {
            arena: &a,
            tuning: &tuning,
            paddles: &paddles,
            candidates: &candidates,
        };
        let mut profile = focused(0.6);
        profile.inner_ring_preference = true;
        let mut controller = AiController::new(1, profile, 0.0);
        let mut rng = Pcg32::seed_from_u64(11);

        let command = controller.think(&ctx, &mut rng, 1.0 / 60.0);
        assert!(command.request_ring_switch);
        assert_eq!(controller.target.map(|t| t.id), Some(7));
        // Cooldown suppresses an immediate repeat
        let again = controller.think(&ctx, &mut rng, 1.0 / 60.0);
        assert!(!again.request_ring_switch);
    }

    #[test]
    fn test_lost_target_not_replaced_before_interval() {
        let tuning = Tuning::default();
        let paddles = vec![Paddle::new(1, PaddleOwner::Ai { profile: 0 }, 0.0, 0.55)];
        let a = arena();
        let first = [ball_at(7, 200.0, 0.2)];
        let second = [ball_at(8, 200.0, 0.3)];
        let profile = focused(0.8);
        let interval = profile.reevaluate_interval(&tuning.ai);
        let mut controller = AiController::new(1, profile, 0.0);
        let mut rng = Pcg32::seed_from_u64(4);
        let dt = 1.0 / 60.0;

        let ctx = AiContext {
            arena: &a,
            tuning: &tuning,
            paddles: &paddles,
            candidates: &first,
        };
        controller.think(&ctx, &mut rng, dt);
        assert_eq!(controller.target.map(|t| t.id), Some(7));

        // Ball 7 is gone; ball 8 must wait for the next re-evaluation
        let ctx = AiContext {
            candidates: &second,
            ..ctx
        };
        let mut elapsed = 0.0;
        let mut picked_at = None;
        for _ in 0..600 {
            controller.think(&ctx, &mut rng, dt);
            elapsed += dt;
            if controller.target.is_some() {
                picked_at = Some(elapsed);
                break;
            }
        }
        let picked_at = picked_at.unwrap_or(f32::MAX);
        assert!(picked_at >= interval - dt, "picked after {picked_at}s, interval {interval}s");
        assert_eq!(controller.target.map(|t| t.id), Some(8));
    }

    #[test]
    fn test_wanders_without_targets() {
        let tuning = Tuning::default();
        let paddles = vec![Paddle::new(1, PaddleOwner::Ai { profile: 0 }, 0.0, 0.55)];
        let a = arena();
        let ctx = AiContext {
            arena: &a,
            tuning: &tuning,
            paddles: &paddles,
            candidates: &[],
        };
        let mut controller = AiController::new(1, focused(0.5), 0.0);
        let mut rng = Pcg32::seed_from_u64(2);
        let mut moved = false;
        for _ in 0..30 {
            let command = controller.think(&ctx, &mut rng, 1.0 / 60.0);
            moved |= command.desired_velocity != 0.0;
        }
        assert!(controller.target.is_none());
        assert!(moved);
    }
}
