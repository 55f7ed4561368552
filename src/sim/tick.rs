//! Simulation step
//!
//! One call advances every entity, collision, state machine and the score
//! economy by a bounded delta. The same function serves the per-frame solo
//! loop and the fixed-tick networked authority.

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::ai::{AiCommand, AiContext, gather_candidates};
use super::arc::ArcSegment;
use super::collision::{CollisionResult, find_blocking_paddle, first_hit, resolve_paddle_collisions, separate_from_arc};
use super::events::GameEvent;
use super::powerup::{PowerUp, PowerUpKind};
use super::scoring::{HitFactors, age_bonus, capture_bonus, hit_points, momentum_boost, near_miss_bonus};
use super::special::{SpecialBall, SpecialOutcome};
use super::state::{Ball, EntityId, GameState, RoundState, Seat};
use crate::consts::*;
use crate::normalize_angle;

/// Abstract player input, already translated from devices
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum IntentKind {
    /// Steer toward an absolute angle
    SetTargetAngle { angle: f32 },
    /// Hold a direction: -1, 0 or 1
    SetDirectionalImpulse { dir: i8 },
    RequestRingSwitch,
}

/// An intent addressed to a seat's paddle
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Intent {
    pub seat: Seat,
    pub kind: IntentKind,
}

impl Intent {
    pub fn target_angle(seat: Seat, angle: f32) -> Self {
        Self {
            seat,
            kind: IntentKind::SetTargetAngle { angle },
        }
    }

    pub fn directional(seat: Seat, dir: i8) -> Self {
        Self {
            seat,
            kind: IntentKind::SetDirectionalImpulse { dir },
        }
    }

    pub fn ring_switch(seat: Seat) -> Self {
        Self {
            seat,
            kind: IntentKind::RequestRingSwitch,
        }
    }
}

/// Advance the game state by `dt` seconds (clamped), returning feedback events
pub fn step(state: &mut GameState, intents: &[Intent], dt: f32) -> Vec<GameEvent> {
    let mut events = Vec::new();
    if state.round != RoundState::Running {
        return events;
    }
    if dt > MAX_STEP_DT {
        log::debug!("Step delta {:.3}s clamped to {:.3}s", dt, MAX_STEP_DT);
    }
    let dt = dt.clamp(0.0, MAX_STEP_DT);
    if dt <= 0.0 {
        return events;
    }
    state.time += dt;

    // Intents
    for intent in intents {
        apply_intent(state, intent, &mut events);
    }

    // Effects
    for kind in state.effects.prune(state.time) {
        events.push(GameEvent::EffectExpired { kind });
    }

    // AI decisions
    let commands = think_ai(state, dt);
    for (paddle_id, command) in &commands {
        if command.request_ring_switch {
            if let Some(index) = state.paddle_index(*paddle_id) {
                try_ring_switch(state, index, &mut events);
            }
        }
    }

    move_paddles(state, &commands, dt);

    // Paddle vs paddle
    let contacts = resolve_paddle_collisions(&mut state.paddles, state.tuning.paddle.collision_buffer);
    for index in 0..state.paddles.len() {
        let max = state.max_speed(&state.paddles[index]);
        state.paddles[index].clamp_speed(max);
    }
    for contact in contacts {
        let intensity = (contact.impact / state.tuning.paddle.base_max_speed).clamp(0.0, 1.0);
        events.push(GameEvent::PaddleCollision {
            a: contact.a,
            b: contact.b,
            intensity,
        });
    }

    spawn_entities(state, &mut events, dt);

    // Integrate
    let ball_mult = state.effects.ball_speed_multiplier();
    for ball in &mut state.balls {
        ball.integrate(dt, &state.tuning.ball, ball_mult);
    }
    for powerup in &mut state.powerups {
        powerup.integrate(dt, state.tuning.ball.spawn_duration);
    }
    if let Some(special) = &mut state.special {
        if let Some(changed) = special.advance(dt, &state.arena, &state.tuning.special, &state.tuning.ball) {
            events.push(GameEvent::SpecialStateChanged { state: changed });
        }
    }

    // Players first, then AIs in roster order
    let arcs: Vec<ArcSegment> = state
        .paddles
        .iter()
        .map(|p| p.as_arc(&state.arena, state.tuning.paddle.thickness))
        .collect();

    collide_balls(state, &arcs, &mut events);
    detect_near_misses(state, &arcs, &mut events);
    collect_powerups(state, &arcs, &mut events);
    collide_special(state, &arcs, &mut events);
    handle_escapes(state, &mut events);

    if resolve_special_outcome(state, &mut events) {
        return events;
    }

    let scoring = &state.tuning.scoring;
    state
        .combo
        .decay(state.time, scoring.combo_timeout, scoring.combo_decay_interval);

    refresh_stats(state);
    state.normalize_order();
    events
}

fn apply_intent(state: &mut GameState, intent: &Intent, events: &mut Vec<GameEvent>) {
    let Some(index) = state.paddle_for_seat(intent.seat) else {
        log::debug!("Intent for unknown seat {} ignored", intent.seat);
        return;
    };
    match intent.kind {
        IntentKind::SetTargetAngle { angle } if !angle.is_finite() => {
            log::debug!("Non-finite target angle from seat {} ignored", intent.seat);
        }
        IntentKind::SetTargetAngle { angle } => {
            let control = &mut state.paddles[index].control;
            control.target_angle = Some(normalize_angle(angle));
            control.direction = 0;
        }
        IntentKind::SetDirectionalImpulse { dir } => {
            let control = &mut state.paddles[index].control;
            control.direction = dir.clamp(-1, 1);
            control.target_angle = None;
        }
        IntentKind::RequestRingSwitch => try_ring_switch(state, index, events),
    }
}

/// Start a ring switch unless one is in flight or the destination is occupied
fn try_ring_switch(state: &mut GameState, index: usize, events: &mut Vec<GameEvent>) {
    let paddle = &state.paddles[index];
    let id = paddle.id;
    let blocked = paddle.is_transitioning()
        || find_blocking_paddle(
            &state.paddles,
            id,
            paddle.ring.other(),
            paddle.angle,
            paddle.arc_width,
            state.tuning.paddle.collision_buffer,
        )
        .is_some();

    if blocked {
        log::debug!("Ring switch blocked for paddle {}", id);
        events.push(GameEvent::RingSwitchBlocked { paddle: id });
    } else {
        state.paddles[index].start_ring_switch();
        events.push(GameEvent::RingSwitchOk { paddle: id });
    }
}

fn think_ai(state: &mut GameState, dt: f32) -> Vec<(EntityId, AiCommand)> {
    if state.ai.is_empty() {
        return Vec::new();
    }
    let candidates = gather_candidates(state);
    let ctx = AiContext {
        arena: &state.arena,
        tuning: &state.tuning,
        paddles: &state.paddles,
        candidates: &candidates,
    };
    state
        .ai
        .iter_mut()
        .map(|controller| (controller.paddle_id, controller.think(&ctx, &mut state.rng, dt)))
        .collect()
}

fn move_paddles(state: &mut GameState, commands: &[(EntityId, AiCommand)], dt: f32) {
    let tuning = &state.tuning.paddle;
    let player_width = state
        .effects
        .target_arc_width(tuning.base_arc_width, tuning.min_arc_width);

    for index in 0..state.paddles.len() {
        let max = state.max_speed(&state.paddles[index]);
        let paddle = &mut state.paddles[index];
        paddle.advance_transition(dt, tuning.ring_switch_duration);

        let (width, desired) = if paddle.is_player() {
            (player_width, paddle.desired_velocity(tuning, max))
        } else {
            let desired = commands
                .iter()
                .find(|(id, _)| *id == paddle.id)
                .map_or(0.0, |(_, c)| c.desired_velocity);
            (tuning.base_arc_width, desired)
        };
        paddle.animate_arc_width(width, dt, tuning.arc_lerp_rate, tuning.min_arc_width);
        paddle.drive(desired, dt, tuning, max);
    }
}

fn spawn_entities(state: &mut GameState, events: &mut Vec<GameEvent>, dt: f32) {
    state.spawn_timer -= dt;
    if state.spawn_timer <= 0.0 {
        state.spawn_timer += state.tuning.spawn.ball_interval;
        let angle = state.rng.random_range(-std::f32::consts::PI..std::f32::consts::PI);
        let dir = Vec2::from_angle(angle);
        let wants_powerup = state.rng.random::<f32>() < state.tuning.powerup.chance;

        if wants_powerup && state.powerups.len() < state.tuning.powerup.max_live {
            let kind = PowerUpKind::roll(&mut state.rng);
            let id = state.next_entity_id();
            let tuning = &state.tuning.powerup;
            state.powerups.push(PowerUp::new(
                id,
                kind,
                state.arena.center,
                dir * tuning.speed,
                tuning.radius,
            ));
            log::debug!("Spawned power-up {} ({:?})", id, kind);
        } else if state.balls.len() < state.tuning.spawn.max_balls {
            let id = state.next_entity_id();
            let tuning = &state.tuning.ball;
            state.balls.push(Ball::new(
                id,
                state.arena.center,
                dir * tuning.base_speed,
                tuning.base_radius,
            ));
        }
    }

    if state.special.is_none() {
        state.special_spawn_timer -= dt;
        if state.special_spawn_timer <= 0.0 {
            state.special_spawn_timer = state.tuning.special.spawn_interval;
            let angle = state.rng.random_range(-std::f32::consts::PI..std::f32::consts::PI);
            let id = state.next_entity_id();
            state.special = Some(SpecialBall::spawn(
                id,
                &state.arena,
                angle,
                &state.tuning.ball,
                &state.tuning.special,
            ));
            log::info!("Capture objective {} spawned", id);
            events.push(GameEvent::SpecialSpawned { id });
        }
    }
}

/// Outgoing velocity for a body deflected off a paddle.
///
/// Band hits leave on the side of the centerline the body sits on: inside
/// heads toward the center, outside is mirrored outward. `separate_from_arc`
/// places the body on that same side.
fn deflected_velocity(local: Vec2, vel: Vec2, arc: &ArcSegment, result: &CollisionResult) -> Vec2 {
    let outside = !result.cap_hit && local.length() >= arc.radius;
    let angle = if outside {
        normalize_angle(result.deflection_angle + std::f32::consts::PI)
    } else {
        result.deflection_angle
    };
    Vec2::from_angle(angle) * vel.length()
}

fn collide_balls(state: &mut GameState, arcs: &[ArcSegment], events: &mut Vec<GameEvent>) {
    let center = state.arena.center;
    let ball_tuning = &state.tuning.ball;
    let scoring = &state.tuning.scoring;
    let points_mult = state.effects.points_multiplier();

    for ball in &mut state.balls {
        if ball.escaped || ball.hit_cooldown > 0.0 {
            continue;
        }
        let local = ball.pos - center;
        let radius = ball.radius();
        let Some((index, result)) = first_hit(local, radius, arcs) else {
            continue;
        };
        let paddle = &state.paddles[index];

        let momentum = momentum_boost(paddle.angular_velocity, ball_tuning.momentum_k, ball_tuning.max_boost);
        let mid_switch = paddle.transition;
        ball.vel = deflected_velocity(local, ball.vel, &arcs[index], &result);
        ball.speed_multiplier = momentum;
        if let Some(transition) = mid_switch {
            ball.speed_multiplier *= ball_tuning.transfer_speed_multiplier;
            ball.spin = ball_tuning.transfer_spin * transition.direction_sign();
        }
        ball.pos = center + separate_from_arc(local, radius, &arcs[index], &result);
        ball.hit_cooldown = ball_tuning.hit_cooldown;
        ball.last_hit_by = Some(paddle.id);

        let edge_hit = result.cap_hit || result.edge_factor >= ball_tuning.edge_threshold;
        let mut points = 0;
        if paddle.is_player() {
            if let Some(level) = state.combo.register_hit(state.time, &scoring.combo_milestones) {
                events.push(GameEvent::ComboMilestone { level });
            }
            let factors = HitFactors {
                age_bonus: age_bonus(ball.age, ball_tuning.maturity_time, ball_tuning.max_age_bonus),
                edge_hit,
                momentum,
                mid_switch: mid_switch.is_some(),
            };
            points = hit_points(&factors, scoring, points_mult, state.combo.multiplier(scoring.combo_step));
            state.score += points;
            state.stats.hits += 1;
            if edge_hit {
                state.stats.edge_hits += 1;
            }
        }

        events.push(GameEvent::PaddleHit {
            paddle: paddle.id,
            ball: ball.id,
            edge_hit,
            momentum,
            points,
        });
    }
}

/// One-time bonus for an unhit ball slipping just past a player's arc tip
fn detect_near_misses(state: &mut GameState, arcs: &[ArcSegment], events: &mut Vec<GameEvent>) {
    let scoring = &state.tuning.scoring;
    let points_mult = state.effects.points_multiplier();

    for ball in &mut state.balls {
        if ball.escaped || ball.near_miss_awarded || ball.last_hit_by.is_some() {
            continue;
        }
        let local = ball.pos - state.arena.center;
        if ball.vel.dot(local) <= 0.0 {
            continue;
        }
        let (r, theta) = crate::cartesian_to_polar(local);

        let grazed = state
            .paddles
            .iter()
            .zip(arcs)
            .filter(|(paddle, _)| paddle.is_player())
            .find_map(|(paddle, arc)| {
                let beyond = arc.angular_offset(theta).abs() - arc.half_width();
                let close = beyond > 0.0
                    && beyond <= scoring.near_miss_angular_band
                    && (r - arc.radius).abs() <= scoring.near_miss_radial_band;
                close.then(|| (paddle.id, 1.0 - beyond / scoring.near_miss_angular_band))
            });

        if let Some((paddle, proximity)) = grazed {
            let bonus = near_miss_bonus(proximity, scoring.near_miss_max, points_mult);
            ball.near_miss_awarded = true;
            state.score += bonus;
            state.stats.near_misses += 1;
            events.push(GameEvent::NearMiss {
                ball: ball.id,
                paddle,
                bonus,
            });
        }
    }
}

fn collect_powerups(state: &mut GameState, arcs: &[ArcSegment], events: &mut Vec<GameEvent>) {
    let center = state.arena.center;
    let mut collected: Vec<(EntityId, PowerUpKind, usize)> = Vec::new();
    for powerup in &state.powerups {
        if powerup.escaped {
            continue;
        }
        if let Some((index, _)) = first_hit(powerup.pos - center, powerup.radius(), arcs) {
            collected.push((powerup.id, powerup.kind, index));
        }
    }

    for (id, kind, index) in collected {
        state.powerups.retain(|p| p.id != id);
        let paddle = &state.paddles[index];
        if paddle.is_player() {
            state
                .effects
                .add(kind, state.time, &state.tuning.powerup);
            state.stats.powerups_collected += 1;
            log::debug!("Power-up {:?} collected by paddle {}", kind, paddle.id);
            events.push(GameEvent::PowerUpCollected {
                kind,
                paddle: paddle.id,
            });
        } else {
            events.push(GameEvent::PowerUpDenied {
                kind,
                paddle: paddle.id,
            });
        }
    }
}

fn collide_special(state: &mut GameState, arcs: &[ArcSegment], events: &mut Vec<GameEvent>) {
    let Some(special) = &mut state.special else {
        return;
    };
    if !special.accepts_hits() {
        return;
    }
    let local = special.ball.pos - state.arena.center;
    let radius = special.radius(&state.tuning.special);
    let Some((index, result)) = first_hit(local, radius, arcs) else {
        return;
    };
    let paddle = &state.paddles[index];

    special.ball.vel = deflected_velocity(local, special.ball.vel, &arcs[index], &result);
    special.ball.pos = state.arena.center + separate_from_arc(local, radius, &arcs[index], &result);
    special.ball.last_hit_by = Some(paddle.id);
    let changed = special.on_hit(state.tuning.special.hit_cooldown);

    if paddle.is_player() {
        let milestones = &state.tuning.scoring.combo_milestones;
        if let Some(level) = state.combo.register_hit(state.time, milestones) {
            events.push(GameEvent::ComboMilestone { level });
        }
    }
    events.push(GameEvent::SpecialHit {
        paddle: paddle.id,
        state: special.state,
    });
    if let Some(new_state) = changed {
        events.push(GameEvent::SpecialStateChanged { state: new_state });
    }
}

/// Flag bodies that left the arena (once) and drop them once well off-screen
fn handle_escapes(state: &mut GameState, events: &mut Vec<GameEvent>) {
    let outer = state.arena.outer_radius;
    let margin = state.tuning.ball.offscreen_margin;

    for ball in &mut state.balls {
        let dist = state.arena.distance_from_center(ball.pos);
        if !ball.escaped && dist >= outer + ball.radius() && ball.hit_cooldown <= 0.0 {
            ball.escaped = true;
            state.stats.balls_escaped += 1;
            events.push(GameEvent::BallEscaped { ball: ball.id });
        }
    }
    let arena = state.arena;
    state
        .balls
        .retain(|b| !b.escaped || arena.distance_from_center(b.pos) <= outer + b.radius() + margin);

    for powerup in &mut state.powerups {
        if !powerup.escaped && arena.distance_from_center(powerup.pos) >= outer + powerup.radius() {
            powerup.escaped = true;
        }
    }
    state
        .powerups
        .retain(|p| !p.escaped || arena.distance_from_center(p.pos) <= outer + p.radius() + margin);
}

/// Returns true when the round ended this step
fn resolve_special_outcome(state: &mut GameState, events: &mut Vec<GameEvent>) -> bool {
    let Some(special) = &state.special else {
        return false;
    };
    match special.outcome(&state.arena, &state.tuning.special) {
        Some(SpecialOutcome::Captured) => {
            let bonus = capture_bonus(
                special.return_time,
                state.tuning.scoring.capture_rate,
                state.effects.points_multiplier(),
                state.combo_multiplier(),
            );
            log::info!("Capture objective {} captured for {} points", special.id(), bonus);
            state.score += bonus;
            state.stats.captures += 1;
            state.special = None;
            state.special_spawn_timer = state.tuning.special.spawn_interval;
            events.push(GameEvent::BallCaptured { bonus });
            false
        }
        Some(SpecialOutcome::Escaped) => {
            events.push(GameEvent::SpecialEscaped);
            end_round(state, events);
            true
        }
        None => false,
    }
}

fn end_round(state: &mut GameState, events: &mut Vec<GameEvent>) {
    state.round = RoundState::Stopped;
    state.special = None;
    state.effects.clear();
    for paddle in &mut state.paddles {
        paddle.angular_velocity = 0.0;
    }
    refresh_stats(state);
    log::info!(
        "Round over: score={} time={:.1}s hits={} max_combo={}",
        state.score,
        state.time,
        state.stats.hits,
        state.stats.max_combo
    );
    events.push(GameEvent::RoundEnded {
        score: state.score,
        stats: state.stats.clone(),
    });
}

fn refresh_stats(state: &mut GameState) {
    state.stats.score = state.score;
    state.stats.duration = state.time;
    state.stats.max_combo = state.combo.max_count;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::angle_delta;
    use crate::settings::MatchSettings;
    use crate::sim::arena::Ring;
    use crate::sim::special::SpecialState;
    use crate::tuning::Tuning;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;
    use std::f32::consts::{FRAC_PI_2, PI};

    fn solo_state() -> GameState {
        let settings = MatchSettings {
            ai_roster: Vec::new(),
            ..MatchSettings::solo(17)
        };
        GameState::new(&settings, Tuning::default())
    }

    fn grown_ball(state: &mut GameState, r: f32, theta: f32, vel: Vec2) -> EntityId {
        let id = state.next_entity_id();
        let mut ball = Ball::new(id, state.arena.from_polar(r, theta), vel, state.tuning.ball.base_radius);
        ball.spawn_progress = 1.0;
        state.balls.push(ball);
        id
    }

    fn special_at(state: &mut GameState, r: f32, theta: f32, vel: Vec2, special_state: SpecialState) {
        let id = state.next_entity_id();
        let mut special = SpecialBall::spawn(id, &state.arena, theta, &state.tuning.ball, &state.tuning.special);
        special.ball.pos = state.arena.from_polar(r, theta);
        special.ball.vel = vel;
        special.ball.spawn_progress = 1.0;
        special.state = special_state;
        state.special = Some(special);
    }

    #[test]
    fn test_paused_round_does_not_advance() {
        let mut state = solo_state();
        state.set_paused(true);
        assert!(step(&mut state, &[], SIM_DT).is_empty());
        assert_eq!(state.time, 0.0);
    }

    #[test]
    fn test_oversized_delta_is_clamped() {
        let mut state = solo_state();
        step(&mut state, &[], 2.0);
        assert!((state.time - MAX_STEP_DT).abs() < 1e-6);
    }

    #[test]
    fn test_center_hit_scores_and_deflects_inward() {
        let mut state = solo_state();
        let theta = -FRAC_PI_2;
        let ball = grown_ball(&mut state, 288.0, theta, Vec2::from_angle(theta) * 140.0);

        let events = step(&mut state, &[], SIM_DT);
        let hit = events.iter().find_map(|e| match e {
            GameEvent::PaddleHit { ball: b, edge_hit, points, momentum, .. } if *b == ball => {
                Some((*edge_hit, *points, *momentum))
            }
            _ => None,
        });
        // base 10 × combo 1.1
        assert_eq!(hit, Some((false, 11, 1.0)));
        assert_eq!(state.score, 11);
        assert_eq!(state.combo.count, 1);

        let vel = state.balls[0].vel;
        let heading = vel.y.atan2(vel.x);
        assert!(angle_delta(heading, normalize_angle(theta + PI)).abs() < 1e-3);
        assert!((vel.length() - 140.0).abs() < 1e-2);
    }

    #[test]
    fn test_outside_band_hit_deflects_outward_once() {
        let mut state = solo_state();
        let theta = -FRAC_PI_2;
        let ball = grown_ball(&mut state, 305.0, theta, Vec2::from_angle(theta) * 140.0);

        let mut hits = 0;
        let mut radial_after_hit = None;
        for _ in 0..40 {
            let events = step(&mut state, &[], SIM_DT);
            let hit = events
                .iter()
                .any(|e| matches!(e, GameEvent::PaddleHit { ball: b, .. } if *b == ball));
            if hit {
                hits += 1;
                if let Some(b) = state.balls.iter().find(|b| b.id == ball) {
                    let outward = (b.pos - state.arena.center).normalize();
                    radial_after_hit = Some(b.vel.dot(outward));
                }
            }
        }
        assert_eq!(hits, 1);
        assert_eq!(state.score, 11);
        assert!(radial_after_hit.is_some_and(|v| v > 0.0), "radial {radial_after_hit:?}");
    }

    #[test]
    fn test_non_finite_target_angle_ignored() {
        let mut state = solo_state();
        step(&mut state, &[Intent::target_angle(0, 1.0)], SIM_DT);
        for bad in [f32::NAN, f32::INFINITY, f32::NEG_INFINITY] {
            step(&mut state, &[Intent::target_angle(0, bad)], SIM_DT);
            let paddle = &state.paddles[0];
            assert_eq!(paddle.control.target_angle, Some(1.0));
            assert!(paddle.angle.is_finite());
            assert!(paddle.angular_velocity.is_finite());
            assert!(paddle.angular_velocity.abs() <= state.max_speed(paddle) + 1e-4);
        }
    }

    #[test]
    fn test_huge_target_angle_wrapped() {
        let mut state = solo_state();
        step(&mut state, &[Intent::target_angle(0, 1e30)], SIM_DT);
        let target = state.paddles[0].control.target_angle;
        assert!(target.is_some_and(|a| (-PI..PI).contains(&a)), "target {target:?}");
        for _ in 0..30 {
            step(&mut state, &[], SIM_DT);
        }
        assert!(state.paddles[0].angle.is_finite());
    }

    #[test]
    fn test_ring_switch_ok_then_blocked_while_transitioning() {
        let mut state = solo_state();
        let events = step(&mut state, &[Intent::ring_switch(0)], SIM_DT);
        assert!(events.contains(&GameEvent::RingSwitchOk { paddle: state.paddles[0].id }));
        let events = step(&mut state, &[Intent::ring_switch(0)], SIM_DT);
        assert!(events.contains(&GameEvent::RingSwitchBlocked { paddle: state.paddles[0].id }));
        for _ in 0..30 {
            step(&mut state, &[], SIM_DT);
        }
        assert_eq!(state.paddles[0].ring, Ring::Inner);
    }

    #[test]
    fn test_ring_switch_into_occupied_destination_blocked() {
        let settings = MatchSettings {
            ai_roster: Vec::new(),
            ..MatchSettings::multiplayer(3, 2)
        };
        let mut state = GameState::new(&settings, Tuning::default());
        state.paddles[1].ring = Ring::Inner;
        state.paddles[1].angle = state.paddles[0].angle;

        let events = step(&mut state, &[Intent::ring_switch(0)], SIM_DT);
        let id = state.paddles[0].id;
        assert!(events.contains(&GameEvent::RingSwitchBlocked { paddle: id }));
        assert!(!state.paddles[0].is_transitioning());
    }

    #[test]
    fn test_player_collects_powerup() {
        let mut state = solo_state();
        let id = state.next_entity_id();
        let theta = -FRAC_PI_2;
        let mut powerup = PowerUp::new(id, PowerUpKind::DoublePoints, state.arena.from_polar(292.0, theta), Vec2::ZERO, 10.0);
        powerup.spawn_progress = 1.0;
        state.powerups.push(powerup);

        let events = step(&mut state, &[], SIM_DT);
        assert!(events.iter().any(|e| matches!(e, GameEvent::PowerUpCollected { kind: PowerUpKind::DoublePoints, .. })));
        assert!(state.powerups.is_empty());
        assert_eq!(state.effects.points_multiplier(), 2.0);
        assert_eq!(state.stats.powerups_collected, 1);
    }

    #[test]
    fn test_ai_denies_powerup() {
        let settings = MatchSettings {
            ai_roster: vec!["sentinel".into()],
            ..MatchSettings::solo(8)
        };
        let mut state = GameState::new(&settings, Tuning::default());
        let ai_angle = state.paddles[1].angle;
        let id = state.next_entity_id();
        let mut powerup = PowerUp::new(id, PowerUpKind::WidePaddle, state.arena.from_polar(292.0, ai_angle), Vec2::ZERO, 10.0);
        powerup.spawn_progress = 1.0;
        state.powerups.push(powerup);

        let events = step(&mut state, &[], SIM_DT);
        assert!(events.iter().any(|e| matches!(e, GameEvent::PowerUpDenied { .. })));
        assert!(state.effects.is_empty());
    }

    #[test]
    fn test_escape_flagged_exactly_once() {
        let mut state = solo_state();
        let ball = grown_ball(&mut state, 310.0, 0.0, Vec2::new(140.0, 0.0));
        let mut escapes = 0;
        for _ in 0..60 {
            let events = step(&mut state, &[], SIM_DT);
            escapes += events
                .iter()
                .filter(|e| **e == GameEvent::BallEscaped { ball })
                .count();
            if let Some(b) = state.balls.iter().find(|b| b.id == ball) {
                assert!(b.escaped);
            }
        }
        assert_eq!(escapes, 1);
        assert_eq!(state.stats.balls_escaped, 1);
        assert!(state.balls.iter().all(|b| b.id != ball));
    }

    #[test]
    fn test_near_miss_awarded_once() {
        let mut state = solo_state();
        let tip = -FRAC_PI_2 + state.paddles[0].arc_width / 2.0;
        let theta = tip + 0.1;
        grown_ball(&mut state, 298.0, theta, Vec2::from_angle(theta) * 140.0);

        let mut awards = Vec::new();
        for _ in 0..5 {
            for event in step(&mut state, &[], SIM_DT) {
                if let GameEvent::NearMiss { bonus, .. } = event {
                    awards.push(bonus);
                }
            }
        }
        assert_eq!(awards.len(), 1);
        assert!(awards[0] > 0 && awards[0] <= 15);
        assert_eq!(state.score, awards[0]);
    }

    #[test]
    fn test_special_escape_ends_round() {
        let mut state = solo_state();
        special_at(&mut state, 299.0, FRAC_PI_2, Vec2::new(0.0, 84.0), SpecialState::Active);

        let events = step(&mut state, &[], SIM_DT);
        assert!(events.contains(&GameEvent::SpecialEscaped));
        assert!(events.iter().any(|e| matches!(e, GameEvent::RoundEnded { .. })));
        assert_eq!(state.round, RoundState::Stopped);
        assert!(state.effects.is_empty());
        assert!(step(&mut state, &[], SIM_DT).is_empty());
    }

    #[test]
    fn test_returning_special_captured_for_bonus() {
        let mut state = solo_state();
        special_at(&mut state, 20.0, FRAC_PI_2, Vec2::new(0.0, -200.0), SpecialState::Returning);
        if let Some(special) = &mut state.special {
            special.return_time = 3.0;
        }

        let events = step(&mut state, &[], SIM_DT);
        let bonus = events.iter().find_map(|e| match e {
            GameEvent::BallCaptured { bonus } => Some(*bonus),
            _ => None,
        });
        // floor((3.0 + dt) × 20)
        assert_eq!(bonus, Some(60));
        assert!(state.special.is_none());
        assert_eq!(state.stats.captures, 1);
        assert_eq!(state.score, 60);
    }

    #[test]
    fn test_claim_zone_hold_forces_capture() {
        let mut state = solo_state();
        special_at(&mut state, 75.0, FRAC_PI_2, Vec2::new(0.0, -5.0), SpecialState::Returning);

        let mut forced_at = None;
        for n in 1..=120 {
            let events = step(&mut state, &[], SIM_DT);
            if events.contains(&GameEvent::SpecialStateChanged { state: SpecialState::ForceCapture }) {
                forced_at = Some(n);
                break;
            }
        }
        // 1.5s claim time at 60 Hz, then the following step
        let n = forced_at.unwrap_or(0);
        assert!((90..=93).contains(&n), "forced at step {n}");
    }

    #[test]
    fn test_combo_decays_one_step_at_a_time() {
        let mut state = solo_state();
        for _ in 0..3 {
            state.combo.register_hit(0.0, &[]);
        }
        let mut steps = 0;
        while state.combo.count == 3 && steps < 600 {
            step(&mut state, &[], SIM_DT);
            steps += 1;
        }
        assert_eq!(state.combo.count, 2);
        assert!(state.time > 2.0);
        for _ in 0..5 {
            step(&mut state, &[], SIM_DT);
        }
        assert_eq!(state.combo.count, 2);
    }

    #[test]
    fn test_angular_speed_bounded_every_step() {
        let mut state = GameState::new(&MatchSettings::multiplayer(21, 2), Tuning::default());
        state.effects.add(PowerUpKind::PaddleSpeed, 0.0, &state.tuning.powerup);
        let mut input_rng = Pcg32::seed_from_u64(99);
        for _ in 0..900 {
            let intents = [
                Intent::directional(0, input_rng.random_range(-1..=1)),
                Intent::target_angle(1, input_rng.random_range(-PI..PI)),
            ];
            step(&mut state, &intents, SIM_DT);
            for paddle in &state.paddles {
                assert!(paddle.angular_velocity.abs() <= state.max_speed(paddle) + 1e-4);
                assert!(paddle.arc_width >= state.tuning.paddle.min_arc_width);
            }
        }
    }

    #[test]
    fn test_same_seed_same_outcome() {
        let run = || {
            let mut state = GameState::new(&MatchSettings::solo(1234), Tuning::default());
            let mut events = Vec::new();
            for i in 0..900 {
                let intent = Intent::target_angle(0, (i as f32 * 0.01).sin() * PI);
                events.extend(step(&mut state, &[intent], SIM_DT));
            }
            (state.snapshot(), events)
        };
        let (a_snap, a_events) = run();
        let (b_snap, b_events) = run();
        assert_eq!(a_snap, b_snap);
        assert_eq!(a_events, b_events);
    }

    #[test]
    fn test_intent_wire_format() {
        let intent = Intent::target_angle(2, 1.5);
        let json = serde_json::to_string(&intent).unwrap();
        assert_eq!(json, r#"{"seat":2,"kind":{"type":"set_target_angle","angle":1.5}}"#);
        let back: Intent = serde_json::from_str(r#"{"seat":0,"kind":{"type":"request_ring_switch"}}"#).unwrap();
        assert_eq!(back, Intent::ring_switch(0));
    }
}
