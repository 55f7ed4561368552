//! Collision detection and response for curved geometry
//!
//! Two problems live here: a circle against a thick paddle arc with rounded
//! end caps (yielding a deflection angle rather than a reflection normal),
//! and paddle-vs-paddle overlap on a shared ring.

use glam::Vec2;

use super::arc::ArcSegment;
use super::arena::Ring;
use super::state::{EntityId, Paddle};
use crate::{angle_delta, cartesian_to_polar, normalize_angle, polar_to_cartesian};

/// Gap left between a deflected ball and the paddle surface
const SEPARATION_SLOP: f32 = 0.5;
/// Extra angular clearance added when pushing paddles apart
const OVERLAP_EPSILON: f32 = 1e-4;
/// Keeps the push-share denominator away from zero
const PUSH_EPSILON: f32 = 0.001;

/// Result of a collision check
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CollisionResult {
    /// Whether a collision occurred
    pub hit: bool,
    /// Outgoing direction for the deflected body (radians)
    pub deflection_angle: f32,
    /// 0 for a dead-center hit, 1 at the tips and on caps
    pub edge_factor: f32,
    /// Hit landed on a rounded end cap rather than the band
    pub cap_hit: bool,
}

impl CollisionResult {
    pub fn miss() -> Self {
        Self {
            hit: false,
            deflection_angle: 0.0,
            edge_factor: 0.0,
            cap_hit: false,
        }
    }
}

/// Check a circle against an arc with rounded caps.
///
/// `point` is relative to the arena center. The band test runs first:
/// within the angular span and inside the radially widened band, the
/// deflection is `θ + π + d·edge·0.5` where `d` is the signed angular offset
/// from the paddle midpoint. Otherwise each end cap is a circle of radius
/// `thickness/2 + radius` and deflects away from its center.
pub fn point_arc_collision(point: Vec2, radius: f32, arc: &ArcSegment) -> CollisionResult {
    let (r, theta) = cartesian_to_polar(point);
    let offset = arc.angular_offset(theta);
    let half_width = arc.half_width();

    if arc.contains_angle(theta)
        && r >= arc.inner_radius() - radius
        && r <= arc.outer_radius() + radius
    {
        let edge_factor = if half_width > 0.0 {
            (offset.abs() / half_width).min(1.0)
        } else {
            1.0
        };
        return CollisionResult {
            hit: true,
            deflection_angle: normalize_angle(theta + std::f32::consts::PI + offset * edge_factor * 0.5),
            edge_factor,
            cap_hit: false,
        };
    }

    let reach = arc.half_thickness() + radius;
    for cap in arc.cap_centers() {
        let away = point - cap;
        if away.length_squared() <= reach * reach {
            return CollisionResult {
                hit: true,
                deflection_angle: away.y.atan2(away.x),
                edge_factor: 1.0,
                cap_hit: true,
            };
        }
    }

    CollisionResult::miss()
}

/// Test a circle against paddle arcs in order; the first hit wins
pub fn first_hit(
    point: Vec2,
    radius: f32,
    arcs: &[ArcSegment],
) -> Option<(usize, CollisionResult)> {
    arcs.iter().enumerate().find_map(|(index, arc)| {
        let result = point_arc_collision(point, radius, arc);
        result.hit.then_some((index, result))
    })
}

/// Move a colliding circle just clear of the arc (local coordinates)
pub fn separate_from_arc(point: Vec2, radius: f32, arc: &ArcSegment, result: &CollisionResult) -> Vec2 {
    if result.cap_hit {
        let reach = arc.half_thickness() + radius + SEPARATION_SLOP;
        let cap = arc
            .cap_centers()
            .into_iter()
            .min_by(|a, b| a.distance_squared(point).total_cmp(&b.distance_squared(point)))
            .unwrap_or(point);
        let away = (point - cap).normalize_or(Vec2::from_angle(result.deflection_angle));
        return cap + away * reach;
    }

    let (r, theta) = cartesian_to_polar(point);
    let clear_r = if r < arc.radius {
        arc.inner_radius() - radius - SEPARATION_SLOP
    } else {
        arc.outer_radius() + radius + SEPARATION_SLOP
    };
    polar_to_cartesian(clear_r.max(0.0), theta)
}

/// Minimum center-to-center angle for two arcs of these widths
#[inline]
fn clearance(width_a: f32, width_b: f32, buffer: f32) -> f32 {
    (width_a + width_b) / 2.0 * buffer
}

/// Index of a paddle (other than `mover`) occupying `angle` on `ring`
pub fn find_blocking_paddle(
    paddles: &[Paddle],
    mover: EntityId,
    ring: Ring,
    angle: f32,
    width: f32,
    buffer: f32,
) -> Option<usize> {
    paddles.iter().position(|other| {
        other.id != mover
            && other.effective_ring() == ring
            && angle_delta(angle, other.angle).abs() < clearance(width, other.arc_width, buffer)
    })
}

/// A resolved paddle-vs-paddle overlap
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PaddleContact {
    pub a: EntityId,
    pub b: EntityId,
    /// Closing angular speed at contact (rad/s)
    pub impact: f32,
}

/// Separate overlapping paddles that share a ring.
///
/// Each paddle is displaced in proportion to the other's inbound push, so
/// the paddle doing the shoving moves less. Velocities are exchanged with
/// the pushier side dominating.
pub fn resolve_paddle_collisions(paddles: &mut [Paddle], buffer: f32) -> Vec<PaddleContact> {
    let mut contacts = Vec::new();

    for i in 0..paddles.len() {
        for j in (i + 1)..paddles.len() {
            if paddles[i].effective_ring() != paddles[j].effective_ring() {
                continue;
            }

            let threshold = clearance(paddles[i].arc_width, paddles[j].arc_width, buffer);
            let delta = angle_delta(paddles[i].angle, paddles[j].angle);
            let separation = delta.abs();
            if separation >= threshold {
                continue;
            }

            // +1 when j sits counter-clockwise of i
            let side = if delta >= 0.0 { 1.0 } else { -1.0 };
            let vi = paddles[i].angular_velocity;
            let vj = paddles[j].angular_velocity;
            let push_i = (side * vi).max(0.0);
            let push_j = (-side * vj).max(0.0);

            let overlap = threshold - separation + OVERLAP_EPSILON;
            let total = push_i + push_j + PUSH_EPSILON;
            let share_i = (push_j + PUSH_EPSILON / 2.0) / total;
            let share_j = (push_i + PUSH_EPSILON / 2.0) / total;

            paddles[i].angle = normalize_angle(paddles[i].angle - side * overlap * share_i);
            paddles[j].angle = normalize_angle(paddles[j].angle + side * overlap * share_j);

            let (new_vi, new_vj) = if push_i >= push_j {
                (0.3 * vi + 0.3 * vj, 0.3 * vj + 0.6 * vi)
            } else {
                (0.3 * vi + 0.6 * vj, 0.3 * vj + 0.3 * vi)
            };
            paddles[i].angular_velocity = new_vi;
            paddles[j].angular_velocity = new_vj;

            contacts.push(PaddleContact {
                a: paddles[i].id,
                b: paddles[j].id,
                impact: push_i + push_j,
            });
        }
    }

    contacts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::state::PaddleOwner;
    use proptest::prelude::*;
    use std::f32::consts::PI;

    fn paddle(id: EntityId, angle: f32, width: f32, velocity: f32) -> Paddle {
        let mut p = Paddle::new(id, PaddleOwner::Ai { profile: 0 }, angle, width);
        p.angular_velocity = velocity;
        p
    }

    #[test]
    fn test_center_hit_deflects_straight_back() {
        let arc = ArcSegment::new(300.0, 14.0, 0.7, 0.5);
        let ball = polar_to_cartesian(295.0, 0.7);
        let result = point_arc_collision(ball, 8.0, &arc);
        assert!(result.hit);
        assert!(!result.cap_hit);
        assert!(result.edge_factor.abs() < 1e-4);
        let expected = normalize_angle(0.7 + PI);
        assert!(angle_delta(result.deflection_angle, expected).abs() < 1e-4);
    }

    #[test]
    fn test_edge_hit_bends_toward_struck_side() {
        let arc = ArcSegment::new(300.0, 14.0, 0.0, 0.5);
        let ball = polar_to_cartesian(300.0, 0.2);
        let result = point_arc_collision(ball, 8.0, &arc);
        assert!(result.hit);
        assert!((result.edge_factor - 0.8).abs() < 1e-4);
        // θ + π + 0.2 × 0.8 × 0.5
        let expected = normalize_angle(0.2 + PI + 0.08);
        assert!(angle_delta(result.deflection_angle, expected).abs() < 1e-4);
    }

    #[test]
    fn test_radial_band_includes_ball_radius() {
        let arc = ArcSegment::new(300.0, 14.0, 0.0, 0.5);
        // Band is 293..307; widened by 8 → 285..315
        assert!(point_arc_collision(Vec2::new(286.0, 0.0), 8.0, &arc).hit);
        assert!(point_arc_collision(Vec2::new(314.0, 0.0), 8.0, &arc).hit);
        assert!(!point_arc_collision(Vec2::new(280.0, 0.0), 8.0, &arc).hit);
    }

    #[test]
    fn test_cap_hit_deflects_away_from_cap() {
        let arc = ArcSegment::new(300.0, 14.0, 0.0, 0.5);
        let [_, end] = arc.cap_centers();
        // Just past the tip, tangentially
        let tangent = Vec2::new(-end.y, end.x).normalize();
        let ball = end + tangent * 10.0;
        let result = point_arc_collision(ball, 8.0, &arc);
        assert!(result.hit);
        assert!(result.cap_hit);
        assert_eq!(result.edge_factor, 1.0);
        let expected = tangent.y.atan2(tangent.x);
        assert!(angle_delta(result.deflection_angle, expected).abs() < 1e-3);
    }

    #[test]
    fn test_clear_miss() {
        let arc = ArcSegment::new(300.0, 14.0, 0.0, 0.5);
        let ball = polar_to_cartesian(300.0, PI / 2.0);
        assert!(!point_arc_collision(ball, 8.0, &arc).hit);
    }

    #[test]
    fn test_first_hit_respects_order() {
        let a = ArcSegment::new(300.0, 14.0, 0.0, 0.5);
        let b = ArcSegment::new(300.0, 14.0, 0.1, 0.5);
        let ball = polar_to_cartesian(300.0, 0.05);
        assert_eq!(first_hit(ball, 8.0, &[a, b]).map(|(i, _)| i), Some(0));
        assert_eq!(first_hit(ball, 8.0, &[b, a]).map(|(i, _)| i), Some(0));
        assert!(first_hit(-ball, 8.0, &[a, b]).is_none());
    }

    #[test]
    fn test_separate_clears_band() {
        let arc = ArcSegment::new(300.0, 14.0, 0.0, 0.5);
        let ball = Vec2::new(290.0, 0.0);
        let result = point_arc_collision(ball, 8.0, &arc);
        let cleared = separate_from_arc(ball, 8.0, &arc, &result);
        assert!(cleared.length() < 285.0);
        assert!(!point_arc_collision(cleared, 8.0, &arc).hit);
    }

    #[test]
    fn test_paddles_separated_past_buffer() {
        let w = 0.5;
        let mut paddles = vec![paddle(1, 0.0, w, 2.0), paddle(2, 0.3, w, -1.0)];
        let contacts = resolve_paddle_collisions(&mut paddles, 1.05);
        assert_eq!(contacts.len(), 1);
        assert!((contacts[0].impact - 3.0).abs() < 1e-5);
        let sep = angle_delta(paddles[0].angle, paddles[1].angle).abs();
        assert!(sep >= w * 1.05 - 1e-4);
        // The harder pusher moved less
        assert!(paddles[0].angle.abs() < (paddles[1].angle - 0.3).abs());
    }

    #[test]
    fn test_velocity_exchange_favors_dominant() {
        let mut paddles = vec![paddle(1, 0.0, 0.5, 4.0), paddle(2, 0.3, 0.5, 0.0)];
        resolve_paddle_collisions(&mut paddles, 1.05);
        assert!((paddles[0].angular_velocity - 1.2).abs() < 1e-5);
        assert!((paddles[1].angular_velocity - 2.4).abs() < 1e-5);
    }

    #[test]
    fn test_different_rings_do_not_collide() {
        let mut paddles = vec![paddle(1, 0.0, 0.5, 0.0), paddle(2, 0.1, 0.5, 0.0)];
        paddles[1].ring = Ring::Inner;
        assert!(resolve_paddle_collisions(&mut paddles, 1.05).is_empty());

        // Heading into the same ring counts
        paddles[1].ring = Ring::Inner;
        paddles[1].start_ring_switch();
        assert_eq!(resolve_paddle_collisions(&mut paddles, 1.05).len(), 1);
    }

    #[test]
    fn test_blocking_paddle_lookup() {
        let paddles = vec![paddle(1, 0.0, 0.5, 0.0), paddle(2, 2.0, 0.5, 0.0)];
        assert_eq!(find_blocking_paddle(&paddles, 2, Ring::Outer, 0.3, 0.5, 1.05), Some(0));
        assert_eq!(find_blocking_paddle(&paddles, 1, Ring::Outer, 0.3, 0.5, 1.05), None);
        assert_eq!(find_blocking_paddle(&paddles, 2, Ring::Inner, 0.3, 0.5, 1.05), None);
    }

    proptest! {
        #[test]
        fn prop_pair_resolution_reaches_buffer(
            a in -PI..PI,
            gap in 0.0f32..0.5,
            va in -6.0f32..6.0,
            vb in -6.0f32..6.0,
            w in 0.2f32..0.8,
        ) {
            let mut paddles = vec![paddle(1, a, w, va), paddle(2, a + gap, w, vb)];
            resolve_paddle_collisions(&mut paddles, 1.05);
            let sep = angle_delta(paddles[0].angle, paddles[1].angle).abs();
            prop_assert!(sep >= w * 1.05 - 1e-3);
        }
    }
}
