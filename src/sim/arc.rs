//! Arc segment geometry for paddles
//!
//! In polar coordinates around the arena center, a paddle arc is defined by:
//! - radius: centerline distance from center
//! - thickness: radial extent (inner = radius - thickness/2, outer = radius + thickness/2)
//! - center_angle, width: angular extent centered on `center_angle`
//!
//! Each end of the arc is closed by a rounded cap of radius thickness/2.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::{angle_delta, normalize_angle, polar_to_cartesian};

/// A thickened arc segment in polar space (local to the arena center)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ArcSegment {
    /// Centerline radius from arena center
    pub radius: f32,
    /// Radial thickness (extends radius ± thickness/2)
    pub thickness: f32,
    /// Angle of the arc's midpoint (radians, normalized to [-π, π))
    pub center_angle: f32,
    /// Full angular width (radians)
    pub width: f32,
}

impl ArcSegment {
    pub fn new(radius: f32, thickness: f32, center_angle: f32, width: f32) -> Self {
        Self {
            radius,
            thickness,
            center_angle: normalize_angle(center_angle),
            width,
        }
    }

    #[inline]
    pub fn half_width(&self) -> f32 {
        self.width / 2.0
    }

    #[inline]
    pub fn half_thickness(&self) -> f32 {
        self.thickness / 2.0
    }

    /// Inner radius of the arc band
    #[inline]
    pub fn inner_radius(&self) -> f32 {
        self.radius - self.half_thickness()
    }

    /// Outer radius of the arc band
    #[inline]
    pub fn outer_radius(&self) -> f32 {
        self.radius + self.half_thickness()
    }

    /// Signed angular offset of `theta` from the arc midpoint
    #[inline]
    pub fn angular_offset(&self, theta: f32) -> f32 {
        angle_delta(self.center_angle, theta)
    }

    /// Check if an angle is within the arc's angular extent
    pub fn contains_angle(&self, theta: f32) -> bool {
        self.angular_offset(theta).abs() <= self.half_width()
    }

    /// Start and end angles of the arc
    pub fn end_angles(&self) -> [f32; 2] {
        [
            normalize_angle(self.center_angle - self.half_width()),
            normalize_angle(self.center_angle + self.half_width()),
        ]
    }

    /// Centers of the two rounded end caps (local coordinates)
    pub fn cap_centers(&self) -> [Vec2; 2] {
        let [start, end] = self.end_angles();
        [
            polar_to_cartesian(self.radius, start),
            polar_to_cartesian(self.radius, end),
        ]
    }
}
