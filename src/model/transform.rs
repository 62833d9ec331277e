use nalgebra::Rotation2;
use serde::{Deserialize, Serialize};

use crate::math::{Point2, Vector2, TOLERANCE};

/// Places a room's local coordinates in world space:
/// `world = position + R(rotation) · (scale ∘ local)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub position: Point2,
    /// Counter-clockwise rotation in radians.
    pub rotation: f64,
    pub scale: Vector2,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Point2::origin(),
            rotation: 0.0,
            scale: Vector2::new(1.0, 1.0),
        }
    }
}

impl Transform {
    #[must_use]
    pub fn translation(x: f64, y: f64) -> Self {
        Self {
            position: Point2::new(x, y),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn to_world(&self, local: &Point2) -> Point2 {
        let scaled = Vector2::new(local.x * self.scale.x, local.y * self.scale.y);
        self.position + Rotation2::new(self.rotation) * scaled
    }

    /// Inverse of [`Transform::to_world`]. A zero scale component maps that
    /// axis to `0` instead of dividing by zero.
    #[must_use]
    pub fn to_local(&self, world: &Point2) -> Point2 {
        let v = Rotation2::new(-self.rotation) * (world - self.position);
        let inv = |s: f64| if s.abs() < TOLERANCE { 0.0 } else { 1.0 / s };
        Point2::new(v.x * inv(self.scale.x), v.y * inv(self.scale.y))
    }

    #[must_use]
    pub fn points_to_world(&self, points: &[Point2]) -> Vec<Point2> {
        points.iter().map(|p| self.to_world(p)).collect()
    }

    #[must_use]
    pub fn points_to_local(&self, points: &[Point2]) -> Vec<Point2> {
        points.iter().map(|p| self.to_local(p)).collect()
    }
}
