use serde::{Deserialize, Serialize};

use super::aperture::Aperture;
use super::ids::{SegmentId, VertexId};
use crate::math::distance_2d::distance;
use crate::math::{Point2, Vector2, TOLERANCE};

/// Height given to walls that have no previous wall to inherit from.
pub const DEFAULT_WALL_HEIGHT: f64 = 250.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WallType {
    #[default]
    Exterior,
    InteriorDivision,
}

/// A classified sub-range of a wall, bounded by two entries of the room's
/// segment-vertex pool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WallSegment {
    pub id: SegmentId,
    pub start_vertex_id: VertexId,
    pub end_vertex_id: VertexId,
    pub wall_type: WallType,
}

/// One wall per room edge: `walls[i]` spans `vertices[i] → vertices[i + 1]`.
///
/// `start_vertex_id`/`end_vertex_id` are the key that carries the mutable
/// state (type, height, apertures) across re-derivation of the outline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Wall {
    pub vertex_index: usize,
    pub start_vertex_id: VertexId,
    pub end_vertex_id: VertexId,
    pub thickness: f64,
    pub wall_type: WallType,
    pub height: f64,
    pub apertures: Vec<Aperture>,
    #[serde(default)]
    pub segments: Vec<WallSegment>,
    /// Inner-face start point (room-local).
    pub start: Point2,
    /// Inner-face end point (room-local).
    pub end: Point2,
    /// Mitered outer-face corner at the start.
    pub start_corner: Point2,
    /// Mitered outer-face corner at the end.
    pub end_corner: Point2,
}

impl Wall {
    #[must_use]
    pub fn length(&self) -> f64 {
        distance(&self.start, &self.end)
    }

    /// Unit direction from start to end; `+X` for a degenerate wall.
    #[must_use]
    pub fn direction(&self) -> Vector2 {
        (self.end - self.start)
            .try_normalize(TOLERANCE)
            .unwrap_or_else(|| Vector2::new(1.0, 0.0))
    }

    /// Point at `offset` centimeters from the wall start along the inner face.
    #[must_use]
    pub fn point_at(&self, offset: f64) -> Point2 {
        self.start + self.direction() * offset
    }

    /// Unit normal pointing from the inner face toward the outer corners.
    #[must_use]
    pub fn outward_normal(&self) -> Vector2 {
        let d = self.direction();
        let normal = Vector2::new(d.y, -d.x);
        let outward = (self.start_corner - self.start) + (self.end_corner - self.end);
        if outward.dot(&normal) < 0.0 {
            -normal
        } else {
            normal
        }
    }

    /// Point at `offset` along the wall, moved onto the wall centerline.
    #[must_use]
    pub fn centerline_point_at(&self, offset: f64) -> Point2 {
        self.point_at(offset) + self.outward_normal() * (self.thickness / 2.0)
    }

    /// Wall footprint as `[start, end, end_corner, start_corner]`.
    #[must_use]
    pub fn quad(&self) -> [Point2; 4] {
        [self.start, self.end, self.end_corner, self.start_corner]
    }
}
