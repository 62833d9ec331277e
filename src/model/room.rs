use serde::{Deserialize, Serialize};

use super::aperture::Aperture;
use super::constraint::Constraint;
use super::ids::{ApertureId, LevelId, VertexId};
use super::transform::Transform;
use super::wall::Wall;
use crate::error::Result;
use crate::math::polygon_2d::{centroid, dedup_points, to_ccw};
use crate::math::{Point2, TOLERANCE};
use crate::operations::walls::{generate_fresh_walls, generate_walls, PreviousOutline};

/// A room-local point with a stable identity.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Vertex {
    pub id: VertexId,
    pub x: f64,
    pub y: f64,
}

impl Vertex {
    /// Creates a vertex with a freshly minted identity.
    #[must_use]
    pub fn new(x: f64, y: f64) -> Self {
        Self {
            id: VertexId::fresh(),
            x,
            y,
        }
    }

    #[must_use]
    pub fn at(point: Point2) -> Self {
        Self::new(point.x, point.y)
    }

    #[must_use]
    pub fn point(&self) -> Point2 {
        Point2::new(self.x, self.y)
    }
}

/// Outputs of the level-wide envelope pass, stored room-local.
///
/// Pure functions of the authoritative state of every room on the level;
/// `fingerprint` identifies that state. Replaced wholesale, never edited,
/// and never a source of wall geometry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DerivedGeometry {
    pub fingerprint: u64,
    pub centerline: Vec<Point2>,
    pub envelope: Vec<Point2>,
    pub inner_boundary: Vec<Point2>,
    pub contracted: Vec<Point2>,
    /// Original vertices plus envelope crossing points.
    pub segment_vertices: Vec<Vertex>,
}

/// A room: a counter-clockwise loop of vertices (the inner wall faces),
/// one wall per edge, and the constraints the user placed on its shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Room {
    pub name: String,
    pub level_id: LevelId,
    /// Monotonic creation stamp; the older room wins paired-door ties.
    pub created_at: u64,
    pub vertices: Vec<Vertex>,
    pub walls: Vec<Wall>,
    pub constraints: Vec<Constraint>,
    pub transform: Transform,
    pub wall_thickness: f64,
    #[serde(default)]
    pub derived: Option<DerivedGeometry>,
}

impl Room {
    /// Creates a room from an outline in room-local coordinates.
    ///
    /// The outline is deduplicated and rewound counter-clockwise; every
    /// vertex receives a fresh identity and every edge a fresh wall.
    #[must_use]
    pub fn new(level_id: LevelId, created_at: u64, outline: &[Point2], wall_thickness: f64) -> Self {
        let points = to_ccw(&dedup_points(outline, TOLERANCE * 10.0));
        let vertices: Vec<Vertex> = points.into_iter().map(Vertex::at).collect();
        let walls = generate_fresh_walls(&vertices, wall_thickness);
        Self {
            name: String::new(),
            level_id,
            created_at,
            vertices,
            walls,
            constraints: Vec::new(),
            transform: Transform::default(),
            wall_thickness,
            derived: None,
        }
    }

    /// Axis-aligned rectangle with its lower-left corner at the local origin.
    #[must_use]
    pub fn rectangle(level_id: LevelId, created_at: u64, width: f64, depth: f64, wall_thickness: f64) -> Self {
        let outline = [
            Point2::new(0.0, 0.0),
            Point2::new(width, 0.0),
            Point2::new(width, depth),
            Point2::new(0.0, depth),
        ];
        Self::new(level_id, created_at, &outline, wall_thickness)
    }

    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    #[must_use]
    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self
    }

    #[must_use]
    pub fn points(&self) -> Vec<Point2> {
        self.vertices.iter().map(Vertex::point).collect()
    }

    #[must_use]
    pub fn world_points(&self) -> Vec<Point2> {
        self.vertices
            .iter()
            .map(|v| self.transform.to_world(&v.point()))
            .collect()
    }

    #[must_use]
    pub fn world_centroid(&self) -> Point2 {
        centroid(&self.world_points())
    }

    #[must_use]
    pub fn vertex_index(&self, id: VertexId) -> Option<usize> {
        self.vertices.iter().position(|v| v.id == id)
    }

    /// Endpoints of edge `i` (room-local), wrapping at the end of the loop.
    #[must_use]
    pub fn edge(&self, i: usize) -> Option<(Point2, Point2)> {
        let n = self.vertices.len();
        if i >= n {
            return None;
        }
        Some((self.vertices[i].point(), self.vertices[(i + 1) % n].point()))
    }

    #[must_use]
    pub fn enabled_constraint_count(&self) -> usize {
        self.constraints.iter().filter(|c| c.enabled).count()
    }

    /// Locates an aperture by identity, returning its wall index.
    #[must_use]
    pub fn find_aperture(&self, id: ApertureId) -> Option<(usize, &Aperture)> {
        self.walls.iter().enumerate().find_map(|(wi, wall)| {
            wall.apertures.iter().find(|a| a.id == id).map(|a| (wi, a))
        })
    }

    /// Drops the derived envelope data; it is stale once any vertex moves.
    pub fn invalidate_derived(&mut self) {
        self.derived = None;
    }

    /// Moves a vertex and regenerates the walls, keeping per-wall state.
    ///
    /// # Errors
    ///
    /// Propagates a wall identity-match failure (which cannot happen for a
    /// pure move, since the vertex count is unchanged).
    pub fn move_vertex(&mut self, id: VertexId, to: Point2) -> Result<bool> {
        let Some(index) = self.vertex_index(id) else {
            return Ok(false);
        };
        let previous_vertices = self.vertices.clone();
        let mut vertices = self.vertices.clone();
        vertices[index].x = to.x;
        vertices[index].y = to.y;
        self.replace_vertices(vertices, &previous_vertices)?;
        Ok(true)
    }

    /// Replaces the vertex loop and regenerates walls against the previous
    /// loop. On error the room is left untouched.
    ///
    /// # Errors
    ///
    /// Returns `WallError::IdentityMatchFailed` if a new edge cannot be
    /// matched to a previous wall.
    pub fn replace_vertices(&mut self, vertices: Vec<Vertex>, previous_vertices: &[Vertex]) -> Result<()> {
        let walls = generate_walls(
            &vertices,
            self.wall_thickness,
            Some(PreviousOutline {
                vertices: previous_vertices,
                walls: &self.walls,
            }),
        )?;
        self.vertices = vertices;
        self.walls = walls;
        self.invalidate_derived();
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::model::Aperture;

    #[test]
    fn new_room_is_ccw_with_one_wall_per_edge() {
        let cw = [
            Point2::new(0.0, 0.0),
            Point2::new(0.0, 300.0),
            Point2::new(400.0, 300.0),
            Point2::new(400.0, 0.0),
        ];
        let room = Room::new(LevelId(0), 1, &cw, 15.0);
        assert!(crate::math::polygon_2d::is_ccw(&room.points()));
        assert_eq!(room.walls.len(), room.vertices.len());
        for (i, wall) in room.walls.iter().enumerate() {
            assert_eq!(wall.vertex_index, i);
            assert_eq!(wall.start_vertex_id, room.vertices[i].id);
        }
    }

    #[test]
    fn wall_centerline_sits_half_a_thickness_outside() {
        let room = Room::rectangle(LevelId(0), 1, 400.0, 300.0, 20.0);
        // Wall 1 runs (400,0) → (400,300) with its outer face at x = 420.
        let wall = &room.walls[1];
        let n = wall.outward_normal();
        assert!((n.x - 1.0).abs() < 1e-12 && n.y.abs() < 1e-12);
        let p = wall.centerline_point_at(150.0);
        assert!((p.x - 410.0).abs() < 1e-9);
        assert!((p.y - 150.0).abs() < 1e-9);
    }

    #[test]
    fn move_vertex_keeps_apertures_and_clears_derived() {
        let mut room = Room::rectangle(LevelId(0), 1, 400.0, 300.0, 15.0);
        room.walls[0].apertures.push(Aperture::window(100.0, 120.0, 50.0));
        room.derived = Some(DerivedGeometry::default());
        let id = room.vertices[2].id;
        assert!(room.move_vertex(id, Point2::new(450.0, 320.0)).unwrap());
        assert_eq!(room.walls[0].apertures.len(), 1);
        assert!(room.derived.is_none());
        assert!((room.vertices[2].x - 450.0).abs() < 1e-12);
    }

    #[test]
    fn move_unknown_vertex_is_noop() {
        let mut room = Room::rectangle(LevelId(0), 1, 400.0, 300.0, 15.0);
        assert!(!room.move_vertex(VertexId::fresh(), Point2::origin()).unwrap());
    }
}
