use std::collections::HashSet;

use tracing::{debug, error};

use super::matching::{inherit_state, WallState};
use crate::error::{Result, WallError};
use crate::math::angle_2d::outward_normal;
use crate::math::intersect_2d::{line_line_intersect_2d, point_at};
use crate::math::polygon_2d::is_ccw;
use crate::math::{Point2, Vector2};
use crate::model::{Vertex, Wall, WallType, DEFAULT_WALL_HEIGHT};

/// The outline a set of walls was generated from, used to carry per-wall
/// state into a regenerated set.
#[derive(Debug, Clone, Copy)]
pub struct PreviousOutline<'a> {
    pub vertices: &'a [Vertex],
    pub walls: &'a [Wall],
}

/// Generates one mitered wall per edge of `vertices`.
///
/// With a `previous` outline, every new wall inherits type, height and
/// apertures from the previous wall it matches (see [`super::matching`]).
///
/// # Errors
///
/// Returns `WallError::IdentityMatchFailed` if `previous` is given and some
/// new edge matches no previous wall by any strategy.
pub fn generate_walls(
    vertices: &[Vertex],
    thickness: f64,
    previous: Option<PreviousOutline<'_>>,
) -> Result<Vec<Wall>> {
    let mut walls = build_geometry(vertices, thickness);
    let Some(previous) = previous else {
        return Ok(walls);
    };

    let mut unmatched = Vec::new();
    let mut carried: HashSet<_> = HashSet::new();
    for (i, wall) in walls.iter_mut().enumerate() {
        match inherit_state(i, vertices, &previous) {
            Some(WallState {
                wall_type,
                height,
                apertures,
            }) => {
                carried.extend(apertures.iter().map(|a| a.id));
                wall.wall_type = wall_type;
                wall.height = height;
                wall.apertures = apertures;
            }
            None => unmatched.push(i),
        }
    }

    if !unmatched.is_empty() {
        let apertures_at_risk = previous
            .walls
            .iter()
            .flat_map(|w| w.apertures.iter())
            .filter(|a| !carried.contains(&a.id))
            .count();
        error!(edges = ?unmatched, apertures_at_risk, "wall identity match failed");
        return Err(WallError::IdentityMatchFailed {
            edges: unmatched,
            apertures_at_risk,
        }
        .into());
    }

    debug!(walls = walls.len(), "walls regenerated");
    Ok(walls)
}

/// Generates walls with default state for a brand-new outline.
#[must_use]
pub fn generate_fresh_walls(vertices: &[Vertex], thickness: f64) -> Vec<Wall> {
    build_geometry(vertices, thickness)
}

/// Builds wall quads: the inner face runs along the edge, the outer face
/// is the edge offset by `thickness` along its outward normal, and the
/// outer corners are the intersections with the neighbouring offset lines.
fn build_geometry(vertices: &[Vertex], thickness: f64) -> Vec<Wall> {
    let n = vertices.len();
    let points: Vec<Point2> = vertices.iter().map(Vertex::point).collect();
    // Normals point away from the interior whichever way the loop winds.
    let sign = if n < 3 || is_ccw(&points) { 1.0 } else { -1.0 };

    let normals: Vec<Vector2> = (0..n)
        .map(|i| outward_normal(&points[i], &points[(i + 1) % n]) * sign)
        .collect();

    (0..n)
        .map(|i| {
            let prev = (i + n - 1) % n;
            let next = (i + 1) % n;
            let start = points[i];
            let end = points[next];
            let shift = normals[i] * thickness;

            let start_corner = if n < 3 {
                start + shift
            } else {
                miter_corner(start, shift, end - start, points[prev], normals[prev] * thickness, start - points[prev])
            };
            let end_corner = if n < 3 {
                end + shift
            } else {
                let after = points[(i + 2) % n];
                miter_corner(end, shift, end - start, end, normals[next] * thickness, after - end)
            };

            Wall {
                vertex_index: i,
                start_vertex_id: vertices[i].id,
                end_vertex_id: vertices[next].id,
                thickness,
                wall_type: WallType::default(),
                height: DEFAULT_WALL_HEIGHT,
                apertures: Vec::new(),
                segments: Vec::new(),
                start,
                end,
                start_corner,
                end_corner,
            }
        })
        .collect()
}

/// Intersects the offset line through `own + own_shift` (direction
/// `own_dir`) with the neighbour's offset line. Parallel lines fall back to
/// the un-intersected offset point.
fn miter_corner(
    own: Point2,
    own_shift: Vector2,
    own_dir: Vector2,
    other: Point2,
    other_shift: Vector2,
    other_dir: Vector2,
) -> Point2 {
    let p1 = own + own_shift;
    let p2 = other + other_shift;
    match line_line_intersect_2d(&p1, &own_dir, &p2, &other_dir) {
        Some((t, _)) => point_at(&p1, &own_dir, t),
        None => p1,
    }
}
