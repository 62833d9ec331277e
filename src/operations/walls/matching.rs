//! Identity matching between a regenerated wall set and the walls it
//! replaces. Strategies are tried in order:
//!
//! 1. same start/end vertex ids,
//! 2. same index when the vertex count did not change,
//! 3. same endpoint positions,
//! 4. the new edge lies inside a previous wall's span (a split), in which
//!    case the previous wall's apertures are partitioned by position.

use tracing::{debug, warn};

use super::generate::PreviousOutline;
use crate::math::distance_2d::{distance, distance_along, point_to_segment_dist};
use crate::math::Point2;
use crate::model::{Anchor, Aperture, Vertex, Wall, WallType};

/// Endpoint equality for positional matching.
const POSITION_TOLERANCE: f64 = 1e-6;
/// Distance from a previous wall's line within which a split endpoint still
/// counts as lying on it.
const SPAN_TOLERANCE: f64 = 1e-3;

/// The per-wall state that survives regeneration.
#[derive(Debug, Clone)]
pub(super) struct WallState {
    pub wall_type: WallType,
    pub height: f64,
    pub apertures: Vec<Aperture>,
}

impl WallState {
    fn whole(wall: &Wall) -> Self {
        Self {
            wall_type: wall.wall_type,
            height: wall.height,
            apertures: wall.apertures.clone(),
        }
    }
}

/// Finds the state new edge `i` inherits, or `None` when no strategy matches.
pub(super) fn inherit_state(i: usize, vertices: &[Vertex], previous: &PreviousOutline<'_>) -> Option<WallState> {
    let n = vertices.len();
    let (start, end) = (&vertices[i], &vertices[(i + 1) % n]);

    if let Some(wall) = previous
        .walls
        .iter()
        .find(|w| w.start_vertex_id == start.id && w.end_vertex_id == end.id)
    {
        return Some(WallState::whole(wall));
    }

    if previous.vertices.len() == n {
        if let Some(wall) = previous.walls.iter().find(|w| w.vertex_index == i) {
            return Some(WallState::whole(wall));
        }
    }

    let (a, b) = (start.point(), end.point());
    if let Some(wall) = previous.walls.iter().find(|w| {
        previous_span(w, previous.vertices)
            .is_some_and(|(pa, pb)| distance(&pa, &a) < POSITION_TOLERANCE && distance(&pb, &b) < POSITION_TOLERANCE)
    }) {
        debug!(edge = i, previous = wall.vertex_index, "wall matched by position");
        return Some(WallState::whole(wall));
    }

    previous.walls.iter().find_map(|w| {
        let (pa, pb) = previous_span(w, previous.vertices)?;
        split_state(w, pa, pb, a, b, i)
    })
}

/// Inner-face endpoints of a previous wall, taken from the previous outline.
fn previous_span(wall: &Wall, vertices: &[Vertex]) -> Option<(Point2, Point2)> {
    let n = vertices.len();
    if n == 0 {
        return None;
    }
    let start = vertices.get(wall.vertex_index)?;
    let end = &vertices[(wall.vertex_index + 1) % n];
    Some((start.point(), end.point()))
}

/// Checks whether `a → b` is a forward sub-span of the previous wall
/// `pa → pb` and, if so, keeps the apertures that fall entirely inside it.
fn split_state(wall: &Wall, pa: Point2, pb: Point2, a: Point2, b: Point2, edge: usize) -> Option<WallState> {
    let length = distance(&pa, &pb);
    if length < POSITION_TOLERANCE {
        return None;
    }
    if point_to_segment_dist(&a, &pa, &pb) > SPAN_TOLERANCE || point_to_segment_dist(&b, &pa, &pb) > SPAN_TOLERANCE {
        return None;
    }
    let d0 = distance_along(&a, &pa, &pb);
    let d1 = distance_along(&b, &pa, &pb);
    if d1 - d0 < POSITION_TOLERANCE {
        return None;
    }

    let mut apertures = Vec::new();
    for aperture in &wall.apertures {
        let (s, e) = aperture.absolute_range(length);
        if s >= d0 - SPAN_TOLERANCE && e <= d1 + SPAN_TOLERANCE {
            let mut moved = aperture.clone();
            moved.anchor = Anchor::Start;
            moved.distance = (s - d0).max(0.0);
            moved.segment_id = None;
            apertures.push(moved);
        } else if s < d1 && e > d0 {
            warn!(
                aperture = %aperture.id,
                edge,
                "aperture straddles a wall split and is dropped from this part"
            );
        }
    }

    debug!(edge, previous = wall.vertex_index, d0, d1, kept = apertures.len(), "wall matched as split");
    Some(WallState {
        wall_type: wall.wall_type,
        height: wall.height,
        apertures,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operations::walls::generate_fresh_walls;

    fn square() -> Vec<Vertex> {
        [(0.0, 0.0), (400.0, 0.0), (400.0, 300.0), (0.0, 300.0)]
            .iter()
            .map(|&(x, y)| Vertex::new(x, y))
            .collect()
    }

    #[test]
    fn reversed_edge_is_not_a_split() {
        let verts = square();
        let walls = generate_fresh_walls(&verts, 15.0);
        let state = split_state(
            &walls[0],
            verts[0].point(),
            verts[1].point(),
            Point2::new(300.0, 0.0),
            Point2::new(100.0, 0.0),
            0,
        );
        assert!(state.is_none());
    }

    #[test]
    fn straddling_aperture_is_dropped() {
        let verts = square();
        let mut walls = generate_fresh_walls(&verts, 15.0);
        walls[0].apertures.push(Aperture::door(90.0, 210.0, 150.0));
        let left = split_state(
            &walls[0],
            verts[0].point(),
            verts[1].point(),
            Point2::new(0.0, 0.0),
            Point2::new(200.0, 0.0),
            0,
        )
        .unwrap_or_else(|| panic!("expected split"));
        assert!(left.apertures.is_empty());
    }

    #[test]
    fn off_line_edge_is_not_a_split() {
        let verts = square();
        let walls = generate_fresh_walls(&verts, 15.0);
        assert!(split_state(
            &walls[0],
            verts[0].point(),
            verts[1].point(),
            Point2::new(0.0, 0.0),
            Point2::new(200.0, 5.0),
            0,
        )
        .is_none());
    }
}
