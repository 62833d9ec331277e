use std::collections::HashMap;

use tracing::{debug, warn};

use crate::error::Result;
use crate::math::distance_2d::{distance, distance_along, point_to_segment_dist};
use crate::math::Point2;
use crate::model::{Constraint, Room, Vertex, VertexId};

/// Inserts the vertices of an envelope reference polygon (world
/// coordinates) that lie on one of the room's edges but are not yet a
/// vertex of the room.
///
/// Existing vertices keep their identity and relative order; new vertices
/// are placed exactly on the room-local edge. Walls are regenerated so the
/// split walls keep their state, and vertex-indexed constraints follow
/// their vertices. Returns the number of inserted vertices.
///
/// # Errors
///
/// Propagates a wall identity-match failure, in which case the room is
/// left untouched.
pub fn insert_envelope_vertices(room: &mut Room, reference: &[Point2], tolerance: f64) -> Result<usize> {
    let n = room.vertices.len();
    if n < 3 || reference.is_empty() {
        return Ok(0);
    }
    let world = room.world_points();

    let mut next: Vec<Vertex> = Vec::with_capacity(n + reference.len());
    let mut inserted = 0;
    for i in 0..n {
        let (a, b) = (world[i], world[(i + 1) % n]);
        let length = distance(&a, &b);
        next.push(room.vertices[i]);
        if length <= 2.0 * tolerance {
            continue;
        }

        let mut cuts: Vec<f64> = reference
            .iter()
            .filter(|q| point_to_segment_dist(q, &a, &b) <= tolerance)
            .filter(|q| world.iter().all(|w| distance(w, q) > tolerance))
            .map(|q| distance_along(q, &a, &b))
            .filter(|&t| t > tolerance && t < length - tolerance)
            .collect();
        cuts.sort_by(f64::total_cmp);
        cuts.dedup_by(|x, y| (*x - *y).abs() <= tolerance);

        let (la, lb) = (room.vertices[i].point(), room.vertices[(i + 1) % n].point());
        for t in cuts {
            next.push(Vertex::at(la + (lb - la) * (t / length)));
            inserted += 1;
        }
    }

    if inserted == 0 {
        return Ok(0);
    }

    let previous = room.vertices.clone();
    let constraints = remap_constraints(&room.constraints, &previous, &next);
    room.replace_vertices(next, &previous)?;
    room.constraints = constraints;
    debug!(room = %room.name, inserted, vertices = room.vertices.len(), "envelope vertices inserted");
    Ok(inserted)
}

/// Carries constraints from one vertex loop to another by identity.
///
/// Vertex-indexed constraints follow their vertices. Edge-indexed
/// constraints follow their edge when both endpoints are still adjacent;
/// otherwise (the edge was split or removed) they are disabled.
#[must_use]
pub fn remap_constraints(constraints: &[Constraint], previous: &[Vertex], next: &[Vertex]) -> Vec<Constraint> {
    let position: HashMap<VertexId, usize> = next.iter().enumerate().map(|(i, v)| (v.id, i)).collect();
    let (pn, nn) = (previous.len(), next.len());

    constraints
        .iter()
        .map(|c| {
            let mut out = c.clone();
            let mapped: Option<Vec<usize>> = if c.kind.references_edges() {
                c.indices
                    .iter()
                    .map(|&e| {
                        let from = previous.get(e)?;
                        let to = previous.get((e + 1) % pn.max(1))?;
                        let i = *position.get(&from.id)?;
                        (next[(i + 1) % nn].id == to.id).then_some(i)
                    })
                    .collect()
            } else {
                c.indices
                    .iter()
                    .map(|&v| previous.get(v).and_then(|pv| position.get(&pv.id).copied()))
                    .collect()
            };
            match mapped {
                Some(indices) => out.indices = indices,
                None if c.enabled => {
                    warn!(constraint = %c.id, kind = ?c.kind, "constraint no longer addresses its geometry; disabled");
                    out.enabled = false;
                }
                None => {}
            }
            out
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::model::{Aperture, LevelId, Transform};

    #[test]
    fn inserts_only_on_edge_points() {
        let mut room = Room::rectangle(LevelId(0), 1, 400.0, 300.0, 15.0);
        let ids: Vec<_> = room.vertices.iter().map(|v| v.id).collect();
        let contracted = vec![
            Point2::new(0.0, 0.0),
            Point2::new(400.0, 0.0),
            Point2::new(400.0, 200.0),
            Point2::new(600.0, 200.0),
            Point2::new(600.0, 300.0),
            Point2::new(0.0, 300.0),
        ];
        let inserted = insert_envelope_vertices(&mut room, &contracted, 1.0).unwrap();
        assert_eq!(inserted, 1);
        assert_eq!(room.vertices.len(), 5);
        assert_eq!(room.walls.len(), 5);
        // Original identities survive in order.
        let kept: Vec<_> = room.vertices.iter().map(|v| v.id).filter(|id| ids.contains(id)).collect();
        assert_eq!(kept, ids);
        assert!((room.vertices[2].y - 200.0).abs() < 1e-9);
    }

    #[test]
    fn nothing_to_insert_is_a_no_op() {
        let mut room = Room::rectangle(LevelId(0), 1, 400.0, 300.0, 15.0);
        let before = room.clone();
        let own = room.world_points();
        let inserted = insert_envelope_vertices(&mut room, &own, 1.0).unwrap();
        assert_eq!(inserted, 0);
        assert_eq!(room, before);
    }

    #[test]
    fn split_wall_keeps_its_door() {
        let mut room = Room::rectangle(LevelId(0), 1, 400.0, 300.0, 15.0)
            .with_transform(Transform::translation(100.0, 50.0));
        room.walls[0].apertures.push(Aperture::door(90.0, 210.0, 250.0));
        let contracted = vec![Point2::new(300.0, 50.0)];
        insert_envelope_vertices(&mut room, &contracted, 1.0).unwrap();
        assert_eq!(room.walls.len(), 5);
        assert!(room.walls[0].apertures.is_empty());
        assert_eq!(room.walls[1].apertures.len(), 1);
        assert!((room.walls[1].apertures[0].distance - 50.0).abs() < 1e-9);
    }

    #[test]
    fn constraints_follow_vertices_and_split_edges_disable() {
        let mut room = Room::rectangle(LevelId(0), 1, 400.0, 300.0, 15.0);
        room.constraints = vec![
            Constraint::horizontal(2, 3),
            Constraint::perpendicular(1, 2),
            Constraint::parallel(0, 2),
        ];
        insert_envelope_vertices(&mut room, &[Point2::new(200.0, 0.0)], 1.0).unwrap();
        assert_eq!(room.constraints[0].indices, vec![3, 4]);
        assert!(room.constraints[0].enabled);
        assert_eq!(room.constraints[1].indices, vec![2, 3]);
        assert!(room.constraints[1].enabled);
        assert!(!room.constraints[2].enabled);
    }
}
