//! Splits walls where a merged envelope passes through them and labels
//! each piece exterior or interior division.
//!
//! Work happens in world space so neighbouring rooms can be compared;
//! the resulting segment vertices are stored room-local.

use tracing::debug;

use crate::config::KernelConfig;
use crate::math::angle_2d::are_parallel;
use crate::math::distance_2d::{distance, distance_along, point_to_segment_dist};
use crate::math::Point2;
use crate::model::{Room, SegmentId, Vertex, VertexId, WallSegment, WallType};

/// Tolerances of the classifier, in centimeters and degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClassifyParams {
    pub split_band: f64,
    pub exterior_band: f64,
    pub angle_tolerance_deg: f64,
    pub coincidence: f64,
}

impl ClassifyParams {
    #[must_use]
    pub fn from_config(config: &KernelConfig) -> Self {
        Self {
            split_band: config.segment_split_band,
            exterior_band: config.exterior_band,
            angle_tolerance_deg: config.exterior_angle_deg,
            coincidence: config.coincidence_tolerance,
        }
    }
}

impl Default for ClassifyParams {
    fn default() -> Self {
        Self::from_config(&KernelConfig::default())
    }
}

/// Segments of one wall plus their extent as fractions of the wall length.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClassifiedWall {
    pub segments: Vec<WallSegment>,
    pub bounds: Vec<(f64, f64)>,
}

/// Result of classifying every wall of one room.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SegmentClassification {
    /// Original vertices followed by the minted split points (room-local).
    pub segment_vertices: Vec<Vertex>,
    /// Indexed like `room.walls`.
    pub walls: Vec<ClassifiedWall>,
}

/// Classifies the walls of `room` against merged envelope polygons given in
/// world coordinates.
///
/// A wall is split at every envelope vertex within `split_band` of its
/// interior. A piece is exterior when its midpoint lies within
/// `exterior_band` of an envelope edge running parallel to it; otherwise it
/// is an interior division. Rooms whose envelope is missing classify every
/// piece as interior.
#[must_use]
pub fn classify_segments(room: &Room, envelopes: &[Vec<Point2>], params: &ClassifyParams) -> SegmentClassification {
    let n = room.vertices.len();
    let mut pool: Vec<Vertex> = room.vertices.clone();
    let mut walls = Vec::with_capacity(room.walls.len());
    let angle_tol = params.angle_tolerance_deg.to_radians();

    for wall in &room.walls {
        let i = wall.vertex_index;
        if n < 2 || i >= n {
            walls.push(ClassifiedWall::default());
            continue;
        }
        let (sv, ev) = (room.vertices[i], room.vertices[(i + 1) % n]);
        let a = room.transform.to_world(&sv.point());
        let b = room.transform.to_world(&ev.point());
        let length = distance(&a, &b);
        if length < params.coincidence {
            walls.push(ClassifiedWall::default());
            continue;
        }

        let cuts = split_positions(&a, &b, length, envelopes, params);

        let mut ids: Vec<VertexId> = Vec::with_capacity(cuts.len() + 2);
        ids.push(sv.id);
        for &t in &cuts {
            let f = t / length;
            let local = sv.point() + (ev.point() - sv.point()) * f;
            let minted = Vertex::at(local);
            ids.push(minted.id);
            pool.push(minted);
        }
        ids.push(ev.id);

        let mut fractions = Vec::with_capacity(cuts.len() + 2);
        fractions.push(0.0);
        fractions.extend(cuts.iter().map(|t| t / length));
        fractions.push(1.0);

        let mut classified = ClassifiedWall::default();
        for k in 0..fractions.len() - 1 {
            let (f0, f1) = (fractions[k], fractions[k + 1]);
            let mid = a + (b - a) * ((f0 + f1) / 2.0);
            let wall_type = if touches_envelope(&mid, &a, &b, envelopes, params.exterior_band, angle_tol) {
                WallType::Exterior
            } else {
                WallType::InteriorDivision
            };
            classified.segments.push(WallSegment {
                id: SegmentId::fresh(),
                start_vertex_id: ids[k],
                end_vertex_id: ids[k + 1],
                wall_type,
            });
            classified.bounds.push((f0, f1));
        }
        walls.push(classified);
    }

    debug!(
        room = %room.name,
        segments = walls.iter().map(|w| w.segments.len()).sum::<usize>(),
        minted = pool.len() - n,
        "walls classified"
    );
    SegmentClassification {
        segment_vertices: pool,
        walls,
    }
}

/// Sorted distances along `a → b` at which envelope vertices cut the wall.
fn split_positions(a: &Point2, b: &Point2, length: f64, envelopes: &[Vec<Point2>], params: &ClassifyParams) -> Vec<f64> {
    let mut cuts: Vec<f64> = envelopes
        .iter()
        .flatten()
        .filter(|q| point_to_segment_dist(q, a, b) <= params.split_band)
        .map(|q| distance_along(q, a, b))
        .filter(|&t| t > params.coincidence && t < length - params.coincidence)
        .collect();
    cuts.sort_by(f64::total_cmp);
    cuts.dedup_by(|x, y| (*x - *y).abs() < params.coincidence);
    cuts
}

fn touches_envelope(mid: &Point2, a: &Point2, b: &Point2, envelopes: &[Vec<Point2>], band: f64, angle_tol: f64) -> bool {
    let dir = b - a;
    envelopes.iter().any(|poly| {
        let m = poly.len();
        (0..m).any(|j| {
            let (p, q) = (&poly[j], &poly[(j + 1) % m]);
            point_to_segment_dist(mid, p, q) <= band && are_parallel(&dir, &(q - p), angle_tol)
        })
    })
}

/// Stores a classification on its room: sets each wall's segments and binds
/// every aperture to the segment containing its center. Returns the segment
/// vertex pool.
pub fn apply_classification(room: &mut Room, classification: SegmentClassification) -> Vec<Vertex> {
    for (wall, classified) in room.walls.iter_mut().zip(classification.walls) {
        let length = wall.length();
        for aperture in &mut wall.apertures {
            let (s, e) = aperture.absolute_range(length);
            let center = if length > 0.0 { (s + e) / 2.0 / length } else { 0.0 };
            aperture.segment_id = classified
                .bounds
                .iter()
                .position(|&(f0, f1)| center >= f0 && center <= f1)
                .map(|k| classified.segments[k].id);
        }
        wall.segments = classified.segments;
    }
    classification.segment_vertices
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::model::{Aperture, LevelId, Transform};

    fn rect(x0: f64, y0: f64, x1: f64, y1: f64) -> Vec<Point2> {
        vec![
            Point2::new(x0, y0),
            Point2::new(x1, y0),
            Point2::new(x1, y1),
            Point2::new(x0, y1),
        ]
    }

    #[test]
    fn lone_room_walls_are_exterior() {
        let room = Room::rectangle(LevelId(0), 1, 400.0, 300.0, 15.0);
        let result = classify_segments(&room, &[room.world_points()], &ClassifyParams::default());
        assert_eq!(result.walls.len(), 4);
        for wall in &result.walls {
            assert_eq!(wall.segments.len(), 1);
            assert_eq!(wall.segments[0].wall_type, WallType::Exterior);
        }
        assert_eq!(result.segment_vertices.len(), 4);
    }

    #[test]
    fn shared_wall_is_split_and_labelled() {
        // Room spans x 0..400; the merged envelope covers x 0..600 but only
        // y 0..200 beyond x = 400, so the right wall is half shared.
        let room = Room::rectangle(LevelId(0), 1, 400.0, 300.0, 15.0);
        let envelope = vec![
            Point2::new(0.0, 0.0),
            Point2::new(600.0, 0.0),
            Point2::new(600.0, 200.0),
            Point2::new(400.0, 200.0),
            Point2::new(400.0, 300.0),
            Point2::new(0.0, 300.0),
        ];
        let result = classify_segments(&room, &[envelope], &ClassifyParams::default());
        let right = &result.walls[1];
        assert_eq!(right.segments.len(), 2);
        assert_eq!(right.segments[0].wall_type, WallType::InteriorDivision);
        assert_eq!(right.segments[1].wall_type, WallType::Exterior);
        assert_eq!(result.segment_vertices.len(), 5);
        assert_eq!(right.segments[0].end_vertex_id, right.segments[1].start_vertex_id);
    }

    #[test]
    fn classification_uses_world_coordinates() {
        let room = Room::rectangle(LevelId(0), 1, 400.0, 300.0, 15.0)
            .with_transform(Transform::translation(1000.0, 0.0));
        let far_away = rect(0.0, 0.0, 400.0, 300.0);
        let result = classify_segments(&room, &[far_away], &ClassifyParams::default());
        assert!(result
            .walls
            .iter()
            .all(|w| w.segments[0].wall_type == WallType::InteriorDivision));
    }

    #[test]
    fn apertures_bind_to_containing_segment() {
        let mut room = Room::rectangle(LevelId(0), 1, 400.0, 300.0, 15.0);
        // Right wall runs (400,0) → (400,300); window centered at 250.
        room.walls[1].apertures.push(Aperture::window(60.0, 100.0, 220.0));
        let envelope = vec![
            Point2::new(0.0, 0.0),
            Point2::new(600.0, 0.0),
            Point2::new(600.0, 200.0),
            Point2::new(400.0, 200.0),
            Point2::new(400.0, 300.0),
            Point2::new(0.0, 300.0),
        ];
        let result = classify_segments(&room, &[envelope], &ClassifyParams::default());
        let pool = apply_classification(&mut room, result);
        assert_eq!(pool.len(), 5);
        let wall = &room.walls[1];
        assert_eq!(wall.apertures[0].segment_id, Some(wall.segments[1].id));
    }
}
