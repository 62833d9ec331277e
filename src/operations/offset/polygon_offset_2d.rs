use tracing::warn;

use crate::error::{GeometryError, Result};
use crate::math::intersect_2d::{line_line_intersect_2d, point_at, segment_segment_intersect_2d};
use crate::math::polygon_2d::{
    dedup_points, left_normal, remove_collinear, segment_direction, signed_area, to_ccw,
};
use crate::math::{Point2, Vector2, TOLERANCE};

/// When `cos(angle between consecutive edges) < this`, use a flat cap
/// instead of a miter join. Only for near-180° reversals (> ~169°).
const FLAT_CAP_COS: f64 = -0.98;

/// Corner treatment where two offset edges meet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JoinType {
    /// Sharp corner, beveled once the miter exceeds the miter limit.
    #[default]
    Miter,
    /// Every outward corner is cut flat.
    Bevel,
}

/// Offsets a closed polygon along its outward edge normals.
///
/// Positive distance grows the polygon, negative shrinks it. The input is
/// rewound counter-clockwise first, so the sign never depends on the
/// caller's winding.
///
/// # Algorithm
///
/// 1. **Phase A**: Offset each edge along its outward normal
/// 2. **Phase B**: Intersect consecutive offset lines to form corners. A
///    corner whose miter would extend further than `miter_limit × |d|`
///    from the original vertex is beveled (two points).
/// 3. **Phase C**: Walk the raw polygon, split at self-intersections and
///    keep the loop whose winding matches the input
#[derive(Debug)]
pub struct PolygonOffset2D {
    points: Vec<Point2>,
    distance: f64,
    join: JoinType,
    miter_limit: f64,
}

impl PolygonOffset2D {
    /// Creates a mitered offset with the SVG-default miter limit of 4.
    #[must_use]
    pub fn new(points: Vec<Point2>, distance: f64) -> Self {
        Self {
            points,
            distance,
            join: JoinType::Miter,
            miter_limit: 4.0,
        }
    }

    #[must_use]
    pub fn with_join(mut self, join: JoinType) -> Self {
        self.join = join;
        self
    }

    #[must_use]
    pub fn with_miter_limit(mut self, miter_limit: f64) -> Self {
        self.miter_limit = miter_limit.max(1.0);
        self
    }

    /// Executes the offset.
    ///
    /// # Errors
    ///
    /// - `GeometryError::Degenerate` if fewer than 3 distinct points remain
    /// - `GeometryError::Degenerate` if an inward offset collapses the polygon
    pub fn execute(&self) -> Result<Vec<Point2>> {
        let points = to_ccw(&dedup_points(&self.points, TOLERANCE * 10.0));
        if points.len() < 3 {
            return Err(GeometryError::Degenerate(
                "at least 3 distinct points are required for polygon offset".to_owned(),
            )
            .into());
        }

        if self.distance.abs() < TOLERANCE {
            return Ok(points);
        }

        // Phase A & B: Build raw offset polygon.
        let raw = self.build_raw_offset(&points)?;

        // Phase C: Remove self-intersections.
        let trimmed = trim_closed_loops(&raw, 1.0);
        if trimmed.len() < 3 {
            return Err(GeometryError::Degenerate(
                "offset collapsed to fewer than 3 points".to_owned(),
            )
            .into());
        }

        let original_area = signed_area(&points);
        let result_area = signed_area(&trimmed);
        if result_area <= TOLERANCE {
            return Err(GeometryError::Degenerate("offset inverted the polygon".to_owned()).into());
        }
        if self.distance < 0.0 && result_area > original_area {
            return Err(GeometryError::Degenerate(
                "offset collapsed (passed through center)".to_owned(),
            )
            .into());
        }

        Ok(trimmed)
    }

    fn effective_limit(&self) -> f64 {
        match self.join {
            JoinType::Miter => self.miter_limit,
            JoinType::Bevel => 1.0 + 1e-6,
        }
    }

    fn build_raw_offset(&self, points: &[Point2]) -> Result<Vec<Point2>> {
        let n = points.len();

        // Phase A: Compute offset edges. Outward is the right-hand side of a
        // CCW loop, i.e. the left normal scaled by -distance.
        let mut offset_segments: Vec<(Point2, Point2)> = Vec::with_capacity(n);
        let mut directions: Vec<Vector2> = Vec::with_capacity(n);
        for i in 0..n {
            let j = (i + 1) % n;
            let dir = segment_direction(&points[i], &points[j])?;
            let shift = left_normal(dir) * -self.distance;
            offset_segments.push((points[i] + shift, points[j] + shift));
            directions.push(dir);
        }

        // Phase B: Build raw polygon by intersecting consecutive offset edges.
        let limit = self.effective_limit() * self.distance.abs();
        let mut raw = Vec::with_capacity(n * 2);
        for i in 0..n {
            let prev = if i == 0 { n - 1 } else { i - 1 };
            push_corner(
                &mut raw,
                &offset_segments[prev],
                &offset_segments[i],
                &directions[prev],
                &directions[i],
                &points[i],
                limit,
            );
        }
        Ok(raw)
    }
}

/// Offsets `points` and returns the input unchanged when the offset is
/// degenerate or collapses.
#[must_use]
pub fn offset_polygon(points: &[Point2], distance: f64, join: JoinType, miter_limit: f64) -> Vec<Point2> {
    match PolygonOffset2D::new(points.to_vec(), distance)
        .with_join(join)
        .with_miter_limit(miter_limit)
        .execute()
    {
        Ok(result) => result,
        Err(e) => {
            warn!(distance, vertices = points.len(), error = %e, "offset failed; keeping input polygon");
            points.to_vec()
        }
    }
}

/// Pushes corner point(s) into `raw`.
///
/// - Near-antiparallel edges: flat cap (two points).
/// - Miter further than `limit` from the original corner: bevel (two points).
/// - Normal corners: single miter intersection point.
fn push_corner(
    raw: &mut Vec<Point2>,
    seg_prev: &(Point2, Point2),
    seg_next: &(Point2, Point2),
    dir_prev: &Vector2,
    dir_next: &Vector2,
    original_corner: &Point2,
    limit: f64,
) {
    if dir_prev.dot(dir_next) < FLAT_CAP_COS {
        raw.push(seg_prev.1);
        raw.push(seg_next.0);
        return;
    }

    let corner = intersect_offset_lines(seg_prev, seg_next);
    if (corner - original_corner).norm() > limit + TOLERANCE {
        raw.push(seg_prev.1);
        raw.push(seg_next.0);
    } else {
        raw.push(corner);
    }
}

/// Intersects two offset lines and returns the corner point.
///
/// Parallel (collinear) neighbours share the shifted corner, which is the
/// end of the previous offset edge.
fn intersect_offset_lines(seg_prev: &(Point2, Point2), seg_next: &(Point2, Point2)) -> Point2 {
    let d_prev = seg_prev.1 - seg_prev.0;
    let d_next = seg_next.1 - seg_next.0;
    match line_line_intersect_2d(&seg_prev.1, &d_prev, &seg_next.0, &d_next) {
        Some((t, _u)) => point_at(&seg_prev.1, &d_prev, t),
        None => seg_prev.1,
    }
}

/// Splits a closed polygon at the intersection of edges `i` and `j` into two loops.
///
/// Assumes `i < j`:
/// - Sub-path A: `[intersection, P(i+1), ..., P(j)]`
/// - Sub-path B: `[intersection, P(j+1), ..., P(i)]` (wrapping around)
fn split_at_intersection(
    points: &[Point2],
    seg_i: usize,
    seg_j: usize,
    intersection: Point2,
) -> (Vec<Point2>, Vec<Point2>) {
    let n = points.len();

    let mut a = Vec::with_capacity(seg_j - seg_i + 1);
    a.push(intersection);
    a.extend_from_slice(&points[(seg_i + 1)..=seg_j]);

    let mut b = Vec::with_capacity(n - (seg_j - seg_i) + 1);
    b.push(intersection);
    let mut idx = (seg_j + 1) % n;
    loop {
        b.push(points[idx]);
        if idx == seg_i {
            break;
        }
        idx = (idx + 1) % n;
    }

    (a, b)
}

/// Recursively removes self-intersection loops from a closed polygon.
///
/// At each self-intersection, splits into two sub-polygons, recursively trims
/// both, then keeps the one whose winding matches `winding_sign`. Junk loops
/// from collapsed features wind oppositely and are discarded. Each split
/// strictly reduces the vertex count, so recursion terminates.
fn trim_closed_loops(points: &[Point2], winding_sign: f64) -> Vec<Point2> {
    let pts = remove_collinear(points, TOLERANCE);
    if pts.len() < 4 {
        return pts;
    }
    match find_crossing(&pts) {
        None => pts,
        Some((i, j, pt)) => {
            let (a, b) = split_at_intersection(&pts, i, j, pt);
            let trimmed_a = trim_closed_loops(&a, winding_sign);
            let trimmed_b = trim_closed_loops(&b, winding_sign);
            let area_a = signed_area(&trimmed_a);
            let area_b = signed_area(&trimmed_b);
            let a_correct = area_a * winding_sign > 0.0;
            let b_correct = area_b * winding_sign > 0.0;
            match (a_correct, b_correct) {
                (true, false) => trimmed_a,
                (false, true) => trimmed_b,
                _ => {
                    if area_a.abs() >= area_b.abs() {
                        trimmed_a
                    } else {
                        trimmed_b
                    }
                }
            }
        }
    }
}

/// Finds the first genuine crossing between non-adjacent edges.
///
/// Skips endpoint-to-endpoint touches (both parameters at an edge end),
/// which occur when the outline revisits the same point and do not split
/// the loop.
fn find_crossing(points: &[Point2]) -> Option<(usize, usize, Point2)> {
    let n = points.len();
    if n < 4 {
        return None;
    }
    let eps = TOLERANCE * 100.0;
    for i in 0..n {
        let i_next = (i + 1) % n;
        for j in (i + 2)..n {
            if i == 0 && j == n - 1 {
                continue;
            }
            let j_next = (j + 1) % n;
            if let Some((pt, t, u)) =
                segment_segment_intersect_2d(&points[i], &points[i_next], &points[j], &points[j_next])
            {
                let t_at_end = t < eps || t > 1.0 - eps;
                let u_at_end = u < eps || u > 1.0 - eps;
                if t_at_end && u_at_end {
                    continue;
                }
                return Some((i, j, pt));
            }
        }
    }
    None
}
