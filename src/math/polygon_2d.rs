use super::angle_2d::is_collinear;
use super::intersect_2d::segment_segment_intersect_2d;
use super::{Point2, Vector2, TOLERANCE};
use crate::error::{GeometryError, Result};

/// Computes the signed area of a polygon (shoelace formula).
///
/// Positive for counter-clockwise, negative for clockwise.
#[must_use]
pub fn signed_area(points: &[Point2]) -> f64 {
    let n = points.len();
    if n < 3 {
        return 0.0;
    }
    let mut sum = 0.0;
    for i in 0..n {
        let j = (i + 1) % n;
        sum += points[i].x * points[j].y - points[j].x * points[i].y;
    }
    sum * 0.5
}

/// Orientation test `Σ(x[i+1] − x[i])(y[i+1] + y[i]) < 0`.
#[must_use]
pub fn is_ccw(points: &[Point2]) -> bool {
    let n = points.len();
    if n < 3 {
        return false;
    }
    let mut sum = 0.0;
    for i in 0..n {
        let j = (i + 1) % n;
        sum += (points[j].x - points[i].x) * (points[j].y + points[i].y);
    }
    sum < 0.0
}

/// Returns the polygon with counter-clockwise winding.
#[must_use]
pub fn to_ccw(points: &[Point2]) -> Vec<Point2> {
    if points.len() >= 3 && !is_ccw(points) {
        points.iter().rev().copied().collect()
    } else {
        points.to_vec()
    }
}

/// Area-weighted centroid of a polygon.
///
/// Falls back to the vertex average for zero-area input and to the origin
/// for an empty slice.
#[must_use]
pub fn centroid(points: &[Point2]) -> Point2 {
    if points.is_empty() {
        return Point2::origin();
    }
    let area = signed_area(points);
    if area.abs() < TOLERANCE {
        let sum = points
            .iter()
            .fold(Vector2::zeros(), |acc, p| acc + p.coords);
        #[allow(clippy::cast_precision_loss)]
        let count = points.len() as f64;
        return Point2::from(sum / count);
    }
    let n = points.len();
    let (mut cx, mut cy) = (0.0, 0.0);
    for i in 0..n {
        let a = points[i];
        let b = points[(i + 1) % n];
        let cross = a.x * b.y - b.x * a.y;
        cx += (a.x + b.x) * cross;
        cy += (a.y + b.y) * cross;
    }
    Point2::new(cx / (6.0 * area), cy / (6.0 * area))
}

/// Ray-casting point-in-polygon test. Points exactly on an edge may land
/// on either side.
#[must_use]
pub fn point_in_polygon(p: &Point2, polygon: &[Point2]) -> bool {
    let n = polygon.len();
    if n < 3 {
        return false;
    }
    let mut inside = false;
    let mut j = n - 1;
    for i in 0..n {
        let (pi, pj) = (polygon[i], polygon[j]);
        if (pi.y > p.y) != (pj.y > p.y) {
            let x_cross = (pj.x - pi.x) * (p.y - pi.y) / (pj.y - pi.y) + pi.x;
            if p.x < x_cross {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}

/// Checks whether segments i and j are adjacent in a closed polygon.
fn are_adjacent(i: usize, j: usize, n: usize) -> bool {
    let diff = i.abs_diff(j);
    diff == 1 || diff == n - 1
}

/// Returns `true` if any two non-adjacent edges of the closed polygon touch.
#[must_use]
pub fn has_self_intersection(points: &[Point2]) -> bool {
    find_first_self_intersection(points).is_some()
}

/// Finds the first self-intersection between non-adjacent edges.
///
/// Returns `(i, j, point)` with `i < j` edge indices.
#[must_use]
pub fn find_first_self_intersection(points: &[Point2]) -> Option<(usize, usize, Point2)> {
    let n = points.len();
    if n < 4 {
        return None;
    }
    for i in 0..n {
        let i_next = (i + 1) % n;
        for j in (i + 2)..n {
            if are_adjacent(i, j, n) {
                continue;
            }
            let j_next = (j + 1) % n;
            if let Some((pt, _, _)) =
                segment_segment_intersect_2d(&points[i], &points[i_next], &points[j], &points[j_next])
            {
                return Some((i, j, pt));
            }
        }
    }
    None
}

/// Removes consecutive near-duplicate vertices (including the wrap-around pair).
#[must_use]
pub fn dedup_points(points: &[Point2], tolerance: f64) -> Vec<Point2> {
    let tol_sq = tolerance * tolerance;
    let mut deduped: Vec<Point2> = Vec::with_capacity(points.len());
    for &pt in points {
        if let Some(last) = deduped.last() {
            if (pt - last).norm_squared() < tol_sq {
                continue;
            }
        }
        deduped.push(pt);
    }
    while deduped.len() > 1 {
        let first = deduped[0];
        let last = deduped[deduped.len() - 1];
        if (last - first).norm_squared() < tol_sq {
            deduped.pop();
        } else {
            break;
        }
    }
    deduped
}

/// Removes duplicate and collinear vertices from a closed polygon.
///
/// Never reduces below 3 vertices; the deduplicated input is returned
/// instead when cleaning would collapse it.
#[must_use]
pub fn remove_collinear(points: &[Point2], tolerance: f64) -> Vec<Point2> {
    let deduped = dedup_points(points, TOLERANCE * 10.0);
    if deduped.len() < 3 {
        return deduped;
    }

    let mut current = deduped.clone();
    loop {
        let n = current.len();
        if n <= 3 {
            break;
        }
        let removable = (0..n).find(|&i| {
            let prev = if i == 0 { n - 1 } else { i - 1 };
            is_collinear(&current[prev], &current[i], &current[(i + 1) % n], tolerance)
        });
        match removable {
            Some(i) => {
                current.remove(i);
            }
            None => break,
        }
    }

    if current.len() < 3 || signed_area(&current).abs() < TOLERANCE {
        return deduped;
    }
    current
}

/// Rotates a closed polygon so it starts at the leftmost vertex (smallest x),
/// breaking ties by smallest y. Ensures deterministic output for tests.
#[must_use]
pub fn rotate_to_canonical_start(points: &[Point2]) -> Vec<Point2> {
    if points.len() < 2 {
        return points.to_vec();
    }
    let mut best = 0;
    for (i, pt) in points.iter().enumerate().skip(1) {
        let b = &points[best];
        if pt.x < b.x - TOLERANCE || (pt.x - b.x).abs() < TOLERANCE && pt.y < b.y {
            best = i;
        }
    }
    let mut rotated = Vec::with_capacity(points.len());
    rotated.extend_from_slice(&points[best..]);
    rotated.extend_from_slice(&points[..best]);
    rotated
}

/// Computes the normalized direction from point `a` to point `b`.
///
/// # Errors
///
/// Returns `GeometryError::ZeroLengthSegment` if the segment has zero length.
pub fn segment_direction(a: &Point2, b: &Point2) -> Result<Vector2> {
    (b - a).try_normalize(TOLERANCE).ok_or_else(|| {
        GeometryError::ZeroLengthSegment {
            x0: a.x,
            y0: a.y,
            x1: b.x,
            y1: b.y,
        }
        .into()
    })
}

/// Returns the left-pointing normal of a direction vector.
#[must_use]
pub fn left_normal(dir: Vector2) -> Vector2 {
    Vector2::new(-dir.y, dir.x)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn square(size: f64) -> Vec<Point2> {
        vec![
            Point2::new(0.0, 0.0),
            Point2::new(size, 0.0),
            Point2::new(size, size),
            Point2::new(0.0, size),
        ]
    }

    #[test]
    fn signed_area_ccw_and_cw() {
        let pts = square(1.0);
        assert!((signed_area(&pts) - 1.0).abs() < TOLERANCE);
        let cw: Vec<Point2> = pts.iter().rev().copied().collect();
        assert!((signed_area(&cw) + 1.0).abs() < TOLERANCE);
        assert!(signed_area(&[]).abs() < TOLERANCE);
    }

    #[test]
    fn ccw_orientation_test() {
        let pts = square(2.0);
        assert!(is_ccw(&pts));
        let cw: Vec<Point2> = pts.iter().rev().copied().collect();
        assert!(!is_ccw(&cw));
        assert!(is_ccw(&to_ccw(&cw)));
    }

    #[test]
    fn centroid_of_square_and_degenerate() {
        let c = centroid(&square(4.0));
        assert!((c.x - 2.0).abs() < 1e-12 && (c.y - 2.0).abs() < 1e-12);
        let line = [Point2::new(0.0, 0.0), Point2::new(2.0, 0.0), Point2::new(4.0, 0.0)];
        let c = centroid(&line);
        assert!((c.x - 2.0).abs() < 1e-12 && c.y.abs() < 1e-12);
        assert_eq!(centroid(&[]), Point2::origin());
    }

    #[test]
    fn point_in_polygon_basic() {
        let sq = square(10.0);
        assert!(point_in_polygon(&Point2::new(5.0, 5.0), &sq));
        assert!(!point_in_polygon(&Point2::new(15.0, 5.0), &sq));
        assert!(!point_in_polygon(&Point2::new(5.0, 5.0), &sq[..2]));
    }

    #[test]
    fn bowtie_self_intersects() {
        let bowtie = vec![
            Point2::new(0.0, 0.0),
            Point2::new(10.0, 10.0),
            Point2::new(10.0, 0.0),
            Point2::new(0.0, 10.0),
        ];
        assert!(has_self_intersection(&bowtie));
        assert!(!has_self_intersection(&square(10.0)));
    }

    #[test]
    fn remove_collinear_drops_mid_edge_vertices() {
        let pts = vec![
            Point2::new(0.0, 0.0),
            Point2::new(5.0, 0.0),
            Point2::new(10.0, 0.0),
            Point2::new(10.0, 10.0),
            Point2::new(10.0, 10.0),
            Point2::new(0.0, 10.0),
        ];
        let cleaned = remove_collinear(&pts, 1e-6);
        assert_eq!(cleaned.len(), 4);
    }

    #[test]
    fn canonical_start_rotation() {
        let pts = vec![
            Point2::new(1.0, 0.0),
            Point2::new(1.0, 1.0),
            Point2::new(0.0, 1.0),
            Point2::new(0.0, 0.0),
        ];
        let rotated = rotate_to_canonical_start(&pts);
        assert!(rotated[0].x.abs() < TOLERANCE && rotated[0].y.abs() < TOLERANCE);
    }

    #[test]
    fn segment_direction_zero_length() {
        let a = Point2::new(1.0, 1.0);
        assert!(segment_direction(&a, &a).is_err());
        let dir = segment_direction(&Point2::new(0.0, 0.0), &Point2::new(3.0, 4.0)).unwrap();
        assert!((dir.x - 0.6).abs() < TOLERANCE && (dir.y - 0.8).abs() < TOLERANCE);
    }
}
