use super::{Point2, TOLERANCE};

/// Euclidean distance between two points.
#[must_use]
pub fn distance(a: &Point2, b: &Point2) -> f64 {
    (b - a).norm()
}

/// Returns the closest point on segment `a → b` to `p`, together with its
/// clamped parameter `t ∈ [0, 1]`.
///
/// A zero-length segment returns `a` with `t = 0`.
#[must_use]
pub fn closest_point_on_segment(p: &Point2, a: &Point2, b: &Point2) -> (Point2, f64) {
    let d = b - a;
    let len_sq = d.norm_squared();
    if len_sq < TOLERANCE * TOLERANCE {
        return (*a, 0.0);
    }
    let t = ((p - a).dot(&d) / len_sq).clamp(0.0, 1.0);
    (a + d * t, t)
}

/// Returns the minimum distance from `p` to the segment `a → b`.
#[must_use]
pub fn point_to_segment_dist(p: &Point2, a: &Point2, b: &Point2) -> f64 {
    let (closest, _) = closest_point_on_segment(p, a, b);
    distance(p, &closest)
}

/// Signed distance of `p` along the direction of `a → b`, measured from `a`.
///
/// Unclamped; values outside `[0, |ab|]` lie beyond the segment ends.
/// A zero-length segment yields the plain distance from `a`.
#[must_use]
pub fn distance_along(p: &Point2, a: &Point2, b: &Point2) -> f64 {
    let d = b - a;
    let len = d.norm();
    if len < TOLERANCE {
        return distance(p, a);
    }
    (p - a).dot(&d) / len
}
