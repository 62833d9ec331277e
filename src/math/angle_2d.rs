use super::{Point2, Vector2, TOLERANCE};

/// Signed angle in radians from `a` to `b`, in `(-π, π]`.
///
/// Positive when `b` is counter-clockwise of `a`. Zero vectors yield `0`.
#[must_use]
pub fn signed_angle(a: &Vector2, b: &Vector2) -> f64 {
    if a.norm_squared() < TOLERANCE * TOLERANCE || b.norm_squared() < TOLERANCE * TOLERANCE {
        return 0.0;
    }
    a.perp(b).atan2(a.dot(b))
}

/// Returns `true` if the directions are parallel or anti-parallel within
/// `tolerance_rad`. Zero vectors are never parallel.
#[must_use]
pub fn are_parallel(a: &Vector2, b: &Vector2, tolerance_rad: f64) -> bool {
    let (Some(ua), Some(ub)) = (a.try_normalize(TOLERANCE), b.try_normalize(TOLERANCE)) else {
        return false;
    };
    ua.perp(&ub).abs() <= tolerance_rad.sin()
}

/// Returns `true` if the directions meet at a right angle within
/// `tolerance_rad`. Zero vectors are never perpendicular.
#[must_use]
pub fn are_perpendicular(a: &Vector2, b: &Vector2, tolerance_rad: f64) -> bool {
    let (Some(ua), Some(ub)) = (a.try_normalize(TOLERANCE), b.try_normalize(TOLERANCE)) else {
        return false;
    };
    ua.dot(&ub).abs() <= tolerance_rad.sin()
}

/// Returns `true` if `b` lies on the straight path `a → b → c`, tested with
/// the normalized cross product of the two legs against `tolerance`.
///
/// A zero-length leg counts as collinear (the middle point is redundant).
#[must_use]
pub fn is_collinear(a: &Point2, b: &Point2, c: &Point2, tolerance: f64) -> bool {
    let ab = b - a;
    let bc = c - b;
    let denom = ab.norm() * bc.norm();
    if denom < TOLERANCE {
        return true;
    }
    (ab.perp(&bc) / denom).abs() < tolerance
}

/// Outward normal of an edge `a → b` of a counter-clockwise polygon
/// (the right-hand normal). Zero-length edges fall back to `+Y`.
#[must_use]
pub fn outward_normal(a: &Point2, b: &Point2) -> Vector2 {
    let d = b - a;
    match d.try_normalize(TOLERANCE) {
        Some(u) => Vector2::new(u.y, -u.x),
        None => Vector2::new(0.0, 1.0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::FRAC_PI_2;

    #[test]
    fn signed_angle_quadrants() {
        let x = Vector2::new(1.0, 0.0);
        let y = Vector2::new(0.0, 1.0);
        assert!((signed_angle(&x, &y) - FRAC_PI_2).abs() < 1e-12);
        assert!((signed_angle(&y, &x) + FRAC_PI_2).abs() < 1e-12);
        assert!(signed_angle(&x, &Vector2::zeros()).abs() < 1e-12);
    }

    #[test]
    fn parallel_directions() {
        let tol = 5f64.to_radians();
        let a = Vector2::new(10.0, 0.0);
        assert!(are_parallel(&a, &Vector2::new(-3.0, 0.1), tol));
        assert!(!are_parallel(&a, &Vector2::new(1.0, 1.0), tol));
        assert!(!are_parallel(&a, &Vector2::zeros(), tol));
    }

    #[test]
    fn perpendicular_directions() {
        let tol = 5f64.to_radians();
        let a = Vector2::new(10.0, 0.0);
        assert!(are_perpendicular(&a, &Vector2::new(0.1, -3.0), tol));
        assert!(are_perpendicular(&Vector2::new(1.0, 1.0), &Vector2::new(-2.0, 2.0), 1e-9));
        assert!(!are_perpendicular(&a, &Vector2::new(1.0, 1.0), tol));
        assert!(!are_perpendicular(&a, &a, tol));
        assert!(!are_perpendicular(&a, &Vector2::zeros(), tol));
    }

    #[test]
    fn collinear_points() {
        let a = Point2::new(0.0, 0.0);
        let b = Point2::new(5.0, 0.0);
        assert!(is_collinear(&a, &b, &Point2::new(10.0, 1e-6), 1e-3));
        assert!(!is_collinear(&a, &b, &Point2::new(10.0, 3.0), 1e-3));
        assert!(is_collinear(&a, &a, &b, 1e-3));
    }

    #[test]
    fn outward_normal_of_ccw_bottom_edge_points_down() {
        let n = outward_normal(&Point2::new(0.0, 0.0), &Point2::new(4.0, 0.0));
        assert!(n.x.abs() < 1e-12 && (n.y + 1.0).abs() < 1e-12);
    }
}
