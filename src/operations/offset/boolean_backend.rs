//! Fixed-point boolean union.
//!
//! Coordinates are scaled (×100 by default) and rounded to integers before
//! they reach the clipping backend, so centimeter precision survives as
//! exact integer arithmetic in the combinatorial part of the algorithm.

use std::sync::OnceLock;

use geo::{BooleanOps, Coord, LineString, MultiPolygon, Polygon};
use tracing::{debug, warn};

use crate::math::polygon_2d::{dedup_points, rotate_to_canonical_start, signed_area, to_ccw};
use crate::math::Point2;

/// A closed polygon in fixed-point integer coordinates (no repeated end point).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixedPolygon(pub Vec<(i64, i64)>);

impl FixedPolygon {
    /// Quantizes a float polygon onto the fixed-point grid.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn from_points(points: &[Point2], scale: f64) -> Self {
        let mut out: Vec<(i64, i64)> = Vec::with_capacity(points.len());
        for p in points {
            let q = ((p.x * scale).round() as i64, (p.y * scale).round() as i64);
            if out.last() != Some(&q) {
                out.push(q);
            }
        }
        if out.len() > 1 && out.first() == out.last() {
            out.pop();
        }
        Self(out)
    }

    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn to_points(&self, scale: f64) -> Vec<Point2> {
        self.0
            .iter()
            .map(|&(x, y)| Point2::new(x as f64 / scale, y as f64 / scale))
            .collect()
    }
}

/// A polygon clipping engine able to union simple polygons.
pub trait BooleanBackend: Send + Sync {
    /// Unions all polygons into a planar partition of outer boundaries.
    /// Holes are not reported.
    fn union(&self, polygons: &[FixedPolygon]) -> Vec<FixedPolygon>;

    fn name(&self) -> &'static str;
}

/// Backend built on `geo`'s boolean operations.
#[derive(Debug, Default)]
pub struct GeoBackend;

impl GeoBackend {
    #[allow(clippy::cast_precision_loss)]
    fn to_geo(polygon: &FixedPolygon) -> Polygon<f64> {
        let coords: Vec<Coord<f64>> = polygon
            .0
            .iter()
            .map(|&(x, y)| Coord {
                x: x as f64,
                y: y as f64,
            })
            .collect();
        Polygon::new(LineString::new(coords), Vec::new())
    }

    #[allow(clippy::cast_possible_truncation)]
    fn from_geo(polygon: &Polygon<f64>) -> FixedPolygon {
        let mut out: Vec<(i64, i64)> = polygon
            .exterior()
            .0
            .iter()
            .map(|c| (c.x.round() as i64, c.y.round() as i64))
            .collect();
        out.dedup();
        if out.len() > 1 && out.first() == out.last() {
            out.pop();
        }
        FixedPolygon(out)
    }
}

impl BooleanBackend for GeoBackend {
    fn union(&self, polygons: &[FixedPolygon]) -> Vec<FixedPolygon> {
        let mut inputs = polygons.iter().filter(|p| p.0.len() >= 3);
        let Some(first) = inputs.next() else {
            return Vec::new();
        };
        let mut acc = MultiPolygon::new(vec![Self::to_geo(first)]);
        for poly in inputs {
            acc = acc.union(&MultiPolygon::new(vec![Self::to_geo(poly)]));
        }
        acc.0
            .iter()
            .map(Self::from_geo)
            .filter(|p| p.0.len() >= 3)
            .collect()
    }

    fn name(&self) -> &'static str {
        "geo"
    }
}

static BACKEND: OnceLock<Box<dyn BooleanBackend>> = OnceLock::new();

/// Returns the process-wide boolean backend, creating it on first use.
///
/// Initialization runs exactly once; concurrent first callers block on the
/// same initialization and share its result.
pub fn backend() -> &'static dyn BooleanBackend {
    BACKEND
        .get_or_init(|| {
            let backend: Box<dyn BooleanBackend> = Box::new(GeoBackend);
            debug!(backend = backend.name(), "boolean backend initialized");
            backend
        })
        .as_ref()
}

/// Unions float polygons through the fixed-point backend.
///
/// Output polygons are counter-clockwise, start at their leftmost vertex
/// and share no vertex correspondence with the input. When the backend produces nothing usable
/// the input is returned unchanged.
#[must_use]
pub fn union_polygons(polygons: &[Vec<Point2>], scale: f64) -> Vec<Vec<Point2>> {
    union_with(backend(), polygons, scale)
}

/// [`union_polygons`] against an explicit backend.
#[must_use]
pub fn union_with(backend: &dyn BooleanBackend, polygons: &[Vec<Point2>], scale: f64) -> Vec<Vec<Point2>> {
    let fixed: Vec<FixedPolygon> = polygons
        .iter()
        .map(|p| FixedPolygon::from_points(&to_ccw(p), scale))
        .filter(|p| p.0.len() >= 3)
        .collect();
    if fixed.is_empty() {
        return polygons.to_vec();
    }

    let merged: Vec<Vec<Point2>> = backend
        .union(&fixed)
        .iter()
        .map(|p| rotate_to_canonical_start(&to_ccw(&dedup_points(&p.to_points(scale), 0.5 / scale))))
        .filter(|p| p.len() >= 3 && signed_area(p).abs() > f64::EPSILON)
        .collect();

    if merged.is_empty() {
        warn!(inputs = polygons.len(), "union produced no polygons; keeping inputs");
        return polygons.to_vec();
    }
    debug!(inputs = polygons.len(), outputs = merged.len(), "union complete");
    merged
}
