//! Polygon offset engine: geometric single-polygon offsetting plus a
//! fixed-point boolean union backend.

pub mod boolean_backend;
mod polygon_offset_2d;

pub use boolean_backend::{backend, union_polygons, BooleanBackend, FixedPolygon, GeoBackend};
pub use polygon_offset_2d::{offset_polygon, JoinType, PolygonOffset2D};
