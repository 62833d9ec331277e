//! Plain-data model of the floorplan: rooms own their vertices, walls,
//! apertures and constraints outright.

pub mod aperture;
pub mod constraint;
pub mod ids;
pub mod room;
pub mod transform;
pub mod wall;

pub use aperture::{Anchor, Aperture, ApertureAttributes, ApertureKind};
pub use constraint::{Constraint, ConstraintKind};
pub use ids::{ApertureId, ConstraintId, LevelId, RoomId, SegmentId, VertexId};
pub use room::{DerivedGeometry, Room, Vertex};
pub use transform::Transform;
pub use wall::{Wall, WallSegment, WallType, DEFAULT_WALL_HEIGHT};
