//! Room arena, level-wide recomputation, and the per-level gate that keeps
//! recomputations of one level from interleaving.

mod floorplan;
mod gate;
mod shared;

pub use floorplan::{Floorplan, LevelReport, RoomFailure};
pub use gate::{Admission, LevelGate};
pub use shared::SharedFloorplan;
