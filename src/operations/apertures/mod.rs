//! Aperture placement: fit and overlap validation with a nearest-free-slot
//! search, moving apertures between walls, and paired-door sync.

mod movement;
mod paired;
mod placement;

pub use movement::{move_aperture, move_aperture_within};
pub use paired::{door_world_center, sync_paired_doors};
pub use placement::{
    find_free_slot, validate_aperture_placement, Placement, PlacementFailure, PlacementParams, PlacementReason,
    PlacementResult,
};
