use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

/// Source of every stable identity minted by the kernel. Never reset, so an
/// identity is never handed out twice within a process.
static NEXT_ID: AtomicU64 = AtomicU64::new(1);

fn next_raw() -> u64 {
    NEXT_ID.fetch_add(1, Ordering::Relaxed)
}

/// Moves the allocator past `raw` so identities loaded from a snapshot are
/// not minted again.
pub fn reserve_through(raw: u64) {
    NEXT_ID.fetch_max(raw.saturating_add(1), Ordering::Relaxed);
}

macro_rules! stable_id {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(u64);

        impl $name {
            /// Mints a new, never-reused identity.
            #[must_use]
            pub fn fresh() -> Self {
                Self(next_raw())
            }

            /// Wraps an identity loaded from outside the kernel.
            #[must_use]
            pub fn from_raw(raw: u64) -> Self {
                reserve_through(raw);
                Self(raw)
            }

            #[must_use]
            pub fn raw(self) -> u64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($prefix, "-{}"), self.0)
            }
        }
    };
}

stable_id!(
    /// Stable identity of a room vertex.
    VertexId,
    "v"
);
stable_id!(
    /// Stable identity of a door or window.
    ApertureId,
    "ap"
);
stable_id!(
    /// Identity of a classified wall sub-segment.
    SegmentId,
    "seg"
);
stable_id!(ConstraintId, "c");

slotmap::new_key_type! {
    /// Key of a room inside a [`crate::store::Floorplan`].
    pub struct RoomId;
}

/// Floor a room belongs to; rooms on the same level merge envelopes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LevelId(pub u32);

impl fmt::Display for LevelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "level-{}", self.0)
    }
}
