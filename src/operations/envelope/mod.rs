//! Level-wide envelope merge (expand, union, contract) and the separate
//! vertex-insertion step driven by each room's reference polygon.

mod insertion;
mod merge;

pub use insertion::{insert_envelope_vertices, remap_constraints};
pub use merge::{recalculate_envelopes, EnvelopeOutput, EnvelopeParams, MergedGroup, RoomEnvelope};
