//! Wall generation from a room's vertex loop, identity-preserving
//! regeneration, and exterior/interior segment classification.

mod generate;
mod matching;
mod segments;

pub use generate::{generate_fresh_walls, generate_walls, PreviousOutline};
pub use segments::{apply_classification, classify_segments, ClassifyParams, SegmentClassification};
