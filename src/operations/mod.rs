pub mod apertures;
pub mod envelope;
pub mod offset;
pub mod solver;
pub mod walls;
