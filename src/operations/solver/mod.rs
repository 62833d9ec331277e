//! Constraint solving for room outlines.
//!
//! A room is mapped onto points, lines and typed constraints
//! ([`ConstraintSystem`]), handed to a [`ConstraintSolver`], and read back
//! into a new room whose walls are regenerated against the pre-solve loop.

mod adapter;
mod levenberg_marquardt;
mod system;

pub use adapter::{
    build_system, degrees_of_freedom, solve_room, solve_room_with, DofStatus, SolveOutcome, SolveReport,
};
pub use levenberg_marquardt::LevenbergMarquardt;
pub use system::{
    ConstraintSolver, ConstraintSystem, SolveOptions, SolveStats, SolvedPoints, SolverConstraint, SolverLine,
    SolverPoint,
};
