use std::time::Duration;

use crate::config::SolverConfig;
use crate::error::Result;
use crate::math::angle_2d::signed_angle;
use crate::math::{Point2, TOLERANCE};

/// A solver point. Point ids are their index in [`ConstraintSystem::points`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolverPoint {
    pub position: Point2,
    pub fixed: bool,
}

/// A line between two point ids. Line ids are their index in
/// [`ConstraintSystem::lines`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SolverLine {
    pub p1: usize,
    pub p2: usize,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SolverConstraint {
    Distance { p1: usize, p2: usize, length: f64 },
    Horizontal { p1: usize, p2: usize },
    Vertical { p1: usize, p2: usize },
    Parallel { l1: usize, l2: usize },
    Perpendicular { l1: usize, l2: usize },
    EqualLength { l1: usize, l2: usize },
    Angle { l1: usize, l2: usize, radians: f64 },
}

/// Points, lines and constraints of one solve. All ids are in range.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConstraintSystem {
    pub points: Vec<SolverPoint>,
    pub lines: Vec<SolverLine>,
    pub constraints: Vec<SolverConstraint>,
}

impl ConstraintSystem {
    /// Residual of every constraint at `positions` (indexed like `points`).
    #[must_use]
    pub fn residuals(&self, positions: &[Point2]) -> Vec<f64> {
        self.constraints
            .iter()
            .map(|c| self.residual(c, positions))
            .collect()
    }

    fn residual(&self, constraint: &SolverConstraint, p: &[Point2]) -> f64 {
        let dir = |l: usize| {
            let line = self.lines[l];
            p[line.p2] - p[line.p1]
        };
        match *constraint {
            SolverConstraint::Distance { p1, p2, length } => (p[p2] - p[p1]).norm() - length,
            SolverConstraint::Horizontal { p1, p2 } => p[p2].y - p[p1].y,
            SolverConstraint::Vertical { p1, p2 } => p[p2].x - p[p1].x,
            SolverConstraint::Parallel { l1, l2 } => {
                let (a, b) = (dir(l1), dir(l2));
                a.perp(&b) / (a.norm() * b.norm()).max(TOLERANCE)
            }
            SolverConstraint::Perpendicular { l1, l2 } => {
                let (a, b) = (dir(l1), dir(l2));
                a.dot(&b) / (a.norm() * b.norm()).max(TOLERANCE)
            }
            SolverConstraint::EqualLength { l1, l2 } => dir(l1).norm() - dir(l2).norm(),
            SolverConstraint::Angle { l1, l2, radians } => {
                signed_angle(&dir(l1), &dir(l2)).abs() - radians
            }
        }
    }
}

/// Bounds on one solve.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolveOptions {
    pub max_iterations: usize,
    /// Converged once the residual norm drops below this.
    pub tolerance: f64,
    /// Wall-clock budget after which the solve is abandoned.
    pub time_budget: Duration,
}

impl SolveOptions {
    #[must_use]
    pub fn from_config(config: &SolverConfig) -> Self {
        Self {
            max_iterations: config.max_iterations,
            tolerance: config.tolerance,
            time_budget: Duration::from_millis(config.time_budget_ms),
        }
    }
}

impl Default for SolveOptions {
    fn default() -> Self {
        Self::from_config(&SolverConfig::default())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolveStats {
    pub iterations: usize,
    pub residual: f64,
}

/// Solved positions in point-id order, plus how the solve went.
#[derive(Debug, Clone, PartialEq)]
pub struct SolvedPoints {
    pub positions: Vec<Point2>,
    pub stats: SolveStats,
}

/// A bounded iterative solver for a [`ConstraintSystem`].
pub trait ConstraintSolver {
    /// Moves the free points until every residual is within tolerance.
    ///
    /// # Errors
    ///
    /// `SolverError::NotConverged` past `max_iterations`,
    /// `SolverError::TimedOut` past the time budget and
    /// `SolverError::Singular` when no descent step can be found.
    fn solve(&self, system: &ConstraintSystem, options: &SolveOptions) -> Result<SolvedPoints>;
}
