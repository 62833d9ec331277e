use tracing::{debug, warn};

use super::levenberg_marquardt::LevenbergMarquardt;
use super::system::{ConstraintSolver, ConstraintSystem, SolveOptions, SolverConstraint, SolverLine, SolverPoint};
use crate::error::KernelError;
use crate::model::{Constraint, ConstraintKind, Room, Vertex};
use crate::operations::walls::{generate_walls, PreviousOutline};

/// Whether a room's constraints pin down its shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DofStatus {
    UnderConstrained,
    FullyDetermined,
    OverConstrained,
}

impl DofStatus {
    #[must_use]
    pub fn from_dof(dof: i64) -> Self {
        match dof {
            d if d < 0 => Self::OverConstrained,
            0 => Self::FullyDetermined,
            _ => Self::UnderConstrained,
        }
    }
}

/// What the caller needs for feedback after a solve attempt.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolveReport {
    pub dof: i64,
    pub status: DofStatus,
    pub iterations: usize,
    pub residual: f64,
    /// Constraints that made it into the system (enabled and well-formed).
    pub applied_constraints: usize,
}

impl SolveReport {
    #[must_use]
    pub fn over_constrained(&self) -> bool {
        self.status == DofStatus::OverConstrained
    }
}

/// Result of [`solve_room`]. A failed solve never touches the input room.
#[derive(Debug)]
pub enum SolveOutcome {
    Solved { room: Room, report: SolveReport },
    Failed { report: SolveReport, error: KernelError },
}

impl SolveOutcome {
    #[must_use]
    pub fn report(&self) -> &SolveReport {
        match self {
            Self::Solved { report, .. } | Self::Failed { report, .. } => report,
        }
    }

    #[must_use]
    pub fn room(&self) -> Option<&Room> {
        match self {
            Self::Solved { room, .. } => Some(room),
            Self::Failed { .. } => None,
        }
    }
}

/// `2 × (n − 1) − enabled constraints`: one vertex is always pinned.
#[must_use]
#[allow(clippy::cast_possible_wrap)]
pub fn degrees_of_freedom(room: &Room) -> i64 {
    let free = 2 * room.vertices.len().saturating_sub(1);
    free as i64 - room.enabled_constraint_count() as i64
}

/// Maps a room onto solver primitives: a point per vertex (the one at
/// `fixed` pinned), a line per edge, and a typed constraint per enabled,
/// well-formed constraint. Malformed constraints are skipped.
#[must_use]
pub fn build_system(room: &Room, fixed: usize) -> ConstraintSystem {
    let n = room.vertices.len();
    let points = room
        .vertices
        .iter()
        .enumerate()
        .map(|(i, v)| SolverPoint {
            position: v.point(),
            fixed: i == fixed,
        })
        .collect();
    let lines = (0..n).map(|i| SolverLine { p1: i, p2: (i + 1) % n }).collect();
    let constraints = room
        .constraints
        .iter()
        .filter(|c| c.enabled)
        .filter_map(|c| {
            let mapped = map_constraint(c, n);
            if mapped.is_none() {
                debug!(constraint = %c.id, kind = ?c.kind, "malformed constraint dropped");
            }
            mapped
        })
        .collect();
    ConstraintSystem {
        points,
        lines,
        constraints,
    }
}

fn map_constraint(c: &Constraint, n: usize) -> Option<SolverConstraint> {
    let &[a, b] = c.indices.as_slice() else {
        return None;
    };
    if a >= n || b >= n || (!c.kind.references_edges() && a == b) {
        return None;
    }
    let mapped = match c.kind {
        ConstraintKind::Distance => SolverConstraint::Distance {
            p1: a,
            p2: b,
            length: c.value.filter(|v| v.is_finite() && *v >= 0.0)?,
        },
        ConstraintKind::Horizontal => SolverConstraint::Horizontal { p1: a, p2: b },
        ConstraintKind::Vertical => SolverConstraint::Vertical { p1: a, p2: b },
        ConstraintKind::Parallel => SolverConstraint::Parallel { l1: a, l2: b },
        ConstraintKind::Perpendicular => SolverConstraint::Perpendicular { l1: a, l2: b },
        ConstraintKind::Equal => SolverConstraint::EqualLength { l1: a, l2: b },
        ConstraintKind::Angle => SolverConstraint::Angle {
            l1: a,
            l2: b,
            radians: c.value.filter(|v| v.is_finite())?.to_radians(),
        },
    };
    Some(mapped)
}

/// Solves a room with the default [`LevenbergMarquardt`] solver.
#[must_use]
pub fn solve_room(room: &Room, fixed: Option<usize>, options: &SolveOptions) -> SolveOutcome {
    solve_room_with(&LevenbergMarquardt::new(), room, fixed, options)
}

/// Solves a room's constraints and returns a new room with the solved
/// positions. Vertex identities and count never change; walls are
/// regenerated against the pre-solve loop so they keep their state.
#[must_use]
pub fn solve_room_with(
    solver: &dyn ConstraintSolver,
    room: &Room,
    fixed: Option<usize>,
    options: &SolveOptions,
) -> SolveOutcome {
    let n = room.vertices.len();
    let mut fixed = fixed.unwrap_or(0);
    if fixed >= n && n > 0 {
        warn!(fixed, vertices = n, "fixed vertex index out of range; pinning vertex 0");
        fixed = 0;
    }

    let system = build_system(room, fixed);
    let dof = degrees_of_freedom(room);
    let mut report = SolveReport {
        dof,
        status: DofStatus::from_dof(dof),
        iterations: 0,
        residual: 0.0,
        applied_constraints: system.constraints.len(),
    };
    if report.over_constrained() {
        warn!(room = %room.name, dof, "room is over-constrained");
    }

    let solved = match solver.solve(&system, options) {
        Ok(solved) => solved,
        Err(error) => {
            warn!(room = %room.name, %error, "solve failed; room left unchanged");
            return SolveOutcome::Failed { report, error };
        }
    };
    report.iterations = solved.stats.iterations;
    report.residual = solved.stats.residual;

    let vertices: Vec<Vertex> = room
        .vertices
        .iter()
        .zip(&solved.positions)
        .map(|(v, p)| Vertex { id: v.id, x: p.x, y: p.y })
        .collect();
    let walls = match generate_walls(
        &vertices,
        room.wall_thickness,
        Some(PreviousOutline {
            vertices: &room.vertices,
            walls: &room.walls,
        }),
    ) {
        Ok(walls) => walls,
        Err(error) => return SolveOutcome::Failed { report, error },
    };

    let mut next = room.clone();
    next.vertices = vertices;
    next.walls = walls;
    next.invalidate_derived();
    debug!(room = %room.name, iterations = report.iterations, dof, "room solved");
    SolveOutcome::Solved { room: next, report }
}
