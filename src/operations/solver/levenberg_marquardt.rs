use std::time::Instant;

use nalgebra::{DMatrix, DVector};
use tracing::{debug, trace};

use super::system::{ConstraintSolver, ConstraintSystem, SolveOptions, SolveStats, SolvedPoints};
use crate::error::{Result, SolverError};
use crate::math::Point2;

/// Central-difference step for the numeric Jacobian.
const JACOBIAN_STEP: f64 = 1e-6;
const INITIAL_DAMPING: f64 = 1e-3;
const MAX_DAMPING: f64 = 1e12;

/// Damped least-squares solver over the free point coordinates, with a
/// numeric Jacobian. Fixed points never move.
#[derive(Debug, Clone, Copy, Default)]
pub struct LevenbergMarquardt;

impl LevenbergMarquardt {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

/// Maps the free coordinates of a system onto a flat parameter vector.
struct Parameters<'a> {
    system: &'a ConstraintSystem,
    free: Vec<usize>,
}

impl<'a> Parameters<'a> {
    fn new(system: &'a ConstraintSystem) -> Self {
        let free = system
            .points
            .iter()
            .enumerate()
            .filter(|(_, p)| !p.fixed)
            .map(|(i, _)| i)
            .collect();
        Self { system, free }
    }

    fn initial(&self) -> DVector<f64> {
        DVector::from_iterator(
            self.free.len() * 2,
            self.free
                .iter()
                .flat_map(|&i| [self.system.points[i].position.x, self.system.points[i].position.y]),
        )
    }

    fn positions(&self, x: &DVector<f64>) -> Vec<Point2> {
        let mut out: Vec<Point2> = self.system.points.iter().map(|p| p.position).collect();
        for (k, &i) in self.free.iter().enumerate() {
            out[i] = Point2::new(x[2 * k], x[2 * k + 1]);
        }
        out
    }

    fn residuals(&self, x: &DVector<f64>) -> DVector<f64> {
        DVector::from_vec(self.system.residuals(&self.positions(x)))
    }

    fn jacobian(&self, x: &DVector<f64>, rows: usize) -> DMatrix<f64> {
        let mut jac = DMatrix::zeros(rows, x.len());
        let mut nudged = x.clone();
        for col in 0..x.len() {
            let orig = nudged[col];
            nudged[col] = orig + JACOBIAN_STEP;
            let plus = self.residuals(&nudged);
            nudged[col] = orig - JACOBIAN_STEP;
            let minus = self.residuals(&nudged);
            nudged[col] = orig;
            jac.set_column(col, &((plus - minus) / (2.0 * JACOBIAN_STEP)));
        }
        jac
    }
}

impl ConstraintSolver for LevenbergMarquardt {
    fn solve(&self, system: &ConstraintSystem, options: &SolveOptions) -> Result<SolvedPoints> {
        let params = Parameters::new(system);
        let mut x = params.initial();
        let mut r = params.residuals(&x);
        let started = Instant::now();

        if r.is_empty() || x.is_empty() {
            return Ok(SolvedPoints {
                positions: params.positions(&x),
                stats: SolveStats {
                    iterations: 0,
                    residual: r.norm(),
                },
            });
        }

        let mut damping = INITIAL_DAMPING;
        for iteration in 0..options.max_iterations {
            let residual = r.norm();
            if residual < options.tolerance {
                debug!(iterations = iteration, residual, "solver converged");
                return Ok(SolvedPoints {
                    positions: params.positions(&x),
                    stats: SolveStats {
                        iterations: iteration,
                        residual,
                    },
                });
            }
            let elapsed = started.elapsed();
            if elapsed > options.time_budget {
                return Err(SolverError::TimedOut {
                    iterations: iteration,
                    elapsed_ms: elapsed.as_millis(),
                }
                .into());
            }

            let jac = params.jacobian(&x, r.len());
            let jt = jac.transpose();
            let gradient = &jt * &r;
            let normal = &jt * &jac;

            // Raise the damping until a step lowers the cost.
            loop {
                if damping > MAX_DAMPING {
                    return Err(SolverError::Singular.into());
                }
                let mut lhs = normal.clone();
                for d in 0..lhs.nrows() {
                    lhs[(d, d)] += damping * (1.0 + normal[(d, d)]);
                }
                let Some(step) = lhs.lu().solve(&(-&gradient)) else {
                    damping *= 10.0;
                    continue;
                };
                let candidate = &x + &step;
                let next = params.residuals(&candidate);
                if next.norm_squared() < r.norm_squared() {
                    x = candidate;
                    r = next;
                    damping = (damping / 10.0).max(1e-12);
                    break;
                }
                damping *= 10.0;
            }
            trace!(iteration, residual = r.norm(), damping, "solver step");
        }

        let residual = r.norm();
        if residual < options.tolerance {
            return Ok(SolvedPoints {
                positions: params.positions(&x),
                stats: SolveStats {
                    iterations: options.max_iterations,
                    residual,
                },
            });
        }
        Err(SolverError::NotConverged {
            iterations: options.max_iterations,
            residual,
        }
        .into())
    }
}
