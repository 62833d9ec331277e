use thiserror::Error;

/// Top-level error type for the plankit geometry kernel.
#[derive(Debug, Error)]
pub enum KernelError {
    #[error(transparent)]
    Geometry(#[from] GeometryError),

    #[error(transparent)]
    Wall(#[from] WallError),

    #[error(transparent)]
    Solver(#[from] SolverError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Errors related to geometric computations.
///
/// These are always recovered by the caller with a defined fallback; they
/// exist so helpers can report *why* they could not produce a value.
#[derive(Debug, Error)]
pub enum GeometryError {
    #[error("degenerate geometry: {0}")]
    Degenerate(String),

    #[error("zero-length segment between ({x0}, {y0}) and ({x1}, {y1})")]
    ZeroLengthSegment { x0: f64, y0: f64, x1: f64, y1: f64 },
}

/// Errors raised while regenerating walls.
#[derive(Debug, Error)]
pub enum WallError {
    /// One or more new edges could not be matched to any previous wall.
    /// Continuing would silently discard apertures and per-wall state.
    #[error("wall identity match failed for edge(s) {edges:?}; {apertures_at_risk} aperture(s) at risk")]
    IdentityMatchFailed {
        edges: Vec<usize>,
        apertures_at_risk: usize,
    },
}

/// Errors reported by the numerical constraint solver.
#[derive(Debug, Error)]
pub enum SolverError {
    #[error("solver did not converge after {iterations} iterations (max residual {residual:e})")]
    NotConverged { iterations: usize, residual: f64 },

    #[error("solver abandoned after {elapsed_ms} ms ({iterations} iterations)")]
    TimedOut { iterations: usize, elapsed_ms: u128 },

    #[error("solver normal equations are singular")]
    Singular,
}

/// Errors related to the room store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("room not found: {0}")]
    RoomNotFound(String),

    #[error("wall {wall} out of range for room with {walls} walls")]
    WallOutOfRange { wall: usize, walls: usize },

    #[error("aperture not found: {0}")]
    ApertureNotFound(String),
}

/// Errors related to kernel configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid configuration: {0}")]
    Parse(String),
}

/// Convenience type alias for results using [`KernelError`].
pub type Result<T> = std::result::Result<T, KernelError>;
