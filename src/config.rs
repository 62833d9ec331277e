use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Result};

/// Tunable constants of the kernel.
///
/// All distances are in centimeters, angles in degrees.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KernelConfig {
    /// Fixed-point scale applied before handing polygons to the boolean backend.
    pub fixed_point_scale: f64,
    /// Outward margin used by the expand/union/contract envelope merge.
    pub envelope_margin: f64,
    /// Miter limit used while expanding centerlines for the merge.
    pub envelope_miter_limit: f64,
    /// Inward offset of a merged centerline that yields the vertex-insertion
    /// and classification reference polygon.
    pub contract_distance: f64,
    /// Two points closer than this are the same vertex.
    pub coincidence_tolerance: f64,
    /// Envelope vertices within this band of a wall split the wall.
    pub segment_split_band: f64,
    /// A segment midpoint within this band of a collinear envelope edge is exterior.
    pub exterior_band: f64,
    /// Maximum angle between a wall and an envelope edge to count as collinear.
    pub exterior_angle_deg: f64,
    /// Apertures overlapping by less than this are touching, not colliding.
    pub aperture_touch_tolerance: f64,
    /// Step of the nearest-free-slot scan.
    pub aperture_search_step: f64,
    /// Doors in different rooms whose world centers are this close are one opening.
    pub paired_door_tolerance: f64,
    pub solver: SolverConfig,
}

/// Bounds for the iterative constraint solver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    pub max_iterations: usize,
    pub tolerance: f64,
    /// Wall-clock budget in milliseconds; the solve is abandoned past it.
    pub time_budget_ms: u64,
}

impl Default for KernelConfig {
    fn default() -> Self {
        Self {
            fixed_point_scale: 100.0,
            envelope_margin: 10.0,
            envelope_miter_limit: 1000.0,
            contract_distance: 7.5,
            coincidence_tolerance: 1.0,
            segment_split_band: 5.0,
            exterior_band: 10.0,
            exterior_angle_deg: 5.0,
            aperture_touch_tolerance: 1.0,
            aperture_search_step: 5.0,
            paired_door_tolerance: 5.0,
            solver: SolverConfig::default(),
        }
    }
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            max_iterations: 200,
            tolerance: 1e-6,
            time_budget_ms: 250,
        }
    }
}

impl KernelConfig {
    /// Parses a configuration from TOML. Missing keys keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Parse` if the text is not valid TOML or a value
    /// has the wrong type.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| ConfigError::Parse(e.to_string()).into())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn partial_toml_keeps_defaults() {
        let cfg = KernelConfig::from_toml_str(
            "envelope_margin = 12.5\n[solver]\nmax_iterations = 50\n",
        )
        .unwrap();
        assert!((cfg.envelope_margin - 12.5).abs() < 1e-12);
        assert_eq!(cfg.solver.max_iterations, 50);
        assert!((cfg.solver.tolerance - 1e-6).abs() < 1e-18);
        assert!((cfg.contract_distance - 7.5).abs() < 1e-12);
    }

    #[test]
    fn empty_toml_is_default() {
        let cfg = KernelConfig::from_toml_str("").unwrap();
        assert_eq!(cfg, KernelConfig::default());
    }

    #[test]
    fn malformed_toml_is_config_error() {
        let err = KernelConfig::from_toml_str("envelope_margin = \"wide\"").unwrap_err();
        assert!(matches!(err, crate::KernelError::Config(_)));
    }
}
