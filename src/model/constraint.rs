use serde::{Deserialize, Serialize};

use super::ids::ConstraintId;

/// Kind of a geometric constraint on a room outline.
///
/// `Distance`, `Horizontal` and `Vertical` reference two vertex indices;
/// `Parallel`, `Perpendicular`, `Equal` and `Angle` reference two edge
/// indices (edge `i` runs from vertex `i` to vertex `i + 1`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConstraintKind {
    Distance,
    Angle,
    Horizontal,
    Vertical,
    Parallel,
    Perpendicular,
    Equal,
}

impl ConstraintKind {
    /// Whether `indices` address edges rather than vertices.
    #[must_use]
    pub fn references_edges(self) -> bool {
        matches!(
            self,
            Self::Angle | Self::Parallel | Self::Perpendicular | Self::Equal
        )
    }

    /// Whether the constraint needs a target `value`.
    #[must_use]
    pub fn needs_value(self) -> bool {
        matches!(self, Self::Distance | Self::Angle)
    }
}

/// A user constraint. Indices follow the room's current index scheme and
/// become invalid whenever that scheme changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Constraint {
    pub id: ConstraintId,
    #[serde(rename = "type")]
    pub kind: ConstraintKind,
    pub indices: Vec<usize>,
    /// Length in centimeters for `Distance`, degrees for `Angle`.
    pub value: Option<f64>,
    pub enabled: bool,
}

impl Constraint {
    #[must_use]
    pub fn new(kind: ConstraintKind, indices: Vec<usize>, value: Option<f64>) -> Self {
        Self {
            id: ConstraintId::fresh(),
            kind,
            indices,
            value,
            enabled: true,
        }
    }

    #[must_use]
    pub fn distance(a: usize, b: usize, length: f64) -> Self {
        Self::new(ConstraintKind::Distance, vec![a, b], Some(length))
    }

    #[must_use]
    pub fn horizontal(a: usize, b: usize) -> Self {
        Self::new(ConstraintKind::Horizontal, vec![a, b], None)
    }

    #[must_use]
    pub fn vertical(a: usize, b: usize) -> Self {
        Self::new(ConstraintKind::Vertical, vec![a, b], None)
    }

    #[must_use]
    pub fn perpendicular(edge_a: usize, edge_b: usize) -> Self {
        Self::new(ConstraintKind::Perpendicular, vec![edge_a, edge_b], None)
    }

    #[must_use]
    pub fn parallel(edge_a: usize, edge_b: usize) -> Self {
        Self::new(ConstraintKind::Parallel, vec![edge_a, edge_b], None)
    }

    #[must_use]
    pub fn equal(edge_a: usize, edge_b: usize) -> Self {
        Self::new(ConstraintKind::Equal, vec![edge_a, edge_b], None)
    }

    #[must_use]
    pub fn angle(edge_a: usize, edge_b: usize, degrees: f64) -> Self {
        Self::new(ConstraintKind::Angle, vec![edge_a, edge_b], Some(degrees))
    }
}
