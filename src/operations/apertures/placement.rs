use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::KernelConfig;
use crate::math::TOLERANCE;
use crate::model::aperture::absolute_start;
use crate::model::{Anchor, Aperture};

/// Why a placement was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlacementReason {
    /// The aperture is wider than the wall; no search is attempted.
    TooWide,
    OutOfBounds,
    Collision,
}

/// An accepted position, expressed against the chosen anchor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Placement {
    pub distance: f64,
    pub anchor: Anchor,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlacementFailure {
    pub reason: PlacementReason,
    pub suggestion: Option<Placement>,
}

pub type PlacementResult = std::result::Result<Placement, PlacementFailure>;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlacementParams {
    /// Overlaps up to this length count as touching.
    pub touch_tolerance: f64,
    pub search_step: f64,
}

impl PlacementParams {
    #[must_use]
    pub fn from_config(config: &KernelConfig) -> Self {
        Self {
            touch_tolerance: config.aperture_touch_tolerance,
            search_step: config.aperture_search_step,
        }
    }
}

impl Default for PlacementParams {
    fn default() -> Self {
        Self::from_config(&KernelConfig::default())
    }
}

/// Validates an aperture of `width` at `(distance, anchor)` on a wall of
/// `wall_length` against the `others` already on that wall.
///
/// On failure the result carries the nearest free slot, if any.
pub fn validate_aperture_placement(
    wall_length: f64,
    width: f64,
    distance: f64,
    anchor: Anchor,
    others: &[Aperture],
    params: &PlacementParams,
) -> PlacementResult {
    if width > wall_length + TOLERANCE {
        return Err(PlacementFailure {
            reason: PlacementReason::TooWide,
            suggestion: None,
        });
    }

    let start = absolute_start(distance, width, anchor, wall_length);
    let reason = if distance < -TOLERANCE || distance + width > wall_length + TOLERANCE {
        PlacementReason::OutOfBounds
    } else if collides(start, start + width, wall_length, others, params.touch_tolerance) {
        PlacementReason::Collision
    } else {
        return Ok(Placement { distance, anchor });
    };

    let suggestion = find_free_slot(wall_length, width, start, others, params);
    debug!(?reason, requested = start, ?suggestion, "aperture placement refused");
    Err(PlacementFailure { reason, suggestion })
}

/// Scans outward from `requested_start` (measured from the wall start) in
/// `search_step` increments. At each candidate point the opening may start
/// there (start-anchored) or end there (end-anchored); the fitting,
/// non-colliding candidate with the smallest displacement wins.
///
/// A request off the wall is first pulled back onto `[0, wall_length - width]`,
/// so the scan never covers more than one wall length.
#[must_use]
pub fn find_free_slot(
    wall_length: f64,
    width: f64,
    requested_start: f64,
    others: &[Aperture],
    params: &PlacementParams,
) -> Option<Placement> {
    if width > wall_length + TOLERANCE || params.search_step <= 0.0 {
        return None;
    }
    let max_start = (wall_length - width).max(0.0);
    let origin = if requested_start.is_nan() {
        0.0
    } else {
        requested_start.clamp(0.0, max_start)
    };
    let step = params.search_step;

    let mut starts = nearest_first(origin, step, origin, max_start)
        .map(|abs| (abs, Anchor::Start))
        .peekable();
    let mut ends = nearest_first(origin - width, step, origin, max_start)
        .map(|abs| (abs, Anchor::End))
        .peekable();
    let mut by_displacement = std::iter::from_fn(move || {
        let take_start = match (starts.peek(), ends.peek()) {
            (Some(s), Some(e)) => (s.0 - origin).abs() <= (e.0 - origin).abs(),
            (Some(_), None) => true,
            (None, Some(_)) => false,
            (None, None) => return None,
        };
        if take_start {
            starts.next()
        } else {
            ends.next()
        }
    });

    by_displacement
        .find(|&(abs, _)| !collides(abs, abs + width, wall_length, others, params.touch_tolerance))
        .map(|(abs, anchor)| Placement {
            distance: match anchor {
                Anchor::Start => abs,
                Anchor::End => (wall_length - abs - width).max(0.0),
            },
            anchor,
        })
}

/// Grid points `base + j * step` inside `[0, max]`, nearest to `center`
/// first. Ties go to the larger point.
#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
fn nearest_first(base: f64, step: f64, center: f64, max: f64) -> impl Iterator<Item = f64> {
    let at = move |j: i64| base + j as f64 * step;
    let pivot = ((center - base) / step).round() as i64;
    let mut above = pivot;
    let mut below = pivot - 1;
    std::iter::from_fn(move || loop {
        let up = at(above);
        let down = at(below);
        let up_open = up <= max + TOLERANCE;
        let down_open = down >= -TOLERANCE;
        if !up_open && !down_open {
            return None;
        }
        let take_up = up_open && (!down_open || (up - center).abs() <= (down - center).abs());
        let point = if take_up {
            above += 1;
            up
        } else {
            below -= 1;
            down
        };
        if (-TOLERANCE..=max + TOLERANCE).contains(&point) {
            return Some(point.clamp(0.0, max));
        }
    })
}

fn collides(start: f64, end: f64, wall_length: f64, others: &[Aperture], tolerance: f64) -> bool {
    others.iter().any(|other| {
        let (os, oe) = other.absolute_range(wall_length);
        end.min(oe) - start.max(os) > tolerance
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn first_window() -> Vec<Aperture> {
        vec![Aperture::window(100.0, 120.0, 50.0)]
    }

    #[test]
    fn free_position_is_accepted() {
        let ok = validate_aperture_placement(400.0, 80.0, 200.0, Anchor::Start, &first_window(), &PlacementParams::default())
            .unwrap();
        assert_relative_eq!(ok.distance, 200.0);
    }

    #[test]
    fn overlap_is_a_collision_with_nearby_suggestion() {
        let others = first_window();
        let failure =
            validate_aperture_placement(400.0, 80.0, 120.0, Anchor::Start, &others, &PlacementParams::default())
                .unwrap_err();
        assert_eq!(failure.reason, PlacementReason::Collision);
        let s = failure.suggestion.unwrap();
        assert_eq!(s.anchor, Anchor::Start);
        assert_relative_eq!(s.distance, 150.0);
        let start = absolute_start(s.distance, 80.0, s.anchor, 400.0);
        assert!(start >= 0.0 && start + 80.0 <= 400.0);
    }

    #[test]
    fn touching_is_not_overlapping() {
        let others = first_window();
        assert!(
            validate_aperture_placement(400.0, 80.0, 149.5, Anchor::Start, &others, &PlacementParams::default())
                .is_ok()
        );
    }

    #[test]
    fn end_anchored_apertures_are_mirrored() {
        // Existing window occupies 250..350 measured from the start.
        let others = vec![Aperture::window(100.0, 120.0, 50.0).with_anchor(Anchor::End)];
        let failure =
            validate_aperture_placement(400.0, 60.0, 280.0, Anchor::Start, &others, &PlacementParams::default())
                .unwrap_err();
        assert_eq!(failure.reason, PlacementReason::Collision);
    }

    #[test]
    fn too_wide_skips_the_search() {
        let failure =
            validate_aperture_placement(100.0, 120.0, 0.0, Anchor::Start, &[], &PlacementParams::default())
                .unwrap_err();
        assert_eq!(failure.reason, PlacementReason::TooWide);
        assert!(failure.suggestion.is_none());
    }

    #[test]
    fn out_of_bounds_suggests_a_fitting_slot() {
        let failure =
            validate_aperture_placement(400.0, 90.0, 350.0, Anchor::Start, &[], &PlacementParams::default())
                .unwrap_err();
        assert_eq!(failure.reason, PlacementReason::OutOfBounds);
        let s = failure.suggestion.unwrap();
        let start = absolute_start(s.distance, 90.0, s.anchor, 400.0);
        assert!(start + 90.0 <= 400.0 + 1e-9);
        assert!((start - 310.0).abs() <= 5.0);
    }

    #[test]
    fn far_off_requests_are_pulled_back_onto_the_wall() {
        let params = PlacementParams::default();
        let failure = validate_aperture_placement(400.0, 80.0, 1e12, Anchor::Start, &[], &params).unwrap_err();
        assert_eq!(failure.reason, PlacementReason::OutOfBounds);
        let s = failure.suggestion.unwrap();
        assert_relative_eq!(absolute_start(s.distance, 80.0, s.anchor, 400.0), 320.0, epsilon = 1e-9);

        let failure = validate_aperture_placement(400.0, 80.0, -1e12, Anchor::Start, &[], &params).unwrap_err();
        assert_eq!(failure.reason, PlacementReason::OutOfBounds);
        let s = failure.suggestion.unwrap();
        assert_relative_eq!(absolute_start(s.distance, 80.0, s.anchor, 400.0), 0.0, epsilon = 1e-9);
    }

    #[test]
    fn far_off_request_skips_past_an_occupied_end() {
        // The last 100 cm are taken; the nearest free slot ends where they begin.
        let others = vec![Aperture::window(100.0, 120.0, 0.0).with_anchor(Anchor::End)];
        let s = find_free_slot(400.0, 80.0, f64::MAX, &others, &PlacementParams::default()).unwrap();
        let start = absolute_start(s.distance, 80.0, s.anchor, 400.0);
        assert_relative_eq!(start, 220.0, epsilon = 1e-9);
    }

    #[test]
    fn full_wall_reports_collision_without_suggestion() {
        let others = vec![Aperture::window(200.0, 120.0, 0.0), Aperture::window(200.0, 120.0, 200.0)];
        let failure =
            validate_aperture_placement(400.0, 50.0, 100.0, Anchor::Start, &others, &PlacementParams::default())
                .unwrap_err();
        assert_eq!(failure.reason, PlacementReason::Collision);
        assert!(failure.suggestion.is_none());
    }
}
