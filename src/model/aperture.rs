use serde::{Deserialize, Serialize};

use super::ids::{ApertureId, SegmentId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApertureKind {
    Door,
    Window,
}

/// Which wall end an aperture's `distance` is measured from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Anchor {
    #[default]
    Start,
    End,
}

/// Presentation attributes carried verbatim and synchronized between paired doors.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApertureAttributes {
    pub material: Option<String>,
    pub color: Option<String>,
    pub glass: Option<String>,
}

/// A door or window attached to one wall.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Aperture {
    pub id: ApertureId,
    #[serde(rename = "type")]
    pub kind: ApertureKind,
    pub width: f64,
    pub height: f64,
    /// Distance from the anchored wall end to the near edge of the opening.
    pub distance: f64,
    pub anchor: Anchor,
    pub sill_height: Option<f64>,
    pub segment_id: Option<SegmentId>,
    pub thickness: Option<f64>,
    #[serde(default)]
    pub attributes: ApertureAttributes,
}

impl Aperture {
    /// Creates a start-anchored aperture with a fresh identity.
    #[must_use]
    pub fn new(kind: ApertureKind, width: f64, height: f64, distance: f64) -> Self {
        Self {
            id: ApertureId::fresh(),
            kind,
            width,
            height,
            distance,
            anchor: Anchor::Start,
            sill_height: None,
            segment_id: None,
            thickness: None,
            attributes: ApertureAttributes::default(),
        }
    }

    #[must_use]
    pub fn door(width: f64, height: f64, distance: f64) -> Self {
        Self::new(ApertureKind::Door, width, height, distance)
    }

    #[must_use]
    pub fn window(width: f64, height: f64, distance: f64) -> Self {
        Self::new(ApertureKind::Window, width, height, distance)
    }

    #[must_use]
    pub fn with_anchor(mut self, anchor: Anchor) -> Self {
        self.anchor = anchor;
        self
    }

    /// Start of the opening measured from the wall's own start.
    #[must_use]
    pub fn absolute_start(&self, wall_length: f64) -> f64 {
        absolute_start(self.distance, self.width, self.anchor, wall_length)
    }

    /// `[start, end]` of the opening measured from the wall's own start.
    #[must_use]
    pub fn absolute_range(&self, wall_length: f64) -> (f64, f64) {
        let start = self.absolute_start(wall_length);
        (start, start + self.width)
    }

    #[must_use]
    pub fn is_door(&self) -> bool {
        self.kind == ApertureKind::Door
    }
}

/// Converts an anchored distance into a start-relative position, mirroring
/// end-anchored placements.
#[must_use]
pub fn absolute_start(distance: f64, width: f64, anchor: Anchor, wall_length: f64) -> f64 {
    match anchor {
        Anchor::Start => distance,
        Anchor::End => wall_length - distance - width,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn end_anchor_is_mirrored() {
        let ap = Aperture::window(100.0, 120.0, 50.0).with_anchor(Anchor::End);
        let (s, e) = ap.absolute_range(400.0);
        assert!((s - 250.0).abs() < 1e-12);
        assert!((e - 350.0).abs() < 1e-12);
    }

    #[test]
    fn serde_uses_type_key() {
        let ap = Aperture::door(90.0, 210.0, 10.0);
        let text = toml::to_string(&ap).unwrap_or_default();
        assert!(text.contains("type = \"door\""), "{text}");
    }
}
