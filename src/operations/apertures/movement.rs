use tracing::debug;

use super::placement::{validate_aperture_placement, PlacementParams, PlacementResult};
use crate::error::{Result, StoreError};
use crate::math::distance_2d::distance_along;
use crate::math::Point2;
use crate::model::{Anchor, Aperture, ApertureId, Room, Transform, Wall};

/// Moves an aperture from one room onto a wall of another room, centered on
/// `drop_point` (world coordinates) and re-anchored at the wall start.
///
/// The outer `Result` reports lookup errors; the inner one is the
/// placement verdict. A refused move leaves both rooms untouched.
///
/// # Errors
///
/// `StoreError::ApertureNotFound` if `from` has no such aperture,
/// `StoreError::WallOutOfRange` if `to` has no wall `wall`.
pub fn move_aperture(
    from: &mut Room,
    to: &mut Room,
    aperture: ApertureId,
    wall: usize,
    drop_point: Point2,
    params: &PlacementParams,
) -> Result<PlacementResult> {
    let (from_wall, current) = from
        .find_aperture(aperture)
        .map(|(wi, a)| (wi, a.clone()))
        .ok_or_else(|| StoreError::ApertureNotFound(aperture.to_string()))?;
    let target = to.walls.get(wall).ok_or(StoreError::WallOutOfRange {
        wall,
        walls: to.walls.len(),
    })?;

    let verdict = plan(target, &to.transform, &current, drop_point, params);
    if let Ok(placement) = verdict {
        from.walls[from_wall].apertures.retain(|a| a.id != aperture);
        to.walls[wall].apertures.push(relocated(current, placement.distance));
        debug!(%aperture, from = %from.name, to = %to.name, wall, "aperture moved between rooms");
    }
    Ok(verdict)
}

/// [`move_aperture`] for a target wall in the same room.
///
/// # Errors
///
/// `StoreError::ApertureNotFound` or `StoreError::WallOutOfRange`.
pub fn move_aperture_within(
    room: &mut Room,
    aperture: ApertureId,
    wall: usize,
    drop_point: Point2,
    params: &PlacementParams,
) -> Result<PlacementResult> {
    let (from_wall, current) = room
        .find_aperture(aperture)
        .map(|(wi, a)| (wi, a.clone()))
        .ok_or_else(|| StoreError::ApertureNotFound(aperture.to_string()))?;
    let target = room.walls.get(wall).ok_or(StoreError::WallOutOfRange {
        wall,
        walls: room.walls.len(),
    })?;

    let verdict = plan(target, &room.transform, &current, drop_point, params);
    if let Ok(placement) = verdict {
        room.walls[from_wall].apertures.retain(|a| a.id != aperture);
        room.walls[wall].apertures.push(relocated(current, placement.distance));
        debug!(%aperture, room = %room.name, wall, "aperture moved");
    }
    Ok(verdict)
}

/// Validates a start-anchored placement of `aperture` centered on the
/// projection of `drop_point` onto `wall`, ignoring the aperture itself.
fn plan(wall: &Wall, transform: &Transform, aperture: &Aperture, drop_point: Point2, params: &PlacementParams) -> PlacementResult {
    let local = transform.to_local(&drop_point);
    let center = distance_along(&local, &wall.start, &wall.end);
    let others: Vec<Aperture> = wall.apertures.iter().filter(|a| a.id != aperture.id).cloned().collect();
    validate_aperture_placement(
        wall.length(),
        aperture.width,
        center - aperture.width / 2.0,
        Anchor::Start,
        &others,
        params,
    )
}

fn relocated(mut aperture: Aperture, distance: f64) -> Aperture {
    aperture.distance = distance;
    aperture.anchor = Anchor::Start;
    aperture.segment_id = None;
    aperture
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::model::LevelId;
    use crate::operations::apertures::PlacementReason;
    use approx::assert_relative_eq;

    #[test]
    fn move_within_room_reanchors_at_start() {
        let mut room = Room::rectangle(LevelId(0), 1, 400.0, 300.0, 15.0);
        let door = Aperture::door(90.0, 210.0, 20.0).with_anchor(Anchor::End);
        let id = door.id;
        room.walls[0].apertures.push(door);
        // Wall 1 runs (400,0) → (400,300); drop at y = 150.
        let verdict = move_aperture_within(&mut room, id, 1, Point2::new(400.0, 150.0), &PlacementParams::default())
            .unwrap();
        assert!(verdict.is_ok());
        assert!(room.walls[0].apertures.is_empty());
        let moved = &room.walls[1].apertures[0];
        assert_eq!(moved.anchor, Anchor::Start);
        assert_relative_eq!(moved.distance, 105.0);
    }

    #[test]
    fn sliding_along_the_same_wall_ignores_itself() {
        let mut room = Room::rectangle(LevelId(0), 1, 400.0, 300.0, 15.0);
        let door = Aperture::door(90.0, 210.0, 100.0);
        let id = door.id;
        room.walls[0].apertures.push(door);
        let verdict = move_aperture_within(&mut room, id, 0, Point2::new(160.0, 0.0), &PlacementParams::default())
            .unwrap();
        assert!(verdict.is_ok());
        assert_eq!(room.walls[0].apertures.len(), 1);
        assert_relative_eq!(room.walls[0].apertures[0].distance, 115.0);
    }

    #[test]
    fn refused_move_leaves_rooms_untouched() {
        let mut a = Room::rectangle(LevelId(0), 1, 400.0, 300.0, 15.0);
        let mut b = Room::rectangle(LevelId(0), 2, 100.0, 100.0, 15.0)
            .with_transform(crate::model::Transform::translation(500.0, 0.0));
        let door = Aperture::door(120.0, 210.0, 20.0);
        let id = door.id;
        a.walls[0].apertures.push(door);
        let verdict = move_aperture(&mut a, &mut b, id, 0, Point2::new(550.0, 0.0), &PlacementParams::default())
            .unwrap();
        assert_eq!(verdict.unwrap_err().reason, PlacementReason::TooWide);
        assert_eq!(a.walls[0].apertures.len(), 1);
        assert!(b.walls[0].apertures.is_empty());
    }

    #[test]
    fn move_between_rooms_uses_target_transform() {
        let mut a = Room::rectangle(LevelId(0), 1, 400.0, 300.0, 15.0);
        let mut b = Room::rectangle(LevelId(0), 2, 300.0, 300.0, 15.0)
            .with_transform(crate::model::Transform::translation(500.0, 0.0));
        let window = Aperture::window(100.0, 120.0, 20.0);
        let id = window.id;
        a.walls[0].apertures.push(window);
        move_aperture(&mut a, &mut b, id, 0, Point2::new(650.0, 0.0), &PlacementParams::default())
            .unwrap()
            .unwrap();
        assert!(a.walls[0].apertures.is_empty());
        assert_relative_eq!(b.walls[0].apertures[0].distance, 100.0);
    }

    #[test]
    fn unknown_aperture_and_wall_are_errors() {
        let mut room = Room::rectangle(LevelId(0), 1, 400.0, 300.0, 15.0);
        let params = PlacementParams::default();
        assert!(move_aperture_within(&mut room, ApertureId::fresh(), 0, Point2::origin(), &params).is_err());
        let door = Aperture::door(90.0, 210.0, 20.0);
        let id = door.id;
        room.walls[0].apertures.push(door);
        assert!(move_aperture_within(&mut room, id, 9, Point2::origin(), &params).is_err());
    }
}
