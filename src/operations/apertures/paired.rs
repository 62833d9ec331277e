use tracing::debug;

use crate::math::distance_2d::distance;
use crate::math::Point2;
use crate::model::{Aperture, Room, Wall};

/// World-space center of an aperture's opening on the wall centerline.
/// Two rooms sharing a wall share its centerline, so the doors of a pair
/// land on the same spot.
#[must_use]
pub fn door_world_center(room: &Room, wall: &Wall, aperture: &Aperture) -> Point2 {
    let (start, end) = aperture.absolute_range(wall.length());
    room.transform.to_world(&wall.centerline_point_at((start + end) / 2.0))
}

struct DoorRef {
    room: usize,
    wall: usize,
    slot: usize,
    center: Point2,
}

/// Finds doors in different rooms whose world centers lie within
/// `tolerance` of each other and copies the size and material of the door
/// in the older room (smaller `created_at`, then lower index) onto its
/// partner. Positions are never touched. Returns the number of doors
/// updated.
pub fn sync_paired_doors(rooms: &mut [&mut Room], tolerance: f64) -> usize {
    let doors: Vec<DoorRef> = rooms
        .iter()
        .enumerate()
        .flat_map(|(ri, room)| {
            room.walls.iter().enumerate().flat_map(move |(wi, wall)| {
                wall.apertures
                    .iter()
                    .enumerate()
                    .filter(|(_, a)| a.is_door())
                    .map(move |(si, a)| DoorRef {
                        room: ri,
                        wall: wi,
                        slot: si,
                        center: door_world_center(room, wall, a),
                    })
            })
        })
        .collect();

    let mut paired = vec![false; doors.len()];
    let mut updates: Vec<(usize, usize)> = Vec::new();
    for i in 0..doors.len() {
        if paired[i] {
            continue;
        }
        let partner = (i + 1..doors.len()).find(|&j| {
            !paired[j] && doors[j].room != doors[i].room && distance(&doors[i].center, &doors[j].center) <= tolerance
        });
        let Some(j) = partner else { continue };
        paired[i] = true;
        paired[j] = true;

        let key = |d: &DoorRef| (rooms[d.room].created_at, d.room);
        if key(&doors[i]) <= key(&doors[j]) {
            updates.push((i, j));
        } else {
            updates.push((j, i));
        }
    }

    let mut changed = 0;
    for (source, target) in updates {
        let (s, t) = (&doors[source], &doors[target]);
        let template = rooms[s.room].walls[s.wall].apertures[s.slot].clone();
        let door = &mut rooms[t.room].walls[t.wall].apertures[t.slot];
        if copy_shared_attributes(&template, door) {
            changed += 1;
            debug!(source = %template.id, target = %door.id, "paired door synchronized");
        }
    }
    changed
}

fn copy_shared_attributes(source: &Aperture, target: &mut Aperture) -> bool {
    let before = target.clone();
    target.width = source.width;
    target.height = source.height;
    target.sill_height = source.sill_height;
    target.thickness = source.thickness;
    target.attributes = source.attributes.clone();
    *target != before
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::model::{LevelId, Transform};

    /// Two 300 cm rooms whose shared wall carries a door in each.
    fn neighbours() -> (Room, Room) {
        let mut left = Room::rectangle(LevelId(0), 1, 300.0, 300.0, 15.0);
        let mut right = Room::rectangle(LevelId(0), 2, 300.0, 300.0, 15.0)
            .with_transform(Transform::translation(315.0, 0.0));
        // Left wall 1 runs (300,0) → (300,300): center at (307.5, 145).
        let mut door = Aperture::door(90.0, 210.0, 100.0);
        door.attributes.material = Some("oak".to_owned());
        left.walls[1].apertures.push(door);
        // Right wall 3 runs (0,300) → (0,0) local: center at (307.5, 147) world.
        right.walls[3].apertures.push(Aperture::door(100.0, 200.0, 103.0));
        (left, right)
    }

    #[test]
    fn older_room_wins() {
        let (mut left, mut right) = neighbours();
        let changed = sync_paired_doors(&mut [&mut left, &mut right], 5.0);
        assert_eq!(changed, 1);
        let synced = &right.walls[3].apertures[0];
        assert!((synced.width - 90.0).abs() < 1e-12);
        assert!((synced.height - 210.0).abs() < 1e-12);
        assert_eq!(synced.attributes.material.as_deref(), Some("oak"));
        assert!((synced.distance - 103.0).abs() < 1e-12);
    }

    #[test]
    fn distant_doors_are_not_paired() {
        let (mut left, mut right) = neighbours();
        // Center moves to y = 120, 25 cm from the left door.
        right.walls[3].apertures[0].distance = 130.0;
        assert_eq!(sync_paired_doors(&mut [&mut left, &mut right], 5.0), 0);
        assert!((right.walls[3].apertures[0].width - 100.0).abs() < 1e-12);
    }

    #[test]
    fn thick_shared_wall_still_pairs_at_default_tolerance() {
        let mut left = Room::rectangle(LevelId(0), 1, 300.0, 300.0, 30.0);
        let mut right = Room::rectangle(LevelId(0), 2, 300.0, 300.0, 30.0)
            .with_transform(Transform::translation(330.0, 0.0));
        left.walls[1].apertures.push(Aperture::door(90.0, 210.0, 100.0));
        right.walls[3].apertures.push(Aperture::door(80.0, 200.0, 115.0));
        let a = door_world_center(&left, &left.walls[1], &left.walls[1].apertures[0]);
        let b = door_world_center(&right, &right.walls[3], &right.walls[3].apertures[0]);
        assert!(distance(&a, &b) < 1e-9);
        assert_eq!(sync_paired_doors(&mut [&mut left, &mut right], 5.0), 1);
        assert!((right.walls[3].apertures[0].width - 90.0).abs() < 1e-12);
    }

    #[test]
    fn windows_are_ignored() {
        let mut a = Room::rectangle(LevelId(0), 1, 300.0, 300.0, 15.0);
        let mut b = a.clone();
        b.created_at = 2;
        a.walls[0].apertures.push(Aperture::window(100.0, 120.0, 50.0));
        b.walls[0].apertures.push(Aperture::window(80.0, 120.0, 60.0));
        assert_eq!(sync_paired_doors(&mut [&mut a, &mut b], 50.0), 0);
    }
}
