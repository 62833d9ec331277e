use tracing::debug;

use crate::config::KernelConfig;
use crate::math::polygon_2d::{point_in_polygon, remove_collinear};
use crate::math::Point2;
use crate::model::Room;
use crate::operations::offset::{offset_polygon, union_polygons, JoinType};

/// Collinearity tolerance used to clean centerlines before offsetting.
const CLEAN_TOLERANCE: f64 = 1e-6;

/// Caller-chosen envelope thicknesses, measured outward from the inner
/// wall face.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnvelopeParams {
    pub miter_limit: f64,
    pub interior_thickness: f64,
    pub exterior_thickness: f64,
}

impl Default for EnvelopeParams {
    fn default() -> Self {
        Self {
            miter_limit: 4.0,
            interior_thickness: 0.0,
            exterior_thickness: 15.0,
        }
    }
}

/// One merged centerline and the rooms whose centroid lies inside it.
/// Polygons are in world coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct MergedGroup {
    /// Indices into the room slice given to [`recalculate_envelopes`].
    pub rooms: Vec<usize>,
    pub centerline: Vec<Point2>,
    pub envelope: Vec<Point2>,
    pub inner_boundary: Vec<Point2>,
    pub contracted: Vec<Point2>,
}

/// Per-room envelope data in room-local coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct RoomEnvelope {
    pub group: usize,
    /// The room's own (unmerged) centerline.
    pub centerline: Vec<Point2>,
    pub envelope: Vec<Point2>,
    pub inner_boundary: Vec<Point2>,
    pub contracted: Vec<Point2>,
    /// The group centerline pulled in by half this room's wall thickness,
    /// in world coordinates. Runs along the room's inner faces wherever
    /// they are exterior, whatever the thickness.
    pub reference: Vec<Point2>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct EnvelopeOutput {
    pub groups: Vec<MergedGroup>,
    /// Indexed like the input room slice.
    pub rooms: Vec<RoomEnvelope>,
}

/// Runs the merge for every room on one level.
///
/// Each room's world-space centerline (inner faces pushed out by half the
/// wall thickness) is expanded by `config.envelope_margin`, all expanded
/// polygons are unioned, and every union component is contracted by the
/// same margin. A room joins the component containing its centroid, or
/// forms its own group if none does.
///
/// Reads rooms only; writing results back is up to the caller.
#[must_use]
pub fn recalculate_envelopes(rooms: &[&Room], params: &EnvelopeParams, config: &KernelConfig) -> EnvelopeOutput {
    if rooms.is_empty() {
        return EnvelopeOutput::default();
    }
    let miter = config.envelope_miter_limit;

    let centerlines: Vec<Vec<Point2>> = rooms
        .iter()
        .map(|room| {
            let cleaned = remove_collinear(&room.world_points(), CLEAN_TOLERANCE);
            offset_polygon(&cleaned, room.wall_thickness / 2.0, JoinType::Miter, miter)
        })
        .collect();

    let expanded: Vec<Vec<Point2>> = centerlines
        .iter()
        .map(|c| offset_polygon(c, config.envelope_margin, JoinType::Miter, miter))
        .collect();
    let merged: Vec<Vec<Point2>> = union_polygons(&expanded, config.fixed_point_scale)
        .iter()
        .map(|m| offset_polygon(m, -config.envelope_margin, JoinType::Miter, miter))
        .collect();

    let mut members: Vec<Vec<usize>> = vec![Vec::new(); merged.len()];
    let mut loners = Vec::new();
    for (i, room) in rooms.iter().enumerate() {
        let c = room.world_centroid();
        match merged.iter().position(|m| point_in_polygon(&c, m)) {
            Some(g) => members[g].push(i),
            None => loners.push(i),
        }
    }

    let mut groups = Vec::new();
    let mut room_group = vec![0usize; rooms.len()];
    let owned = merged.into_iter().zip(members).filter(|(_, m)| !m.is_empty());
    let lone = loners.into_iter().map(|i| (centerlines[i].clone(), vec![i]));
    for (centerline, member_rooms) in owned.chain(lone) {
        for &i in &member_rooms {
            room_group[i] = groups.len();
        }
        groups.push(derive_group(rooms, centerline, member_rooms, params, config));
    }

    debug!(rooms = rooms.len(), groups = groups.len(), "envelopes recalculated");

    let per_room = rooms
        .iter()
        .enumerate()
        .map(|(i, room)| {
            let group = &groups[room_group[i]];
            let local = |poly: &[Point2]| room.transform.points_to_local(poly);
            RoomEnvelope {
                group: room_group[i],
                centerline: local(&centerlines[i]),
                envelope: local(&group.envelope),
                inner_boundary: local(&group.inner_boundary),
                contracted: local(&group.contracted),
                reference: offset_polygon(&group.centerline, -room.wall_thickness / 2.0, JoinType::Miter, miter),
            }
        })
        .collect();

    EnvelopeOutput { groups, rooms: per_room }
}

/// Offsets a merged centerline into its envelope polygons, using the wall
/// thickness of the group's oldest room.
fn derive_group(
    rooms: &[&Room],
    centerline: Vec<Point2>,
    members: Vec<usize>,
    params: &EnvelopeParams,
    config: &KernelConfig,
) -> MergedGroup {
    let thickness = members
        .iter()
        .map(|&i| rooms[i])
        .min_by_key(|r| r.created_at)
        .map_or(0.0, |r| r.wall_thickness);
    let half = thickness / 2.0;
    let miter = params.miter_limit;
    MergedGroup {
        envelope: offset_polygon(&centerline, params.exterior_thickness - half, JoinType::Miter, miter),
        inner_boundary: offset_polygon(&centerline, params.interior_thickness - half, JoinType::Miter, miter),
        contracted: offset_polygon(&centerline, -config.contract_distance, JoinType::Miter, config.envelope_miter_limit),
        rooms: members,
        centerline,
    }
}
