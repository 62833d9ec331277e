use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use slotmap::SlotMap;
use tracing::{debug, error, info_span};

use crate::config::KernelConfig;
use crate::error::{KernelError, Result, StoreError};
use crate::math::Point2;
use crate::model::{Anchor, Aperture, ApertureId, DerivedGeometry, LevelId, Room, RoomId, VertexId};
use crate::operations::apertures::{
    self, sync_paired_doors, validate_aperture_placement, PlacementParams, PlacementResult,
};
use crate::operations::envelope::{insert_envelope_vertices, recalculate_envelopes, EnvelopeParams};
use crate::operations::solver::{solve_room, SolveOptions, SolveOutcome};
use crate::operations::walls::{apply_classification, classify_segments, ClassifyParams};

/// A room whose part of a level pass failed; its previous walls are kept.
#[derive(Debug)]
pub struct RoomFailure {
    pub room: RoomId,
    pub error: KernelError,
}

/// Summary of one [`Floorplan::recompute_level`] pass.
#[derive(Debug, Default)]
pub struct LevelReport {
    pub rooms: usize,
    /// The level was unchanged since the previous pass.
    pub skipped: bool,
    pub groups: usize,
    pub inserted_vertices: usize,
    pub synced_doors: usize,
    pub failures: Vec<RoomFailure>,
}

/// Arena that owns every room of a floorplan.
///
/// Rooms are addressed by [`RoomId`] (a generational index). Each room is
/// mutated only by its own edits or by a level pass, which writes derived
/// data and inserts envelope vertices.
#[derive(Debug, Default)]
pub struct Floorplan {
    rooms: SlotMap<RoomId, Room>,
    next_created_at: u64,
    config: KernelConfig,
    envelope: EnvelopeParams,
}

impl Floorplan {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_config(config: KernelConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn config(&self) -> &KernelConfig {
        &self.config
    }

    pub fn set_envelope_params(&mut self, params: EnvelopeParams) {
        self.envelope = params;
        for room in self.rooms.values_mut() {
            room.invalidate_derived();
        }
    }

    /// Creates a room from a room-local outline and returns its key.
    pub fn add_room(&mut self, level: LevelId, outline: &[Point2], wall_thickness: f64) -> RoomId {
        self.next_created_at += 1;
        self.rooms
            .insert(Room::new(level, self.next_created_at, outline, wall_thickness))
    }

    /// Inserts a prepared room, stamping it as the newest.
    pub fn insert_room(&mut self, mut room: Room) -> RoomId {
        self.next_created_at += 1;
        room.created_at = self.next_created_at;
        self.rooms.insert(room)
    }

    /// # Errors
    ///
    /// Returns `StoreError::RoomNotFound` for an unknown key.
    pub fn room(&self, id: RoomId) -> Result<&Room> {
        self.rooms.get(id).ok_or_else(|| not_found(id))
    }

    /// # Errors
    ///
    /// Returns `StoreError::RoomNotFound` for an unknown key.
    pub fn room_mut(&mut self, id: RoomId) -> Result<&mut Room> {
        self.rooms.get_mut(id).ok_or_else(|| not_found(id))
    }

    /// # Errors
    ///
    /// Returns `StoreError::RoomNotFound` for an unknown key.
    pub fn remove_room(&mut self, id: RoomId) -> Result<Room> {
        self.rooms.remove(id).ok_or_else(|| not_found(id))
    }

    /// Rooms on `level`, oldest first.
    #[must_use]
    pub fn rooms_on_level(&self, level: LevelId) -> Vec<RoomId> {
        let mut ids: Vec<(u64, RoomId)> = self
            .rooms
            .iter()
            .filter(|(_, r)| r.level_id == level)
            .map(|(id, r)| (r.created_at, id))
            .collect();
        ids.sort_by_key(|&(created, _)| created);
        ids.into_iter().map(|(_, id)| id).collect()
    }

    /// Moves a vertex of a room, regenerating its walls.
    ///
    /// # Errors
    ///
    /// `StoreError::RoomNotFound`, or a wall regeneration error.
    pub fn move_vertex(&mut self, room: RoomId, vertex: VertexId, to: Point2) -> Result<bool> {
        self.room_mut(room)?.move_vertex(vertex, to)
    }

    /// Solves a room's constraints and stores the result on success. A
    /// failed solve leaves the stored room as it was.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::RoomNotFound` for an unknown key.
    pub fn solve_room(&mut self, id: RoomId, fixed: Option<usize>) -> Result<SolveOutcome> {
        let options = SolveOptions::from_config(&self.config.solver);
        let outcome = solve_room(self.room(id)?, fixed, &options);
        if let SolveOutcome::Solved { room, .. } = &outcome {
            *self.room_mut(id)? = room.clone();
        }
        Ok(outcome)
    }

    /// Checks a placement on a wall without changing anything.
    ///
    /// # Errors
    ///
    /// `StoreError::RoomNotFound` or `StoreError::WallOutOfRange`.
    pub fn validate_aperture(
        &self,
        room: RoomId,
        wall: usize,
        width: f64,
        distance: f64,
        anchor: Anchor,
    ) -> Result<PlacementResult> {
        let room = self.room(room)?;
        let target = room.walls.get(wall).ok_or(StoreError::WallOutOfRange {
            wall,
            walls: room.walls.len(),
        })?;
        Ok(validate_aperture_placement(
            target.length(),
            width,
            distance,
            anchor,
            &target.apertures,
            &PlacementParams::from_config(&self.config),
        ))
    }

    /// Validates and, if accepted, attaches an aperture to a wall.
    ///
    /// # Errors
    ///
    /// `StoreError::RoomNotFound` or `StoreError::WallOutOfRange`.
    pub fn add_aperture(&mut self, room: RoomId, wall: usize, aperture: Aperture) -> Result<PlacementResult> {
        let verdict = self.validate_aperture(room, wall, aperture.width, aperture.distance, aperture.anchor)?;
        if verdict.is_ok() {
            self.room_mut(room)?.walls[wall].apertures.push(aperture);
        }
        Ok(verdict)
    }

    /// Moves an aperture onto `wall` of room `to`, centered on `drop_point`
    /// (world coordinates).
    ///
    /// # Errors
    ///
    /// `StoreError::RoomNotFound`, `StoreError::ApertureNotFound` or
    /// `StoreError::WallOutOfRange`.
    pub fn move_aperture(
        &mut self,
        from: RoomId,
        to: RoomId,
        aperture: ApertureId,
        wall: usize,
        drop_point: Point2,
    ) -> Result<PlacementResult> {
        let params = PlacementParams::from_config(&self.config);
        if from == to {
            return apertures::move_aperture_within(self.room_mut(from)?, aperture, wall, drop_point, &params);
        }
        self.room(from)?;
        self.room(to)?;
        let Some([source, target]) = self.rooms.get_disjoint_mut([from, to]) else {
            return Err(not_found(from));
        };
        apertures::move_aperture(source, target, aperture, wall, drop_point, &params)
    }

    /// Recomputes every derived field of the rooms on `level`: envelopes,
    /// envelope vertex insertion, wall segments and paired doors.
    ///
    /// Skipped when nothing on the level changed since the last pass. A room
    /// whose vertex insertion fails is left exactly as it was and is listed
    /// in the report's failures.
    pub fn recompute_level(&mut self, level: LevelId) -> LevelReport {
        let _span = info_span!("recompute_level", %level).entered();
        let ids = self.rooms_on_level(level);
        let mut report = LevelReport {
            rooms: ids.len(),
            ..LevelReport::default()
        };
        if ids.is_empty() {
            return report;
        }

        let fingerprint = self.level_fingerprint(&ids);
        if ids
            .iter()
            .all(|&id| self.rooms[id].derived.as_ref().is_some_and(|d| d.fingerprint == fingerprint))
        {
            debug!("level unchanged; skipping");
            report.skipped = true;
            return report;
        }

        let output = {
            let rooms: Vec<&Room> = ids.iter().map(|&id| &self.rooms[id]).collect();
            recalculate_envelopes(&rooms, &self.envelope, &self.config)
        };
        report.groups = output.groups.len();

        let mut failed = vec![false; ids.len()];
        for (i, &id) in ids.iter().enumerate() {
            let reference = &output.rooms[i].reference;
            match insert_envelope_vertices(&mut self.rooms[id], reference, self.config.coincidence_tolerance) {
                Ok(n) => report.inserted_vertices += n,
                Err(error) => {
                    error!(room = ?id, %error, "envelope vertex insertion failed; keeping previous walls");
                    failed[i] = true;
                    report.failures.push(RoomFailure { room: id, error });
                }
            }
        }

        let classify = ClassifyParams::from_config(&self.config);
        let mut pools = Vec::with_capacity(ids.len());
        for (i, &id) in ids.iter().enumerate() {
            if failed[i] {
                pools.push(None);
                continue;
            }
            let room = &mut self.rooms[id];
            let classification = classify_segments(room, std::slice::from_ref(&output.rooms[i].reference), &classify);
            pools.push(Some(apply_classification(room, classification)));
        }

        {
            let mut rooms: Vec<&mut Room> = self
                .rooms
                .iter_mut()
                .filter(|(_, r)| r.level_id == level)
                .map(|(_, r)| r)
                .collect();
            report.synced_doors = sync_paired_doors(&mut rooms, self.config.paired_door_tolerance);
        }

        let fingerprint = self.level_fingerprint(&ids);
        for ((i, &id), segment_vertices) in ids.iter().enumerate().zip(pools) {
            // A failed room keeps its old derived data and is retried next pass.
            let Some(segment_vertices) = segment_vertices else { continue };
            let envelope = &output.rooms[i];
            self.rooms[id].derived = Some(DerivedGeometry {
                fingerprint,
                centerline: envelope.centerline.clone(),
                envelope: envelope.envelope.clone(),
                inner_boundary: envelope.inner_boundary.clone(),
                contracted: envelope.contracted.clone(),
                segment_vertices,
            });
        }

        debug!(
            rooms = report.rooms,
            groups = report.groups,
            inserted = report.inserted_vertices,
            synced = report.synced_doors,
            failures = report.failures.len(),
            "level recomputed"
        );
        report
    }

    /// Hash of everything the level pass reads: outlines, identities,
    /// thickness, transforms and creation order.
    fn level_fingerprint(&self, ids: &[RoomId]) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.envelope.miter_limit.to_bits().hash(&mut hasher);
        self.envelope.interior_thickness.to_bits().hash(&mut hasher);
        self.envelope.exterior_thickness.to_bits().hash(&mut hasher);
        for &id in ids {
            let room = &self.rooms[id];
            id.hash(&mut hasher);
            room.created_at.hash(&mut hasher);
            room.wall_thickness.to_bits().hash(&mut hasher);
            let t = &room.transform;
            for v in [t.position.x, t.position.y, t.rotation, t.scale.x, t.scale.y] {
                v.to_bits().hash(&mut hasher);
            }
            for vertex in &room.vertices {
                vertex.id.hash(&mut hasher);
                vertex.x.to_bits().hash(&mut hasher);
                vertex.y.to_bits().hash(&mut hasher);
            }
        }
        hasher.finish()
    }
}

fn not_found(id: RoomId) -> KernelError {
    StoreError::RoomNotFound(format!("{id:?}")).into()
}
