use std::sync::{Mutex, MutexGuard, PoisonError};

use super::floorplan::{Floorplan, LevelReport};
use super::gate::LevelGate;
use crate::model::LevelId;

/// A [`Floorplan`] shared between threads.
///
/// Edits lock the whole plan. Level recomputation goes through a
/// [`LevelGate`], so a request made while the same level is being
/// recomputed is folded into one follow-up pass instead of interleaving.
#[derive(Debug, Default)]
pub struct SharedFloorplan {
    plan: Mutex<Floorplan>,
    gate: LevelGate,
}

impl SharedFloorplan {
    #[must_use]
    pub fn new(plan: Floorplan) -> Self {
        Self {
            plan: Mutex::new(plan),
            gate: LevelGate::new(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Floorplan> {
        self.plan.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Runs `f` with exclusive access to the plan.
    pub fn edit<T>(&self, f: impl FnOnce(&mut Floorplan) -> T) -> T {
        f(&mut self.lock())
    }

    /// Recomputes `level`, or returns `None` when the request was coalesced
    /// into a pass already running on another thread.
    pub fn request_recompute(&self, level: LevelId) -> Option<LevelReport> {
        self.gate.run(level, || self.lock().recompute_level(level))
    }

    #[must_use]
    pub fn is_recomputing(&self, level: LevelId) -> bool {
        self.gate.is_running(level)
    }

    #[must_use]
    pub fn into_inner(self) -> Floorplan {
        self.plan.into_inner().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::math::Point2;
    use std::sync::{Arc, Barrier};

    #[test]
    fn concurrent_requests_leave_a_consistent_level() {
        let shared = Arc::new(SharedFloorplan::default());
        let outline = [
            Point2::new(0.0, 0.0),
            Point2::new(300.0, 0.0),
            Point2::new(300.0, 300.0),
            Point2::new(0.0, 300.0),
        ];
        let id = shared.edit(|plan| plan.add_room(LevelId(0), &outline, 15.0));

        let requests = 8;
        let barrier = Arc::new(Barrier::new(requests));
        let handles: Vec<_> = (0..requests)
            .map(|_| {
                let shared = Arc::clone(&shared);
                let barrier = Arc::clone(&barrier);
                std::thread::spawn(move || {
                    barrier.wait();
                    shared.request_recompute(LevelId(0))
                })
            })
            .collect();
        let reports: Vec<LevelReport> = handles.into_iter().filter_map(|h| h.join().unwrap()).collect();
        assert!(!reports.is_empty());
        assert!(reports.len() <= requests);
        assert!(reports.iter().all(|r| r.failures.is_empty()));
        // Only the first pass does work; reruns find the level unchanged.
        assert!(reports.iter().filter(|r| !r.skipped).count() <= 1);

        assert!(!shared.is_recomputing(LevelId(0)));
        let plan = Arc::try_unwrap(shared).unwrap().into_inner();
        assert!(plan.room(id).unwrap().derived.is_some());
    }
}
