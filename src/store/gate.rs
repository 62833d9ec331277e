use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::debug;

use crate::model::LevelId;

/// Outcome of asking to recompute a level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// The caller owns the level until [`LevelGate::finish`] returns `false`.
    Run,
    /// A recomputation is in flight; it will run once more on the caller's behalf.
    Coalesced,
}

#[derive(Debug, Default, Clone, Copy)]
struct LevelState {
    running: bool,
    pending: bool,
}

/// One in-flight flag per level. Requests that arrive while a level is
/// being recomputed collapse into a single follow-up run.
#[derive(Debug, Default)]
pub struct LevelGate {
    levels: Mutex<HashMap<LevelId, LevelState>>,
}

impl LevelGate {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<LevelId, LevelState>> {
        self.levels.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn try_begin(&self, level: LevelId) -> Admission {
        let mut levels = self.lock();
        let state = levels.entry(level).or_default();
        if state.running {
            state.pending = true;
            debug!(%level, "recompute coalesced");
            Admission::Coalesced
        } else {
            state.running = true;
            Admission::Run
        }
    }

    /// Ends a run. Returns `true` if requests were coalesced meanwhile; the
    /// caller then still owns the level and must run again.
    pub fn finish(&self, level: LevelId) -> bool {
        let mut levels = self.lock();
        let state = levels.entry(level).or_default();
        if state.pending {
            state.pending = false;
            true
        } else {
            state.running = false;
            false
        }
    }

    #[must_use]
    pub fn is_running(&self, level: LevelId) -> bool {
        self.lock().get(&level).is_some_and(|s| s.running)
    }

    /// Runs `work` for `level` unless a run is already in flight, repeating
    /// it once per batch of coalesced requests. Returns the last result, or
    /// `None` when the request was coalesced into another caller's run.
    pub fn run<T>(&self, level: LevelId, mut work: impl FnMut() -> T) -> Option<T> {
        if self.try_begin(level) == Admission::Coalesced {
            return None;
        }
        loop {
            let result = work();
            if !self.finish(level) {
                return Some(result);
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn requests_during_a_run_coalesce_into_one_rerun() {
        let gate = LevelGate::new();
        let level = LevelId(1);
        assert_eq!(gate.try_begin(level), Admission::Run);
        assert_eq!(gate.try_begin(level), Admission::Coalesced);
        assert_eq!(gate.try_begin(level), Admission::Coalesced);
        assert!(gate.finish(level));
        assert!(gate.is_running(level));
        assert!(!gate.finish(level));
        assert!(!gate.is_running(level));
    }

    #[test]
    fn levels_are_independent() {
        let gate = LevelGate::new();
        assert_eq!(gate.try_begin(LevelId(0)), Admission::Run);
        assert_eq!(gate.try_begin(LevelId(1)), Admission::Run);
    }

    #[test]
    fn threaded_requests_never_run_more_often_than_asked() {
        use std::sync::atomic::{AtomicUsize, Ordering};
        use std::sync::{Arc, Barrier};
        use std::time::Duration;

        let requests = 8;
        let gate = Arc::new(LevelGate::new());
        let runs = Arc::new(AtomicUsize::new(0));
        let active = Arc::new(AtomicUsize::new(0));
        let barrier = Arc::new(Barrier::new(requests));
        let handles: Vec<_> = (0..requests)
            .map(|_| {
                let (gate, runs, active, barrier) =
                    (Arc::clone(&gate), Arc::clone(&runs), Arc::clone(&active), Arc::clone(&barrier));
                std::thread::spawn(move || {
                    barrier.wait();
                    gate.run(LevelId(0), || {
                        assert_eq!(active.fetch_add(1, Ordering::SeqCst), 0, "two runs overlapped");
                        runs.fetch_add(1, Ordering::SeqCst);
                        std::thread::sleep(Duration::from_millis(2));
                        active.fetch_sub(1, Ordering::SeqCst);
                    })
                    .is_some()
                })
            })
            .collect();
        let owners = handles.into_iter().map(|h| h.join().unwrap()).filter(|&ran| ran).count();
        let runs = runs.load(Ordering::SeqCst);
        assert!(owners >= 1);
        assert!(runs >= owners);
        assert!(runs <= requests);
        assert!(!gate.is_running(LevelId(0)));
    }

    #[test]
    fn run_repeats_for_requests_made_while_running() {
        let gate = LevelGate::new();
        let level = LevelId(0);
        let mut runs = 0;
        let result = gate.run(level, || {
            runs += 1;
            if runs == 1 {
                assert_eq!(gate.try_begin(level), Admission::Coalesced);
            }
            runs
        });
        assert_eq!(result, Some(2));
        assert!(!gate.is_running(level));
    }
}
