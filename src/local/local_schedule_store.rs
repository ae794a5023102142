use std::{
    sync::{Arc, Mutex},
    time::Instant,
};

use dashmap::DashMap;

use crate::{
    FermataError,
    common::{BufferKey, Nanos, ScheduleState},
};

/// Process-local schedule store with lock-per-key granularity.
///
/// The map shard lock is held only long enough to fetch or create a key's
/// slot; the policy then runs under that slot's own mutex, so distinct keys
/// never contend with each other's critical sections.
///
/// Instants are measured as nanoseconds from the store's construction epoch,
/// which keeps [`ScheduleState`] plain data the policy can reason about.
#[derive(Debug)]
pub struct LocalScheduleStore {
    epoch: Instant,
    slots: DashMap<BufferKey, Arc<Mutex<ScheduleState>>>,
}

impl LocalScheduleStore {
    pub(crate) fn new() -> Self {
        Self {
            epoch: Instant::now(),
            slots: DashMap::new(),
        }
    }

    pub(crate) fn now(&self) -> Nanos {
        u64::try_from(self.epoch.elapsed().as_nanos()).unwrap_or(u64::MAX)
    }

    /// Run `f` against the state for `key` under that key's exclusive lock.
    ///
    /// The state is created with no anchor on first sight. The lock is
    /// released on every exit path; a poisoned slot (a previous holder
    /// panicked mid-decision) surfaces as [`FermataError::Backend`] rather
    /// than silently running unbuffered.
    pub fn with_lock<T>(
        &self,
        key: &BufferKey,
        f: impl FnOnce(&mut ScheduleState) -> T,
    ) -> Result<T, FermataError> {
        let slot = {
            let entry = self.slots.entry(*key).or_default();
            Arc::clone(entry.value())
        };

        let mut state = slot
            .lock()
            .map_err(|_| FermataError::Backend("schedule slot lock poisoned".to_string()))?;

        Ok(f(&mut state))
    } // end method with_lock

    /// Number of keys that have been seen by this store.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Whether no key has been seen yet.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}
