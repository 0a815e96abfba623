//! Per-atom observer registrations, keyed by attribute name.
//!
//! # Dispatch
//!
//! `notify` copies the observer list for the name and releases the lock
//! before invoking anything, so observers may freely observe, unobserve or
//! mutate the atom that is notifying them. Observers added during a
//! dispatch first fire on the next one.
//!
//! Observers whose [`Observer::is_live`] returns `false` are skipped and
//! removed from the list.

use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::RwLock;
use smallvec::SmallVec;

use super::change::Change;
use super::observer::{Observer, ObserverId};
use crate::error::Result;

type Entries = SmallVec<[(ObserverId, Arc<dyn Observer>); 4]>;

#[derive(Default)]
pub struct ObserverPool {
    observers: RwLock<IndexMap<Arc<str>, Entries>>,
}

impl ObserverPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an observer for `name`, returning its removal token.
    pub fn add(&self, name: &str, observer: Arc<dyn Observer>) -> ObserverId {
        let id = ObserverId::new();
        let mut observers = self.observers.write();
        match observers.get_mut(name) {
            Some(entries) => entries.push((id, observer)),
            None => {
                let mut entries = Entries::new();
                entries.push((id, observer));
                observers.insert(Arc::from(name), entries);
            }
        }
        id
    }

    /// Remove one registration. Returns whether it was present.
    pub fn remove(&self, name: &str, id: ObserverId) -> bool {
        let mut observers = self.observers.write();
        let Some(entries) = observers.get_mut(name) else {
            return false;
        };
        let before = entries.len();
        entries.retain(|(entry_id, _)| *entry_id != id);
        let removed = entries.len() != before;
        if entries.is_empty() {
            observers.shift_remove(name);
        }
        removed
    }

    /// Number of registrations for `name`, live or not.
    pub fn count(&self, name: &str) -> usize {
        self.observers.read().get(name).map_or(0, SmallVec::len)
    }

    /// Invoke every live observer of `name` in registration order.
    ///
    /// Stops at the first error. Dead observers seen before that point are
    /// pruned either way.
    pub fn notify(&self, name: &str, change: &Change) -> Result<()> {
        let snapshot: Entries = match self.observers.read().get(name) {
            Some(entries) => entries.clone(),
            None => return Ok(()),
        };

        let mut dead: SmallVec<[ObserverId; 4]> = SmallVec::new();
        let mut result = Ok(());
        for (id, observer) in &snapshot {
            if !observer.is_live() {
                dead.push(*id);
                continue;
            }
            if let Err(err) = observer.call(change) {
                result = Err(err);
                break;
            }
        }

        if !dead.is_empty() {
            tracing::trace!(name, pruned = dead.len(), "pruning inert observers");
            for id in dead {
                self.remove(name, id);
            }
        }
        result
    }
}

impl std::fmt::Debug for ObserverPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let observers = self.observers.read();
        f.debug_map()
            .entries(observers.iter().map(|(name, entries)| (name, entries.len())))
            .finish()
    }
}
