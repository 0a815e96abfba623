//! Alias Recursion Guard
//!
//! Tracks which alias accesses are currently running on this thread, so that
//! an alias whose resolution leads back to itself fails with
//! [`Error::AliasRecursion`] instead of overflowing the stack.
//!
//! # Implementation
//!
//! We use a thread-local stack of `(atom id, alias name, access)` entries.
//! Entering a guard pushes an entry; dropping it pops. Because dispatch is
//! synchronous, the stack mirrors the call stack exactly.
//!
//! Entries are keyed by access kind, so an observer reached from a forwarded
//! write may still read the alias it was written through.

use std::cell::RefCell;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::model::Atom;

thread_local! {
    static GUARD_STACK: RefCell<Vec<GuardEntry>> = const { RefCell::new(Vec::new()) };
}

/// The kind of alias access a guard covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Get,
    Set,
    Delete,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct GuardEntry {
    atom: u64,
    alias: Arc<str>,
    access: Access,
}

/// Guard that pops its entry when dropped.
pub struct AliasGuard {
    entry: GuardEntry,
}

impl AliasGuard {
    /// Mark `access` of `alias` on `atom` as in progress.
    ///
    /// Fails if it already is.
    pub fn enter(atom: &Atom, alias: &Arc<str>, access: Access) -> Result<Self> {
        let entry = GuardEntry {
            atom: atom.id(),
            alias: Arc::clone(alias),
            access,
        };
        GUARD_STACK.with(|stack| {
            let mut stack = stack.borrow_mut();
            if stack.contains(&entry) {
                return Err(Error::AliasRecursion {
                    alias: alias.to_string(),
                });
            }
            stack.push(entry.clone());
            Ok(())
        })?;
        Ok(Self { entry })
    }

    /// Whether `access` of `alias` on `atom` is in progress on this thread.
    pub fn is_guarded(atom: &Atom, alias: &str, access: Access) -> bool {
        GUARD_STACK.with(|stack| {
            stack.borrow().iter().any(|entry| {
                entry.atom == atom.id() && &*entry.alias == alias && entry.access == access
            })
        })
    }
}

impl Drop for AliasGuard {
    fn drop(&mut self) {
        GUARD_STACK.with(|stack| {
            let popped = stack.borrow_mut().pop();
            if let Some(entry) = popped {
                debug_assert_eq!(entry, self.entry, "AliasGuard mismatch");
            }
        });
    }
}
