//! Observer types for the object model.
//!
//! An Observer is any single-argument callable that receives [`Change`]
//! events. This includes user callbacks as well as the internal alias
//! handlers.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use super::change::Change;
use crate::error::Result;

/// Token naming one observer registration in an [`ObserverPool`].
///
/// `observe` hands one out; passing it back to `unobserve` removes exactly
/// that registration, even when the same observer is registered twice.
///
/// [`ObserverPool`]: super::ObserverPool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverId(u64);

impl ObserverId {
    /// Draw the next token from a process-wide counter.
    pub fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for ObserverId {
    fn default() -> Self {
        Self::new()
    }
}

/// A receiver of change notifications.
pub trait Observer: Send + Sync {
    /// Handle one change. Errors propagate to whoever triggered the change.
    fn call(&self, change: &Change) -> Result<()>;

    /// Whether this observer still wants notifications.
    ///
    /// Pools skip observers that return `false` and drop them from the
    /// registration list.
    fn is_live(&self) -> bool {
        true
    }
}

/// An observer backed by a closure.
pub struct Callback {
    /// Stored boxed so callbacks of different closure types share one
    /// concrete observer type.
    call: Box<dyn Fn(&Change) -> Result<()> + Send + Sync>,
}

impl Callback {
    /// Create a new callback observer from a fallible closure.
    pub fn new<F>(call: F) -> Self
    where
        F: Fn(&Change) -> Result<()> + Send + Sync + 'static,
    {
        Self {
            call: Box::new(call),
        }
    }

    /// Create a callback observer from a closure that cannot fail.
    pub fn infallible<F>(call: F) -> Self
    where
        F: Fn(&Change) + Send + Sync + 'static,
    {
        Self::new(move |change| {
            call(change);
            Ok(())
        })
    }
}

impl Observer for Callback {
    fn call(&self, change: &Change) -> Result<()> {
        (self.call)(change)
    }
}

impl fmt::Debug for Callback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Callback").finish_non_exhaustive()
    }
}
