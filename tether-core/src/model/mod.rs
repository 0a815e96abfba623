//! Reactive Object Model
//!
//! This module implements the small object model that alias members live in:
//! classes with named members, atoms (instances) holding per-member storage,
//! and name-keyed observers that receive a [`Change`] whenever a member is
//! mutated.
//!
//! # Concepts
//!
//! ## Classes and Members
//!
//! A [`Class`] is an immutable, ordered table of [`Member`]s built once with a
//! [`ClassBuilder`]. Members are shared by every atom of the class. A class
//! derived from another starts from a copy of the parent's member table.
//!
//! ## Atoms
//!
//! An [`Atom`] is a reference-counted instance of a class. Atoms are the only
//! values with the [`Observable`] capability, so they are the only values an
//! alias can forward to.
//!
//! ## Dispatch
//!
//! Every notification runs synchronously on the mutating caller's stack.
//! For one mutation, the member's class-level observers run first, then the
//! observers registered on the atom for that name. No lock is held while an
//! observer runs, so observers may re-enter the model.

mod atom;
mod change;
mod class;
mod member;
mod observer;
mod pool;
mod value;

use std::sync::Arc;

pub use atom::{Atom, WeakAtom};
pub use change::{Change, ChangeType};
pub use class::{Class, ClassBuilder};
pub use member::{Member, MemberKind, SlotSpec};
pub use observer::{Callback, Observer, ObserverId};
pub use pool::ObserverPool;
pub use value::{Value, ValueKind};

use crate::error::Result;

/// The observable-entity capability.
///
/// Implemented by exactly the values that take part in the reactive model.
pub trait Observable {
    /// Register `observer` for changes to `name`.
    fn subscribe(&self, name: &str, observer: Arc<dyn Observer>) -> Subscription;

    /// Deliver `change` to the observers of `name`.
    fn notify(&self, name: &str, change: &Change) -> Result<()>;
}

/// Token for one observer registration, used to remove it later.
///
/// Holds the observed atom weakly so an outstanding subscription never keeps
/// its target alive.
#[derive(Debug, Clone)]
pub struct Subscription {
    target: WeakAtom,
    name: Arc<str>,
    id: ObserverId,
}

impl Subscription {
    pub(crate) fn new(target: WeakAtom, name: Arc<str>, id: ObserverId) -> Self {
        Self { target, name, id }
    }

    pub fn id(&self) -> ObserverId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Remove the registration. Returns `false` if it was already gone or
    /// the target no longer exists.
    pub fn cancel(&self) -> bool {
        match self.target.upgrade() {
            Some(target) => target.unobserve(&self.name, self.id),
            None => false,
        }
    }
}
