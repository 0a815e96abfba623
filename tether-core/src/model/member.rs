//! Class members.

use std::fmt;
use std::sync::Arc;

use smallvec::SmallVec;

use super::atom::Atom;
use super::change::Change;
use super::observer::Observer;
use super::value::{Value, ValueKind};
use crate::alias::{AliasDescriptor, RetargetHandler};
use crate::error::Result;

/// Configuration of a plain storage member.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SlotSpec {
    /// Returned by `get` while the slot is vacant.
    pub default: Value,
    /// Type constraint checked on assignment.
    pub kind: Option<ValueKind>,
}

/// What a member does when it is read, written or deleted.
#[derive(Debug, Clone, PartialEq)]
pub enum MemberKind {
    /// Stores a value per atom.
    Slot(SlotSpec),
    /// Stores nothing; assigning fires an event change.
    Event,
    /// Forwards to an attribute of another atom.
    Alias(AliasDescriptor),
}

impl MemberKind {
    /// Whether atoms reserve a storage cell for this member.
    pub fn needs_storage(&self) -> bool {
        match self {
            MemberKind::Slot(_) => true,
            MemberKind::Event => false,
            MemberKind::Alias(descriptor) => descriptor.needs_storage(),
        }
    }
}

/// A named member of a [`Class`](super::Class).
///
/// Members are created by [`ClassBuilder::build`](super::ClassBuilder::build)
/// and shared read-only by every atom of the class.
pub struct Member {
    name: Arc<str>,
    index: Option<usize>,
    kind: MemberKind,
    observers: Vec<Arc<dyn Observer>>,
    retargets: SmallVec<[Arc<RetargetHandler>; 1]>,
}

impl Member {
    pub(crate) fn new(
        name: Arc<str>,
        index: Option<usize>,
        kind: MemberKind,
        observers: Vec<Arc<dyn Observer>>,
        retargets: SmallVec<[Arc<RetargetHandler>; 1]>,
    ) -> Self {
        Self {
            name,
            index,
            kind,
            observers,
            retargets,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn name_arc(&self) -> &Arc<str> {
        &self.name
    }

    /// Storage index within each atom, if the member needs storage.
    pub fn index(&self) -> Option<usize> {
        self.index
    }

    pub fn kind(&self) -> &MemberKind {
        &self.kind
    }

    pub fn as_alias(&self) -> Option<&AliasDescriptor> {
        match &self.kind {
            MemberKind::Alias(descriptor) => Some(descriptor),
            _ => None,
        }
    }

    /// Class-level observers declared on this member.
    pub(crate) fn observers(&self) -> &[Arc<dyn Observer>] {
        &self.observers
    }

    /// Names of the aliases rewired when this member changes.
    pub fn retargeted_aliases(&self) -> impl Iterator<Item = &str> {
        self.retargets.iter().map(|handler| handler.alias_name())
    }

    /// Whether notifying this member would reach anything.
    pub fn has_observers(&self) -> bool {
        !self.observers.is_empty() || !self.retargets.is_empty()
    }

    /// Deliver `change` to this member's class-level observers on `owner`.
    ///
    /// `change.object` is usually `owner`, except for changes forwarded by an
    /// alias, which keep the target atom as their object. Retarget handlers
    /// only react to changes of `owner` itself, and run before user
    /// observers so those see the forwarding links already rewired.
    pub fn notify(&self, owner: &Atom, change: &Change) -> Result<()> {
        if change.object.ptr_eq(owner) {
            for handler in &self.retargets {
                handler.call(change)?;
            }
        }
        for observer in &self.observers {
            if observer.is_live() {
                observer.call(change)?;
            }
        }
        Ok(())
    }
}

impl fmt::Debug for Member {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Member")
            .field("name", &self.name)
            .field("index", &self.index)
            .field("kind", &self.kind)
            .field("observer_count", &self.observers.len())
            .field("retargets", &self.retargets.len())
            .finish()
    }
}
