//! The alias member descriptor.

use std::sync::Arc;

use super::guard::{Access, AliasGuard};
use crate::error::{Error, Result};
use crate::model::{Atom, Member, Value};

/// Forwards get/set/delete of one member to `attr` on the atom held in the
/// owner's `target` member.
///
/// Descriptors are immutable. A class shares one descriptor among all of its
/// atoms, and a derived class receives its own copy through `Clone`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AliasDescriptor {
    target: Arc<str>,
    attr: Arc<str>,
    observable: bool,
}

impl AliasDescriptor {
    /// A non-observable alias of `attr` on the atom held in `target`.
    pub fn new(target: &str, attr: &str) -> Self {
        Self {
            target: Arc::from(target),
            attr: Arc::from(attr),
            observable: false,
        }
    }

    /// Whether changes to the aliased attribute are forwarded to observers
    /// of the alias. Observing an alias costs a handler slot per atom and a
    /// forwarding handler per target.
    pub fn observable(mut self, observable: bool) -> Self {
        self.observable = observable;
        self
    }

    /// Name of the owner member that holds the target atom.
    pub fn target(&self) -> &str {
        &self.target
    }

    /// Name of the aliased member on the target atom.
    pub fn attr(&self) -> &str {
        &self.attr
    }

    pub fn is_observable(&self) -> bool {
        self.observable
    }

    /// Observable aliases reserve a handler slot in each atom.
    pub fn needs_storage(&self) -> bool {
        self.observable
    }

    pub fn get(&self, owner: &Atom, member: &Member) -> Result<Value> {
        let _guard = AliasGuard::enter(owner, member.name_arc(), Access::Get)?;
        let target = self.resolve(owner, member)?;
        target.get(&self.attr)
    }

    /// Assign through to the target. Rejections by the target's own member
    /// propagate unchanged.
    ///
    /// The guard stays held while the target notifies, so writing the same
    /// alias again from one of its observers fails with
    /// [`Error::AliasRecursion`]. Reading it is allowed.
    pub fn set(&self, owner: &Atom, member: &Member, value: Value) -> Result<()> {
        let _guard = AliasGuard::enter(owner, member.name_arc(), Access::Set)?;
        let target = self.resolve(owner, member)?;
        target.set(&self.attr, value)
    }

    pub fn delete(&self, owner: &Atom, member: &Member) -> Result<()> {
        let _guard = AliasGuard::enter(owner, member.name_arc(), Access::Delete)?;
        let target = self.resolve(owner, member)?;
        target.delete(&self.attr)
    }

    /// Look up the atom currently held in `target`.
    fn resolve(&self, owner: &Atom, member: &Member) -> Result<Atom> {
        match owner.get(&self.target)? {
            Value::Atom(atom) => Ok(atom),
            Value::None => Err(Error::NullTarget {
                alias: member.name().to_string(),
                target: self.target.to_string(),
            }),
            other => Err(Error::AttributeMissing {
                class: other.type_name(),
                name: self.attr.to_string(),
            }),
        }
    }
}
