//! Classes and the builder that compiles them.
//!
//! Building a class does three things:
//!
//! 1. Assigns a storage index to every member that needs one (slots, and
//!    aliases declared observable).
//! 2. Installs one [`RetargetHandler`] on the target member of every
//!    observable alias.
//! 3. Freezes the member table. A class is never mutated after `build`.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use smallvec::SmallVec;

use super::member::{Member, MemberKind, SlotSpec};
use super::observer::Observer;
use super::value::{Value, ValueKind};
use crate::alias::{AliasDescriptor, RetargetHandler};
use crate::config::ModelConfig;
use crate::error::{Error, Result};

/// An immutable member table shared by all atoms of one class.
pub struct Class {
    name: Arc<str>,
    /// Ancestor class names, nearest first.
    bases: Vec<Arc<str>>,
    members: IndexMap<Arc<str>, Arc<Member>>,
    storage_len: usize,
    config: ModelConfig,
}

impl Class {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    /// Number of storage cells each atom of this class reserves.
    pub fn storage_len(&self) -> usize {
        self.storage_len
    }

    pub fn member(&self, name: &str) -> Option<&Arc<Member>> {
        self.members.get(name)
    }

    /// Look up a member, failing with [`Error::AttributeMissing`].
    pub fn get_member(&self, name: &str) -> Result<Arc<Member>> {
        self.members
            .get(name)
            .cloned()
            .ok_or_else(|| Error::AttributeMissing {
                class: self.name.to_string(),
                name: name.to_string(),
            })
    }

    /// Members in declaration order, parents' members first.
    pub fn members(&self) -> impl Iterator<Item = &Arc<Member>> {
        self.members.values()
    }

    /// Whether this class is `name` or derives from it.
    pub fn is_subclass_of(&self, name: &str) -> bool {
        &*self.name == name || self.bases.iter().any(|base| &**base == name)
    }
}

impl fmt::Debug for Class {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Class")
            .field("name", &self.name)
            .field("bases", &self.bases)
            .field("members", &self.members.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// A member declaration awaiting `build`.
struct MemberDef {
    kind: MemberKind,
    observers: Vec<Arc<dyn Observer>>,
}

/// Builder for [`Class`].
///
/// # Example
///
/// ```rust
/// use tether_core::alias::AliasDescriptor;
/// use tether_core::model::{Atom, ClassBuilder, Value, ValueKind};
///
/// let sub = ClassBuilder::new("Sub").typed("x", ValueKind::Int).build();
/// let owner = ClassBuilder::new("Owner")
///     .typed("target", ValueKind::Instance("Sub".into()))
///     .alias("x", AliasDescriptor::new("target", "x").observable(true))
///     .build();
///
/// let child = Atom::new(&sub);
/// child.set("x", 1).unwrap();
/// let parent = Atom::new(&owner);
/// parent.set("target", &child).unwrap();
/// assert_eq!(parent.get("x").unwrap(), Value::Int(1));
/// ```
pub struct ClassBuilder {
    name: Arc<str>,
    bases: Vec<Arc<str>>,
    members: IndexMap<Arc<str>, MemberDef>,
    config: ModelConfig,
}

impl ClassBuilder {
    pub fn new(name: &str) -> Self {
        Self {
            name: Arc::from(name),
            bases: Vec::new(),
            members: IndexMap::new(),
            config: ModelConfig::default(),
        }
    }

    /// Start a subclass of `parent`.
    ///
    /// Every parent member is copied, so redeclaring one here replaces the
    /// subclass's copy without touching the parent. The parent's config is
    /// inherited.
    pub fn derive(name: &str, parent: &Class) -> Self {
        let mut bases = Vec::with_capacity(parent.bases.len() + 1);
        bases.push(Arc::clone(&parent.name));
        bases.extend(parent.bases.iter().cloned());

        let members = parent
            .members
            .iter()
            .map(|(name, member)| {
                let def = MemberDef {
                    kind: member.kind().clone(),
                    observers: member.observers().to_vec(),
                };
                (Arc::clone(name), def)
            })
            .collect();

        Self {
            name: Arc::from(name),
            bases,
            members,
            config: parent.config.clone(),
        }
    }

    pub fn config(mut self, config: &ModelConfig) -> Self {
        self.config = config.clone();
        self
    }

    /// Declare (or replace) a member.
    pub fn member(mut self, name: &str, kind: MemberKind) -> Self {
        match self.members.get_mut(name) {
            Some(def) => def.kind = kind,
            None => {
                self.members.insert(
                    Arc::from(name),
                    MemberDef {
                        kind,
                        observers: Vec::new(),
                    },
                );
            }
        }
        self
    }

    /// Declare an untyped slot.
    pub fn slot(self, name: &str) -> Self {
        self.member(name, MemberKind::Slot(SlotSpec::default()))
    }

    /// Declare a slot that only accepts values of `kind`.
    pub fn typed(self, name: &str, kind: ValueKind) -> Self {
        self.member(
            name,
            MemberKind::Slot(SlotSpec {
                default: Value::None,
                kind: Some(kind),
            }),
        )
    }

    /// Declare a typed slot with a default value.
    pub fn typed_with_default(self, name: &str, kind: ValueKind, default: impl Into<Value>) -> Self {
        self.member(
            name,
            MemberKind::Slot(SlotSpec {
                default: default.into(),
                kind: Some(kind),
            }),
        )
    }

    pub fn event(self, name: &str) -> Self {
        self.member(name, MemberKind::Event)
    }

    pub fn alias(self, name: &str, descriptor: AliasDescriptor) -> Self {
        self.member(name, MemberKind::Alias(descriptor))
    }

    /// Attach a class-level observer to an already declared member.
    ///
    /// Observers for undeclared names are dropped with a warning.
    pub fn observe_static(mut self, name: &str, observer: Arc<dyn Observer>) -> Self {
        match self.members.get_mut(name) {
            Some(def) => def.observers.push(observer),
            None => tracing::warn!(class = %self.name, member = name, "static observer for unknown member"),
        }
        self
    }

    pub fn build(self) -> Arc<Class> {
        let mut retargets: IndexMap<Arc<str>, SmallVec<[Arc<RetargetHandler>; 1]>> = IndexMap::new();
        for (name, def) in &self.members {
            let MemberKind::Alias(descriptor) = &def.kind else {
                continue;
            };
            if !descriptor.is_observable() {
                continue;
            }
            if !self.members.contains_key(descriptor.target()) {
                tracing::warn!(
                    class = %self.name,
                    alias = %name,
                    target = descriptor.target(),
                    "observable alias targets an unknown member; it will never forward"
                );
                continue;
            }
            retargets
                .entry(Arc::from(descriptor.target()))
                .or_default()
                .push(Arc::new(RetargetHandler::new(
                    Arc::clone(name),
                    self.config.detach,
                )));
        }

        let mut storage_len = 0;
        let members = self
            .members
            .into_iter()
            .map(|(name, def)| {
                let index = def.kind.needs_storage().then(|| {
                    storage_len += 1;
                    storage_len - 1
                });
                let handlers = retargets.shift_remove(&name).unwrap_or_default();
                let member = Member::new(Arc::clone(&name), index, def.kind, def.observers, handlers);
                (name, Arc::new(member))
            })
            .collect();

        Arc::new(Class {
            name: self.name,
            bases: self.bases,
            members,
            storage_len,
            config: self.config,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DetachPolicy;

    fn owner_class() -> Arc<Class> {
        ClassBuilder::new("Owner")
            .typed("target", ValueKind::Instance("Sub".into()))
            .alias("a", AliasDescriptor::new("target", "x").observable(true))
            .alias("b", AliasDescriptor::new("target", "y"))
            .event("ping")
            .build()
    }

    #[test]
    fn storage_is_reserved_for_slots_and_observable_aliases() {
        let class = owner_class();
        assert_eq!(class.storage_len(), 2);
        assert_eq!(class.member("target").unwrap().index(), Some(0));
        assert_eq!(class.member("a").unwrap().index(), Some(1));
        assert_eq!(class.member("b").unwrap().index(), None);
        assert_eq!(class.member("ping").unwrap().index(), None);
    }

    #[test]
    fn retarget_handler_installed_only_for_observable_aliases() {
        let class = owner_class();
        let target = class.member("target").unwrap();
        assert_eq!(target.retargeted_aliases().collect::<Vec<_>>(), vec!["a"]);
        assert!(target.has_observers());
        assert!(!class.member("a").unwrap().has_observers());
    }

    #[test]
    fn alias_to_unknown_target_builds_inert() {
        let class = ClassBuilder::new("Broken")
            .alias("a", AliasDescriptor::new("missing", "x").observable(true))
            .build();
        assert!(class.member("a").unwrap().as_alias().is_some());
        assert_eq!(class.members().filter(|m| m.has_observers()).count(), 0);
    }

    #[test]
    fn derive_copies_members_without_sharing() {
        let parent = owner_class();
        let child = ClassBuilder::derive("Child", &parent)
            .alias("a", AliasDescriptor::new("target", "z"))
            .build();

        assert!(child.is_subclass_of("Owner"));
        assert!(child.is_subclass_of("Child"));
        assert!(!parent.is_subclass_of("Child"));

        // Parent keeps its observable alias.
        let parent_alias = parent.member("a").unwrap().as_alias().unwrap();
        assert_eq!(parent_alias.attr(), "x");
        assert!(parent_alias.is_observable());

        // Child's override is independent and no longer observable.
        let child_alias = child.member("a").unwrap().as_alias().unwrap();
        assert_eq!(child_alias.attr(), "z");
        assert!(!child_alias.is_observable());
        assert_eq!(child.member("target").unwrap().retargeted_aliases().count(), 0);

        // Inherited alias is an equal but separate copy.
        assert_eq!(
            child.member("b").unwrap().as_alias(),
            parent.member("b").unwrap().as_alias()
        );
    }

    #[test]
    fn derive_inherits_config() {
        let config = ModelConfig {
            detach: DetachPolicy::Soft,
        };
        let parent = ClassBuilder::new("P").config(&config).build();
        let child = ClassBuilder::derive("C", &parent).build();
        assert_eq!(child.config().detach, DetachPolicy::Soft);
    }

    #[test]
    fn unknown_member_is_attribute_missing() {
        let class = owner_class();
        let err = class.get_member("nope").unwrap_err();
        assert!(matches!(err, Error::AttributeMissing { .. }));
    }
}
