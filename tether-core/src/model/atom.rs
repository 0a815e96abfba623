//! Atom Implementation
//!
//! An Atom is an instance of a [`Class`]. It owns one storage cell per member
//! that needs one and a pool of observers keyed by member name.
//!
//! # Storage
//!
//! Slot members store their [`Value`] in their cell. Observable alias
//! members use their cell as the handler slot: it holds the forwarding
//! handler currently attached to the alias target, if any.
//!
//! # Thread Safety
//!
//! Atoms are `Send + Sync`; storage and observers sit behind `parking_lot`
//! locks. Locks are never held across observer calls.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::RwLock;

use super::change::Change;
use super::class::Class;
use super::member::{Member, MemberKind, SlotSpec};
use super::observer::{Observer, ObserverId};
use super::pool::ObserverPool;
use super::value::Value;
use super::{Observable, Subscription};
use crate::alias::ForwardingHandler;
use crate::error::{Error, Result};

/// Counter for generating unique atom IDs.
static ATOM_ID_COUNTER: AtomicU64 = AtomicU64::new(0);

fn next_atom_id() -> u64 {
    ATOM_ID_COUNTER.fetch_add(1, Ordering::Relaxed)
}

/// Contents of one storage cell.
#[derive(Default)]
enum Cell {
    #[default]
    Vacant,
    Value(Value),
    Forwarder(Arc<ForwardingHandler>),
}

struct AtomInner {
    id: u64,
    class: Arc<Class>,
    cells: RwLock<Vec<Cell>>,
    observers: ObserverPool,
}

/// A shared handle to an instance of a [`Class`].
///
/// Cloning the handle does not copy the instance.
#[derive(Clone)]
pub struct Atom(Arc<AtomInner>);

impl Atom {
    /// Create an atom with every member vacant.
    pub fn new(class: &Arc<Class>) -> Self {
        let cells = std::iter::repeat_with(Cell::default)
            .take(class.storage_len())
            .collect();
        Self(Arc::new(AtomInner {
            id: next_atom_id(),
            class: Arc::clone(class),
            cells: RwLock::new(cells),
            observers: ObserverPool::new(),
        }))
    }

    /// Create an atom and assign initial values in order.
    ///
    /// Assignments notify like any other `set`, so observable aliases whose
    /// target is initialised here start forwarding immediately.
    pub fn with<I, N, V>(class: &Arc<Class>, values: I) -> Result<Self>
    where
        I: IntoIterator<Item = (N, V)>,
        N: AsRef<str>,
        V: Into<Value>,
    {
        let atom = Self::new(class);
        for (name, value) in values {
            atom.set(name.as_ref(), value)?;
        }
        Ok(atom)
    }

    pub fn id(&self) -> u64 {
        self.0.id
    }

    pub fn class(&self) -> &Arc<Class> {
        &self.0.class
    }

    /// Whether both handles refer to the same atom.
    pub fn ptr_eq(&self, other: &Atom) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    pub fn downgrade(&self) -> WeakAtom {
        WeakAtom(Arc::downgrade(&self.0))
    }

    pub fn get_member(&self, name: &str) -> Result<Arc<Member>> {
        self.0.class.get_member(name)
    }

    /// Read an attribute.
    pub fn get(&self, name: &str) -> Result<Value> {
        let member = self.get_member(name)?;
        match member.kind() {
            MemberKind::Slot(spec) => Ok(self.read_slot(&member, spec)),
            MemberKind::Event => Ok(Value::None),
            MemberKind::Alias(descriptor) => descriptor.get(self, &member),
        }
    }

    /// Write an attribute, notifying observers if the value changed.
    pub fn set(&self, name: &str, value: impl Into<Value>) -> Result<()> {
        let value = value.into();
        let member = self.get_member(name)?;
        match member.kind() {
            MemberKind::Slot(spec) => self.write_slot(&member, spec, value),
            MemberKind::Event => {
                let change = Change::event(self, member.name_arc(), value);
                self.notify_member(&member, &change)
            }
            MemberKind::Alias(descriptor) => descriptor.set(self, &member, value),
        }
    }

    /// Reset an attribute to vacant, notifying observers if it held a value.
    pub fn delete(&self, name: &str) -> Result<()> {
        let member = self.get_member(name)?;
        match member.kind() {
            MemberKind::Slot(_) => self.clear_slot(&member),
            MemberKind::Event => Ok(()),
            MemberKind::Alias(descriptor) => descriptor.delete(self, &member),
        }
    }

    /// Register an observer for changes to `name`.
    pub fn observe(&self, name: &str, observer: Arc<dyn Observer>) -> ObserverId {
        self.0.observers.add(name, observer)
    }

    /// Register a closure for changes to `name`.
    pub fn observe_fn<F>(&self, name: &str, f: F) -> ObserverId
    where
        F: Fn(&Change) + Send + Sync + 'static,
    {
        self.observe(name, Arc::new(super::Callback::infallible(f)))
    }

    pub fn unobserve(&self, name: &str, id: ObserverId) -> bool {
        self.0.observers.remove(name, id)
    }

    /// Number of observers registered on this atom for `name`, including
    /// inert ones not yet pruned.
    pub fn observer_count(&self, name: &str) -> usize {
        self.0.observers.count(name)
    }

    /// Deliver `change` to the observers registered on this atom for `name`.
    pub fn notify(&self, name: &str, change: &Change) -> Result<()> {
        self.0.observers.notify(name, change)
    }

    /// The forwarding handler currently held in the handler slot of `alias`.
    pub fn forwarder(&self, alias: &str) -> Option<Arc<ForwardingHandler>> {
        let index = self.0.class.member(alias)?.index()?;
        match self.0.cells.read().get(index) {
            Some(Cell::Forwarder(handler)) => Some(Arc::clone(handler)),
            _ => None,
        }
    }

    /// Empty the handler slot of `member`, returning what it held.
    pub(crate) fn take_forwarder(&self, member: &Member) -> Option<Arc<ForwardingHandler>> {
        let index = member.index()?;
        let mut cells = self.0.cells.write();
        match cells.get_mut(index).map(std::mem::take) {
            Some(Cell::Forwarder(handler)) => Some(handler),
            _ => None,
        }
    }

    /// Put `handler` into the handler slot of `member`.
    ///
    /// Any handler found there is deactivated.
    pub(crate) fn store_forwarder(&self, member: &Member, handler: Arc<ForwardingHandler>) {
        let Some(index) = member.index() else {
            return;
        };
        let previous = {
            let mut cells = self.0.cells.write();
            match cells.get_mut(index) {
                Some(cell) => std::mem::replace(cell, Cell::Forwarder(handler)),
                None => return,
            }
        };
        if let Cell::Forwarder(previous) = previous {
            previous.deactivate();
        }
    }

    fn notify_member(&self, member: &Member, change: &Change) -> Result<()> {
        member.notify(self, change)?;
        self.0.observers.notify(member.name(), change)
    }

    fn read_slot(&self, member: &Member, spec: &SlotSpec) -> Value {
        let cells = self.0.cells.read();
        match member.index().and_then(|index| cells.get(index)) {
            Some(Cell::Value(value)) => value.clone(),
            _ => spec.default.clone(),
        }
    }

    fn write_slot(&self, member: &Member, spec: &SlotSpec, value: Value) -> Result<()> {
        if let Some(kind) = &spec.kind {
            if !kind.accepts(&value) {
                return Err(Error::TypeRejected {
                    class: self.0.class.name().to_string(),
                    name: member.name().to_string(),
                    expected: kind.to_string(),
                    found: value.type_name(),
                });
            }
        }
        let Some(index) = member.index() else {
            return Ok(());
        };

        let old = {
            let mut cells = self.0.cells.write();
            match cells.get_mut(index) {
                Some(cell) => std::mem::replace(cell, Cell::Value(value.clone())),
                None => return Ok(()),
            }
        };

        let change = match old {
            Cell::Value(old) if old == value => return Ok(()),
            Cell::Value(old) => Change::updated(self, member.name_arc(), old, value),
            _ => Change::created(self, member.name_arc(), value),
        };
        self.notify_member(member, &change)
    }

    fn clear_slot(&self, member: &Member) -> Result<()> {
        let Some(index) = member.index() else {
            return Ok(());
        };
        let old = self.0.cells.write().get_mut(index).map(std::mem::take);
        match old {
            Some(Cell::Value(old)) => {
                let change = Change::deleted(self, member.name_arc(), old);
                self.notify_member(member, &change)
            }
            _ => Ok(()),
        }
    }
}

impl Observable for Atom {
    fn subscribe(&self, name: &str, observer: Arc<dyn Observer>) -> Subscription {
        let id = self.0.observers.add(name, observer);
        Subscription::new(self.downgrade(), Arc::from(name), id)
    }

    fn notify(&self, name: &str, change: &Change) -> Result<()> {
        self.0.observers.notify(name, change)
    }
}

impl fmt::Debug for Atom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{} #{}>", self.0.class.name(), self.0.id)
    }
}

/// A non-owning handle to an [`Atom`].
#[derive(Clone, Default)]
pub struct WeakAtom(Weak<AtomInner>);

impl WeakAtom {
    /// A handle that never resolves.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn upgrade(&self) -> Option<Atom> {
        self.0.upgrade().map(Atom)
    }

    pub fn is_alive(&self) -> bool {
        self.0.strong_count() > 0
    }
}

impl fmt::Debug for WeakAtom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.upgrade() {
            Some(atom) => write!(f, "WeakAtom({atom:?})"),
            None => f.write_str("WeakAtom(<dead>)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ChangeType, ClassBuilder, ValueKind};
    use parking_lot::Mutex;

    fn point() -> Arc<Class> {
        ClassBuilder::new("Point")
            .typed("x", ValueKind::Int)
            .typed_with_default("y", ValueKind::Int, 7)
            .slot("tag")
            .event("moved")
            .build()
    }

    fn record(atom: &Atom, name: &str) -> Arc<Mutex<Vec<(ChangeType, Value)>>> {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        atom.observe_fn(name, move |change| {
            sink.lock().push((change.kind, change.value.clone()));
        });
        seen
    }

    #[test]
    fn get_returns_default_until_set() {
        let p = Atom::new(&point());
        assert_eq!(p.get("x").unwrap(), Value::None);
        assert_eq!(p.get("y").unwrap(), Value::Int(7));
        p.set("y", 3).unwrap();
        assert_eq!(p.get("y").unwrap(), Value::Int(3));
    }

    #[test]
    fn set_emits_create_then_update() {
        let p = Atom::new(&point());
        let seen = record(&p, "x");

        p.set("x", 1).unwrap();
        p.set("x", 2).unwrap();

        assert_eq!(
            *seen.lock(),
            vec![(ChangeType::Create, Value::Int(1)), (ChangeType::Update, Value::Int(2))]
        );
    }

    #[test]
    fn setting_an_equal_value_is_silent() {
        let p = Atom::new(&point());
        p.set("x", 1).unwrap();
        let seen = record(&p, "x");
        p.set("x", 1).unwrap();
        assert!(seen.lock().is_empty());
    }

    #[test]
    fn delete_emits_old_value_once() {
        let p = Atom::new(&point());
        p.set("x", 4).unwrap();
        let seen = record(&p, "x");

        p.delete("x").unwrap();
        p.delete("x").unwrap();

        assert_eq!(*seen.lock(), vec![(ChangeType::Delete, Value::Int(4))]);
        assert_eq!(p.get("x").unwrap(), Value::None);
    }

    #[test]
    fn type_mismatch_leaves_slot_untouched() {
        let p = Atom::new(&point());
        p.set("x", 1).unwrap();
        let err = p.set("x", "one").unwrap_err();
        assert!(matches!(err, Error::TypeRejected { .. }));
        assert_eq!(p.get("x").unwrap(), Value::Int(1));
    }

    #[test]
    fn events_notify_without_storing() {
        let p = Atom::new(&point());
        let seen = record(&p, "moved");
        p.set("moved", true).unwrap();
        assert_eq!(*seen.lock(), vec![(ChangeType::Event, Value::Bool(true))]);
        assert_eq!(p.get("moved").unwrap(), Value::None);
    }

    #[test]
    fn unknown_attribute_is_missing() {
        let p = Atom::new(&point());
        assert!(matches!(p.get("z"), Err(Error::AttributeMissing { .. })));
        assert!(matches!(p.set("z", 1), Err(Error::AttributeMissing { .. })));
        assert!(matches!(p.delete("z"), Err(Error::AttributeMissing { .. })));
    }

    #[test]
    fn unobserve_stops_notifications() {
        let p = Atom::new(&point());
        let seen = Arc::new(Mutex::new(0));
        let sink = Arc::clone(&seen);
        let id = p.observe_fn("x", move |_| *sink.lock() += 1);

        p.set("x", 1).unwrap();
        assert!(p.unobserve("x", id));
        assert!(!p.unobserve("x", id));
        p.set("x", 2).unwrap();

        assert_eq!(*seen.lock(), 1);
        assert_eq!(p.observer_count("x"), 0);
    }

    #[test]
    fn observers_may_reenter_the_atom() {
        let p = Atom::new(&point());
        let inner = p.downgrade();
        p.observe_fn("x", move |change| {
            if let (Some(atom), Some(x)) = (inner.upgrade(), change.value.as_int()) {
                atom.set("y", x * 10).unwrap();
            }
        });
        p.set("x", 2).unwrap();
        assert_eq!(p.get("y").unwrap(), Value::Int(20));
    }

    #[test]
    fn observer_errors_stop_dispatch() {
        let p = Atom::new(&point());
        p.observe(
            "x",
            Arc::new(super::super::Callback::new(|change| {
                Err(Error::AttributeMissing {
                    class: change.object.class().name().to_string(),
                    name: "boom".into(),
                })
            })),
        );
        let seen = record(&p, "x");

        assert!(p.set("x", 1).is_err());
        // The value was stored before dispatch began.
        assert_eq!(p.get("x").unwrap(), Value::Int(1));
        assert!(seen.lock().is_empty());
    }

    #[test]
    fn weak_handle_tracks_lifetime() {
        let p = Atom::new(&point());
        let weak = p.downgrade();
        assert!(weak.is_alive());
        assert!(weak.upgrade().unwrap().ptr_eq(&p));
        drop(p);
        assert!(!weak.is_alive());
        assert!(weak.upgrade().is_none());
        assert!(!WeakAtom::new().is_alive());
    }

    #[test]
    fn subscription_cancels_once() {
        let p = Atom::new(&point());
        let sub = Observable::subscribe(&p, "x", Arc::new(super::super::Callback::infallible(|_| {})));
        assert_eq!(p.observer_count("x"), 1);
        assert!(sub.cancel());
        assert!(!sub.cancel());
        assert_eq!(p.observer_count("x"), 0);
    }
}
