//! Change events delivered to observers.

use std::fmt;
use std::sync::Arc;

use super::atom::Atom;
use super::value::Value;

/// What kind of mutation a [`Change`] describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeType {
    /// A vacant attribute received its first value.
    Create,
    /// An attribute's value was replaced.
    Update,
    /// An attribute was reset to vacant.
    Delete,
    /// An event member fired.
    Event,
}

impl ChangeType {
    pub fn as_str(self) -> &'static str {
        match self {
            ChangeType::Create => "create",
            ChangeType::Update => "update",
            ChangeType::Delete => "delete",
            ChangeType::Event => "event",
        }
    }
}

impl fmt::Display for ChangeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single change notification.
///
/// `value` is the new value for create, update and event changes, and the
/// removed value for delete changes. `oldvalue` is set for updates.
#[derive(Debug, Clone)]
pub struct Change {
    pub kind: ChangeType,
    pub object: Atom,
    pub name: Arc<str>,
    pub value: Value,
    pub oldvalue: Option<Value>,
}

impl Change {
    pub fn created(object: &Atom, name: &Arc<str>, value: Value) -> Self {
        Self {
            kind: ChangeType::Create,
            object: object.clone(),
            name: Arc::clone(name),
            value,
            oldvalue: None,
        }
    }

    pub fn updated(object: &Atom, name: &Arc<str>, oldvalue: Value, value: Value) -> Self {
        Self {
            kind: ChangeType::Update,
            object: object.clone(),
            name: Arc::clone(name),
            value,
            oldvalue: Some(oldvalue),
        }
    }

    pub fn deleted(object: &Atom, name: &Arc<str>, value: Value) -> Self {
        Self {
            kind: ChangeType::Delete,
            object: object.clone(),
            name: Arc::clone(name),
            value,
            oldvalue: None,
        }
    }

    pub fn event(object: &Atom, name: &Arc<str>, value: Value) -> Self {
        Self {
            kind: ChangeType::Event,
            object: object.clone(),
            name: Arc::clone(name),
            value,
            oldvalue: None,
        }
    }

    /// The value an attribute holds after this change, if any.
    ///
    /// Create and update changes carry the new value; delete and event
    /// changes leave nothing behind.
    pub fn new_value(&self) -> Value {
        match self.kind {
            ChangeType::Create | ChangeType::Update => self.value.clone(),
            ChangeType::Delete | ChangeType::Event => Value::None,
        }
    }
}
