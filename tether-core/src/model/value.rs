//! Dynamic attribute values.

use std::fmt;
use std::sync::Arc;

use super::atom::Atom;
use super::Observable;

/// A value stored in, or assigned to, an atom attribute.
#[derive(Clone, Default)]
pub enum Value {
    #[default]
    None,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(Arc<str>),
    Atom(Atom),
}

impl Value {
    /// Whether this is [`Value::None`].
    pub fn is_none(&self) -> bool {
        matches!(self, Value::None)
    }

    /// The atom held by this value, if any.
    pub fn as_atom(&self) -> Option<&Atom> {
        match self {
            Value::Atom(atom) => Some(atom),
            _ => None,
        }
    }

    /// The observable-entity capability of this value, if it has one.
    ///
    /// Only atoms participate in the reactive model; every other value
    /// returns `None`.
    pub fn as_observable(&self) -> Option<&dyn Observable> {
        match self {
            Value::Atom(atom) => Some(atom as &dyn Observable),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// Short type name used in error messages.
    pub fn type_name(&self) -> String {
        match self {
            Value::None => "NoneType".to_string(),
            Value::Bool(_) => "bool".to_string(),
            Value::Int(_) => "int".to_string(),
            Value::Float(_) => "float".to_string(),
            Value::Str(_) => "str".to_string(),
            Value::Atom(atom) => atom.class().name().to_string(),
        }
    }
}

// Atoms compare by identity, scalars structurally.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::None, Value::None) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Atom(a), Value::Atom(b)) => a.ptr_eq(b),
            _ => false,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::None => f.write_str("None"),
            Value::Bool(v) => write!(f, "{v:?}"),
            Value::Int(v) => write!(f, "{v:?}"),
            Value::Float(v) => write!(f, "{v:?}"),
            Value::Str(v) => write!(f, "{v:?}"),
            Value::Atom(atom) => write!(f, "{atom:?}"),
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(v.into())
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Str(v.into())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Str(v.into())
    }
}

impl From<Atom> for Value {
    fn from(atom: Atom) -> Self {
        Value::Atom(atom)
    }
}

impl From<&Atom> for Value {
    fn from(atom: &Atom) -> Self {
        Value::Atom(atom.clone())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::None, Into::into)
    }
}

/// The type constraint of a slot member.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueKind {
    Bool,
    Int,
    Float,
    Str,
    /// An atom of the named class (or one derived from it), or `None`.
    Instance(Arc<str>),
}

impl ValueKind {
    /// Whether `value` satisfies this constraint.
    pub fn accepts(&self, value: &Value) -> bool {
        match (self, value) {
            (ValueKind::Bool, Value::Bool(_)) => true,
            (ValueKind::Int, Value::Int(_)) => true,
            (ValueKind::Float, Value::Float(_) | Value::Int(_)) => true,
            (ValueKind::Str, Value::Str(_)) => true,
            (ValueKind::Instance(_), Value::None) => true,
            (ValueKind::Instance(name), Value::Atom(atom)) => atom.class().is_subclass_of(name),
            _ => false,
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueKind::Bool => f.write_str("bool"),
            ValueKind::Int => f.write_str("int"),
            ValueKind::Float => f.write_str("float"),
            ValueKind::Str => f.write_str("str"),
            ValueKind::Instance(name) => f.write_str(name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalars_compare_structurally() {
        assert_eq!(Value::from(3), Value::Int(3));
        assert_eq!(Value::from("a"), Value::from(String::from("a")));
        assert_ne!(Value::from(1), Value::from(1.0));
        assert_eq!(Value::from(None::<i64>), Value::None);
    }

    #[test]
    fn scalars_are_not_observable() {
        assert!(Value::None.as_observable().is_none());
        assert!(Value::from(5).as_observable().is_none());
        assert!(Value::from("x").as_observable().is_none());
    }

    #[test]
    fn kind_checks() {
        assert!(ValueKind::Int.accepts(&Value::Int(1)));
        assert!(!ValueKind::Int.accepts(&Value::from("1")));
        assert!(ValueKind::Float.accepts(&Value::Int(1)));
        assert!(ValueKind::Instance("Sub".into()).accepts(&Value::None));
        assert!(!ValueKind::Instance("Sub".into()).accepts(&Value::Int(0)));
    }
}
