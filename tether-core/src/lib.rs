//! Tether Core
//!
//! This crate provides alias members for the Tether reactive object model.
//! It implements:
//!
//! - A small object model of classes, atoms and name-keyed observers
//! - Alias members that forward get/set/delete to an attribute of another atom
//! - Change forwarding that follows the aliased atom when it is reassigned
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - `model`: Classes, members, atoms, values and change dispatch
//! - `alias`: The alias descriptor and its retarget/forwarding handlers
//! - `config`: Per-class runtime configuration
//! - `error`: The crate error type
//!
//! # Example
//!
//! ```rust
//! use std::sync::{Arc, Mutex};
//!
//! use tether_core::alias::AliasDescriptor;
//! use tether_core::model::{Atom, ClassBuilder, Value, ValueKind};
//!
//! let sub = ClassBuilder::new("Sub").typed("x", ValueKind::Int).build();
//! let owner = ClassBuilder::new("Owner")
//!     .typed("target", ValueKind::Instance("Sub".into()))
//!     .alias("a", AliasDescriptor::new("target", "x").observable(true))
//!     .build();
//!
//! let first = Atom::with(&sub, [("x", 1)]).unwrap();
//! let second = Atom::with(&sub, [("x", 2)]).unwrap();
//! let o = Atom::with(&owner, [("target", &first)]).unwrap();
//!
//! let seen = Arc::new(Mutex::new(Vec::new()));
//! let sink = seen.clone();
//! o.observe_fn("a", move |change| sink.lock().unwrap().push(change.value.clone()));
//!
//! first.set("x", 5).unwrap();
//! o.set("target", &second).unwrap();
//! first.set("x", 9).unwrap();
//! second.set("x", 9).unwrap();
//!
//! assert_eq!(*seen.lock().unwrap(), vec![Value::Int(5), Value::Int(9)]);
//! ```

pub mod alias;
pub mod config;
pub mod error;
pub mod model;

pub use config::{DetachPolicy, ModelConfig};
pub use error::{Error, Result};
