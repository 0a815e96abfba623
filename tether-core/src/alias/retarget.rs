//! Retarget Handler
//!
//! The retarget handler is a class-level observer of an observable alias's
//! target member. Whenever that member changes it rewires forwarding:
//!
//! 1. The new target is the change's value for create and update changes,
//!    and nothing for delete and event changes.
//! 2. The forwarding handler in the owner's handler slot, if any, is taken
//!    out and deactivated. Under [`DetachPolicy::Unsubscribe`] it is also
//!    removed from the old target's observers.
//! 3. If the new target is observable, a fresh forwarding handler is
//!    subscribed to the aliased attribute on it and stored in the slot.
//!    Otherwise the slot stays empty and the alias is inert.
//!
//! Detaching always completes before attaching, and both complete before
//! control returns to the mutator. Nothing in between dispatches to
//! observers, so a recursive retarget from inside an observer sees a
//! consistent slot and at most one handler per (atom, alias) is ever active.
//!
//! Retargeting to the atom already targeted runs the full sequence as well.

use std::sync::Arc;

use super::forward::ForwardingHandler;
use crate::config::DetachPolicy;
use crate::error::{Error, Result};
use crate::model::{Change, Observer};

#[derive(Debug)]
pub struct RetargetHandler {
    alias: Arc<str>,
    policy: DetachPolicy,
}

impl RetargetHandler {
    pub fn new(alias: Arc<str>, policy: DetachPolicy) -> Self {
        Self { alias, policy }
    }

    pub fn alias_name(&self) -> &str {
        &self.alias
    }
}

impl Observer for RetargetHandler {
    fn call(&self, change: &Change) -> Result<()> {
        let new_target = change.new_value();
        let owner = &change.object;
        let member = owner.get_member(&self.alias)?;
        let descriptor = member.as_alias().ok_or_else(|| Error::NotAnAlias {
            class: owner.class().name().to_string(),
            name: self.alias.to_string(),
        })?;

        if let Some(stale) = owner.take_forwarder(&member) {
            stale.deactivate();
            let removed = match self.policy {
                DetachPolicy::Unsubscribe => stale.unsubscribe(),
                DetachPolicy::Soft => false,
            };
            tracing::debug!(alias = %self.alias, owner = ?owner, removed, "detached alias");
        }

        let Some(target) = new_target.as_observable() else {
            return Ok(());
        };
        let handler = Arc::new(ForwardingHandler::new(
            Arc::clone(&self.alias),
            owner.downgrade(),
        ));
        let subscription = target.subscribe(descriptor.attr(), handler.clone());
        handler.bind(subscription);
        owner.store_forwarder(&member, handler);
        tracing::debug!(alias = %self.alias, owner = ?owner, target = ?new_target, "attached alias");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alias::AliasDescriptor;
    use crate::config::ModelConfig;
    use crate::model::{Atom, Class, ClassBuilder, Value, ValueKind};

    fn classes(policy: DetachPolicy) -> (Arc<Class>, Arc<Class>) {
        let sub = ClassBuilder::new("Sub").typed("x", ValueKind::Int).build();
        let owner = ClassBuilder::new("Owner")
            .config(&ModelConfig { detach: policy })
            .typed("target", ValueKind::Instance("Sub".into()))
            .alias("a", AliasDescriptor::new("target", "x").observable(true))
            .build();
        (sub, owner)
    }

    #[test]
    fn attaches_on_create() {
        let (sub, owner) = classes(DetachPolicy::Unsubscribe);
        let s = Atom::new(&sub);
        let o = Atom::with(&owner, [("target", &s)]).unwrap();

        let handler = o.forwarder("a").unwrap();
        assert!(handler.is_active());
        assert_eq!(handler.alias_name(), "a");
        assert_eq!(s.observer_count("x"), 1);
    }

    #[test]
    fn unsubscribe_policy_removes_stale_handler() {
        let (sub, owner) = classes(DetachPolicy::Unsubscribe);
        let s1 = Atom::new(&sub);
        let s2 = Atom::new(&sub);
        let o = Atom::with(&owner, [("target", &s1)]).unwrap();
        let first = o.forwarder("a").unwrap();

        o.set("target", &s2).unwrap();

        assert!(!first.is_active());
        assert_eq!(s1.observer_count("x"), 0);
        assert_eq!(s2.observer_count("x"), 1);
        assert!(o.forwarder("a").unwrap().is_active());
    }

    #[test]
    fn soft_policy_leaves_inert_handler_registered() {
        let (sub, owner) = classes(DetachPolicy::Soft);
        let s1 = Atom::new(&sub);
        let s2 = Atom::new(&sub);
        let o = Atom::with(&owner, [("target", &s1)]).unwrap();

        o.set("target", &s2).unwrap();
        assert_eq!(s1.observer_count("x"), 1);

        // The next dispatch on the old target prunes it.
        s1.set("x", 1).unwrap();
        assert_eq!(s1.observer_count("x"), 0);
    }

    #[test]
    fn delete_and_none_leave_alias_inert() {
        let (sub, owner) = classes(DetachPolicy::Unsubscribe);
        let s = Atom::new(&sub);
        let o = Atom::with(&owner, [("target", &s)]).unwrap();

        o.delete("target").unwrap();
        assert!(o.forwarder("a").is_none());
        assert_eq!(s.observer_count("x"), 0);

        o.set("target", &s).unwrap();
        assert!(o.forwarder("a").is_some());
        o.set("target", Value::None).unwrap();
        assert!(o.forwarder("a").is_none());
    }

    #[test]
    fn identical_target_still_reattaches() {
        let (sub, owner) = classes(DetachPolicy::Soft);
        let s = Atom::new(&sub);
        let o = Atom::with(&owner, [("target", &s)]).unwrap();
        let first = o.forwarder("a").unwrap();

        let handler = RetargetHandler::new(Arc::from("a"), DetachPolicy::Soft);
        let member = o.get_member("target").unwrap();
        let change = Change::updated(&o, &Arc::from(member.name()), s.clone().into(), s.clone().into());
        handler.call(&change).unwrap();

        let second = o.forwarder("a").unwrap();
        assert!(!Arc::ptr_eq(&first, &second));
        assert!(!first.is_active());
        assert!(second.is_active());
        assert_eq!(s.observer_count("x"), 2);
    }

    #[test]
    fn unknown_alias_propagates_error() {
        let (_, owner) = classes(DetachPolicy::Unsubscribe);
        let o = Atom::new(&owner);
        let handler = RetargetHandler::new(Arc::from("nope"), DetachPolicy::Unsubscribe);
        let change = Change::created(&o, &Arc::from("target"), Value::None);
        assert!(matches!(handler.call(&change), Err(Error::AttributeMissing { .. })));

        let handler = RetargetHandler::new(Arc::from("target"), DetachPolicy::Unsubscribe);
        assert!(matches!(handler.call(&change), Err(Error::NotAnAlias { .. })));
    }

    #[test]
    fn non_observable_value_is_ignored() {
        let sub = ClassBuilder::new("Sub").slot("x").build();
        let owner = ClassBuilder::new("Owner")
            .slot("target")
            .alias("a", AliasDescriptor::new("target", "x").observable(true))
            .build();
        let s = Atom::new(&sub);
        let o = Atom::with(&owner, [("target", Value::from(&s))]).unwrap();
        assert!(o.forwarder("a").is_some());

        o.set("target", 42).unwrap();
        assert!(o.forwarder("a").is_none());
        assert_eq!(s.observer_count("x"), 0);
    }
}
