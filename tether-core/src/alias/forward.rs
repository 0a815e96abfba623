//! Forwarding Handler
//!
//! A forwarding handler is registered as an observer of the aliased
//! attribute on the current target atom. It re-delivers every change it
//! receives to the owner, under the alias's name.
//!
//! # Liveness
//!
//! The handler reaches its owner through a [`WeakAtom`], so the target never
//! keeps the owner alive. The handler is active while that link is set and
//! the owner exists. Clearing the link (a soft detach) makes it permanently
//! inert; pools drop inert observers the next time they dispatch.

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::Result;
use crate::model::{Atom, Change, Observer, Subscription, WeakAtom};

pub struct ForwardingHandler {
    alias: Arc<str>,
    owner: Mutex<Option<WeakAtom>>,
    subscription: Mutex<Option<Subscription>>,
}

impl ForwardingHandler {
    pub fn new(alias: Arc<str>, owner: WeakAtom) -> Self {
        Self {
            alias,
            owner: Mutex::new(Some(owner)),
            subscription: Mutex::new(None),
        }
    }

    pub fn alias_name(&self) -> &str {
        &self.alias
    }

    /// The owner, if the handler is still active.
    pub fn owner(&self) -> Option<Atom> {
        self.owner.lock().as_ref().and_then(WeakAtom::upgrade)
    }

    pub fn is_active(&self) -> bool {
        self.owner.lock().as_ref().is_some_and(WeakAtom::is_alive)
    }

    /// Clear the owner link. Idempotent.
    pub fn deactivate(&self) {
        self.owner.lock().take();
    }

    /// Remember the registration on the target so it can be removed later.
    pub(crate) fn bind(&self, subscription: Subscription) {
        *self.subscription.lock() = Some(subscription);
    }

    /// Remove this handler from its target's observers. Idempotent; returns
    /// whether a registration was removed.
    pub fn unsubscribe(&self) -> bool {
        let subscription = self.subscription.lock().take();
        subscription.is_some_and(|subscription| subscription.cancel())
    }
}

impl Observer for ForwardingHandler {
    fn call(&self, change: &Change) -> Result<()> {
        let Some(owner) = self.owner() else {
            return Ok(());
        };
        tracing::trace!(
            alias = %self.alias,
            owner = ?owner,
            source = ?change.object,
            kind = %change.kind,
            "forwarding change"
        );
        let member = owner.get_member(&self.alias)?;
        member.notify(&owner, change)?;
        owner.notify(&self.alias, change)
    }

    fn is_live(&self) -> bool {
        self.is_active()
    }
}

impl fmt::Debug for ForwardingHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ForwardingHandler")
            .field("alias", &self.alias)
            .field("active", &self.is_active())
            .finish()
    }
}
