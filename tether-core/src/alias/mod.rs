//! Alias Members
//!
//! An alias is a member that forwards access to a member of another atom.
//! The owner's `target` member holds the other atom; `attr` names the member
//! on it. Reading, writing or deleting the alias reads, writes or deletes
//! `target.attr`.
//!
//! # Observable Aliases
//!
//! An alias declared observable also forwards change notifications, which
//! takes three cooperating pieces:
//!
//! - [`AliasDescriptor`]: the immutable, class-level description of the
//!   alias.
//!
//! - [`RetargetHandler`]: installed by the class builder on the `target`
//!   member. Each time `target` changes it detaches the stale forwarding
//!   handler and attaches a fresh one to the new target.
//!
//! - [`ForwardingHandler`]: registered on `attr` of the current target. It
//!   holds the owner weakly and re-delivers each change under the alias's
//!   name, first to the alias member's class-level observers, then to the
//!   owner's observers of the alias.
//!
//! Only one hop is supported: the target must hold the aliased attribute
//! itself.

mod descriptor;
mod forward;
mod guard;
mod retarget;

pub use descriptor::AliasDescriptor;
pub use forward::ForwardingHandler;
pub use guard::{Access, AliasGuard};
pub use retarget::RetargetHandler;
