//! Error types for the object model and alias members.

/// Errors raised by attribute access, alias forwarding, and configuration.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The alias's target attribute holds no object.
    #[error("alias '{alias}' has no target: '{target}' is None")]
    NullTarget { alias: String, target: String },

    /// The object has no attribute with the requested name.
    #[error("'{class}' object has no attribute '{name}'")]
    AttributeMissing { class: String, name: String },

    /// The attribute's own validation rejected the assigned value.
    #[error("the '{name}' member of a '{class}' object must be of type '{expected}', got '{found}'")]
    TypeRejected {
        class: String,
        name: String,
        expected: String,
        found: String,
    },

    /// A member looked up as an alias is some other kind of member.
    #[error("the '{name}' member of '{class}' is not an alias")]
    NotAnAlias { class: String, name: String },

    /// An alias was re-entered while resolving itself.
    #[error("alias recursion detected on '{alias}'")]
    AliasRecursion { alias: String },

    #[error("invalid configuration: {0}")]
    InvalidConfig(#[from] serde_json::Error),
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;
