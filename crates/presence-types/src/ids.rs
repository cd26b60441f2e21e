//! Type-safe identifier wrappers.
//!
//! Scopes, spaces and members are addressed by string identifiers. Each kind
//! gets its own newtype so a member id can never be passed where a space id
//! is expected. Identifiers generated in-process use UUID v7 (time-ordered)
//! rendered as a string.

use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

/// Generates a newtype wrapper around [`String`] with standard derives.
macro_rules! define_id {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
        #[serde(transparent)]
        #[ts(export, export_to = "bindings/")]
        pub struct $name(pub String);

        impl $name {
            /// Wrap an existing identifier.
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Create a fresh identifier from a UUID v7.
            pub fn generate() -> Self {
                Self(Uuid::now_v7().to_string())
            }

            /// Borrow the identifier as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Return the inner [`String`].
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_owned())
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }
    };
}

define_id! {
    /// Identifier of a scope that carries a flow: the root state or a space.
    ScopeId
}

define_id! {
    /// Identifier of a flow space (room) inside the root state.
    SpaceId
}

define_id! {
    /// Identifier of a member present in a space.
    MemberId
}

/// Identifier of the single root scope created per session.
pub const ROOT_SCOPE_ID: &str = "root";

impl ScopeId {
    /// The identifier of the root scope.
    pub fn root() -> Self {
        Self::new(ROOT_SCOPE_ID)
    }

    /// Whether this identifier names the root scope.
    pub fn is_root(&self) -> bool {
        self.0 == ROOT_SCOPE_ID
    }
}

impl From<&SpaceId> for ScopeId {
    fn from(id: &SpaceId) -> Self {
        Self(id.0.clone())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn generated_ids_are_distinct() {
        let a = MemberId::generate();
        let b = MemberId::generate();
        assert_ne!(a, b);
        assert!(Uuid::parse_str(a.as_str()).is_ok());
    }

    #[test]
    fn ids_serialize_as_plain_strings() {
        let id = SpaceId::new("garden");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"garden\"");
    }

    #[test]
    fn root_scope_is_recognized() {
        assert!(ScopeId::root().is_root());
        assert!(!ScopeId::new("garden").is_root());
        assert_eq!(ScopeId::from(&SpaceId::new("garden")).as_str(), "garden");
    }
}
