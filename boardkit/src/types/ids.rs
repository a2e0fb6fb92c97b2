//! Identifier newtypes for boards, lists and cards.

use serde::{Deserialize, Serialize};
use std::fmt;
use ulid::Ulid;

/// Prefix marking a client-minted id that the remote store has not confirmed.
pub const TEMPORARY_PREFIX: &str = "tmp_";

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Generate a new durable id
            pub fn new() -> Self {
                Self(Ulid::new().to_string())
            }

            /// Generate a temporary id for an optimistic insert
            pub fn temporary() -> Self {
                Self(format!("{}{}", TEMPORARY_PREFIX, Ulid::new()))
            }

            /// Wrap an existing id string
            pub fn from_string(s: impl Into<String>) -> Self {
                Self(s.into())
            }

            /// Whether this id was minted locally and awaits confirmation
            pub fn is_temporary(&self) -> bool {
                self.0.starts_with(TEMPORARY_PREFIX)
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

define_id!(
    /// Board identifier
    BoardId
);
define_id!(
    /// List identifier
    ListId
);
define_id!(
    /// Card identifier
    CardId
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_ids_are_ulids() {
        let id = CardId::new();
        assert_eq!(id.as_str().len(), 26);
        assert!(!id.is_temporary());
        assert_ne!(id, CardId::new());
    }

    #[test]
    fn test_temporary_ids() {
        let id = ListId::temporary();
        assert!(id.is_temporary());
        assert!(id.as_str().starts_with("tmp_"));
    }

    #[test]
    fn test_serializes_as_plain_string() {
        let id = BoardId::from("board-1");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"board-1\"");
        let back: BoardId = serde_json::from_str("\"board-1\"").unwrap();
        assert_eq!(back, id);
    }
}
