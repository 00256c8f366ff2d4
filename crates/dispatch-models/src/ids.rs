//! Identifiers carried by action messages.
//!
//! `MessageId` is minted here when an action is created. `TenantId` comes
//! from the caller and is kept exactly as given.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// String-backed identifier: conversions, display and transparent serde.
macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Wraps an existing identifier.
            pub fn from_string(s: impl Into<String>) -> Self {
                Self(s.into())
            }

            /// Returns the identifier text.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

string_id! {
    /// Unique id of one action message, `msg-<uuid>` when generated.
    MessageId
}

string_id! {
    /// Tenant that owns an action. Never generated.
    TenantId
}

impl MessageId {
    /// Generates a fresh message id.
    pub fn new() -> Self {
        Self(format!("msg-{}", Uuid::new_v4()))
    }
}

impl Default for MessageId {
    fn default() -> Self {
        Self::new()
    }
}
