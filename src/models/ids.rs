//! Newtype wrappers for entity identifiers.
//!
//! Backend identifiers are opaque strings; the wrappers keep a category
//! id from being passed where a goal id is expected.

use serde::{Deserialize, Serialize};

/// Macro to define a newtype ID wrapping a `String` inner type.
macro_rules! define_string_id {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Creates a new identifier from the given string.
            #[inline]
            #[must_use]
            pub const fn new(value: String) -> Self {
                Self(value)
            }

            /// Returns a reference to the inner string.
            #[inline]
            #[must_use]
            pub fn as_inner(&self) -> &str {
                &self.0
            }

            /// Consumes the wrapper and returns the inner string.
            #[inline]
            #[must_use]
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl core::fmt::Display for $name {
            #[inline]
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                core::fmt::Display::fmt(&self.0, f)
            }
        }

        impl From<String> for $name {
            #[inline]
            fn from(value: String) -> Self {
                Self(value)
            }
        }

        impl From<&str> for $name {
            #[inline]
            fn from(value: &str) -> Self {
                Self(value.to_owned())
            }
        }
    };
}

define_string_id! {
    /// Unique identifier for a transaction (backend object id).
    TransactionId
}

define_string_id! {
    /// Unique identifier for a category (backend object id, or the
    /// category name for built-in defaults).
    CategoryId
}

define_string_id! {
    /// Unique identifier for a savings goal (`g_<unix millis>`).
    GoalId
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_id_serde_roundtrip() {
        let id = CategoryId::new("65a1f0c2e4b0a1b2c3d4e5f6".to_owned());
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, r#""65a1f0c2e4b0a1b2c3d4e5f6""#);
        let deserialized: CategoryId = serde_json::from_str(&json).unwrap();
        assert_eq!(deserialized, id);
    }

    #[test]
    fn string_id_display() {
        let id = GoalId::new("g_1700000000000".to_owned());
        assert_eq!(id.to_string(), "g_1700000000000");
    }

    #[test]
    fn id_from_inner() {
        let id: TransactionId = "tx-1".into();
        assert_eq!(id.as_inner(), "tx-1");

        let id: CategoryId = "Food".to_owned().into();
        assert_eq!(id.into_inner(), "Food");
    }
}
