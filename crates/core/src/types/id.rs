//! Newtype identifiers for type-safe references.
//!
//! Use the `define_id!` macro to create string-backed wrappers that prevent
//! accidentally passing a session id where a product id is expected.

use uuid::Uuid;

/// Macro to define a string-backed identifier.
///
/// Creates a newtype wrapper around `String` with:
/// - `Serialize`/`Deserialize` with `#[serde(transparent)]`
/// - `Debug`, `Clone`, `PartialEq`, `Eq`, `Hash`
/// - Conversion methods: `new()`, `as_str()`, `into_inner()`
/// - `From<String>` and `From<&str>` implementations
///
/// # Example
///
/// ```rust
/// # use annya_core::define_id;
/// define_id!(WishlistId);
///
/// let id = WishlistId::new("w-1");
/// assert_eq!(id.as_str(), "w-1");
/// ```
#[macro_export]
macro_rules! define_id {
    ($name:ident) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash, ::serde::Serialize, ::serde::Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Create an identifier from any string-like value.
            #[must_use]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Get the identifier as a string slice.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consume the identifier and return the inner string.
            #[must_use]
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_owned())
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

define_id!(ProductId);
define_id!(OrderId);
define_id!(SessionId);
define_id!(IdempotencyKey);

impl SessionId {
    /// Mint a fresh anonymous session identifier (UUID v4).
    #[must_use]
    pub fn mint() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl IdempotencyKey {
    /// Mint a fresh single-use idempotency key (UUID v4).
    #[must_use]
    pub fn mint() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_product_id_display() {
        let id = ProductId::new("ring-001");
        assert_eq!(id.to_string(), "ring-001");
        assert_eq!(id.as_str(), "ring-001");
    }

    #[test]
    fn test_product_id_serializes_as_plain_string() {
        let id = ProductId::from("ring-001");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"ring-001\"");

        let parsed: ProductId = serde_json::from_str("\"ring-001\"").unwrap();
        assert_eq!(parsed, id);
    }

    #[test]
    fn test_session_id_mint_is_uuid_shaped() {
        let id = SessionId::mint();
        assert!(Uuid::parse_str(id.as_str()).is_ok());
    }

    #[test]
    fn test_idempotency_keys_are_unique() {
        assert_ne!(IdempotencyKey::mint(), IdempotencyKey::mint());
    }
}
