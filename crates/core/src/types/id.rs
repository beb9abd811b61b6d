//! Newtype IDs for type-safe entity references.
//!
//! Use the `define_id!` macro to create type-safe ID wrappers that prevent
//! accidentally mixing IDs from different entity types. Ids are opaque
//! strings: product ids come from the catalog, user ids from the identity
//! provider.

/// Macro to define a type-safe, string-backed ID wrapper.
///
/// Creates a newtype wrapper around `String` with:
/// - `Serialize`/`Deserialize` with `#[serde(transparent)]`
/// - `Debug`, `Clone`, `PartialEq`, `Eq`, `Hash`, `PartialOrd`, `Ord`
/// - Conversion methods: `new()`, `as_str()`, `into_inner()`
/// - `From<&str>`, `From<String>` and `Display` implementations
///
/// # Example
///
/// ```rust
/// # use souq_core::define_id;
/// define_id!(OrderId);
/// define_id!(InvoiceId);
///
/// let order_id = OrderId::new("A-1");
/// let invoice_id = InvoiceId::new("A-1");
///
/// // These are different types, so this won't compile:
/// // let _: OrderId = invoice_id;
/// assert_eq!(order_id.as_str(), invoice_id.as_str());
/// ```
#[macro_export]
macro_rules! define_id {
    ($name:ident) => {
        #[derive(
            Debug,
            Clone,
            PartialEq,
            Eq,
            Hash,
            PartialOrd,
            Ord,
            ::serde::Serialize,
            ::serde::Deserialize
        )]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Create a new ID from any string-like value.
            #[must_use]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Borrow the underlying string.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consume the ID and return the underlying string.
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

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

// Catalog product identifier (stable across sessions).
define_id!(ProductId);
// Identity provider user id (also the primary key of the profile row).
define_id!(UserId);

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_display_and_as_str() {
        let id = ProductId::new("42");
        assert_eq!(id.to_string(), "42");
        assert_eq!(id.as_str(), "42");
    }

    #[test]
    fn test_serde_is_transparent() {
        let id = UserId::from("8d0f6c1e-2f7a-4d55-9d3e-2b1b8a3c9f10");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"8d0f6c1e-2f7a-4d55-9d3e-2b1b8a3c9f10\"");

        let parsed: UserId = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, id);
    }
}
