//! Newtype keys for type-safe references to backend records.
//!
//! The hosted backend addresses everything by opaque strings (user ids,
//! document ids). Use the `define_key!` macro to create wrappers that keep
//! those strings from being mixed up.

/// Macro to define a type-safe string key.
///
/// Creates a newtype wrapper around `String` with:
/// - `Serialize`/`Deserialize` with `#[serde(transparent)]`
/// - `Debug`, `Clone`, `PartialEq`, `Eq`, `Hash`, `PartialOrd`, `Ord`
/// - Conversion methods: `new()`, `as_str()`, `into_inner()`
/// - `Display`, `AsRef<str>` and `From<&str>`/`From<String>`
///
/// # Example
///
/// ```rust
/// # use club_core::define_key;
/// define_key!(MemberKey);
/// define_key!(EventKey);
///
/// let member = MemberKey::new("abc");
/// let event = EventKey::new("abc");
///
/// // These are different types, so this won't compile:
/// // let _: MemberKey = event;
/// assert_eq!(member.as_str(), event.as_str());
/// ```
#[macro_export]
macro_rules! define_key {
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
            /// Create a new key from any string-like value.
            #[must_use]
            pub fn new(key: impl Into<String>) -> Self {
                Self(key.into())
            }

            /// Get the key as a string slice.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consume the key and return the inner string.
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

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl From<&str> for $name {
            fn from(key: &str) -> Self {
                Self(key.to_owned())
            }
        }

        impl From<String> for $name {
            fn from(key: String) -> Self {
                Self(key)
            }
        }
    };
}

// Opaque uid assigned by the identity provider.
define_key!(IdentityRef);
// Document id inside a content collection.
define_key!(DocumentId);
