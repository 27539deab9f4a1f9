//! Authenticated session snapshot.

use serde::{Deserialize, Serialize};

use crate::{Email, IdentityRef};

/// Evidence of an authenticated identity.
///
/// Absence of a session is modeled as `Option<Session>::None`; a `Session`
/// value always refers to a signed-in identity. Tokens are deliberately not
/// part of this type: it is handed to templates and logs.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Session {
    /// Identity provider uid.
    pub identity: IdentityRef,
    /// Display handle.
    pub email: Email,
}

impl Session {
    /// Create a session snapshot.
    #[must_use]
    pub const fn new(identity: IdentityRef, email: Email) -> Self {
        Self { identity, email }
    }

    /// Whether two snapshots refer to the same identity.
    #[must_use]
    pub fn same_identity(&self, other: &Self) -> bool {
        self.identity == other.identity
    }
}
