//! Core types for the Cultural Club site.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod content;
pub mod email;
pub mod id;
pub mod route;
pub mod session;

pub use content::*;
pub use email::{Email, EmailError};
pub use id::*;
pub use route::{FragmentResolution, Route};
pub use session::Session;
