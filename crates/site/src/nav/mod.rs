//! Navigation and session control.
//!
//! The [`Controller`] is the single owner of the current route, session,
//! privilege flag and the "session checked" latch. Its transitions are
//! synchronous and return [`Effect`]s; the live session performs them and
//! feeds results (fragment changes, privilege answers) back in.

mod controller;
mod page;

pub use controller::{Controller, Effect, LookupTag, NavState, resolve_page};
pub use page::PageView;
