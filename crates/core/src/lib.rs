//! Cultural Club Core - Shared types library.
//!
//! This crate provides common types used across all Cultural Club components:
//! - `site` - Public website, member portal and admin area
//! - `cli` - Command-line tools for seeding content and managing admins
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no HTTP clients, no async
//! runtime. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Routes, sessions, keys, emails and content records

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
