//! Cultural Club site library.
//!
//! This crate provides the site as a library, allowing it to be tested
//! and reused. The binary in `main.rs` only wires configuration, tracing
//! and Sentry around [`routes::routes`].

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod admin;
pub mod config;
pub mod error;
pub mod filters;
pub mod identity;
pub mod live;
pub mod nav;
pub mod pages;
pub mod routes;
pub mod state;
pub mod store;
