//! Core types and trait definitions for Till Debt Do Us Part.
//!
//! This crate is deliberately free of HTTP and database dependencies.
//! All other crates depend on it; it depends on nothing proprietary.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod achievements;
pub mod comment;
pub mod context;
pub mod debt;
pub mod error;
pub mod profile;
pub mod store;
pub mod timeline;
pub mod user;

pub use error::{Error, Result};
