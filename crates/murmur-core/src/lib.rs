//! Core types and trait definitions for the Murmur comment engine.
//!
//! This crate is deliberately free of HTTP and database dependencies.
//! Storage backends implement the traits in [`store`]; the engine and the
//! HTTP layer depend only on those abstractions.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod actor;
pub mod comment;
pub mod error;
pub mod notification;
pub mod page;
pub mod rate_limit;
pub mod reaction;
pub mod store;
pub mod subject;
pub mod visibility;

pub use error::{Error, Result};
