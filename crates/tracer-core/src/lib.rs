//! Core types and trait definitions for the Tracer presence store.
//!
//! This crate holds the presence-interval model and everything that reasons
//! about it: the check-in state machine, the overlap matcher, and the history
//! aggregator. It is deliberately free of HTTP and database dependencies;
//! storage backends and reference resolvers plug in through the traits in
//! [`store`] and [`directory`].

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod clock;
pub mod deadline;
pub mod directory;
pub mod error;
pub mod interval;
pub mod matcher;
pub mod store;
pub mod tracker;
pub mod validate;

pub use error::{Error, ErrorKind, Result};

#[cfg(test)]
mod tests;
