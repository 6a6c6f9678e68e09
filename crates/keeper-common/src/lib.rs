//! # keeper-common
//!
//! Shared types, error definitions, configuration models, and constants
//! used across the entire Keeper workspace.
//!
//! This crate is the leaf of the dependency graph. It depends on no other
//! internal crate and provides the primitives that the runtime, image,
//! store, and update crates build upon.

#![cfg_attr(test, allow(clippy::expect_used, clippy::unwrap_used))]

pub mod config;
pub mod constants;
pub mod context;
pub mod error;
pub mod manifest;
pub mod types;
