//! # keeper-image
//!
//! Image resolution for Keeper.
//!
//! Handles:
//! - **Catalog**: JSON index of images known to this host.
//! - **Sources**: `file://`, `tar://`, remote, and registry references.
//! - **Hashing**: SHA-256 content identity.
//! - **Resolver**: Lookup and pull-if-missing used by image and config changes.

#![cfg_attr(test, allow(clippy::expect_used, clippy::unwrap_used))]

pub mod catalog;
pub mod hash;
pub mod resolver;
pub mod source;
