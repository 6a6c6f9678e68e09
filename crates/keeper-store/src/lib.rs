//! # keeper-store
//!
//! Durable collaborators that live outside the runtime's own state:
//!
//! - [`config::ConfigStore`]: persisted declarative configuration, one
//!   file per container.
//! - [`registry::ServiceRegistry`]: service registrations keyed by
//!   container and service name.

#![cfg_attr(test, allow(clippy::expect_used, clippy::unwrap_used))]

pub mod config;
pub mod registry;
