//! # keeper-update
//!
//! Applies ordered changes to a live container without corrupting the
//! process it runs.
//!
//! - [`change::Change`]: the four mutation kinds (image, deregistration,
//!   config, files).
//! - [`quiesce`]: pauses the container's task around one mutation and
//!   resumes it on every exit path.
//! - [`orchestrator::Orchestrator`]: applies a list of changes in order,
//!   each quiesced, stopping at the first failure.
//! - [`plan`]: builds the change lists for update, upgrade, and rollback.
//!
//! Changes are applied best-effort with no rollback of earlier changes;
//! callers order them so that a failure midway leaves an acceptable
//! state.

#![cfg_attr(test, allow(clippy::expect_used, clippy::unwrap_used))]

pub mod change;
pub mod orchestrator;
pub mod plan;
pub mod quiesce;
