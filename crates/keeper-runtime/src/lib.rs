//! Runtime collaborator for Keeper.
//!
//! Defines the contracts the update core consumes ([`handle::ContainerHandle`],
//! [`handle::Task`], [`handle::UpdateOpt`]) and a daemon-less implementation
//! backed by a JSON state index ([`local::LocalRuntime`]).

#![cfg_attr(test, allow(clippy::expect_used, clippy::unwrap_used))]

pub mod handle;
pub mod local;
pub mod process;
pub mod state;
