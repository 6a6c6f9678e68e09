//! Call context threaded through every collaborator call.
//!
//! Carries the runtime namespace and an optional deadline. The update core
//! never inspects the deadline itself; collaborators call
//! [`Context::check`] before doing work.

use std::time::{Duration, Instant};

use crate::error::{KeeperError, Result};

/// Namespace and deadline for one update invocation.
#[derive(Debug, Clone)]
pub struct Context {
    namespace: String,
    deadline: Option<Instant>,
}

impl Context {
    /// Creates a context without a deadline.
    #[must_use]
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            deadline: None,
        }
    }

    /// Returns a copy of this context that expires after `timeout`.
    #[must_use]
    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    /// Returns a copy of this context that expires at `deadline`.
    #[must_use]
    pub const fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Returns the runtime namespace.
    #[must_use]
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Returns the deadline, if any.
    #[must_use]
    pub const fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Returns whether the deadline has passed.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.deadline.is_some_and(|d| Instant::now() >= d)
    }

    /// Fails with [`KeeperError::DeadlineExceeded`] once the deadline has
    /// passed.
    ///
    /// # Errors
    ///
    /// Returns `DeadlineExceeded` naming `operation` if the context expired.
    pub fn check(&self, operation: &'static str) -> Result<()> {
        if self.is_expired() {
            tracing::warn!(namespace = %self.namespace, operation, "deadline exceeded");
            return Err(KeeperError::DeadlineExceeded { operation });
        }
        Ok(())
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new(crate::constants::DEFAULT_NAMESPACE)
    }
}
