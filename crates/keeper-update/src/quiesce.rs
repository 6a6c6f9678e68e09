//! Pausing a container's task around a mutation.
//!
//! A mutation never runs against a process whose pause state is unknown:
//! if the task lookup fails (other than not-found) or the pause fails, the
//! mutation is skipped and that error is returned. Once paused, a resume
//! is attempted on every exit path, including unwinding.

use keeper_common::context::Context;
use keeper_common::error::{KeeperError, Result};
use keeper_common::types::ContainerId;
use keeper_runtime::handle::{ContainerHandle, Task};

/// Outcome of one quiesced mutation.
#[derive(Debug)]
pub struct Quiesced<T> {
    /// Result of the mutation itself.
    pub outcome: Result<T>,
    /// Result of the resume; `None` when the container had no task.
    pub resume: Option<Result<()>>,
}

impl<T> Quiesced<T> {
    /// Returns whether a task was paused for the mutation.
    #[must_use]
    pub const fn was_paused(&self) -> bool {
        self.resume.is_some()
    }

    /// Folds the composite into a single result.
    ///
    /// A mutation error is returned verbatim (a concurrent resume failure
    /// is logged). A resume failure after a successful mutation becomes
    /// [`KeeperError::ResumeFailed`].
    ///
    /// # Errors
    ///
    /// Returns the mutation error, or `ResumeFailed`.
    pub fn into_result(self, id: &ContainerId) -> Result<T> {
        match (self.outcome, self.resume) {
            (Err(err), Some(Err(resume_err))) => {
                tracing::error!(id = %id, error = %resume_err, "resume failed after failed mutation; container may be left paused");
                Err(err)
            }
            (Err(err), _) => Err(err),
            (Ok(_), Some(Err(resume_err))) => Err(KeeperError::ResumeFailed {
                id: id.to_string(),
                source: Box::new(resume_err),
            }),
            (Ok(value), _) => Ok(value),
        }
    }
}

/// A task held in the paused state.
///
/// [`PausedTask::release`] resumes and reports the result; dropping an
/// unreleased guard resumes and logs.
struct PausedTask<'a> {
    task: Box<dyn Task + 'a>,
    ctx: &'a Context,
    id: &'a ContainerId,
    released: bool,
}

impl<'a> PausedTask<'a> {
    fn acquire(task: Box<dyn Task + 'a>, ctx: &'a Context, id: &'a ContainerId) -> Result<Self> {
        task.pause(ctx)?;
        tracing::debug!(id = %id, pid = task.pid(), "task quiesced");
        Ok(Self {
            task,
            ctx,
            id,
            released: false,
        })
    }

    fn release(mut self) -> Result<()> {
        self.released = true;
        let result = self.task.resume(self.ctx);
        match &result {
            Ok(()) => tracing::debug!(id = %self.id, "task released"),
            Err(e) => tracing::warn!(id = %self.id, error = %e, "task resume failed"),
        }
        result
    }
}

impl Drop for PausedTask<'_> {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        if let Err(e) = self.task.resume(self.ctx) {
            tracing::error!(id = %self.id, error = %e, "resume during unwind failed; container may be left paused");
        }
    }
}

/// Runs `f` with the container's task paused, reporting both outcomes.
///
/// Without a task, `f` runs directly and no pause or resume is issued.
///
/// # Errors
///
/// Returns the lookup error (other than not-found) or the pause error
/// unchanged; `f` has not run in either case.
pub fn quiesce<T, F>(ctx: &Context, container: &dyn ContainerHandle, f: F) -> Result<Quiesced<T>>
where
    F: FnOnce() -> Result<T>,
{
    let id = container.id();
    let task = match container.task(ctx) {
        Ok(task) => task,
        Err(e) if e.is_not_found() => {
            tracing::debug!(id = %id, "no live task, running mutation directly");
            return Ok(Quiesced {
                outcome: f(),
                resume: None,
            });
        }
        Err(e) => return Err(e),
    };
    let paused = PausedTask::acquire(task, ctx, id)?;
    let outcome = f();
    let resume = paused.release();
    Ok(Quiesced {
        outcome,
        resume: Some(resume),
    })
}

/// Runs `f` with the container's task paused and returns its result.
///
/// # Errors
///
/// Returns the lookup or pause error (without running `f`), `f`'s error,
/// or [`KeeperError::ResumeFailed`] if only the resume failed.
pub fn pause_and_run<T, F>(ctx: &Context, container: &dyn ContainerHandle, f: F) -> Result<T>
where
    F: FnOnce() -> Result<T>,
{
    quiesce(ctx, container, f)?.into_result(container.id())
}

#[cfg(test)]
mod tests {
    use std::cell::{Cell, RefCell};

    use keeper_common::types::ContainerState;
    use keeper_runtime::handle::{ContainerInfo, UpdateOpt};

    use super::*;

    #[derive(Default)]
    struct Script {
        task_missing: bool,
        lookup_fails: bool,
        pause_fails: bool,
        resume_fails: bool,
    }

    struct FakeContainer {
        id: ContainerId,
        script: Script,
        calls: RefCell<Vec<&'static str>>,
    }

    struct FakeTask<'a>(&'a FakeContainer);

    impl FakeContainer {
        fn new(script: Script) -> Self {
            Self {
                id: ContainerId::new("web-1"),
                script,
                calls: RefCell::new(Vec::new()),
            }
        }

        fn record(&self, call: &'static str) {
            self.calls.borrow_mut().push(call);
        }

        fn calls(&self) -> Vec<&'static str> {
            self.calls.borrow().clone()
        }
    }

    impl Task for FakeTask<'_> {
        fn pid(&self) -> u32 {
            42
        }

        fn status(&self, _ctx: &Context) -> Result<ContainerState> {
            Ok(ContainerState::Running)
        }

        fn pause(&self, _ctx: &Context) -> Result<()> {
            self.0.record("pause");
            if self.0.script.pause_fails {
                return Err(KeeperError::Runtime {
                    message: "pause refused".into(),
                });
            }
            Ok(())
        }

        fn resume(&self, _ctx: &Context) -> Result<()> {
            self.0.record("resume");
            if self.0.script.resume_fails {
                return Err(KeeperError::Runtime {
                    message: "resume refused".into(),
                });
            }
            Ok(())
        }
    }

    impl ContainerHandle for FakeContainer {
        fn id(&self) -> &ContainerId {
            &self.id
        }

        fn task(&self, _ctx: &Context) -> Result<Box<dyn Task + '_>> {
            self.record("task");
            if self.script.task_missing {
                return Err(KeeperError::NotFound {
                    kind: "task",
                    id: self.id.to_string(),
                });
            }
            if self.script.lookup_fails {
                return Err(KeeperError::Runtime {
                    message: "runtime unavailable".into(),
                });
            }
            Ok(Box::new(FakeTask(self)))
        }

        fn update(&self, _ctx: &Context, _opts: &[UpdateOpt]) -> Result<()> {
            Ok(())
        }

        fn info(&self, _ctx: &Context) -> Result<ContainerInfo> {
            Err(KeeperError::NotFound {
                kind: "container",
                id: self.id.to_string(),
            })
        }
    }

    fn failing_mutation() -> Result<()> {
        Err(KeeperError::Registry {
            message: "registry unreachable".into(),
        })
    }

    #[test]
    fn no_task_runs_directly_without_pause_or_resume() {
        let c = FakeContainer::new(Script {
            task_missing: true,
            ..Script::default()
        });
        let runs = Cell::new(0);
        pause_and_run(&Context::default(), &c, || {
            runs.set(runs.get() + 1);
            Ok(())
        })
        .expect("direct run");
        assert_eq!(runs.get(), 1);
        assert_eq!(c.calls(), ["task"]);
    }

    #[test]
    fn live_task_is_paused_before_and_resumed_after() {
        let c = FakeContainer::new(Script::default());
        pause_and_run(&Context::default(), &c, || {
            c.record("mutate");
            Ok(())
        })
        .expect("quiesced run");
        assert_eq!(c.calls(), ["task", "pause", "mutate", "resume"]);
    }

    #[test]
    fn failed_mutation_still_resumes_and_returns_its_error() {
        let c = FakeContainer::new(Script::default());
        let err = pause_and_run(&Context::default(), &c, failing_mutation).expect_err("mutation");
        assert!(matches!(err, KeeperError::Registry { .. }));
        assert_eq!(c.calls(), ["task", "pause", "resume"]);
    }

    #[test]
    fn pause_failure_skips_mutation() {
        let c = FakeContainer::new(Script {
            pause_fails: true,
            ..Script::default()
        });
        let ran = Cell::new(false);
        let err = pause_and_run(&Context::default(), &c, || {
            ran.set(true);
            Ok(())
        })
        .expect_err("pause");
        assert!(!ran.get());
        assert_eq!(err.to_string(), "runtime error: pause refused");
        assert_eq!(c.calls(), ["task", "pause"]);
    }

    #[test]
    fn lookup_failure_skips_mutation() {
        let c = FakeContainer::new(Script {
            lookup_fails: true,
            ..Script::default()
        });
        let ran = Cell::new(false);
        let err = pause_and_run(&Context::default(), &c, || {
            ran.set(true);
            Ok(())
        })
        .expect_err("lookup");
        assert!(!ran.get());
        assert!(!err.is_not_found());
        assert_eq!(c.calls(), ["task"]);
    }

    #[test]
    fn resume_failure_after_success_is_surfaced() {
        let c = FakeContainer::new(Script {
            resume_fails: true,
            ..Script::default()
        });
        let err = pause_and_run(&Context::default(), &c, || Ok(())).expect_err("resume");
        assert!(matches!(err, KeeperError::ResumeFailed { ref id, .. } if id == "web-1"));
    }

    #[test]
    fn mutation_error_wins_over_resume_error() {
        let c = FakeContainer::new(Script {
            resume_fails: true,
            ..Script::default()
        });
        let err = pause_and_run(&Context::default(), &c, failing_mutation).expect_err("both");
        assert!(matches!(err, KeeperError::Registry { .. }));
    }

    #[test]
    fn quiesce_reports_both_outcomes() {
        let c = FakeContainer::new(Script {
            resume_fails: true,
            ..Script::default()
        });
        let report = quiesce(&Context::default(), &c, || Ok(7)).expect("paused");
        assert!(report.was_paused());
        assert_eq!(report.outcome.as_ref().ok(), Some(&7));
        assert!(matches!(report.resume, Some(Err(_))));
    }

    #[test]
    fn panicking_mutation_is_resumed_during_unwind() {
        let c = FakeContainer::new(Script::default());
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _ = pause_and_run(&Context::default(), &c, || -> Result<()> {
                panic!("mutation panicked")
            });
        }));
        assert!(result.is_err());
        assert_eq!(c.calls(), ["task", "pause", "resume"]);
    }
}
