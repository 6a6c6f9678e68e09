//! Integration tests for the local runtime against real processes.
//!
//! A `sleep` child stands in for a container's init process so that
//! pause and resume deliver real signals.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use std::process::{Child, Command};

use keeper_common::context::Context;
use keeper_common::manifest::ContainerConfig;
use keeper_common::types::{ContainerId, ContainerState, Image, ImageId};
use keeper_runtime::handle::ContainerHandle;
use keeper_runtime::local::LocalRuntime;

struct Sleeper(Child);

impl Sleeper {
    fn spawn() -> Self {
        Self(
            Command::new("sleep")
                .arg("30")
                .spawn()
                .expect("spawn sleep"),
        )
    }

    fn pid(&self) -> u32 {
        self.0.id()
    }
}

impl Drop for Sleeper {
    fn drop(&mut self) {
        let _ = self.0.kill();
        let _ = self.0.wait();
    }
}

/// Reads the scheduler state letter from `/proc/<pid>/stat`.
#[cfg(target_os = "linux")]
fn proc_state(pid: u32) -> char {
    let stat = std::fs::read_to_string(format!("/proc/{pid}/stat")).expect("read stat");
    let after_comm = stat.rsplit_once(')').expect("comm terminator").1;
    after_comm.trim_start().chars().next().expect("state letter")
}

#[cfg(target_os = "linux")]
fn wait_for_state(pid: u32, expected: &[char]) -> bool {
    for _ in 0..50 {
        if expected.contains(&proc_state(pid)) {
            return true;
        }
        std::thread::sleep(std::time::Duration::from_millis(10));
    }
    false
}

fn runtime() -> (tempfile::TempDir, LocalRuntime) {
    let dir = tempfile::tempdir().expect("tempdir");
    let rt = LocalRuntime::open(dir.path().join("state.json"));
    (dir, rt)
}

#[test]
fn attached_process_is_a_running_task() {
    let sleeper = Sleeper::spawn();
    let (_dir, rt) = runtime();
    let ctx = Context::default();
    let cfg = ContainerConfig::new(ContainerId::new("web-1"), "app:v1");
    let image = Image::new("app:v1", ImageId::new("i1"));
    let c = rt
        .create(&ctx, &cfg, &image, Some(sleeper.pid()))
        .expect("create");

    let task = c.task(&ctx).map_err(|e| e.to_string()).expect("task");
    assert_eq!(task.pid(), sleeper.pid());
    assert_eq!(task.status(&ctx).expect("status"), ContainerState::Running);
}

#[cfg(target_os = "linux")]
#[test]
fn pause_and_resume_signal_the_process() {
    let sleeper = Sleeper::spawn();
    let (_dir, rt) = runtime();
    let ctx = Context::default();
    let cfg = ContainerConfig::new(ContainerId::new("web-1"), "app:v1");
    let image = Image::new("app:v1", ImageId::new("i1"));
    let c = rt
        .create(&ctx, &cfg, &image, Some(sleeper.pid()))
        .expect("create");

    let task = c.task(&ctx).map_err(|e| e.to_string()).expect("task");
    task.pause(&ctx).expect("pause");
    assert!(wait_for_state(sleeper.pid(), &['T', 't']));
    assert_eq!(c.info(&ctx).expect("info").state, ContainerState::Paused);

    let task = c.task(&ctx).map_err(|e| e.to_string()).expect("task");
    task.resume(&ctx).expect("resume");
    assert!(wait_for_state(sleeper.pid(), &['S', 'R']));
    assert_eq!(c.info(&ctx).expect("info").state, ContainerState::Running);
}

#[test]
fn pausing_twice_is_rejected() {
    let sleeper = Sleeper::spawn();
    let (_dir, rt) = runtime();
    let ctx = Context::default();
    let cfg = ContainerConfig::new(ContainerId::new("web-1"), "app:v1");
    let image = Image::new("app:v1", ImageId::new("i1"));
    let c = rt
        .create(&ctx, &cfg, &image, Some(sleeper.pid()))
        .expect("create");

    let task = c.task(&ctx).map_err(|e| e.to_string()).expect("task");
    task.pause(&ctx).expect("first pause");
    assert!(task.pause(&ctx).is_err());
    task.resume(&ctx).expect("resume");
    assert!(task.resume(&ctx).is_err());
}

#[test]
fn exited_process_has_no_task() {
    let mut child = Command::new("true").spawn().expect("spawn true");
    let pid = child.id();
    let _ = child.wait().expect("wait");

    let (_dir, rt) = runtime();
    let ctx = Context::default();
    let cfg = ContainerConfig::new(ContainerId::new("web-1"), "app:v1");
    let image = Image::new("app:v1", ImageId::new("i1"));
    let c = rt.create(&ctx, &cfg, &image, Some(pid)).expect("create");

    #[cfg(target_os = "linux")]
    assert!(c.task(&ctx).err().expect("reaped").is_not_found());
    #[cfg(not(target_os = "linux"))]
    assert!(c.task(&ctx).is_ok());
}

#[cfg(target_os = "linux")]
#[test]
fn failed_freeze_leaves_record_running() {
    let mut sleeper = Sleeper::spawn();
    let (_dir, rt) = runtime();
    let ctx = Context::default();
    let cfg = ContainerConfig::new(ContainerId::new("web-1"), "app:v1");
    let image = Image::new("app:v1", ImageId::new("i1"));
    let c = rt
        .create(&ctx, &cfg, &image, Some(sleeper.pid()))
        .expect("create");
    let task = c.task(&ctx).map_err(|e| e.to_string()).expect("task");

    sleeper.0.kill().expect("kill");
    let _ = sleeper.0.wait().expect("reap");

    assert!(task.pause(&ctx).is_err());
    assert_eq!(c.info(&ctx).expect("info").state, ContainerState::Running);
}
