//! `kpr list` — List managed containers.

use std::path::Path;

use clap::Args;
use keeper_common::constants::IP_LABEL;
use keeper_common::context::Context;
use keeper_common::error::KeeperError;
use keeper_common::manifest::ContainerConfig;
use keeper_runtime::handle::ContainerInfo;
use keeper_store::config::ConfigStore;

use super::Host;
use crate::output::format_bytes;

/// Arguments for the `list` command.
#[derive(Args, Debug)]
pub struct ListArgs {
    /// Print the runtime records as JSON.
    #[arg(long)]
    pub json: bool,
}

/// Executes the `list` command.
///
/// Shows each container's image, state, IP label, and the total size of
/// its bind mount sources.
///
/// # Errors
///
/// Returns an error if the state index or a stored config cannot be read.
pub fn execute(host: &Host, args: &ListArgs) -> anyhow::Result<()> {
    let ctx = host.context();
    let containers = host.runtime.containers(&ctx)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&containers)?);
        return Ok(());
    }
    if containers.is_empty() {
        println!("No containers found.");
        return Ok(());
    }

    println!(
        "{:<20} {:<30} {:<10} {:<16} {:<10}",
        "ID", "IMAGE", "STATUS", "IP", "SIZE"
    );
    for c in &containers {
        let size = match stored_config(host, &ctx, c)? {
            Some(cfg) => bind_size(&cfg).unwrap_or_else(|e| {
                tracing::warn!(id = %c.id, error = %e, "cannot size bind mounts");
                0
            }),
            None => 0,
        };
        println!(
            "{:<20} {:<30} {:<10} {:<16} {:<10}",
            c.id,
            c.image,
            c.state,
            c.labels.get(IP_LABEL).map_or("", String::as_str),
            format_bytes(size)
        );
    }
    Ok(())
}

/// Prefers the config store's copy; falls back to the runtime record.
fn stored_config(
    host: &Host,
    ctx: &Context,
    info: &ContainerInfo,
) -> anyhow::Result<Option<ContainerConfig>> {
    match host.store.read(ctx, &info.id) {
        Ok(cfg) => Ok(Some(cfg)),
        Err(e) if e.is_not_found() => Ok(info.current_config.clone()),
        Err(e) => Err(e.into()),
    }
}

/// Sums the sizes of all bind mount sources, walking directories.
fn bind_size(config: &ContainerConfig) -> Result<u64, KeeperError> {
    config
        .bind_mounts()
        .map(|m| path_size(Path::new(&m.source)))
        .sum()
}

fn path_size(path: &Path) -> Result<u64, KeeperError> {
    let io_err = |e| KeeperError::Io {
        path: path.to_path_buf(),
        source: e,
    };
    let meta = std::fs::metadata(path).map_err(io_err)?;
    if !meta.is_dir() {
        return Ok(meta.len());
    }
    let mut total = 0;
    for entry in std::fs::read_dir(path).map_err(io_err)? {
        let entry = entry.map_err(io_err)?;
        let file_type = entry.file_type().map_err(io_err)?;
        if file_type.is_symlink() {
            continue;
        }
        total += path_size(&entry.path())?;
    }
    Ok(total)
}

#[cfg(test)]
mod tests {
    use keeper_common::manifest::{Mount, MountKind};
    use keeper_common::types::ContainerId;

    use super::*;

    fn with_mount(source: &Path, kind: MountKind) -> ContainerConfig {
        let mut cfg = ContainerConfig::new(ContainerId::new("web-1"), "app:v1");
        cfg.mounts.push(Mount {
            source: source.display().to_string(),
            destination: "/data".into(),
            kind,
            options: Vec::new(),
        });
        cfg
    }

    #[test]
    fn bind_size_walks_directories() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::create_dir_all(dir.path().join("sub")).expect("mkdir");
        std::fs::write(dir.path().join("a"), [0u8; 100]).expect("write a");
        std::fs::write(dir.path().join("sub").join("b"), [0u8; 28]).expect("write b");

        let size = bind_size(&with_mount(dir.path(), MountKind::Bind)).expect("size");
        assert_eq!(size, 128);
    }

    #[test]
    fn bind_size_counts_single_files() {
        let dir = tempfile::tempdir().expect("tempdir");
        let file = dir.path().join("app.conf");
        std::fs::write(&file, [0u8; 64]).expect("write");
        assert_eq!(bind_size(&with_mount(&file, MountKind::Bind)).expect("size"), 64);
    }

    #[test]
    fn bind_size_ignores_tmpfs() {
        let cfg = with_mount(Path::new("/nonexistent"), MountKind::Tmpfs);
        assert_eq!(bind_size(&cfg).expect("size"), 0);
    }

    #[test]
    fn bind_size_missing_source_is_an_error() {
        let cfg = with_mount(Path::new("/nonexistent/source"), MountKind::Bind);
        assert!(bind_size(&cfg).is_err());
    }
}
