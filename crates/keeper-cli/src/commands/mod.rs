//! CLI command definitions and dispatch.

pub mod create;
pub mod deregister;
pub mod list;
pub mod rollback;
pub mod update;
pub mod upgrade;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use keeper_common::config::KeeperConfig;
use keeper_common::context::Context;
use keeper_common::types::ContainerId;
use keeper_image::catalog::ImageCatalog;
use keeper_image::resolver::{CatalogResolver, ResolveOptions};
use keeper_runtime::local::LocalRuntime;
use keeper_store::config::FileConfigStore;
use keeper_store::registry::FileRegistry;
use keeper_update::change::{Change, Collaborators};
use keeper_update::orchestrator::Orchestrator;

/// Keeper — live updates for supervised containers.
#[derive(Parser, Debug)]
#[command(name = "kpr", version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Command,

    /// Path to a JSON configuration file.
    #[arg(long, global = true, env = "KEEPER_CONFIG")]
    pub config: Option<PathBuf>,

    /// Base directory for state, configs, registry, and images.
    #[arg(long, global = true, env = "KEEPER_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Runtime namespace.
    #[arg(long, global = true, env = "KEEPER_NAMESPACE")]
    pub namespace: Option<String>,

    /// Refuse to fetch images over the network.
    #[arg(long, global = true)]
    pub offline: bool,

    /// Deadline for the whole invocation, in seconds (0 disables it).
    #[arg(long, global = true)]
    pub timeout: Option<u64>,
}

/// Available CLI subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Register a container from a config file.
    Create(create::CreateArgs),
    /// List managed containers.
    List(list::ListArgs),
    /// Apply a new config file to a container.
    Update(update::UpdateArgs),
    /// Move a container to a new image.
    Upgrade(upgrade::UpgradeArgs),
    /// Restore a container's previous config.
    Rollback(rollback::RollbackArgs),
    /// Remove one of a container's service registrations.
    Deregister(deregister::DeregisterArgs),
}

impl Cli {
    /// Resolves the effective configuration: file, then flags.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration file cannot be parsed.
    pub fn keeper_config(&self) -> anyhow::Result<KeeperConfig> {
        let mut cfg = match &self.config {
            Some(path) => KeeperConfig::load(path)?,
            None => KeeperConfig::default(),
        };
        if let Some(dir) = &self.data_dir {
            let KeeperConfig {
                namespace,
                offline,
                timeout_secs,
                ..
            } = cfg;
            cfg = KeeperConfig {
                namespace,
                offline,
                timeout_secs,
                ..KeeperConfig::with_data_dir(dir)
            };
        }
        if let Some(ns) = &self.namespace {
            cfg.namespace.clone_from(ns);
        }
        cfg.offline |= self.offline;
        if let Some(secs) = self.timeout {
            cfg.timeout_secs = secs;
        }
        Ok(cfg)
    }
}

/// File-backed collaborators opened from one configuration.
pub struct Host {
    /// Effective configuration.
    pub config: KeeperConfig,
    /// Container runtime.
    pub runtime: LocalRuntime,
    /// Image resolver.
    pub images: CatalogResolver,
    /// Service registry.
    pub registry: FileRegistry,
    /// Config store.
    pub store: FileConfigStore,
}

impl Host {
    /// Opens every collaborator under the configured paths.
    ///
    /// # Errors
    ///
    /// Returns an error if a directory cannot be created.
    pub fn open(config: KeeperConfig) -> anyhow::Result<Self> {
        tracing::debug!(data_dir = %config.data_dir.display(), namespace = %config.namespace, "opening host");
        Ok(Self {
            runtime: LocalRuntime::open(&config.state_file),
            images: CatalogResolver::new(ImageCatalog::open(&config.image_dir)?),
            registry: FileRegistry::open(&config.registry_file)?,
            store: FileConfigStore::open(&config.config_dir)?,
            config,
        })
    }

    /// Returns a call context for this invocation.
    pub fn context(&self) -> Context {
        self.config.context()
    }

    /// Image resolution options derived from the configuration.
    pub const fn resolve_options(&self) -> ResolveOptions {
        ResolveOptions {
            pull_if_missing: true,
            offline: self.config.offline,
        }
    }

    /// Applies `changes` to the container `id`.
    ///
    /// # Errors
    ///
    /// Returns an error if the container does not exist or a change fails.
    pub fn apply(&self, ctx: &Context, id: &ContainerId, changes: Vec<Change>) -> anyhow::Result<()> {
        let container = self.runtime.container(ctx, id)?;
        let orchestrator = Orchestrator::new(Collaborators {
            images: &self.images,
            registry: &self.registry,
            store: &self.store,
            resolve: self.resolve_options(),
        });
        orchestrator.apply_changes(ctx, &container, changes)?;
        Ok(())
    }
}

/// Dispatches the parsed CLI command to its handler.
///
/// # Errors
///
/// Returns an error if the command execution fails.
pub fn execute(cli: Cli) -> anyhow::Result<()> {
    let host = Host::open(cli.keeper_config()?)?;
    match cli.command {
        Command::Create(args) => create::execute(&host, args),
        Command::List(args) => list::execute(&host, &args),
        Command::Update(args) => update::execute(&host, args),
        Command::Upgrade(args) => upgrade::execute(&host, args),
        Command::Rollback(args) => rollback::execute(&host, &args),
        Command::Deregister(args) => deregister::execute(&host, args),
    }
}
