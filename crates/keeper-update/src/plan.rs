//! Change lists for the supported operations.
//!
//! Lists put durable writes first: if a later runtime mutation fails, the
//! config store already records the intended configuration.

use keeper_common::error::{KeeperError, Result};
use keeper_common::manifest::ContainerConfig;
use keeper_runtime::handle::ContainerInfo;

use crate::change::Change;

/// Changes moving a container from `previous` to `desired`.
///
/// Files, then config, then one deregistration per service that
/// `desired` no longer publishes (in name order).
#[must_use]
pub fn plan_update(previous: Option<&ContainerConfig>, desired: ContainerConfig) -> Vec<Change> {
    let removed: Vec<String> = previous
        .map(|prev| {
            prev.services
                .keys()
                .filter(|name| !desired.services.contains_key(*name))
                .cloned()
                .collect()
        })
        .unwrap_or_default();

    let desired = Box::new(desired);
    let mut changes = vec![Change::Files(desired.clone()), Change::Config(desired)];
    changes.extend(removed.into_iter().map(|name| Change::Deregister { name }));
    changes
}

/// Changes upgrading a container to `reference`.
#[must_use]
pub fn plan_upgrade(reference: impl Into<String>) -> Vec<Change> {
    vec![Change::ImageUpdate {
        reference: reference.into(),
    }]
}

/// Changes restoring the configuration in effect before the last config
/// update.
///
/// Services published since the previous configuration are deregistered.
/// Services that the rolled-back update deregistered are not registered
/// again: no change kind registers a service, so the caller re-registers
/// them (as `kpr create` does) when it needs them back.
///
/// # Errors
///
/// Returns `KeeperError::NotFound` if the container has no previous
/// configuration.
pub fn plan_rollback(info: &ContainerInfo) -> Result<Vec<Change>> {
    let previous = info
        .previous_config
        .clone()
        .ok_or_else(|| KeeperError::NotFound {
            kind: "previous config",
            id: info.id.to_string(),
        })?;
    Ok(plan_update(info.current_config.as_ref(), previous))
}

/// Changes removing one service registration.
#[must_use]
pub fn plan_deregister(name: impl Into<String>) -> Vec<Change> {
    vec![Change::Deregister { name: name.into() }]
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use keeper_common::manifest::Service;
    use keeper_common::types::{ContainerId, ContainerState};

    use super::*;

    fn config(image: &str, services: &[&str]) -> ContainerConfig {
        let mut cfg = ContainerConfig::new(ContainerId::new("web-1"), image);
        for name in services {
            let _ = cfg.services.insert(
                (*name).to_string(),
                Service {
                    port: 80,
                    labels: Vec::new(),
                    check_interval_secs: None,
                },
            );
        }
        cfg
    }

    #[test]
    fn update_orders_files_before_config() {
        let changes = plan_update(None, config("app:v2", &[]));
        assert_eq!(
            changes.iter().map(Change::kind).collect::<Vec<_>>(),
            ["files", "config"]
        );
    }

    #[test]
    fn update_deregisters_removed_services_last_in_name_order() {
        let previous = config("app:v1", &["metrics", "http", "admin"]);
        let changes = plan_update(Some(&previous), config("app:v2", &["http"]));
        assert_eq!(
            changes[2..],
            [
                Change::Deregister {
                    name: "admin".into()
                },
                Change::Deregister {
                    name: "metrics".into()
                },
            ]
        );
    }

    #[test]
    fn upgrade_is_a_single_image_change() {
        assert_eq!(
            plan_upgrade("app:v2"),
            [Change::ImageUpdate {
                reference: "app:v2".into()
            }]
        );
    }

    #[test]
    fn rollback_without_previous_config_is_not_found() {
        let info = ContainerInfo {
            id: ContainerId::new("web-1"),
            image: "app:v1".into(),
            state: ContainerState::Created,
            pid: None,
            labels: BTreeMap::new(),
            current_config: Some(config("app:v1", &[])),
            previous_config: None,
            created_at: "2026-01-01T00:00:00Z".into(),
            updated_at: None,
        };
        assert!(plan_rollback(&info).expect_err("no previous").is_not_found());
    }

    #[test]
    fn rollback_restores_previous_and_drops_new_services() {
        let info = ContainerInfo {
            id: ContainerId::new("web-1"),
            image: "app:v2".into(),
            state: ContainerState::Running,
            pid: Some(7),
            labels: BTreeMap::new(),
            current_config: Some(config("app:v2", &["http", "grpc"])),
            previous_config: Some(config("app:v1", &["http"])),
            created_at: "2026-01-01T00:00:00Z".into(),
            updated_at: None,
        };
        let changes = plan_rollback(&info).expect("rollback");
        assert_eq!(changes[0], Change::Files(Box::new(config("app:v1", &["http"]))));
        assert_eq!(
            changes[2],
            Change::Deregister {
                name: "grpc".into()
            }
        );
        assert_eq!(changes.len(), 3);
    }

    #[test]
    fn rollback_does_not_restore_dropped_services() {
        let info = ContainerInfo {
            id: ContainerId::new("web-1"),
            image: "app:v2".into(),
            state: ContainerState::Created,
            pid: None,
            labels: BTreeMap::new(),
            current_config: Some(config("app:v2", &["http"])),
            previous_config: Some(config("app:v1", &["http", "admin"])),
            created_at: "2026-01-01T00:00:00Z".into(),
            updated_at: None,
        };
        let kinds: Vec<_> = plan_rollback(&info)
            .expect("rollback")
            .iter()
            .map(Change::kind)
            .collect();
        assert_eq!(kinds, ["files", "config"]);
    }
}
