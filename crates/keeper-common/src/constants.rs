//! System-wide constants and default paths.

use std::path::PathBuf;
use std::sync::OnceLock;

/// Default base directory for Keeper data on Linux with root access.
pub const SYSTEM_DATA_DIR: &str = "/var/lib/keeper";

/// Returns the data directory, preferring `$HOME/.keeper` for non-root
/// environments, falling back to `/var/lib/keeper`.
fn resolve_data_dir() -> PathBuf {
    if let Ok(home) = std::env::var("HOME").or_else(|_| std::env::var("USERPROFILE")) {
        let user_dir = PathBuf::from(home).join(".keeper");
        if std::fs::create_dir_all(&user_dir).is_ok() {
            return user_dir;
        }
    }
    PathBuf::from(SYSTEM_DATA_DIR)
}

static DATA_DIR: OnceLock<PathBuf> = OnceLock::new();

/// Returns the resolved data directory for this session.
pub fn data_dir() -> &'static PathBuf {
    DATA_DIR.get_or_init(resolve_data_dir)
}

/// File name of the runtime state index inside the data directory.
pub const STATE_FILE_NAME: &str = "state.json";

/// Directory name of the config store inside the data directory.
pub const CONFIG_DIR_NAME: &str = "configs";

/// File name of the service registry inside the data directory.
pub const REGISTRY_FILE_NAME: &str = "services.json";

/// Directory name of the image catalog inside the data directory.
pub const IMAGE_DIR_NAME: &str = "images";

/// Namespace used when none is configured.
pub const DEFAULT_NAMESPACE: &str = "keeper";

/// Default deadline, in seconds, for one update invocation.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Label holding the container's assigned IP address.
pub const IP_LABEL: &str = "keeper.io/ip";

/// SHA-256 digest length in hex characters.
pub const SHA256_HEX_LENGTH: usize = 64;
