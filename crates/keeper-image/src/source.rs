//! Image reference protocols.
//!
//! Supports `file://` (local directory), `tar://` (archive), remote
//! HTTP(S) archives, and plain registry references such as `app:v2`.

use std::path::PathBuf;

use keeper_common::error::{KeeperError, Result};

/// Where an image reference points.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageSource {
    /// Local directory (`file:///path/to/rootfs`).
    File(PathBuf),
    /// Local tar archive (`tar:///path/to/image.tar`).
    Tar(PathBuf),
    /// Remote HTTP(S) archive.
    Remote(String),
    /// Registry reference (`name[:tag]` or `host/name[:tag]`).
    Registry(String),
}

impl ImageSource {
    /// Returns whether fetching this source needs network egress.
    #[must_use]
    pub const fn is_remote(&self) -> bool {
        matches!(self, Self::Remote(_) | Self::Registry(_))
    }
}

/// Parses an image reference into an [`ImageSource`].
///
/// # Errors
///
/// Returns an error if a local path does not exist, the scheme is
/// unsupported, or a registry reference is malformed.
pub fn resolve_source(reference: &str) -> Result<ImageSource> {
    if let Some(path_str) = reference.strip_prefix("file://") {
        let path = PathBuf::from(path_str);
        if !path.exists() {
            return Err(KeeperError::NotFound {
                kind: "image directory",
                id: path_str.to_string(),
            });
        }
        tracing::debug!(path = %path.display(), "resolved file:// source");
        Ok(ImageSource::File(path))
    } else if let Some(path_str) = reference.strip_prefix("tar://") {
        let path = PathBuf::from(path_str);
        if !path.exists() {
            return Err(KeeperError::NotFound {
                kind: "tar archive",
                id: path_str.to_string(),
            });
        }
        tracing::debug!(path = %path.display(), "resolved tar:// source");
        Ok(ImageSource::Tar(path))
    } else if reference.starts_with("https://") || reference.starts_with("http://") {
        tracing::debug!(url = reference, "resolved remote source");
        Ok(ImageSource::Remote(reference.to_string()))
    } else if reference.contains("://") {
        Err(KeeperError::Config {
            message: format!("unsupported image source URI scheme: {reference}"),
        })
    } else if is_valid_registry_ref(reference) {
        Ok(ImageSource::Registry(reference.to_string()))
    } else {
        Err(KeeperError::Config {
            message: format!("invalid image reference: {reference:?}"),
        })
    }
}

fn is_valid_registry_ref(reference: &str) -> bool {
    !reference.is_empty()
        && !reference.starts_with(['/', ':', '.'])
        && !reference.ends_with([':', '/'])
        && reference
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_' | '/' | ':' | '@'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_file_source_existing_dir_returns_file() {
        let dir = tempfile::tempdir().expect("failed to create tempdir");
        let uri = format!("file://{}", dir.path().display());
        let source = resolve_source(&uri).expect("resolve failed");
        assert!(matches!(source, ImageSource::File(_)));
        assert!(!source.is_remote());
    }

    #[test]
    fn resolve_tar_source_existing_file_returns_tar() {
        let dir = tempfile::tempdir().expect("failed to create tempdir");
        let tar_path = dir.path().join("test.tar");
        std::fs::write(&tar_path, b"fake tar").expect("failed to write");
        let uri = format!("tar://{}", tar_path.display());
        let source = resolve_source(&uri).expect("resolve failed");
        assert!(matches!(source, ImageSource::Tar(_)));
    }

    #[test]
    fn resolve_https_source_returns_remote() {
        let source = resolve_source("https://example.com/image.tar").expect("resolve failed");
        assert!(source.is_remote());
    }

    #[test]
    fn resolve_tagged_name_returns_registry() {
        let source = resolve_source("registry.local/app:v2").expect("resolve failed");
        assert_eq!(source, ImageSource::Registry("registry.local/app:v2".into()));
        assert!(source.is_remote());
    }

    #[test]
    fn resolve_unknown_scheme_returns_error() {
        assert!(resolve_source("ftp://example.com/image").is_err());
    }

    #[test]
    fn resolve_malformed_reference_returns_error() {
        assert!(resolve_source("app:").is_err());
        assert!(resolve_source("").is_err());
        assert!(resolve_source("app v2").is_err());
    }

    #[test]
    fn resolve_missing_file_path_returns_not_found() {
        let err = resolve_source("file:///nonexistent/path").expect_err("missing");
        assert!(err.is_not_found());
    }
}
