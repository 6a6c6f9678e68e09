//! Local image catalog.
//!
//! `catalog.json` maps each image reference to the content identity it
//! resolved to. A reference resolves to at most one image; pulling it again
//! replaces the mapping.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use keeper_common::error::{KeeperError, Result};
use keeper_common::types::{Image, ImageId};
use serde::{Deserialize, Serialize};

/// File name of the catalog inside the image directory.
const CATALOG_FILE: &str = "catalog.json";

/// One resolved image reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageEntry {
    /// Content identity of the image.
    pub id: ImageId,
    /// Reference the image is known by.
    pub name: String,
    /// Reference the image was fetched from.
    pub source: String,
    /// Pull timestamp (ISO-8601).
    pub created_at: String,
}

impl ImageEntry {
    /// Converts the entry into a runtime image.
    #[must_use]
    pub fn to_image(&self) -> Image {
        Image::new(self.name.clone(), self.id.clone())
    }
}

/// Images known to this host, keyed by reference.
#[derive(Debug, Clone)]
pub struct ImageCatalog {
    path: PathBuf,
}

impl ImageCatalog {
    /// Opens the catalog in `image_dir`, creating the directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub fn open(image_dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(image_dir).map_err(|e| KeeperError::Io {
            path: image_dir.to_path_buf(),
            source: e,
        })?;
        Ok(Self {
            path: image_dir.join(CATALOG_FILE),
        })
    }

    /// Lists known images in reference order.
    ///
    /// # Errors
    ///
    /// Returns an error if the catalog file cannot be read or parsed.
    pub fn list(&self) -> Result<Vec<ImageEntry>> {
        Ok(self.load()?.into_values().collect())
    }

    /// Looks up the image a reference resolved to.
    ///
    /// # Errors
    ///
    /// Returns an error if the catalog cannot be read.
    pub fn find(&self, name: &str) -> Result<Option<ImageEntry>> {
        Ok(self.load()?.remove(name))
    }

    /// Records `entry` under its reference, replacing an earlier pull.
    ///
    /// # Errors
    ///
    /// Returns an error if the catalog cannot be read or written.
    pub fn register(&self, entry: ImageEntry) -> Result<()> {
        let mut images = self.load()?;
        tracing::debug!(image = %entry.name, id = %entry.id, "recording image");
        let _ = images.insert(entry.name.clone(), entry);
        self.store(&images)
    }

    fn load(&self) -> Result<BTreeMap<String, ImageEntry>> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }
        let bytes = std::fs::read(&self.path).map_err(|e| KeeperError::Io {
            path: self.path.clone(),
            source: e,
        })?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    fn store(&self, images: &BTreeMap<String, ImageEntry>) -> Result<()> {
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, serde_json::to_vec_pretty(images)?).map_err(|e| KeeperError::Io {
            path: tmp.clone(),
            source: e,
        })?;
        std::fs::rename(&tmp, &self.path).map_err(|e| KeeperError::Io {
            path: self.path.clone(),
            source: e,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pulled(id: &str, name: &str) -> ImageEntry {
        ImageEntry {
            id: ImageId::new(id),
            name: name.into(),
            source: name.into(),
            created_at: "2026-01-01T00:00:00Z".into(),
        }
    }

    #[test]
    fn unknown_reference_is_absent() {
        let dir = tempfile::tempdir().expect("tempdir");
        let catalog = ImageCatalog::open(dir.path()).expect("open");
        assert!(catalog.list().expect("list").is_empty());
        assert!(catalog.find("app:v1").expect("find").is_none());
    }

    #[test]
    fn registered_reference_resolves_to_its_image() {
        let dir = tempfile::tempdir().expect("tempdir");
        let catalog = ImageCatalog::open(dir.path()).expect("open");
        catalog.register(pulled("sha256:aa", "app:v1")).expect("register");

        let found = catalog.find("app:v1").expect("find").expect("present");
        assert_eq!(found.to_image(), Image::new("app:v1", ImageId::new("sha256:aa")));
        assert!(catalog.find("app:v2").expect("find").is_none());
    }

    #[test]
    fn repull_replaces_identity_for_same_reference() {
        let dir = tempfile::tempdir().expect("tempdir");
        let catalog = ImageCatalog::open(dir.path()).expect("open");
        catalog.register(pulled("sha256:aa", "app:latest")).expect("first pull");
        catalog.register(pulled("sha256:bb", "app:latest")).expect("second pull");
        catalog.register(pulled("sha256:cc", "app:v1")).expect("other tag");

        let names: Vec<_> = catalog.list().expect("list").into_iter().map(|e| e.name).collect();
        assert_eq!(names, ["app:latest", "app:v1"]);
        let latest = catalog.find("app:latest").expect("find").expect("present");
        assert_eq!(latest.id.as_str(), "sha256:bb");
    }

    #[test]
    fn catalog_survives_reopen_without_temporary_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        ImageCatalog::open(dir.path())
            .expect("open")
            .register(pulled("sha256:aa", "app:v1"))
            .expect("register");

        let reopened = ImageCatalog::open(dir.path()).expect("reopen");
        assert!(reopened.find("app:v1").expect("find").is_some());
        assert!(!dir.path().join("catalog.json.tmp").exists());
    }
}
