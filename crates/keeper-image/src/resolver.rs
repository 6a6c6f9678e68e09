//! Image resolution for image and config changes.

use keeper_common::context::Context;
use keeper_common::error::{KeeperError, Result};
use keeper_common::types::{Image, ImageId};

use crate::catalog::{ImageCatalog, ImageEntry};
use crate::hash;
use crate::source::{ImageSource, resolve_source};

/// Options controlling [`ImageResolver::resolve`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolveOptions {
    /// Fetch the image when it is not known locally.
    pub pull_if_missing: bool,
    /// Refuse sources that need network egress.
    pub offline: bool,
}

impl Default for ResolveOptions {
    fn default() -> Self {
        Self {
            pull_if_missing: true,
            offline: false,
        }
    }
}

/// Turns image references into images the runtime can run.
pub trait ImageResolver {
    /// Looks up an image that is already known, without fetching.
    ///
    /// # Errors
    ///
    /// Returns `KeeperError::NotFound` if the image is unknown.
    fn get(&self, ctx: &Context, reference: &str) -> Result<Image>;

    /// Looks up an image, fetching it first when allowed by `opts`.
    ///
    /// # Errors
    ///
    /// Returns an error if the reference is invalid, unknown and not
    /// fetchable, or the fetch fails.
    fn resolve(&self, ctx: &Context, reference: &str, opts: &ResolveOptions) -> Result<Image>;
}

/// Resolver backed by the local [`ImageCatalog`].
///
/// Fetching records the image in the catalog; layer transfer belongs to
/// the image store and is not performed here.
#[derive(Debug, Clone)]
pub struct CatalogResolver {
    catalog: ImageCatalog,
}

impl CatalogResolver {
    /// Creates a resolver over the given catalog.
    #[must_use]
    pub const fn new(catalog: ImageCatalog) -> Self {
        Self { catalog }
    }

    /// Returns the underlying catalog.
    #[must_use]
    pub const fn catalog(&self) -> &ImageCatalog {
        &self.catalog
    }

    fn pull(&self, reference: &str, source: &ImageSource) -> Result<Image> {
        tracing::info!(image = reference, ?source, "pulling image");
        let digest = match source {
            ImageSource::Tar(path) => hash::hash_file(path)?,
            ImageSource::File(_) | ImageSource::Remote(_) | ImageSource::Registry(_) => {
                hash::hash_bytes(reference.as_bytes())
            }
        };
        let entry = ImageEntry {
            id: ImageId::new(digest.to_string()),
            name: reference.to_string(),
            source: reference.to_string(),
            created_at: chrono::Utc::now().to_rfc3339(),
        };
        let image = entry.to_image();
        self.catalog.register(entry)?;
        tracing::info!(image = reference, id = %image.id, "image pulled");
        Ok(image)
    }
}

impl ImageResolver for CatalogResolver {
    fn get(&self, ctx: &Context, reference: &str) -> Result<Image> {
        ctx.check("image lookup")?;
        self.catalog
            .find(reference)?
            .map(|e| e.to_image())
            .ok_or_else(|| KeeperError::NotFound {
                kind: "image",
                id: reference.to_string(),
            })
    }

    fn resolve(&self, ctx: &Context, reference: &str, opts: &ResolveOptions) -> Result<Image> {
        ctx.check("image resolve")?;
        let source = resolve_source(reference)?;
        if let Some(entry) = self.catalog.find(reference)? {
            tracing::debug!(image = reference, id = %entry.id, "image already present");
            return Ok(entry.to_image());
        }
        if !opts.pull_if_missing {
            return Err(KeeperError::NotFound {
                kind: "image",
                id: reference.to_string(),
            });
        }
        if opts.offline && source.is_remote() {
            return Err(KeeperError::PermissionDenied {
                message: format!("offline mode forbids fetching {reference}"),
            });
        }
        self.pull(reference, &source)
    }
}
