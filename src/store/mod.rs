//! Asset stores: where finished cards are uploaded.
//!
//! The compositor only ever calls [`AssetStore::upload`]; delete, rename and
//! list exist for maintenance callers (rollback of half-created records,
//! backups, the CLI).

use std::future::Future;

use serde::Serialize;

use crate::Result;

#[cfg(feature = "cloudinary")]
pub mod cloudinary;
pub mod directory;

#[cfg(feature = "cloudinary")]
pub use cloudinary::{CloudinaryConfig, CloudinaryStore};
pub use directory::DirectoryStore;

/// Durable reference to an uploaded image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AssetHandle {
    /// Store-specific identifier, `folder/name` without extension.
    pub public_id: String,
    /// Public URL of the image.
    pub url: String,
}

pub trait AssetStore: Send + Sync {
    /// Store `png` under `folder` and return its handle.
    fn upload(&self, png: Vec<u8>, folder: &str) -> impl Future<Output = Result<AssetHandle>> + Send;

    /// Remove an asset. `Ok(false)` when it did not exist.
    fn delete(&self, public_id: &str) -> impl Future<Output = Result<bool>> + Send;

    fn rename(&self, public_id: &str, new_public_id: &str) -> impl Future<Output = Result<()>> + Send;

    /// Up to `max_results` assets whose public id starts with `folder`.
    fn list(&self, folder: &str, max_results: usize) -> impl Future<Output = Result<Vec<AssetHandle>>> + Send;
}

/// Public id of an image from its delivery URL.
///
/// Delivery URLs look like `.../image/upload/v1712345678/Cards/abc.png`; the
/// id is everything after the version segment, minus the extension. Returns
/// `None` when there is no `upload` segment or nothing follows the version.
pub fn extract_public_id(url: &str) -> Option<String> {
    let parts: Vec<&str> = url.split('/').collect();
    let upload = parts.iter().position(|p| *p == "upload")?;
    if upload + 2 >= parts.len() {
        return None;
    }
    let with_ext = parts[upload + 2..].join("/");
    let id = with_ext.split('.').next().unwrap_or_default();
    if id.is_empty() {
        None
    } else {
        Some(id.to_string())
    }
}

/// Public id named by `input`, which is either a public id already or an
/// `http(s)` delivery URL.
pub fn resolve_public_id(input: &str) -> Option<String> {
    let input = input.trim();
    if input.starts_with("http://") || input.starts_with("https://") {
        extract_public_id(input)
    } else if input.is_empty() {
        None
    } else {
        Some(input.to_string())
    }
}
