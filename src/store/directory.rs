//! Asset store backed by a local directory.
//!
//! Files are content-addressed: the name of an uploaded card is derived from
//! the SHA-256 of its bytes, so uploading the same card twice yields the
//! same handle.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use log::info;
use sha2::{Digest, Sha256};
use url::Url;

use super::{AssetHandle, AssetStore};
use crate::{Error, Result};

#[derive(Debug, Clone)]
pub struct DirectoryStore {
    root: PathBuf,
}

impl DirectoryStore {
    /// `root` is made absolute so that returned `file://` URLs are valid.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        let root = if root.is_absolute() {
            root
        } else {
            std::env::current_dir()
                .map_err(|e| Error::ConfigError(format!("cannot resolve store root: {}", e)))?
                .join(root)
        };
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_of(&self, public_id: &str) -> Result<PathBuf> {
        if public_id.split('/').any(|seg| seg.is_empty() || seg == "." || seg == "..") {
            return Err(Error::AssetStoreError(format!("invalid public id {:?}", public_id)));
        }
        Ok(self.root.join(format!("{}.png", public_id)))
    }

    fn handle_for(&self, public_id: String, path: &Path) -> Result<AssetHandle> {
        let url = Url::from_file_path(path)
            .map_err(|_| Error::AssetStoreError(format!("no file URL for {}", path.display())))?;
        Ok(AssetHandle { public_id, url: url.to_string() })
    }
}

impl AssetStore for DirectoryStore {
    async fn upload(&self, png: Vec<u8>, folder: &str) -> Result<AssetHandle> {
        let digest = hex::encode(Sha256::digest(&png));
        let folder = folder.trim_matches('/');
        let public_id = if folder.is_empty() {
            digest[..20].to_string()
        } else {
            format!("{}/{}", folder, &digest[..20])
        };
        let path = self
            .path_of(&public_id)
            .map_err(|e| Error::UploadError(e.to_string()))?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| Error::UploadError(format!("{}: {}", parent.display(), e)))?;
        }
        tokio::fs::write(&path, &png)
            .await
            .map_err(|e| Error::UploadError(format!("{}: {}", path.display(), e)))?;
        info!("stored card {} ({} bytes)", public_id, png.len());
        self.handle_for(public_id, &path)
    }

    async fn delete(&self, public_id: &str) -> Result<bool> {
        let path = self.path_of(public_id)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(Error::AssetStoreError(format!("{}: {}", path.display(), e))),
        }
    }

    async fn rename(&self, public_id: &str, new_public_id: &str) -> Result<()> {
        let from = self.path_of(public_id)?;
        let to = self.path_of(new_public_id)?;
        if let Some(parent) = to.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| Error::AssetStoreError(format!("{}: {}", parent.display(), e)))?;
        }
        tokio::fs::rename(&from, &to)
            .await
            .map_err(|e| Error::AssetStoreError(format!("{} -> {}: {}", public_id, new_public_id, e)))
    }

    async fn list(&self, folder: &str, max_results: usize) -> Result<Vec<AssetHandle>> {
        let folder = folder.trim_matches('/');
        let dir = self.root.join(folder);
        let mut entries = match tokio::fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(Error::AssetStoreError(format!("{}: {}", dir.display(), e))),
        };

        let mut names = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| Error::AssetStoreError(e.to_string()))?
        {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("png") {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                names.push(stem.to_string());
            }
        }
        names.sort();

        names
            .into_iter()
            .take(max_results)
            .map(|name| {
                let public_id = if folder.is_empty() { name } else { format!("{}/{}", folder, name) };
                let path = self.path_of(&public_id)?;
                self.handle_for(public_id, &path)
            })
            .collect()
    }
}
