//! The card compositor: photo + metadata in, uploaded PNG handle out.
//!
//! A render resolves the source bytes, then decodes, paints and encodes on
//! the blocking pool, uploads the PNG, and finally releases every temporary
//! file it owns, whichever way it ended.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use image::RgbaImage;
use log::{debug, info, warn};
use sha2::{Digest, Sha256};

use crate::card::{CardFace, CardRequest};
use crate::error::CleanupWarning;
use crate::rendering::layout::{CardLayout, CornerStyle};
use crate::rendering::raster::{decode, rasterize, CoverResize, Resizer};
use crate::rendering::stages::{paint_card, Painter};
use crate::rendering::text::{FontRegistry, FontSet};
use crate::rendering::{RenderJob, RenderedCard};
use crate::source::{self, Fetcher, HttpFetcher};
use crate::store::{AssetHandle, AssetStore};
use crate::{CompositorConfig, Error, Result};

/// Temporary files owned by one render. Released exactly once: explicitly at
/// the end of the render, or on drop if the render never got there.
#[derive(Debug, Default)]
pub struct Scratch {
    paths: Vec<PathBuf>,
}

impl Scratch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn track(&mut self, path: PathBuf) {
        self.paths.push(path);
    }

    pub fn tracked(&self) -> &[PathBuf] {
        &self.paths
    }

    /// Delete every tracked file without blocking the runtime. Failures are
    /// logged and returned, never raised; a second call has nothing left to do.
    pub async fn release(&mut self) -> Vec<CleanupWarning> {
        let mut warnings = Vec::new();
        for path in self.paths.drain(..) {
            let removed = tokio::fs::remove_file(&path).await;
            if let Some(w) = cleanup_outcome(path, removed) {
                warnings.push(w);
            }
        }
        warnings
    }

    /// Blocking variant of [`Scratch::release`], for drop and non-async callers.
    pub fn release_blocking(&mut self) -> Vec<CleanupWarning> {
        let mut warnings = Vec::new();
        for path in self.paths.drain(..) {
            let removed = std::fs::remove_file(&path);
            if let Some(w) = cleanup_outcome(path, removed) {
                warnings.push(w);
            }
        }
        warnings
    }
}

fn cleanup_outcome(path: PathBuf, removed: std::io::Result<()>) -> Option<CleanupWarning> {
    match removed {
        Ok(()) => {
            debug!("removed temporary file {}", path.display());
            None
        }
        Err(e) => {
            let w = CleanupWarning { path, reason: e.to_string() };
            warn!("{}", w);
            Some(w)
        }
    }
}

impl Drop for Scratch {
    fn drop(&mut self) {
        // Only reached with files left when the render future was cancelled.
        self.release_blocking();
    }
}

/// Decode, lay out, paint and encode one card. Pure CPU work.
pub fn compose(
    bytes: &[u8],
    face: &CardFace,
    fonts: &FontSet,
    resizer: &dyn Resizer,
    corners: CornerStyle,
) -> Result<RenderedCard> {
    let layout = CardLayout::compute();
    let source = decode(bytes)?;
    let photo: RgbaImage = resizer.cover(
        &source,
        layout.photo.width as u32,
        layout.photo.height as u32,
    )?;

    let job = RenderJob::new(face, Arc::new(photo));
    let painter = Painter { layout, fonts, corners };
    let list = paint_card(&job, &painter);
    let canvas = rasterize(&list, fonts)?;
    canvas.encode_png()
}

pub struct Compositor<F, S> {
    config: CompositorConfig,
    fonts: Arc<FontSet>,
    resizer: Arc<dyn Resizer>,
    fetcher: F,
    store: S,
}

impl<S: AssetStore> Compositor<HttpFetcher, S> {
    /// Register fonts and build the HTTP fetcher from `config`.
    pub fn from_config(config: CompositorConfig, store: S) -> Result<Self> {
        let registration = FontRegistry::register(&config.fonts);
        if !registration.is_complete() {
            warn!("card fonts incomplete: {:?}", registration.report);
        }
        let fetcher = HttpFetcher::new(&config.user_agent, config.fetch_timeout_ms)?;
        Ok(Self::new(config, Arc::new(registration.fonts), fetcher, store))
    }
}

impl<F: Fetcher, S: AssetStore> Compositor<F, S> {
    pub fn new(config: CompositorConfig, fonts: Arc<FontSet>, fetcher: F, store: S) -> Self {
        Self {
            config,
            fonts,
            resizer: Arc::new(CoverResize),
            fetcher,
            store,
        }
    }

    /// Replace the cover resizer.
    pub fn with_resizer(mut self, resizer: Arc<dyn Resizer>) -> Self {
        self.resizer = resizer;
        self
    }

    pub fn config(&self) -> &CompositorConfig {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Render a card and upload it, returning the store's handle.
    ///
    /// Fetch, decode, encode and upload failures are returned as-is; nothing
    /// is uploaded after a failure. A temporary input file and the spooled
    /// PNG are deleted on every path.
    pub async fn render_card(&self, request: CardRequest) -> Result<AssetHandle> {
        let mut scratch = Scratch::new();
        if let Some(path) = request.source.temporary_path() {
            scratch.track(path.clone());
        }

        let result = self.run(request, &mut scratch).await;
        scratch.release().await;
        result
    }

    async fn run(&self, request: CardRequest, scratch: &mut Scratch) -> Result<AssetHandle> {
        let bytes = source::resolve(&request.source, &self.fetcher).await?;
        debug!("resolved {} source bytes for {:?}", bytes.len(), request.face.title);

        let face = request.face;
        let fonts = Arc::clone(&self.fonts);
        let resizer = Arc::clone(&self.resizer);
        let corners = self.config.corner_style;
        let card = tokio::task::spawn_blocking(move || {
            compose(&bytes, &face, &fonts, resizer.as_ref(), corners)
        })
        .await??;

        if let Some(dir) = &self.config.spool_dir {
            let path = spool(dir, &card.png_data).await?;
            scratch.track(path);
        }

        let size = card.png_data.len();
        let handle = self
            .store
            .upload(card.png_data, &self.config.asset_folder)
            .await?;
        info!("card uploaded as {} ({} bytes)", handle.url, size);
        Ok(handle)
    }
}

/// Write the encoded card next to other in-flight renders before upload.
async fn spool(dir: &std::path::Path, png: &[u8]) -> Result<PathBuf> {
    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|e| Error::EncodeError(format!("cannot create spool dir {}: {}", dir.display(), e)))?;
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or_default();
    let digest = hex::encode(Sha256::digest(png));
    let path = dir.join(format!("{}-{}.png", nanos, &digest[..12]));
    tokio::fs::write(&path, png)
        .await
        .map_err(|e| Error::EncodeError(format!("cannot spool {}: {}", path.display(), e)))?;
    Ok(path)
}
