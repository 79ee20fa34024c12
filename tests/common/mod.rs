#![allow(dead_code)]

use std::io::Cursor;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use cardforge::rendering::text::FontSet;
use cardforge::source::Fetcher;
use cardforge::store::{AssetHandle, AssetStore};
use cardforge::{CardFace, CardKind, Compositor, CompositorConfig, Error, Result};
use image::{ImageFormat, Rgba, RgbaImage};
use url::Url;

/// A small diagonal-gradient PNG, wider than tall so the cover resize crops.
pub fn sample_png() -> Vec<u8> {
    let img = RgbaImage::from_fn(64, 48, |x, y| Rgba([(x * 4) as u8, (y * 5) as u8, 128, 255]));
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, ImageFormat::Png).unwrap();
    out.into_inner()
}

pub fn face(card_type: &str, attack: Option<i64>, defense: Option<i64>) -> CardFace {
    CardFace {
        title: "Flame Lizard".to_string(),
        kind: CardKind::from_parts(card_type, attack, defense),
        cost: 3,
        description: "Breathes fire on anything that moves.".to_string(),
        frame_color: "#aa2222".to_string(),
        creator: Some("Bob".to_string()),
    }
}

/// Fetcher that serves fixed bytes and counts calls.
#[derive(Clone, Default)]
pub struct CountingFetcher {
    pub body: Vec<u8>,
    pub calls: Arc<AtomicUsize>,
}

impl CountingFetcher {
    pub fn serving(body: Vec<u8>) -> Self {
        Self { body, calls: Arc::new(AtomicUsize::new(0)) }
    }

    pub fn count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Fetcher for CountingFetcher {
    async fn fetch(&self, _url: &Url) -> Result<Vec<u8>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.body.clone())
    }
}

/// Store that keeps uploads in memory.
#[derive(Default)]
pub struct MemoryStore {
    pub uploads: Mutex<Vec<(String, Vec<u8>)>>,
}

impl MemoryStore {
    pub fn upload_count(&self) -> usize {
        self.uploads.lock().unwrap().len()
    }

    pub fn last_png(&self) -> Vec<u8> {
        self.uploads.lock().unwrap().last().map(|(_, png)| png.clone()).unwrap()
    }
}

impl AssetStore for MemoryStore {
    async fn upload(&self, png: Vec<u8>, folder: &str) -> Result<AssetHandle> {
        let mut uploads = self.uploads.lock().unwrap();
        uploads.push((folder.to_string(), png));
        let public_id = format!("{}/card-{}", folder, uploads.len());
        Ok(AssetHandle {
            url: format!("memory://{}.png", public_id),
            public_id,
        })
    }

    async fn delete(&self, _public_id: &str) -> Result<bool> {
        Ok(false)
    }

    async fn rename(&self, _public_id: &str, _new_public_id: &str) -> Result<()> {
        Ok(())
    }

    async fn list(&self, _folder: &str, _max_results: usize) -> Result<Vec<AssetHandle>> {
        Ok(Vec::new())
    }
}

/// Store whose uploads always fail.
pub struct RejectingStore;

impl AssetStore for RejectingStore {
    async fn upload(&self, _png: Vec<u8>, _folder: &str) -> Result<AssetHandle> {
        Err(Error::UploadError("quota exceeded".to_string()))
    }

    async fn delete(&self, _public_id: &str) -> Result<bool> {
        Ok(false)
    }

    async fn rename(&self, _public_id: &str, _new_public_id: &str) -> Result<()> {
        Ok(())
    }

    async fn list(&self, _folder: &str, _max_results: usize) -> Result<Vec<AssetHandle>> {
        Ok(Vec::new())
    }
}

/// Compositor with fallback fonts, so output does not depend on the host.
pub fn compositor<S: AssetStore>(config: CompositorConfig, fetcher: CountingFetcher, store: S) -> Compositor<CountingFetcher, S> {
    Compositor::new(config, Arc::new(FontSet::fallback()), fetcher, store)
}
