//! cardforge
//!
//! A trading-card compositor: it takes a photo and the card's metadata, lays
//! out a fixed 400×600 card around them, encodes it as PNG and uploads the
//! result to an asset store.
//!
//! # Features
//!
//! - **Deterministic layout**: every region of the card is a function of the
//!   card size, see [`rendering::layout`]
//! - **Swappable seams**: image fetch ([`source::Fetcher`]), cover resize
//!   ([`rendering::raster::Resizer`]) and upload ([`store::AssetStore`])
//! - **Cloudinary** (default feature) or a plain directory as the asset store
//!
//! # Example
//!
//! ```no_run
//! use cardforge::{CardFace, CardKind, CardRequest, Compositor, CompositorConfig, ImageSource};
//! use cardforge::store::DirectoryStore;
//!
//! # async fn run() -> cardforge::Result<()> {
//! let store = DirectoryStore::new("out")?;
//! let compositor = Compositor::from_config(CompositorConfig::default(), store)?;
//! let handle = compositor
//!     .render_card(CardRequest {
//!         source: ImageSource::parse("https://example.com/lizard.jpg", false)?,
//!         face: CardFace {
//!             title: "Flame Lizard".to_string(),
//!             kind: CardKind::from_parts("Creature", Some(4), Some(5)),
//!             cost: 3,
//!             description: "Breathes fire.".to_string(),
//!             frame_color: "#aa2222".to_string(),
//!             creator: Some("Bob".to_string()),
//!         },
//!     })
//!     .await?;
//! println!("{}", handle.url);
//! # Ok(())
//! # }
//! ```

use std::path::{Path, PathBuf};

use serde::Deserialize;

pub mod card;
pub mod compositor;
pub mod error;
pub mod manifest;
pub mod rendering;
pub mod source;
pub mod store;

pub use card::{CardFace, CardFields, CardKind, CardRequest, Stats};
pub use compositor::{compose, Compositor};
pub use error::{CleanupWarning, Error, Result};
pub use rendering::layout::CornerStyle;
pub use rendering::text::FontConfig;
pub use rendering::RenderedCard;
pub use source::ImageSource;
pub use store::{AssetHandle, AssetStore};

pub const DEFAULT_ASSET_FOLDER: &str = "Cards";

/// Configuration for the compositor
///
/// Every field has a default, so a config file only needs the keys it
/// changes:
///
/// ```
/// let cfg: cardforge::CompositorConfig =
///     serde_json::from_str(r#"{ "asset_folder": "Proofs" }"#).unwrap();
/// assert_eq!(cfg.asset_folder, "Proofs");
/// assert_eq!(cfg.fetch_timeout_ms, None);
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CompositorConfig {
    /// Store folder finished cards are uploaded into
    pub asset_folder: String,
    /// Which frame corners are cut
    pub corner_style: CornerStyle,
    /// Font files and where to find them
    pub fonts: FontConfig,
    /// When set, each encoded card is written here before upload and removed
    /// afterwards
    pub spool_dir: Option<PathBuf>,
    /// Timeout for fetching remote photos. `None` waits indefinitely.
    pub fetch_timeout_ms: Option<u64>,
    /// User agent sent when fetching remote photos
    pub user_agent: String,
}

impl Default for CompositorConfig {
    fn default() -> Self {
        Self {
            asset_folder: DEFAULT_ASSET_FOLDER.to_string(),
            corner_style: CornerStyle::default(),
            fonts: FontConfig::default(),
            spool_dir: None,
            fetch_timeout_ms: None,
            user_agent: format!("cardforge/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl CompositorConfig {
    /// Read a JSON config file. Missing keys keep their defaults.
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| Error::ConfigError(format!("cannot read {}: {}", path.display(), e)))?;
        serde_json::from_str(&text)
            .map_err(|e| Error::ConfigError(format!("invalid config {}: {}", path.display(), e)))
    }

    /// Apply `CARDFORGE_*` environment overrides.
    pub fn apply_env(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Overrides read through `lookup`:
    ///
    /// - `CARDFORGE_FONT_DIR` is searched before the configured font dirs
    /// - `CARDFORGE_ASSET_FOLDER` replaces the upload folder
    /// - `CARDFORGE_SPOOL_DIR` sets the spool directory
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let set = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(dir) = set("CARDFORGE_FONT_DIR") {
            self.fonts.search_dirs.insert(0, PathBuf::from(dir));
        }
        if let Some(folder) = set("CARDFORGE_ASSET_FOLDER") {
            self.asset_folder = folder;
        }
        if let Some(dir) = set("CARDFORGE_SPOOL_DIR") {
            self.spool_dir = Some(PathBuf::from(dir));
        }
    }
}
