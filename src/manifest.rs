//! Bulk card rendering from a JSON manifest.
//!
//! A manifest is a JSON array of card rows, each naming its photo:
//!
//! ```json
//! [{ "image": "art/lizard.jpg", "title": "Flame Lizard", "type": "Creature",
//!    "cost": 3, "attack": 4, "defense": 5, "description": "...",
//!    "frameColor": "#aa2222", "creator": "Bob" }]
//! ```
//!
//! Rows are validated as a whole before anything is rendered, so a bad row
//! never leaves half a batch uploaded. That includes local photos: a row
//! naming a file that does not exist rejects the sheet in [`Manifest::requests`].

use std::path::{Path, PathBuf};

use futures::stream::{self, StreamExt};
use serde::Deserialize;

use crate::card::{CardFace, CardFields, CardRequest};
use crate::compositor::Compositor;
use crate::source::{Fetcher, ImageSource};
use crate::store::{AssetHandle, AssetStore};
use crate::{Error, Result};

pub const MAX_ROWS: usize = 500;
pub const MAX_FIELD_LENGTH: usize = 500;
pub const MAX_IMAGE_NAME_LENGTH: usize = 100;

#[derive(Debug, Clone, Deserialize)]
pub struct ManifestRow {
    /// Path relative to the manifest, absolute path, or HTTP(S) URL.
    pub image: String,
    #[serde(flatten)]
    pub card: CardFields,
}

#[derive(Debug, Clone)]
pub struct Manifest {
    pub rows: Vec<ManifestRow>,
    base_dir: PathBuf,
}

impl Manifest {
    pub fn from_json(text: &str, base_dir: impl Into<PathBuf>) -> Result<Self> {
        let rows: Vec<ManifestRow> = serde_json::from_str(text)
            .map_err(|e| Error::InvalidCard(format!("malformed manifest: {}", e)))?;
        if rows.len() > MAX_ROWS {
            return Err(Error::InvalidCard(format!(
                "too many rows (max {}, found {})",
                MAX_ROWS,
                rows.len()
            )));
        }
        for (idx, row) in rows.iter().enumerate() {
            validate_row(idx + 1, row)?;
        }
        Ok(Self { rows, base_dir: base_dir.into() })
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| Error::InvalidCard(format!("cannot read {}: {}", path.display(), e)))?;
        let base = path.parent().map(Path::to_path_buf).unwrap_or_default();
        Self::from_json(&text, base)
    }

    /// One render request per row. Manifest images are never temporary.
    ///
    /// Fails with `InvalidCard` if any local image is missing, before any
    /// request is handed out.
    pub fn requests(&self) -> Result<Vec<CardRequest>> {
        self.rows
            .iter()
            .enumerate()
            .map(|(idx, row)| {
                let source = match ImageSource::parse(&row.image, false)? {
                    ImageSource::Local { path, .. } => {
                        let path = if path.is_relative() { self.base_dir.join(path) } else { path };
                        if !path.is_file() {
                            return Err(Error::InvalidCard(format!(
                                "row {}: image not found: {}",
                                idx + 1,
                                path.display()
                            )));
                        }
                        ImageSource::Local { path, temporary: false }
                    }
                    other => other,
                };
                Ok(CardRequest {
                    source,
                    face: CardFace::from(row.card.clone()),
                })
            })
            .collect()
    }
}

fn check_len(row: usize, field: &str, value: &str, max: usize) -> Result<()> {
    if value.chars().count() > max {
        return Err(Error::InvalidCard(format!(
            "row {}: {} is too long (max {} characters)",
            row, field, max
        )));
    }
    Ok(())
}

fn check_range(row: usize, field: &str, value: i64, min: i64, max: i64) -> Result<()> {
    if value < min || value > max {
        return Err(Error::InvalidCard(format!(
            "row {}: {} must be between {} and {}",
            row, field, min, max
        )));
    }
    Ok(())
}

/// Row rules of the card model: bounded text, cost 0-10, and for creatures
/// attack 0-10 plus defense 1-10, both required.
pub fn validate_row(row: usize, r: &ManifestRow) -> Result<()> {
    check_len(row, "image", &r.image, MAX_IMAGE_NAME_LENGTH)?;
    check_len(row, "title", &r.card.title, MAX_FIELD_LENGTH)?;
    check_len(row, "type", &r.card.card_type, MAX_FIELD_LENGTH)?;
    check_len(row, "description", &r.card.description, MAX_FIELD_LENGTH)?;
    check_len(row, "frameColor", &r.card.frame_color, MAX_FIELD_LENGTH)?;
    if let Some(creator) = &r.card.creator {
        check_len(row, "creator", creator, MAX_FIELD_LENGTH)?;
    }
    if r.image.trim().is_empty() {
        return Err(Error::InvalidCard(format!("row {}: image is required", row)));
    }
    check_range(row, "cost", r.card.cost, 0, 10)?;

    if r.card.card_type == "Creature" {
        match (r.card.attack, r.card.defense) {
            (Some(attack), Some(defense)) => {
                check_range(row, "attack", attack, 0, 10)?;
                check_range(row, "defense", defense, 1, 10)?;
            }
            _ => {
                return Err(Error::InvalidCard(format!(
                    "row {}: creatures need both attack and defense",
                    row
                )))
            }
        }
    }
    Ok(())
}

/// Render every request with at most `concurrency` renders in flight.
/// Results keep the order of `requests`.
pub async fn render_all<F, S>(
    compositor: &Compositor<F, S>,
    requests: Vec<CardRequest>,
    concurrency: usize,
) -> Vec<Result<AssetHandle>>
where
    F: Fetcher,
    S: AssetStore,
{
    stream::iter(requests)
        .map(|req| compositor.render_card(req))
        .buffered(concurrency.max(1))
        .collect()
        .await
}
