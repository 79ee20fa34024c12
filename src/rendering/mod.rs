//! Card rendering: layout, paint stages, text and rasterization

pub mod layout;
pub mod paint;
pub mod raster;
pub mod stages;
pub mod text;
pub mod wrap;

use std::sync::Arc;

use image::RgbaImage;

use crate::card::{sanitize_creator, CardFace, CardKind};
use paint::{frame_fill, Rgba};

/// Per-invocation working value: sanitized card text plus the decoded,
/// cover-resized photo. Built fresh for every render and dropped after it.
#[derive(Debug, Clone)]
pub struct RenderJob {
    pub title: String,
    pub kind: CardKind,
    pub cost: i64,
    pub description: String,
    pub frame: Rgba,
    pub creator: String,
    pub photo: Arc<RgbaImage>,
}

impl RenderJob {
    pub fn new(face: &CardFace, photo: Arc<RgbaImage>) -> Self {
        Self {
            title: face.title.clone(),
            kind: face.kind.clone(),
            cost: face.cost,
            description: face.description.clone(),
            frame: frame_fill(&face.frame_color),
            creator: sanitize_creator(face.creator.as_deref()),
            photo,
        }
    }
}

/// A finished card encoded as PNG.
#[derive(Debug, Clone)]
pub struct RenderedCard {
    pub width: u32,
    pub height: u32,
    pub png_data: Vec<u8>,
}
