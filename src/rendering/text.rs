//! Font registration, text measurement and glyph rasterization.
//!
//! Fonts are registered once, explicitly, and the resulting `FontSet` is
//! handed to the compositor. Each weight is looked up in the configured
//! directories, then among the system's sans-serif faces. A weight found in
//! neither is reported in the `FontRegistration` instead of failing: it is
//! substituted by another registered weight, or served by the DejaVu faces
//! bundled with the crate, so registered text is always drawn.

use std::fmt;
use std::path::{Path, PathBuf};

use font_kit::family_name::FamilyName;
use font_kit::handle::Handle;
use font_kit::properties::{Properties, Weight as SystemWeight};
use font_kit::source::SystemSource;
use fontdue::{Font, FontSettings};
use log::{debug, warn};
use serde::Deserialize;

/// Advance used by fallback metrics, as a fraction of the font size.
const FALLBACK_ADVANCE: f32 = 0.55;

const BUNDLED_REGULAR: &[u8] = include_bytes!("../../fonts/DejaVuSans.ttf");
const BUNDLED_BOLD: &[u8] = include_bytes!("../../fonts/DejaVuSans-Bold.ttf");

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Weight {
    Regular,
    SemiBold,
    Bold,
    Heavy,
}

impl Weight {
    pub const ALL: [Weight; 4] = [Weight::Regular, Weight::SemiBold, Weight::Bold, Weight::Heavy];

    /// CSS numeric weight.
    fn css_weight(self) -> f32 {
        match self {
            Weight::Regular => 400.0,
            Weight::SemiBold => 600.0,
            Weight::Bold => 700.0,
            Weight::Heavy => 900.0,
        }
    }

    /// Weights tried, in order, when this one is missing.
    fn substitutes(self) -> &'static [Weight] {
        match self {
            Weight::Regular => &[Weight::SemiBold, Weight::Bold, Weight::Heavy],
            Weight::SemiBold => &[Weight::Bold, Weight::Regular, Weight::Heavy],
            Weight::Bold => &[Weight::Heavy, Weight::SemiBold, Weight::Regular],
            Weight::Heavy => &[Weight::Bold, Weight::SemiBold, Weight::Regular],
        }
    }
}

impl fmt::Display for Weight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Weight::Regular => "regular",
            Weight::SemiBold => "semi-bold",
            Weight::Bold => "bold",
            Weight::Heavy => "heavy",
        };
        f.write_str(name)
    }
}

/// Where to look for the card fonts.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FontConfig {
    /// Directories searched in order; the first hit wins.
    pub search_dirs: Vec<PathBuf>,
    pub regular: String,
    pub semi_bold: String,
    pub bold: String,
    pub heavy: String,
    /// Ask the system for a sans-serif face when a file is not found.
    pub system_fonts: bool,
}

impl Default for FontConfig {
    fn default() -> Self {
        Self {
            search_dirs: vec![
                PathBuf::from("fonts"),
                PathBuf::from("/usr/share/fonts/truetype/dejavu"),
                PathBuf::from("/usr/share/fonts/dejavu"),
                PathBuf::from("/usr/share/fonts/TTF"),
            ],
            regular: "DejaVuSans.ttf".to_string(),
            semi_bold: "DejaVuSansCondensed-Bold.ttf".to_string(),
            bold: "DejaVuSans-Bold.ttf".to_string(),
            heavy: "DejaVuSans-Bold.ttf".to_string(),
            system_fonts: true,
        }
    }
}

impl FontConfig {
    fn file_for(&self, weight: Weight) -> &str {
        match weight {
            Weight::Regular => &self.regular,
            Weight::SemiBold => &self.semi_bold,
            Weight::Bold => &self.bold,
            Weight::Heavy => &self.heavy,
        }
    }

    fn locate(&self, file: &str) -> Option<PathBuf> {
        let direct = Path::new(file);
        if direct.is_absolute() {
            return direct.is_file().then(|| direct.to_path_buf());
        }
        self.search_dirs
            .iter()
            .map(|dir| dir.join(file))
            .find(|p| p.is_file())
    }
}

/// Outcome of registering one weight.
#[derive(Debug, Clone, PartialEq)]
pub enum FontStatus {
    Registered(PathBuf),
    /// Found by system font discovery; carries the face's full name.
    System(String),
    Substituted(Weight),
    /// No usable file and no registered substitute: the bundled face is used.
    Bundled,
    Missing,
}

/// A loaded face, or metrics-only fallback that draws nothing.
pub enum Face {
    Loaded(Box<Font>),
    Fallback,
}

impl fmt::Debug for Face {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Face::Loaded(font) => write!(f, "Face::Loaded({:?})", font.name()),
            Face::Fallback => f.write_str("Face::Fallback"),
        }
    }
}

/// Coverage bitmap of one glyph positioned relative to the pen.
pub struct GlyphBitmap {
    /// Offset of the bitmap's left edge from the pen position.
    pub left: i32,
    /// Offset of the bitmap's top edge from the baseline (negative is up).
    pub top: i32,
    pub width: usize,
    pub height: usize,
    pub coverage: Vec<u8>,
}

impl Face {
    /// The DejaVu face compiled into the crate for `weight`.
    pub fn bundled(weight: Weight) -> Face {
        let bytes = match weight {
            Weight::Regular => BUNDLED_REGULAR,
            _ => BUNDLED_BOLD,
        };
        match Font::from_bytes(bytes, FontSettings::default()) {
            Ok(font) => Face::Loaded(Box::new(font)),
            Err(e) => {
                warn!("bundled {} font is unusable: {}", weight, e);
                Face::Fallback
            }
        }
    }

    pub fn measure(&self, size: f32, text: &str) -> f32 {
        match self {
            Face::Loaded(font) => {
                let mut width = 0.0;
                let mut prev: Option<char> = None;
                for ch in text.chars() {
                    if let Some(p) = prev {
                        width += font.horizontal_kern(p, ch, size).unwrap_or(0.0);
                    }
                    width += font.metrics(ch, size).advance_width;
                    prev = Some(ch);
                }
                width
            }
            Face::Fallback => text.chars().count() as f32 * size * FALLBACK_ADVANCE,
        }
    }

    /// Distance from the baseline to the top (positive) and bottom (negative)
    /// of the em box.
    pub fn vertical_metrics(&self, size: f32) -> (f32, f32) {
        match self {
            Face::Loaded(font) => font
                .horizontal_line_metrics(size)
                .map(|m| (m.ascent, m.descent))
                .unwrap_or((size * 0.8, -size * 0.2)),
            Face::Fallback => (size * 0.8, -size * 0.2),
        }
    }

    /// Lay out `text` starting at pen x = 0 and return the glyph bitmaps with
    /// their pen offsets. Fallback faces produce nothing.
    pub fn glyphs(&self, size: f32, text: &str) -> Vec<(f32, GlyphBitmap)> {
        let font = match self {
            Face::Loaded(font) => font,
            Face::Fallback => return Vec::new(),
        };
        let mut out = Vec::new();
        let mut pen = 0.0;
        let mut prev: Option<char> = None;
        for ch in text.chars() {
            if let Some(p) = prev {
                pen += font.horizontal_kern(p, ch, size).unwrap_or(0.0);
            }
            let (metrics, coverage) = font.rasterize(ch, size);
            if metrics.width > 0 && metrics.height > 0 {
                out.push((
                    pen,
                    GlyphBitmap {
                        left: metrics.xmin,
                        top: -(metrics.height as i32 + metrics.ymin),
                        width: metrics.width,
                        height: metrics.height,
                        coverage,
                    },
                ));
            }
            pen += metrics.advance_width;
            prev = Some(ch);
        }
        out
    }
}

/// The four faces used on a card.
#[derive(Debug)]
pub struct FontSet {
    faces: [Face; 4],
    /// For each weight, the index of the face that serves it.
    slots: [usize; 4],
}

fn slot(weight: Weight) -> usize {
    match weight {
        Weight::Regular => 0,
        Weight::SemiBold => 1,
        Weight::Bold => 2,
        Weight::Heavy => 3,
    }
}

impl FontSet {
    /// The bundled faces for every weight.
    pub fn bundled() -> Self {
        Self {
            faces: Weight::ALL.map(Face::bundled),
            slots: [0, 1, 2, 3],
        }
    }

    /// A set that measures with fallback metrics and draws no glyphs, for
    /// layout checks that must not depend on glyph shapes.
    pub fn fallback() -> Self {
        Self {
            faces: [Face::Fallback, Face::Fallback, Face::Fallback, Face::Fallback],
            slots: [0, 1, 2, 3],
        }
    }

    pub fn face(&self, weight: Weight) -> &Face {
        &self.faces[self.slots[slot(weight)]]
    }

    pub fn measure(&self, weight: Weight, size: f32, text: &str) -> f32 {
        self.face(weight).measure(size, text)
    }
}

/// Result of the explicit font registration step.
#[derive(Debug)]
pub struct FontRegistration {
    pub fonts: FontSet,
    pub report: Vec<(Weight, FontStatus)>,
}

impl FontRegistration {
    /// True when every weight was loaded from its own file or system face.
    pub fn is_complete(&self) -> bool {
        self.report
            .iter()
            .all(|(_, status)| matches!(status, FontStatus::Registered(_) | FontStatus::System(_)))
    }

    pub fn status(&self, weight: Weight) -> Option<&FontStatus> {
        self.report.iter().find(|(w, _)| *w == weight).map(|(_, s)| s)
    }
}

pub struct FontRegistry;

impl FontRegistry {
    /// Load every configured weight, falling back to system discovery, then
    /// to another registered weight, then to the bundled face. Never fails;
    /// inspect the report.
    pub fn register(config: &FontConfig) -> FontRegistration {
        let mut loaded: [Option<Face>; 4] = [None, None, None, None];
        let mut report = Vec::with_capacity(4);
        let system = config.system_fonts.then(SystemSource::new);

        for weight in Weight::ALL {
            let file = config.file_for(weight);
            match config.locate(file).map(|p| load_face(&p).map(|f| (p, f))) {
                Some(Ok((path, face))) => {
                    debug!("registered {} font {}", weight, path.display());
                    loaded[slot(weight)] = Some(face);
                    report.push((weight, FontStatus::Registered(path)));
                }
                Some(Err(reason)) => {
                    warn!("font {} for {} weight is unusable: {}", file, weight, reason);
                    report.push((weight, FontStatus::Missing));
                }
                None => {
                    warn!("font {} for {} weight not found", file, weight);
                    report.push((weight, FontStatus::Missing));
                }
            }
        }

        let mut registered = [0, 1, 2, 3].map(|i| loaded[i].is_some());
        let mut slots = [0, 1, 2, 3];
        for (weight, status) in report.iter_mut() {
            if *status != FontStatus::Missing {
                continue;
            }
            let idx = slot(*weight);
            if let Some((name, face)) = system.as_ref().and_then(|source| system_face(source, *weight)) {
                debug!("registered {} font {} from the system", weight, name);
                loaded[idx] = Some(face);
                registered[idx] = true;
                *status = FontStatus::System(name);
                continue;
            }
            if let Some(sub) = weight.substitutes().iter().find(|s| registered[slot(**s)]) {
                warn!("using {} face in place of {}", sub, weight);
                slots[idx] = slot(*sub);
                *status = FontStatus::Substituted(*sub);
            } else {
                warn!("no {} font found, using the bundled face", weight);
                loaded[idx] = Some(Face::bundled(*weight));
                *status = FontStatus::Bundled;
            }
        }

        let faces = loaded.map(|face| face.unwrap_or(Face::Fallback));

        FontRegistration {
            fonts: FontSet { faces, slots },
            report,
        }
    }
}

/// Best system sans-serif match for `weight`, loaded into fontdue.
fn system_face(source: &SystemSource, weight: Weight) -> Option<(String, Face)> {
    let mut properties = Properties::new();
    properties.weight = SystemWeight(weight.css_weight());
    let handle = source.select_best_match(&[FamilyName::SansSerif], &properties).ok()?;
    let index = match &handle {
        Handle::Path { font_index, .. } | Handle::Memory { font_index, .. } => *font_index,
    };
    let font = handle.load().ok()?;
    let data = font.copy_font_data()?;
    let settings = FontSettings { collection_index: index, ..FontSettings::default() };
    match Font::from_bytes(data.as_slice(), settings) {
        Ok(face) => Some((font.full_name(), Face::Loaded(Box::new(face)))),
        Err(e) => {
            warn!("system font {} is unusable: {}", font.full_name(), e);
            None
        }
    }
}

fn load_face(path: &Path) -> std::result::Result<Face, String> {
    let bytes = std::fs::read(path).map_err(|e| e.to_string())?;
    let font = Font::from_bytes(bytes, FontSettings::default()).map_err(|e| e.to_string())?;
    Ok(Face::Loaded(Box::new(font)))
}
