/// Rasterizer: replays a display list onto a tiny-skia pixmap and encodes PNG.
///
/// Also home of the photo pipeline that runs before painting: decode the
/// source bytes and cover-resize them to the photo box.

use image::imageops::FilterType;
use image::{DynamicImage, RgbaImage};
use tiny_skia::{
    FillRule, IntSize, Mask, Paint, PathBuilder, Pixmap, PixmapPaint, Transform,
};

use super::layout::{Point, Rect, CARD_HEIGHT, CARD_WIDTH};
use super::paint::{Align, DisplayList, PaintCommand, Rgba};
use super::text::FontSet;
use super::RenderedCard;
use crate::{Error, Result};

/// Decode raw bytes of any supported raster format.
pub fn decode(bytes: &[u8]) -> Result<DynamicImage> {
    image::load_from_memory(bytes).map_err(|e| Error::DecodeError(e.to_string()))
}

/// Resize/crop collaborator: produce an image exactly filling a box.
pub trait Resizer: Send + Sync {
    fn cover(&self, image: &DynamicImage, width: u32, height: u32) -> Result<RgbaImage>;
}

/// Scale to cover the box, then crop the overflow evenly from both sides.
#[derive(Debug, Clone, Copy, Default)]
pub struct CoverResize;

impl Resizer for CoverResize {
    fn cover(&self, image: &DynamicImage, width: u32, height: u32) -> Result<RgbaImage> {
        if image.width() == 0 || image.height() == 0 {
            return Err(Error::DecodeError("source image has no pixels".into()));
        }
        Ok(image.resize_to_fill(width, height, FilterType::Lanczos3).to_rgba8())
    }
}

fn premultiply_rgba_in_place(rgba: &mut [u8]) {
    for px in rgba.chunks_exact_mut(4) {
        let a = px[3] as u16;
        for c in &mut px[..3] {
            *c = ((*c as u16 * a + 127) / 255) as u8;
        }
    }
}

fn paint_for(color: Rgba) -> Paint<'static> {
    let mut paint = Paint::default();
    paint.set_color_rgba8(color.r, color.g, color.b, color.a);
    paint.anti_alias = true;
    paint
}

fn polygon(points: &[Point]) -> Option<tiny_skia::Path> {
    let (first, rest) = points.split_first()?;
    let mut pb = PathBuilder::new();
    pb.move_to(first.0, first.1);
    for p in rest {
        pb.line_to(p.0, p.1);
    }
    pb.close();
    pb.finish()
}

fn sk_rect(r: &Rect) -> Option<tiny_skia::Rect> {
    tiny_skia::Rect::from_xywh(r.x, r.y, r.width, r.height)
}

/// The fixed-size card surface.
pub struct Canvas {
    pixmap: Pixmap,
}

impl Canvas {
    pub fn new() -> Result<Self> {
        let pixmap = Pixmap::new(CARD_WIDTH, CARD_HEIGHT)
            .ok_or_else(|| Error::EncodeError("failed to allocate card pixmap".into()))?;
        Ok(Self { pixmap })
    }

    pub fn width(&self) -> u32 {
        self.pixmap.width()
    }

    pub fn height(&self) -> u32 {
        self.pixmap.height()
    }

    /// Straight (non-premultiplied) color of one pixel.
    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgba> {
        let c = self.pixmap.pixel(x, y)?.demultiply();
        Some(Rgba { r: c.red(), g: c.green(), b: c.blue(), a: c.alpha() })
    }

    pub fn replay(&mut self, list: &DisplayList, fonts: &FontSet) -> Result<()> {
        for cmd in list.commands() {
            match cmd {
                PaintCommand::FillPolygon { points, color } => {
                    if let Some(path) = polygon(points) {
                        self.pixmap.fill_path(
                            &path,
                            &paint_for(*color),
                            FillRule::Winding,
                            Transform::identity(),
                            None,
                        );
                    }
                }
                PaintCommand::FillRect { rect, color } => {
                    if let Some(r) = sk_rect(rect) {
                        self.pixmap.fill_rect(r, &paint_for(*color), Transform::identity(), None);
                    }
                }
                PaintCommand::FillCircle { center, radius, color } => {
                    if let Some(path) = PathBuilder::from_circle(center.0, center.1, *radius) {
                        self.pixmap.fill_path(
                            &path,
                            &paint_for(*color),
                            FillRule::Winding,
                            Transform::identity(),
                            None,
                        );
                    }
                }
                PaintCommand::Image { origin, size, image, clip } => {
                    self.draw_image(*origin, *size, image, clip)?;
                }
                PaintCommand::Text { x, baseline, text, weight, size, color, align } => {
                    let face = fonts.face(*weight);
                    let left = match align {
                        Align::Left => *x,
                        Align::Center => *x - face.measure(*size, text) / 2.0,
                    };
                    self.draw_text(face, *size, text, left, *baseline, *color);
                }
            }
        }
        Ok(())
    }

    fn draw_image(
        &mut self,
        origin: Point,
        size: (f32, f32),
        image: &RgbaImage,
        clip: &[Point],
    ) -> Result<()> {
        let (w, h) = image.dimensions();
        let int_size = match IntSize::from_wh(w, h) {
            Some(s) => s,
            None => return Ok(()),
        };
        let mut rgba = image.as_raw().clone();
        premultiply_rgba_in_place(&mut rgba);
        let source = Pixmap::from_vec(rgba, int_size)
            .ok_or_else(|| Error::DecodeError("photo buffer has the wrong size".into()))?;

        let mut mask = Mask::new(self.width(), self.height())
            .ok_or_else(|| Error::EncodeError("failed to allocate clip mask".into()))?;
        if let Some(path) = polygon(clip) {
            mask.fill_path(&path, FillRule::Winding, true, Transform::identity());
        }

        let transform = Transform::from_row(
            size.0 / w as f32,
            0.0,
            0.0,
            size.1 / h as f32,
            origin.0,
            origin.1,
        );
        let paint = PixmapPaint {
            quality: tiny_skia::FilterQuality::Bilinear,
            ..PixmapPaint::default()
        };
        self.pixmap
            .draw_pixmap(0, 0, source.as_ref(), &paint, transform, Some(&mask));
        Ok(())
    }

    fn draw_text(
        &mut self,
        face: &super::text::Face,
        size: f32,
        text: &str,
        left: f32,
        baseline: f32,
        color: Rgba,
    ) {
        let paint = PixmapPaint::default();
        for (pen, glyph) in face.glyphs(size, text) {
            let Some(glyph_size) = IntSize::from_wh(glyph.width as u32, glyph.height as u32) else {
                continue;
            };
            let mut data = Vec::with_capacity(glyph.coverage.len() * 4);
            for coverage in &glyph.coverage {
                let a = (*coverage as u16 * color.a as u16 + 127) / 255;
                let premul = |c: u8| ((c as u16 * a + 127) / 255) as u8;
                data.extend([premul(color.r), premul(color.g), premul(color.b), a as u8]);
            }
            let Some(bitmap) = Pixmap::from_vec(data, glyph_size) else {
                continue;
            };
            let x = (left + pen).round() as i32 + glyph.left;
            let y = baseline.round() as i32 + glyph.top;
            self.pixmap
                .draw_pixmap(x, y, bitmap.as_ref(), &paint, Transform::identity(), None);
        }
    }

    pub fn encode_png(&self) -> Result<RenderedCard> {
        let png_data = self
            .pixmap
            .encode_png()
            .map_err(|e| Error::EncodeError(e.to_string()))?;
        Ok(RenderedCard {
            width: self.width(),
            height: self.height(),
            png_data,
        })
    }
}

/// Replay `list` onto a fresh card canvas.
pub fn rasterize(list: &DisplayList, fonts: &FontSet) -> Result<Canvas> {
    let mut canvas = Canvas::new()?;
    canvas.replay(list, fonts)?;
    Ok(canvas)
}
