//! The ordered paint stages of a card.
//!
//! Each stage reads the job and appends to the surface; none of them look at
//! what earlier stages drew. Order matters: later stages layer over earlier
//! ones (the cost badge over the photo, the stat badge over the background).

use log::debug;

use super::layout::{
    outline, photo_clip, CardLayout, CornerStyle, BORDER, DESCRIPTION_PADDING,
    DESCRIPTION_SIDE_PADDING, FOOTER_BOTTOM_PADDING, LINE_HEIGHT,
};
use super::paint::{Align, DisplayList, PaintCommand, Rgba};
use super::text::{FontSet, Weight};
use super::wrap::wrap;
use super::RenderJob;

pub const BACKGROUND: Rgba = Rgba::rgb(0xf0, 0xf0, 0xf0);
pub const TITLE_BAND: Rgba = Rgba::rgb(0xe0, 0xe0, 0xe0);
pub const TYPE_BAND: Rgba = Rgba::rgb(0xd4, 0xd4, 0xd4);
pub const BADGE: Rgba = Rgba::rgb(0x22, 0x22, 0x22);
pub const BADGE_OPACITY: f32 = 0.85;
const INK: Rgba = Rgba::rgb(0x22, 0x22, 0x22);
const BODY_INK: Rgba = Rgba::rgb(0x33, 0x33, 0x33);
const LABEL_INK: Rgba = Rgba::rgb(0x55, 0x55, 0x55);

pub const COST_FONT: f32 = 28.0;
pub const TITLE_FONT: f32 = 24.0;
pub const TYPE_FONT: f32 = 18.0;
pub const DESCRIPTION_FONT: f32 = 18.0;
pub const FOOTER_FONT: f32 = 14.0;
pub const STAT_FONT: f32 = 20.0;

pub const FOOTER_LABEL: &str = "Created by:";
const FOOTER_GAP: f32 = 6.0;
/// Clearance between the footer caption and the stat badge.
const FOOTER_BADGE_CLEARANCE: f32 = 8.0;

/// Shared, read-only inputs of every stage.
pub struct Painter<'a> {
    pub layout: CardLayout,
    pub fonts: &'a FontSet,
    pub corners: CornerStyle,
}

pub type Stage = fn(&mut DisplayList, &RenderJob, &Painter<'_>);

/// Stages in paint order.
pub const STAGES: [(&str, Stage); 9] = [
    ("frame", frame),
    ("background", background),
    ("photo", photo),
    ("cost", cost_badge),
    ("title", title_band),
    ("type", type_band),
    ("description", description),
    ("footer", footer),
    ("stats", stat_badge),
];

/// Run every stage in order and return the finished display list.
pub fn paint_card(job: &RenderJob, painter: &Painter<'_>) -> DisplayList {
    let mut surface = DisplayList::new();
    for (name, stage) in STAGES.iter() {
        let before = surface.len();
        stage(&mut surface, job, painter);
        debug!("stage {}: {} commands", name, surface.len() - before);
    }
    surface
}

/// Baseline that vertically centers text of `weight`/`size` on `center_y`.
fn middle_baseline(fonts: &FontSet, weight: Weight, size: f32, center_y: f32) -> f32 {
    let (ascent, descent) = fonts.face(weight).vertical_metrics(size);
    center_y + (ascent + descent) / 2.0
}

fn centered_text(
    surface: &mut DisplayList,
    painter: &Painter<'_>,
    text: String,
    center: (f32, f32),
    weight: Weight,
    size: f32,
    color: Rgba,
) {
    surface.push(PaintCommand::Text {
        x: center.0,
        baseline: middle_baseline(painter.fonts, weight, size, center.1),
        text,
        weight,
        size,
        color,
        align: Align::Center,
    });
}

pub fn frame(surface: &mut DisplayList, job: &RenderJob, painter: &Painter<'_>) {
    surface.push(PaintCommand::FillPolygon {
        points: outline(0.0, painter.corners.frame_corners()),
        color: job.frame,
    });
}

pub fn background(surface: &mut DisplayList, _job: &RenderJob, painter: &Painter<'_>) {
    surface.push(PaintCommand::FillPolygon {
        points: outline(BORDER, painter.corners.frame_corners()),
        color: BACKGROUND,
    });
}

/// Vertical offset that centers an image of `src_w`x`src_h`, scaled to
/// `box_w` wide, inside a box `box_h` tall. Zero when the aspects match.
pub fn cover_offset(src_w: u32, src_h: u32, box_w: f32, box_h: f32) -> f32 {
    if src_w == 0 {
        return 0.0;
    }
    ((box_h - box_w * (src_h as f32 / src_w as f32)) / 2.0).floor()
}

pub fn photo(surface: &mut DisplayList, job: &RenderJob, painter: &Painter<'_>) {
    let region = painter.layout.photo;
    let (w, h) = job.photo.dimensions();
    if w == 0 || h == 0 {
        return;
    }
    let offset = cover_offset(w, h, region.width, region.height);
    let draw_height = region.width * h as f32 / w as f32;
    surface.push(PaintCommand::Image {
        origin: (region.x, region.y + offset),
        size: (region.width, draw_height),
        image: job.photo.clone(),
        clip: photo_clip(&region, painter.corners.frame_corners()),
    });
}

pub fn cost_badge(surface: &mut DisplayList, job: &RenderJob, painter: &Painter<'_>) {
    let center = painter.layout.cost_center;
    surface.push(PaintCommand::FillCircle {
        center,
        radius: painter.layout.cost_radius,
        color: BADGE.with_opacity(BADGE_OPACITY),
    });
    centered_text(surface, painter, job.cost.to_string(), center, Weight::Bold, COST_FONT, Rgba::WHITE);
}

pub fn title_band(surface: &mut DisplayList, job: &RenderJob, painter: &Painter<'_>) {
    let band = painter.layout.title_band;
    surface.push(PaintCommand::FillRect { rect: band, color: TITLE_BAND });
    centered_text(surface, painter, job.title.clone(), band.center(), Weight::Bold, TITLE_FONT, INK);
}

pub fn type_band(surface: &mut DisplayList, job: &RenderJob, painter: &Painter<'_>) {
    let band = painter.layout.type_band;
    surface.push(PaintCommand::FillRect { rect: band, color: TYPE_BAND });
    let label = job.kind.label().to_string();
    centered_text(surface, painter, label, band.center(), Weight::SemiBold, TYPE_FONT, BODY_INK);
}

/// Top of the first description line inside a region `region_height` tall
/// holding `line_count` lines.
///
/// The block is centered in the interior left by the top and bottom padding;
/// a block taller than that interior is pulled up so it still ends inside the
/// region.
pub fn description_block_offset(region_height: f32, line_count: usize) -> f32 {
    let block = line_count as f32 * LINE_HEIGHT;
    let interior = region_height - 2.0 * DESCRIPTION_PADDING;
    let centered = DESCRIPTION_PADDING + ((interior - block) / 2.0).max(0.0);
    centered.min((region_height - block).max(0.0))
}

pub fn description(surface: &mut DisplayList, job: &RenderJob, painter: &Painter<'_>) {
    let Some(region) = painter.layout.description else {
        return;
    };
    surface.push(PaintCommand::FillRect { rect: region, color: BACKGROUND });

    let fonts = painter.fonts;
    let lines = wrap(
        &job.description,
        |s| fonts.measure(Weight::Regular, DESCRIPTION_FONT, s),
        painter.layout.description_text_width(),
        painter.layout.description_max_lines(),
    );

    let top = region.y + description_block_offset(region.height, lines.len());
    let center_x = region.center().0;
    for (i, line) in lines.into_iter().enumerate() {
        let line_center = top + i as f32 * LINE_HEIGHT + LINE_HEIGHT / 2.0;
        centered_text(
            surface,
            painter,
            line,
            (center_x, line_center),
            Weight::Regular,
            DESCRIPTION_FONT,
            BODY_INK,
        );
    }
}

/// Widest the footer caption may get: clear of the stat badge on both sides
/// when the badge is drawn, otherwise the padded inner width.
fn footer_max_width(painter: &Painter<'_>, badge: bool) -> f32 {
    let inner = painter.layout.footer.width;
    if badge {
        inner - 2.0 * (painter.layout.stat_badge.width + FOOTER_BADGE_CLEARANCE)
    } else {
        inner - DESCRIPTION_SIDE_PADDING
    }
}

pub fn footer(surface: &mut DisplayList, job: &RenderJob, painter: &Painter<'_>) {
    let fonts = painter.fonts;
    let band = painter.layout.footer;
    let max_width = footer_max_width(painter, job.kind.stats().is_some());

    let label_width = fonts.measure(Weight::Regular, FOOTER_FONT, FOOTER_LABEL);
    let mut name = job.creator.clone();
    let unit_width = |name: &str| label_width + FOOTER_GAP + fonts.measure(Weight::Heavy, FOOTER_FONT, name);
    while unit_width(&name) > max_width && name.chars().count() > 1 {
        name.pop();
    }

    let width = unit_width(&name);
    let left = band.center().0 - width / 2.0;
    let (_, descent) = fonts.face(Weight::Heavy).vertical_metrics(FOOTER_FONT);
    let baseline = band.bottom() - FOOTER_BOTTOM_PADDING + descent;

    surface.push(PaintCommand::Text {
        x: left,
        baseline,
        text: FOOTER_LABEL.to_string(),
        weight: Weight::Regular,
        size: FOOTER_FONT,
        color: LABEL_INK,
        align: Align::Left,
    });
    surface.push(PaintCommand::Text {
        x: left + label_width + FOOTER_GAP,
        baseline,
        text: name,
        weight: Weight::Heavy,
        size: FOOTER_FONT,
        color: INK,
        align: Align::Left,
    });
}

pub fn stat_badge(surface: &mut DisplayList, job: &RenderJob, painter: &Painter<'_>) {
    let Some(stats) = job.kind.stats() else {
        return;
    };
    let rect = painter.layout.stat_badge;
    surface.push(PaintCommand::FillRect {
        rect,
        color: BADGE.with_opacity(BADGE_OPACITY),
    });
    centered_text(surface, painter, stats.to_string(), rect.center(), Weight::Bold, STAT_FONT, Rgba::WHITE);
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use image::RgbaImage;

    use super::*;
    use crate::card::{CardFace, CardKind};

    fn job(kind: CardKind, description: &str, creator: Option<&str>) -> RenderJob {
        let face = CardFace {
            title: "Flame Lizard".into(),
            kind,
            cost: 3,
            description: description.into(),
            frame_color: "#aa2222".into(),
            creator: creator.map(String::from),
        };
        RenderJob::new(&face, Arc::new(RgbaImage::new(376, 300)))
    }

    fn painter(fonts: &FontSet) -> Painter<'_> {
        Painter {
            layout: CardLayout::compute(),
            fonts,
            corners: CornerStyle::Diagonal,
        }
    }

    #[test]
    fn stat_badge_only_for_creatures_with_stats() {
        let fonts = FontSet::fallback();
        let p = painter(&fonts);
        let with = paint_card(&job(CardKind::from_parts("Creature", Some(4), Some(5)), "", None), &p);
        assert!(with.texts().contains(&"4 / 5"));

        for kind in [
            CardKind::from_parts("Creature", Some(4), None),
            CardKind::from_parts("Spell", Some(4), Some(5)),
            CardKind::Artifact,
        ] {
            let list = paint_card(&job(kind, "", None), &p);
            assert!(!list.texts().iter().any(|t| t.contains(" / ")));
            let badge = p.layout.stat_badge;
            assert!(!list.commands().iter().any(|c| matches!(c, PaintCommand::FillRect { rect, .. } if *rect == badge)));
        }
    }

    #[test]
    fn frame_is_painted_first_with_the_frame_color() {
        let fonts = FontSet::fallback();
        let list = paint_card(&job(CardKind::Spell, "x", None), &painter(&fonts));
        match &list.commands()[0] {
            PaintCommand::FillPolygon { color, .. } => assert_eq!(*color, Rgba::rgb(0xaa, 0x22, 0x22)),
            other => panic!("unexpected first command {:?}", other),
        }
    }

    #[test]
    fn description_lines_respect_budget() {
        let fonts = FontSet::fallback();
        let p = painter(&fonts);
        let long = "lorem ipsum dolor sit amet ".repeat(30);
        let list = paint_card(&job(CardKind::Spell, &long, None), &p);
        let desc_lines = list
            .commands()
            .iter()
            .filter(|c| matches!(c, PaintCommand::Text { weight: Weight::Regular, size, .. } if *size == DESCRIPTION_FONT))
            .count();
        assert_eq!(desc_lines, p.layout.description_max_lines());
    }

    #[test]
    fn description_block_is_centered_then_clamped() {
        // 120 tall region, 88 interior
        assert_eq!(description_block_offset(120.0, 1), 16.0 + 33.0);
        assert_eq!(description_block_offset(120.0, 4), 16.0);
        assert_eq!(description_block_offset(120.0, 5), 10.0);
    }

    #[test]
    fn footer_uses_placeholder_and_stays_clear_of_badge() {
        let fonts = FontSet::fallback();
        let p = painter(&fonts);
        let list = paint_card(&job(CardKind::from_parts("Creature", Some(1), Some(1)), "", Some("  ")), &p);
        let texts = list.texts();
        assert!(texts.contains(&FOOTER_LABEL));
        assert!(texts.contains(&"Anonymous"));

        let long_name = "Bartholomew Maximilian Featherstonehaugh";
        let list = paint_card(&job(CardKind::from_parts("Creature", Some(1), Some(1)), "", Some(long_name)), &p);
        let badge_left = p.layout.stat_badge.x;
        for c in list.commands() {
            if let PaintCommand::Text { x, text, weight: Weight::Heavy, size, .. } = c {
                let right = x + fonts.measure(Weight::Heavy, *size, text);
                assert!(right <= badge_left, "footer name reaches the stat badge");
                assert!(long_name.starts_with(text.as_str()));
            }
        }
    }

    #[test]
    fn cover_offset_centers_mismatched_aspect() {
        assert_eq!(cover_offset(376, 300, 376.0, 300.0), 0.0);
        assert_eq!(cover_offset(376, 200, 376.0, 300.0), 50.0);
        assert_eq!(cover_offset(0, 10, 376.0, 300.0), 0.0);
    }
}
