/// Fixed card geometry: canvas size, band rectangles and cut-corner outlines.
///
/// Every band is derived from the constants below, so the layout is the same
/// for every card and can be computed without looking at the card itself.

use serde::Deserialize;

pub const CARD_WIDTH: u32 = 400;
pub const CARD_HEIGHT: u32 = 600;
pub const BORDER: f32 = 12.0;
pub const CUT_SIZE: f32 = 48.0;
pub const IMAGE_HEIGHT: f32 = (CARD_HEIGHT / 2) as f32;
pub const TITLE_BAR_HEIGHT: f32 = 56.0;
pub const TYPE_BAR_HEIGHT: f32 = 32.0;
pub const STAT_BADGE_WIDTH: f32 = 80.0;
pub const STAT_BADGE_HEIGHT: f32 = 38.0;
/// Space kept between the description region and the stat badge.
pub const STAT_BADGE_MARGIN: f32 = 30.0;
pub const FOOTER_HEIGHT: f32 = STAT_BADGE_HEIGHT + STAT_BADGE_MARGIN;
pub const FOOTER_BOTTOM_PADDING: f32 = 12.0;
pub const COST_RADIUS: f32 = 28.0;
pub const COST_MARGIN: f32 = 2.0;
pub const LINE_HEIGHT: f32 = 22.0;
pub const DESCRIPTION_PADDING: f32 = 16.0;
pub const DESCRIPTION_SIDE_PADDING: f32 = 24.0;

pub type Point = (f32, f32);

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self { x, y, width, height }
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    pub fn center(&self) -> Point {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// True when the two rectangles share interior area (touching edges do not count).
    pub fn overlaps(&self, other: &Rect) -> bool {
        self.x < other.right()
            && other.x < self.right()
            && self.y < other.bottom()
            && other.y < self.bottom()
    }

    pub fn contains_rect(&self, other: &Rect) -> bool {
        other.x >= self.x
            && other.y >= self.y
            && other.right() <= self.right()
            && other.bottom() <= self.bottom()
    }

    pub fn contains(&self, (x, y): Point) -> bool {
        x >= self.x && x < self.right() && y >= self.y && y < self.bottom()
    }
}

/// Which card corners are cut at 45 degrees.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Corners {
    pub top_left: bool,
    pub top_right: bool,
    pub bottom_right: bool,
    pub bottom_left: bool,
}

/// Corner treatment of the card frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CornerStyle {
    /// Top-right and bottom-left corners cut; the photo keeps a square top-left.
    #[default]
    Diagonal,
    /// All four corners cut, photo included.
    Octagon,
}

impl CornerStyle {
    pub fn frame_corners(self) -> Corners {
        match self {
            CornerStyle::Diagonal => Corners {
                top_left: false,
                top_right: true,
                bottom_right: false,
                bottom_left: true,
            },
            CornerStyle::Octagon => Corners {
                top_left: true,
                top_right: true,
                bottom_right: true,
                bottom_left: true,
            },
        }
    }
}

/// Cut-corner outline of the card inset by `inset` on every side.
///
/// Cut points sit on the 45 degree lines `CUT_SIZE` away from the canvas
/// corners, so insets of the same style stay parallel to the outer frame.
pub fn outline(inset: f32, corners: Corners) -> Vec<Point> {
    let w = CARD_WIDTH as f32;
    let h = CARD_HEIGHT as f32;
    let c = CUT_SIZE;
    let d = inset;
    let mut pts = Vec::with_capacity(8);

    if corners.top_left {
        pts.extend([(d, c), (c, d)]);
    } else {
        pts.push((d, d));
    }
    if corners.top_right {
        pts.extend([(w - c, d), (w - d, c)]);
    } else {
        pts.push((w - d, d));
    }
    if corners.bottom_right {
        pts.extend([(w - d, h - c), (w - c, h - d)]);
    } else {
        pts.push((w - d, h - d));
    }
    if corners.bottom_left {
        pts.extend([(c, h - d), (d, h - c)]);
    } else {
        pts.push((d, h - d));
    }
    pts
}

/// Clip region of the photo: the photo rectangle with the frame's top corners.
pub fn photo_clip(photo: &Rect, corners: Corners) -> Vec<Point> {
    let w = CARD_WIDTH as f32;
    let c = CUT_SIZE;
    let mut pts = Vec::with_capacity(6);

    if corners.top_left {
        pts.extend([(photo.x, c), (c, photo.y)]);
    } else {
        pts.push((photo.x, photo.y));
    }
    if corners.top_right {
        pts.extend([(w - c, photo.y), (photo.right(), c)]);
    } else {
        pts.push((photo.right(), photo.y));
    }
    pts.push((photo.right(), photo.bottom()));
    pts.push((photo.x, photo.bottom()));
    pts
}

/// All band rectangles of a card.
#[derive(Debug, Clone, PartialEq)]
pub struct CardLayout {
    pub photo: Rect,
    pub title_band: Rect,
    pub type_band: Rect,
    /// `None` when the remaining space is not positive.
    pub description: Option<Rect>,
    pub footer: Rect,
    pub stat_badge: Rect,
    pub cost_center: Point,
    pub cost_radius: f32,
}

impl CardLayout {
    pub fn compute() -> Self {
        let w = CARD_WIDTH as f32;
        let h = CARD_HEIGHT as f32;
        let inner_width = w - 2.0 * BORDER;

        let photo = Rect::new(BORDER, BORDER, inner_width, IMAGE_HEIGHT);
        let title_band = Rect::new(BORDER, photo.bottom(), inner_width, TITLE_BAR_HEIGHT);
        let type_band = Rect::new(BORDER, title_band.bottom(), inner_width, TYPE_BAR_HEIGHT);

        let desc_y = type_band.bottom();
        let desc_height = h - BORDER - desc_y - STAT_BADGE_HEIGHT - STAT_BADGE_MARGIN;
        let description = if desc_height > 0.0 {
            Some(Rect::new(BORDER, desc_y, inner_width, desc_height))
        } else {
            None
        };

        let footer_y = desc_y + desc_height.max(0.0);
        let footer = Rect::new(BORDER, footer_y, inner_width, h - BORDER - footer_y);

        let stat_badge = Rect::new(
            w - BORDER - STAT_BADGE_WIDTH,
            h - BORDER - STAT_BADGE_HEIGHT,
            STAT_BADGE_WIDTH,
            STAT_BADGE_HEIGHT,
        );

        let cost = BORDER + COST_RADIUS + COST_MARGIN;

        Self {
            photo,
            title_band,
            type_band,
            description,
            footer,
            stat_badge,
            cost_center: (cost, cost),
            cost_radius: COST_RADIUS,
        }
    }

    /// Width available to description text.
    pub fn description_text_width(&self) -> f32 {
        self.photo.width - DESCRIPTION_SIDE_PADDING
    }

    /// How many description lines the region can hold.
    pub fn description_max_lines(&self) -> usize {
        self.description
            .map(|r| (r.height / LINE_HEIGHT).floor() as usize)
            .unwrap_or(0)
    }
}

impl Default for CardLayout {
    fn default() -> Self {
        Self::compute()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bands_stack_without_overlap() {
        let l = CardLayout::compute();
        let desc = l.description.expect("description region");
        let bands = [l.photo, l.title_band, l.type_band, desc, l.footer];
        for (i, a) in bands.iter().enumerate() {
            for b in bands.iter().skip(i + 1) {
                assert!(!a.overlaps(b), "{:?} overlaps {:?}", a, b);
            }
        }
        assert_eq!(l.title_band.y, l.photo.bottom());
        assert_eq!(l.type_band.y, l.title_band.bottom());
        assert_eq!(desc.y, l.type_band.bottom());
        assert_eq!(l.footer.bottom(), CARD_HEIGHT as f32 - BORDER);
        assert_eq!(l.footer.height, FOOTER_HEIGHT);
    }

    #[test]
    fn stat_badge_sits_in_the_footer_corner() {
        let l = CardLayout::compute();
        assert!(l.footer.contains_rect(&l.stat_badge));
        assert_eq!(l.stat_badge.right(), CARD_WIDTH as f32 - BORDER);
        assert_eq!(l.stat_badge.bottom(), CARD_HEIGHT as f32 - BORDER);
        assert!(!l.stat_badge.overlaps(&l.description.unwrap()));
    }

    #[test]
    fn description_budget() {
        let l = CardLayout::compute();
        let desc = l.description.unwrap();
        assert_eq!(desc.y, 400.0);
        assert_eq!(desc.height, 120.0);
        assert_eq!(l.description_max_lines(), 5);
        assert_eq!(l.description_text_width(), 352.0);
    }

    #[test]
    fn cost_badge_center() {
        let l = CardLayout::compute();
        assert_eq!(l.cost_center, (42.0, 42.0));
    }

    #[test]
    fn diagonal_outline_matches_frame_corners() {
        let pts = outline(0.0, CornerStyle::Diagonal.frame_corners());
        assert_eq!(
            pts,
            vec![(0.0, 0.0), (352.0, 0.0), (400.0, 48.0), (400.0, 600.0), (48.0, 600.0), (0.0, 552.0)]
        );
    }

    #[test]
    fn inset_outline_stays_parallel() {
        let pts = outline(BORDER, CornerStyle::Octagon.frame_corners());
        assert_eq!(pts.len(), 8);
        assert!(pts.contains(&(352.0, 12.0)));
        assert!(pts.contains(&(388.0, 48.0)));
        assert!(pts.contains(&(12.0, 48.0)));
    }

    #[test]
    fn photo_clip_keeps_square_top_left_by_default() {
        let l = CardLayout::compute();
        let pts = photo_clip(&l.photo, CornerStyle::Diagonal.frame_corners());
        assert_eq!(pts[0], (12.0, 12.0));
        assert_eq!(pts[1], (352.0, 12.0));
        assert_eq!(pts[2], (388.0, 48.0));
        assert_eq!(pts.last(), Some(&(12.0, 312.0)));
    }
}
