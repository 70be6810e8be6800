//! Backend-independent figure description.
//!
//! A [`Figure`] is a page measured in points (1/72 inch, origin at the top
//! left, y pointing down) holding an ordered display list. Backends implement
//! [`Surface`] and replay the list; the raster and PDF outputs of a figure
//! therefore always agree on layout.

use image::RgbImage;

use crate::grid::Extent;

pub type Point = (f32, f32);

/// Average Helvetica advance as a fraction of font size. Both backends lay text
/// out with this width so boxes and legends line up in PNG and PDF alike.
pub const CHAR_WIDTH_EM: f32 = 0.55;
/// Baseline-to-baseline distance as a fraction of font size.
pub const LINE_HEIGHT_EM: f32 = 1.2;
/// Height of capitals above the baseline.
pub const CAP_HEIGHT_EM: f32 = 0.7;

pub const BLACK: [u8; 3] = [0, 0, 0];
pub const WHITE: [u8; 3] = [255, 255, 255];

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self { x, y, w, h }
    }

    pub fn right(&self) -> f32 {
        self.x + self.w
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.h
    }

    pub fn corners(&self) -> Vec<Point> {
        vec![
            (self.x, self.y),
            (self.right(), self.y),
            (self.right(), self.bottom()),
            (self.x, self.bottom()),
        ]
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Fill {
    pub color: [u8; 3],
    pub alpha: f32,
}

impl Fill {
    pub fn solid(color: [u8; 3]) -> Self {
        Self { color, alpha: 1.0 }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Stroke {
    pub color: [u8; 3],
    /// Line width in points
    pub width: f32,
    pub alpha: f32,
    /// (on, off) lengths in points
    pub dash: Option<(f32, f32)>,
}

impl Stroke {
    pub fn solid(color: [u8; 3], width: f32) -> Self {
        Self { color, width, alpha: 1.0, dash: None }
    }

    /// Dashed like a `--` line: dash and gap scale with the line width.
    pub fn dashed(color: [u8; 3], width: f32) -> Self {
        Self { color, width, alpha: 1.0, dash: Some((3.7 * width, 1.6 * width)) }
    }

    /// Dotted like a `:` line.
    pub fn dotted(color: [u8; 3], width: f32) -> Self {
        Self { color, width, alpha: 1.0, dash: Some((width, 1.65 * width)) }
    }

    pub fn with_alpha(mut self, alpha: f32) -> Self {
        self.alpha = alpha;
        self
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Font {
    /// Size in points
    pub size: f32,
    pub bold: bool,
    pub italic: bool,
    pub color: [u8; 3],
}

impl Font {
    pub fn regular(size: f32) -> Self {
        Self { size, bold: false, italic: false, color: BLACK }
    }

    pub fn bold(size: f32) -> Self {
        Self { bold: true, ..Self::regular(size) }
    }

    pub fn italic(size: f32) -> Self {
        Self { italic: true, ..Self::regular(size) }
    }

    pub fn with_color(mut self, color: [u8; 3]) -> Self {
        self.color = color;
        self
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HAlign {
    Left,
    Center,
    Right,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VAlign {
    Top,
    Center,
    Bottom,
}

/// How a text block sits relative to its anchor point.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Placement {
    pub h: HAlign,
    pub v: VAlign,
    /// Counter-clockwise rotation in degrees
    pub rotation_deg: f32,
}

impl Placement {
    pub const CENTER: Placement = Placement { h: HAlign::Center, v: VAlign::Center, rotation_deg: 0.0 };
    pub const LEFT_BOTTOM: Placement = Placement { h: HAlign::Left, v: VAlign::Bottom, rotation_deg: 0.0 };
    pub const LEFT_CENTER: Placement = Placement { h: HAlign::Left, v: VAlign::Center, rotation_deg: 0.0 };

    pub fn rotated(mut self, degrees: f32) -> Self {
        self.rotation_deg = degrees;
        self
    }
}

/// One entry of the display list.
#[derive(Clone, Debug)]
pub enum Mark {
    /// Raster placed (stretched) into a page rectangle
    Image { image: RgbImage, rect: Rect },
    /// Closed path, filled with the even-odd rule
    Polygon {
        points: Vec<Point>,
        fill: Option<Fill>,
        stroke: Option<Stroke>,
    },
    /// Open path
    Polyline { points: Vec<Point>, stroke: Stroke },
    /// A single line of text starting at `origin` on its baseline
    Text {
        text: String,
        origin: Point,
        font: Font,
        rotation_deg: f32,
    },
}

/// Drawing backend.
pub trait Surface {
    fn fill_polygon(&mut self, points: &[Point], fill: &Fill);
    fn stroke_path(&mut self, points: &[Point], closed: bool, stroke: &Stroke);
    fn draw_image(&mut self, image: &RgbImage, rect: Rect);
    fn draw_text(&mut self, text: &str, origin: Point, font: &Font, rotation_deg: f32);
}

/// A page and its display list.
#[derive(Clone, Debug)]
pub struct Figure {
    pub width: f32,
    pub height: f32,
    pub background: [u8; 3],
    pub marks: Vec<Mark>,
}

impl Figure {
    /// New page of `width_in` x `height_in` inches.
    pub fn new(width_in: f32, height_in: f32) -> Self {
        Self {
            width: width_in * 72.0,
            height: height_in * 72.0,
            background: WHITE,
            marks: Vec::new(),
        }
    }

    /// Replay the display list onto a surface, background first.
    pub fn render<S: Surface>(&self, surface: &mut S) {
        let page = Rect::new(0.0, 0.0, self.width, self.height);
        surface.fill_polygon(&page.corners(), &Fill::solid(self.background));

        for mark in &self.marks {
            match mark {
                Mark::Image { image, rect } => surface.draw_image(image, *rect),
                Mark::Polygon { points, fill, stroke } => {
                    if let Some(fill) = fill {
                        surface.fill_polygon(points, fill);
                    }
                    if let Some(stroke) = stroke {
                        surface.stroke_path(points, true, stroke);
                    }
                }
                Mark::Polyline { points, stroke } => surface.stroke_path(points, false, stroke),
                Mark::Text { text, origin, font, rotation_deg } => {
                    surface.draw_text(text, *origin, font, *rotation_deg)
                }
            }
        }
    }

    pub fn image(&mut self, image: RgbImage, rect: Rect) {
        self.marks.push(Mark::Image { image, rect });
    }

    pub fn polygon(&mut self, points: Vec<Point>, fill: Option<Fill>, stroke: Option<Stroke>) {
        self.marks.push(Mark::Polygon { points, fill, stroke });
    }

    pub fn rect(&mut self, rect: Rect, fill: Option<Fill>, stroke: Option<Stroke>) {
        self.polygon(rect.corners(), fill, stroke);
    }

    pub fn polyline(&mut self, points: Vec<Point>, stroke: Stroke) {
        self.marks.push(Mark::Polyline { points, stroke });
    }

    pub fn line(&mut self, from: Point, to: Point, stroke: Stroke) {
        self.polyline(vec![from, to], stroke);
    }

    /// Filled circle of `radius` points.
    pub fn dot(&mut self, center: Point, radius: f32, color: [u8; 3]) {
        self.polygon(circle(center, radius, 20), Some(Fill::solid(color)), None);
    }

    /// Line with an open `->` head at `to`.
    pub fn arrow(&mut self, from: Point, to: Point, stroke: Stroke) {
        let (dx, dy) = (to.0 - from.0, to.1 - from.1);
        let len = (dx * dx + dy * dy).sqrt().max(1e-3);
        let (ux, uy) = (dx / len, dy / len);
        let head = 4.0 * stroke.width.max(1.0);
        let left = (to.0 - head * (ux - 0.5 * uy), to.1 - head * (uy + 0.5 * ux));
        let right = (to.0 - head * (ux + 0.5 * uy), to.1 - head * (uy - 0.5 * ux));
        self.line(from, to, stroke);
        self.polyline(vec![left, to, right], stroke);
    }

    /// Text block (lines separated by `\n`) anchored at `anchor`.
    pub fn text(&mut self, text: &str, anchor: Point, font: Font, placement: Placement) {
        self.text_boxed(text, anchor, font, placement, None, 0.0);
    }

    /// Text block with an optional background box padded by `pad` points.
    pub fn text_boxed(
        &mut self,
        text: &str,
        anchor: Point,
        font: Font,
        placement: Placement,
        background: Option<Fill>,
        pad: f32,
    ) {
        let block = TextBlock::layout(text, font.size, placement);
        let frame = RotatedFrame::new(anchor, placement.rotation_deg);

        if let Some(fill) = background {
            let (a0, b0, a1, b1) = block.bounds();
            let corners = [
                (a0 - pad, b1 + pad),
                (a1 + pad, b1 + pad),
                (a1 + pad, b0 - pad),
                (a0 - pad, b0 - pad),
            ];
            let points = corners.iter().map(|&(a, b)| frame.to_page(a, b)).collect();
            self.polygon(points, Some(fill), None);
        }

        for line in &block.lines {
            self.marks.push(Mark::Text {
                text: line.text.clone(),
                origin: frame.to_page(line.a, line.b),
                font,
                rotation_deg: placement.rotation_deg,
            });
        }
    }
}

/// Advance width of a single line of text in points.
pub fn text_width(text: &str, size: f32) -> f32 {
    text.chars().count() as f32 * CHAR_WIDTH_EM * size
}

/// Regular polygon approximating a circle.
pub fn circle(center: Point, radius: f32, segments: usize) -> Vec<Point> {
    (0..segments)
        .map(|i| {
            let t = i as f32 / segments as f32 * std::f32::consts::TAU;
            (center.0 + radius * t.cos(), center.1 + radius * t.sin())
        })
        .collect()
}

/// Local text coordinates: `a` runs along the baseline, `b` points up.
#[derive(Clone, Copy, Debug)]
struct RotatedFrame {
    origin: Point,
    u: Point,
    v: Point,
}

impl RotatedFrame {
    fn new(origin: Point, rotation_deg: f32) -> Self {
        let (sin, cos) = rotation_deg.to_radians().sin_cos();
        Self { origin, u: (cos, -sin), v: (-sin, -cos) }
    }

    fn to_page(&self, a: f32, b: f32) -> Point {
        (
            self.origin.0 + a * self.u.0 + b * self.v.0,
            self.origin.1 + a * self.u.1 + b * self.v.1,
        )
    }
}

#[derive(Clone, Debug)]
struct LaidOutLine {
    text: String,
    /// Baseline start in the rotated frame
    a: f32,
    b: f32,
    width: f32,
}

#[derive(Clone, Debug)]
struct TextBlock {
    lines: Vec<LaidOutLine>,
    /// Block top in the rotated frame
    top: f32,
    height: f32,
}

impl TextBlock {
    fn layout(text: &str, size: f32, placement: Placement) -> Self {
        let line_height = LINE_HEIGHT_EM * size;
        let rows: Vec<&str> = text.split('\n').collect();
        let height = rows.len() as f32 * line_height;
        let top = match placement.v {
            VAlign::Top => 0.0,
            VAlign::Center => height / 2.0,
            VAlign::Bottom => height,
        };
        // Center the capitals of each row inside its line box
        let first_baseline = top - (line_height + CAP_HEIGHT_EM * size) / 2.0;

        let lines = rows
            .iter()
            .enumerate()
            .map(|(i, row)| {
                let width = text_width(row, size);
                let a = match placement.h {
                    HAlign::Left => 0.0,
                    HAlign::Center => -width / 2.0,
                    HAlign::Right => -width,
                };
                LaidOutLine {
                    text: row.to_string(),
                    a,
                    b: first_baseline - i as f32 * line_height,
                    width,
                }
            })
            .collect();

        Self { lines, top, height }
    }

    /// (a_min, b_min, a_max, b_max) in the rotated frame.
    fn bounds(&self) -> (f32, f32, f32, f32) {
        let a0 = self.lines.iter().map(|l| l.a).fold(f32::MAX, f32::min);
        let a1 = self.lines.iter().map(|l| l.a + l.width).fold(f32::MIN, f32::max);
        (a0, self.top - self.height, a1, self.top)
    }
}

// =============================================================================
// MAP FRAME
// =============================================================================

/// How data units map onto the axes rectangle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Aspect {
    /// One degree of longitude is as long as one degree of latitude
    Equal,
    /// Stretch to fill the available rectangle
    Auto,
}

/// An axes rectangle showing a geographic extent.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Frame {
    pub rect: Rect,
    pub extent: Extent,
}

impl Frame {
    /// Fit the extent into `available`, centered, honoring `aspect`.
    pub fn fit(available: Rect, extent: Extent, aspect: Aspect) -> Self {
        let rect = match aspect {
            Aspect::Auto => available,
            Aspect::Equal => {
                let scale = (available.w as f64 / extent.lon_span())
                    .min(available.h as f64 / extent.lat_span()) as f32;
                let w = extent.lon_span() as f32 * scale;
                let h = extent.lat_span() as f32 * scale;
                Rect::new(
                    available.x + (available.w - w) / 2.0,
                    available.y + (available.h - h) / 2.0,
                    w,
                    h,
                )
            }
        };
        Self { rect, extent }
    }

    /// Page position of a geographic coordinate.
    pub fn project(&self, lon: f64, lat: f64) -> Point {
        let fx = (lon - self.extent.lon_min) / self.extent.lon_span();
        let fy = (self.extent.lat_max - lat) / self.extent.lat_span();
        (
            self.rect.x + fx as f32 * self.rect.w,
            self.rect.y + fy as f32 * self.rect.h,
        )
    }

    pub fn project_all(&self, coords: &[(f64, f64)]) -> Vec<Point> {
        coords.iter().map(|&(lon, lat)| self.project(lon, lat)).collect()
    }

    /// Points per degree along each axis.
    pub fn scale(&self) -> (f32, f32) {
        (
            self.rect.w / self.extent.lon_span() as f32,
            self.rect.h / self.extent.lat_span() as f32,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Records calls so the replay order can be checked.
    #[derive(Default)]
    struct Recorder {
        calls: Vec<String>,
    }

    impl Surface for Recorder {
        fn fill_polygon(&mut self, points: &[Point], _fill: &Fill) {
            self.calls.push(format!("fill {}", points.len()));
        }
        fn stroke_path(&mut self, points: &[Point], closed: bool, _stroke: &Stroke) {
            self.calls.push(format!("stroke {} {}", points.len(), closed));
        }
        fn draw_image(&mut self, image: &RgbImage, _rect: Rect) {
            self.calls.push(format!("image {}", image.width()));
        }
        fn draw_text(&mut self, text: &str, _origin: Point, _font: &Font, _rotation_deg: f32) {
            self.calls.push(format!("text {text}"));
        }
    }

    #[test]
    fn test_render_replays_in_order() {
        let mut fig = Figure::new(2.0, 1.0);
        fig.image(RgbImage::new(3, 2), Rect::new(0.0, 0.0, 10.0, 10.0));
        fig.rect(
            Rect::new(1.0, 1.0, 5.0, 5.0),
            Some(Fill::solid(BLACK)),
            Some(Stroke::solid(BLACK, 1.0)),
        );
        fig.text("A\nB", (20.0, 20.0), Font::regular(10.0), Placement::CENTER);

        let mut rec = Recorder::default();
        fig.render(&mut rec);
        assert_eq!(
            rec.calls,
            vec!["fill 4", "image 3", "fill 4", "stroke 4 true", "text A", "text B"]
        );
        assert_eq!(fig.width, 144.0);
    }

    #[test]
    fn test_frame_projects_corners() {
        let extent = Extent::SALINE_VALLEY;
        let frame = Frame::fit(Rect::new(10.0, 20.0, 180.0, 400.0), extent, Aspect::Auto);
        assert_eq!(frame.project(extent.lon_min, extent.lat_max), (10.0, 20.0));
        let (x, y) = frame.project(extent.lon_max, extent.lat_min);
        assert!((x - 190.0).abs() < 1e-3 && (y - 420.0).abs() < 1e-3);
    }

    #[test]
    fn test_equal_aspect_frame() {
        let extent = Extent::SALINE_VALLEY;
        let frame = Frame::fit(Rect::new(0.0, 0.0, 500.0, 500.0), extent, Aspect::Equal);
        let (sx, sy) = frame.scale();
        assert!((sx - sy).abs() < 1e-3);
        assert!((frame.rect.h - 500.0).abs() < 1e-3);
        assert!((frame.rect.x - 25.0).abs() < 1e-3);
    }

    #[test]
    fn test_centered_text_block_layout() {
        let mut fig = Figure::new(1.0, 1.0);
        fig.text("AB\nABCD", (50.0, 50.0), Font::regular(10.0), Placement::CENTER);
        let origins: Vec<Point> = fig
            .marks
            .iter()
            .filter_map(|m| match m {
                Mark::Text { origin, .. } => Some(*origin),
                _ => None,
            })
            .collect();
        assert_eq!(origins.len(), 2);
        // Lines are centered on the anchor and stacked downward
        assert!((origins[0].0 - (50.0 - text_width("AB", 10.0) / 2.0)).abs() < 1e-4);
        assert!((origins[1].0 - (50.0 - text_width("ABCD", 10.0) / 2.0)).abs() < 1e-4);
        assert!((origins[1].1 - origins[0].1 - 12.0).abs() < 1e-4);
        assert!(origins[0].1 < 50.0 && origins[1].1 > 50.0);
    }

    #[test]
    fn test_rotated_text_runs_upward() {
        let mut fig = Figure::new(1.0, 1.0);
        fig.text("ABCD", (50.0, 50.0), Font::regular(10.0), Placement::CENTER.rotated(90.0));
        if let Some(Mark::Text { origin, .. }) = fig.marks.first() {
            // Text starts below the anchor and reads upward
            assert!(origin.1 > 50.0);
        } else {
            panic!("expected a text mark");
        }
    }
}
