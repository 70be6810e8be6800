//! Raster backend: replays a figure into an `RgbImage`.

use std::path::Path;

use image::{ImageBuffer, ImageFormat, Rgb, RgbImage};

use crate::error::Result;
use crate::figure::{Fill, Figure, Font, Point, Rect, Stroke, Surface, CHAR_WIDTH_EM};

/// Renders into an RGB buffer at a fixed pixel density.
pub struct RasterSurface {
    img: RgbImage,
    /// Pixels per point
    scale: f32,
}

impl RasterSurface {
    /// Surface for a page of `width` x `height` points at `dpi`.
    pub fn new(width: f32, height: f32, dpi: f32) -> Self {
        let scale = dpi / 72.0;
        let w = (width * scale).round().max(1.0) as u32;
        let h = (height * scale).round().max(1.0) as u32;
        Self {
            img: ImageBuffer::from_pixel(w, h, Rgb([255, 255, 255])),
            scale,
        }
    }

    pub fn into_image(self) -> RgbImage {
        self.img
    }

    fn to_px(&self, p: Point) -> Point {
        (p.0 * self.scale, p.1 * self.scale)
    }

    fn blend(&mut self, x: u32, y: u32, color: [u8; 3], alpha: f32) {
        let dst = self.img.get_pixel_mut(x, y);
        if alpha >= 1.0 {
            *dst = Rgb(color);
            return;
        }
        for c in 0..3 {
            let v = color[c] as f32 * alpha + dst.0[c] as f32 * (1.0 - alpha);
            dst.0[c] = v.round().clamp(0.0, 255.0) as u8;
        }
    }

    /// Blend every pixel covered by the union of `shapes` exactly once.
    fn fill_union(&mut self, shapes: &[Vec<Point>], color: [u8; 3], alpha: f32) {
        let (w, h) = self.img.dimensions();
        let Some((x0, y0, x1, y1)) = pixel_bounds(shapes, w, h) else {
            return;
        };
        let bw = x1 - x0;
        let mut covered = vec![false; (bw * (y1 - y0)) as usize];
        for shape in shapes {
            scan_polygon(shape, w, h, |x, y| {
                if (x0..x1).contains(&x) && (y0..y1).contains(&y) {
                    covered[((y - y0) * bw + (x - x0)) as usize] = true;
                }
            });
        }
        for (idx, &hit) in covered.iter().enumerate() {
            if hit {
                let idx = idx as u32;
                self.blend(x0 + idx % bw, y0 + idx / bw, color, alpha);
            }
        }
    }
}

impl Surface for RasterSurface {
    fn fill_polygon(&mut self, points: &[Point], fill: &Fill) {
        let px: Vec<Point> = points.iter().map(|&p| self.to_px(p)).collect();
        self.fill_union(&[px], fill.color, fill.alpha);
    }

    fn stroke_path(&mut self, points: &[Point], closed: bool, stroke: &Stroke) {
        let mut path: Vec<Point> = points.iter().map(|&p| self.to_px(p)).collect();
        if closed && path.len() > 2 {
            path.push(path[0]);
        }
        let width = (stroke.width * self.scale).max(1.0);
        let pieces = match stroke.dash {
            Some((on, off)) => dash_path(&path, on * self.scale, off * self.scale),
            None => vec![path],
        };

        let mut shapes = Vec::new();
        for piece in &pieces {
            for seg in piece.windows(2) {
                if let Some(quad) = segment_quad(seg[0], seg[1], width) {
                    shapes.push(quad);
                }
            }
            // Round joins keep thick corners closed
            if width > 2.0 {
                for &p in piece {
                    shapes.push(crate::figure::circle(p, width / 2.0, 12));
                }
            }
        }
        self.fill_union(&shapes, stroke.color, stroke.alpha);
    }

    fn draw_image(&mut self, image: &RgbImage, rect: Rect) {
        let (w, h) = self.img.dimensions();
        let (x0, y0) = self.to_px((rect.x, rect.y));
        let (x1, y1) = self.to_px((rect.right(), rect.bottom()));
        let (sw, sh) = image.dimensions();
        if sw == 0 || sh == 0 || x1 <= x0 || y1 <= y0 {
            return;
        }

        let px_start = x0.round().max(0.0) as u32;
        let px_end = (x1.round() as u32).min(w);
        let py_start = y0.round().max(0.0) as u32;
        let py_end = (y1.round() as u32).min(h);

        for py in py_start..py_end {
            // Source coordinate of this pixel center, in source pixel units
            let v = ((py as f32 + 0.5 - y0) / (y1 - y0)) * sh as f32 - 0.5;
            for px in px_start..px_end {
                let u = ((px as f32 + 0.5 - x0) / (x1 - x0)) * sw as f32 - 0.5;
                let color = sample_bilinear(image, u, v);
                self.img.put_pixel(px, py, Rgb(color));
            }
        }
    }

    fn draw_text(&mut self, text: &str, origin: Point, font: &Font, rotation_deg: f32) {
        // One font cell is 6 units wide (5 + spacing) and 7 tall
        let unit = font.size * CHAR_WIDTH_EM / 6.0;
        let (sin, cos) = rotation_deg.to_radians().sin_cos();
        let u = (cos, -sin);
        let v = (-sin, -cos);
        let at = |a: f32, b: f32| (origin.0 + a * u.0 + b * v.0, origin.1 + a * u.1 + b * v.1);
        let slant = if font.italic { 0.2 } else { 0.0 };
        let dot_w = if font.bold { unit * 1.5 } else { unit };

        let mut shapes = Vec::new();
        for (i, ch) in text.chars().enumerate() {
            let Some(bits) = glyph(ch) else { continue };
            let pen = i as f32 * 6.0 * unit;
            for (row, &byte) in bits.iter().enumerate() {
                for col in 0..5 {
                    if byte & (0b10000 >> col) == 0 {
                        continue;
                    }
                    let b0 = (6 - row) as f32 * unit;
                    let a0 = pen + col as f32 * unit + b0 * slant;
                    let cell = [
                        at(a0, b0),
                        at(a0 + dot_w, b0),
                        at(a0 + dot_w, b0 + unit),
                        at(a0, b0 + unit),
                    ];
                    shapes.push(cell.iter().map(|&p| self.to_px(p)).collect());
                }
            }
        }
        self.fill_union(&shapes, font.color, 1.0);
    }
}

/// Rasterize a figure at `dpi` and save it as PNG.
pub fn render_png(figure: &Figure, dpi: f32, path: &Path) -> Result<()> {
    let mut surface = RasterSurface::new(figure.width, figure.height, dpi);
    figure.render(&mut surface);
    surface.into_image().save_with_format(path, ImageFormat::Png)?;
    Ok(())
}

// =============================================================================
// SCAN CONVERSION
// =============================================================================

/// Visit every pixel whose center lies inside the polygon (even-odd rule).
fn scan_polygon(points: &[Point], width: u32, height: u32, mut visit: impl FnMut(u32, u32)) {
    if points.len() < 3 {
        return;
    }
    let y_min = points.iter().map(|p| p.1).fold(f32::MAX, f32::min);
    let y_max = points.iter().map(|p| p.1).fold(f32::MIN, f32::max);
    let row_start = (y_min - 0.5).ceil().max(0.0) as i64;
    let row_end = ((y_max - 0.5).floor() as i64).min(height as i64 - 1);

    let mut crossings = Vec::new();
    for y in row_start..=row_end {
        let yc = y as f32 + 0.5;
        crossings.clear();
        for i in 0..points.len() {
            let (x0, y0) = points[i];
            let (x1, y1) = points[(i + 1) % points.len()];
            if (y0 <= yc && y1 > yc) || (y1 <= yc && y0 > yc) {
                crossings.push(x0 + (yc - y0) / (y1 - y0) * (x1 - x0));
            }
        }
        crossings.sort_by(|a, b| a.total_cmp(b));
        for pair in crossings.chunks_exact(2) {
            let start = (pair[0] - 0.5).ceil().max(0.0) as i64;
            let end = ((pair[1] - 0.5).floor() as i64).min(width as i64 - 1);
            for x in start..=end {
                visit(x as u32, y as u32);
            }
        }
    }
}

/// Pixel box `(x0, y0, x1, y1)`, ends exclusive, holding every pixel the
/// shapes can cover on a `width` x `height` page. `None` when nothing is on it.
fn pixel_bounds(shapes: &[Vec<Point>], width: u32, height: u32) -> Option<(u32, u32, u32, u32)> {
    let mut min = (f32::MAX, f32::MAX);
    let mut max = (f32::MIN, f32::MIN);
    for &(x, y) in shapes.iter().flatten() {
        min = (min.0.min(x), min.1.min(y));
        max = (max.0.max(x), max.1.max(y));
    }
    if min.0 > max.0 || min.1 > max.1 {
        return None;
    }
    let x0 = min.0.floor().max(0.0) as u32;
    let y0 = min.1.floor().max(0.0) as u32;
    let x1 = ((max.0.ceil().max(0.0) as u32).saturating_add(1)).min(width);
    let y1 = ((max.1.ceil().max(0.0) as u32).saturating_add(1)).min(height);
    (x0 < x1 && y0 < y1).then_some((x0, y0, x1, y1))
}

/// Rectangle covering a line segment of the given width.
fn segment_quad(a: Point, b: Point, width: f32) -> Option<Vec<Point>> {
    let (dx, dy) = (b.0 - a.0, b.1 - a.1);
    let len = (dx * dx + dy * dy).sqrt();
    if len < 1e-6 {
        return None;
    }
    let (nx, ny) = (-dy / len * width / 2.0, dx / len * width / 2.0);
    Some(vec![
        (a.0 + nx, a.1 + ny),
        (b.0 + nx, b.1 + ny),
        (b.0 - nx, b.1 - ny),
        (a.0 - nx, a.1 - ny),
    ])
}

/// Split a polyline into the "on" pieces of an (on, off) dash pattern.
fn dash_path(path: &[Point], on: f32, off: f32) -> Vec<Vec<Point>> {
    let mut pieces = Vec::new();
    if on <= 0.0 {
        return vec![path.to_vec()];
    }
    let mut drawing = true;
    let mut remaining = on;
    let mut current: Vec<Point> = path.first().copied().into_iter().collect();

    for seg in path.windows(2) {
        let (mut p, q) = (seg[0], seg[1]);
        let mut seg_len = ((q.0 - p.0).powi(2) + (q.1 - p.1).powi(2)).sqrt();
        while seg_len > remaining {
            let t = remaining / seg_len;
            let split = (p.0 + (q.0 - p.0) * t, p.1 + (q.1 - p.1) * t);
            if drawing {
                current.push(split);
                pieces.push(std::mem::take(&mut current));
            } else {
                current = vec![split];
            }
            seg_len -= remaining;
            p = split;
            drawing = !drawing;
            remaining = if drawing { on } else { off.max(1e-3) };
        }
        remaining -= seg_len;
        if drawing {
            current.push(q);
        }
    }
    if drawing && current.len() > 1 {
        pieces.push(current);
    }
    pieces
}

fn sample_bilinear(image: &RgbImage, u: f32, v: f32) -> [u8; 3] {
    let (w, h) = image.dimensions();
    let u = u.clamp(0.0, (w - 1) as f32);
    let v = v.clamp(0.0, (h - 1) as f32);
    let x0 = u.floor() as u32;
    let y0 = v.floor() as u32;
    let x1 = (x0 + 1).min(w - 1);
    let y1 = (y0 + 1).min(h - 1);
    let fx = u - x0 as f32;
    let fy = v - y0 as f32;

    let p00 = image.get_pixel(x0, y0).0;
    let p10 = image.get_pixel(x1, y0).0;
    let p01 = image.get_pixel(x0, y1).0;
    let p11 = image.get_pixel(x1, y1).0;

    let mut out = [0u8; 3];
    for c in 0..3 {
        let top = p00[c] as f32 + (p10[c] as f32 - p00[c] as f32) * fx;
        let bottom = p01[c] as f32 + (p11[c] as f32 - p01[c] as f32) * fx;
        out[c] = (top + (bottom - top) * fy).round() as u8;
    }
    out
}

// =============================================================================
// BITMAP FONT
// =============================================================================

/// 5x7 pixel font. Lowercase letters draw as capitals; accented vowels
/// draw as their base letter.
const FONT_5X7: &[(char, [u8; 7])] = &[
    ('A', [0b01110, 0b10001, 0b10001, 0b11111, 0b10001, 0b10001, 0b10001]),
    ('B', [0b11110, 0b10001, 0b10001, 0b11110, 0b10001, 0b10001, 0b11110]),
    ('C', [0b01110, 0b10001, 0b10000, 0b10000, 0b10000, 0b10001, 0b01110]),
    ('D', [0b11110, 0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b11110]),
    ('E', [0b11111, 0b10000, 0b10000, 0b11110, 0b10000, 0b10000, 0b11111]),
    ('F', [0b11111, 0b10000, 0b10000, 0b11110, 0b10000, 0b10000, 0b10000]),
    ('G', [0b01110, 0b10001, 0b10000, 0b10111, 0b10001, 0b10001, 0b01110]),
    ('H', [0b10001, 0b10001, 0b10001, 0b11111, 0b10001, 0b10001, 0b10001]),
    ('I', [0b01110, 0b00100, 0b00100, 0b00100, 0b00100, 0b00100, 0b01110]),
    ('J', [0b00111, 0b00010, 0b00010, 0b00010, 0b00010, 0b10010, 0b01100]),
    ('K', [0b10001, 0b10010, 0b10100, 0b11000, 0b10100, 0b10010, 0b10001]),
    ('L', [0b10000, 0b10000, 0b10000, 0b10000, 0b10000, 0b10000, 0b11111]),
    ('M', [0b10001, 0b11011, 0b10101, 0b10101, 0b10001, 0b10001, 0b10001]),
    ('N', [0b10001, 0b10001, 0b11001, 0b10101, 0b10011, 0b10001, 0b10001]),
    ('O', [0b01110, 0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b01110]),
    ('P', [0b11110, 0b10001, 0b10001, 0b11110, 0b10000, 0b10000, 0b10000]),
    ('Q', [0b01110, 0b10001, 0b10001, 0b10001, 0b10101, 0b10010, 0b01101]),
    ('R', [0b11110, 0b10001, 0b10001, 0b11110, 0b10100, 0b10010, 0b10001]),
    ('S', [0b01110, 0b10001, 0b10000, 0b01110, 0b00001, 0b10001, 0b01110]),
    ('T', [0b11111, 0b00100, 0b00100, 0b00100, 0b00100, 0b00100, 0b00100]),
    ('U', [0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b01110]),
    ('V', [0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b01010, 0b00100]),
    ('W', [0b10001, 0b10001, 0b10001, 0b10101, 0b10101, 0b10101, 0b01010]),
    ('X', [0b10001, 0b10001, 0b01010, 0b00100, 0b01010, 0b10001, 0b10001]),
    ('Y', [0b10001, 0b10001, 0b01010, 0b00100, 0b00100, 0b00100, 0b00100]),
    ('Z', [0b11111, 0b00001, 0b00010, 0b00100, 0b01000, 0b10000, 0b11111]),
    ('0', [0b01110, 0b10001, 0b10011, 0b10101, 0b11001, 0b10001, 0b01110]),
    ('1', [0b00100, 0b01100, 0b00100, 0b00100, 0b00100, 0b00100, 0b01110]),
    ('2', [0b01110, 0b10001, 0b00001, 0b00010, 0b00100, 0b01000, 0b11111]),
    ('3', [0b11111, 0b00010, 0b00100, 0b00010, 0b00001, 0b10001, 0b01110]),
    ('4', [0b00010, 0b00110, 0b01010, 0b10010, 0b11111, 0b00010, 0b00010]),
    ('5', [0b11111, 0b10000, 0b11110, 0b00001, 0b00001, 0b10001, 0b01110]),
    ('6', [0b00110, 0b01000, 0b10000, 0b11110, 0b10001, 0b10001, 0b01110]),
    ('7', [0b11111, 0b00001, 0b00010, 0b00100, 0b01000, 0b01000, 0b01000]),
    ('8', [0b01110, 0b10001, 0b10001, 0b01110, 0b10001, 0b10001, 0b01110]),
    ('9', [0b01110, 0b10001, 0b10001, 0b01111, 0b00001, 0b00010, 0b01100]),
    (' ', [0b00000, 0b00000, 0b00000, 0b00000, 0b00000, 0b00000, 0b00000]),
    ('-', [0b00000, 0b00000, 0b00000, 0b11111, 0b00000, 0b00000, 0b00000]),
    ('.', [0b00000, 0b00000, 0b00000, 0b00000, 0b00000, 0b01100, 0b01100]),
    (',', [0b00000, 0b00000, 0b00000, 0b00000, 0b01100, 0b00100, 0b01000]),
    (':', [0b00000, 0b01100, 0b01100, 0b00000, 0b01100, 0b01100, 0b00000]),
    ('(', [0b00010, 0b00100, 0b01000, 0b01000, 0b01000, 0b00100, 0b00010]),
    (')', [0b01000, 0b00100, 0b00010, 0b00010, 0b00010, 0b00100, 0b01000]),
    ('/', [0b00001, 0b00010, 0b00010, 0b00100, 0b01000, 0b01000, 0b10000]),
    ('|', [0b00100, 0b00100, 0b00100, 0b00100, 0b00100, 0b00100, 0b00100]),
    ('~', [0b00000, 0b00000, 0b01000, 0b10101, 0b00010, 0b00000, 0b00000]),
    ('°', [0b01100, 0b10010, 0b10010, 0b01100, 0b00000, 0b00000, 0b00000]),
];

fn glyph(ch: char) -> Option<&'static [u8; 7]> {
    let ch = match ch {
        'ü' | 'Ü' | 'ú' | 'û' => 'U',
        'é' | 'è' | 'É' => 'E',
        'á' | 'à' => 'A',
        other => other.to_ascii_uppercase(),
    };
    FONT_5X7.iter().find(|(c, _)| *c == ch).map(|(_, bits)| bits)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::figure::{Placement, BLACK};

    #[test]
    fn test_surface_size_follows_dpi() {
        let surface = RasterSurface::new(72.0, 144.0, 144.0);
        assert_eq!(surface.into_image().dimensions(), (144, 288));
    }

    #[test]
    fn test_alpha_fill_blends_with_background() {
        let mut surface = RasterSurface::new(10.0, 10.0, 72.0);
        let square = vec![(2.0, 2.0), (8.0, 2.0), (8.0, 8.0), (2.0, 8.0)];
        surface.fill_polygon(&square, &Fill { color: [0, 0, 0], alpha: 0.4 });
        let img = surface.into_image();
        assert_eq!(img.get_pixel(5, 5).0, [153, 153, 153]);
        assert_eq!(img.get_pixel(0, 0).0, [255, 255, 255]);
        assert_eq!(img.get_pixel(9, 9).0, [255, 255, 255]);
    }

    #[test]
    fn test_fill_partly_off_page() {
        let mut surface = RasterSurface::new(20.0, 20.0, 72.0);
        let square = vec![(15.0, 15.0), (30.0, 15.0), (30.0, 30.0), (15.0, 30.0)];
        surface.fill_polygon(&square, &Fill::solid([0, 0, 0]));
        let img = surface.into_image();
        assert_eq!(img.get_pixel(19, 19).0, [0, 0, 0]);
        assert_eq!(img.get_pixel(15, 15).0, [0, 0, 0]);
        assert_eq!(img.get_pixel(14, 14).0, [255, 255, 255]);
        assert_eq!(img.get_pixel(3, 18).0, [255, 255, 255]);
    }

    #[test]
    fn test_pixel_bounds_cover_shapes_only() {
        let shapes = vec![vec![(2.2, 3.7), (5.5, 3.7), (5.5, 8.1)]];
        assert_eq!(pixel_bounds(&shapes, 100, 100), Some((2, 3, 7, 10)));
        // Clipped to the page
        let wide = vec![vec![(-5.0, -5.0), (500.0, -5.0), (500.0, 500.0)]];
        assert_eq!(pixel_bounds(&wide, 100, 80), Some((0, 0, 100, 80)));
        // Entirely off the page, or empty
        let off = vec![vec![(200.0, 10.0), (210.0, 10.0), (210.0, 20.0)]];
        assert_eq!(pixel_bounds(&off, 100, 100), None);
        assert_eq!(pixel_bounds(&[], 100, 100), None);
    }

    #[test]
    fn test_overlapping_stroke_segments_blend_once() {
        let mut surface = RasterSurface::new(20.0, 20.0, 72.0);
        let path = vec![(2.0, 10.0), (10.0, 10.0), (18.0, 10.0)];
        let stroke = Stroke::solid([0, 0, 0], 4.0).with_alpha(0.5);
        surface.stroke_path(&path, false, &stroke);
        let img = surface.into_image();
        // The shared vertex is not darker than the rest of the line
        assert_eq!(img.get_pixel(10, 10).0, img.get_pixel(5, 10).0);
        assert_eq!(img.get_pixel(5, 10).0, [128, 128, 128]);
    }

    #[test]
    fn test_dash_pattern_splits_path() {
        let path = vec![(0.0, 0.0), (10.0, 0.0)];
        let pieces = dash_path(&path, 2.0, 1.0);
        // on [0,2], [3,5], [6,8], [9,10]
        assert_eq!(pieces.len(), 4);
        assert_eq!(pieces[1].first(), Some(&(3.0, 0.0)));
        assert_eq!(pieces[3].last(), Some(&(10.0, 0.0)));
    }

    #[test]
    fn test_image_is_stretched_into_rect() {
        let mut src = RgbImage::new(2, 1);
        src.put_pixel(0, 0, Rgb([255, 0, 0]));
        src.put_pixel(1, 0, Rgb([0, 0, 255]));
        let mut surface = RasterSurface::new(20.0, 10.0, 72.0);
        surface.draw_image(&src, Rect::new(0.0, 0.0, 20.0, 10.0));
        let img = surface.into_image();
        assert_eq!(img.get_pixel(0, 5).0, [255, 0, 0]);
        assert_eq!(img.get_pixel(19, 5).0, [0, 0, 255]);
    }

    #[test]
    fn test_text_draws_ink() {
        let mut fig = Figure::new(1.0, 0.5);
        fig.text("Nüümü", (36.0, 18.0), Font::bold(12.0).with_color(BLACK), Placement::CENTER);
        let mut surface = RasterSurface::new(fig.width, fig.height, 144.0);
        fig.render(&mut surface);
        let img = surface.into_image();
        let dark = img.pixels().filter(|p| p.0 == [0, 0, 0]).count();
        assert!(dark > 50, "only {dark} dark pixels");
    }

    #[test]
    fn test_glyph_fallbacks() {
        assert_eq!(glyph('ü'), glyph('U'));
        assert_eq!(glyph('a'), glyph('A'));
        assert!(glyph('°').is_some());
        assert!(glyph('@').is_none());
    }
}
