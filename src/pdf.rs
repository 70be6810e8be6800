//! Vector backend: writes a figure as a single-page PDF 1.4 document.
//!
//! Shapes and text stay vector; images are embedded as Flate-compressed RGB
//! XObjects. Text uses the base-14 Helvetica family with WinAnsi encoding, so
//! no fonts are embedded.

use std::collections::BTreeSet;
use std::fmt::Write as _;
use std::io::Write;
use std::path::Path;

use chrono::Local;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use image::RgbImage;

use crate::error::{MapError, Result};
use crate::figure::{Fill, Figure, Font, Point, Rect, Stroke, Surface};

const FONT_NAMES: [&str; 4] = [
    "Helvetica",
    "Helvetica-Bold",
    "Helvetica-Oblique",
    "Helvetica-BoldOblique",
];

/// Collects page content and resources, then serializes the document.
pub struct PdfSurface {
    width: f32,
    height: f32,
    content: String,
    images: Vec<RgbImage>,
    /// Alpha values in thousandths, one ExtGState each
    alphas: BTreeSet<u32>,
}

impl PdfSurface {
    /// Surface for a page of `width` x `height` points.
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            width,
            height,
            content: String::new(),
            images: Vec::new(),
            alphas: BTreeSet::new(),
        }
    }

    /// Page y axis points up; figure y points down.
    fn pt(&self, p: Point) -> (f32, f32) {
        (p.0, self.height - p.1)
    }

    fn set_alpha(&mut self, alpha: f32) {
        let key = (alpha.clamp(0.0, 1.0) * 1000.0).round() as u32;
        self.alphas.insert(key);
        let _ = writeln!(self.content, "/GS{key} gs");
    }

    fn path(&mut self, points: &[Point], closed: bool) {
        for (i, &p) in points.iter().enumerate() {
            let (x, y) = self.pt(p);
            let op = if i == 0 { "m" } else { "l" };
            let _ = writeln!(self.content, "{} {} {op}", num(x), num(y));
        }
        if closed {
            self.content.push_str("h\n");
        }
    }

    /// Serialize the finished document.
    pub fn finish(self) -> Result<Vec<u8>> {
        let content = deflate(self.content.as_bytes())?;

        // Fixed objects: 1 catalog, 2 pages, 3 page, 4 content, 5-8 fonts,
        // 9 info, then one object per image
        let first_image = 10;
        let object_count = first_image + self.images.len();
        let mut out: Vec<u8> = Vec::new();
        let mut offsets = vec![0usize; object_count];

        out.extend_from_slice(b"%PDF-1.4\n%\xE2\xE3\xCF\xD3\n");

        let mut begin = |out: &mut Vec<u8>, id: usize| {
            offsets[id] = out.len();
            let _ = write!(out, "{id} 0 obj\n");
        };

        begin(&mut out, 1);
        out.extend_from_slice(b"<< /Type /Catalog /Pages 2 0 R >>\nendobj\n");

        begin(&mut out, 2);
        out.extend_from_slice(b"<< /Type /Pages /Kids [3 0 R] /Count 1 >>\nendobj\n");

        let mut resources = String::from("<< /Font <<");
        for (i, _) in FONT_NAMES.iter().enumerate() {
            let _ = write!(resources, " /F{} {} 0 R", i + 1, 5 + i);
        }
        resources.push_str(" >> /ExtGState <<");
        for key in &self.alphas {
            let a = *key as f32 / 1000.0;
            let _ = write!(resources, " /GS{key} << /Type /ExtGState /ca {a} /CA {a} >>");
        }
        resources.push_str(" >> /XObject <<");
        for i in 0..self.images.len() {
            let _ = write!(resources, " /Im{i} {} 0 R", first_image + i);
        }
        resources.push_str(" >> >>");

        begin(&mut out, 3);
        let _ = write!(
            out,
            "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 {} {}] /Resources {resources} /Contents 4 0 R >>\nendobj\n",
            num(self.width),
            num(self.height),
        );

        begin(&mut out, 4);
        write_stream(&mut out, "", &content);

        for (i, name) in FONT_NAMES.iter().enumerate() {
            begin(&mut out, 5 + i);
            let _ = write!(
                out,
                "<< /Type /Font /Subtype /Type1 /BaseFont /{name} /Encoding /WinAnsiEncoding >>\nendobj\n"
            );
        }

        begin(&mut out, 9);
        let _ = write!(
            out,
            "<< /Producer (saline_valley_maps) /CreationDate ({}) >>\nendobj\n",
            Local::now().format("D:%Y%m%d%H%M%S")
        );

        for (i, image) in self.images.iter().enumerate() {
            begin(&mut out, first_image + i);
            let data = deflate(image.as_raw())?;
            let dict = format!(
                "/Type /XObject /Subtype /Image /Width {} /Height {} /ColorSpace /DeviceRGB /BitsPerComponent 8",
                image.width(),
                image.height()
            );
            write_stream(&mut out, &dict, &data);
        }

        let xref_offset = out.len();
        let _ = write!(out, "xref\n0 {object_count}\n0000000000 65535 f \n");
        for offset in offsets.iter().skip(1) {
            let _ = write!(out, "{offset:010} 00000 n \n");
        }
        let _ = write!(
            out,
            "trailer\n<< /Size {object_count} /Root 1 0 R /Info 9 0 R >>\nstartxref\n{xref_offset}\n%%EOF\n"
        );

        Ok(out)
    }
}

impl Surface for PdfSurface {
    fn fill_polygon(&mut self, points: &[Point], fill: &Fill) {
        if points.len() < 3 {
            return;
        }
        self.content.push_str("q\n");
        self.set_alpha(fill.alpha);
        let _ = writeln!(self.content, "{} rg", rgb(fill.color));
        self.path(points, true);
        self.content.push_str("f*\nQ\n");
    }

    fn stroke_path(&mut self, points: &[Point], closed: bool, stroke: &Stroke) {
        if points.len() < 2 {
            return;
        }
        self.content.push_str("q\n");
        self.set_alpha(stroke.alpha);
        let _ = writeln!(
            self.content,
            "{} RG {} w 1 j 1 J",
            rgb(stroke.color),
            num(stroke.width)
        );
        if let Some((on, off)) = stroke.dash {
            let _ = writeln!(self.content, "[{} {}] 0 d", num(on), num(off));
        }
        self.path(points, closed);
        self.content.push_str("S\nQ\n");
    }

    fn draw_image(&mut self, image: &RgbImage, rect: Rect) {
        let id = self.images.len();
        self.images.push(image.clone());
        let (x, y) = self.pt((rect.x, rect.bottom()));
        let _ = writeln!(
            self.content,
            "q\n{} 0 0 {} {} {} cm\n/Im{id} Do\nQ",
            num(rect.w),
            num(rect.h),
            num(x),
            num(y)
        );
    }

    fn draw_text(&mut self, text: &str, origin: Point, font: &Font, rotation_deg: f32) {
        let font_index = match (font.bold, font.italic) {
            (false, false) => 1,
            (true, false) => 2,
            (false, true) => 3,
            (true, true) => 4,
        };
        let (x, y) = self.pt(origin);
        let (sin, cos) = rotation_deg.to_radians().sin_cos();
        let _ = writeln!(
            self.content,
            "q\nBT\n/F{font_index} {} Tf\n{} rg\n{} {} {} {} {} {} Tm\n({}) Tj\nET\nQ",
            num(font.size),
            rgb(font.color),
            num(cos),
            num(sin),
            num(-sin),
            num(cos),
            num(x),
            num(y),
            escape_text(text)
        );
    }
}

/// Render a figure to a PDF file.
pub fn render_pdf(figure: &Figure, path: &Path) -> Result<()> {
    let mut surface = PdfSurface::new(figure.width, figure.height);
    figure.render(&mut surface);
    let bytes = surface.finish()?;
    std::fs::write(path, bytes).map_err(|e| MapError::io(path, e))
}

fn deflate(data: &[u8]) -> Result<Vec<u8>> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder
        .write_all(data)
        .and_then(|_| encoder.finish())
        .map_err(|e| MapError::io("<pdf stream>", e))
}

fn write_stream(out: &mut Vec<u8>, dict: &str, data: &[u8]) {
    let _ = write!(out, "<< {dict} /Length {} /Filter /FlateDecode >>\nstream\n", data.len());
    out.extend_from_slice(data);
    out.extend_from_slice(b"\nendstream\nendobj\n");
}

/// Compact decimal with at most 3 fractional digits.
fn num(v: f32) -> String {
    let s = format!("{:.3}", v);
    let s = s.trim_end_matches('0').trim_end_matches('.');
    if s == "-0" { "0".to_string() } else { s.to_string() }
}

fn rgb(c: [u8; 3]) -> String {
    format!(
        "{} {} {}",
        num(c[0] as f32 / 255.0),
        num(c[1] as f32 / 255.0),
        num(c[2] as f32 / 255.0)
    )
}

/// PDF literal string body in WinAnsi encoding.
fn escape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '(' | ')' | '\\' => {
                out.push('\\');
                out.push(ch);
            }
            c if c.is_ascii() && !c.is_ascii_control() => out.push(c),
            // Latin-1 supplement matches WinAnsi code points
            c if ('\u{A0}'..='\u{FF}').contains(&c) => {
                let _ = write!(out, "\\{:03o}", c as u32);
            }
            _ => out.push('?'),
        }
    }
    out
}
