//! The two Saline Valley figures and the run loop that saves them.
//!
//! Both figures share a frame, graticule, territory layer, legend, north
//! arrow and scale bar. The geologic map adds the shaded synthetic DEM, fault
//! traces and an elevation colorbar.

use std::fs;
use std::path::{Path, PathBuf};

use geo::{Distance, Haversine, Point as GeoPoint};
use image::{ImageBuffer, Rgb, RgbImage};
use tracing::info;

use crate::config::RunConfig;
use crate::error::{MapError, Result};
use crate::figure::{
    text_width, Aspect, Figure, Fill, Font, Frame, HAlign, Placement, Point, Rect, Stroke, VAlign, BLACK,
    WHITE,
};
use crate::grid::{Extent, GeoGrid};
use crate::pdf::render_pdf;
use crate::raster::render_png;
use crate::shading::{self, LightSource, BASIN_AND_RANGE, HYPSOMETRIC};
use crate::terrain::{self, TerrainParams};
use crate::territory::{Place, FAULTS, GEOLOGIC_PLACES, TERRITORIAL_PLACES, TERRITORIES};

const FAULT_COLOR: [u8; 3] = [0x8B, 0x00, 0x00];

/// Which figure to produce.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MapKind {
    /// Territories on a plain background
    Territories,
    /// Territories over shaded synthetic relief
    Geologic,
}

impl MapKind {
    /// Output file name without extension.
    pub fn file_stem(&self) -> &'static str {
        match self {
            MapKind::Territories => "saline_valley_territories",
            MapKind::Geologic => "saline_valley_territories_geo",
        }
    }
}

/// Settings for the synthetic DEM behind the geologic map.
#[derive(Clone, Debug)]
pub struct DemOptions {
    pub params: TerrainParams,
    pub grid_width: usize,
    pub grid_height: usize,
    pub seed: u64,
}

impl Default for DemOptions {
    fn default() -> Self {
        Self {
            params: TerrainParams::default(),
            grid_width: 360,
            grid_height: 400,
            seed: 0,
        }
    }
}

// =============================================================================
// SHARED LAYERS
// =============================================================================

/// A text label placed on the map.
struct RangeLabel {
    text: &'static str,
    lon: f64,
    lat: f64,
    rotation_deg: f32,
}

/// Styling that differs between the two figures.
struct Style {
    territory_alpha: f32,
    territory_edge: f32,
    graticule: Stroke,
    place_radius: f32,
}

fn frame_border(fig: &mut Figure, frame: &Frame) {
    fig.rect(frame.rect, None, Some(Stroke::solid(BLACK, 0.8)));
}

/// Graticule every 0.2 degrees plus ticks, tick labels and axis titles.
fn axes(fig: &mut Figure, frame: &Frame, graticule: Stroke, x_title: &str, y_title: &str) {
    let extent = frame.extent;
    let tick_font = Font::regular(8.0);
    let step = 0.2;

    let lon_ticks = ticks(extent.lon_min, extent.lon_max, step);
    let lat_ticks = ticks(extent.lat_min, extent.lat_max, step);

    for &lon in &lon_ticks {
        let top = frame.project(lon, extent.lat_max);
        let bottom = frame.project(lon, extent.lat_min);
        fig.line(top, bottom, graticule);
        fig.line(bottom, (bottom.0, bottom.1 + 3.5), Stroke::solid(BLACK, 0.8));
        fig.text(
            &format!("{:.1}°W", lon.abs()),
            (bottom.0, bottom.1 + 5.0),
            tick_font,
            Placement { h: HAlign::Center, v: VAlign::Top, rotation_deg: 0.0 },
        );
    }
    for &lat in &lat_ticks {
        let left = frame.project(extent.lon_min, lat);
        let right = frame.project(extent.lon_max, lat);
        fig.line(left, right, graticule);
        fig.line(left, (left.0 - 3.5, left.1), Stroke::solid(BLACK, 0.8));
        fig.text(
            &format!("{:.1}°N", lat),
            (left.0 - 5.0, left.1),
            tick_font,
            Placement { h: HAlign::Right, v: VAlign::Center, rotation_deg: 0.0 },
        );
    }

    let rect = frame.rect;
    fig.text(
        x_title,
        (rect.x + rect.w / 2.0, rect.bottom() + 20.0),
        Font::regular(10.5),
        Placement { h: HAlign::Center, v: VAlign::Top, rotation_deg: 0.0 },
    );
    fig.text(
        y_title,
        (rect.x - 48.0, rect.y + rect.h / 2.0),
        Font::regular(10.5),
        Placement::CENTER.rotated(90.0),
    );
}

/// Tick positions `start, start + step, ...` up to `stop` inclusive.
fn ticks(start: f64, stop: f64, step: f64) -> Vec<f64> {
    let count = ((stop - start) / step + 1e-9).floor() as usize;
    (0..=count).map(|i| start + i as f64 * step).collect()
}

fn territory_layer(fig: &mut Figure, frame: &Frame, style: &Style) {
    for territory in TERRITORIES.iter() {
        fig.polygon(
            frame.project_all(territory.vertices),
            Some(Fill { color: territory.color, alpha: style.territory_alpha }),
            Some(Stroke::solid(BLACK, style.territory_edge).with_alpha(style.territory_alpha)),
        );
    }
}

fn place_layer(fig: &mut Figure, frame: &Frame, places: &[Place], style: &Style, label_for: impl Fn(&Place) -> (Point, Font, Fill)) {
    for place in places {
        if !frame.extent.contains(place.lon, place.lat) {
            continue;
        }
        let at = frame.project(place.lon, place.lat);
        fig.dot(at, style.place_radius, BLACK);

        let (offset, font, background) = label_for(place);
        // Offsets are in points with y up
        let anchor = (at.0 + offset.0, at.1 - offset.1);
        fig.text_boxed(place.name, anchor, font, Placement::LEFT_BOTTOM, Some(background), 2.5);
    }
}

fn range_labels(fig: &mut Figure, frame: &Frame, labels: &[RangeLabel], font_for: impl Fn(&RangeLabel) -> Font, background: Option<Fill>) {
    for label in labels {
        let at = frame.project(label.lon, label.lat);
        fig.text_boxed(
            label.text,
            at,
            font_for(label),
            Placement::CENTER.rotated(label.rotation_deg),
            background,
            2.0,
        );
    }
}

fn north_arrow(fig: &mut Figure, frame: &Frame) {
    let tail = frame.project(-116.95, 37.45);
    let head = frame.project(-116.95, 37.65);
    fig.arrow(tail, head, Stroke::solid(BLACK, 2.0));
    fig.text(
        "N",
        frame.project(-116.95, 37.7),
        Font::bold(12.0),
        Placement { h: HAlign::Center, v: VAlign::Bottom, rotation_deg: 0.0 },
    );
}

/// Great-circle length of an east-west bar at `lat`, in kilometers.
pub fn scale_bar_km(lon: f64, lat: f64, length_deg: f64) -> f64 {
    Haversine.distance(GeoPoint::new(lon, lat), GeoPoint::new(lon + length_deg, lat)) / 1000.0
}

fn scale_bar(fig: &mut Figure, frame: &Frame, lat: f64, outlined: bool) {
    let (lon, length) = (-118.4, 0.5);
    let start = frame.project(lon, lat);
    let end = frame.project(lon + length, lat);
    let label = format!("~{:.0} km", scale_bar_km(lon, lat, length));
    let label_at = frame.project(lon + length / 2.0, lat - if outlined { 0.07 } else { 0.08 });

    if outlined {
        fig.line(start, end, Stroke::solid(BLACK, 4.0));
        fig.line(start, end, Stroke::solid(WHITE, 2.0));
        fig.text_boxed(
            &label,
            label_at,
            Font::bold(9.0),
            Placement::CENTER,
            Some(Fill { color: WHITE, alpha: 0.8 }),
            2.0,
        );
    } else {
        fig.line(start, end, Stroke::solid(BLACK, 3.0));
        fig.text(&label, label_at, Font::regular(8.0), Placement::CENTER);
    }
}

/// Legend swatch: either a filled patch or a line sample.
enum Swatch {
    Patch { color: [u8; 3], alpha: f32 },
    Line(Stroke),
}

/// Framed legend in the lower-right corner of the axes.
fn legend(fig: &mut Figure, frame: &Frame, entries: &[(Swatch, &str)]) {
    let font = Font::regular(9.0);
    let row = 15.0;
    let swatch_w = 20.0;
    let pad = 6.0;
    let text_w = entries
        .iter()
        .map(|(_, label)| text_width(label, font.size))
        .fold(0.0, f32::max);
    let w = pad * 3.0 + swatch_w + text_w;
    let h = pad * 2.0 + row * entries.len() as f32;
    let x = frame.rect.right() - 8.0 - w;
    let y = frame.rect.bottom() - 8.0 - h;

    fig.rect(
        Rect::new(x, y, w, h),
        Some(Fill { color: WHITE, alpha: 0.95 }),
        Some(Stroke::solid(BLACK, 0.8)),
    );

    for (i, (swatch, label)) in entries.iter().enumerate() {
        let cy = y + pad + row * (i as f32 + 0.5);
        let sx = x + pad;
        match swatch {
            Swatch::Patch { color, alpha } => fig.rect(
                Rect::new(sx, cy - 4.5, swatch_w, 9.0),
                Some(Fill { color: *color, alpha: *alpha }),
                Some(Stroke::solid(BLACK, 0.8).with_alpha(*alpha)),
            ),
            Swatch::Line(stroke) => fig.line((sx, cy), (sx + swatch_w, cy), *stroke),
        }
        fig.text(label, (sx + swatch_w + pad, cy), font, Placement::LEFT_CENTER);
    }
}

fn territory_legend_entries(alpha: f32) -> Vec<(Swatch, &'static str)> {
    TERRITORIES
        .iter()
        .map(|t| (Swatch::Patch { color: t.color, alpha }, t.name))
        .collect()
}

fn title(fig: &mut Figure, text: &str, size: f32) {
    fig.text(
        text,
        (fig.width / 2.0, 24.0),
        Font::bold(size),
        Placement { h: HAlign::Center, v: VAlign::Top, rotation_deg: 0.0 },
    );
}

fn source_note(fig: &mut Figure, text: &str, color: [u8; 3]) {
    let at = (fig.width / 2.0, fig.height * 0.98);
    fig.text(
        text,
        at,
        Font::italic(8.0).with_color(color),
        Placement { h: HAlign::Center, v: VAlign::Bottom, rotation_deg: 0.0 },
    );
}

// =============================================================================
// TERRITORIAL MAP
// =============================================================================

/// Simplified territorial map on a plain background.
pub fn territory_map() -> Figure {
    let mut fig = Figure::new(10.0, 12.0);
    let extent = Extent::SALINE_VALLEY;
    let available = Rect::new(80.0, 72.0, fig.width - 105.0, fig.height - 150.0);
    let frame = Frame::fit(available, extent, Aspect::Equal);
    let style = Style {
        territory_alpha: 0.4,
        territory_edge: 1.5,
        graticule: Stroke::dashed([0xb0, 0xb0, 0xb0], 0.8).with_alpha(0.3),
        place_radius: 3.0,
    };

    title(
        &mut fig,
        "Indigenous Territories of the Saline Valley Region\nSimplified boundaries based on ethnographic sources",
        12.0,
    );
    axes(&mut fig, &frame, style.graticule, "Longitude (°W)", "Latitude (°N)");
    territory_layer(&mut fig, &frame, &style);

    place_layer(&mut fig, &frame, &TERRITORIAL_PLACES, &style, |place| {
        let plain = Fill { color: WHITE, alpha: 0.7 };
        if place.emphasis {
            ((5.0, 5.0), Font::bold(9.0), Fill { color: WHITE, alpha: 0.8 })
        } else if place.name == "Owens Lake" {
            ((-40.0, -15.0), Font::regular(8.0), plain)
        } else {
            ((5.0, -10.0), Font::regular(8.0), plain)
        }
    });

    let grey = [0x55, 0x55, 0x55];
    range_labels(
        &mut fig,
        &frame,
        &[
            RangeLabel { text: "Sierra Nevada", lon: -118.5, lat: 37.1, rotation_deg: 70.0 },
            RangeLabel { text: "Inyo\nMountains", lon: -117.35, lat: 36.9, rotation_deg: 0.0 },
            RangeLabel { text: "Panamint\nRange", lon: -117.15, lat: 36.35, rotation_deg: 0.0 },
        ],
        |label| {
            let size = if label.rotation_deg == 0.0 { 7.0 } else { 8.0 };
            Font::italic(size).with_color(grey)
        },
        None,
    );

    legend(&mut fig, &frame, &territory_legend_entries(style.territory_alpha));
    north_arrow(&mut fig, &frame);
    scale_bar(&mut fig, &frame, 35.95, false);
    frame_border(&mut fig, &frame);
    source_note(
        &mut fig,
        "Sources: Kroeber (1925), Steward (1933, 1938), Zigmond (1981), Native Land Digital",
        [0x66, 0x66, 0x66],
    );

    fig
}

// =============================================================================
// GEOLOGIC MAP
// =============================================================================

/// Shaded synthetic DEM of the study area, north-up.
pub fn shaded_basemap(options: &DemOptions) -> Result<RgbImage> {
    let mesh = GeoGrid::new(Extent::SALINE_VALLEY, options.grid_width, options.grid_height)?;
    let elevation = terrain::synthesize(&mesh, &options.params, options.seed);
    info!("Shading relief...");
    Ok(shading::shade_relief(&elevation, &HYPSOMETRIC, BASIN_AND_RANGE, &LightSource::default()))
}

/// Horizontal ramp strip for the colorbar.
fn colorbar_image() -> RgbImage {
    ImageBuffer::from_fn(256, 1, |x, _| Rgb(HYPSOMETRIC.sample_u8(x as f32 / 255.0)))
}

fn colorbar(fig: &mut Figure) {
    // Figure-fraction placement, measured from the bottom left
    let rect = Rect::new(
        fig.width * 0.15,
        fig.height * (1.0 - 0.06 - 0.015),
        fig.width * 0.25,
        fig.height * 0.015,
    );
    fig.image(colorbar_image(), rect);
    fig.rect(rect, None, Some(Stroke::solid(BLACK, 0.8)));

    let (lo, hi) = (BASIN_AND_RANGE.min, BASIN_AND_RANGE.max);
    let mut tick = 0.0f32;
    while tick <= hi {
        let x = rect.x + (tick - lo) / (hi - lo) * rect.w;
        fig.line((x, rect.bottom()), (x, rect.bottom() + 3.0), Stroke::solid(BLACK, 0.8));
        fig.text(
            &format!("{tick:.0}"),
            (x, rect.bottom() + 4.0),
            Font::regular(8.0),
            Placement { h: HAlign::Center, v: VAlign::Top, rotation_deg: 0.0 },
        );
        tick += 1000.0;
    }
    fig.text(
        "Elevation (m)",
        (rect.x + rect.w / 2.0, rect.bottom() + 15.0),
        Font::regular(9.0),
        Placement { h: HAlign::Center, v: VAlign::Top, rotation_deg: 0.0 },
    );
}

/// Territories over a shaded Basin and Range basemap.
pub fn geologic_map(options: &DemOptions) -> Result<Figure> {
    let mut fig = Figure::new(11.0, 13.0);
    let extent = Extent::SALINE_VALLEY;
    let available = Rect::new(80.0, 72.0, fig.width - 105.0, fig.height * (1.0 - 0.14) - 72.0);
    let frame = Frame::fit(available, extent, Aspect::Auto);
    let style = Style {
        territory_alpha: 0.35,
        territory_edge: 1.8,
        graticule: Stroke::dotted(WHITE, 0.8).with_alpha(0.4),
        place_radius: 2.5,
    };

    let basemap = shaded_basemap(options)?;
    fig.image(basemap, frame.rect);

    title(
        &mut fig,
        "Indigenous Territories of the Saline Valley Region\nBasin and Range Geological Province",
        13.0,
    );
    territory_layer(&mut fig, &frame, &style);

    let fault_stroke = Stroke::dashed(FAULT_COLOR, 1.5).with_alpha(0.7);
    for fault in FAULTS.iter() {
        fig.polyline(frame.project_all(fault.trace), fault_stroke);
    }

    axes(&mut fig, &frame, style.graticule, "Longitude", "Latitude");

    place_layer(&mut fig, &frame, &GEOLOGIC_PLACES, &style, |place| {
        let font = if place.emphasis { Font::bold(10.0) } else { Font::regular(8.0) };
        ((6.0, 4.0), font, Fill { color: WHITE, alpha: 0.85 })
    });

    range_labels(
        &mut fig,
        &frame,
        &[
            RangeLabel { text: "SIERRA\nNEVADA", lon: -118.5, lat: 37.15, rotation_deg: 70.0 },
            RangeLabel { text: "INYO\nMTS", lon: -117.78, lat: 36.95, rotation_deg: 80.0 },
            RangeLabel { text: "PANAMINT\nRANGE", lon: -117.15, lat: 36.35, rotation_deg: 75.0 },
            RangeLabel { text: "WHITE\nMTS", lon: -118.2, lat: 37.55, rotation_deg: 0.0 },
        ],
        |label| {
            let size = if label.text.starts_with("SIERRA") { 9.0 } else { 8.0 };
            Font::bold(size).with_color([0x33, 0x33, 0x33])
        },
        Some(Fill { color: WHITE, alpha: 0.6 }),
    );

    let mut entries = territory_legend_entries(style.territory_alpha);
    entries.push((Swatch::Line(Stroke::dashed(FAULT_COLOR, 1.5)), "Major Faults"));
    legend(&mut fig, &frame, &entries);

    north_arrow(&mut fig, &frame);
    scale_bar(&mut fig, &frame, 35.92, true);
    frame_border(&mut fig, &frame);
    colorbar(&mut fig);
    source_note(
        &mut fig,
        "Territories: Kroeber (1925), Steward (1933, 1938), Zigmond (1981) | \
         Topography: Synthetic DEM representing Basin and Range structure",
        [0x44, 0x44, 0x44],
    );

    Ok(fig)
}

// =============================================================================
// OUTPUT
// =============================================================================

/// Write `<stem>.pdf` and `<stem>.png` into `dir`. Returns both paths.
pub fn save_figure(figure: &Figure, dir: &Path, stem: &str, dpi: f32) -> Result<Vec<PathBuf>> {
    let pdf_path = dir.join(format!("{stem}.pdf"));
    let png_path = dir.join(format!("{stem}.png"));

    render_pdf(figure, &pdf_path)?;
    render_png(figure, dpi, &png_path)?;

    Ok(vec![pdf_path, png_path])
}

/// Files written for one figure.
#[derive(Clone, Debug)]
pub struct SavedFigure {
    pub kind: MapKind,
    pub files: Vec<PathBuf>,
}

/// Build and save every requested figure.
pub fn run(config: &RunConfig) -> Result<Vec<SavedFigure>> {
    fs::create_dir_all(&config.output_dir).map_err(|e| MapError::io(&config.output_dir, e))?;

    let mut saved = Vec::new();
    for &kind in &config.maps {
        info!("Building {:?} map...", kind);
        let figure = match kind {
            MapKind::Territories => territory_map(),
            MapKind::Geologic => geologic_map(&config.dem)?,
        };
        info!("Rendering {} at {} dpi...", kind.file_stem(), config.dpi);
        let files = save_figure(&figure, &config.output_dir, kind.file_stem(), config.dpi)?;
        saved.push(SavedFigure { kind, files });
    }
    Ok(saved)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::figure::Mark;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("saline-maps-{}-{name}", std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        dir
    }

    fn small_dem() -> DemOptions {
        DemOptions {
            grid_width: 36,
            grid_height: 40,
            seed: 7,
            ..DemOptions::default()
        }
    }

    fn texts(fig: &Figure) -> Vec<String> {
        fig.marks
            .iter()
            .filter_map(|m| match m {
                Mark::Text { text, .. } => Some(text.clone()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_ticks_cover_extent() {
        let lon = ticks(-118.6, -116.8, 0.2);
        assert_eq!(lon.len(), 10);
        assert!((lon[9] - -116.8).abs() < 1e-9);
        assert_eq!(ticks(35.8, 37.8, 0.2).len(), 11);
    }

    #[test]
    fn test_scale_bar_length() {
        let km = scale_bar_km(-118.4, 35.95, 0.5);
        assert!((40.0..50.0).contains(&km), "{km} km");
    }

    #[test]
    fn test_territory_map_contents() {
        let fig = territory_map();
        let labels = texts(&fig);
        for t in TERRITORIES.iter() {
            assert!(labels.iter().any(|l| l == t.name), "legend missing {}", t.name);
        }
        assert!(labels.iter().any(|l| l == "Saline Valley"));
        // Off-map place is skipped
        assert!(!labels.iter().any(|l| l == "Mono Lake"));
        assert!(!fig.marks.iter().any(|m| matches!(m, Mark::Image { .. })));
    }

    #[test]
    fn test_place_label_sits_above_right_of_marker() {
        let mut fig = Figure::new(4.0, 4.0);
        let frame = Frame::fit(Rect::new(0.0, 0.0, 288.0, 288.0), Extent::SALINE_VALLEY, Aspect::Auto);
        let style = Style {
            territory_alpha: 0.4,
            territory_edge: 1.5,
            graticule: Stroke::solid(BLACK, 0.5),
            place_radius: 3.0,
        };
        let saline = [TERRITORIAL_PLACES[0]];
        place_layer(&mut fig, &frame, &saline, &style, |_| {
            ((5.0, 5.0), Font::bold(9.0), Fill { color: WHITE, alpha: 0.8 })
        });

        let marker = frame.project(saline[0].lon, saline[0].lat);
        let origin = fig
            .marks
            .iter()
            .find_map(|m| match m {
                Mark::Text { origin, .. } => Some(*origin),
                _ => None,
            })
            .unwrap();
        // Left edge at the offset, baseline above the bottom-anchored point
        assert!((origin.0 - (marker.0 + 5.0)).abs() < 1e-4);
        assert!(origin.1 < marker.1 - 5.0);
    }

    #[test]
    fn test_geologic_map_contents() {
        let fig = geologic_map(&small_dem()).unwrap();
        let images = fig.marks.iter().filter(|m| matches!(m, Mark::Image { .. })).count();
        // Basemap and colorbar
        assert_eq!(images, 2);
        if let Some(Mark::Image { image, .. }) = fig.marks.first() {
            assert_eq!(image.dimensions(), (36, 40));
        } else {
            panic!("basemap should be drawn first");
        }
        let labels = texts(&fig);
        assert!(labels.iter().any(|l| l == "Major Faults"));
        assert!(labels.iter().any(|l| l == "(dry)"));
        assert!(labels.iter().any(|l| l == "Elevation (m)"));
    }

    #[test]
    fn test_geologic_map_rejects_degenerate_grid() {
        let options = DemOptions { grid_width: 1, ..small_dem() };
        assert!(matches!(geologic_map(&options), Err(MapError::GridTooSmall { .. })));
    }

    #[test]
    fn test_save_figure_writes_pdf_and_png() {
        let dir = scratch_dir("save");
        fs::create_dir_all(&dir).unwrap();

        let files = save_figure(&territory_map(), &dir, "territories", 20.0).unwrap();
        assert_eq!(files.len(), 2);
        assert_eq!(files[0].extension().unwrap(), "pdf");
        assert_eq!(files[1].extension().unwrap(), "png");

        let on_disk = fs::read_dir(&dir).unwrap().count();
        assert_eq!(on_disk, 2);
        let pdf = fs::read(&files[0]).unwrap();
        assert!(pdf.starts_with(b"%PDF-"));
        let png = image::open(&files[1]).unwrap();
        assert_eq!(png.width(), 200);
        assert_eq!(png.height(), 240);

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_run_writes_both_figures() {
        let dir = scratch_dir("run");
        let config = RunConfig {
            output_dir: dir.join("nested"),
            maps: vec![MapKind::Territories, MapKind::Geologic],
            dpi: 15.0,
            dem: small_dem(),
            geojson: None,
        };
        let saved = run(&config).unwrap();
        assert_eq!(saved.len(), 2);
        for figure in &saved {
            assert_eq!(figure.files.len(), 2);
            for file in &figure.files {
                assert!(file.exists(), "{} missing", file.display());
                let name = file.file_stem().unwrap().to_string_lossy().into_owned();
                assert_eq!(name, figure.kind.file_stem());
            }
        }
        assert_eq!(fs::read_dir(&config.output_dir).unwrap().count(), 4);

        fs::remove_dir_all(&dir).unwrap();
    }
}
