//! Shaded relief: hypsometric tint combined with a directional hillshade.

use image::{ImageBuffer, Rgb, RgbImage};
use rayon::prelude::*;

use crate::grid::Grid;

// =============================================================================
// HYPSOMETRIC TINT
// =============================================================================

/// Piecewise-linear color ramp over [0, 1].
#[derive(Clone, Copy, Debug)]
pub struct ColorRamp {
    /// (position, color) pairs with increasing positions from 0.0 to 1.0
    pub stops: &'static [(f32, [u8; 3])],
}

/// Green valleys through tan and brown slopes to gray and white peaks.
pub const HYPSOMETRIC: ColorRamp = ColorRamp {
    stops: &[
        (0.0, [0x2d, 0x50, 0x16]),  // Dark green (low valleys)
        (0.15, [0x4a, 0x7c, 0x23]), // Green
        (0.25, [0x8c, 0xb3, 0x69]), // Light green
        (0.35, [0xc9, 0xb8, 0x57]), // Yellow-tan
        (0.45, [0xd4, 0xa8, 0x4b]), // Tan
        (0.55, [0xc4, 0x95, 0x6a]), // Light brown
        (0.70, [0xa6, 0x7c, 0x52]), // Brown
        (0.85, [0x8b, 0x65, 0x43]), // Dark brown
        (0.95, [0xc5, 0xc5, 0xc5]), // Gray (high peaks)
        (1.0, [0xff, 0xff, 0xff]),  // White
    ],
};

impl ColorRamp {
    /// Color at `t` as linear RGB fractions. `t` is clamped to [0, 1].
    pub fn sample(&self, t: f32) -> [f32; 3] {
        let t = t.clamp(0.0, 1.0);
        let stops = self.stops;

        let upper = stops.iter().position(|&(pos, _)| pos >= t).unwrap_or(stops.len() - 1);
        if upper == 0 {
            return to_unit(stops[0].1);
        }
        let (p0, c0) = stops[upper - 1];
        let (p1, c1) = stops[upper];
        let frac = if p1 > p0 { (t - p0) / (p1 - p0) } else { 0.0 };

        let a = to_unit(c0);
        let b = to_unit(c1);
        [
            a[0] + (b[0] - a[0]) * frac,
            a[1] + (b[1] - a[1]) * frac,
            a[2] + (b[2] - a[2]) * frac,
        ]
    }

    pub fn sample_u8(&self, t: f32) -> [u8; 3] {
        to_u8(self.sample(t))
    }
}

fn to_unit(c: [u8; 3]) -> [f32; 3] {
    [c[0] as f32 / 255.0, c[1] as f32 / 255.0, c[2] as f32 / 255.0]
}

fn to_u8(c: [f32; 3]) -> [u8; 3] {
    [
        (c[0].clamp(0.0, 1.0) * 255.0).round() as u8,
        (c[1].clamp(0.0, 1.0) * 255.0).round() as u8,
        (c[2].clamp(0.0, 1.0) * 255.0).round() as u8,
    ]
}

/// Fixed physical range the ramp spans (meters).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ElevationRange {
    pub min: f32,
    pub max: f32,
}

/// Badwater-ish floor to Sierra crest.
pub const BASIN_AND_RANGE: ElevationRange = ElevationRange { min: -100.0, max: 4000.0 };

/// Map an elevation onto [0, 1] against `range`, clipping outliers.
pub fn normalize_elevation(h: f32, range: ElevationRange) -> f32 {
    ((h - range.min) / (range.max - range.min)).clamp(0.0, 1.0)
}

// =============================================================================
// HILLSHADE
// =============================================================================

/// Directional light for the hillshade.
#[derive(Clone, Copy, Debug)]
pub struct LightSource {
    /// Azimuth in degrees clockwise from north
    pub azimuth_deg: f64,
    /// Altitude in degrees above the horizon
    pub altitude_deg: f64,
    pub vertical_exaggeration: f64,
    /// Cell spacing used for gradients
    pub dx: f64,
    pub dy: f64,
}

impl Default for LightSource {
    /// Northwest light, 35 degrees up, 2x exaggeration.
    fn default() -> Self {
        Self {
            azimuth_deg: 315.0,
            altitude_deg: 35.0,
            vertical_exaggeration: 2.0,
            dx: 1.0,
            dy: 1.0,
        }
    }
}

impl LightSource {
    /// Unit vector toward the light (x east, y north, z up).
    pub fn direction(&self) -> [f64; 3] {
        let az = (90.0 - self.azimuth_deg).to_radians();
        let alt = self.altitude_deg.to_radians();
        [az.cos() * alt.cos(), az.sin() * alt.cos(), alt.sin()]
    }
}

/// Central-difference derivative along one axis, one-sided at the edges.
fn derivative(values: impl Fn(usize) -> f64, n: usize, i: usize, spacing: f64) -> f64 {
    if i == 0 {
        (values(1) - values(0)) / spacing
    } else if i == n - 1 {
        (values(n - 1) - values(n - 2)) / spacing
    } else {
        (values(i + 1) - values(i - 1)) / (2.0 * spacing)
    }
}

/// Illumination intensity in [0, 1] for every cell, contrast-stretched so the
/// darkest cell is 0 and the brightest is 1. Row 0 is the southern edge, so
/// the azimuth is a true compass bearing. Grids must be at least 2x2.
pub fn hillshade(elevation: &Grid<f32>, light: &LightSource) -> Grid<f32> {
    let width = elevation.width;
    let height = elevation.height;
    let exag = light.vertical_exaggeration;
    let dir = light.direction();
    let src = elevation.as_slice();
    let h = |x: usize, y: usize| exag * src[y * width + x] as f64;

    let mut intensity = Grid::new_with(width, height, 0.0f32);
    intensity
        .as_mut_slice()
        .par_chunks_mut(width)
        .enumerate()
        .for_each(|(y, row)| {
            for (x, out) in row.iter_mut().enumerate() {
                let e_dx = derivative(|i| h(i, y), width, x, light.dx);
                let e_dy = derivative(|j| h(x, j), height, y, light.dy);
                let len = (e_dx * e_dx + e_dy * e_dy + 1.0).sqrt();
                let n = [-e_dx / len, -e_dy / len, 1.0 / len];
                *out = (n[0] * dir[0] + n[1] * dir[1] + n[2] * dir[2]) as f32;
            }
        });

    let (imin, imax) = intensity.min_max();
    let range = imax - imin;
    for v in intensity.as_mut_slice() {
        if range > 1e-6 {
            *v = (*v - imin) / range;
        }
        *v = v.clamp(0.0, 1.0);
    }
    intensity
}

/// Soft-light blend of a base color with an illumination intensity.
pub fn soft_light(rgb: [f32; 3], intensity: f32) -> [f32; 3] {
    let i = intensity;
    rgb.map(|c| 2.0 * i * c + (1.0 - 2.0 * i) * c * c)
}

// =============================================================================
// SHADED RELIEF
// =============================================================================

/// Render the DEM as a tinted, hillshaded image. The image is north-up: image
/// row 0 is the last (northernmost) grid row.
pub fn shade_relief(
    elevation: &Grid<f32>,
    ramp: &ColorRamp,
    range: ElevationRange,
    light: &LightSource,
) -> RgbImage {
    let width = elevation.width;
    let height = elevation.height;
    let intensity = hillshade(elevation, light);

    let mut img: RgbImage = ImageBuffer::new(width as u32, height as u32);
    for y in 0..height {
        let row = height - 1 - y;
        for x in 0..width {
            let t = normalize_elevation(*elevation.get(x, row), range);
            let shaded = soft_light(ramp.sample(t), *intensity.get(x, row));
            img.put_pixel(x as u32, y as u32, Rgb(to_u8(shaded)));
        }
    }
    img
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalization_clips_extremes() {
        assert_eq!(normalize_elevation(-500.0, BASIN_AND_RANGE), 0.0);
        assert_eq!(normalize_elevation(-100.0, BASIN_AND_RANGE), 0.0);
        assert_eq!(normalize_elevation(4000.0, BASIN_AND_RANGE), 1.0);
        assert_eq!(normalize_elevation(9000.0, BASIN_AND_RANGE), 1.0);
        assert!((normalize_elevation(1950.0, BASIN_AND_RANGE) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_normalized_grid_always_in_unit_range() {
        let grid = Grid::from_fn(8, 8, |x, y| -2000.0 + (x * 8 + y) as f32 * 150.0);
        for (_, _, &h) in grid.iter() {
            let t = normalize_elevation(h, BASIN_AND_RANGE);
            assert!((0.0..=1.0).contains(&t));
        }
    }

    #[test]
    fn test_ramp_endpoints_and_interpolation() {
        assert_eq!(HYPSOMETRIC.sample_u8(0.0), [0x2d, 0x50, 0x16]);
        assert_eq!(HYPSOMETRIC.sample_u8(1.0), [0xff, 0xff, 0xff]);
        assert_eq!(HYPSOMETRIC.sample_u8(-3.0), [0x2d, 0x50, 0x16]);
        assert_eq!(HYPSOMETRIC.sample_u8(0.45), [0xd4, 0xa8, 0x4b]);

        // Halfway between the gray and white stops
        let mid = HYPSOMETRIC.sample_u8(0.975);
        assert!(mid[0] > 0xc5 && mid[0] < 0xff);
    }

    #[test]
    fn test_light_from_northwest() {
        let dir = LightSource::default().direction();
        assert!(dir[0] < 0.0, "light should come from the west");
        assert!(dir[1] > 0.0, "light should come from the north");
        let len = (dir[0] * dir[0] + dir[1] * dir[1] + dir[2] * dir[2]).sqrt();
        assert!((len - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_flat_hillshade_is_uniform() {
        let flat = Grid::new_with(6, 5, 1500.0f32);
        let shade = hillshade(&flat, &LightSource::default());
        let first = *shade.get(0, 0);
        assert!(shade.as_slice().iter().all(|&v| v == first));
    }

    #[test]
    fn test_slope_facing_light_is_brighter() {
        // Elevation rises to the east, so slopes face west toward the light
        let west_facing = Grid::from_fn(5, 5, |x, _| x as f32 * 0.2);
        // And a hump whose west flank should beat its east flank
        let hump = Grid::from_fn(9, 3, |x, _| 4.0 - (x as f32 - 4.0).abs());
        let shade = hillshade(&hump, &LightSource::default());
        assert!(shade.get(2, 1) > shade.get(6, 1));

        let shade = hillshade(&west_facing, &LightSource::default());
        let first = *shade.get(2, 2);
        assert!(shade.as_slice().iter().all(|&v| (v - first).abs() < 1e-6));
    }

    #[test]
    fn test_north_flank_lit_with_row_zero_south() {
        // East-west ridge; rows increase northward
        let ridge = Grid::from_fn(3, 9, |_, y| 4.0 - (y as f32 - 4.0).abs());
        let shade = hillshade(&ridge, &LightSource::default());
        assert!(shade.get(1, 6) > shade.get(1, 2), "north flank should face the light");
    }

    #[test]
    fn test_soft_light_bounds() {
        assert_eq!(soft_light([0.5, 0.0, 1.0], 0.5), [0.5, 0.0, 1.0]);
        let dark = soft_light([0.6, 0.6, 0.6], 0.0);
        assert!((dark[0] - 0.36).abs() < 1e-6);
        let bright = soft_light([0.6, 0.6, 0.6], 1.0);
        assert!((bright[0] - 0.84).abs() < 1e-6);
    }

    #[test]
    fn test_shaded_relief_is_north_up() {
        // Low in the south, high in the north
        let elevation = Grid::from_fn(4, 4, |_, y| y as f32 * 1300.0);
        let img = shade_relief(&elevation, &HYPSOMETRIC, BASIN_AND_RANGE, &LightSource::default());
        assert_eq!(img.dimensions(), (4, 4));
        // Top row is the high end of the ramp (gray/white), bottom row the green end
        let top = img.get_pixel(1, 0).0;
        let bottom = img.get_pixel(1, 3).0;
        assert!(bottom[1] > bottom[2], "valley floor should be green");
        assert!(top[2] >= bottom[2]);
    }
}
