//! Synthetic Basin and Range terrain.
//!
//! The surface is illustrative, not survey data. It is built in layers:
//! 1. Uniform base elevation
//! 2. Highlands raised with element-wise max (overlapping ranges never cancel)
//! 3. Basins carved with element-wise min (valleys cut into the ranges)
//! 4. Gaussian smoothing to hide mask edges
//! 5. Low-amplitude smoothed noise for texture
//!
//! Features are applied in list order, so a later feature wins inside the
//! part of its mask that overlaps an earlier one.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rand_distr::StandardNormal;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::grid::{GeoGrid, Grid};

// =============================================================================
// TERRAIN PARAMETERS
// =============================================================================

/// Elevation profile of a single feature, in meters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Profile {
    /// North-south ridge (or trough, with negative amplitude):
    /// `base + amplitude * exp(-(lon - axis_lon)^2 / spread)`
    Ridge {
        base: f64,
        amplitude: f64,
        axis_lon: f64,
        spread: f64,
    },
    /// Bowl rising linearly away from a floor point:
    /// `floor + gradient * d` with `d` the stretched distance to `center`.
    Bowl {
        center: (f64, f64),
        stretch: (f64, f64),
        floor: f64,
        gradient: f64,
    },
}

impl Profile {
    pub fn elevation(&self, lon: f64, lat: f64) -> f64 {
        match *self {
            Profile::Ridge { base, amplitude, axis_lon, spread } => {
                let dx = lon - axis_lon;
                base + amplitude * (-(dx * dx) / spread).exp()
            }
            Profile::Bowl { center, stretch, floor, gradient } => {
                floor + gradient * stretched_distance(lon, lat, center, stretch)
            }
        }
    }
}

/// Region a feature is confined to.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Mask {
    Everywhere,
    /// Open box; a missing side is unbounded.
    Bounds {
        west: Option<f64>,
        east: Option<f64>,
        south: Option<f64>,
        north: Option<f64>,
    },
    /// `|lon - axis_lon| < half_width`
    Band { axis_lon: f64, half_width: f64 },
    /// Stretched distance to `center` below `radius`.
    Ellipse {
        center: (f64, f64),
        stretch: (f64, f64),
        radius: f64,
    },
}

impl Mask {
    pub fn contains(&self, lon: f64, lat: f64) -> bool {
        match *self {
            Mask::Everywhere => true,
            Mask::Bounds { west, east, south, north } => {
                west.map_or(true, |w| lon > w)
                    && east.map_or(true, |e| lon < e)
                    && south.map_or(true, |s| lat > s)
                    && north.map_or(true, |n| lat < n)
            }
            Mask::Band { axis_lon, half_width } => (lon - axis_lon).abs() < half_width,
            Mask::Ellipse { center, stretch, radius } => {
                stretched_distance(lon, lat, center, stretch) < radius
            }
        }
    }
}

/// Scales a profile by `clamp(1 - rate * |lat - center_lat|, min, max)`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LatitudeTaper {
    pub center_lat: f64,
    pub rate: f64,
    pub min: f64,
    pub max: f64,
}

impl LatitudeTaper {
    pub fn factor(&self, lat: f64) -> f64 {
        (1.0 - self.rate * (lat - self.center_lat).abs()).clamp(self.min, self.max)
    }
}

/// A named mountain range or basin.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TerrainFeature {
    pub name: String,
    pub profile: Profile,
    pub mask: Mask,
    #[serde(default)]
    pub taper: Option<LatitudeTaper>,
}

impl TerrainFeature {
    /// Feature elevation at a point, or `None` outside its mask.
    pub fn sample(&self, lon: f64, lat: f64) -> Option<f64> {
        if !self.mask.contains(lon, lat) {
            return None;
        }
        let elev = self.profile.elevation(lon, lat);
        Some(match &self.taper {
            Some(taper) => elev * taper.factor(lat),
            None => elev,
        })
    }
}

fn stretched_distance(lon: f64, lat: f64, center: (f64, f64), stretch: (f64, f64)) -> f64 {
    let dx = (lon - center.0) / stretch.0;
    let dy = (lat - center.1) / stretch.1;
    (dx * dx + dy * dy).sqrt()
}

/// Parameters for terrain synthesis
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TerrainParams {
    /// Starting elevation of the whole grid (meters)
    pub base_elevation: f32,
    /// Raised with element-wise max, in order
    pub highlands: Vec<TerrainFeature>,
    /// Carved with element-wise min, in order
    pub basins: Vec<TerrainFeature>,
    /// Gaussian sigma (cells) applied after composition
    pub smoothing_sigma: f64,
    /// Standard deviation of the texture noise (meters); 0 disables it
    pub noise_amplitude: f32,
    /// Gaussian sigma (cells) applied to the noise field
    pub noise_sigma: f64,
}

impl Default for TerrainParams {
    fn default() -> Self {
        Self {
            base_elevation: 1000.0,
            highlands: default_highlands(),
            basins: default_basins(),
            smoothing_sigma: 2.0,
            noise_amplitude: 50.0,
            noise_sigma: 1.5,
        }
    }
}

fn ridge(name: &str, base: f64, amplitude: f64, axis_lon: f64, spread: f64, mask: Mask) -> TerrainFeature {
    TerrainFeature {
        name: name.to_string(),
        profile: Profile::Ridge { base, amplitude, axis_lon, spread },
        mask,
        taper: None,
    }
}

fn bowl(name: &str, center: (f64, f64), stretch: (f64, f64), floor: f64, gradient: f64, mask: Mask) -> TerrainFeature {
    TerrainFeature {
        name: name.to_string(),
        profile: Profile::Bowl { center, stretch, floor, gradient },
        mask,
        taper: None,
    }
}

fn bounds(west: Option<f64>, east: Option<f64>, south: Option<f64>, north: Option<f64>) -> Mask {
    Mask::Bounds { west, east, south, north }
}

/// Sierra Nevada, Inyo Mountains, Panamint Range, White Mountains.
pub fn default_highlands() -> Vec<TerrainFeature> {
    let mut inyo = ridge(
        "Inyo Mountains",
        1200.0,
        2000.0,
        -117.85,
        0.008,
        Mask::Band { axis_lon: -117.85, half_width: 0.3 },
    );
    inyo.taper = Some(LatitudeTaper { center_lat: 36.8, rate: 0.3, min: 0.5, max: 1.0 });

    vec![
        ridge("Sierra Nevada", 1500.0, 2500.0, -118.5, 0.02, bounds(None, Some(-118.3), None, None)),
        inyo,
        ridge(
            "Panamint Range",
            1000.0,
            2200.0,
            -117.15,
            0.012,
            bounds(Some(-117.4), Some(-116.9), None, Some(36.8)),
        ),
        ridge(
            "White Mountains",
            1500.0,
            2200.0,
            -118.15,
            0.015,
            bounds(Some(-118.4), Some(-117.9), Some(37.3), None),
        ),
    ]
}

/// Owens, Saline, Eureka, Death and Panamint valleys.
pub fn default_basins() -> Vec<TerrainFeature> {
    vec![
        // Graben floor around the dry Owens Lake
        ridge(
            "Owens Valley",
            1200.0,
            -400.0,
            -118.05,
            0.01,
            bounds(Some(-118.25), Some(-117.9), Some(36.0), Some(37.0)),
        ),
        // Closed basin, ~400 m floor
        bowl(
            "Saline Valley",
            (-117.85, 36.75),
            (1.0, 1.5),
            400.0,
            300.0 / 0.25,
            Mask::Ellipse { center: (-117.85, 36.75), stretch: (1.0, 1.5), radius: 0.25 },
        ),
        bowl(
            "Eureka Valley",
            (-117.65, 37.1),
            (1.0, 1.2),
            900.0,
            200.0 / 0.15,
            Mask::Ellipse { center: (-117.65, 37.1), stretch: (1.0, 1.2), radius: 0.15 },
        ),
        // Badwater sits below sea level; the smoothed floor lands near it
        bowl(
            "Death Valley",
            (-116.95, 36.4),
            (0.8, 1.5),
            150.0,
            500.0,
            bounds(Some(-117.2), Some(-116.8), Some(35.8), Some(37.0)),
        ),
        bowl(
            "Panamint Valley",
            (-117.4, 36.1),
            (1.0, 0.8),
            500.0,
            400.0 / 0.2,
            Mask::Ellipse { center: (-117.4, 36.1), stretch: (1.0, 0.8), radius: 0.2 },
        ),
    ]
}

// =============================================================================
// COMPOSITION
// =============================================================================

/// Uniform surface at `base` meters.
pub fn base_surface(mesh: &GeoGrid, base: f32) -> Grid<f32> {
    Grid::new_with(mesh.nx, mesh.ny, base)
}

/// Raise each highland inside its mask with element-wise max.
pub fn raise_highlands(elevation: &mut Grid<f32>, mesh: &GeoGrid, highlands: &[TerrainFeature]) {
    for feature in highlands {
        debug!(feature = %feature.name, "raising highland");
        compose(elevation, mesh, feature, f32::max);
    }
}

/// Carve each basin inside its mask with element-wise min.
pub fn carve_basins(elevation: &mut Grid<f32>, mesh: &GeoGrid, basins: &[TerrainFeature]) {
    for feature in basins {
        debug!(feature = %feature.name, "carving basin");
        compose(elevation, mesh, feature, f32::min);
    }
}

fn compose(elevation: &mut Grid<f32>, mesh: &GeoGrid, feature: &TerrainFeature, op: fn(f32, f32) -> f32) {
    for (x, y, h) in elevation.iter_mut() {
        if let Some(feature_h) = feature.sample(mesh.lon(x), mesh.lat(y)) {
            *h = op(*h, feature_h as f32);
        }
    }
}

/// Steps 1-3: base, highlands, basins. No smoothing or noise.
pub fn compose_features(mesh: &GeoGrid, params: &TerrainParams) -> Grid<f32> {
    let mut elevation = base_surface(mesh, params.base_elevation);
    raise_highlands(&mut elevation, mesh, &params.highlands);
    carve_basins(&mut elevation, mesh, &params.basins);
    elevation
}

// =============================================================================
// SMOOTHING & NOISE
// =============================================================================

/// Kernel radius used for a given sigma (4 sigma, rounded).
fn kernel_radius(sigma: f64) -> usize {
    (4.0 * sigma + 0.5) as usize
}

fn gaussian_kernel(sigma: f64) -> Vec<f64> {
    let radius = kernel_radius(sigma) as i64;
    let two_s2 = 2.0 * sigma * sigma;
    let mut weights: Vec<f64> = (-radius..=radius)
        .map(|i| (-((i * i) as f64) / two_s2).exp())
        .collect();
    let sum: f64 = weights.iter().sum();
    for w in &mut weights {
        *w /= sum;
    }
    weights
}

/// Mirror an out-of-range index back into `0..n`, repeating the edge sample
/// (`d c b a | a b c d | d c b a`).
fn reflect_index(i: i64, n: usize) -> usize {
    let n = n as i64;
    let period = 2 * n;
    let m = i.rem_euclid(period);
    (if m >= n { period - 1 - m } else { m }) as usize
}

/// Separable 2D Gaussian blur with reflected borders. A sigma of zero or less
/// returns the input unchanged.
pub fn gaussian_filter(grid: &Grid<f32>, sigma: f64) -> Grid<f32> {
    if sigma <= 0.0 {
        return grid.clone();
    }
    let kernel = gaussian_kernel(sigma);
    let radius = (kernel.len() / 2) as i64;
    let width = grid.width;
    let height = grid.height;

    // Vertical pass (along rows of latitude)
    let src = grid.as_slice();
    let mut vertical = Grid::new_with(width, height, 0.0f32);
    vertical
        .as_mut_slice()
        .par_chunks_mut(width)
        .enumerate()
        .for_each(|(y, row)| {
            for (x, out) in row.iter_mut().enumerate() {
                let mut acc = 0.0f64;
                for (k, &w) in kernel.iter().enumerate() {
                    let sy = reflect_index(y as i64 + k as i64 - radius, height);
                    acc += w * src[sy * width + x] as f64;
                }
                *out = acc as f32;
            }
        });

    // Horizontal pass
    let src = vertical.as_slice();
    let mut result = Grid::new_with(width, height, 0.0f32);
    result
        .as_mut_slice()
        .par_chunks_mut(width)
        .enumerate()
        .for_each(|(y, row)| {
            let line = &src[y * width..(y + 1) * width];
            for (x, out) in row.iter_mut().enumerate() {
                let mut acc = 0.0f64;
                for (k, &w) in kernel.iter().enumerate() {
                    let sx = reflect_index(x as i64 + k as i64 - radius, width);
                    acc += w * line[sx] as f64;
                }
                *out = acc as f32;
            }
        });

    result
}

/// Add `N(0, 1) * amplitude` white noise, blurred with `sigma`.
pub fn add_texture_noise<R: Rng>(elevation: &mut Grid<f32>, amplitude: f32, sigma: f64, rng: &mut R) {
    if amplitude == 0.0 {
        return;
    }
    let noise = Grid::from_fn(elevation.width, elevation.height, |_, _| {
        let n: f64 = rng.sample(StandardNormal);
        n as f32 * amplitude
    });
    let noise = gaussian_filter(&noise, sigma);
    for (h, n) in elevation.as_mut_slice().iter_mut().zip(noise.as_slice()) {
        *h += n;
    }
}

// =============================================================================
// MAIN SYNTHESIS
// =============================================================================

/// Build the full synthetic DEM over `mesh`. Output is a pure function of
/// `params` and `seed`.
pub fn synthesize(mesh: &GeoGrid, params: &TerrainParams, seed: u64) -> Grid<f32> {
    info!(
        "Synthesizing {}x{} DEM ({} highlands, {} basins)",
        mesh.nx,
        mesh.ny,
        params.highlands.len(),
        params.basins.len()
    );

    let composed = compose_features(mesh, params);
    let mut elevation = gaussian_filter(&composed, params.smoothing_sigma);

    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    add_texture_noise(&mut elevation, params.noise_amplitude, params.noise_sigma, &mut rng);

    let (min_h, max_h) = elevation.min_max();
    debug!("DEM range: {:.1}m to {:.1}m", min_h, max_h);

    elevation
}
