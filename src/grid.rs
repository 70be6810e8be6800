//! Row-major 2D grids and the regular longitude/latitude mesh they sit on.

use serde::{Deserialize, Serialize};

use crate::error::{MapError, Result};

/// A 2D grid of cells stored row-major. Row 0 is the southern edge.
#[derive(Clone, Debug, PartialEq)]
pub struct Grid<T> {
    pub width: usize,
    pub height: usize,
    data: Vec<T>,
}

impl<T: Clone> Grid<T> {
    pub fn new_with(width: usize, height: usize, value: T) -> Self {
        Self {
            width,
            height,
            data: vec![value; width * height],
        }
    }
}

impl<T> Grid<T> {
    /// Build a grid by evaluating `f(x, y)` for every cell.
    pub fn from_fn(width: usize, height: usize, mut f: impl FnMut(usize, usize) -> T) -> Self {
        let mut data = Vec::with_capacity(width * height);
        for y in 0..height {
            for x in 0..width {
                data.push(f(x, y));
            }
        }
        Self { width, height, data }
    }

    fn index(&self, x: usize, y: usize) -> usize {
        debug_assert!(x < self.width && y < self.height);
        y * self.width + x
    }

    pub fn get(&self, x: usize, y: usize) -> &T {
        &self.data[self.index(x, y)]
    }

    pub fn set(&mut self, x: usize, y: usize, value: T) {
        let idx = self.index(x, y);
        self.data[idx] = value;
    }

    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.data
    }

    /// Iterate over all cells with their coordinates.
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize, &T)> {
        let width = self.width;
        self.data.iter().enumerate().map(move |(idx, val)| {
            (idx % width, idx / width, val)
        })
    }

    /// Iterate mutably over all cells with their coordinates.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (usize, usize, &mut T)> {
        let width = self.width;
        self.data.iter_mut().enumerate().map(move |(idx, val)| {
            (idx % width, idx / width, val)
        })
    }
}

impl Grid<f32> {
    /// Minimum and maximum cell values.
    pub fn min_max(&self) -> (f32, f32) {
        let mut min_v = f32::MAX;
        let mut max_v = f32::MIN;
        for &v in &self.data {
            if v < min_v { min_v = v; }
            if v > max_v { max_v = v; }
        }
        (min_v, max_v)
    }
}

/// Geographic bounding box in degrees.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Extent {
    pub lon_min: f64,
    pub lon_max: f64,
    pub lat_min: f64,
    pub lat_max: f64,
}

impl Extent {
    /// The Saline Valley study area.
    pub const SALINE_VALLEY: Extent = Extent {
        lon_min: -118.6,
        lon_max: -116.8,
        lat_min: 35.8,
        lat_max: 37.8,
    };

    pub fn lon_span(&self) -> f64 {
        self.lon_max - self.lon_min
    }

    pub fn lat_span(&self) -> f64 {
        self.lat_max - self.lat_min
    }

    /// Inclusive containment test.
    pub fn contains(&self, lon: f64, lat: f64) -> bool {
        lon >= self.lon_min && lon <= self.lon_max && lat >= self.lat_min && lat <= self.lat_max
    }
}

/// A regular mesh of `nx` x `ny` sample points spanning an extent edge to edge.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GeoGrid {
    pub extent: Extent,
    pub nx: usize,
    pub ny: usize,
}

impl GeoGrid {
    pub fn new(extent: Extent, nx: usize, ny: usize) -> Result<Self> {
        if nx < 2 || ny < 2 {
            return Err(MapError::GridTooSmall { width: nx, height: ny });
        }
        Ok(Self { extent, nx, ny })
    }

    /// Longitude of column `i`.
    pub fn lon(&self, i: usize) -> f64 {
        linspace_at(self.extent.lon_min, self.extent.lon_max, self.nx, i)
    }

    /// Latitude of row `j`.
    pub fn lat(&self, j: usize) -> f64 {
        linspace_at(self.extent.lat_min, self.extent.lat_max, self.ny, j)
    }

    /// Build a grid by evaluating `f(lon, lat)` at every mesh point.
    pub fn map<T>(&self, mut f: impl FnMut(f64, f64) -> T) -> Grid<T> {
        Grid::from_fn(self.nx, self.ny, |i, j| f(self.lon(i), self.lat(j)))
    }
}

fn linspace_at(start: f64, stop: f64, n: usize, i: usize) -> f64 {
    if n <= 1 {
        return start;
    }
    if i == n - 1 {
        return stop;
    }
    start + (stop - start) * i as f64 / (n - 1) as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mesh_spans_extent_edges() {
        let mesh = GeoGrid::new(Extent::SALINE_VALLEY, 360, 400).unwrap();
        assert_eq!(mesh.lon(0), -118.6);
        assert_eq!(mesh.lon(359), -116.8);
        assert_eq!(mesh.lat(0), 35.8);
        assert_eq!(mesh.lat(399), 37.8);
        assert!((mesh.lon(1) - (-118.6 + 1.8 / 359.0)).abs() < 1e-12);
    }

    #[test]
    fn test_degenerate_mesh_rejected() {
        let err = GeoGrid::new(Extent::SALINE_VALLEY, 1, 10).unwrap_err();
        assert!(matches!(err, MapError::GridTooSmall { width: 1, height: 10 }));
    }

    #[test]
    fn test_grid_row_major_layout() {
        let grid = Grid::from_fn(3, 2, |x, y| (y * 10 + x) as f32);
        assert_eq!(*grid.get(2, 1), 12.0);
        assert_eq!(grid.as_slice()[4], 11.0);
        assert_eq!(grid.min_max(), (0.0, 12.0));

        let coords: Vec<_> = grid.iter().map(|(x, y, _)| (x, y)).collect();
        assert_eq!(coords[3], (0, 1));
    }
}
