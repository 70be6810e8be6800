//! Saline Valley territory maps
//!
//! Territory geometry, a synthetic Basin and Range DEM with hillshade, and
//! PDF/PNG figure output. Re-exports modules for use by the binary.

pub mod config;
pub mod error;
pub mod figure;
pub mod grid;
pub mod maps;
pub mod pdf;
pub mod raster;
pub mod shading;
pub mod terrain;
pub mod territory;

pub use error::{MapError, Result};
