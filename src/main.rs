use std::error::Error;
use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use tracing::info;
use tracing_subscriber::EnvFilter;

use saline_valley_maps::config::{self, RunConfig};
use saline_valley_maps::maps::{self, DemOptions, MapKind};
use saline_valley_maps::terrain::TerrainParams;

/// Which figures to render.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum FigureChoice {
    Territories,
    Geologic,
    All,
}

impl FigureChoice {
    fn maps(self) -> Vec<MapKind> {
        match self {
            FigureChoice::Territories => vec![MapKind::Territories],
            FigureChoice::Geologic => vec![MapKind::Geologic],
            FigureChoice::All => vec![MapKind::Territories, MapKind::Geologic],
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "saline_valley_maps")]
#[command(about = "Render Indigenous territory maps of the Saline Valley region")]
struct Args {
    /// Directory for the PDF and PNG output (created if missing)
    #[arg(short, long, default_value = "figures/maps")]
    output_dir: PathBuf,

    /// Figure to render
    #[arg(short, long, value_enum, default_value_t = FigureChoice::All)]
    figure: FigureChoice,

    /// Resolution of the PNG output
    #[arg(long, default_value = "300")]
    dpi: f32,

    /// Random seed for the terrain texture (uses random seed if not specified)
    #[arg(short, long)]
    seed: Option<u64>,

    /// Texture noise amplitude in meters (0 disables noise)
    #[arg(long)]
    noise_amplitude: Option<f32>,

    /// Width of the synthetic DEM in cells
    #[arg(short = 'W', long, default_value = "360")]
    grid_width: usize,

    /// Height of the synthetic DEM in cells
    #[arg(short = 'H', long, default_value = "400")]
    grid_height: usize,

    /// JSON file overriding terrain parameters
    #[arg(long)]
    terrain_config: Option<PathBuf>,

    /// Also write the territory table as GeoJSON
    #[arg(long)]
    export_geojson: Option<PathBuf>,
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let seed = args.seed.unwrap_or_else(rand::random);
    info!("Terrain seed: {}", seed);

    let mut params = match &args.terrain_config {
        Some(path) => {
            info!("Loading terrain parameters from {}", path.display());
            config::load_terrain_params(path)?
        }
        None => TerrainParams::default(),
    };
    if let Some(amplitude) = args.noise_amplitude {
        params.noise_amplitude = amplitude;
    }

    let run = RunConfig {
        output_dir: args.output_dir,
        maps: args.figure.maps(),
        dpi: args.dpi,
        dem: DemOptions {
            params,
            grid_width: args.grid_width,
            grid_height: args.grid_height,
            seed,
        },
        geojson: args.export_geojson,
    };

    if let Some(path) = &run.geojson {
        config::write_geojson(path)?;
        println!("Territories exported to: {}", path.display());
    }

    for saved in maps::run(&run)? {
        match saved.kind {
            MapKind::Territories => println!("Map saved to:"),
            MapKind::Geologic => println!("Geological basemap saved to:"),
        }
        for file in &saved.files {
            println!("  {}", file.display());
        }
    }

    Ok(())
}
