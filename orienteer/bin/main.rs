use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use log::error;
use orienteer::{
    plan_route,
    util::{load_elevations, load_terrain, load_waypoints, render_route, save_png},
    RouteConfig, RouteError, TerrainMap,
};

/// Find the cheapest route through a list of waypoints on an orienteering map
#[derive(Parser, Debug)]
#[command(name = "orienteer", version)]
struct Cli {
    /// Terrain raster, one color per terrain class
    terrain_image: PathBuf,

    /// Elevation text file, one row of values per line
    elevation_file: PathBuf,

    /// Waypoints, one "x y" pair per line, visited in order
    path_file: PathBuf,

    /// Where to write the terrain raster with the route painted on it (PNG)
    output_image: PathBuf,

    /// JSON file overriding the default map size and cost constants
    #[arg(long)]
    config: Option<PathBuf>,
}

fn run(cli: &Cli) -> Result<(), anyhow::Error> {
    let config = match &cli.config {
        Some(path) => RouteConfig::load(path)?,
        None => RouteConfig::default(),
    };

    let waypoints = load_waypoints(&cli.path_file)?;
    let elevation = load_elevations(&cli.elevation_file, &config)?;
    let (img, terrain) = load_terrain(&cli.terrain_image, &config)?;

    let map = TerrainMap::new(elevation, terrain)?;
    let route = plan_route(&map, &waypoints, &config)?;

    let out = render_route(&img, route.points(), config.route_color);
    save_png(&out, &cli.output_image)
        .with_context(|| format!("writing route to {}", cli.output_image.display()))?;

    println!("{}", route.total_cost);

    Ok(())
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    // argument errors exit here, before any file is touched
    let cli = Cli::parse();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            match e.downcast_ref::<RouteError>() {
                Some(RouteError::PathNotFound { .. }) => error!("route incomplete: {}", e),
                _ => error!("{:#}", e),
            }
            ExitCode::FAILURE
        }
    }
}
