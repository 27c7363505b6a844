use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use image::{DynamicImage, GenericImageView, ImageFormat, Rgba, RgbaImage};
use log::{debug, warn};

use crate::config::RouteConfig;
use crate::error::LoadError;
use crate::grid::{ElevationGrid, Point, TerrainGrid};
use crate::terrain::TerrainColor;

/// Trailing fields on every elevation row that carry no elevation data
const ELEVATION_METADATA_FIELDS: usize = 5;

pub fn parse_img(img: &DynamicImage) -> TerrainGrid {
    let width = img.width() as usize;
    let height = img.height() as usize;

    let mut terrain = TerrainGrid::filled(width, height, TerrainColor::default());

    for (x, y, p) in img.pixels() {
        terrain.set(Point::new(x as usize, y as usize), TerrainColor::from(p));
    }

    terrain
}

fn open(path: &Path) -> Result<BufReader<File>, LoadError> {
    File::open(path)
        .map(BufReader::new)
        .map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })
}

fn check_dimensions(
    what: &'static str,
    found: (usize, usize),
    config: &RouteConfig,
) -> Result<(), LoadError> {
    let expected = (config.width, config.height);
    if found != expected {
        return Err(LoadError::Dimensions {
            what,
            expected,
            found,
        });
    }
    Ok(())
}

/// Read the terrain raster, returning the image itself for later rendering
pub fn load_terrain(
    path: &Path,
    config: &RouteConfig,
) -> Result<(DynamicImage, TerrainGrid), LoadError> {
    let img = image::open(path).map_err(|source| LoadError::Image {
        path: path.to_path_buf(),
        source,
    })?;
    check_dimensions("terrain image", (img.width() as usize, img.height() as usize), config)?;

    let terrain = parse_img(&img);
    debug!(
        "loaded terrain {}x{} from {}",
        terrain.width(),
        terrain.height(),
        path.display()
    );
    Ok((img, terrain))
}

/// Parse one `mantissa e exponent` elevation token such as `1.5049e+02`
pub fn parse_elevation_token(token: &str) -> Option<f64> {
    match token.split_once(['e', 'E']) {
        Some((mantissa, exponent)) => {
            let mantissa: f64 = mantissa.parse().ok()?;
            let exponent: i32 = exponent.parse().ok()?;
            Some(mantissa * 10f64.powi(exponent))
        }
        None => token.parse().ok(),
    }
}

/// Parse the elevation text: one row per line, `width` values followed by
/// metadata fields that are skipped.
pub fn parse_elevations(
    reader: impl BufRead,
    path: &Path,
    config: &RouteConfig,
) -> Result<ElevationGrid, LoadError> {
    let parse_error = |line: usize, reason: String| LoadError::Parse {
        path: path.to_path_buf(),
        line,
        reason,
    };

    let mut rows = Vec::with_capacity(config.height);

    for (index, line) in reader.lines().enumerate() {
        let line = line.map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let tokens: Vec<&str> = line.split_whitespace().collect();
        if tokens.is_empty() {
            warn!("{}:{}: skipping blank elevation row", path.display(), index + 1);
            continue;
        }
        if tokens.len() != config.width + ELEVATION_METADATA_FIELDS {
            return Err(parse_error(
                index + 1,
                format!(
                    "expected {} elevations and {} trailing fields, found {} fields",
                    config.width,
                    ELEVATION_METADATA_FIELDS,
                    tokens.len()
                ),
            ));
        }

        let row = tokens[..config.width]
            .iter()
            .map(|token| {
                parse_elevation_token(token)
                    .ok_or_else(|| parse_error(index + 1, format!("invalid elevation '{}'", token)))
            })
            .collect::<Result<Vec<f64>, LoadError>>()?;
        rows.push(row);
    }

    check_dimensions("elevation grid", (config.width, rows.len()), config)?;

    // rows all have config.width entries at this point
    ElevationGrid::from_rows(rows).ok_or_else(|| parse_error(0, "ragged elevation rows".into()))
}

pub fn load_elevations(path: &Path, config: &RouteConfig) -> Result<ElevationGrid, LoadError> {
    let grid = parse_elevations(open(path)?, path, config)?;
    debug!(
        "loaded elevations {}x{} from {}",
        grid.width(),
        grid.height(),
        path.display()
    );
    Ok(grid)
}

/// Parse `x y` pairs, one waypoint per line. Fractional values are truncated.
pub fn parse_waypoints(reader: impl BufRead, path: &Path) -> Result<Vec<Point>, LoadError> {
    let mut waypoints = Vec::new();

    for (index, line) in reader.lines().enumerate() {
        let line = line.map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        if line.trim().is_empty() {
            continue;
        }

        let coords = line
            .split_whitespace()
            .map(|token| token.parse::<f64>().ok().filter(|v| v.is_finite() && *v >= 0.0))
            .collect::<Option<Vec<f64>>>();

        match coords.as_deref() {
            Some(&[x, y]) => waypoints.push(Point::new(x as usize, y as usize)),
            _ => {
                return Err(LoadError::Parse {
                    path: path.to_path_buf(),
                    line: index + 1,
                    reason: format!("expected two non-negative numbers, found '{}'", line.trim()),
                })
            }
        }
    }

    Ok(waypoints)
}

pub fn load_waypoints(path: &Path) -> Result<Vec<Point>, LoadError> {
    let waypoints = parse_waypoints(open(path)?, path)?;
    debug!("loaded {} waypoints from {}", waypoints.len(), path.display());
    Ok(waypoints)
}

/// Paint the given points onto a copy of the image, keeping its alpha
pub fn render_route(
    img: &DynamicImage,
    points: impl IntoIterator<Item = Point>,
    color: [u8; 3],
) -> RgbaImage {
    let mut out = img.to_rgba8();
    let [r, g, b] = color;

    for p in points {
        let (x, y) = (p.x as u32, p.y as u32);
        if x < out.width() && y < out.height() {
            let alpha = out.get_pixel(x, y).0[3];
            out.put_pixel(x, y, Rgba([r, g, b, alpha]));
        }
    }

    out
}

/// Write the image as PNG regardless of the file extension
pub fn save_png(img: &RgbaImage, path: &Path) -> Result<(), LoadError> {
    img.save_with_format(path, ImageFormat::Png)
        .map_err(|source| LoadError::Image {
            path: path.to_path_buf(),
            source,
        })
}
