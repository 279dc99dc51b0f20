//! Définition et implémentation des commandes CLI
//!
//! - `radius`: rayon de recherche d'un viewport
//! - `simulate`: accueil + carte sur une surface en mémoire

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Subcommand;
use coolector::config::{self, AppConfig};
use coolector::remarks::load_remarks;
use coolector::Simulation;
use coolector_map::{viewport_radius, Bounds, GeoPoint};
use tracing::info;

#[derive(Subcommand)]
pub enum Commands {
    /// Compute the search radius of a viewport (center to north-east corner)
    Radius {
        /// Viewport center as LAT,LNG
        #[arg(long, value_parser = parse_point, allow_hyphen_values = true)]
        center: GeoPoint,

        /// North-east corner as LAT,LNG
        #[arg(long, value_parser = parse_point, allow_hyphen_values = true)]
        north_east: GeoPoint,
    },

    /// Run the home screen and the map headlessly and print a JSON summary
    Simulate {
        /// Device latitude
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,

        /// Device longitude
        #[arg(long, allow_hyphen_values = true)]
        lng: f64,

        /// Remarks file (JSON array or GeoJSON FeatureCollection)
        #[arg(long)]
        remarks: Option<PathBuf>,

        /// Config preset name (local/development/production) or path to a JSON config (default: env COOLECTOR_ENV, then local)
        #[arg(long)]
        preset: Option<String>,

        /// Zoom level applied once the map is drawn
        #[arg(long)]
        zoom: Option<u8>,

        /// Enlarge the best rated remarks
        #[arg(long)]
        distinguish_liked: bool,

        /// Persist filters in this directory (default: env COOLECTOR_DATA_DIR, otherwise in memory)
        #[arg(long)]
        data_dir: Option<PathBuf>,
    },
}

/// Parse `LAT,LNG`
fn parse_point(value: &str) -> Result<GeoPoint, String> {
    let (lat, lng) = value
        .split_once(',')
        .ok_or_else(|| format!("expected LAT,LNG, got '{}'", value))?;
    let lat: f64 = lat
        .trim()
        .parse()
        .map_err(|e| format!("invalid latitude '{}': {}", lat, e))?;
    let lng: f64 = lng
        .trim()
        .parse()
        .map_err(|e| format!("invalid longitude '{}': {}", lng, e))?;
    GeoPoint::new(lat, lng).validate().map_err(|e| e.to_string())
}

/// Exécute la commande radius
pub fn cmd_radius(center: GeoPoint, north_east: GeoPoint) -> Result<()> {
    // Le centre d'un rectangle est le milieu de sa diagonale
    let south_west = GeoPoint::new(
        2.0 * center.latitude - north_east.latitude,
        2.0 * center.longitude - north_east.longitude,
    );
    let radius = viewport_radius(&Bounds::new(south_west, north_east))
        .context("Failed to compute radius")?;
    info!(radius_meters = radius, "radius computed");
    println!("{:.2}", radius);
    Ok(())
}

/// Exécute la commande simulate
pub fn cmd_simulate(
    lat: f64,
    lng: f64,
    remarks: Option<&Path>,
    preset: Option<&str>,
    zoom: Option<u8>,
    distinguish_liked: bool,
    data_dir: Option<PathBuf>,
) -> Result<()> {
    let config = match preset {
        Some(preset) => AppConfig::resolve(preset)?,
        None => AppConfig::from_env()?,
    };
    info!(title = %config.title, "configuration loaded");

    let mut simulation = Simulation::new(config, GeoPoint::new(lat, lng));
    if let Some(path) = remarks {
        simulation.remarks = load_remarks(path)?;
    }
    simulation.zoom = zoom;
    simulation.distinguish_liked = distinguish_liked;
    simulation.data_dir = data_dir.or_else(config::data_dir);

    let summary = simulation.run()?;
    let json = serde_json::to_string_pretty(&summary).context("Failed to serialize summary")?;
    println!("{}", json);
    Ok(())
}
