use std::path::{Path, PathBuf};

use catalog::CityCatalog;
use clap::{Parser, Subcommand};
use foundation::math::LatLng;
use scene::{GlobeConfig, GlobeSession, Viewport};
use serde_json::json;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Inspect city data and drive a headless globe")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Summarize a cities document
    Inspect {
        cities: PathBuf,
    },

    /// Cities whose name, country or region contains QUERY
    Search {
        cities: PathBuf,
        query: String,
    },

    /// The city closest to a coordinate
    Nearest {
        cities: PathBuf,
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,
        #[arg(long, allow_hyphen_values = true)]
        lng: f64,
    },

    /// Select cities in order, letting each flight finish, and print the
    /// notifications followed by the final label layout
    Simulate {
        cities: PathBuf,

        /// Globe config (JSON); defaults apply when omitted
        #[arg(long)]
        config: Option<PathBuf>,

        /// City id to select; repeat for a sequence, `-` deselects
        #[arg(long = "select")]
        select: Vec<String>,

        /// Frames (at 60 Hz) to run after each selection
        #[arg(long, default_value_t = 120)]
        frames: u32,

        /// Camera distance from the globe center before selecting
        #[arg(long)]
        zoom: Option<f64>,

        #[arg(long, default_value_t = 800.0)]
        width: f64,

        #[arg(long, default_value_t = 600.0)]
        height: f64,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = real_main(Args::parse()) {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

fn real_main(args: Args) -> Result<(), String> {
    match args.command {
        Command::Inspect { cities } => cmd_inspect(&cities),
        Command::Search { cities, query } => cmd_search(&cities, &query),
        Command::Nearest { cities, lat, lng } => cmd_nearest(&cities, lat, lng),
        Command::Simulate {
            cities,
            config,
            select,
            frames,
            zoom,
            width,
            height,
        } => cmd_simulate(
            &cities,
            config.as_deref(),
            &select,
            frames,
            zoom,
            Viewport::new(width, height),
        ),
    }
}

fn load_catalog(path: &Path) -> Result<CityCatalog, String> {
    CityCatalog::load(path).map_err(|e| format!("{}: {e}", path.display()))
}

fn print_json(v: &serde_json::Value) -> Result<(), String> {
    let s = serde_json::to_string_pretty(v).map_err(|e| format!("json: {e}"))?;
    println!("{s}");
    Ok(())
}

fn cmd_inspect(path: &Path) -> Result<(), String> {
    let catalog = load_catalog(path)?;
    let tracks: usize = catalog.iter().map(|c| c.playlist.len()).sum();
    let mut countries: Vec<&str> = catalog.iter().map(|c| c.country.as_str()).collect();
    countries.sort_unstable();
    countries.dedup();

    print_json(&json!({
        "cities": catalog.len(),
        "tracks": tracks,
        "countries": countries,
    }))
}

fn cmd_search(path: &Path, query: &str) -> Result<(), String> {
    let catalog = load_catalog(path)?;
    let found: Vec<_> = catalog
        .search(query)
        .into_iter()
        .map(|c| json!({ "id": c.id, "name": c.name, "country": c.country }))
        .collect();
    print_json(&serde_json::Value::Array(found))
}

fn cmd_nearest(path: &Path, lat: f64, lng: f64) -> Result<(), String> {
    let catalog = load_catalog(path)?;
    let (city, km) = catalog
        .nearest(LatLng::new(lat, lng))
        .ok_or_else(|| format!("{} has no cities", path.display()))?;
    print_json(&json!({ "id": city.id, "name": city.name, "distance_km": km }))
}

fn cmd_simulate(
    path: &Path,
    config_path: Option<&Path>,
    select: &[String],
    frames: u32,
    zoom: Option<f64>,
    viewport: Viewport,
) -> Result<(), String> {
    let config = match config_path {
        Some(p) => GlobeConfig::load(p).map_err(|e| format!("{}: {e}", p.display()))?,
        None => GlobeConfig::default(),
    };
    let catalog = load_catalog(path)?;

    let mut session = GlobeSession::new(config, viewport);
    session.set_catalog(catalog);
    if let Some(distance) = zoom {
        session.set_camera_distance(distance);
    }
    info!(markers = session.registry().len(), "simulating");

    let dt_s = 1.0 / 60.0;
    for id in select {
        let target = (id != "-").then_some(id.as_str());
        let changed = session.select_city(target);
        info!(city = %id, changed, "select");
        for _ in 0..frames {
            session.tick(dt_s);
        }
    }

    let mut notifications = Vec::new();
    for env in session.drain_events() {
        let event = serde_json::to_value(&env.event).map_err(|e| format!("json: {e}"))?;
        notifications.push(json!({ "frame": env.frame_index, "event": event }));
    }

    let labels: Vec<_> = session
        .labels()
        .into_iter()
        .filter(|l| l.visible)
        .map(|l| json!({ "id": l.city_id, "x": l.screen_x, "y": l.screen_y }))
        .collect();

    let camera = session.camera().position;
    print_json(&json!({
        "notifications": notifications,
        "selected": session.selected_city().map(|c| c.id.clone()),
        "camera": [camera.x, camera.y, camera.z],
        "labels": labels,
    }))
}
