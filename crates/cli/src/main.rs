//! Cuencas CLI - watershed delineation from the command line

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use cuencas_delineation::{delineate_feature, DelineateParams};
use geo_types::Point;
use std::path::PathBuf;
use std::time::Instant;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

/// Environment variable naming the default dataset root
const ROOT_ENV: &str = "CUENCAS_PATH";

#[derive(Parser)]
#[command(name = "cuencas")]
#[command(author, version, about = "Watershed delineation engine", long_about = None)]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Delineate the catchment upstream of a point
    Delineate {
        /// Longitude of the pour point (degrees)
        #[arg(long, allow_hyphen_values = true)]
        lon: f64,
        /// Latitude of the pour point (degrees)
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,
        /// Dataset root (defaults to $CUENCAS_PATH, then ./data)
        #[arg(short, long)]
        root: Option<PathBuf>,
        /// Finest basin subdivision level to search
        #[arg(long, default_value = "7")]
        max_level: u8,
        /// Grid cell size in arc-seconds
        #[arg(long, default_value = "15")]
        cell_size: u32,
        /// Include basins that never reach their main basin's outlet
        #[arg(long)]
        keep_sinks: bool,
        /// Output shape: "Feature" or "FeatureCollection"
        #[arg(long, default_value = "Feature")]
        feature_type: String,
        /// Output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Show which dataset files are present for a region
    Info {
        /// Region code (af, as, au, ca, eu, na, sa)
        region: String,
        /// Dataset root (defaults to $CUENCAS_PATH, then ./data)
        #[arg(short, long)]
        root: Option<PathBuf>,
        /// Grid cell size in arc-seconds
        #[arg(long, default_value = "15")]
        cell_size: u32,
        /// Finest basin subdivision level to check
        #[arg(long, default_value = "7")]
        max_level: u8,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("failed to initialize logging")?;

    match cli.command {
        Commands::Delineate {
            lon,
            lat,
            root,
            max_level,
            cell_size,
            keep_sinks,
            feature_type,
            output,
        } => run_delineate(
            lon,
            lat,
            resolve_root(root),
            max_level,
            cell_size,
            !keep_sinks,
            &feature_type,
            output,
        ),
        Commands::Info {
            region,
            root,
            cell_size,
            max_level,
        } => run_info(&region, resolve_root(root), cell_size, max_level),
    }
}

fn resolve_root(root: Option<PathBuf>) -> PathBuf {
    root.or_else(|| std::env::var_os(ROOT_ENV).map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from("./data"))
}

#[allow(clippy::too_many_arguments)]
fn run_delineate(
    lon: f64,
    lat: f64,
    root: PathBuf,
    max_level: u8,
    cell_size: u32,
    omit_sinks: bool,
    feature_type: &str,
    output: Option<PathBuf>,
) -> Result<()> {
    let params = DelineateParams {
        max_level,
        cell_size,
        omit_sinks,
        ..DelineateParams::default()
    };

    info!(lon, lat, root = %root.display(), "delineating catchment");
    let start = Instant::now();

    let feature = delineate_feature(&root, Point::new(lon, lat), &params, feature_type)
        .with_context(|| format!("delineation failed for point ({lon}, {lat})"))?;

    info!(elapsed = ?start.elapsed(), "delineation complete");

    let json = feature.to_string();
    match output {
        Some(path) => {
            std::fs::write(&path, &json)
                .with_context(|| format!("cannot write {}", path.display()))?;
            info!(path = %path.display(), "result written");
        }
        None => println!("{json}"),
    }

    Ok(())
}

fn run_info(region_code: &str, root: PathBuf, cell_size: u32, max_level: u8) -> Result<()> {
    let region = cuencas_delineation::Region::new(&root, region_code, cell_size);

    let mut paths = vec![
        ("direction grid", region.dir_grid_path()),
        ("accumulation grid", region.acc_grid_path()),
        ("level-0 lookup", region.lookup_path()),
    ];
    for level in 1..=max_level {
        paths.push(("basin layer", region.layer_path(level)));
    }

    println!("dataset root: {}", root.display());
    for (kind, path) in paths {
        let status = if path.exists() { "ok     " } else { "missing" };
        println!("  [{status}] {kind:17} {}", path.display());
    }

    Ok(())
}
