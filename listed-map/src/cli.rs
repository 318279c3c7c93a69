//! Définition et implémentation des commandes CLI
//!
//! - `ingest`: CSV → GeoJSON de points (WGS84)
//! - `hotspots`: points → polygones de hotspots
//! - `package`: GeoJSON → PMTiles
//! - `all`: les trois à la suite

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use geo::Rect;
use hotspots::{Crs, FilterPolicy, HotspotPipeline, TracingObserver};
use tracing::{info, warn};

use crate::config::{ConfigOverrides, HotspotsConfig};
use crate::export::geojson;
use crate::ingest::{read_points_csv, IngestOptions};
use crate::report::HotspotsReport;
use crate::reproject_lite::SmartReprojector;
use crate::tiles::{package_layers, TippecanoePackager};

pub const DEFAULT_CSV: &str = "data/listed_buildings.csv";
pub const DEFAULT_POINTS: &str = "build/listed_buildings.geojson";
pub const DEFAULT_HOTSPOTS: &str = "build/hotspots.geojson";
pub const DEFAULT_DOCS_DIR: &str = "docs/tiles";

#[derive(Subcommand)]
pub enum Commands {
    /// Read the listed buildings CSV and write it as GeoJSON points (EPSG:4326)
    Ingest(IngestArgs),

    /// Generate hotspot polygons from the ingested points
    Hotspots(HotspotsArgs),

    /// Package points and hotspots into PMTiles for web serving
    Package(PackageArgs),

    /// Run the full pipeline: ingest → hotspots → package
    All {
        /// Path to the CSV file
        #[arg(long, default_value = DEFAULT_CSV)]
        csv_path: PathBuf,

        #[command(flatten)]
        params: ParamArgs,

        /// Minimum zoom level
        #[arg(long, default_value_t = 4)]
        min_zoom: u8,

        /// Maximum zoom level
        #[arg(long, default_value_t = 14)]
        max_zoom: u8,
    },
}

#[derive(Args, Debug, Clone)]
pub struct IngestArgs {
    /// Path to the CSV file
    #[arg(long, default_value = DEFAULT_CSV)]
    pub csv_path: PathBuf,

    /// Longitude column name
    #[arg(long)]
    pub lon_col: Option<String>,

    /// Latitude column name
    #[arg(long)]
    pub lat_col: Option<String>,

    /// X/Easting column name
    #[arg(long)]
    pub x_col: Option<String>,

    /// Y/Northing column name
    #[arg(long)]
    pub y_col: Option<String>,

    /// Source CRS for x/y coordinates
    #[arg(long, default_value = "EPSG:27700")]
    pub src_crs: String,

    /// Output GeoJSON path
    #[arg(short, long, default_value = DEFAULT_POINTS)]
    pub output: PathBuf,
}

impl IngestArgs {
    fn with_csv(csv_path: PathBuf) -> Self {
        Self {
            csv_path,
            lon_col: None,
            lat_col: None,
            x_col: None,
            y_col: None,
            src_crs: "EPSG:27700".to_string(),
            output: PathBuf::from(DEFAULT_POINTS),
        }
    }

    fn options(&self) -> IngestOptions {
        IngestOptions {
            lon_col: self.lon_col.clone(),
            lat_col: self.lat_col.clone(),
            x_col: self.x_col.clone(),
            y_col: self.y_col.clone(),
            src_crs: Crs::new(self.src_crs.as_str()),
            target_crs: Crs::wgs84(),
        }
    }
}

/// Paramètres du calcul de hotspots
#[derive(Args, Debug, Clone, Default)]
pub struct ParamArgs {
    /// Config preset name (default/native) or path to a JSON config
    #[arg(long, default_value = "default")]
    pub config: String,

    /// Buffer radius in meters
    #[arg(long)]
    pub buffer: Option<f64>,

    /// Negative buffer in meters (shrink after union)
    #[arg(long)]
    pub negative_buffer: Option<f64>,

    /// Minimum area in square meters
    #[arg(long)]
    pub min_area: Option<f64>,

    /// Minimum number of points (area-or-density policy)
    #[arg(long)]
    pub min_points: Option<usize>,

    /// Projected CRS for metric operations
    #[arg(long)]
    pub proj_crs: Option<String>,

    /// Filter policy: area-only, area-or-density
    #[arg(long)]
    pub filter_policy: Option<FilterPolicy>,

    /// Count points per hotspot even with the area-only policy
    #[arg(long, overrides_with = "no_count_points")]
    pub count_points: bool,

    /// Do not count points unless the filter policy needs them
    #[arg(long, overrides_with = "count_points")]
    pub no_count_points: bool,

    /// Union chunks in parallel
    #[arg(long, overrides_with = "no_parallel")]
    pub parallel: bool,

    /// Union chunks sequentially
    #[arg(long, overrides_with = "parallel")]
    pub no_parallel: bool,
}

impl ParamArgs {
    pub fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            buffer_meters: self.buffer,
            negative_buffer_meters: self.negative_buffer,
            min_area_sqm: self.min_area,
            min_points: self.min_points,
            proj_crs: self.proj_crs.clone(),
            filter_policy: self.filter_policy,
            count_points: switch(self.count_points, self.no_count_points),
            parallel_chunks: switch(self.parallel, self.no_parallel),
        }
    }

    /// Configuration chargée puis surchargée par la ligne de commande
    pub fn resolve(&self) -> Result<HotspotsConfig> {
        let mut config = HotspotsConfig::resolve(&self.config)
            .context(format!("Failed to load config: {}", self.config))?;
        config.apply(&self.overrides());
        Ok(config)
    }
}

/// Paire `--x` / `--no-x` : `None` garde la valeur de la configuration
fn switch(on: bool, off: bool) -> Option<bool> {
    match (on, off) {
        (true, _) => Some(true),
        (_, true) => Some(false),
        _ => None,
    }
}

#[derive(Args, Debug, Clone)]
pub struct HotspotsArgs {
    /// Points GeoJSON path
    #[arg(short, long, default_value = DEFAULT_POINTS)]
    pub input: PathBuf,

    /// Output GeoJSON path
    #[arg(short, long, default_value = DEFAULT_HOTSPOTS)]
    pub output: PathBuf,

    #[command(flatten)]
    pub params: ParamArgs,

    /// Save the run report as JSON
    #[arg(long)]
    pub report: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct PackageArgs {
    /// Points GeoJSON path
    #[arg(long, default_value = DEFAULT_POINTS)]
    pub points: PathBuf,

    /// Polygons GeoJSON path
    #[arg(long, default_value = DEFAULT_HOTSPOTS)]
    pub polys: PathBuf,

    /// Output directory for tiles
    #[arg(long, default_value = DEFAULT_DOCS_DIR)]
    pub docs_dir: PathBuf,

    /// Minimum zoom level
    #[arg(long, default_value_t = 4)]
    pub min_zoom: u8,

    /// Maximum zoom level
    #[arg(long, default_value_t = 14)]
    pub max_zoom: u8,
}

fn banner(title: &str) {
    info!("{}", "=".repeat(60));
    info!("{}", title);
    info!("{}", "=".repeat(60));
}

fn format_bounds(bounds: Option<Rect>) -> String {
    match bounds {
        Some(r) => format!(
            "[{:.4}, {:.4}, {:.4}, {:.4}]",
            r.min().x,
            r.min().y,
            r.max().x,
            r.max().y
        ),
        None => "[]".to_string(),
    }
}

/// Lit le CSV et écrit les points en GeoJSON
pub fn cmd_ingest(args: &IngestArgs) -> Result<()> {
    banner("INGEST: Starting CSV ingestion");

    let reprojector = SmartReprojector::new();
    let ingested = read_points_csv(&args.csv_path, &args.options(), &reprojector)?;
    geojson::write_points(&ingested.points, &args.output)?;

    let (x, y) = ingested.columns.names();
    info!("Ingested {} records", ingested.points.len());
    info!("Bounds: {}", format_bounds(ingested.points.bounds()));
    info!("CRS: {}", ingested.points.crs);
    banner("INGEST: Complete");

    println!(
        "Ingest complete: {} points ({}/{}, {} dropped) to {}",
        ingested.stats.loaded,
        x,
        y,
        ingested.stats.dropped(),
        args.output.display()
    );

    Ok(())
}

/// Calcule les hotspots et écrit les polygones en GeoJSON
pub fn cmd_hotspots(args: &HotspotsArgs) -> Result<HotspotsReport> {
    banner("HOTSPOTS: Starting hotspot generation");

    if !args.input.exists() {
        anyhow::bail!(
            "Points file not found: {}. Run 'ingest' command first",
            args.input.display()
        );
    }

    let config = args.params.resolve()?;
    let params = config.to_params()?;
    let points = geojson::read_points(&args.input)?;
    info!("Loaded {} points", points.len());

    let reprojector = SmartReprojector::new();
    let pipeline = HotspotPipeline::new(params, &reprojector)?;

    let mut report = HotspotsReport::new(&args.input.display().to_string(), pipeline.params());
    let run = {
        let mut observer = (TracingObserver, &mut report);
        pipeline.run(&points, &mut observer)?
    };

    geojson::write_clusters(&run.clusters, &args.output)?;
    report.set_output(&args.output);
    report.finalize(run.summary);

    if run.clusters.is_empty() {
        warn!("No hotspots generated with current parameters");
    } else {
        info!("Generated {} hotspot polygons", run.clusters.len());
        info!("Bounds: {}", format_bounds(run.clusters.bounds()));
        info!("Total area: {:.0} sqm", run.clusters.total_area());
    }
    banner("HOTSPOTS: Complete");

    report.display();
    if let Some(ref path) = args.report {
        report.save_to_file(path)?;
        info!("Report saved to {}", path.display());
    }

    Ok(report)
}

/// Tuile les deux couches dans le répertoire de publication
pub fn cmd_package(args: &PackageArgs) -> Result<()> {
    banner("PACKAGE: Starting tile packaging");

    if !args.points.exists() {
        anyhow::bail!(
            "Points file not found: {}. Run 'ingest' command first",
            args.points.display()
        );
    }
    if !args.polys.exists() {
        anyhow::bail!(
            "Polygons file not found: {}. Run 'hotspots' command first",
            args.polys.display()
        );
    }

    info!("Points: {} features", geojson::count_features(&args.points)?);
    info!("Polygons: {} features", geojson::count_features(&args.polys)?);

    let packager = TippecanoePackager::from_env();
    let tiles = package_layers(
        &args.points,
        &args.polys,
        &args.docs_dir,
        args.min_zoom,
        args.max_zoom,
        &packager,
    )
    .context("Packaging failed")?;

    for (name, path) in [("points", &tiles.points), ("hotspots", &tiles.hotspots)] {
        info!("{}: {} ({:.2} MB)", name, path.display(), size_mb(path));
    }
    banner("PACKAGE: Complete");

    println!(
        "Package complete: {} and {}",
        tiles.points.display(),
        tiles.hotspots.display()
    );

    Ok(())
}

/// Enchaîne ingest, hotspots et package avec les chemins par défaut
pub fn cmd_all(csv_path: &Path, params: &ParamArgs, min_zoom: u8, max_zoom: u8) -> Result<()> {
    info!("Running full pipeline");

    cmd_ingest(&IngestArgs::with_csv(csv_path.to_path_buf()))?;
    cmd_hotspots(&HotspotsArgs {
        input: PathBuf::from(DEFAULT_POINTS),
        output: PathBuf::from(DEFAULT_HOTSPOTS),
        params: params.clone(),
        report: None,
    })?;
    cmd_package(&PackageArgs {
        points: PathBuf::from(DEFAULT_POINTS),
        polys: PathBuf::from(DEFAULT_HOTSPOTS),
        docs_dir: PathBuf::from(DEFAULT_DOCS_DIR),
        min_zoom,
        max_zoom,
    })?;

    info!("Full pipeline complete");
    Ok(())
}

fn size_mb(path: &Path) -> f64 {
    std::fs::metadata(path)
        .map(|m| m.len() as f64 / (1024.0 * 1024.0))
        .unwrap_or(0.0)
}
