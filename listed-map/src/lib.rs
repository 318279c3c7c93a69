//! # listed-map
//!
//! Carte des bâtiments classés : des points d'un CSV aux tuiles vectorielles.
//!
//! ## Features
//!
//! - Ingestion CSV avec détection des colonnes de coordonnées
//! - Calcul des hotspots (voir le crate `hotspots`)
//! - Reprojection légère WGS84 / Web Mercator / British National Grid
//! - Export GeoJSON et packaging PMTiles via tippecanoe
//!
//! ## Usage CLI
//!
//! ```bash
//! listed-map ingest --csv-path data/listed_buildings.csv
//! listed-map hotspots --config native --report build/report.json
//! listed-map package --min-zoom 4 --max-zoom 14
//! listed-map all --buffer 150 --negative-buffer 120
//! ```

pub mod cli;
pub mod config;
pub mod export;
pub mod ingest;
pub mod report;
pub mod reproject_lite;
pub mod tiles;

pub use config::HotspotsConfig;
pub use report::{HotspotsReport, RunStatus};
pub use reproject_lite::{LiteReprojector, SmartReprojector};
pub use tiles::{TileJob, TilePackager, TippecanoePackager};
