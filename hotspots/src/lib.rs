//! # hotspots
//!
//! Calcul de zones de concentration (hotspots) à partir d'un nuage de points.
//!
//! ## Features
//!
//! - Buffer circulaire autour de chaque point, en système métrique
//! - Union par lots (séquentielle ou parallèle avec `rayon`)
//! - Érosion optionnelle pour séparer les groupes reliés par un fil
//! - Filtrage par surface ou par nombre de points (index `rstar`)
//! - Types `geo` pour l'interopérabilité avec l'écosystème Rust géospatial
//!
//! La reprojection est déléguée à un [`Reprojector`] fourni par l'appelant.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use hotspots::{generate_hotspots, Crs, HotspotParams, PointSet, TracingObserver};
//!
//! let points = PointSet::new(Crs::wgs84(), load_points()?);
//! let run = generate_hotspots(&points, &HotspotParams::default(), &reprojector, &mut TracingObserver)?;
//!
//! for cluster in &run.clusters.clusters {
//!     println!("{}: {:.0} m²", cluster.id, cluster.area_m2);
//! }
//! ```

pub mod assembly;
pub mod error;
pub mod filter;
pub mod geometry;
pub mod observer;
pub mod params;
pub mod pipeline;
pub mod reproject;
pub mod types;

pub use error::HotspotError;
pub use filter::{FilterCriteria, FilterOutcome, FilteredPolygon, PointIndex};
pub use observer::{
    NoopObserver, PipelineObserver, PipelineWarning, RecordingObserver, Stage, StageReport,
    TracingObserver,
};
pub use params::{FilterPolicy, HotspotParams};
pub use pipeline::{generate_hotspots, HotspotPipeline, HotspotRun, RunSummary};
pub use reproject::{reproject_coords, reproject_polygon, Crs, IdentityReprojector, Reprojector};
pub use types::{
    Cluster, ClusterSet, PointSet, Properties, PropertyValue, SourcePoint,
    POINT_COUNT_NOT_COMPUTED,
};
