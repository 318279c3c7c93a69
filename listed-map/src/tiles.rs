//! Packaging des couches en tuiles vectorielles (tippecanoe + pmtiles)

use std::ffi::OsString;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::{bail, Context, Result};
use tracing::{debug, info, warn};

/// Zoom maximal accepté
pub const MAX_ZOOM: u8 = 24;

pub const POINTS_LAYER: &str = "listed_buildings";
pub const HOTSPOTS_LAYER: &str = "hotspots";

/// Une couche à tuiler
#[derive(Debug, Clone, PartialEq)]
pub struct TileJob {
    /// GeoJSON source
    pub input: PathBuf,
    /// Nom de la couche dans les tuiles
    pub layer: String,
    pub min_zoom: u8,
    pub max_zoom: u8,
    /// Abandonner les features les plus denses quand une tuile déborde
    pub drop_densest: bool,
    /// Conserver tous les attributs
    pub preserve_attributes: bool,
    /// Archive demandée (.pmtiles)
    pub output: PathBuf,
}

/// Construit une archive de tuiles et retourne son chemin effectif
pub trait TilePackager {
    fn package(&self, job: &TileJob) -> Result<PathBuf>;
}

/// Packager basé sur les outils externes `tippecanoe` et `pmtiles`
#[derive(Debug, Clone)]
pub struct TippecanoePackager {
    pub tippecanoe: PathBuf,
    pub pmtiles: PathBuf,
    /// Répertoire des MBTiles intermédiaires
    pub temp_dir: PathBuf,
}

impl Default for TippecanoePackager {
    fn default() -> Self {
        Self {
            tippecanoe: PathBuf::from("tippecanoe"),
            pmtiles: PathBuf::from("pmtiles"),
            temp_dir: PathBuf::from("build/temp_tiles"),
        }
    }
}

impl TippecanoePackager {
    /// Emplacements des outils depuis `TIPPECANOE_BIN` / `PMTILES_BIN`
    pub fn from_env() -> Self {
        let mut packager = Self::default();
        if let Ok(bin) = std::env::var("TIPPECANOE_BIN") {
            packager.tippecanoe = PathBuf::from(bin);
        }
        if let Ok(bin) = std::env::var("PMTILES_BIN") {
            packager.pmtiles = PathBuf::from(bin);
        }
        packager
    }

    pub fn with_temp_dir(mut self, temp_dir: impl Into<PathBuf>) -> Self {
        self.temp_dir = temp_dir.into();
        self
    }

    /// Arguments de tippecanoe pour un job
    pub fn tippecanoe_args(job: &TileJob, mbtiles: &Path) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec![
            "-o".into(),
            mbtiles.into(),
            "-l".into(),
            job.layer.clone().into(),
            "-z".into(),
            job.max_zoom.to_string().into(),
            "-Z".into(),
            job.min_zoom.to_string().into(),
            "--force".into(),
            "--no-feature-limit".into(),
            "--no-tile-size-limit".into(),
        ];
        if job.drop_densest {
            args.push("--drop-densest-as-needed".into());
        }
        if job.preserve_attributes {
            args.extend(["-y", "", "-pC"].map(OsString::from));
        }
        args.push(job.input.clone().into());
        args
    }

    fn build_mbtiles(&self, job: &TileJob) -> Result<PathBuf> {
        std::fs::create_dir_all(&self.temp_dir).context(format!(
            "Failed to create directory: {}",
            self.temp_dir.display()
        ))?;
        let mbtiles = self.temp_dir.join(format!("{}.mbtiles", job.layer));

        info!(
            layer = %job.layer,
            min_zoom = job.min_zoom,
            max_zoom = job.max_zoom,
            "Running tippecanoe for {}",
            job.input.display()
        );
        let args = Self::tippecanoe_args(job, &mbtiles);
        debug!("Command: {} {:?}", self.tippecanoe.display(), args);

        let output = match Command::new(&self.tippecanoe).args(&args).output() {
            Ok(output) => output,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                bail!("{} not found in PATH", self.tippecanoe.display())
            }
            Err(e) => {
                return Err(e).context(format!("Failed to run {}", self.tippecanoe.display()))
            }
        };

        if !output.status.success() {
            bail!(
                "tippecanoe failed for layer {}: {}",
                job.layer,
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }
        if !mbtiles.exists() {
            bail!("MBTiles file not created: {}", mbtiles.display());
        }
        info!(
            size_mb = format!("{:.2}", file_size_mb(&mbtiles)),
            "Created MBTiles at {}",
            mbtiles.display()
        );

        Ok(mbtiles)
    }

    /// Convertit en PMTiles ; à défaut, copie le MBTiles à côté de la sortie demandée
    fn convert(&self, mbtiles: &Path, pmtiles: &Path) -> Result<PathBuf> {
        if let Some(parent) = pmtiles.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .context(format!("Failed to create directory: {}", parent.display()))?;
        }

        info!("Converting {} to PMTiles", mbtiles.display());
        let result = Command::new(&self.pmtiles)
            .arg("convert")
            .arg(mbtiles)
            .arg(pmtiles)
            .output();

        match result {
            Ok(output) if output.status.success() => {
                if !pmtiles.exists() {
                    bail!("PMTiles file not created: {}", pmtiles.display());
                }
                info!(
                    size_mb = format!("{:.2}", file_size_mb(pmtiles)),
                    "Created PMTiles at {}",
                    pmtiles.display()
                );
                Ok(pmtiles.to_path_buf())
            }
            Ok(output) => {
                warn!(
                    "PMTiles conversion failed: {}",
                    String::from_utf8_lossy(&output.stderr).trim()
                );
                keep_mbtiles(mbtiles, pmtiles)
            }
            Err(e) => {
                warn!("{} unavailable ({}), keeping MBTiles format", self.pmtiles.display(), e);
                keep_mbtiles(mbtiles, pmtiles)
            }
        }
    }
}

impl TilePackager for TippecanoePackager {
    fn package(&self, job: &TileJob) -> Result<PathBuf> {
        let mbtiles = self.build_mbtiles(job)?;
        let archive = self.convert(&mbtiles, &job.output)?;

        if let Err(e) = std::fs::remove_file(&mbtiles) {
            warn!("Could not clean up {}: {}", mbtiles.display(), e);
        }
        Ok(archive)
    }
}

fn keep_mbtiles(mbtiles: &Path, pmtiles: &Path) -> Result<PathBuf> {
    let fallback = pmtiles.with_extension("mbtiles");
    std::fs::copy(mbtiles, &fallback).context(format!(
        "Failed to copy {} to {}",
        mbtiles.display(),
        fallback.display()
    ))?;
    Ok(fallback)
}

fn file_size_mb(path: &Path) -> f64 {
    std::fs::metadata(path)
        .map(|m| m.len() as f64 / (1024.0 * 1024.0))
        .unwrap_or(0.0)
}

/// Archives produites par [`package_layers`]
#[derive(Debug, Clone, PartialEq)]
pub struct PackagedTiles {
    pub points: PathBuf,
    pub hotspots: PathBuf,
}

/// Tuile les points et les hotspots dans `docs_dir`
pub fn package_layers(
    points_geojson: &Path,
    polys_geojson: &Path,
    docs_dir: &Path,
    min_zoom: u8,
    max_zoom: u8,
    packager: &dyn TilePackager,
) -> Result<PackagedTiles> {
    if min_zoom > max_zoom || max_zoom > MAX_ZOOM {
        bail!(
            "Invalid zoom range {}-{}: expected min <= max <= {}",
            min_zoom,
            max_zoom,
            MAX_ZOOM
        );
    }
    if !points_geojson.exists() {
        bail!("Points GeoJSON not found: {}", points_geojson.display());
    }
    if !polys_geojson.exists() {
        bail!("Polygons GeoJSON not found: {}", polys_geojson.display());
    }

    std::fs::create_dir_all(docs_dir)
        .context(format!("Failed to create directory: {}", docs_dir.display()))?;

    let points = packager.package(&TileJob {
        input: points_geojson.to_path_buf(),
        layer: POINTS_LAYER.to_string(),
        min_zoom,
        max_zoom,
        drop_densest: true,
        preserve_attributes: true,
        output: docs_dir.join(format!("{}.pmtiles", POINTS_LAYER)),
    })?;

    let hotspots = packager.package(&TileJob {
        input: polys_geojson.to_path_buf(),
        layer: HOTSPOTS_LAYER.to_string(),
        min_zoom,
        max_zoom,
        drop_densest: false,
        preserve_attributes: true,
        output: docs_dir.join(format!("{}.pmtiles", HOTSPOTS_LAYER)),
    })?;

    info!("Packaging complete. Tiles saved to {}", docs_dir.display());
    Ok(PackagedTiles { points, hotspots })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    /// Écrit un fichier factice à la place de l'archive
    #[derive(Default)]
    struct FakePackager {
        jobs: RefCell<Vec<TileJob>>,
    }

    impl TilePackager for FakePackager {
        fn package(&self, job: &TileJob) -> Result<PathBuf> {
            std::fs::write(&job.output, b"tiles")?;
            self.jobs.borrow_mut().push(job.clone());
            Ok(job.output.clone())
        }
    }

    fn job() -> TileJob {
        TileJob {
            input: PathBuf::from("build/hotspots.geojson"),
            layer: "hotspots".into(),
            min_zoom: 4,
            max_zoom: 14,
            drop_densest: false,
            preserve_attributes: true,
            output: PathBuf::from("docs/tiles/hotspots.pmtiles"),
        }
    }

    fn inputs(dir: &Path) -> (PathBuf, PathBuf) {
        let points = dir.join("points.geojson");
        let polys = dir.join("polys.geojson");
        std::fs::write(&points, "{}").unwrap();
        std::fs::write(&polys, "{}").unwrap();
        (points, polys)
    }

    #[test]
    fn test_tippecanoe_args() {
        let args = TippecanoePackager::tippecanoe_args(&job(), Path::new("tmp/hotspots.mbtiles"));
        let args: Vec<_> = args.iter().map(|a| a.to_string_lossy().into_owned()).collect();

        assert_eq!(
            args,
            vec![
                "-o",
                "tmp/hotspots.mbtiles",
                "-l",
                "hotspots",
                "-z",
                "14",
                "-Z",
                "4",
                "--force",
                "--no-feature-limit",
                "--no-tile-size-limit",
                "-y",
                "",
                "-pC",
                "build/hotspots.geojson",
            ]
        );
    }

    #[test]
    fn test_drop_densest_flag() {
        let mut job = job();
        job.drop_densest = true;
        job.preserve_attributes = false;
        let args = TippecanoePackager::tippecanoe_args(&job, Path::new("out.mbtiles"));

        assert!(args.contains(&OsString::from("--drop-densest-as-needed")));
        assert!(!args.contains(&OsString::from("-pC")));
    }

    #[test]
    fn test_missing_tippecanoe_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let packager = TippecanoePackager {
            tippecanoe: PathBuf::from("tippecanoe-does-not-exist-here"),
            ..Default::default()
        }
        .with_temp_dir(dir.path().join("temp"));

        let err = packager.package(&job()).unwrap_err();
        assert!(err.to_string().contains("not found"));
    }

    #[test]
    fn test_fallback_keeps_mbtiles() {
        let dir = tempfile::tempdir().unwrap();
        let mbtiles = dir.path().join("layer.mbtiles");
        std::fs::write(&mbtiles, b"mbtiles").unwrap();
        let packager = TippecanoePackager {
            pmtiles: PathBuf::from("pmtiles-does-not-exist-here"),
            ..Default::default()
        };

        let out = packager
            .convert(&mbtiles, &dir.path().join("docs/layer.pmtiles"))
            .unwrap();

        assert_eq!(out, dir.path().join("docs/layer.mbtiles"));
        assert_eq!(std::fs::read(&out).unwrap(), b"mbtiles");
    }

    #[test]
    fn test_package_layers() {
        let dir = tempfile::tempdir().unwrap();
        let (points, polys) = inputs(dir.path());
        let docs = dir.path().join("docs/tiles");
        let packager = FakePackager::default();

        let tiles = package_layers(&points, &polys, &docs, 4, 14, &packager).unwrap();

        assert_eq!(tiles.points, docs.join("listed_buildings.pmtiles"));
        assert_eq!(tiles.hotspots, docs.join("hotspots.pmtiles"));
        let jobs = packager.jobs.borrow();
        assert_eq!(jobs.len(), 2);
        assert!(jobs[0].drop_densest);
        assert!(!jobs[1].drop_densest);
        assert!(jobs.iter().all(|j| j.preserve_attributes));
    }

    #[test]
    fn test_invalid_zoom_range() {
        let dir = tempfile::tempdir().unwrap();
        let (points, polys) = inputs(dir.path());
        let packager = FakePackager::default();

        assert!(package_layers(&points, &polys, dir.path(), 10, 4, &packager).is_err());
        assert!(package_layers(&points, &polys, dir.path(), 4, 25, &packager).is_err());
        assert!(packager.jobs.borrow().is_empty());
    }

    #[test]
    fn test_missing_input() {
        let dir = tempfile::tempdir().unwrap();
        let (points, _) = inputs(dir.path());
        let packager = FakePackager::default();

        let err = package_layers(
            &points,
            &dir.path().join("missing.geojson"),
            dir.path(),
            4,
            14,
            &packager,
        )
        .unwrap_err();
        assert!(err.to_string().contains("Polygons GeoJSON not found"));
    }
}
