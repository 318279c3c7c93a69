//! Lecture du CSV des bâtiments classés
//!
//! Les noms de colonnes sont normalisés, les colonnes de coordonnées
//! détectées (ou imposées), les lignes sans coordonnées exploitables
//! écartées, puis les points sont reprojetés en WGS84.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};
use geo::Coord;
use hotspots::{reproject_coords, Crs, PointSet, Properties, PropertyValue, Reprojector, SourcePoint};
use regex::Regex;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Nombre de colonnes citées dans les messages d'erreur
const MAX_LISTED_COLUMNS: usize = 20;

/// Couples de colonnes reconnus automatiquement, par ordre de priorité
const GEOGRAPHIC_CANDIDATES: &[(&str, &str)] = &[("longitude", "latitude"), ("lon", "lat")];
const PROJECTED_CANDIDATES: &[(&str, &str)] = &[("easting", "northing"), ("x", "y")];

/// Erreurs de structure du CSV
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("Columns {x}/{y} not found. Available: {available:?}")]
    ColumnsNotFound {
        x: String,
        y: String,
        available: Vec<String>,
    },

    #[error("Could not auto-detect coordinate columns. Please specify them. Available: {available:?}")]
    NoCoordinateColumns { available: Vec<String> },

    #[error("Both --{0}-col options must be given together")]
    IncompleteColumnPair(&'static str),
}

/// Colonnes portant les coordonnées
#[derive(Debug, Clone, PartialEq)]
pub enum CoordinateColumns {
    /// Longitude/latitude en degrés (EPSG:4326)
    Geographic { lon: String, lat: String },
    /// Coordonnées projetées dans `crs`
    Projected { x: String, y: String, crs: Crs },
}

impl CoordinateColumns {
    pub fn names(&self) -> (&str, &str) {
        match self {
            Self::Geographic { lon, lat } => (lon, lat),
            Self::Projected { x, y, .. } => (x, y),
        }
    }

    pub fn crs(&self) -> Crs {
        match self {
            Self::Geographic { .. } => Crs::wgs84(),
            Self::Projected { crs, .. } => crs.clone(),
        }
    }
}

/// Options de lecture
#[derive(Debug, Clone)]
pub struct IngestOptions {
    pub lon_col: Option<String>,
    pub lat_col: Option<String>,
    pub x_col: Option<String>,
    pub y_col: Option<String>,
    /// Système des colonnes x/y
    pub src_crs: Crs,
    /// Système des points produits
    pub target_crs: Crs,
}

impl Default for IngestOptions {
    fn default() -> Self {
        Self {
            lon_col: None,
            lat_col: None,
            x_col: None,
            y_col: None,
            src_crs: Crs::from_epsg(27700),
            target_crs: Crs::wgs84(),
        }
    }
}

/// Compteurs de lecture
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestStats {
    pub rows_read: usize,
    /// Coordonnée vide ou non numérique
    pub missing_coordinates: usize,
    /// Coordonnée non finie, avant ou après reprojection
    pub invalid_coordinates: usize,
    pub loaded: usize,
}

impl IngestStats {
    pub fn dropped(&self) -> usize {
        self.missing_coordinates + self.invalid_coordinates
    }
}

/// Résultat de la lecture
#[derive(Debug, Clone)]
pub struct Ingested {
    pub points: PointSet,
    pub columns: CoordinateColumns,
    pub stats: IngestStats,
}

/// Type déduit d'une colonne d'attributs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ColumnType {
    Integer,
    Float,
    Text,
}

/// Normalisation des noms de colonnes : trim, minuscules, suites
/// d'espaces et de tirets → `_`
pub struct ColumnNormalizer {
    separators: Regex,
}

impl ColumnNormalizer {
    pub fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            separators: Regex::new(r"[\s\-]+")?,
        })
    }

    pub fn normalize(&self, name: &str) -> String {
        self.separators
            .replace_all(&name.trim().to_lowercase(), "_")
            .into_owned()
    }
}

/// Choisit les colonnes de coordonnées parmi les en-têtes normalisés
pub fn detect_columns(
    headers: &[String],
    options: &IngestOptions,
    normalizer: &ColumnNormalizer,
) -> Result<CoordinateColumns, IngestError> {
    let available = || headers.iter().take(MAX_LISTED_COLUMNS).cloned().collect::<Vec<_>>();
    let has = |name: &str| headers.iter().any(|h| h == name);

    match (&options.lon_col, &options.lat_col) {
        (Some(lon), Some(lat)) => {
            let (lon, lat) = (normalizer.normalize(lon), normalizer.normalize(lat));
            if !has(&lon) || !has(&lat) {
                return Err(IngestError::ColumnsNotFound {
                    x: lon,
                    y: lat,
                    available: available(),
                });
            }
            info!(lon = %lon, lat = %lat, "Using specified lon/lat columns");
            return Ok(CoordinateColumns::Geographic { lon, lat });
        }
        (None, None) => {}
        _ => return Err(IngestError::IncompleteColumnPair("lon/lat")),
    }

    match (&options.x_col, &options.y_col) {
        (Some(x), Some(y)) => {
            let (x, y) = (normalizer.normalize(x), normalizer.normalize(y));
            if !has(&x) || !has(&y) {
                return Err(IngestError::ColumnsNotFound {
                    x,
                    y,
                    available: available(),
                });
            }
            info!(x = %x, y = %y, crs = %options.src_crs, "Using specified x/y columns");
            return Ok(CoordinateColumns::Projected {
                x,
                y,
                crs: options.src_crs.clone(),
            });
        }
        (None, None) => {}
        _ => return Err(IngestError::IncompleteColumnPair("x/y")),
    }

    for &(lon, lat) in GEOGRAPHIC_CANDIDATES {
        if has(lon) && has(lat) {
            info!("Auto-detected: {}/{} columns", lon, lat);
            return Ok(CoordinateColumns::Geographic {
                lon: lon.to_string(),
                lat: lat.to_string(),
            });
        }
    }
    for &(x, y) in PROJECTED_CANDIDATES {
        if has(x) && has(y) {
            info!("Auto-detected: {}/{} columns with CRS {}", x, y, options.src_crs);
            return Ok(CoordinateColumns::Projected {
                x: x.to_string(),
                y: y.to_string(),
                crs: options.src_crs.clone(),
            });
        }
    }

    Err(IngestError::NoCoordinateColumns {
        available: available(),
    })
}

/// Lit un fichier CSV de points
pub fn read_points_csv(
    path: &Path,
    options: &IngestOptions,
    reprojector: &dyn Reprojector,
) -> Result<Ingested> {
    info!(path = %path.display(), "Reading CSV");
    let file = File::open(path).context(format!("CSV file not found: {}", path.display()))?;
    read_points(file, options, reprojector)
        .with_context(|| format!("Failed to ingest {}", path.display()))
}

/// Lit des points depuis n'importe quelle source CSV
pub fn read_points<R: Read>(
    input: R,
    options: &IngestOptions,
    reprojector: &dyn Reprojector,
) -> Result<Ingested> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::Headers)
        .from_reader(input);

    let normalizer = ColumnNormalizer::new()?;
    let headers: Vec<String> = reader
        .headers()
        .context("Failed to read CSV header")?
        .iter()
        .map(|h| normalizer.normalize(h))
        .collect();
    debug!(columns = ?headers.iter().take(10).collect::<Vec<_>>(), "Normalized column names");

    let columns = detect_columns(&headers, options, &normalizer)?;
    let (xi, yi) = {
        let (x, y) = columns.names();
        (column_index(&headers, x)?, column_index(&headers, y)?)
    };

    let mut stats = IngestStats::default();
    let mut coords = Vec::new();
    let mut rows = Vec::new();

    for (line, record) in reader.records().enumerate() {
        let record = record.context(format!("Failed to read CSV record {}", line + 1))?;
        stats.rows_read += 1;

        let cell = |i: usize| record.get(i).map(str::trim).unwrap_or("");
        let (x, y) = match (parse_number(cell(xi)), parse_number(cell(yi))) {
            (Some(x), Some(y)) => (x, y),
            _ => {
                stats.missing_coordinates += 1;
                continue;
            }
        };
        if !x.is_finite() || !y.is_finite() {
            stats.invalid_coordinates += 1;
            continue;
        }

        coords.push(Coord { x, y });
        rows.push(
            (0..headers.len())
                .filter(|&i| i != xi && i != yi)
                .map(|i| cell(i).to_string())
                .collect::<Vec<String>>(),
        );
    }

    info!("Read {} rows from CSV", stats.rows_read);
    if stats.missing_coordinates > 0 {
        warn!(
            "Dropped {} rows with missing coordinates",
            stats.missing_coordinates
        );
    }
    if let CoordinateColumns::Geographic { .. } = columns {
        warn_out_of_range(&coords);
    }

    let source_crs = columns.crs();
    let projected = reproject_coords(reprojector, &coords, &source_crs, &options.target_crs)?;
    if !source_crs.same_as(&options.target_crs) {
        info!(
            "Transformed {} points from {} to {}",
            projected.len(),
            source_crs,
            options.target_crs
        );
    }

    let property_names: Vec<&String> = headers
        .iter()
        .enumerate()
        .filter(|&(i, _)| i != xi && i != yi)
        .map(|(_, h)| h)
        .collect();
    let types: Vec<ColumnType> = (0..property_names.len())
        .map(|col| infer_column_type(rows.iter().map(|r| r[col].as_str())))
        .collect();

    let mut points = Vec::with_capacity(projected.len());
    for (coord, row) in projected.into_iter().zip(rows) {
        if !coord.x.is_finite() || !coord.y.is_finite() {
            stats.invalid_coordinates += 1;
            continue;
        }
        let properties: Properties = property_names
            .iter()
            .zip(&types)
            .zip(row)
            .map(|((name, &ty), raw)| ((*name).clone(), typed_value(&raw, ty)))
            .collect();
        points.push(SourcePoint::with_properties(coord.x, coord.y, properties));
    }
    if stats.invalid_coordinates > 0 {
        warn!(
            "Found {} invalid coordinates, removing them",
            stats.invalid_coordinates
        );
    }

    stats.loaded = points.len();
    info!(
        records_loaded = stats.loaded,
        records_dropped = stats.dropped(),
        "Successfully loaded {} records from {} total",
        stats.loaded,
        stats.rows_read
    );

    Ok(Ingested {
        points: PointSet::new(options.target_crs.clone(), points),
        columns,
        stats,
    })
}

fn column_index(headers: &[String], name: &str) -> Result<usize> {
    headers
        .iter()
        .position(|h| h == name)
        .context(format!("Column {} not found", name))
}

#[inline]
fn parse_number(s: &str) -> Option<f64> {
    if s.is_empty() {
        return None;
    }
    fast_float::parse(s).ok()
}

fn warn_out_of_range(coords: &[Coord]) {
    if coords.iter().any(|c| !(-180.0..=180.0).contains(&c.x)) {
        warn!("Longitude values outside [-180, 180] range");
    }
    if coords.iter().any(|c| !(-90.0..=90.0).contains(&c.y)) {
        warn!("Latitude values outside [-90, 90] range");
    }
}

/// Type le plus précis compatible avec toutes les valeurs non vides
fn infer_column_type<'a>(values: impl Iterator<Item = &'a str>) -> ColumnType {
    let (mut int, mut float, mut seen) = (true, true, false);

    for v in values.filter(|v| !v.is_empty()) {
        seen = true;
        int &= v.parse::<i64>().is_ok();
        float &= fast_float::parse::<f64, _>(v).is_ok();
        if !int && !float {
            return ColumnType::Text;
        }
    }

    match (seen, int, float) {
        (true, true, _) => ColumnType::Integer,
        (true, false, true) => ColumnType::Float,
        _ => ColumnType::Text,
    }
}

fn typed_value(raw: &str, ty: ColumnType) -> Option<PropertyValue> {
    if raw.is_empty() {
        return None;
    }
    match ty {
        ColumnType::Integer => raw.parse().ok().map(PropertyValue::Integer),
        ColumnType::Float => fast_float::parse(raw)
            .ok()
            .filter(|v: &f64| v.is_finite())
            .map(PropertyValue::Float),
        ColumnType::Text => Some(PropertyValue::Text(raw.to_string())),
    }
}
