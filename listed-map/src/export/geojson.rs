//! GeoJSON : export streaming avec geozero, lecture avec le crate geojson

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use geo::Geometry;
use geojson::{FeatureCollection, GeoJson, Value};
use geozero::geojson::GeoJsonWriter;
use geozero::GeozeroGeometry;
use hotspots::{ClusterSet, Crs, PointSet, Properties, PropertyValue, SourcePoint};
use serde_json::{json, Map};
use tracing::{info, warn};

/// Exporte les clusters en GeoJSON
pub fn write_clusters(clusters: &ClusterSet, output_path: &Path) -> Result<()> {
    write_collection(output_path, &clusters.crs, clusters.len(), |writer| {
        for (i, cluster) in clusters.clusters.iter().enumerate() {
            if i > 0 {
                write!(writer, ",")?;
            }
            let mut props = Map::new();
            props.insert("id".into(), json!(cluster.id));
            props.insert("area_m2".into(), json!(cluster.area_m2));
            // Omis quand le comptage n'a pas été fait
            if let Some(count) = cluster.point_count {
                props.insert("point_count".into(), json!(count));
            }
            write_feature(
                writer,
                Some(cluster.id),
                &Geometry::Polygon(cluster.geometry.clone()),
                &props,
            )?;
        }
        Ok(())
    })
}

/// Exporte les points avec leurs attributs en GeoJSON
pub fn write_points(points: &PointSet, output_path: &Path) -> Result<()> {
    write_collection(output_path, &points.crs, points.len(), |writer| {
        for (i, point) in points.points.iter().enumerate() {
            if i > 0 {
                write!(writer, ",")?;
            }
            let props = point
                .properties
                .iter()
                .map(|(k, v)| {
                    serde_json::to_value(v)
                        .map(|value| (k.clone(), value))
                        .with_context(|| {
                            format!("Failed to serialize property {} of point {}", k, i)
                        })
                })
                .collect::<Result<Map<String, serde_json::Value>>>()?;
            write_feature(
                writer,
                None,
                &Geometry::Point(geo::Point::new(point.x, point.y)),
                &props,
            )?;
        }
        Ok(())
    })
}

/// FeatureCollection avec CRS nommé ; `body` écrit les features
fn write_collection<F>(output_path: &Path, crs: &Crs, count: usize, body: F) -> Result<()>
where
    F: FnOnce(&mut BufWriter<File>) -> Result<()>,
{
    if let Some(parent) = output_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .context(format!("Failed to create directory: {}", parent.display()))?;
    }
    let file = File::create(output_path)
        .context(format!("Failed to create file: {}", output_path.display()))?;
    let mut writer = BufWriter::new(file);

    write!(
        writer,
        r#"{{"type":"FeatureCollection","crs":{{"type":"name","properties":{{"name":{}}}}},"features":["#,
        serde_json::to_string(&crs_urn(crs))?
    )?;
    body(&mut writer)?;
    write!(writer, "]}}")?;
    writer.flush()?;

    let size_mb = std::fs::metadata(output_path)
        .map(|m| m.len() as f64 / (1024.0 * 1024.0))
        .unwrap_or(0.0);
    info!(
        records = count,
        size_mb = format!("{:.2}", size_mb),
        "Saved {} records to {}",
        count,
        output_path.display()
    );

    Ok(())
}

/// Écrit une feature en GeoJSON
fn write_feature<W: Write>(
    writer: &mut W,
    id: Option<usize>,
    geometry: &Geometry,
    properties: &Map<String, serde_json::Value>,
) -> Result<()> {
    write!(writer, r#"{{"type":"Feature","#)?;
    if let Some(id) = id {
        write!(writer, r#""id":{},"#, id)?;
    }

    // Géométrie via geozero
    write!(writer, r#""geometry":"#)?;
    let mut geom_buf = Vec::new();
    let mut geom_writer = GeoJsonWriter::new(&mut geom_buf);
    geometry.process_geom(&mut geom_writer)?;
    writer.write_all(&geom_buf)?;

    write!(writer, r#","properties":"#)?;
    serde_json::to_writer(&mut *writer, properties)?;
    write!(writer, "}}")?;

    Ok(())
}

/// Nom OGC d'un système de référence
fn crs_urn(crs: &Crs) -> String {
    match crs.epsg() {
        Some(code) => format!("urn:ogc:def:crs:EPSG::{}", code),
        None => crs.as_str().to_string(),
    }
}

/// Système déclaré par le membre `crs` d'une FeatureCollection (WGS84 sinon)
fn declared_crs(collection: &FeatureCollection) -> Crs {
    let name = collection
        .foreign_members
        .as_ref()
        .and_then(|m| m.get("crs"))
        .and_then(|crs| crs.get("properties"))
        .and_then(|p| p.get("name"))
        .and_then(|n| n.as_str());

    match name {
        Some(name) if name.contains("CRS84") => Crs::wgs84(),
        Some(name) => match name.rsplit(':').next().and_then(|c| c.parse::<u32>().ok()) {
            Some(code) => Crs::from_epsg(code),
            None => Crs::new(name),
        },
        None => Crs::wgs84(),
    }
}

fn load_collection(path: &Path) -> Result<FeatureCollection> {
    let content = std::fs::read_to_string(path)
        .context(format!("Failed to read GeoJSON: {}", path.display()))?;
    let geojson: GeoJson = content
        .parse()
        .context(format!("Failed to parse GeoJSON: {}", path.display()))?;

    match geojson {
        GeoJson::FeatureCollection(fc) => Ok(fc),
        GeoJson::Feature(f) => Ok(FeatureCollection {
            bbox: None,
            features: vec![f],
            foreign_members: None,
        }),
        GeoJson::Geometry(_) => anyhow::bail!(
            "Expected a FeatureCollection in {}, found a bare geometry",
            path.display()
        ),
    }
}

/// Lit les points d'un fichier GeoJSON ; les autres géométries sont ignorées
pub fn read_points(path: &Path) -> Result<PointSet> {
    let collection = load_collection(path)?;
    let crs = declared_crs(&collection);

    let mut skipped = 0usize;
    let mut points = Vec::with_capacity(collection.features.len());

    for feature in collection.features {
        let coords = match feature.geometry.as_ref().map(|g| &g.value) {
            Some(Value::Point(c)) if c.len() >= 2 => (c[0], c[1]),
            _ => {
                skipped += 1;
                continue;
            }
        };

        let properties: Properties = feature
            .properties
            .unwrap_or_default()
            .into_iter()
            .map(|(k, v)| (k, property_from_json(v)))
            .collect();
        points.push(SourcePoint::with_properties(coords.0, coords.1, properties));
    }

    if skipped > 0 {
        warn!("Skipped {} non-point features in {}", skipped, path.display());
    }
    info!(records = points.len(), crs = %crs, "Loaded {} records from {}", points.len(), path.display());

    Ok(PointSet::new(crs, points))
}

/// Nombre de features d'un fichier GeoJSON
pub fn count_features(path: &Path) -> Result<usize> {
    Ok(load_collection(path)?.features.len())
}

fn property_from_json(value: serde_json::Value) -> Option<PropertyValue> {
    match value {
        serde_json::Value::Null => None,
        serde_json::Value::Bool(b) => Some(PropertyValue::Bool(b)),
        serde_json::Value::Number(n) => match n.as_i64() {
            Some(i) => Some(PropertyValue::Integer(i)),
            None => n.as_f64().map(PropertyValue::Float),
        },
        serde_json::Value::String(s) => Some(PropertyValue::Text(s)),
        other => Some(PropertyValue::Text(other.to_string())),
    }
}
