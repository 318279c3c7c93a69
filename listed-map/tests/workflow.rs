//! Tests d'intégration : CSV → GeoJSON → hotspots → GeoJSON
//!
//! Exécution:
//! ```bash
//! cargo test -p listed-map --test workflow
//! ```

use std::path::Path;

use geo::{Area, Contains, Point};
use hotspots::{
    reproject_polygon, Crs, HotspotPipeline, PropertyValue, RecordingObserver, Stage,
};
use listed_map::export::geojson;
use listed_map::ingest::{read_points_csv, IngestOptions};
use listed_map::{HotspotsConfig, SmartReprojector};

/// Un groupe de 12 bâtiments espacés de 30 m et un bâtiment isolé (BNG)
fn write_csv(path: &Path) {
    let mut csv = String::from("List Entry,Name,Grade,Easting,Northing\n");
    let mut entry = 1000;
    for row in 0..3 {
        for col in 0..4 {
            entry += 1;
            csv.push_str(&format!(
                "{},Building {},II,{},{}\n",
                entry,
                entry,
                530000 + col * 30,
                180000 + row * 30
            ));
        }
    }
    csv.push_str("2000,Lonely Mill,II*,540000,190000\n");
    csv.push_str("2001,No Location,II,,\n");
    std::fs::write(path, csv).unwrap();
}

#[test]
fn test_csv_to_hotspots() {
    let dir = tempfile::tempdir().unwrap();
    let csv = dir.path().join("listed.csv");
    let points_path = dir.path().join("build/listed_buildings.geojson");
    let hotspots_path = dir.path().join("build/hotspots.geojson");
    write_csv(&csv);

    let reprojector = SmartReprojector::new();

    // Ingest : easting/northing détectés, reprojetés en WGS84
    let ingested = read_points_csv(&csv, &IngestOptions::default(), &reprojector).unwrap();
    assert_eq!(ingested.stats.rows_read, 14);
    assert_eq!(ingested.stats.loaded, 13);
    assert_eq!(ingested.stats.missing_coordinates, 1);
    assert_eq!(ingested.points.crs, Crs::wgs84());
    geojson::write_points(&ingested.points, &points_path).unwrap();

    // Hotspots avec le preset natif
    let points = geojson::read_points(&points_path).unwrap();
    assert_eq!(points.len(), 13);
    let params = HotspotsConfig::from_preset("native")
        .unwrap()
        .to_params()
        .unwrap();
    let pipeline = HotspotPipeline::new(params, &reprojector).unwrap();
    let mut observer = RecordingObserver::default();
    let run = pipeline.run(&points, &mut observer).unwrap();

    assert_eq!(run.clusters.crs, Crs::wgs84());
    assert_eq!(run.clusters.len(), 1);
    let cluster = &run.clusters.clusters[0];
    assert_eq!(cluster.point_count, Some(12));
    assert_eq!(run.summary.components, 2);
    assert_eq!(run.summary.excluded_sparse, 1);

    // Le hotspot publié couvre les points du groupe, pas le bâtiment isolé
    let inside = points.points[0].coord();
    let lonely = points
        .points
        .iter()
        .find(|p| {
            p.properties.get("name") == Some(&Some(PropertyValue::Text("Lonely Mill".into())))
        })
        .unwrap();
    assert!(cluster.geometry.contains(&Point::from(inside)));
    assert!(!cluster.geometry.contains(&Point::from(lonely.coord())));

    let stages: Vec<_> = observer.stages.iter().map(|s| s.stage).collect();
    assert_eq!(stages.first(), Some(&Stage::ReprojectPoints));
    assert_eq!(stages.last(), Some(&Stage::Assemble));
    assert!(observer.warnings.is_empty());

    geojson::write_clusters(&run.clusters, &hotspots_path).unwrap();
    assert_eq!(geojson::count_features(&hotspots_path).unwrap(), 1);
}

#[test]
fn test_web_mercator_columns() {
    let dir = tempfile::tempdir().unwrap();
    let csv = dir.path().join("mercator.csv");
    std::fs::write(&csv, "name,x,y\nTrafalgar,-14204.367,6711506.705\n").unwrap();

    let options = IngestOptions {
        src_crs: Crs::from_epsg(3857),
        ..Default::default()
    };
    let ingested = read_points_csv(&csv, &options, &SmartReprojector::new()).unwrap();

    let p = &ingested.points.points[0];
    assert!((p.x - -0.1276).abs() < 1e-6);
    assert!((p.y - 51.5072).abs() < 1e-6);
}

#[test]
fn test_strict_threshold_yields_empty_collection() {
    let dir = tempfile::tempdir().unwrap();
    let csv = dir.path().join("listed.csv");
    write_csv(&csv);

    let reprojector = SmartReprojector::new();
    let ingested = read_points_csv(&csv, &IngestOptions::default(), &reprojector).unwrap();

    let mut config = HotspotsConfig::from_preset("default").unwrap();
    config.min_area_sqm = 1e9;
    let run = HotspotPipeline::new(config.to_params().unwrap(), &reprojector)
        .unwrap()
        .run(&ingested.points, &mut RecordingObserver::default())
        .unwrap();

    assert!(run.clusters.is_empty());
    assert_eq!(run.summary.excluded_small, 2);

    let path = dir.path().join("hotspots.geojson");
    geojson::write_clusters(&run.clusters, &path).unwrap();
    assert_eq!(geojson::count_features(&path).unwrap(), 0);
}

#[test]
fn test_config_file_overrides_preset() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("hotspots.json");
    std::fs::write(
        &path,
        r#"{"buffer_meters": 75.0, "filter_policy": "area-or-density", "min_points": 3}"#,
    )
    .unwrap();

    let config = HotspotsConfig::resolve(path.to_str().unwrap()).unwrap();
    let params = config.to_params().unwrap();

    assert_eq!(params.buffer_meters, 75.0);
    assert_eq!(params.min_points, 3);
    assert_eq!(params.proj_crs, Crs::from_epsg(27700));
}

#[test]
fn test_cluster_area_survives_national_grid_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let csv = dir.path().join("listed.csv");
    write_csv(&csv);

    let reprojector = SmartReprojector::new();
    let ingested = read_points_csv(&csv, &IngestOptions::default(), &reprojector).unwrap();
    let params = HotspotsConfig::from_preset("default")
        .unwrap()
        .to_params()
        .unwrap();
    let (metric, output) = (params.proj_crs.clone(), params.output_crs.clone());
    let run = HotspotPipeline::new(params, &reprojector)
        .unwrap()
        .run(&ingested.points, &mut RecordingObserver::default())
        .unwrap();
    assert_eq!(run.clusters.len(), 2);

    // EPSG:4326 publié → EPSG:27700 : la surface métrique doit se retrouver
    for cluster in &run.clusters.clusters {
        let back = reproject_polygon(&reprojector, &cluster.geometry, &output, &metric).unwrap();
        let relative = (back.unsigned_area() - cluster.area_m2).abs() / cluster.area_m2;
        assert!(relative < 1e-6, "cluster {}: relative error {}", cluster.id, relative);
    }
}
