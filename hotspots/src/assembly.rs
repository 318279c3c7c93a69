//! Assemblage du résultat final

use crate::filter::FilteredPolygon;
use crate::reproject::{reproject_polygon, Crs, Reprojector};
use crate::types::{Cluster, ClusterSet};
use crate::HotspotError;

/// Numérote les composantes gardées et les reprojette vers `output_crs`.
///
/// La surface reste celle mesurée dans le système métrique : elle n'est
/// jamais recalculée sur la géométrie reprojetée.
pub fn assemble(
    kept: Vec<FilteredPolygon>,
    reprojector: &dyn Reprojector,
    metric_crs: &Crs,
    output_crs: &Crs,
) -> Result<ClusterSet, HotspotError> {
    let mut clusters = Vec::with_capacity(kept.len());

    for (id, part) in kept.into_iter().enumerate() {
        let geometry = reproject_polygon(reprojector, &part.polygon, metric_crs, output_crs)?;
        clusters.push(Cluster {
            id,
            area_m2: part.area_m2,
            point_count: part.point_count,
            geometry,
        });
    }

    Ok(ClusterSet {
        crs: output_crs.clone(),
        clusters,
    })
}
