//! Orchestration du calcul des hotspots
//!
//! Ordre des étapes : validation, reprojection des points vers le système
//! métrique, buffer, union par lots, érosion, décomposition, filtrage,
//! assemblage. Chaque appel est indépendant : aucun état n'est conservé
//! entre deux exécutions.

use std::time::Instant;

use geo::Coord;
use serde::Serialize;

use crate::assembly::assemble;
use crate::filter::{filter_polygons, FilterCriteria};
use crate::geometry::{buffer_points, chunked_union, decompose, erode};
use crate::observer::{PipelineObserver, PipelineWarning, Stage, StageReport};
use crate::params::HotspotParams;
use crate::reproject::{reproject_coords, Reprojector};
use crate::types::{ClusterSet, PointSet};
use crate::HotspotError;

/// Compteurs d'une exécution
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunSummary {
    /// Points reçus
    pub input_points: usize,
    /// Points aux coordonnées finies, effectivement bufferisés
    pub used_points: usize,
    /// Lots d'union
    pub union_chunks: usize,
    /// Composantes après érosion et décomposition
    pub components: usize,
    pub kept: usize,
    pub excluded_small: usize,
    pub excluded_sparse: usize,
    /// Surface totale des clusters gardés (m²)
    pub total_area_m2: f64,
    pub elapsed_ms: f64,
}

/// Résultat d'une exécution
#[derive(Debug, Clone)]
pub struct HotspotRun {
    pub clusters: ClusterSet,
    pub summary: RunSummary,
}

/// Pipeline configuré, réutilisable pour plusieurs jeux de points
pub struct HotspotPipeline<'a> {
    params: HotspotParams,
    reprojector: &'a dyn Reprojector,
}

impl<'a> HotspotPipeline<'a> {
    /// Valide les paramètres ; aucune géométrie n'est calculée ici
    pub fn new(
        params: HotspotParams,
        reprojector: &'a dyn Reprojector,
    ) -> Result<Self, HotspotError> {
        params.validate()?;
        Ok(Self {
            params,
            reprojector,
        })
    }

    pub fn params(&self) -> &HotspotParams {
        &self.params
    }

    /// Calcule les clusters d'un jeu de points
    pub fn run(
        &self,
        points: &PointSet,
        observer: &mut dyn PipelineObserver,
    ) -> Result<HotspotRun, HotspotError> {
        let started = Instant::now();
        let params = &self.params;
        let mut summary = RunSummary {
            input_points: points.len(),
            ..Default::default()
        };

        if params.negative_buffer_meters > params.buffer_meters {
            observer.on_warning(&PipelineWarning::ErosionExceedsBuffer {
                erosion: params.negative_buffer_meters,
                buffer: params.buffer_meters,
            });
        }

        let finite: Vec<Coord> = points
            .points
            .iter()
            .filter(|p| p.is_finite())
            .map(|p| p.coord())
            .collect();
        let dropped = points.len() - finite.len();
        if dropped > 0 {
            observer.on_warning(&PipelineWarning::NonFinitePointsDropped { count: dropped });
        }
        summary.used_points = finite.len();

        if finite.is_empty() {
            observer.on_warning(&PipelineWarning::EmptyInput);
            summary.elapsed_ms = elapsed_ms(started);
            return Ok(HotspotRun {
                clusters: ClusterSet::empty(params.output_crs.clone()),
                summary,
            });
        }

        // Points dans le système métrique
        let t = Instant::now();
        let metric = reproject_coords(self.reprojector, &finite, &points.crs, &params.proj_crs)?;
        if metric.iter().any(|c| !c.x.is_finite() || !c.y.is_finite()) {
            return Err(HotspotError::reprojection(
                &points.crs,
                &params.proj_crs,
                "produced non-finite coordinates",
            ));
        }
        observer.on_stage(&StageReport::new(
            Stage::ReprojectPoints,
            finite.len(),
            metric.len(),
            t.elapsed(),
        ));
        drop(finite);

        // Buffer
        let t = Instant::now();
        let disks = buffer_points(&metric, params.buffer_meters, params.circle_segments)?;
        observer.on_stage(&StageReport::new(
            Stage::Buffer,
            metric.len(),
            disks.len(),
            t.elapsed(),
        ));

        // Union
        let t = Instant::now();
        let union = chunked_union(&disks, params.chunk_size, params.parallel_chunks)?;
        observer.on_stage(&StageReport::new(
            Stage::Union,
            disks.len(),
            union.region.0.len(),
            t.elapsed(),
        ));
        summary.union_chunks = union.chunks;
        drop(disks);

        // Érosion, une seule fois sur la région globale
        let t = Instant::now();
        let parts_before = union.region.0.len();
        let region = erode(union.region, params.negative_buffer_meters)?;
        observer.on_stage(&StageReport::new(
            Stage::Erosion,
            parts_before,
            region.0.len(),
            t.elapsed(),
        ));

        // Décomposition
        let t = Instant::now();
        let parts_in = region.0.len();
        let parts = decompose(region);
        observer.on_stage(&StageReport::new(
            Stage::Decompose,
            parts_in,
            parts.len(),
            t.elapsed(),
        ));
        summary.components = parts.len();
        // Une érosion peut ne laisser que des résidus sans surface
        if parts.is_empty() && parts_before > 0 {
            observer.on_warning(&PipelineWarning::RegionVanished { parts_before });
        }

        // Filtrage
        let t = Instant::now();
        let candidates = parts.len();
        let outcome = filter_polygons(parts, &metric, &FilterCriteria::from(params));
        observer.on_stage(
            &StageReport::new(Stage::Filter, candidates, outcome.kept.len(), t.elapsed())
                .with_excluded(outcome.excluded()),
        );
        if outcome.kept.is_empty() && candidates > 0 {
            observer.on_warning(&PipelineWarning::NoClustersRetained { candidates });
        }
        summary.excluded_small = outcome.excluded_small;
        summary.excluded_sparse = outcome.excluded_sparse;

        // Assemblage
        let t = Instant::now();
        let kept = outcome.kept.len();
        let clusters = assemble(
            outcome.kept,
            self.reprojector,
            &params.proj_crs,
            &params.output_crs,
        )?;
        observer.on_stage(&StageReport::new(
            Stage::Assemble,
            kept,
            clusters.len(),
            t.elapsed(),
        ));

        summary.kept = clusters.len();
        summary.total_area_m2 = clusters.total_area();
        summary.elapsed_ms = elapsed_ms(started);

        Ok(HotspotRun { clusters, summary })
    }
}

/// Valide les paramètres puis calcule les clusters en une fois
pub fn generate_hotspots(
    points: &PointSet,
    params: &HotspotParams,
    reprojector: &dyn Reprojector,
    observer: &mut dyn PipelineObserver,
) -> Result<HotspotRun, HotspotError> {
    HotspotPipeline::new(params.clone(), reprojector)?.run(points, observer)
}

fn elapsed_ms(started: Instant) -> f64 {
    started.elapsed().as_secs_f64() * 1000.0
}
