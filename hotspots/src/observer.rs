//! Rapports d'étapes et observateurs du pipeline
//!
//! Le pipeline ne logue rien lui-même : chaque étape produit un
//! [`StageReport`] et les situations dégradées un [`PipelineWarning`],
//! transmis à l'observateur fourni par l'appelant.

use std::fmt;
use std::time::Duration;

use serde::Serialize;
use tracing::{info, warn};

/// Étapes du pipeline, dans l'ordre d'exécution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    ReprojectPoints,
    Buffer,
    Union,
    Erosion,
    Decompose,
    Filter,
    Assemble,
}

impl Stage {
    pub fn name(self) -> &'static str {
        match self {
            Self::ReprojectPoints => "reproject_points",
            Self::Buffer => "buffer",
            Self::Union => "union",
            Self::Erosion => "erosion",
            Self::Decompose => "decompose",
            Self::Filter => "filter",
            Self::Assemble => "assemble",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Compteurs et durée d'une étape
#[derive(Debug, Clone, Serialize)]
pub struct StageReport {
    pub stage: Stage,
    /// Éléments reçus (points, polygones ou parties selon l'étape)
    pub input: usize,
    /// Éléments produits
    pub output: usize,
    /// Éléments écartés par l'étape
    pub excluded: usize,
    pub elapsed_ms: f64,
}

impl StageReport {
    pub fn new(stage: Stage, input: usize, output: usize, elapsed: Duration) -> Self {
        Self {
            stage,
            input,
            output,
            excluded: 0,
            elapsed_ms: elapsed.as_secs_f64() * 1000.0,
        }
    }

    pub fn with_excluded(mut self, excluded: usize) -> Self {
        self.excluded = excluded;
        self
    }
}

/// Situations non fatales signalées pendant une exécution
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PipelineWarning {
    /// Aucun point exploitable : résultat vide
    EmptyInput,
    /// Points aux coordonnées non finies écartés
    NonFinitePointsDropped { count: usize },
    /// Érosion plus forte que le buffer : la région recule au-delà des points
    ErosionExceedsBuffer { erosion: f64, buffer: f64 },
    /// L'érosion a fait disparaître toute la région
    RegionVanished { parts_before: usize },
    /// Des composantes existaient mais aucune n'a passé le filtre
    NoClustersRetained { candidates: usize },
}

impl fmt::Display for PipelineWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyInput => write!(f, "no usable points, returning no hotspots"),
            Self::NonFinitePointsDropped { count } => {
                write!(f, "dropped {} points with non-finite coordinates", count)
            }
            Self::ErosionExceedsBuffer { erosion, buffer } => write!(
                f,
                "negative buffer {}m exceeds buffer {}m, hotspots will shrink past their points",
                erosion, buffer
            ),
            Self::RegionVanished { parts_before } => write!(
                f,
                "erosion removed all {} unioned parts",
                parts_before
            ),
            Self::NoClustersRetained { candidates } => write!(
                f,
                "none of the {} candidate polygons met the filter criteria",
                candidates
            ),
        }
    }
}

/// Récepteur des événements du pipeline
pub trait PipelineObserver {
    fn on_stage(&mut self, _report: &StageReport) {}

    fn on_warning(&mut self, _warning: &PipelineWarning) {}
}

impl<T: PipelineObserver + ?Sized> PipelineObserver for &mut T {
    fn on_stage(&mut self, report: &StageReport) {
        (**self).on_stage(report);
    }

    fn on_warning(&mut self, warning: &PipelineWarning) {
        (**self).on_warning(warning);
    }
}

/// Diffuse les événements à deux observateurs
impl<A: PipelineObserver, B: PipelineObserver> PipelineObserver for (A, B) {
    fn on_stage(&mut self, report: &StageReport) {
        self.0.on_stage(report);
        self.1.on_stage(report);
    }

    fn on_warning(&mut self, warning: &PipelineWarning) {
        self.0.on_warning(warning);
        self.1.on_warning(warning);
    }
}

/// Ignore tous les événements
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl PipelineObserver for NoopObserver {}

/// Transmet les événements à `tracing`
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl PipelineObserver for TracingObserver {
    fn on_stage(&mut self, report: &StageReport) {
        info!(
            stage = %report.stage,
            input = report.input,
            output = report.output,
            excluded = report.excluded,
            elapsed_ms = report.elapsed_ms,
            "Stage complete"
        );
    }

    fn on_warning(&mut self, warning: &PipelineWarning) {
        warn!("{}", warning);
    }
}

/// Conserve les événements en mémoire
#[derive(Debug, Default, Clone)]
pub struct RecordingObserver {
    pub stages: Vec<StageReport>,
    pub warnings: Vec<PipelineWarning>,
}

impl RecordingObserver {
    pub fn stage(&self, stage: Stage) -> Option<&StageReport> {
        self.stages.iter().find(|r| r.stage == stage)
    }
}

impl PipelineObserver for RecordingObserver {
    fn on_stage(&mut self, report: &StageReport) {
        self.stages.push(report.clone());
    }

    fn on_warning(&mut self, warning: &PipelineWarning) {
        self.warnings.push(warning.clone());
    }
}
