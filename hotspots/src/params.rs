//! Paramètres du calcul des hotspots

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::reproject::Crs;
use crate::HotspotError;

/// Taille des lots pour l'union
pub const DEFAULT_CHUNK_SIZE: usize = 5000;

/// Nombre de segments par cercle de buffer
pub const DEFAULT_CIRCLE_SEGMENTS: usize = 64;

/// En dessous, l'approximation du cercle devient grossière
pub const MIN_CIRCLE_SEGMENTS: usize = 8;

/// Politique de filtrage des composantes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FilterPolicy {
    /// Garde une composante si `area >= min_area_sqm`
    #[default]
    AreaOnly,
    /// Garde une composante si elle contient au moins `min_points` points,
    /// quelle que soit sa surface
    AreaOrDensity,
}

impl FilterPolicy {
    /// Vrai si la politique exige le comptage des points
    pub fn needs_point_count(self) -> bool {
        matches!(self, Self::AreaOrDensity)
    }
}

impl FromStr for FilterPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('_', "-").as_str() {
            "area-only" | "area" => Ok(Self::AreaOnly),
            "area-or-density" | "density" => Ok(Self::AreaOrDensity),
            _ => Err(format!(
                "Invalid filter policy: {}. Use: area-only, area-or-density",
                s
            )),
        }
    }
}

impl fmt::Display for FilterPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AreaOnly => f.write_str("area-only"),
            Self::AreaOrDensity => f.write_str("area-or-density"),
        }
    }
}

/// Paramètres d'une exécution du pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HotspotParams {
    /// Rayon du buffer autour de chaque point (m)
    pub buffer_meters: f64,

    /// Érosion appliquée une fois après l'union globale (m), 0 = aucune
    pub negative_buffer_meters: f64,

    /// Surface minimale d'une composante (m²)
    pub min_area_sqm: f64,

    /// Nombre minimal de points (mode `area-or-density`)
    pub min_points: usize,

    /// Système métrique utilisé pour buffer, union et surfaces
    pub proj_crs: Crs,

    /// Système des géométries publiées
    pub output_crs: Crs,

    pub filter_policy: FilterPolicy,

    /// Nombre de polygones par lot d'union
    pub chunk_size: usize,

    /// Nombre de sommets du polygone approchant chaque cercle
    pub circle_segments: usize,

    /// Calculer les unions de lots en parallèle (rayon)
    pub parallel_chunks: bool,

    /// Compter les points aussi en mode `area-only`
    pub count_points: bool,
}

impl Default for HotspotParams {
    fn default() -> Self {
        Self {
            buffer_meters: 200.0,
            negative_buffer_meters: 0.0,
            min_area_sqm: 1000.0,
            min_points: 0,
            proj_crs: Crs::from_epsg(27700), // British National Grid
            output_crs: Crs::wgs84(),
            filter_policy: FilterPolicy::AreaOnly,
            chunk_size: DEFAULT_CHUNK_SIZE,
            circle_segments: DEFAULT_CIRCLE_SEGMENTS,
            parallel_chunks: false,
            count_points: false,
        }
    }
}

impl HotspotParams {
    /// Vérifie les seuils avant tout calcul géométrique
    pub fn validate(&self) -> Result<(), HotspotError> {
        if !self.buffer_meters.is_finite() || self.buffer_meters <= 0.0 {
            return Err(HotspotError::invalid_config(
                "buffer_meters",
                format!("must be a positive distance, got {}", self.buffer_meters),
            ));
        }
        if !self.negative_buffer_meters.is_finite() || self.negative_buffer_meters < 0.0 {
            return Err(HotspotError::invalid_config(
                "negative_buffer_meters",
                format!(
                    "must be zero or a positive distance, got {}",
                    self.negative_buffer_meters
                ),
            ));
        }
        if !self.min_area_sqm.is_finite() || self.min_area_sqm < 0.0 {
            return Err(HotspotError::invalid_config(
                "min_area_sqm",
                format!("must be >= 0, got {}", self.min_area_sqm),
            ));
        }
        if self.chunk_size == 0 {
            return Err(HotspotError::invalid_config(
                "chunk_size",
                "must be at least 1",
            ));
        }
        if self.circle_segments < MIN_CIRCLE_SEGMENTS {
            return Err(HotspotError::invalid_config(
                "circle_segments",
                format!(
                    "must be at least {}, got {}",
                    MIN_CIRCLE_SEGMENTS, self.circle_segments
                ),
            ));
        }
        if self.proj_crs.is_geographic() {
            return Err(HotspotError::invalid_config(
                "proj_crs",
                format!(
                    "{} is geographic; buffering and areas need a metric system",
                    self.proj_crs
                ),
            ));
        }
        Ok(())
    }

    /// Vrai si le comptage des points doit être effectué
    pub fn counts_points(&self) -> bool {
        self.count_points || self.filter_policy.needs_point_count()
    }
}
