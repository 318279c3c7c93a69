//! Reprojection intelligente : reproject_lite en priorité, fallback sur proj
//!
//! Utilise automatiquement la meilleure option disponible pour chaque paire
//! de systèmes, et sert de [`hotspots::Reprojector`] au pipeline.

use super::LiteReprojector;
use anyhow::Result;
use geo::Geometry;
use hotspots::{Crs, HotspotError, Reprojector};

/// Moteur retenu pour une paire de systèmes
pub enum SmartBackend {
    /// Pas de reprojection (source == cible)
    Identity,
    /// Reprojection légère (pure Rust)
    Lite(LiteReprojector),
    /// Reprojection via PROJ (si feature activée)
    #[cfg(feature = "reproject")]
    Proj(crate::export::reproject::ProjReprojector),
}

impl SmartBackend {
    /// Choisit le moteur pour `source` → `target`
    pub fn new(source: &Crs, target: &Crs) -> Result<Self> {
        if source.same_as(target) {
            return Ok(Self::Identity);
        }

        if let (Some(from), Some(to)) = (source.epsg(), target.epsg()) {
            if LiteReprojector::is_supported(from, to) {
                return Ok(Self::Lite(LiteReprojector::new(from, to)?));
            }
        }

        #[cfg(feature = "reproject")]
        {
            let proj = crate::export::reproject::ProjReprojector::new(source, target)?;
            return Ok(Self::Proj(proj));
        }

        #[cfg(not(feature = "reproject"))]
        anyhow::bail!(
            "Reprojection {} → {} not supported.\n\
             Built-in reprojector handles EPSG:4326, EPSG:3857 and EPSG:27700.\n\
             For other systems, build with: cargo build --features reproject",
            source,
            target
        );
    }

    /// Transforme une géométrie
    pub fn transform_geometry(&self, geom: &Geometry) -> Result<Geometry> {
        match self {
            Self::Identity => Ok(geom.clone()),
            Self::Lite(lite) => lite.transform_geometry(geom),
            #[cfg(feature = "reproject")]
            Self::Proj(proj) => proj.transform_geometry(geom),
        }
    }

    /// Retourne une description du moteur utilisé
    pub fn description(&self) -> &'static str {
        match self {
            Self::Identity => "identity (no reprojection)",
            Self::Lite(_) => "reproject_lite (pure Rust)",
            #[cfg(feature = "reproject")]
            Self::Proj(_) => "proj (PROJ library)",
        }
    }
}

/// Reprojector du pipeline : choisit un moteur à chaque appel
#[derive(Debug, Default, Clone, Copy)]
pub struct SmartReprojector;

impl SmartReprojector {
    pub fn new() -> Self {
        Self
    }

    /// Vérifie qu'une paire est reprojetable, avant de lancer un calcul
    pub fn check(&self, source: &Crs, target: &Crs) -> Result<&'static str> {
        Ok(SmartBackend::new(source, target)?.description())
    }

    /// Reprojette une géométrie isolée
    pub fn transform(&self, geom: &Geometry, source: &Crs, target: &Crs) -> Result<Geometry> {
        SmartBackend::new(source, target)?.transform_geometry(geom)
    }
}

impl Reprojector for SmartReprojector {
    fn reproject(
        &self,
        geometry: &Geometry,
        from: &Crs,
        to: &Crs,
    ) -> Result<Geometry, HotspotError> {
        self.transform(geometry, from, to)
            .map_err(|e| HotspotError::reprojection(from, to, format!("{:#}", e)))
    }
}
