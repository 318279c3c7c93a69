//! Configuration du calcul des hotspots

use std::path::Path;

use anyhow::{Context, Result};
use hotspots::{Crs, FilterPolicy, HotspotParams};
use serde::{Deserialize, Serialize};

/// Noms des presets embarqués
pub const PRESETS: &[&str] = &["default", "native"];

/// Configuration principale (fichier JSON ou preset)
///
/// Les clés absentes prennent la valeur par défaut ; une clé inconnue est
/// une erreur.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct HotspotsConfig {
    /// Rayon du buffer (m)
    pub buffer_meters: f64,

    /// Érosion après union (m)
    pub negative_buffer_meters: f64,

    /// Surface minimale (m²)
    pub min_area_sqm: f64,

    /// Nombre minimal de points (mode `area-or-density`)
    pub min_points: usize,

    /// Système métrique de calcul
    pub proj_crs: Crs,

    /// Système des hotspots publiés
    pub output_crs: Crs,

    pub filter_policy: FilterPolicy,
    pub chunk_size: usize,
    pub circle_segments: usize,
    pub parallel_chunks: bool,
    pub count_points: bool,
}

impl Default for HotspotsConfig {
    fn default() -> Self {
        let p = HotspotParams::default();
        Self {
            buffer_meters: p.buffer_meters,
            negative_buffer_meters: p.negative_buffer_meters,
            min_area_sqm: p.min_area_sqm,
            min_points: p.min_points,
            proj_crs: p.proj_crs,
            output_crs: p.output_crs,
            filter_policy: p.filter_policy,
            chunk_size: p.chunk_size,
            circle_segments: p.circle_segments,
            parallel_chunks: p.parallel_chunks,
            count_points: p.count_points,
        }
    }
}

/// Valeurs passées en ligne de commande, prioritaires sur la configuration
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub buffer_meters: Option<f64>,
    pub negative_buffer_meters: Option<f64>,
    pub min_area_sqm: Option<f64>,
    pub min_points: Option<usize>,
    pub proj_crs: Option<String>,
    pub filter_policy: Option<FilterPolicy>,
    pub count_points: Option<bool>,
    pub parallel_chunks: Option<bool>,
}

impl HotspotsConfig {
    /// Charge une configuration depuis un fichier
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .context(format!("Failed to read config file: {}", path.display()))?;

        serde_json::from_str(&content)
            .context(format!("Failed to parse config JSON: {}", path.display()))
    }

    /// Charge une configuration depuis un preset embarqué
    pub fn from_preset(preset: &str) -> Result<Self> {
        match preset {
            "default" => Self::load_embedded(include_str!("presets/default.json")),
            "native" => Self::load_embedded(include_str!("presets/native.json")),
            _ => anyhow::bail!("Unknown preset: {}. Use: {}", preset, PRESETS.join(", ")),
        }
    }

    /// Nom de preset ou chemin vers un fichier JSON
    pub fn resolve(spec: &str) -> Result<Self> {
        if PRESETS.contains(&spec) {
            Self::from_preset(spec)
        } else {
            Self::load(Path::new(spec))
        }
    }

    fn load_embedded(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("Failed to parse embedded config")
    }

    /// Applique les valeurs de la ligne de commande
    pub fn apply(&mut self, overrides: &ConfigOverrides) {
        if let Some(v) = overrides.buffer_meters {
            self.buffer_meters = v;
        }
        if let Some(v) = overrides.negative_buffer_meters {
            self.negative_buffer_meters = v;
        }
        if let Some(v) = overrides.min_area_sqm {
            self.min_area_sqm = v;
        }
        if let Some(v) = overrides.min_points {
            self.min_points = v;
        }
        if let Some(ref crs) = overrides.proj_crs {
            self.proj_crs = Crs::new(crs.as_str());
        }
        if let Some(policy) = overrides.filter_policy {
            self.filter_policy = policy;
        }
        if let Some(v) = overrides.count_points {
            self.count_points = v;
        }
        if let Some(v) = overrides.parallel_chunks {
            self.parallel_chunks = v;
        }
    }

    /// Paramètres du pipeline, validés
    pub fn to_params(&self) -> Result<HotspotParams> {
        let params = HotspotParams {
            buffer_meters: self.buffer_meters,
            negative_buffer_meters: self.negative_buffer_meters,
            min_area_sqm: self.min_area_sqm,
            min_points: self.min_points,
            proj_crs: self.proj_crs.clone(),
            output_crs: self.output_crs.clone(),
            filter_policy: self.filter_policy,
            chunk_size: self.chunk_size,
            circle_segments: self.circle_segments,
            parallel_chunks: self.parallel_chunks,
            count_points: self.count_points,
        };
        params.validate()?;
        Ok(params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets_parse() {
        for name in PRESETS {
            let config = HotspotsConfig::from_preset(name).unwrap();
            assert!(config.to_params().is_ok(), "preset {}", name);
        }
    }

    #[test]
    fn test_default_preset_matches_defaults() {
        assert_eq!(
            HotspotsConfig::from_preset("default").unwrap(),
            HotspotsConfig::default()
        );
    }

    #[test]
    fn test_native_preset() {
        let config = HotspotsConfig::from_preset("native").unwrap();
        assert_eq!(config.buffer_meters, 150.0);
        assert_eq!(config.negative_buffer_meters, 120.0);
        assert_eq!(config.min_area_sqm, 6000.0);
        assert_eq!(config.min_points, 10);
        assert_eq!(config.filter_policy, FilterPolicy::AreaOrDensity);
    }

    #[test]
    fn test_unknown_preset() {
        let err = HotspotsConfig::from_preset("dense").unwrap_err();
        assert!(err.to_string().contains("default, native"));
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: HotspotsConfig =
            serde_json::from_str(r#"{"buffer_meters": 75, "filter_policy": "area-or-density"}"#)
                .unwrap();
        assert_eq!(config.buffer_meters, 75.0);
        assert_eq!(config.filter_policy, FilterPolicy::AreaOrDensity);
        assert_eq!(config.min_area_sqm, 1000.0);
        assert_eq!(config.proj_crs, Crs::from_epsg(27700));
    }

    #[test]
    fn test_unknown_key_rejected() {
        let result: Result<HotspotsConfig, _> = serde_json::from_str(r#"{"bufer_meters": 75}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_overrides() {
        let mut config = HotspotsConfig::from_preset("native").unwrap();
        config.apply(&ConfigOverrides {
            buffer_meters: Some(90.0),
            proj_crs: Some("EPSG:3857".to_string()),
            filter_policy: Some(FilterPolicy::AreaOnly),
            ..Default::default()
        });

        assert_eq!(config.buffer_meters, 90.0);
        assert_eq!(config.negative_buffer_meters, 120.0);
        assert_eq!(config.proj_crs, Crs::from_epsg(3857));
        assert_eq!(config.filter_policy, FilterPolicy::AreaOnly);
        assert!(config.count_points);
        assert!(config.parallel_chunks);
    }

    #[test]
    fn test_overrides_can_disable_preset_flags() {
        let mut config = HotspotsConfig::from_preset("native").unwrap();
        config.apply(&ConfigOverrides {
            count_points: Some(false),
            parallel_chunks: Some(false),
            ..Default::default()
        });

        assert!(!config.count_points);
        assert!(!config.parallel_chunks);
    }

    #[test]
    fn test_invalid_values_rejected() {
        let mut config = HotspotsConfig::default();
        config.apply(&ConfigOverrides {
            buffer_meters: Some(-1.0),
            ..Default::default()
        });
        assert!(config.to_params().is_err());

        let geographic = HotspotsConfig {
            proj_crs: Crs::wgs84(),
            ..Default::default()
        };
        let err = geographic.to_params().unwrap_err();
        assert!(err.to_string().contains("proj_crs"));
    }
}
