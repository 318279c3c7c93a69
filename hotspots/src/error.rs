//! Types d'erreurs pour le crate hotspots

use thiserror::Error;

/// Erreurs pouvant survenir pendant le calcul des hotspots
#[derive(Debug, Error)]
pub enum HotspotError {
    /// Paramètre invalide, détecté avant tout calcul géométrique
    #[error("Invalid configuration for {field}: {reason}")]
    InvalidConfig { field: &'static str, reason: String },

    /// Échec du collaborateur de reprojection
    #[error("Reprojection from {from} to {to} failed: {reason}")]
    Reprojection {
        from: String,
        to: String,
        reason: String,
    },

    /// Résultat géométrique incohérent (invariant violé)
    #[error("Geometry error during {stage}: {reason}")]
    Geometry { stage: &'static str, reason: String },
}

impl HotspotError {
    /// Crée une erreur de configuration avec contexte
    pub fn invalid_config(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            field,
            reason: reason.into(),
        }
    }

    /// Crée une erreur de reprojection
    pub fn reprojection(
        from: impl ToString,
        to: impl ToString,
        reason: impl Into<String>,
    ) -> Self {
        Self::Reprojection {
            from: from.to_string(),
            to: to.to_string(),
            reason: reason.into(),
        }
    }

    /// Crée une erreur d'invariant géométrique
    pub fn geometry(stage: &'static str, reason: impl Into<String>) -> Self {
        Self::Geometry {
            stage,
            reason: reason.into(),
        }
    }

    /// Vrai si l'erreur provient de la configuration
    pub fn is_config_error(&self) -> bool {
        matches!(self, Self::InvalidConfig { .. })
    }
}
