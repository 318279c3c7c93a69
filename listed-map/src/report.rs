//! Rapport d'exécution du calcul de hotspots
//!
//! Le rapport est un observateur du pipeline : il collecte les comptes rendus
//! d'étape et les avertissements, puis le résumé final.

use std::path::Path;

use anyhow::{Context, Result};
use hotspots::{
    HotspotParams, PipelineObserver, PipelineWarning, RunSummary, Stage, StageReport,
};
use serde::Serialize;

/// Statut global de l'exécution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RunStatus {
    /// Au moins un hotspot publié
    Success,
    /// Exécution terminée sans hotspot
    Empty,
}

/// Rapport complet d'une exécution
#[derive(Debug, Clone, Serialize)]
pub struct HotspotsReport {
    /// Fichier de points en entrée
    pub input: String,
    /// Fichier de hotspots produit
    pub output: Option<String>,
    pub status: RunStatus,
    /// Paramètres effectivement utilisés
    pub params: HotspotParams,
    pub stages: Vec<StageReport>,
    pub warnings: Vec<PipelineWarning>,
    pub summary: RunSummary,
}

impl HotspotsReport {
    /// Crée un rapport vide pour une entrée et des paramètres
    pub fn new(input: &str, params: &HotspotParams) -> Self {
        Self {
            input: input.to_string(),
            output: None,
            status: RunStatus::Empty,
            params: params.clone(),
            stages: Vec::new(),
            warnings: Vec::new(),
            summary: RunSummary::default(),
        }
    }

    pub fn stage(&self, stage: Stage) -> Option<&StageReport> {
        self.stages.iter().find(|r| r.stage == stage)
    }

    pub fn set_output(&mut self, path: &Path) {
        self.output = Some(path.display().to_string());
    }

    /// Fixe le résumé et le statut final
    pub fn finalize(&mut self, summary: RunSummary) {
        self.status = if summary.kept > 0 {
            RunStatus::Success
        } else {
            RunStatus::Empty
        };
        self.summary = summary;
    }

    /// Affiche le rapport sur la console
    pub fn display(&self) {
        println!("\n{}", "=".repeat(60));
        println!("HOTSPOTS REPORT - {}", self.input);
        println!("{}", "=".repeat(60));

        println!("\nStatus: {:?}", self.status);
        println!("Duration: {:.2}s", self.summary.elapsed_ms / 1000.0);

        println!("\n--- PARAMETERS ---");
        println!(
            "Buffer: {}m, negative buffer: {}m, CRS: {}",
            self.params.buffer_meters, self.params.negative_buffer_meters, self.params.proj_crs
        );
        println!(
            "Filter: {} (min area {}m², min points {})",
            self.params.filter_policy, self.params.min_area_sqm, self.params.min_points
        );

        println!("\n--- SUMMARY ---");
        println!(
            "Points: {} read, {} used",
            self.summary.input_points, self.summary.used_points
        );
        println!(
            "Polygons: {} components, {} kept, {} too small, {} too sparse",
            self.summary.components,
            self.summary.kept,
            self.summary.excluded_small,
            self.summary.excluded_sparse
        );
        println!("Total area: {:.0} m²", self.summary.total_area_m2);

        if !self.stages.is_empty() {
            println!("\n--- STAGES ---");
            for s in &self.stages {
                println!(
                    "  {:<18} {:>8} -> {:<8} {:>10.1} ms",
                    s.stage.name(),
                    s.input,
                    s.output,
                    s.elapsed_ms
                );
            }
        }

        if !self.warnings.is_empty() {
            println!("\n--- WARNINGS ({}) ---", self.warnings.len());
            for w in &self.warnings {
                println!("  {}", w);
            }
        }

        if let Some(ref output) = self.output {
            println!("\nOutput: {}", output);
        }

        println!("\n{}", "=".repeat(60));
    }

    /// Sauvegarde le rapport en JSON
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write report: {}", path.display()))?;
        Ok(())
    }

    /// Affichage compact pour le résumé
    pub fn summary(&self) -> String {
        format!(
            "{}: {} hotspots kept of {} components, {:.0} m², {} warnings",
            self.input,
            self.summary.kept,
            self.summary.components,
            self.summary.total_area_m2,
            self.warnings.len()
        )
    }
}

impl PipelineObserver for HotspotsReport {
    fn on_stage(&mut self, report: &StageReport) {
        self.stages.push(report.clone());
    }

    fn on_warning(&mut self, warning: &PipelineWarning) {
        self.warnings.push(warning.clone());
    }
}
