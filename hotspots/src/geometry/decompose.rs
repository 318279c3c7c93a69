//! Décomposition d'une région multi-parties en polygones connexes

use geo::{Area, MultiPolygon, Polygon};

/// Surface en dessous de laquelle une partie est du bruit flottant (m²)
pub const MIN_PART_AREA_SQM: f64 = 1e-6;

/// Sépare la région en composantes, en écartant les parties dégénérées.
///
/// L'ordre suit celui de la région ; une région vide donne une liste vide.
pub fn decompose(region: MultiPolygon) -> Vec<Polygon> {
    region
        .into_iter()
        .filter(|p| !is_degenerate(p))
        .collect()
}

/// Ring extérieur trop court, surface quasi nulle ou coordonnées non finies
fn is_degenerate(polygon: &Polygon) -> bool {
    let exterior = polygon.exterior();
    if exterior.0.len() < 4 {
        return true;
    }
    if exterior.0.iter().any(|c| !c.x.is_finite() || !c.y.is_finite()) {
        return true;
    }
    polygon.unsigned_area() < MIN_PART_AREA_SQM
}
