//! Union (dissolve) des disques par lots
//!
//! L'union est associative et commutative : unir des lots puis unir les
//! résultats donne la même région qu'une union unique, au bruit flottant
//! près. Aucune érosion n'a lieu ici, elle est appliquée une seule fois
//! après l'union globale.

use geo::{unary_union, MultiPolygon, Polygon};
use rayon::prelude::*;

use crate::HotspotError;

/// Résultat de l'union par lots
#[derive(Debug, Clone)]
pub struct UnionOutcome {
    /// Région unie (éventuellement multi-parties)
    pub region: MultiPolygon,

    /// Nombre de lots utilisés
    pub chunks: usize,
}

/// Union en une passe
pub fn union_all(polygons: &[Polygon]) -> MultiPolygon {
    if polygons.is_empty() {
        return MultiPolygon::new(Vec::new());
    }
    unary_union(polygons.iter())
}

/// Union en deux niveaux : chaque lot de `chunk_size` polygones, puis les
/// résultats partiels.
///
/// Avec `parallel`, les lots sont unis sur le pool rayon ; l'union finale
/// reste séquentielle et l'ordre des lots est conservé.
pub fn chunked_union(
    polygons: &[Polygon],
    chunk_size: usize,
    parallel: bool,
) -> Result<UnionOutcome, HotspotError> {
    if chunk_size == 0 {
        return Err(HotspotError::invalid_config(
            "chunk_size",
            "must be at least 1",
        ));
    }

    if polygons.is_empty() {
        return Ok(UnionOutcome {
            region: MultiPolygon::new(Vec::new()),
            chunks: 0,
        });
    }

    if polygons.len() <= chunk_size {
        let region = union_all(polygons);
        super::ensure_finite(&region, "union")?;
        return Ok(UnionOutcome { region, chunks: 1 });
    }

    let partials: Vec<MultiPolygon> = if parallel {
        polygons.par_chunks(chunk_size).map(union_all).collect()
    } else {
        polygons.chunks(chunk_size).map(union_all).collect()
    };

    let chunks = partials.len();
    let region = unary_union(partials.iter());
    super::ensure_finite(&region, "union")?;

    Ok(UnionOutcome { region, chunks })
}
