//! Étapes géométriques : buffer, union, érosion, décomposition

pub mod buffer;
pub mod decompose;
pub mod erosion;
pub mod union;

pub use buffer::{buffer_points, circle_polygon};
pub use decompose::{decompose, MIN_PART_AREA_SQM};
pub use erosion::erode;
pub use union::{chunked_union, union_all, UnionOutcome};

use geo::{CoordsIter, MultiPolygon};

use crate::HotspotError;

/// Refuse une région produite avec des coordonnées non finies
pub fn ensure_finite(region: &MultiPolygon, stage: &'static str) -> Result<(), HotspotError> {
    match region
        .coords_iter()
        .find(|c| !c.x.is_finite() || !c.y.is_finite())
    {
        Some(c) => Err(HotspotError::geometry(
            stage,
            format!("non-finite coordinate ({}, {}) in result", c.x, c.y),
        )),
        None => Ok(()),
    }
}
