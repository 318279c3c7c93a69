//! Buffer des points en disques polygonaux
//!
//! Chaque disque est approché par un polygone régulier de `n` sommets
//! *circonscrit* au cercle : les sommets sont à `r / cos(pi / n)` du centre,
//! le milieu des côtés exactement à `r`. Le polygone couvre donc tout le
//! disque exact, et deux points distants de moins de `2r` fusionnent toujours.
//!
//! Erreur d'approximation pour `n = 64` :
//! - dépassement radial maximal : `r (1 / cos(pi / n) - 1)` ≈ 0,12 % de `r`
//! - surplus de surface : `n tan(pi / n) / pi - 1` ≈ 0,08 %

use std::f64::consts::PI;

use geo::{Coord, LineString, Polygon};

use crate::params::MIN_CIRCLE_SEGMENTS;
use crate::HotspotError;

/// Polygone régulier circonscrit au cercle (centre, rayon)
pub fn circle_polygon(center: Coord, radius: f64, segments: usize) -> Polygon {
    let n = segments.max(MIN_CIRCLE_SEGMENTS);
    let vertex_radius = radius / (PI / n as f64).cos();

    let mut coords = Vec::with_capacity(n + 1);
    for i in 0..n {
        let angle = 2.0 * PI * i as f64 / n as f64;
        coords.push(Coord {
            x: center.x + vertex_radius * angle.cos(),
            y: center.y + vertex_radius * angle.sin(),
        });
    }
    // Fermer le ring
    coords.push(coords[0]);

    Polygon::new(LineString::new(coords), vec![])
}

/// Dépassement radial maximal du polygone par rapport au cercle exact
pub fn max_radial_overshoot(radius: f64, segments: usize) -> f64 {
    let n = segments.max(MIN_CIRCLE_SEGMENTS) as f64;
    radius * (1.0 / (PI / n).cos() - 1.0)
}

/// Un disque par point, dans l'ordre des points
pub fn buffer_points(
    points: &[Coord],
    radius: f64,
    segments: usize,
) -> Result<Vec<Polygon>, HotspotError> {
    if !radius.is_finite() || radius <= 0.0 {
        return Err(HotspotError::invalid_config(
            "buffer_meters",
            format!("must be a positive distance, got {}", radius),
        ));
    }

    Ok(points
        .iter()
        .map(|&c| circle_polygon(c, radius, segments))
        .collect())
}
