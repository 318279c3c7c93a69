//! Érosion (buffer négatif) de la région unie
//!
//! Compense la croissance due au buffer (croissance nette ≈ buffer - érosion)
//! et coupe les ponts fins entre amas qui ne se touchaient que par le buffer.

use geo::{Buffer, MultiPolygon};

use crate::HotspotError;

/// Rétrécit la région de `distance` mètres vers l'intérieur.
///
/// Une distance nulle rend la région inchangée. Le résultat peut être vide :
/// ce n'est pas une erreur, les composantes disparues sont simplement perdues.
pub fn erode(region: MultiPolygon, distance: f64) -> Result<MultiPolygon, HotspotError> {
    if !distance.is_finite() || distance < 0.0 {
        return Err(HotspotError::invalid_config(
            "negative_buffer_meters",
            format!("must be zero or a positive distance, got {}", distance),
        ));
    }

    if distance == 0.0 || region.0.is_empty() {
        return Ok(region);
    }

    let eroded = region.buffer(-distance);
    super::ensure_finite(&eroded, "erosion")?;
    Ok(eroded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::buffer::circle_polygon;
    use crate::geometry::union::union_all;
    use geo::{Area, Coord, LineString, Polygon};

    fn square(x0: f64, y0: f64, size: f64) -> Polygon {
        Polygon::new(
            LineString::from(vec![
                (x0, y0),
                (x0 + size, y0),
                (x0 + size, y0 + size),
                (x0, y0 + size),
                (x0, y0),
            ]),
            vec![],
        )
    }

    #[test]
    fn test_zero_erosion_is_identity() {
        let region = MultiPolygon::new(vec![square(0.0, 0.0, 100.0), square(500.0, 0.0, 50.0)]);
        let eroded = erode(region.clone(), 0.0).unwrap();
        assert_eq!(eroded, region);
    }

    #[test]
    fn test_erosion_shrinks_square() {
        let region = MultiPolygon::new(vec![square(0.0, 0.0, 100.0)]);
        let eroded = erode(region, 10.0).unwrap();

        assert_eq!(eroded.0.len(), 1);
        let area = eroded.unsigned_area();
        assert!((area - 80.0 * 80.0).abs() < 1.0, "area={}", area);
    }

    #[test]
    fn test_erosion_can_remove_everything() {
        let region = MultiPolygon::new(vec![square(0.0, 0.0, 10.0)]);
        let eroded = erode(region, 20.0).unwrap();
        assert!(eroded.unsigned_area() < 1e-9);
    }

    #[test]
    fn test_erosion_breaks_thin_bridge() {
        // Deux gros disques reliés par une chaîne de petits disques
        let mut polys = vec![
            circle_polygon(Coord { x: 0.0, y: 0.0 }, 200.0, 64),
            circle_polygon(Coord { x: 1000.0, y: 0.0 }, 200.0, 64),
        ];
        for i in 0..7 {
            polys.push(circle_polygon(
                Coord {
                    x: 200.0 + i as f64 * 100.0,
                    y: 0.0,
                },
                60.0,
                64,
            ));
        }
        let region = union_all(&polys);
        assert_eq!(region.0.len(), 1);

        let eroded = erode(region, 70.0).unwrap();
        let parts: Vec<_> = eroded.0.iter().filter(|p| p.unsigned_area() > 1.0).collect();
        assert_eq!(parts.len(), 2);
    }

    #[test]
    fn test_rejects_negative_distance() {
        let region = MultiPolygon::new(vec![square(0.0, 0.0, 10.0)]);
        assert!(erode(region, -5.0).is_err());
    }
}
