//! Reprojection légère en Rust pur (sans dépendances externes)
//!
//! Systèmes supportés :
//! - WGS84 (EPSG:4326)
//! - Web Mercator (EPSG:3857)
//! - British National Grid (EPSG:27700)
//!
//! Toute paire de ces trois systèmes passe par WGS84 géographique.

mod ellipsoid;
mod mercator;
mod osgb;
mod smart;

pub use smart::{SmartBackend, SmartReprojector};

use anyhow::{bail, Result};
use geo::{Coord, Geometry, MapCoords, MultiPoint, Point};
use rayon::prelude::*;

pub use ellipsoid::{Airy1830, WGS84};

/// Au-delà, les points d'un MultiPoint sont transformés en parallèle
const PARALLEL_THRESHOLD: usize = 10_000;

/// Point en coordonnées géographiques (radians)
#[derive(Debug, Clone, Copy)]
pub struct Geographic {
    /// Longitude en radians
    pub lon: f64,
    /// Latitude en radians
    pub lat: f64,
}

impl Geographic {
    pub fn new(lon: f64, lat: f64) -> Self {
        Self { lon, lat }
    }

    /// Convertit en degrés
    pub fn to_degrees(self) -> (f64, f64) {
        (self.lon.to_degrees(), self.lat.to_degrees())
    }

    /// Crée depuis des degrés
    pub fn from_degrees(lon_deg: f64, lat_deg: f64) -> Self {
        Self {
            lon: lon_deg.to_radians(),
            lat: lat_deg.to_radians(),
        }
    }
}

/// Reprojection légère entre deux systèmes supportés
#[derive(Debug, Clone, Copy)]
pub struct LiteReprojector {
    source_epsg: u32,
    target_epsg: u32,
}

impl LiteReprojector {
    /// Crée un nouveau reprojector
    pub fn new(source_epsg: u32, target_epsg: u32) -> Result<Self> {
        for epsg in [source_epsg, target_epsg] {
            if !Self::is_supported_epsg(epsg) {
                bail!(
                    "EPSG:{} not supported by the built-in reprojector. Supported: 4326, 3857, 27700",
                    epsg
                );
            }
        }

        Ok(Self {
            source_epsg,
            target_epsg,
        })
    }

    pub fn is_supported_epsg(epsg: u32) -> bool {
        matches!(epsg, 4326 | 3857 | 27700)
    }

    /// Vérifie si la reprojection est supportée
    pub fn is_supported(source: u32, target: u32) -> bool {
        Self::is_supported_epsg(source) && Self::is_supported_epsg(target)
    }

    pub fn source_epsg(&self) -> u32 {
        self.source_epsg
    }

    pub fn target_epsg(&self) -> u32 {
        self.target_epsg
    }

    /// Transforme un point (x, y) de la source vers la cible
    pub fn transform_point(&self, x: f64, y: f64) -> Result<(f64, f64)> {
        if !x.is_finite() || !y.is_finite() {
            bail!("Non-finite coordinate ({}, {})", x, y);
        }
        if self.source_epsg == self.target_epsg {
            return Ok((x, y));
        }

        let geo = self.source_to_geographic(x, y)?;
        Ok(self.geographic_to_target(geo))
    }

    fn source_to_geographic(&self, x: f64, y: f64) -> Result<Geographic> {
        Ok(match self.source_epsg {
            4326 => {
                if !(-180.0..=180.0).contains(&x) || !(-90.0..=90.0).contains(&y) {
                    bail!("Coordinate ({}, {}) is outside the WGS84 range", x, y);
                }
                Geographic::from_degrees(x, y)
            }
            3857 => mercator::web_mercator_to_geographic(x, y),
            27700 => osgb::bng_to_geographic(x, y),
            other => bail!("EPSG:{} not supported", other),
        })
    }

    fn geographic_to_target(&self, geo: Geographic) -> (f64, f64) {
        match self.target_epsg {
            3857 => mercator::geographic_to_web_mercator(geo),
            27700 => osgb::geographic_to_bng(geo),
            _ => geo.to_degrees(),
        }
    }

    /// Transforme une géométrie
    pub fn transform_geometry(&self, geom: &Geometry) -> Result<Geometry> {
        match geom {
            Geometry::MultiPoint(mp) if mp.0.len() >= PARALLEL_THRESHOLD => {
                let points: Result<Vec<Point>> = mp
                    .0
                    .par_iter()
                    .map(|p| {
                        let (x, y) = self.transform_point(p.x(), p.y())?;
                        Ok(Point::new(x, y))
                    })
                    .collect();
                Ok(Geometry::MultiPoint(MultiPoint::new(points?)))
            }
            _ => geom.try_map_coords(|c| {
                let (x, y) = self.transform_point(c.x, c.y)?;
                Ok(Coord { x, y })
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{polygon, Area};

    #[test]
    fn test_bng_to_wgs84() {
        let reproj = LiteReprojector::new(27700, 4326).unwrap();
        let (lon, lat) = reproj.transform_point(530043.0, 180358.0).unwrap();

        // Trafalgar Square
        assert!((lon - (-0.1276)).abs() < 0.001, "lon={}", lon);
        assert!((lat - 51.5072).abs() < 0.001, "lat={}", lat);
    }

    #[test]
    fn test_bng_to_web_mercator_via_wgs84() {
        let direct = LiteReprojector::new(27700, 3857).unwrap();
        let (x, y) = direct.transform_point(530043.0, 180358.0).unwrap();

        let (lon, lat) = LiteReprojector::new(27700, 4326)
            .unwrap()
            .transform_point(530043.0, 180358.0)
            .unwrap();
        let (x2, y2) = LiteReprojector::new(4326, 3857)
            .unwrap()
            .transform_point(lon, lat)
            .unwrap();

        assert!((x - x2).abs() < 1e-6 && (y - y2).abs() < 1e-6);
    }

    #[test]
    fn test_unsupported_epsg() {
        assert!(LiteReprojector::new(2154, 4326).is_err());
        assert!(LiteReprojector::new(4326, 32630).is_err());
        assert!(LiteReprojector::is_supported(27700, 3857));
    }

    #[test]
    fn test_out_of_range_degrees_rejected() {
        let reproj = LiteReprojector::new(4326, 27700).unwrap();
        assert!(reproj.transform_point(530000.0, 180000.0).is_err());
        assert!(reproj.transform_point(f64::NAN, 51.0).is_err());
    }

    #[test]
    fn test_polygon_area_roundtrip_3857() {
        let square = Geometry::Polygon(polygon![
            (x: -14000.0, y: 6711000.0),
            (x: -13000.0, y: 6711000.0),
            (x: -13000.0, y: 6712000.0),
            (x: -14000.0, y: 6712000.0),
        ]);
        let there = LiteReprojector::new(3857, 4326).unwrap();
        let back = LiteReprojector::new(4326, 3857).unwrap();

        let geographic = there.transform_geometry(&square).unwrap();
        let again = back.transform_geometry(&geographic).unwrap();

        let (a, b) = (square.unsigned_area(), again.unsigned_area());
        assert!((a - b).abs() / a < 1e-9, "{} vs {}", a, b);
    }

    #[test]
    fn test_large_multipoint_parallel_path() {
        let points: Vec<Point> = (0..PARALLEL_THRESHOLD + 5)
            .map(|i| Point::new(-1.0 + i as f64 * 1e-5, 52.0))
            .collect();
        let reproj = LiteReprojector::new(4326, 27700).unwrap();
        let out = reproj
            .transform_geometry(&Geometry::MultiPoint(MultiPoint::new(points)))
            .unwrap();

        match out {
            Geometry::MultiPoint(mp) => {
                assert_eq!(mp.0.len(), PARALLEL_THRESHOLD + 5);
                assert!(mp.0[0].x() < mp.0[1].x());
            }
            other => panic!("unexpected {:?}", other),
        }
    }
}
