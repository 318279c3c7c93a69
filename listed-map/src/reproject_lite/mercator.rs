//! Projection Web Mercator (EPSG:3857)
//!
//! Aussi connu sous le nom de Pseudo-Mercator ou Spherical Mercator.
//! Utilisé par Google Maps, OpenStreetMap, etc.

use super::ellipsoid::WGS84;
use super::Geographic;

/// Latitude maximale représentable (carte carrée)
pub const MAX_LATITUDE_DEG: f64 = 85.051_128_779_806_59;

/// Convertit coordonnées géographiques vers Web Mercator (EPSG:3857)
pub fn geographic_to_web_mercator(geo: Geographic) -> (f64, f64) {
    // Modèle sphérique avec le rayon équatorial
    let r = WGS84::A;

    let max = MAX_LATITUDE_DEG.to_radians();
    let lat = geo.lat.clamp(-max, max);

    let x = r * geo.lon;
    let y = r * (std::f64::consts::FRAC_PI_4 + lat / 2.0).tan().ln();

    (x, y)
}

/// Convertit Web Mercator vers coordonnées géographiques
pub fn web_mercator_to_geographic(x: f64, y: f64) -> Geographic {
    let r = WGS84::A;

    let lon = x / r;
    let lat = 2.0 * (y / r).exp().atan() - std::f64::consts::FRAC_PI_2;

    Geographic::new(lon, lat)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_london_to_web_mercator() {
        // Londres: -0.1276°E, 51.5072°N
        let (x, y) = geographic_to_web_mercator(Geographic::from_degrees(-0.1276, 51.5072));

        assert!((x - (-14204.4)).abs() < 5.0, "x={}", x);
        assert!((y - 6711542.0).abs() < 500.0, "y={}", y);
    }

    #[test]
    fn test_roundtrip() {
        let geo = Geographic::from_degrees(-2.5879, 51.4545);
        let (x, y) = geographic_to_web_mercator(geo);
        let (lon, lat) = web_mercator_to_geographic(x, y).to_degrees();

        assert!((lon - (-2.5879)).abs() < 1e-9, "lon={}", lon);
        assert!((lat - 51.4545).abs() < 1e-9, "lat={}", lat);
    }

    #[test]
    fn test_polar_latitude_clamped() {
        let (_, y) = geographic_to_web_mercator(Geographic::from_degrees(0.0, 89.9));
        let (_, y_max) = geographic_to_web_mercator(Geographic::from_degrees(0.0, MAX_LATITUDE_DEG));
        assert!(y.is_finite());
        assert_eq!(y, y_max);
    }
}
