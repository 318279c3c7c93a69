//! British National Grid (EPSG:27700)
//!
//! Mercator transverse sur l'ellipsoïde Airy 1830 (datum OSGB36), avec
//! passage WGS84 ↔ OSGB36 par une transformation de Helmert à 7 paramètres.
//! Précision de l'ordre de 5 m par rapport à OSTN15, largement suffisante
//! pour des buffers de plusieurs dizaines de mètres.

use super::ellipsoid::{Airy1830, WGS84};
use super::Geographic;

/// Facteur d'échelle sur le méridien central
const F0: f64 = 0.9996012717;
/// Latitude d'origine (49°N)
const LAT0_DEG: f64 = 49.0;
/// Méridien central (2°W)
const LON0_DEG: f64 = -2.0;
/// False easting
const E0: f64 = 400000.0;
/// False northing
const N0: f64 = -100000.0;

/// Paramètres de Helmert WGS84 → OSGB36 (translations en m, échelle en ppm,
/// rotations en secondes d'arc)
const HELMERT: [f64; 7] = [-446.448, 125.157, -542.060, 20.4894, -0.1502, -0.2470, -0.8421];

/// Convertit WGS84 (géographique) vers British National Grid
pub fn geographic_to_bng(geo: Geographic) -> (f64, f64) {
    let (x, y, z) = to_cartesian(geo, WGS84::A, WGS84::E2);
    let (x, y, z) = helmert(x, y, z, 1.0);
    let osgb36 = from_cartesian(x, y, z, Airy1830::A, Airy1830::E2);
    transverse_mercator(osgb36)
}

/// Convertit British National Grid vers WGS84 (géographique)
pub fn bng_to_geographic(easting: f64, northing: f64) -> Geographic {
    let osgb36 = inverse_transverse_mercator(easting, northing);
    let (x, y, z) = to_cartesian(osgb36, Airy1830::A, Airy1830::E2);
    let (x, y, z) = helmert(x, y, z, -1.0);
    from_cartesian(x, y, z, WGS84::A, WGS84::E2)
}

/// Arc de méridien depuis la latitude d'origine, multiplié par F0
fn meridional_arc(lat: f64) -> f64 {
    let n = Airy1830::N;
    let (n2, n3) = (n * n, n * n * n);
    let lat0 = LAT0_DEG.to_radians();
    let d = lat - lat0;
    let s = lat + lat0;

    Airy1830::B
        * F0
        * ((1.0 + n + 1.25 * n2 + 1.25 * n3) * d
            - (3.0 * n + 3.0 * n2 + 21.0 / 8.0 * n3) * d.sin() * s.cos()
            + (15.0 / 8.0 * n2 + 15.0 / 8.0 * n3) * (2.0 * d).sin() * (2.0 * s).cos()
            - 35.0 / 24.0 * n3 * (3.0 * d).sin() * (3.0 * s).cos())
}

/// Rayons de courbure (ν, ρ) à l'échelle F0 et η² = ν/ρ - 1
fn curvatures(lat: f64) -> (f64, f64, f64) {
    let a = Airy1830::A;
    let e2 = Airy1830::E2;
    let sin2 = lat.sin().powi(2);

    let nu = a * F0 / (1.0 - e2 * sin2).sqrt();
    let rho = a * F0 * (1.0 - e2) / (1.0 - e2 * sin2).powf(1.5);
    (nu, rho, nu / rho - 1.0)
}

/// Projection directe OSGB36 géographique → (E, N)
pub fn transverse_mercator(geo: Geographic) -> (f64, f64) {
    let lat = geo.lat;
    let (sin, cos, tan) = (lat.sin(), lat.cos(), lat.tan());
    let tan2 = tan * tan;
    let (nu, rho, eta2) = curvatures(lat);

    let i = meridional_arc(lat) + N0;
    let ii = nu / 2.0 * sin * cos;
    let iii = nu / 24.0 * sin * cos.powi(3) * (5.0 - tan2 + 9.0 * eta2);
    let iiia = nu / 720.0 * sin * cos.powi(5) * (61.0 - 58.0 * tan2 + tan2 * tan2);
    let iv = nu * cos;
    let v = nu / 6.0 * cos.powi(3) * (nu / rho - tan2);
    let vi = nu / 120.0
        * cos.powi(5)
        * (5.0 - 18.0 * tan2 + tan2 * tan2 + 14.0 * eta2 - 58.0 * tan2 * eta2);

    let dl = geo.lon - LON0_DEG.to_radians();
    let easting = E0 + iv * dl + v * dl.powi(3) + vi * dl.powi(5);
    let northing = i + ii * dl.powi(2) + iii * dl.powi(4) + iiia * dl.powi(6);

    (easting, northing)
}

/// Projection inverse (E, N) → OSGB36 géographique
pub fn inverse_transverse_mercator(easting: f64, northing: f64) -> Geographic {
    let a = Airy1830::A;
    let lat0 = LAT0_DEG.to_radians();

    // Latitude du pied de la perpendiculaire, à 0.01 mm près
    let mut lat = (northing - N0) / (a * F0) + lat0;
    let mut m = meridional_arc(lat);
    for _ in 0..32 {
        if (northing - N0 - m).abs() < 1e-5 {
            break;
        }
        lat += (northing - N0 - m) / (a * F0);
        m = meridional_arc(lat);
    }

    let (cos, tan) = (lat.cos(), lat.tan());
    let sec = 1.0 / cos;
    let tan2 = tan * tan;
    let tan4 = tan2 * tan2;
    let (nu, rho, eta2) = curvatures(lat);

    let vii = tan / (2.0 * rho * nu);
    let viii = tan / (24.0 * rho * nu.powi(3)) * (5.0 + 3.0 * tan2 + eta2 - 9.0 * tan2 * eta2);
    let ix = tan / (720.0 * rho * nu.powi(5)) * (61.0 + 90.0 * tan2 + 45.0 * tan4);
    let x = sec / nu;
    let xi = sec / (6.0 * nu.powi(3)) * (nu / rho + 2.0 * tan2);
    let xii = sec / (120.0 * nu.powi(5)) * (5.0 + 28.0 * tan2 + 24.0 * tan4);
    let xiia = sec / (5040.0 * nu.powi(7))
        * (61.0 + 662.0 * tan2 + 1320.0 * tan4 + 720.0 * tan4 * tan2);

    let de = easting - E0;
    let phi = lat - vii * de.powi(2) + viii * de.powi(4) - ix * de.powi(6);
    let lambda = LON0_DEG.to_radians() + x * de - xi * de.powi(3) + xii * de.powi(5)
        - xiia * de.powi(7);

    Geographic::new(lambda, phi)
}

fn to_cartesian(geo: Geographic, a: f64, e2: f64) -> (f64, f64, f64) {
    let nu = a / (1.0 - e2 * geo.lat.sin().powi(2)).sqrt();
    (
        nu * geo.lat.cos() * geo.lon.cos(),
        nu * geo.lat.cos() * geo.lon.sin(),
        (1.0 - e2) * nu * geo.lat.sin(),
    )
}

fn from_cartesian(x: f64, y: f64, z: f64, a: f64, e2: f64) -> Geographic {
    let p = x.hypot(y);
    let lon = y.atan2(x);
    let mut lat = z.atan2(p * (1.0 - e2));
    for _ in 0..10 {
        let nu = a / (1.0 - e2 * lat.sin().powi(2)).sqrt();
        lat = (z + e2 * nu * lat.sin()).atan2(p);
    }
    Geographic::new(lon, lat)
}

/// Helmert à 7 paramètres ; `sign = -1` applique la transformation inverse
/// (approximation au premier ordre, erreur de quelques mm)
fn helmert(x: f64, y: f64, z: f64, sign: f64) -> (f64, f64, f64) {
    let arcsec = std::f64::consts::PI / (180.0 * 3600.0);
    let [tx, ty, tz, s_ppm, rx, ry, rz] = HELMERT;
    let (tx, ty, tz) = (tx * sign, ty * sign, tz * sign);
    let s = 1.0 + s_ppm * 1e-6 * sign;
    let (rx, ry, rz) = (rx * arcsec * sign, ry * arcsec * sign, rz * arcsec * sign);

    (
        tx + s * x - rz * y + ry * z,
        ty + rz * x + s * y - rx * z,
        tz - ry * x + rx * y + s * z,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn caister() -> Geographic {
        // Exemple de référence Ordnance Survey (OSGB36)
        Geographic::from_degrees(
            1.0 + 43.0 / 60.0 + 4.5177 / 3600.0,
            52.0 + 39.0 / 60.0 + 27.2531 / 3600.0,
        )
    }

    #[test]
    fn test_transverse_mercator_reference_point() {
        let (e, n) = transverse_mercator(caister());
        assert!((e - 651409.903).abs() < 1e-3, "e={}", e);
        assert!((n - 313177.270).abs() < 1e-3, "n={}", n);
    }

    #[test]
    fn test_inverse_transverse_mercator_reference_point() {
        let (lon, lat) = inverse_transverse_mercator(651409.903, 313177.270).to_degrees();
        let (exp_lon, exp_lat) = caister().to_degrees();
        assert!((lon - exp_lon).abs() < 1e-8, "lon={}", lon);
        assert!((lat - exp_lat).abs() < 1e-8, "lat={}", lat);
    }

    #[test]
    fn test_trafalgar_square() {
        let (e, n) = geographic_to_bng(Geographic::from_degrees(-0.1276, 51.5072));
        assert!((e - 530043.0).abs() < 10.0, "e={}", e);
        assert!((n - 180358.0).abs() < 10.0, "n={}", n);
    }

    #[test]
    fn test_roundtrip_centimetric() {
        for &(e, n) in &[(530000.0, 180000.0), (326000.0, 674000.0), (145000.0, 35000.0)] {
            let geo = bng_to_geographic(e, n);
            let (e2, n2) = geographic_to_bng(geo);
            assert!((e2 - e).abs() < 0.01, "e {} -> {}", e, e2);
            assert!((n2 - n).abs() < 0.01, "n {} -> {}", n, n2);
        }
    }
}
