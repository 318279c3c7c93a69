//! Systèmes de référence et interface de reprojection
//!
//! Le coeur ne sait pas reprojeter : il délègue à un [`Reprojector`] fourni
//! par l'appelant (PROJ, implémentation pure Rust, ou faux en mémoire pour
//! les tests).

use std::fmt;

use geo::{Coord, Geometry, MultiPoint, Point, Polygon};
use serde::{Deserialize, Serialize};

use crate::HotspotError;

/// Codes EPSG géographiques (degrés) reconnus
const GEOGRAPHIC_EPSG: &[u32] = &[4326, 4258, 4269, 4277, 4171, 4230, 4283];

/// Identifiant de système de référence (`EPSG:27700`, chaîne PROJ...)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Crs(String);

impl Crs {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into().trim().to_string())
    }

    pub fn from_epsg(code: u32) -> Self {
        Self(format!("EPSG:{}", code))
    }

    /// WGS84 longitude/latitude (EPSG:4326)
    pub fn wgs84() -> Self {
        Self::from_epsg(4326)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Code EPSG si l'identifiant est de la forme `EPSG:<code>`
    pub fn epsg(&self) -> Option<u32> {
        let (authority, code) = self.0.split_once(':')?;
        if !authority.trim().eq_ignore_ascii_case("epsg") {
            return None;
        }
        code.trim().parse().ok()
    }

    /// Vrai pour un système en degrés, inutilisable pour distances et surfaces
    pub fn is_geographic(&self) -> bool {
        match self.epsg() {
            Some(code) => GEOGRAPHIC_EPSG.contains(&code),
            None => {
                let lower = self.0.to_ascii_lowercase();
                lower.contains("+proj=longlat") || lower.contains("+proj=latlong")
            }
        }
    }

    /// Égalité tolérante à la casse pour les codes EPSG
    pub fn same_as(&self, other: &Crs) -> bool {
        match (self.epsg(), other.epsg()) {
            (Some(a), Some(b)) => a == b,
            _ => self.0 == other.0,
        }
    }
}

impl fmt::Display for Crs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Collaborateur de reprojection
///
/// Doit préserver les distances quand la cible sert aux calculs de buffer et
/// de surface : le pipeline ne demande jamais de buffer en degrés.
pub trait Reprojector {
    /// Transforme une géométrie de `from` vers `to`
    fn reproject(&self, geometry: &Geometry, from: &Crs, to: &Crs)
        -> Result<Geometry, HotspotError>;
}

/// Reprojector qui n'accepte que des systèmes identiques
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityReprojector;

impl Reprojector for IdentityReprojector {
    fn reproject(
        &self,
        geometry: &Geometry,
        from: &Crs,
        to: &Crs,
    ) -> Result<Geometry, HotspotError> {
        if from.same_as(to) {
            Ok(geometry.clone())
        } else {
            Err(HotspotError::reprojection(
                from,
                to,
                "identity reprojector cannot change reference system",
            ))
        }
    }
}

/// Reprojette un lot de coordonnées en un seul appel
pub fn reproject_coords(
    reprojector: &dyn Reprojector,
    coords: &[Coord],
    from: &Crs,
    to: &Crs,
) -> Result<Vec<Coord>, HotspotError> {
    if from.same_as(to) || coords.is_empty() {
        return Ok(coords.to_vec());
    }

    let batch = Geometry::MultiPoint(MultiPoint::new(
        coords.iter().map(|c| Point::from(*c)).collect(),
    ));
    match reprojector.reproject(&batch, from, to)? {
        Geometry::MultiPoint(mp) if mp.0.len() == coords.len() => {
            Ok(mp.0.into_iter().map(|p| p.0).collect())
        }
        other => Err(HotspotError::reprojection(
            from,
            to,
            format!(
                "expected MultiPoint of {} points, got {}",
                coords.len(),
                geometry_kind(&other)
            ),
        )),
    }
}

/// Reprojette un polygone
pub fn reproject_polygon(
    reprojector: &dyn Reprojector,
    polygon: &Polygon,
    from: &Crs,
    to: &Crs,
) -> Result<Polygon, HotspotError> {
    if from.same_as(to) {
        return Ok(polygon.clone());
    }

    match reprojector.reproject(&Geometry::Polygon(polygon.clone()), from, to)? {
        Geometry::Polygon(p) => Ok(p),
        other => Err(HotspotError::reprojection(
            from,
            to,
            format!("expected Polygon, got {}", geometry_kind(&other)),
        )),
    }
}

fn geometry_kind(geometry: &Geometry) -> &'static str {
    match geometry {
        Geometry::Point(_) => "Point",
        Geometry::Line(_) => "Line",
        Geometry::LineString(_) => "LineString",
        Geometry::Polygon(_) => "Polygon",
        Geometry::MultiPoint(_) => "MultiPoint",
        Geometry::MultiLineString(_) => "MultiLineString",
        Geometry::MultiPolygon(_) => "MultiPolygon",
        Geometry::GeometryCollection(_) => "GeometryCollection",
        Geometry::Rect(_) => "Rect",
        Geometry::Triangle(_) => "Triangle",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_epsg_parsing() {
        assert_eq!(Crs::new("EPSG:27700").epsg(), Some(27700));
        assert_eq!(Crs::new("epsg: 3857").epsg(), Some(3857));
        assert_eq!(Crs::new("+proj=tmerc +lat_0=49").epsg(), None);
        assert_eq!(Crs::new("ESRI:102100").epsg(), None);
    }

    #[test]
    fn test_is_geographic() {
        assert!(Crs::wgs84().is_geographic());
        assert!(Crs::new("+proj=longlat +datum=WGS84").is_geographic());
        assert!(!Crs::from_epsg(27700).is_geographic());
        assert!(!Crs::from_epsg(3857).is_geographic());
    }

    #[test]
    fn test_same_as_ignores_case() {
        assert!(Crs::new("epsg:4326").same_as(&Crs::wgs84()));
        assert!(!Crs::from_epsg(3857).same_as(&Crs::wgs84()));
    }

    #[test]
    fn test_identity_rejects_change() {
        let point = Geometry::Point(Point::new(1.0, 2.0));
        let same = IdentityReprojector.reproject(&point, &Crs::wgs84(), &Crs::wgs84());
        assert_eq!(same.unwrap(), point);

        let err = IdentityReprojector
            .reproject(&point, &Crs::wgs84(), &Crs::from_epsg(3857))
            .unwrap_err();
        assert!(matches!(err, HotspotError::Reprojection { .. }));
    }

    #[test]
    fn test_reproject_coords_same_crs_is_noop() {
        let coords = vec![Coord { x: 1.0, y: 2.0 }, Coord { x: 3.0, y: 4.0 }];
        let crs = Crs::from_epsg(27700);
        let out = reproject_coords(&IdentityReprojector, &coords, &crs, &crs).unwrap();
        assert_eq!(out, coords);
    }
}
