//! Reprojection de géométries avec PROJ
//!
//! Ce module est disponible uniquement avec le feature `reproject`.

#[cfg(feature = "reproject")]
use anyhow::{Context, Result};
#[cfg(feature = "reproject")]
use geo::{Coord, Geometry, LineString, MultiLineString, MultiPoint, MultiPolygon, Point, Polygon};
#[cfg(feature = "reproject")]
use hotspots::Crs;
#[cfg(feature = "reproject")]
use proj::Proj;

/// Reprojection de géométries entre deux systèmes quelconques connus de PROJ
#[cfg(feature = "reproject")]
pub struct ProjReprojector {
    proj: Proj,
    source: Crs,
    target: Crs,
}

#[cfg(feature = "reproject")]
impl ProjReprojector {
    /// Crée un nouveau reprojector (identifiants EPSG ou chaînes PROJ)
    pub fn new(source: &Crs, target: &Crs) -> Result<Self> {
        let proj = Proj::new_known_crs(source.as_str(), target.as_str(), None).context(format!(
            "Failed to create projection from {} to {}",
            source, target
        ))?;

        Ok(Self {
            proj,
            source: source.clone(),
            target: target.clone(),
        })
    }

    pub fn source(&self) -> &Crs {
        &self.source
    }

    pub fn target(&self) -> &Crs {
        &self.target
    }

    /// Transforme une géométrie
    pub fn transform_geometry(&self, geom: &Geometry) -> Result<Geometry> {
        if self.source.same_as(&self.target) {
            return Ok(geom.clone());
        }

        match geom {
            Geometry::Point(p) => {
                let c = self.transform_coords(&[p.0])?;
                Ok(Geometry::Point(Point(c[0])))
            }
            Geometry::LineString(ls) => Ok(Geometry::LineString(self.transform_linestring(ls)?)),
            Geometry::Polygon(p) => Ok(Geometry::Polygon(self.transform_polygon(p)?)),
            Geometry::MultiPoint(mp) => {
                let coords: Vec<Coord> = mp.0.iter().map(|p| p.0).collect();
                let points = self
                    .transform_coords(&coords)?
                    .into_iter()
                    .map(Point)
                    .collect();
                Ok(Geometry::MultiPoint(MultiPoint::new(points)))
            }
            Geometry::MultiLineString(mls) => {
                let lines: Result<Vec<LineString>> = mls
                    .0
                    .iter()
                    .map(|ls| self.transform_linestring(ls))
                    .collect();
                Ok(Geometry::MultiLineString(MultiLineString::new(lines?)))
            }
            Geometry::MultiPolygon(mp) => {
                let polys: Result<Vec<Polygon>> =
                    mp.0.iter().map(|p| self.transform_polygon(p)).collect();
                Ok(Geometry::MultiPolygon(MultiPolygon::new(polys?)))
            }
            other => anyhow::bail!("Unsupported geometry type for reprojection: {:?}", other),
        }
    }

    /// Transformation batch, beaucoup plus rapide que point par point
    fn transform_coords(&self, coords: &[Coord]) -> Result<Vec<Coord>> {
        let mut buf: Vec<(f64, f64)> = coords.iter().map(|c| (c.x, c.y)).collect();

        self.proj
            .convert_array(&mut buf)
            .context("Batch coordinate transformation failed")?;

        Ok(buf.into_iter().map(|(x, y)| Coord { x, y }).collect())
    }

    fn transform_linestring(&self, ls: &LineString) -> Result<LineString> {
        Ok(LineString::new(self.transform_coords(&ls.0)?))
    }

    fn transform_polygon(&self, p: &Polygon) -> Result<Polygon> {
        let exterior = self.transform_linestring(p.exterior())?;
        let interiors: Result<Vec<LineString>> = p
            .interiors()
            .iter()
            .map(|ls| self.transform_linestring(ls))
            .collect();
        Ok(Polygon::new(exterior, interiors?))
    }
}
