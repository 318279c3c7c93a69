//! Types de données pour le crate hotspots

use std::collections::BTreeMap;

use geo::{Coord, Polygon, Rect};
use serde::{Deserialize, Serialize};

use crate::reproject::Crs;

/// Valeur signalée quand le nombre de points n'a pas été calculé.
///
/// Ne doit jamais apparaître dans un résultat publié : les writers omettent
/// l'attribut à la place.
pub const POINT_COUNT_NOT_COMPUTED: i64 = -1;

/// Valeur scalaire d'un attribut source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    Bool(bool),
    Integer(i64),
    Float(f64),
    Text(String),
}

impl std::fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{}", b),
            Self::Integer(i) => write!(f, "{}", i),
            Self::Float(v) => write!(f, "{}", v),
            Self::Text(s) => f.write_str(s),
        }
    }
}

/// Attributs d'un point (clé -> valeur nullable), transportés tels quels
pub type Properties = BTreeMap<String, Option<PropertyValue>>;

/// Un point source avec ses attributs
#[derive(Debug, Clone, PartialEq)]
pub struct SourcePoint {
    pub x: f64,
    pub y: f64,
    pub properties: Properties,
}

impl SourcePoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self {
            x,
            y,
            properties: Properties::new(),
        }
    }

    pub fn with_properties(x: f64, y: f64, properties: Properties) -> Self {
        Self { x, y, properties }
    }

    pub fn coord(&self) -> Coord {
        Coord {
            x: self.x,
            y: self.y,
        }
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// Ensemble de points dans un système de référence donné
#[derive(Debug, Clone)]
pub struct PointSet {
    /// Système de référence des coordonnées
    pub crs: Crs,

    /// Points dans l'ordre de lecture
    pub points: Vec<SourcePoint>,
}

impl PointSet {
    pub fn new(crs: Crs, points: Vec<SourcePoint>) -> Self {
        Self { crs, points }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Emprise des points finis, `None` si aucun
    pub fn bounds(&self) -> Option<Rect> {
        bounds_of(self.points.iter().filter(|p| p.is_finite()).map(SourcePoint::coord))
    }
}

/// Un hotspot : polygone et attributs calculés dans le système métrique
#[derive(Debug, Clone, PartialEq)]
pub struct Cluster {
    /// Identifiant séquentiel, unique pour une exécution
    pub id: usize,

    /// Surface en m², mesurée dans le système métrique de calcul
    pub area_m2: f64,

    /// Nombre de points contenus (intérieur ou bord), `None` si non calculé
    pub point_count: Option<usize>,

    /// Géométrie dans le système de sortie
    pub geometry: Polygon,
}

impl Cluster {
    /// Nombre de points, ou [`POINT_COUNT_NOT_COMPUTED`]
    pub fn point_count_or_sentinel(&self) -> i64 {
        self.point_count
            .map(|n| n as i64)
            .unwrap_or(POINT_COUNT_NOT_COMPUTED)
    }
}

/// Hotspots produits par une exécution du pipeline
#[derive(Debug, Clone)]
pub struct ClusterSet {
    /// Système de référence des géométries
    pub crs: Crs,

    pub clusters: Vec<Cluster>,
}

impl ClusterSet {
    pub fn empty(crs: Crs) -> Self {
        Self {
            crs,
            clusters: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.clusters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clusters.is_empty()
    }

    /// Surface cumulée (m²)
    pub fn total_area(&self) -> f64 {
        self.clusters.iter().map(|c| c.area_m2).sum()
    }

    /// Emprise de tous les hotspots
    pub fn bounds(&self) -> Option<Rect> {
        bounds_of(
            self.clusters
                .iter()
                .flat_map(|c| c.geometry.exterior().0.iter().copied()),
        )
    }
}

fn bounds_of(coords: impl Iterator<Item = Coord>) -> Option<Rect> {
    coords.fold(None, |acc: Option<Rect>, c| match acc {
        None => Some(Rect::new(c, c)),
        Some(r) => Some(Rect::new(
            Coord {
                x: r.min().x.min(c.x),
                y: r.min().y.min(c.y),
            },
            Coord {
                x: r.max().x.max(c.x),
                y: r.max().y.max(c.y),
            },
        )),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::LineString;

    #[test]
    fn test_point_count_sentinel() {
        let square = Polygon::new(
            LineString::from(vec![(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 0.0)]),
            vec![],
        );
        let mut cluster = Cluster {
            id: 0,
            area_m2: 0.5,
            point_count: None,
            geometry: square,
        };
        assert_eq!(cluster.point_count_or_sentinel(), POINT_COUNT_NOT_COMPUTED);

        cluster.point_count = Some(12);
        assert_eq!(cluster.point_count_or_sentinel(), 12);
    }

    #[test]
    fn test_point_set_bounds_skip_non_finite() {
        let set = PointSet::new(
            Crs::from_epsg(27700),
            vec![
                SourcePoint::new(10.0, 20.0),
                SourcePoint::new(f64::NAN, 0.0),
                SourcePoint::new(-5.0, 40.0),
            ],
        );
        let bounds = set.bounds().unwrap();
        assert_eq!(bounds.min(), Coord { x: -5.0, y: 20.0 });
        assert_eq!(bounds.max(), Coord { x: 10.0, y: 40.0 });

        let empty = PointSet::new(Crs::from_epsg(27700), vec![]);
        assert!(empty.bounds().is_none());
    }

    #[test]
    fn test_property_value_serde_untagged() {
        let values: Vec<PropertyValue> = serde_json::from_str(r#"[true, 3, 2.5, "II*"]"#).unwrap();
        assert_eq!(
            values,
            vec![
                PropertyValue::Bool(true),
                PropertyValue::Integer(3),
                PropertyValue::Float(2.5),
                PropertyValue::Text("II*".to_string()),
            ]
        );
    }
}
