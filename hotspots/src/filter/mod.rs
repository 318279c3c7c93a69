//! Filtrage des composantes par surface et densité de points

pub mod index;

use geo::{Area, Coord, Polygon};

use crate::params::{FilterPolicy, HotspotParams};

pub use index::PointIndex;

/// Seuils et politique de filtrage
#[derive(Debug, Clone, Copy)]
pub struct FilterCriteria {
    pub min_area_sqm: f64,
    pub min_points: usize,
    pub policy: FilterPolicy,
    /// Compter les points des composantes gardées en mode `area-only`
    pub count_points: bool,
}

impl From<&HotspotParams> for FilterCriteria {
    fn from(params: &HotspotParams) -> Self {
        Self {
            min_area_sqm: params.min_area_sqm,
            min_points: params.min_points,
            policy: params.filter_policy,
            count_points: params.count_points,
        }
    }
}

/// Composante retenue avec ses attributs calculés
#[derive(Debug, Clone)]
pub struct FilteredPolygon {
    /// Géométrie dans le système métrique
    pub polygon: Polygon,

    /// Surface en m²
    pub area_m2: f64,

    /// `None` quand le comptage n'a pas été fait
    pub point_count: Option<usize>,
}

/// Résultat du filtrage
#[derive(Debug, Clone, Default)]
pub struct FilterOutcome {
    pub kept: Vec<FilteredPolygon>,

    /// Exclues car trop petites (mode `area-only`)
    pub excluded_small: usize,

    /// Exclues car trop peu de points (mode `area-or-density`)
    pub excluded_sparse: usize,
}

impl FilterOutcome {
    pub fn excluded(&self) -> usize {
        self.excluded_small + self.excluded_sparse
    }
}

/// Filtre les composantes selon la politique.
///
/// - `AreaOnly` : garde si `area >= min_area_sqm`. Les points ne sont
///   comptés que si `count_points` est demandé, et seulement pour les
///   composantes gardées.
/// - `AreaOrDensity` : les deux branches (grande et dense, petite et dense)
///   exigent `min_points` points ; la surface ne dispense jamais du comptage.
pub fn filter_polygons(
    polygons: Vec<Polygon>,
    points: &[Coord],
    criteria: &FilterCriteria,
) -> FilterOutcome {
    let mut outcome = FilterOutcome::default();
    if polygons.is_empty() {
        return outcome;
    }

    let needs_index = criteria.count_points || criteria.policy.needs_point_count();
    let index = needs_index.then(|| PointIndex::new(points));

    for polygon in polygons {
        let area_m2 = polygon.unsigned_area();

        match criteria.policy {
            FilterPolicy::AreaOnly => {
                if area_m2 < criteria.min_area_sqm {
                    outcome.excluded_small += 1;
                    continue;
                }
                let point_count = index.as_ref().map(|idx| idx.count_within(&polygon));
                outcome.kept.push(FilteredPolygon {
                    polygon,
                    area_m2,
                    point_count,
                });
            }
            FilterPolicy::AreaOrDensity => {
                let count = index
                    .as_ref()
                    .map(|idx| idx.count_within(&polygon))
                    .unwrap_or(0);
                if count < criteria.min_points {
                    outcome.excluded_sparse += 1;
                    continue;
                }
                outcome.kept.push(FilteredPolygon {
                    polygon,
                    area_m2,
                    point_count: Some(count),
                });
            }
        }
    }

    outcome
}
