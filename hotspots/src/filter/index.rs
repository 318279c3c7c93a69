//! Index spatial des points pour le comptage par polygone

use geo::{BoundingRect, Coord, Intersects, Point, Polygon};
use rstar::{RTree, AABB};

/// R-tree des coordonnées métriques des points
pub struct PointIndex {
    tree: RTree<[f64; 2]>,
}

impl PointIndex {
    /// Construit l'index (bulk load)
    pub fn new(coords: &[Coord]) -> Self {
        let entries: Vec<[f64; 2]> = coords.iter().map(|c| [c.x, c.y]).collect();
        Self {
            tree: RTree::bulk_load(entries),
        }
    }

    pub fn len(&self) -> usize {
        self.tree.size()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }

    /// Nombre de points à l'intérieur ou sur le bord du polygone.
    ///
    /// L'emprise du polygone sélectionne les candidats, le test exact ne
    /// porte que sur eux.
    pub fn count_within(&self, polygon: &Polygon) -> usize {
        let Some(rect) = polygon.bounding_rect() else {
            return 0;
        };
        let envelope = AABB::from_corners(
            [rect.min().x, rect.min().y],
            [rect.max().x, rect.max().y],
        );

        self.tree
            .locate_in_envelope(&envelope)
            .filter(|p| polygon.intersects(&Point::new(p[0], p[1])))
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::LineString;

    fn square(size: f64) -> Polygon {
        Polygon::new(
            LineString::from(vec![
                (0.0, 0.0),
                (size, 0.0),
                (size, size),
                (0.0, size),
                (0.0, 0.0),
            ]),
            vec![],
        )
    }

    #[test]
    fn test_counts_interior_and_boundary() {
        let coords = vec![
            Coord { x: 5.0, y: 5.0 },   // intérieur
            Coord { x: 10.0, y: 3.0 },  // sur le bord
            Coord { x: 0.0, y: 0.0 },   // sommet
            Coord { x: 10.5, y: 5.0 },  // dehors
            Coord { x: -1.0, y: -1.0 }, // dehors
        ];
        let index = PointIndex::new(&coords);
        assert_eq!(index.len(), 5);
        assert_eq!(index.count_within(&square(10.0)), 3);
    }

    #[test]
    fn test_excludes_points_in_holes_and_bbox_corners() {
        let triangle = Polygon::new(
            LineString::from(vec![(0.0, 0.0), (10.0, 0.0), (0.0, 10.0), (0.0, 0.0)]),
            vec![],
        );
        // Dans l'emprise mais hors du triangle
        let coords = vec![Coord { x: 9.0, y: 9.0 }, Coord { x: 1.0, y: 1.0 }];
        let index = PointIndex::new(&coords);
        assert_eq!(index.count_within(&triangle), 1);

        let holed = Polygon::new(
            square(10.0).exterior().clone(),
            vec![LineString::from(vec![
                (4.0, 4.0),
                (6.0, 4.0),
                (6.0, 6.0),
                (4.0, 6.0),
                (4.0, 4.0),
            ])],
        );
        let index = PointIndex::new(&[Coord { x: 5.0, y: 5.0 }, Coord { x: 2.0, y: 2.0 }]);
        assert_eq!(index.count_within(&holed), 1);
    }

    #[test]
    fn test_empty_index() {
        let index = PointIndex::new(&[]);
        assert!(index.is_empty());
        assert_eq!(index.count_within(&square(10.0)), 0);
    }
}
