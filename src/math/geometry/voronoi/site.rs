// src/math/geometry/voronoi/site.rs

use super::line::SplitLine;
use crate::math::geometry::polygon::Polygon;
use crate::math::types::{Point2D, cross};

/// Was jenseits einer Zellkante liegt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Neighbor {
    Site(usize),
    Boundary,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    Keep,
    On,
    Drop,
}

/// Konvexe Zelle gegen den Uhrzeigersinn; `labels[i]` beschreibt die Kante i → i+1.
#[derive(Debug, Clone, PartialEq)]
pub struct CellRing {
    pub vertices: Vec<Point2D>,
    pub labels: Vec<Neighbor>,
}

impl CellRing {
    /// Gebietspolygon, alle Kanten am Rand.
    pub fn from_region(region: &Polygon) -> Self {
        Self {
            vertices: region.vertices().to_vec(),
            labels: vec![Neighbor::Boundary; region.len()],
        }
    }

    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Kanten als (Start, Ende, Nachbar).
    pub fn edges(&self) -> impl Iterator<Item = (Point2D, Point2D, Neighbor)> + '_ {
        let n = self.vertices.len();
        (0..n).map(move |i| (self.vertices[i], self.vertices[(i + 1) % n], self.labels[i]))
    }

    pub fn signed_area(&self) -> f64 {
        0.5 * self.edges().map(|(a, b, _)| cross(a, b)).sum::<f64>()
    }

    /// Schneidet die Zelle mit der Halbebene `line.eval <= 0` (Sutherland-Hodgman).
    ///
    /// Die neue Schnittkante erhält `new_label`, Reste alter Kanten behalten ihren Nachbarn.
    /// Vertices innerhalb von `tolerance` zur Geraden gelten als auf ihr liegend und erzeugen
    /// keinen Schnittpunkt. `None`, wenn keine Fläche übrig bleibt.
    pub fn clip(&self, line: &SplitLine, new_label: Neighbor, tolerance: f64) -> Option<Self> {
        let n = self.vertices.len();
        let distances: Vec<f64> = self
            .vertices
            .iter()
            .map(|v| line.signed_distance(*v))
            .collect();
        let side = |d: f64| {
            if d < -tolerance {
                Side::Keep
            } else if d > tolerance {
                Side::Drop
            } else {
                Side::On
            }
        };

        let mut vertices = Vec::with_capacity(n + 2);
        let mut labels = Vec::with_capacity(n + 2);
        for i in 0..n {
            let j = (i + 1) % n;
            let (p, q) = (self.vertices[i], self.vertices[j]);
            let (dp, dq) = (distances[i], distances[j]);
            let label = self.labels[i];
            let crossing = || p + (q - p) * (dp / (dp - dq));

            match (side(dp), side(dq)) {
                (Side::Keep, Side::Drop) => {
                    vertices.extend([p, crossing()]);
                    labels.extend([label, new_label]);
                }
                (Side::Keep, _) | (Side::On, Side::Keep) | (Side::On, Side::On) => {
                    vertices.push(p);
                    labels.push(label);
                }
                (Side::On, Side::Drop) => {
                    vertices.push(p);
                    labels.push(new_label);
                }
                (Side::Drop, Side::Keep) => {
                    vertices.push(crossing());
                    labels.push(label);
                }
                (Side::Drop, _) => {}
            }
        }

        let clipped = Self { vertices, labels };
        (clipped.len() >= 3 && clipped.signed_area() > tolerance * tolerance).then_some(clipped)
    }

    /// Prüft, ob ein Vertex echt auf der positiven Seite von `line` liegt.
    pub fn reaches_positive_side(&self, line: &SplitLine, tolerance: f64) -> bool {
        self.vertices
            .iter()
            .any(|v| line.signed_distance(*v) > tolerance)
    }

    pub fn to_polygon(&self) -> Polygon {
        Polygon::from_raw(self.vertices.clone())
    }
}

/// Zentrum im Verlauf der Partitionierung; Indizes sind Ränge (absteigendes Gewicht).
#[derive(Debug, Clone)]
pub(crate) struct Site {
    /// Index in der ursprünglichen Eingabe
    pub input_index: usize,
    pub center: Point2D,
    /// Bereits normiertes Gewicht
    pub weight: f64,
    pub cell: Option<CellRing>,
    /// Noch nicht eingefügte Zentren, deren Mittelpunkt in dieser Zelle liegt (nach Rang sortiert)
    pub pending: Vec<usize>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn unit_square() -> CellRing {
        CellRing::from_region(&Polygon::rectangle(Point2D::ZERO, Point2D::new(1.0, 1.0)).unwrap())
    }

    #[test]
    fn test_clip_labels_new_edge() {
        let square = unit_square();
        // behält x <= 0.5
        let line = SplitLine::between(Point2D::new(0.25, 0.5), 1.0, Point2D::new(0.75, 0.5), 1.0).unwrap();
        let left = square.clip(&line, Neighbor::Site(7), 1e-9).unwrap();
        assert_relative_eq!(left.signed_area(), 0.5, epsilon = 1e-12);
        assert_eq!(left.len(), 4);
        assert_eq!(left.labels.iter().filter(|l| **l == Neighbor::Site(7)).count(), 1);
        for (a, b, label) in left.edges() {
            if label == Neighbor::Site(7) {
                assert_relative_eq!(a.x, 0.5, epsilon = 1e-12);
                assert_relative_eq!(b.x, 0.5, epsilon = 1e-12);
                assert!(a.y < b.y);
            }
        }
    }

    #[test]
    fn test_clip_through_vertices() {
        let square = unit_square();
        // Diagonale durch (1,0) und (0,1), behält die untere linke Hälfte
        let line = SplitLine::between(Point2D::new(0.25, 0.25), 0.0, Point2D::new(0.75, 0.75), 0.0).unwrap();
        let lower = square.clip(&line, Neighbor::Site(1), 1e-9).unwrap();
        assert_eq!(lower.len(), 3);
        assert_relative_eq!(lower.signed_area(), 0.5, epsilon = 1e-12);
        assert_eq!(
            lower.labels,
            vec![Neighbor::Boundary, Neighbor::Site(1), Neighbor::Boundary]
        );

        let upper = square.clip(&line.flipped(), Neighbor::Site(0), 1e-9).unwrap();
        assert_eq!(upper.len(), 3);
        assert_relative_eq!(upper.signed_area(), 0.5, epsilon = 1e-12);
    }

    #[test]
    fn test_clip_removing_everything() {
        let square = unit_square();
        let line = SplitLine::between(Point2D::new(5.0, 0.5), 1.0, Point2D::new(6.0, 0.5), 1.0).unwrap();
        assert!(square.clip(&line.flipped(), Neighbor::Site(0), 1e-9).is_none());
        assert!(square.reaches_positive_side(&line.flipped(), 1e-9));
        assert!(!square.reaches_positive_side(&line, 1e-9));
    }
}
