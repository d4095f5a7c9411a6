// src/math/geometry/voronoi/boundary.rs

use super::site::{CellRing, Neighbor};
use crate::math::{
    error::{MathError, MathResult},
    geometry::polygon::Polygon,
    types::Point2D,
};

/// Punkt auf dem Gebietsrand mit den Besitzern der angrenzenden Randstücke.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundaryPoint {
    pub point: Point2D,
    /// Bogenlänge entlang des Gebietsrands ab Vertex 0
    pub param: f64,
    /// Besitzer des Randstücks, das in diesem Punkt endet
    pub before: usize,
    /// Besitzer des Randstücks, das in diesem Punkt beginnt
    pub after: usize,
}

/// Gegen den Uhrzeigersinn geordneter Ring aller Randvertices der aktuellen Zellen.
///
/// Existiert nur während einer Partitionierung; Zellbesitzer sind Ränge.
#[derive(Debug, Clone)]
pub struct BoundaryRing {
    corners: Vec<Point2D>,
    cumulative: Vec<f64>,
    perimeter: f64,
    tolerance: f64,
    points: Vec<BoundaryPoint>,
}

impl BoundaryRing {
    pub fn new(region: &Polygon, tolerance: f64) -> Self {
        let corners = region.vertices().to_vec();
        let mut cumulative = Vec::with_capacity(corners.len() + 1);
        let mut length = 0.0;
        cumulative.push(0.0);
        for (a, b) in region.edges() {
            length += a.distance(b);
            cumulative.push(length);
        }
        Self {
            corners,
            cumulative,
            perimeter: length,
            tolerance: tolerance * length.max(f64::MIN_POSITIVE),
            points: Vec::new(),
        }
    }

    pub fn points(&self) -> &[BoundaryPoint] {
        &self.points
    }

    /// Bogenlängenparameter der Projektion auf den nächsten Gebietsrand, in [0, Umfang).
    pub fn param_of(&self, point: Point2D) -> f64 {
        let n = self.corners.len();
        let mut best = (f64::INFINITY, 0.0);
        for k in 0..n {
            let a = self.corners[k];
            let b = self.corners[(k + 1) % n];
            let edge = b - a;
            let len_sq = edge.length_squared();
            let t = if len_sq > 0.0 {
                ((point - a).dot(edge) / len_sq).clamp(0.0, 1.0)
            } else {
                0.0
            };
            let dist_sq = point.distance_squared(a + edge * t);
            if dist_sq < best.0 {
                best = (dist_sq, self.cumulative[k] + t * (self.cumulative[k + 1] - self.cumulative[k]));
            }
        }
        if best.1 >= self.perimeter - self.tolerance {
            0.0
        } else {
            best.1
        }
    }

    fn locate(&self, param: f64) -> Result<usize, usize> {
        let index = self
            .points
            .partition_point(|bp| bp.param < param - self.tolerance);
        if index < self.points.len() && (self.points[index].param - param).abs() <= self.tolerance {
            return Ok(index);
        }
        if param <= self.tolerance {
            if let Some(last) = self.points.last() {
                if last.param >= self.perimeter - self.tolerance {
                    return Ok(self.points.len() - 1);
                }
            }
        }
        Err(index)
    }

    pub fn find(&self, point: Point2D) -> Option<&BoundaryPoint> {
        self.locate(self.param_of(point))
            .ok()
            .map(|index| &self.points[index])
    }

    /// Setzt die angegebenen Besitzer; ein neuer Punkt übernimmt den bekannten Besitzer für beide Seiten.
    pub fn upsert(&mut self, point: Point2D, before: Option<usize>, after: Option<usize>) {
        let param = self.param_of(point);
        match self.locate(param) {
            Ok(index) => {
                let bp = &mut self.points[index];
                if let Some(owner) = before {
                    bp.before = owner;
                }
                if let Some(owner) = after {
                    bp.after = owner;
                }
            }
            Err(index) => {
                let Some(owner) = before.or(after) else {
                    return;
                };
                self.points.insert(
                    index,
                    BoundaryPoint {
                        point,
                        param,
                        before: before.unwrap_or(owner),
                        after: after.unwrap_or(owner),
                    },
                );
            }
        }
    }

    /// Entfernt alle Punkte echt zwischen `from` und `to` (gegen den Uhrzeigersinn).
    fn remove_between(&mut self, from: f64, to: f64) {
        let tol = self.tolerance;
        self.points.retain(|bp| {
            let inside = if from < to {
                bp.param > from + tol && bp.param < to - tol
            } else {
                bp.param > from + tol || bp.param < to - tol
            };
            !inside
        });
    }

    /// Trägt die Randkanten einer Zelle ein.
    pub fn absorb_cell(&mut self, owner: usize, cell: &CellRing) {
        for (start, end, label) in cell.edges() {
            if label == Neighbor::Boundary {
                self.upsert(start, None, Some(owner));
                self.upsert(end, Some(owner), None);
            }
        }
    }

    /// Wie `absorb_cell`, verdrängt aber alle älteren Punkte im Inneren der Randkanten.
    pub fn claim_cell(&mut self, owner: usize, cell: &CellRing) {
        for (start, end, label) in cell.edges() {
            if label == Neighbor::Boundary {
                let from = self.param_of(start);
                let to = self.param_of(end);
                self.remove_between(from, to);
            }
        }
        self.absorb_cell(owner, cell);
    }

    /// Benachbarte Punkte müssen denselben Besitzer für das Randstück zwischen ihnen nennen.
    pub fn check_consistency(&self) -> MathResult<()> {
        let n = self.points.len();
        for i in 0..n {
            let current = &self.points[i];
            let next = &self.points[(i + 1) % n];
            if current.after != next.before {
                return Err(MathError::BoundaryInconsistent {
                    message: format!(
                        "segment after {:?} owned by {} but before {:?} by {}",
                        current.point, current.after, next.point, next.before
                    ),
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::geometry::voronoi::line::SplitLine;
    use approx::assert_relative_eq;

    fn square() -> Polygon {
        Polygon::rectangle(Point2D::ZERO, Point2D::new(10.0, 10.0)).unwrap()
    }

    #[test]
    fn test_param_along_perimeter() {
        let ring = BoundaryRing::new(&square(), 1e-9);
        assert_relative_eq!(ring.param_of(Point2D::new(0.0, 0.0)), 0.0);
        assert_relative_eq!(ring.param_of(Point2D::new(10.0, 5.0)), 15.0);
        assert_relative_eq!(ring.param_of(Point2D::new(0.0, 2.0)), 38.0);
        // nahe am Schluss wird auf 0 zurückgeführt
        assert_eq!(ring.param_of(Point2D::new(0.0, 1e-12)), 0.0);
    }

    #[test]
    fn test_split_square_ring() {
        let region = square();
        let full = CellRing::from_region(&region);
        let line = SplitLine::between(Point2D::new(2.0, 5.0), 1.0, Point2D::new(8.0, 5.0), 1.0).unwrap();
        let left = full.clip(&line, Neighbor::Site(1), 1e-9).unwrap();
        let right = full.clip(&line.flipped(), Neighbor::Site(0), 1e-9).unwrap();

        let mut ring = BoundaryRing::new(&region, 1e-9);
        ring.absorb_cell(0, &left);
        ring.absorb_cell(1, &right);
        assert_eq!(ring.points().len(), 6);
        assert!(ring.check_consistency().is_ok());

        let bottom_mid = ring.find(Point2D::new(5.0, 0.0)).unwrap();
        assert_eq!((bottom_mid.before, bottom_mid.after), (0, 1));
        let top_mid = ring.find(Point2D::new(5.0, 10.0)).unwrap();
        assert_eq!((top_mid.before, top_mid.after), (1, 0));

        // Zelle 2 übernimmt die gesamte rechte Seite
        ring.claim_cell(2, &right);
        assert!(ring.check_consistency().is_ok());
        let bottom_mid = ring.find(Point2D::new(5.0, 0.0)).unwrap();
        assert_eq!((bottom_mid.before, bottom_mid.after), (0, 2));
        assert_eq!(ring.points().len(), 6);
    }

    #[test]
    fn test_claim_removes_interior_points() {
        let region = square();
        let full = CellRing::from_region(&region);
        let line = SplitLine::between(Point2D::new(2.0, 5.0), 1.0, Point2D::new(8.0, 5.0), 1.0).unwrap();
        let left = full.clip(&line, Neighbor::Site(1), 1e-9).unwrap();
        let right = full.clip(&line.flipped(), Neighbor::Site(0), 1e-9).unwrap();

        let mut ring = BoundaryRing::new(&region, 1e-9);
        ring.absorb_cell(0, &left);
        ring.absorb_cell(1, &right);

        // Unteres Band y <= 2 über beide Zellen hinweg
        let band_line = SplitLine::between(Point2D::new(5.0, 1.0), 1.0, Point2D::new(5.0, 3.0), 1.0).unwrap();
        let band = full.clip(&band_line, Neighbor::Site(0), 1e-9).unwrap();
        ring.claim_cell(2, &band);
        assert!(ring.find(Point2D::new(5.0, 0.0)).is_none());
        let corner = ring.find(Point2D::new(10.0, 0.0)).unwrap();
        assert_eq!((corner.before, corner.after), (2, 2));
    }

    #[test]
    fn test_inconsistent_owners_detected() {
        let region = square();
        let mut ring = BoundaryRing::new(&region, 1e-9);
        ring.upsert(Point2D::new(0.0, 0.0), Some(0), Some(0));
        ring.upsert(Point2D::new(10.0, 0.0), Some(1), Some(1));
        assert!(ring.check_consistency().is_err());
    }
}
