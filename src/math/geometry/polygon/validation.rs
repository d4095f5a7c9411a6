// src/math/geometry/polygon/validation.rs

use crate::math::geometry::polygon::{
    core::Polygon,
    properties::{Orientation, PolygonProperties},
};
use crate::math::types::{is_finite_point, orient2d};
use geo::IsConvex;
use std::fmt;

/// Ergebnis einer Polygon-Validierung.
#[derive(Debug, Clone, Default)]
pub struct ValidationReport {
    pub errors: Vec<ValidationError>,
    pub warnings: Vec<ValidationWarning>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Fehler, die ein Begrenzungspolygon unbrauchbar machen.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    InsufficientVertices { count: usize },
    NonFiniteVertex { index: usize },
    ZeroArea,
    Clockwise,
    NonConvex,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InsufficientVertices { count } => write!(f, "only {count} vertices"),
            Self::NonFiniteVertex { index } => write!(f, "vertex {index} is not finite"),
            Self::ZeroArea => write!(f, "zero area"),
            Self::Clockwise => write!(f, "clockwise orientation"),
            Self::NonConvex => write!(f, "not convex"),
        }
    }
}

/// Hinweise, die die Partitionierung nicht verhindern.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationWarning {
    CollinearVertex { index: usize },
}

pub struct PolygonValidator;

impl PolygonValidator {
    /// Prüft ein Polygon als Partitionierungsgebiet: endlich, konvex, gegen den Uhrzeigersinn.
    pub fn validate_region(polygon: &Polygon) -> ValidationReport {
        let mut report = ValidationReport::default();
        let vertices = polygon.vertices();

        if vertices.len() < 3 {
            report.errors.push(ValidationError::InsufficientVertices {
                count: vertices.len(),
            });
            return report;
        }
        if let Some(index) = vertices.iter().position(|v| !is_finite_point(*v)) {
            report.errors.push(ValidationError::NonFiniteVertex { index });
            return report;
        }

        match polygon.orientation() {
            Orientation::Collinear => {
                report.errors.push(ValidationError::ZeroArea);
                return report;
            }
            Orientation::Clockwise => report.errors.push(ValidationError::Clockwise),
            Orientation::CounterClockwise => {}
        }

        let region: geo::Polygon<f64> = polygon.into();
        if !region.exterior().is_convex() {
            report.errors.push(ValidationError::NonConvex);
        }

        for i in 0..polygon.len() {
            let prev = polygon.vertex(i + polygon.len() - 1);
            if orient2d(prev, polygon.vertex(i), polygon.vertex(i + 1)) == 0.0 {
                report.warnings.push(ValidationWarning::CollinearVertex { index: i });
            }
        }

        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::types::Point2D;

    #[test]
    fn test_square_is_valid_region() {
        let sq = Polygon::rectangle(Point2D::ZERO, Point2D::new(1.0, 1.0)).unwrap();
        let report = PolygonValidator::validate_region(&sq);
        assert!(report.is_valid());
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn test_clockwise_region_rejected() {
        let sq = Polygon::rectangle(Point2D::ZERO, Point2D::new(1.0, 1.0)).unwrap();
        let report = PolygonValidator::validate_region(&sq.reversed());
        assert_eq!(report.errors, vec![ValidationError::Clockwise]);
    }

    #[test]
    fn test_non_convex_region_rejected() {
        let notch = Polygon::new(vec![
            Point2D::new(0.0, 0.0),
            Point2D::new(4.0, 0.0),
            Point2D::new(4.0, 4.0),
            Point2D::new(2.0, 1.0),
            Point2D::new(0.0, 4.0),
        ])
        .unwrap();
        let report = PolygonValidator::validate_region(&notch);
        assert!(report.errors.contains(&ValidationError::NonConvex));
    }

    #[test]
    fn test_collinear_vertex_is_warning_only() {
        let p = Polygon::new(vec![
            Point2D::new(0.0, 0.0),
            Point2D::new(1.0, 0.0),
            Point2D::new(2.0, 0.0),
            Point2D::new(2.0, 2.0),
            Point2D::new(0.0, 2.0),
        ])
        .unwrap();
        let report = PolygonValidator::validate_region(&p);
        assert!(report.is_valid());
        assert_eq!(report.warnings, vec![ValidationWarning::CollinearVertex { index: 1 }]);
    }
}
