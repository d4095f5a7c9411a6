// src/math/geometry/polygon/core.rs

use crate::math::{
    error::*,
    types::{Bounds2D, Point2D, is_finite_point},
    utils::constants::TAU,
};
use std::fmt;

/// Einfaches, implizit geschlossenes Polygon.
///
/// Der letzte Vertex ist mit dem ersten verbunden; ein doppelter Schlusspunkt wird beim
/// Erstellen entfernt. Zellen der Partitionierung sind stets konvex und gegen den
/// Uhrzeigersinn orientiert, allgemeine Eingaben werden hier aber nicht normalisiert.
#[derive(Debug, Clone, PartialEq)]
pub struct Polygon {
    vertices: Vec<Point2D>,
}

impl Polygon {
    /// Erstellt ein Polygon aus mindestens drei endlichen Vertices.
    pub fn new(mut vertices: Vec<Point2D>) -> MathResult<Self> {
        if vertices.len() > 3 && vertices.first() == vertices.last() {
            vertices.pop();
        }
        if vertices.len() < 3 {
            return Err(MathError::InsufficientPoints {
                expected: 3,
                actual: vertices.len(),
            });
        }
        if let Some(index) = vertices.iter().position(|v| !is_finite_point(*v)) {
            return Err(MathError::GeometricFailure {
                operation: format!("polygon vertex {index} is not finite"),
            });
        }
        Ok(Self { vertices })
    }

    /// Vertices aus einer bereits geprüften Quelle (z.B. Clipping-Ergebnis).
    pub(crate) fn from_raw(vertices: Vec<Point2D>) -> Self {
        Self { vertices }
    }

    /// Achsenparalleles Rechteck, gegen den Uhrzeigersinn.
    pub fn rectangle(min: Point2D, max: Point2D) -> MathResult<Self> {
        let bounds = Bounds2D::new(min, max)?;
        if bounds.width() <= 0.0 || bounds.height() <= 0.0 {
            return Err(MathError::InvalidConfiguration {
                message: format!("degenerate rectangle {bounds}"),
            });
        }
        Ok(Self::from_raw(vec![
            min,
            Point2D::new(max.x, min.y),
            max,
            Point2D::new(min.x, max.y),
        ]))
    }

    /// Regelmäßiges n-Eck um `center`, gegen den Uhrzeigersinn.
    pub fn regular(center: Point2D, radius: f64, sides: usize) -> MathResult<Self> {
        if sides < 3 || !(radius > 0.0) {
            return Err(MathError::InvalidConfiguration {
                message: format!("regular polygon needs >= 3 sides and radius > 0 (got {sides}, {radius})"),
            });
        }
        let vertices = (0..sides)
            .map(|i| {
                let angle = TAU * i as f64 / sides as f64;
                center + Point2D::new(angle.cos(), angle.sin()) * radius
            })
            .collect();
        Self::new(vertices)
    }

    pub fn vertices(&self) -> &[Point2D] {
        &self.vertices
    }

    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Vertex mit zyklischem Index
    pub fn vertex(&self, index: usize) -> Point2D {
        self.vertices[index % self.vertices.len()]
    }

    /// Kanten (v_i, v_{i+1}) inklusive der Schlusskante.
    pub fn edges(&self) -> impl Iterator<Item = (Point2D, Point2D)> + '_ {
        let n = self.vertices.len();
        (0..n).map(move |i| (self.vertices[i], self.vertices[(i + 1) % n]))
    }

    pub fn bounds(&self) -> Bounds2D {
        Bounds2D::from_points_iter(self.vertices.iter().copied()).unwrap_or(Bounds2D {
            min: Point2D::ZERO,
            max: Point2D::ZERO,
        })
    }

    /// Umgekehrte Vertex-Reihenfolge
    pub fn reversed(&self) -> Self {
        let mut vertices = self.vertices.clone();
        vertices.reverse();
        Self { vertices }
    }
}

impl From<&Polygon> for geo::Polygon<f64> {
    fn from(polygon: &Polygon) -> Self {
        let ring: Vec<(f64, f64)> = polygon.vertices.iter().map(|v| (v.x, v.y)).collect();
        geo::Polygon::new(geo::LineString::from(ring), vec![])
    }
}

impl fmt::Display for Polygon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Polygon[")?;
        for (i, v) in self.vertices.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "({:.3}, {:.3})", v.x, v.y)?;
        }
        write!(f, "]")
    }
}
