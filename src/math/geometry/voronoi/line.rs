// src/math/geometry/voronoi/line.rs

use crate::math::types::Point2D;

/// Trenngerade zweier gewichteter Zentren im Leistungsdiagramm.
///
/// `eval(p) = normal·p - offset`; negative Werte liegen auf der Seite des ersten Zentrums.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SplitLine {
    pub normal: Point2D,
    pub offset: f64,
}

impl SplitLine {
    /// Gerade senkrecht zu `c2 - c1`, bei Anteil `1/2 + (w1 - w2)/(2|c2 - c1|²)` von `c1` aus.
    /// Gleiche Gewichte ergeben die Mittelsenkrechte.
    pub fn between(c1: Point2D, w1: f64, c2: Point2D, w2: f64) -> Option<Self> {
        let normal = c2 - c1;
        let length_sq = normal.length_squared();
        if !(length_sq > 0.0) {
            return None;
        }
        let v1 = normal.dot(c1);
        let v2 = normal.dot(c2);
        let fraction = 0.5 + (w1 - w2) / (2.0 * length_sq);
        Some(Self {
            normal,
            offset: v1 + fraction * (v2 - v1),
        })
    }

    pub fn eval(&self, point: Point2D) -> f64 {
        self.normal.dot(point) - self.offset
    }

    /// Vorzeichenbehafteter euklidischer Abstand
    pub fn signed_distance(&self, point: Point2D) -> f64 {
        self.eval(point) / self.normal.length()
    }

    /// Dieselbe Gerade mit vertauschten Seiten.
    pub fn flipped(&self) -> Self {
        Self {
            normal: -self.normal,
            offset: -self.offset,
        }
    }
}
