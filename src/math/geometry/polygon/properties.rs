// src/math/geometry/polygon/properties.rs

use crate::math::geometry::polygon::core::Polygon;
use crate::math::types::{Point2D, cross, orient2d};

/// Trait für geometrische Eigenschaften von Polygonen.
pub trait PolygonProperties {
    /// Vorzeichenbehaftete Fläche (Shoelace), positiv gegen den Uhrzeigersinn.
    fn signed_area(&self) -> f64;

    fn area(&self) -> f64 {
        self.signed_area().abs()
    }

    fn perimeter(&self) -> f64;

    /// Ray-Casting, gilt für einfache Polygone.
    fn contains_point(&self, point: Point2D) -> bool;

    /// Prüft, ob das Polygon konvex ist (kollineare Vertices erlaubt).
    fn is_convex(&self) -> bool;

    fn orientation(&self) -> Orientation;

    /// Flächenschwerpunkt. `None` bei verschwindender Fläche.
    fn area_centroid(&self) -> Option<Point2D>;

    /// Kleinster Abstand eines Punktes zu den (unendlich verlängerten) Kantengeraden.
    fn min_edge_line_distance(&self, point: Point2D) -> f64;
}

/// Gibt die Orientierung eines Polygons an.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    Clockwise,
    CounterClockwise,
    Collinear,
}

impl PolygonProperties for Polygon {
    fn signed_area(&self) -> f64 {
        if self.len() < 3 {
            return 0.0;
        }
        0.5 * self.edges().map(|(a, b)| cross(a, b)).sum::<f64>()
    }

    fn perimeter(&self) -> f64 {
        self.edges().map(|(a, b)| a.distance(b)).sum()
    }

    fn contains_point(&self, point: Point2D) -> bool {
        let mut inside = false;
        for (a, b) in self.edges() {
            if (a.y > point.y) != (b.y > point.y) {
                let x_cross = a.x + (point.y - a.y) * (b.x - a.x) / (b.y - a.y);
                if point.x < x_cross {
                    inside = !inside;
                }
            }
        }
        inside
    }

    fn is_convex(&self) -> bool {
        let n = self.len();
        if n < 3 {
            return false;
        }
        let mut sign = 0.0_f64;
        for i in 0..n {
            let (a, b, c) = (self.vertex(i), self.vertex(i + 1), self.vertex(i + 2));
            let turn = orient2d(a, b, c);
            // nahezu kollineare Vertices (Schnittpunkte auf einer Kante) zählen nicht
            if turn.abs() <= 1e-9 * a.distance(b) * b.distance(c) {
                continue;
            }
            if sign == 0.0 {
                sign = turn.signum();
            } else if turn.signum() != sign {
                return false;
            }
        }
        sign != 0.0
    }

    fn orientation(&self) -> Orientation {
        let area = self.signed_area();
        if area > 0.0 {
            Orientation::CounterClockwise
        } else if area < 0.0 {
            Orientation::Clockwise
        } else {
            Orientation::Collinear
        }
    }

    fn area_centroid(&self) -> Option<Point2D> {
        let area = self.signed_area();
        if area.abs() <= f64::EPSILON * self.bounds().diagonal().powi(2) || !area.is_finite() {
            return None;
        }
        // Auf den ersten Vertex bezogen, um Auslöschung bei großen Koordinaten zu vermeiden
        let origin = self.vertex(0);
        let mut acc = Point2D::ZERO;
        for (a, b) in self.edges() {
            let (a, b) = (a - origin, b - origin);
            acc += (a + b) * cross(a, b);
        }
        Some(origin + acc / (6.0 * area))
    }

    fn min_edge_line_distance(&self, point: Point2D) -> f64 {
        self.edges()
            .filter_map(|(a, b)| {
                let edge = b - a;
                let len = edge.length();
                (len > 0.0).then(|| cross(edge, point - a).abs() / len)
            })
            .fold(f64::INFINITY, f64::min)
    }
}
