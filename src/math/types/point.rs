use super::Point2D;
use std::cmp::Ordering;

/// z-Komponente des Kreuzprodukts zweier 2D-Vektoren.
pub fn cross(a: Point2D, b: Point2D) -> f64 {
    a.x * b.y - a.y * b.x
}

/// Orientierung des Dreiecks (a, b, c): positiv bei Linksdrehung.
pub fn orient2d(a: Point2D, b: Point2D, c: Point2D) -> f64 {
    cross(b - a, c - a)
}

/// Lexikographische Totalordnung (x, dann y), NaN-sicher.
pub fn lexicographic_cmp(a: &Point2D, b: &Point2D) -> Ordering {
    a.x.total_cmp(&b.x).then(a.y.total_cmp(&b.y))
}

pub fn is_finite_point(p: Point2D) -> bool {
    p.x.is_finite() && p.y.is_finite()
}
