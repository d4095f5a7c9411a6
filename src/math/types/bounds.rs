// src/math/types/bounds.rs

use crate::math::{error::*, types::*};
use std::fmt;

/// 2D Bounding Box (Axis-Aligned Bounding Box)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds2D {
    pub min: Point2D,
    pub max: Point2D,
}

impl Bounds2D {
    /// Erstellt eine neue Bounding Box
    pub fn new(min: Point2D, max: Point2D) -> MathResult<Self> {
        if !(min.x <= max.x && min.y <= max.y) {
            return Err(MathError::InvalidConfiguration {
                message: format!("Invalid bounds: min {:?} > max {:?}", min, max),
            });
        }

        Ok(Self { min, max })
    }

    /// Erstellt eine Bounding Box die alle Punkte umschließt
    pub fn from_points_iter<I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = Point2D>,
    {
        let mut points_iter = points.into_iter();
        let first_point = points_iter.next()?;

        let mut min = first_point;
        let mut max = first_point;

        for point in points_iter {
            min = min.min(point);
            max = max.max(point);
        }

        Some(Self { min, max })
    }

    pub fn width(&self) -> f64 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> f64 {
        self.max.y - self.min.y
    }

    /// Größere der beiden Kantenlängen
    pub fn extent(&self) -> f64 {
        self.width().max(self.height())
    }

    pub fn diagonal(&self) -> f64 {
        (self.max - self.min).length()
    }

    pub fn center(&self) -> Point2D {
        (self.min + self.max) * 0.5
    }

    /// Punkt-Test inklusive Rand
    pub fn contains_point(&self, point: Point2D) -> bool {
        point.x >= self.min.x && point.x <= self.max.x && point.y >= self.min.y && point.y <= self.max.y
    }

    /// Quadrantenindex relativ zur Mitte: Bit 0 = rechts, Bit 1 = oben.
    pub fn quadrant_index(&self, point: Point2D) -> usize {
        let mid = self.center();
        (if point.y > mid.y { 2 } else { 0 }) + (if point.x > mid.x { 1 } else { 0 })
    }

    /// Teilbox für den Quadranten `index` (gleiche Kodierung wie `quadrant_index`).
    pub fn quadrant(&self, index: usize) -> Self {
        let mid = self.center();
        let (min_x, max_x) = if index & 1 == 1 {
            (mid.x, self.max.x)
        } else {
            (self.min.x, mid.x)
        };
        let (min_y, max_y) = if index & 2 == 2 {
            (mid.y, self.max.y)
        } else {
            (self.min.y, mid.y)
        };
        Self {
            min: Point2D::new(min_x, min_y),
            max: Point2D::new(max_x, max_y),
        }
    }

    /// Quadrierter Abstand eines Punktes zur Box (0 innerhalb).
    pub fn distance_squared_to(&self, point: Point2D) -> f64 {
        let clamped = point.clamp(self.min, self.max);
        point.distance_squared(clamped)
    }
}

impl fmt::Display for Bounds2D {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[({:.3}, {:.3}) - ({:.3}, {:.3})]",
            self.min.x, self.min.y, self.max.x, self.max.y
        )
    }
}
