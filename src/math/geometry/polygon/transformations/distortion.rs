// src/math/geometry/polygon/transformations/distortion.rs

use super::super::{Polygon, PolygonProperties};
use crate::math::{
    error::{MathError, MathResult},
    types::{Point2D, cross},
};

/// Randprofil eines sternförmigen Polygons: Vertices relativ zum Zentrum, nach Winkel sortiert.
#[derive(Debug, Clone)]
struct AngularProfile {
    angles: Vec<f64>,
    offsets: Vec<Point2D>,
}

impl AngularProfile {
    fn new(polygon: &Polygon, center: Point2D) -> MathResult<Self> {
        let mut entries: Vec<(f64, Point2D)> = polygon
            .vertices()
            .iter()
            .map(|v| *v - center)
            .filter(|offset| offset.length_squared() > 0.0)
            .map(|offset| (offset.y.atan2(offset.x), offset))
            .collect();
        if entries.len() < 3 {
            return Err(MathError::GeometricFailure {
                operation: "angular profile needs the center strictly inside the polygon".into(),
            });
        }
        entries.sort_by(|a, b| a.0.total_cmp(&b.0));
        let (angles, offsets) = entries.into_iter().unzip();
        Ok(Self { angles, offsets })
    }

    /// Abstand vom Zentrum zum Rand entlang `direction`.
    fn boundary_radius(&self, direction: Point2D) -> Option<f64> {
        let theta = direction.y.atan2(direction.x);
        let n = self.angles.len();
        let index = self.angles.partition_point(|angle| *angle < theta);
        let a = self.offsets[(index + n - 1) % n];
        let b = self.offsets[index % n];

        let denominator = direction.x * (b.y - a.y) - direction.y * (b.x - a.x);
        if denominator == 0.0 {
            return None;
        }
        let factor = cross(a, b) / denominator;
        (factor.is_finite() && factor > 0.0).then(|| factor * direction.length())
    }
}

/// Stetige Abbildung der Punkte eines Polygons in ein anderes.
///
/// Jeder Punkt wird entlang seines Strahls vom Quellzentrum radial skaliert, sodass der
/// Quellrand auf den Zielrand fällt. Punkte jenseits des Quellrands landen bei
/// `fraction = 1` auf dem Zielrand.
#[derive(Debug, Clone)]
pub struct PolygonMorpher {
    from_center: Point2D,
    to_center: Point2D,
    from_profile: AngularProfile,
    to_profile: AngularProfile,
}

impl PolygonMorpher {
    /// Fehlende Zentren werden durch die Flächenschwerpunkte ersetzt.
    pub fn new(
        from: &Polygon,
        to: &Polygon,
        from_center: Option<Point2D>,
        to_center: Option<Point2D>,
    ) -> MathResult<Self> {
        let from_center = resolve_center(from, from_center)?;
        let to_center = resolve_center(to, to_center)?;
        Ok(Self {
            from_center,
            to_center,
            from_profile: AngularProfile::new(from, from_center)?,
            to_profile: AngularProfile::new(to, to_center)?,
        })
    }

    pub fn map_point(&self, point: Point2D, fraction: f64) -> Point2D {
        let offset = point - self.from_center;
        let r = offset.length();
        if r == 0.0 {
            return self.to_center;
        }

        let radii = self
            .from_profile
            .boundary_radius(offset)
            .zip(self.to_profile.boundary_radius(offset));
        let Some((r_from, r_to)) = radii else {
            return self.to_center + offset;
        };

        let factor = if r < r_from {
            1.0 + (r_to / r_from - 1.0) * fraction
        } else {
            1.0 + (r_to / r - 1.0) * fraction
        };
        self.to_center + offset * factor
    }

    pub fn map_points(&self, points: &[Point2D], fraction: f64) -> Vec<Point2D> {
        points.iter().map(|p| self.map_point(*p, fraction)).collect()
    }
}

fn resolve_center(polygon: &Polygon, center: Option<Point2D>) -> MathResult<Point2D> {
    match center {
        Some(c) => Ok(c),
        None => polygon.area_centroid().ok_or_else(|| MathError::GeometricFailure {
            operation: "morph center of a zero-area polygon".into(),
        }),
    }
}

/// Bildet `points` von `from` nach `to` ab.
pub fn map_points(
    points: &[Point2D],
    from: &Polygon,
    to: &Polygon,
    from_center: Option<Point2D>,
    to_center: Option<Point2D>,
    fraction: f64,
) -> MathResult<Vec<Point2D>> {
    if !fraction.is_finite() {
        return Err(MathError::InvalidConfiguration {
            message: format!("morph fraction must be finite, got {fraction}"),
        });
    }
    let morpher = PolygonMorpher::new(from, to, from_center, to_center)?;
    Ok(morpher.map_points(points, fraction))
}

/// Bildet alle Vertices von `polygon` ab (Zentren = Schwerpunkte).
pub fn map_polygon(polygon: &Polygon, from: &Polygon, to: &Polygon, fraction: f64) -> MathResult<Polygon> {
    let mapped = map_points(polygon.vertices(), from, to, None, None, fraction)?;
    Polygon::new(mapped)
}
