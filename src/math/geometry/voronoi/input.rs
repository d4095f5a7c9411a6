// src/math/geometry/voronoi/input.rs

use crate::math::geometry::polygon::{Polygon, PolygonValidator, ValidationError};
use crate::math::types::{Point2D, cross, is_finite_point, lexicographic_cmp};
use std::fmt;

/// Gewichtetes Zentrum als Eingabe der Partitionierung.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeightedSite {
    pub center: Point2D,
    pub weight: f64,
}

impl WeightedSite {
    pub fn new(center: Point2D, weight: f64) -> Self {
        Self { center, weight }
    }
}

/// Ein einzelnes Problem der Eingabe, mit dem Index des betroffenen Zentrums.
#[derive(Debug, Clone, PartialEq)]
pub enum InputIssue {
    NonPositiveWeight { site: usize, weight: f64 },
    NonFiniteWeight { site: usize },
    NonFiniteCenter { site: usize },
    CenterOutside { site: usize },
    CoincidentCenters { site: usize, other: usize },
    BoundingPolygon(ValidationError),
}

impl fmt::Display for InputIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NonPositiveWeight { site, weight } => {
                write!(f, "site {site} has non-positive weight {weight}")
            }
            Self::NonFiniteWeight { site } => write!(f, "site {site} has a non-finite weight"),
            Self::NonFiniteCenter { site } => write!(f, "site {site} has a non-finite center"),
            Self::CenterOutside { site } => {
                write!(f, "site {site} lies outside the bounding polygon")
            }
            Self::CoincidentCenters { site, other } => {
                write!(f, "sites {site} and {other} share the same center")
            }
            Self::BoundingPolygon(error) => write!(f, "bounding polygon: {error}"),
        }
    }
}

/// Sammelt alle Eingabeprobleme, statt beim ersten abzubrechen.
pub fn check_input(sites: &[WeightedSite], bounds: &Polygon) -> Vec<InputIssue> {
    let mut issues: Vec<InputIssue> = PolygonValidator::validate_region(bounds)
        .errors
        .into_iter()
        .map(InputIssue::BoundingPolygon)
        .collect();
    let convex_ccw = issues.is_empty();

    for (site, s) in sites.iter().enumerate() {
        if !s.weight.is_finite() {
            issues.push(InputIssue::NonFiniteWeight { site });
        } else if s.weight <= 0.0 {
            issues.push(InputIssue::NonPositiveWeight {
                site,
                weight: s.weight,
            });
        }

        if !is_finite_point(s.center) {
            issues.push(InputIssue::NonFiniteCenter { site });
        } else if !strictly_inside(bounds, s.center, convex_ccw) {
            issues.push(InputIssue::CenterOutside { site });
        }
    }

    let mut order: Vec<usize> = (0..sites.len())
        .filter(|&i| is_finite_point(sites[i].center))
        .collect();
    order.sort_by(|&a, &b| lexicographic_cmp(&sites[a].center, &sites[b].center).then(a.cmp(&b)));
    for pair in order.windows(2) {
        if sites[pair[0]].center == sites[pair[1]].center {
            issues.push(InputIssue::CoincidentCenters {
                site: pair[1],
                other: pair[0],
            });
        }
    }

    issues
}

fn strictly_inside(bounds: &Polygon, point: Point2D, convex_ccw: bool) -> bool {
    use crate::math::geometry::polygon::PolygonProperties;

    if convex_ccw {
        bounds.edges().all(|(a, b)| cross(b - a, point - a) > 0.0)
    } else {
        bounds.contains_point(point)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square() -> Polygon {
        Polygon::rectangle(Point2D::ZERO, Point2D::new(10.0, 10.0)).unwrap()
    }

    #[test]
    fn test_clean_input_has_no_issues() {
        let sites = vec![
            WeightedSite::new(Point2D::new(2.0, 2.0), 1.0),
            WeightedSite::new(Point2D::new(8.0, 3.0), 2.0),
        ];
        assert!(check_input(&sites, &square()).is_empty());
    }

    #[test]
    fn test_all_issues_reported_with_site_index() {
        let sites = vec![
            WeightedSite::new(Point2D::new(2.0, 2.0), 0.0),
            WeightedSite::new(Point2D::new(12.0, 2.0), 1.0),
            WeightedSite::new(Point2D::new(2.0, 2.0), f64::NAN),
            WeightedSite::new(Point2D::new(0.0, 5.0), 1.0),
        ];
        let issues = check_input(&sites, &square());
        assert!(issues.contains(&InputIssue::NonPositiveWeight { site: 0, weight: 0.0 }));
        assert!(issues.contains(&InputIssue::CenterOutside { site: 1 }));
        assert!(issues.contains(&InputIssue::NonFiniteWeight { site: 2 }));
        assert!(issues.contains(&InputIssue::CoincidentCenters { site: 2, other: 0 }));
        // Zentrum auf dem Rand zählt als außerhalb
        assert!(issues.contains(&InputIssue::CenterOutside { site: 3 }));
        assert_eq!(issues.len(), 5);
    }

    #[test]
    fn test_clockwise_bounds_reported() {
        let sites = vec![WeightedSite::new(Point2D::new(5.0, 5.0), 1.0)];
        let issues = check_input(&sites, &square().reversed());
        assert_eq!(issues, vec![InputIssue::BoundingPolygon(ValidationError::Clockwise)]);
    }
}
