// src/math/geometry/polygon/mod.rs

pub mod core; // Enthält die Polygon-Struktur selbst
pub mod properties; // Enthält den PolygonProperties-Trait
pub mod transformations; // Abbildungen zwischen Polygonen
pub mod validation; // Prüfung von Begrenzungspolygonen

pub use self::core::Polygon;
pub use self::properties::{Orientation, PolygonProperties};
pub use self::transformations::distortion::{PolygonMorpher, map_points, map_polygon};
pub use self::validation::{PolygonValidator, ValidationError, ValidationReport, ValidationWarning};
