// src/math/geometry/mod.rs

// Deklaration der Haupt-Geometriemodule
pub mod polygon;
pub mod voronoi;

pub use self::polygon::{Orientation, Polygon, PolygonMorpher, PolygonProperties};
pub use self::voronoi::{CentroidalRelaxer, WeightedVoronoiPartitioner};
