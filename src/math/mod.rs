pub mod error;
pub mod geometry;
pub mod spatial;
pub mod types;
pub mod utils;

// Re-exports für einfache Verwendung
pub use error::{MathError, MathResult};
pub use types::*;

// Öffentliche API
pub mod prelude {
    pub use super::{
        error::{MathError, MathResult},
        geometry::{
            polygon::{Polygon, PolygonMorpher, PolygonProperties, map_points, map_polygon},
            voronoi::{
                CentroidalRelaxer, LloydConfig, LloydStatistics, PartitionConfig, PowerCell,
                RelaxResult, ScaleMemory, TaskId, Tessellation, WeightedSite,
                WeightedVoronoiPartitioner,
            },
        },
        spatial::{QuadTree, SpatialHit},
        types::*,
    };
}
