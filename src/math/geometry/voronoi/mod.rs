// src/math/geometry/voronoi/mod.rs

// Gewichtete Voronoi-Zerlegung (Leistungsdiagramm) und zentroidale Relaxation
pub mod boundary;
pub mod config; // PartitionConfig
pub mod input;
pub mod line;
pub mod lloyd; // LloydConfig und CentroidalRelaxer
pub mod partitioner;
pub mod scale;
pub(crate) mod site;

pub use self::boundary::{BoundaryPoint, BoundaryRing};
pub use self::config::PartitionConfig;
pub use self::input::{InputIssue, WeightedSite, check_input};
pub use self::line::SplitLine;
pub use self::lloyd::{CentroidalRelaxer, LloydConfig, LloydStatistics, RelaxResult, spiral_positions};
pub use self::partitioner::{PowerCell, Tessellation, WeightedVoronoiPartitioner};
pub use self::scale::{ScaleMemory, TaskId, weight_scale};
pub use self::site::{CellRing, Neighbor};
