// src/layout/mod.rs

// Verschachteltes Voronoi-Layout eines Clusterbaums
pub mod error;
pub mod treemap;

pub use self::error::{LayoutError, LayoutResult};
pub use self::treemap::{NodeGeometry, TreeLayout};
