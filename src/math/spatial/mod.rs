// src/math/spatial/mod.rs
pub mod quadtree;

pub use quadtree::{QuadEntry, QuadTree, SpatialHit};
