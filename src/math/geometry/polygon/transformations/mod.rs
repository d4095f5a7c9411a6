// src/math/geometry/polygon/transformations/mod.rs
pub mod distortion;

pub use distortion::*;
