// src/math/types/mod.rs
pub mod bounds;
pub mod point;

pub use bounds::*;
pub use point::*;

// Einheitliche Typen für das gesamte Modul (doppelte Genauigkeit für die Schnittgeometrie)
pub use bevy::math::DVec2;
pub type Point2D = DVec2;
