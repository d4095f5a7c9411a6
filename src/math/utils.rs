// src/math/utils.rs

/// Mathematische Konstanten
pub mod constants {
    /// Kleinste Zellgröße im QuadTree, darunter gelten Punkte als identisch.
    pub const MIN_CELL_SIZE: f64 = 1e-10;
    pub const TAU: f64 = std::f64::consts::TAU;
}
