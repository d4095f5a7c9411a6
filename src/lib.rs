// ./src/lib.rs
// Kern der Verlaufs-Treemap: Geometrie, Clustering und Layout ohne Render-Oberfläche.
pub mod clustering;
pub mod debug;
pub mod layout;
pub mod math;

pub mod prelude {
    pub use crate::clustering::prelude::*;
    pub use crate::layout::{LayoutError, NodeGeometry, TreeLayout};
    pub use crate::math::prelude::*;
}
