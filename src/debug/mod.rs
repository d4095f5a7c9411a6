// src/debug/mod.rs

// SVG-Ausgabe von Zerlegungen und Layouts zur Fehlersuche
pub mod svg;

pub use self::svg::{layout_document, save, tessellation_document};
