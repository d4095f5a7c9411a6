// src/math/geometry/voronoi/config.rs
use crate::math::error::{MathError, MathResult};

/// Einstellungen der gewichteten Partitionierung.
#[derive(Debug, Clone)]
pub struct PartitionConfig {
    /// Eingaben vor der Partitionierung prüfen (Gewichte, Zentren, Gebiet).
    pub check_input: bool,
    /// Obergrenze der besuchten Zellen beim Einfügen eines Zentrums.
    pub max_clip_iterations: usize,
    /// Anteil k in scale = k·d²/max(w) der Gewichtsnormierung.
    pub max_size_fraction: f64,
    /// Obergrenze für den geglätteten Anteil.
    pub super_max_size_fraction: f64,
    /// Gewicht c des vorigen Skalierungsfaktors bei der Glättung.
    pub weight_delay: f64,
    /// Ab dieser Zentrenanzahl wird der nächste Nachbar über den QuadTree gesucht.
    pub spatial_index_threshold: usize,
    /// Relative Toleranz der Seitentests (mal Diagonale des Gebiets).
    pub tolerance: f64,
}

impl PartitionConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_check_input(mut self, check: bool) -> Self {
        self.check_input = check;
        self
    }

    pub fn with_max_clip_iterations(mut self, iterations: usize) -> Self {
        self.max_clip_iterations = iterations;
        self
    }

    pub fn with_weight_delay(mut self, delay: f64) -> Self {
        self.weight_delay = delay;
        self
    }

    pub fn with_spatial_index_threshold(mut self, threshold: usize) -> Self {
        self.spatial_index_threshold = threshold;
        self
    }

    pub fn validate(&self) -> MathResult<()> {
        if self.max_clip_iterations == 0 {
            return Err(MathError::InvalidConfiguration {
                message: "max_clip_iterations must be greater than 0".to_string(),
            });
        }

        if !(self.max_size_fraction > 0.0 && self.max_size_fraction < 1.0) {
            return Err(MathError::InvalidConfiguration {
                message: "max_size_fraction must be between 0.0 and 1.0".to_string(),
            });
        }

        if !(self.super_max_size_fraction >= self.max_size_fraction && self.super_max_size_fraction < 1.0) {
            return Err(MathError::InvalidConfiguration {
                message: "super_max_size_fraction must lie in [max_size_fraction, 1.0)".to_string(),
            });
        }

        if !(0.0..1.0).contains(&self.weight_delay) {
            return Err(MathError::InvalidConfiguration {
                message: "weight_delay must be between 0.0 and 1.0".to_string(),
            });
        }

        if !(self.tolerance > 0.0 && self.tolerance < 1e-3) {
            return Err(MathError::InvalidConfiguration {
                message: "tolerance must be positive and small".to_string(),
            });
        }

        Ok(())
    }
}

impl Default for PartitionConfig {
    fn default() -> Self {
        Self {
            check_input: true,
            max_clip_iterations: 25,
            max_size_fraction: 0.95,
            super_max_size_fraction: 0.98,
            weight_delay: 0.7,
            spatial_index_threshold: 250,
            tolerance: 1e-9,
        }
    }
}
