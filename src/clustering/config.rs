// src/clustering/config.rs
use super::error::{ClusterError, ClusterResult};
use serde::{Deserialize, Serialize};

/// Nachbearbeitung des Clusterbaums nach dem Aufbau.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ProcessingMode {
    /// Baum unverändert lassen
    None,
    /// Kinder der Wurzel einmal neu ausbalancieren
    Rebalance,
    RebalanceRecursive,
    /// Kinder der Wurzel auf ihre schwersten Blätter kürzen
    Flatten,
    /// Rekursiv ausbalancieren, danach mit größenabhängiger Schwelle
    SizeBased,
    /// Wie `SizeBased`, anschließend kürzen
    #[default]
    SizeBasedFlatten,
}

impl ProcessingMode {
    /// Modusnummern 0 bis 5 der gespeicherten Einstellungen.
    pub fn from_index(index: u8) -> Option<Self> {
        match index {
            0 => Some(Self::None),
            1 => Some(Self::Rebalance),
            2 => Some(Self::RebalanceRecursive),
            3 => Some(Self::Flatten),
            4 => Some(Self::SizeBased),
            5 => Some(Self::SizeBasedFlatten),
            _ => None,
        }
    }
}

/// Einstellungen für Clustering und Nachbearbeitung.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterConfig {
    /// Maximale Anzahl Kinder pro Knoten
    pub cluster_nmax: usize,
    /// Schwelle für das Hochziehen schwach korrelierter Kinder
    pub threshold: f64,
    /// Exponent q der Blattgewichte
    pub size_power: f64,
    /// Exponent p der Anzeigegröße
    pub display_power: f64,
    pub processing: ProcessingMode,
}

impl ClusterConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cluster_nmax(mut self, nmax: usize) -> Self {
        self.cluster_nmax = nmax;
        self
    }

    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn with_size_power(mut self, power: f64) -> Self {
        self.size_power = power;
        self
    }

    pub fn with_processing(mut self, processing: ProcessingMode) -> Self {
        self.processing = processing;
        self
    }

    pub fn validate(&self) -> ClusterResult<()> {
        if self.cluster_nmax < 2 {
            return Err(ClusterError::InvalidConfiguration {
                message: format!("cluster_nmax must be at least 2, got {}", self.cluster_nmax),
            });
        }
        if !(0.0..=1.0).contains(&self.threshold) {
            return Err(ClusterError::InvalidConfiguration {
                message: format!("threshold must lie in [0, 1], got {}", self.threshold),
            });
        }
        for (name, power) in [("size_power", self.size_power), ("display_power", self.display_power)] {
            if !(power > 0.0 && power.is_finite()) {
                return Err(ClusterError::InvalidConfiguration {
                    message: format!("{name} must be positive and finite, got {power}"),
                });
            }
        }
        Ok(())
    }
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            cluster_nmax: 20,
            threshold: 0.12,
            size_power: 1.0,
            display_power: 0.7,
            processing: ProcessingMode::default(),
        }
    }
}
