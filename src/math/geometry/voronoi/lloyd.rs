// src/math/geometry/voronoi/lloyd.rs

use super::{
    config::PartitionConfig,
    input::WeightedSite,
    partitioner::{Tessellation, WeightedVoronoiPartitioner},
    scale::{ScaleMemory, TaskId},
};
use crate::math::{
    error::*,
    geometry::polygon::{Polygon, PolygonProperties},
    types::Point2D,
    utils::constants::TAU,
};
use bevy::log::{debug, warn};

/// Lloyd-Relaxation Konfiguration
#[derive(Debug, Clone)]
pub struct LloydConfig {
    /// Maximale Anzahl von Schritten
    pub max_steps: usize,
    /// Abbruch, sobald sich kein Zentrum weiter als `accuracy` bewegt
    pub accuracy: f64,
    /// Startpositionen als Spirale um den Schwerpunkt statt der übergebenen Zentren
    pub new_centers: bool,
    /// Reihenfolge auf der Spirale; ohne Angabe entscheiden die Gewichte
    pub ranking_weights: Option<Vec<f64>>,
}

impl LloydConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_steps(mut self, steps: usize) -> Self {
        self.max_steps = steps;
        self
    }

    pub fn with_accuracy(mut self, accuracy: f64) -> Self {
        self.accuracy = accuracy;
        self
    }

    pub fn with_new_centers(mut self, new_centers: bool) -> Self {
        self.new_centers = new_centers;
        self
    }

    pub fn with_ranking_weights(mut self, ranking: Vec<f64>) -> Self {
        self.ranking_weights = Some(ranking);
        self
    }

    pub fn validate(&self) -> MathResult<()> {
        if self.max_steps == 0 {
            return Err(MathError::InvalidConfiguration {
                message: "max_steps must be greater than 0".to_string(),
            });
        }
        if !(self.accuracy > 0.0 && self.accuracy.is_finite()) {
            return Err(MathError::InvalidConfiguration {
                message: format!("accuracy must be positive and finite, got {}", self.accuracy),
            });
        }
        Ok(())
    }
}

impl Default for LloydConfig {
    fn default() -> Self {
        Self {
            max_steps: 200,
            accuracy: 0.5,
            new_centers: true,
            ranking_weights: None,
        }
    }
}

/// Verlauf einer Relaxation
#[derive(Debug, Clone, PartialEq)]
pub struct LloydStatistics {
    pub steps: usize,
    /// Größte quadrierte Verschiebung im letzten Schritt
    pub max_movement_squared: f64,
    pub converged: bool,
}

/// Zellen des letzten Schritts; `center` ist jeweils der Flächenschwerpunkt der Zelle.
#[derive(Debug, Clone)]
pub struct RelaxResult {
    pub tessellation: Tessellation,
    pub statistics: LloydStatistics,
}

/// Zentroidale Relaxation über der gewichteten Partitionierung.
#[derive(Debug, Clone)]
pub struct CentroidalRelaxer {
    config: LloydConfig,
    partitioner: WeightedVoronoiPartitioner,
}

impl CentroidalRelaxer {
    pub fn new(config: LloydConfig, partition: PartitionConfig) -> MathResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            partitioner: WeightedVoronoiPartitioner::new(partition)?,
        })
    }

    pub fn config(&self) -> &LloydConfig {
        &self.config
    }

    pub fn relax(&self, sites: &[WeightedSite], bounds: &Polygon) -> MathResult<RelaxResult> {
        let mut memory = ScaleMemory::new();
        self.relax_with_memory(sites, bounds, &mut memory, &TaskId::new("relax"))
    }

    /// Relaxation mit Glättungsspeicher des Aufrufers; der erste Schritt setzt ihn zurück.
    pub fn relax_with_memory(
        &self,
        sites: &[WeightedSite],
        bounds: &Polygon,
        memory: &mut ScaleMemory,
        task: &TaskId,
    ) -> MathResult<RelaxResult> {
        if sites.is_empty() {
            return Err(MathError::InsufficientPoints {
                expected: 1,
                actual: 0,
            });
        }

        let mut current = sites.to_vec();
        if self.config.new_centers {
            let weights: Vec<f64> = sites.iter().map(|s| s.weight).collect();
            let ranking = self.config.ranking_weights.as_deref().unwrap_or(&weights);
            if ranking.len() != sites.len() {
                return Err(MathError::InvalidConfiguration {
                    message: format!(
                        "ranking weights cover {} of {} sites",
                        ranking.len(),
                        sites.len()
                    ),
                });
            }
            for (site, center) in current.iter_mut().zip(spiral_positions(bounds, ranking)?) {
                site.center = center;
            }
        }

        let accuracy_sq = self.config.accuracy * self.config.accuracy;
        let mut statistics = LloydStatistics {
            steps: 0,
            max_movement_squared: f64::INFINITY,
            converged: false,
        };
        let mut last = None;

        for step in 0..self.config.max_steps {
            let mut tessellation =
                self.partitioner
                    .tessellate_with_memory(&current, bounds, memory, task, step == 0)?;
            let centroids = tessellation.centroids();

            let mut max_movement_squared = 0.0_f64;
            for ((site, cell), centroid) in current.iter_mut().zip(&mut tessellation.cells).zip(centroids) {
                max_movement_squared = max_movement_squared.max(site.center.distance_squared(centroid));
                site.center = centroid;
                cell.center = centroid;
            }

            statistics.steps = step + 1;
            statistics.max_movement_squared = max_movement_squared;
            last = Some(tessellation);

            if max_movement_squared < accuracy_sq {
                statistics.converged = true;
                break;
            }
        }

        if statistics.converged {
            debug!("Relaxation of {} sites converged after {} steps", sites.len(), statistics.steps);
        } else {
            warn!(
                "Relaxation of {} sites stopped after {} steps (max movement {:.4})",
                sites.len(),
                statistics.steps,
                statistics.max_movement_squared.sqrt()
            );
        }

        let tessellation = last.ok_or(MathError::InvalidConfiguration {
            message: "relaxation ran zero steps".to_string(),
        })?;
        Ok(RelaxResult {
            tessellation,
            statistics,
        })
    }
}

/// Startpositionen: das höchstgewichtete Zentrum im Schwerpunkt, die übrigen auf einer Spirale.
///
/// Bis zu acht Winkel pro Umlauf; der Radius beginnt bei 0.48 × Abstand des Schwerpunkts zur
/// nächsten Kantengeraden und wächst pro Umlauf, bleibt aber innerhalb des Polygons.
pub fn spiral_positions(bounds: &Polygon, ranking: &[f64]) -> MathResult<Vec<Point2D>> {
    let center = bounds.area_centroid().ok_or(MathError::GeometricFailure {
        operation: "spiral seeding in a zero-area polygon".into(),
    })?;
    let n = ranking.len();
    let mut positions = vec![center; n];
    if n < 2 {
        return Ok(positions);
    }

    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| ranking[b].total_cmp(&ranking[a]).then(a.cmp(&b)));
    let r_poly = 0.48 * bounds.min_edge_line_distance(center);

    if n == 2 {
        let offset = Point2D::new(0.05, -0.5) * r_poly;
        positions[order[0]] = center + offset;
        positions[order[1]] = center - offset;
        return Ok(positions);
    }

    let n_angles = (n - 1).min(8);
    let per_ring = n as f64 / n_angles as f64;
    let d_theta = TAU / n_angles as f64;
    let d2_theta = d_theta / per_ring;
    let d_r = r_poly / per_ring;

    let (mut angle, mut radius) = (0.0_f64, r_poly);
    for (i, &index) in order.iter().enumerate().skip(1) {
        positions[index] = center + Point2D::new(angle.cos(), angle.sin()) * radius;
        angle += d_theta;
        if i % n_angles == 0 {
            angle += d2_theta;
            radius += d_r;
        }
    }
    Ok(positions)
}
