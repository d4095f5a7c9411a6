// src/math/geometry/voronoi/scale.rs

use super::{config::PartitionConfig, input::WeightedSite};
use crate::math::{
    error::{MathError, MathResult},
    spatial::QuadTree,
    types::Bounds2D,
};
use bevy::log::debug;
use std::collections::HashMap;
use std::fmt;

/// Kennung einer wiederkehrenden Partitionierungsaufgabe (z.B. ein Knoten des Layouts).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TaskId(pub String);

impl TaskId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct ScaleState {
    scale: f64,
    site_count: usize,
}

/// Geglättete Skalierungsfaktoren je Aufgabe, gehört dem Aufrufer.
#[derive(Debug, Clone, Default)]
pub struct ScaleMemory {
    states: HashMap<TaskId, ScaleState>,
}

impl ScaleMemory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, task: &TaskId) -> Option<f64> {
        self.states.get(task).map(|state| state.scale)
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// Mischt `raw` mit dem letzten Faktor dieser Aufgabe.
    ///
    /// Bei `reset`, unbekannter Aufgabe oder geänderter Zentrenanzahl gilt `raw` unverändert.
    pub fn smooth(
        &mut self,
        task: &TaskId,
        site_count: usize,
        raw: f64,
        reset: bool,
        config: &PartitionConfig,
    ) -> f64 {
        let previous = self
            .states
            .get(task)
            .filter(|state| !reset && state.site_count == site_count);
        let scale = match previous {
            Some(state) => {
                let ceiling = raw / config.max_size_fraction * config.super_max_size_fraction;
                ((1.0 - config.weight_delay) * raw + config.weight_delay * state.scale).min(ceiling)
            }
            None => raw,
        };
        self.states
            .insert(task.clone(), ScaleState { scale, site_count });
        scale
    }
}

/// Größter Faktor s, für den alle Paare `s·max(w_i, w_j) <= k·d²` erfüllen.
///
/// Ab `spatial_index_threshold` Zentren genügt pro Zentrum der nächste Nachbar; das Minimum
/// über `k·d²(c_i, nn(c_i))/w_i` stimmt mit dem paarweisen Minimum überein.
pub fn weight_scale(sites: &[WeightedSite], config: &PartitionConfig) -> MathResult<f64> {
    let mut scale = 1e100_f64;
    let fraction = config.max_size_fraction;

    if sites.len() < config.spatial_index_threshold {
        for (i, a) in sites.iter().enumerate() {
            for (j, b) in sites.iter().enumerate().skip(i + 1) {
                let dist_sq = a.center.distance_squared(b.center);
                if !(dist_sq > 0.0) {
                    return Err(MathError::CoincidentPoints { id: j, other: i });
                }
                scale = scale.min(fraction * dist_sq / a.weight.max(b.weight));
            }
        }
    } else {
        let centers: Vec<_> = sites.iter().map(|s| s.center).collect();
        let bounds = Bounds2D::from_points_iter(centers.iter().copied()).ok_or(
            MathError::InsufficientPoints {
                expected: 1,
                actual: 0,
            },
        )?;
        let tree = QuadTree::build(&centers, bounds)?;
        for (i, site) in sites.iter().enumerate() {
            let nearest = tree.nearest_k(site.center, 2);
            if let Some(other) = nearest.iter().find(|n| n.id != i) {
                scale = scale.min(fraction * other.distance_squared / site.weight);
            }
        }
        debug!("Weight scale via quadtree for {} sites: {:e}", sites.len(), scale);
    }

    Ok(scale)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::types::Point2D;
    use approx::assert_relative_eq;
    use rand::{Rng, SeedableRng, rngs::StdRng};

    #[test]
    fn test_pairwise_scale() {
        let sites = vec![
            WeightedSite::new(Point2D::new(0.0, 0.0), 2.0),
            WeightedSite::new(Point2D::new(4.0, 0.0), 1.0),
            WeightedSite::new(Point2D::new(0.0, 10.0), 8.0),
        ];
        let scale = weight_scale(&sites, &PartitionConfig::default()).unwrap();
        // Paar (0,1): 0.95·16/2 = 7.6; (0,2): 0.95·100/8 = 11.875; (1,2): 0.95·116/8
        assert_relative_eq!(scale, 7.6, epsilon = 1e-12);
    }

    #[test]
    fn test_quadtree_scale_matches_exhaustive() {
        let mut rng = StdRng::seed_from_u64(17);
        let sites: Vec<_> = (0..300)
            .map(|_| {
                WeightedSite::new(
                    Point2D::new(rng.random_range(0.0..100.0), rng.random_range(0.0..100.0)),
                    rng.random_range(0.5..20.0),
                )
            })
            .collect();
        let exhaustive = weight_scale(
            &sites,
            &PartitionConfig::default().with_spatial_index_threshold(usize::MAX),
        )
        .unwrap();
        let indexed = weight_scale(&sites, &PartitionConfig::default()).unwrap();
        assert_relative_eq!(exhaustive, indexed, max_relative = 1e-12);
    }

    #[test]
    fn test_coincident_centers_rejected() {
        let sites = vec![
            WeightedSite::new(Point2D::ONE, 1.0),
            WeightedSite::new(Point2D::ONE, 2.0),
        ];
        assert!(matches!(
            weight_scale(&sites, &PartitionConfig::default()),
            Err(MathError::CoincidentPoints { .. })
        ));
    }

    #[test]
    fn test_smoothing_memory() {
        let config = PartitionConfig::default();
        let task = TaskId::new("layout:0");
        let mut memory = ScaleMemory::new();

        assert_eq!(memory.smooth(&task, 5, 10.0, false, &config), 10.0);
        // 0.3·20 + 0.7·10 = 13, Obergrenze 20/0.95·0.98 ≈ 20.63
        assert_relative_eq!(memory.smooth(&task, 5, 20.0, false, &config), 13.0, epsilon = 1e-12);
        // Obergrenze greift: 0.3·1 + 0.7·13 = 9.4 > 1/0.95·0.98
        assert_relative_eq!(
            memory.smooth(&task, 5, 1.0, false, &config),
            0.98 / 0.95,
            epsilon = 1e-12
        );
        // andere Zentrenanzahl setzt zurück
        assert_eq!(memory.smooth(&task, 6, 4.0, false, &config), 4.0);
        assert_eq!(memory.smooth(&task, 6, 3.0, true, &config), 3.0);
        assert_eq!(memory.len(), 1);
    }
}
