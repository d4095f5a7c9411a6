// src/math/geometry/voronoi/partitioner.rs

use super::{
    boundary::BoundaryRing,
    config::PartitionConfig,
    input::{WeightedSite, check_input},
    line::SplitLine,
    scale::{ScaleMemory, TaskId, weight_scale},
    site::{CellRing, Neighbor, Site},
};
use crate::math::{
    error::{MathError, MathResult},
    geometry::polygon::{Polygon, PolygonProperties},
    types::Point2D,
};
use bevy::log::{debug, warn};
use std::collections::VecDeque;

/// Zelle eines Zentrums im fertigen Leistungsdiagramm.
#[derive(Debug, Clone, PartialEq)]
pub struct PowerCell {
    /// Index des Zentrums in der Eingabe
    pub index: usize,
    pub center: Point2D,
    /// Ursprüngliches, nicht normiertes Gewicht
    pub weight: f64,
    /// Konvex, gegen den Uhrzeigersinn
    pub polygon: Polygon,
    /// Nachbar jenseits der Kante i → i+1 (Eingabeindizes)
    pub neighbors: Vec<Neighbor>,
}

/// Ergebnis einer Partitionierung: eine Zelle je Eingabezentrum, in Eingabereihenfolge.
#[derive(Debug, Clone, PartialEq)]
pub struct Tessellation {
    pub cells: Vec<PowerCell>,
    /// Tatsächlich verwendeter (ggf. geglätteter) Gewichtsfaktor
    pub weight_scale: f64,
}

impl Tessellation {
    pub fn total_area(&self) -> f64 {
        self.cells.iter().map(|cell| cell.polygon.area()).sum()
    }

    /// Flächenschwerpunkte der Zellen; fällt bei entarteten Zellen auf das Zentrum zurück.
    pub fn centroids(&self) -> Vec<Point2D> {
        self.cells
            .iter()
            .map(|cell| cell.polygon.area_centroid().unwrap_or(cell.center))
            .collect()
    }
}

/// Gewichtete Voronoi-Zerlegung (Leistungsdiagramm) eines konvexen Gebiets.
///
/// Zentren werden nach absteigendem Gewicht eingefügt. Jedes neue Zentrum schneidet die Zelle
/// seines Besitzers und alle über geschnittene Kanten erreichbaren Zellen zurecht; seine
/// eigene Zelle ist der Schnitt des Gebiets mit den zugehörigen Halbebenen.
#[derive(Debug, Clone, Default)]
pub struct WeightedVoronoiPartitioner {
    config: PartitionConfig,
}

impl WeightedVoronoiPartitioner {
    pub fn new(config: PartitionConfig) -> MathResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &PartitionConfig {
        &self.config
    }

    pub fn tessellate(&self, sites: &[WeightedSite], bounds: &Polygon) -> MathResult<Tessellation> {
        self.run(sites, bounds, None).map(|(tessellation, _)| tessellation)
    }

    /// Wie `tessellate`, glättet den Gewichtsfaktor aber über Aufrufe mit derselben Aufgabe.
    pub fn tessellate_with_memory(
        &self,
        sites: &[WeightedSite],
        bounds: &Polygon,
        memory: &mut ScaleMemory,
        task: &TaskId,
        reset: bool,
    ) -> MathResult<Tessellation> {
        self.run(sites, bounds, Some((memory, task, reset)))
            .map(|(tessellation, _)| tessellation)
    }

    fn run(
        &self,
        sites: &[WeightedSite],
        bounds: &Polygon,
        smoothing: Option<(&mut ScaleMemory, &TaskId, bool)>,
    ) -> MathResult<(Tessellation, BoundaryRing)> {
        if sites.is_empty() {
            return Err(MathError::InsufficientPoints {
                expected: 1,
                actual: 0,
            });
        }
        if self.config.check_input {
            let issues = check_input(sites, bounds);
            if !issues.is_empty() {
                return Err(MathError::InvalidInput { issues });
            }
        }

        let raw_scale = weight_scale(sites, &self.config)?;
        let scale = match smoothing {
            Some((memory, task, reset)) => {
                let smoothed = memory.smooth(task, sites.len(), raw_scale, reset, &self.config);
                debug!("Task {}: weight scale {:e} (raw {:e})", task, smoothed, raw_scale);
                smoothed
            }
            None => raw_scale,
        };

        let tolerance = self.config.tolerance * bounds.bounds().diagonal();
        let ring = BoundaryRing::new(bounds, self.config.tolerance);

        if sites.len() == 1 {
            let region = CellRing::from_region(bounds);
            let cell = PowerCell {
                index: 0,
                center: sites[0].center,
                weight: sites[0].weight,
                polygon: bounds.clone(),
                neighbors: region.labels,
            };
            return Ok((
                Tessellation {
                    cells: vec![cell],
                    weight_scale: scale,
                },
                ring,
            ));
        }

        let mut order: Vec<usize> = (0..sites.len()).collect();
        order.sort_by(|&a, &b| sites[b].weight.total_cmp(&sites[a].weight).then(a.cmp(&b)));

        let mut partition = Partition {
            sites: order
                .iter()
                .map(|&index| Site {
                    input_index: index,
                    center: sites[index].center,
                    weight: sites[index].weight * scale,
                    cell: None,
                    pending: Vec::new(),
                })
                .collect(),
            owner_of: vec![0; sites.len()],
            region: bounds,
            ring,
            tolerance,
            max_iterations: self.config.max_clip_iterations,
        };

        partition.seed()?;
        for rank in 2..sites.len() {
            partition.insert(rank)?;
        }
        if let Err(error) = partition.ring.check_consistency() {
            warn!("Partition of {} sites: {}", sites.len(), error);
        }

        let Partition { sites: ranked, ring, .. } = partition;
        let mut cells: Vec<Option<PowerCell>> = vec![None; sites.len()];
        for site in &ranked {
            let cell = site.cell.as_ref().ok_or(MathError::CellCollapsed {
                site: site.input_index,
            })?;
            cells[site.input_index] = Some(PowerCell {
                index: site.input_index,
                center: site.center,
                weight: sites[site.input_index].weight,
                polygon: cell.to_polygon(),
                neighbors: cell
                    .labels
                    .iter()
                    .map(|label| match label {
                        Neighbor::Site(rank) => Neighbor::Site(ranked[*rank].input_index),
                        Neighbor::Boundary => Neighbor::Boundary,
                    })
                    .collect(),
            });
        }

        Ok((
            Tessellation {
                cells: cells.into_iter().flatten().collect(),
                weight_scale: scale,
            },
            ring,
        ))
    }
}

/// Zustand einer laufenden Partitionierung; alle Indizes sind Ränge.
struct Partition<'a> {
    sites: Vec<Site>,
    owner_of: Vec<usize>,
    region: &'a Polygon,
    ring: BoundaryRing,
    tolerance: f64,
    max_iterations: usize,
}

impl Partition<'_> {
    /// Trenngerade zwischen der bestehenden Zelle `cell` (negativ) und dem neuen Zentrum `site`.
    fn line(&self, cell: usize, site: usize) -> MathResult<SplitLine> {
        let (a, b) = (&self.sites[cell], &self.sites[site]);
        SplitLine::between(a.center, a.weight, b.center, b.weight).ok_or(MathError::CoincidentPoints {
            id: b.input_index,
            other: a.input_index,
        })
    }

    fn collapsed(&self, rank: usize) -> MathError {
        MathError::CellCollapsed {
            site: self.sites[rank].input_index,
        }
    }

    /// Die zwei schwersten Zentren teilen das Gebiet, alle übrigen warten in einer der Hälften.
    fn seed(&mut self) -> MathResult<()> {
        let line = self.line(0, 1)?;
        let full = CellRing::from_region(self.region);
        let first = full
            .clip(&line, Neighbor::Site(1), self.tolerance)
            .ok_or_else(|| self.collapsed(0))?;
        let second = full
            .clip(&line.flipped(), Neighbor::Site(0), self.tolerance)
            .ok_or_else(|| self.collapsed(1))?;

        for rank in 2..self.sites.len() {
            let owner = if line.eval(self.sites[rank].center) < 0.0 { 0 } else { 1 };
            self.sites[owner].pending.push(rank);
            self.owner_of[rank] = owner;
        }

        self.ring.absorb_cell(0, &first);
        self.ring.absorb_cell(1, &second);
        self.sites[0].cell = Some(first);
        self.sites[1].cell = Some(second);
        debug!(
            "Seed split between sites {} and {}, {} pending",
            self.sites[0].input_index,
            self.sites[1].input_index,
            self.sites.len() - 2
        );
        Ok(())
    }

    fn insert(&mut self, site: usize) -> MathResult<()> {
        let owner = self.owner_of[site];
        if self.sites[owner].pending.first() != Some(&site) {
            return Err(MathError::PendingOrderViolation {
                site: self.sites[site].input_index,
                owner: self.sites[owner].input_index,
            });
        }
        self.sites[owner].pending.remove(0);

        let mut visited = vec![false; self.sites.len()];
        visited[site] = true;
        visited[owner] = true;
        let mut queue = VecDeque::from([owner]);
        let mut cut: Vec<(usize, SplitLine)> = Vec::new();
        let mut adopted: Vec<usize> = Vec::new();
        let mut iterations = 0;

        while let Some(current) = queue.pop_front() {
            iterations += 1;
            if iterations > self.max_iterations {
                return Err(MathError::ClipLoopExceeded {
                    site: self.sites[site].input_index,
                    limit: self.max_iterations,
                });
            }

            let line = self.line(current, site)?;
            let Some(cell) = self.sites[current].cell.as_ref() else {
                continue;
            };
            if !cell.reaches_positive_side(&line, self.tolerance) {
                if current == owner {
                    return Err(MathError::SplitLineMissesPolygon {
                        site: self.sites[site].input_index,
                        owner: self.sites[owner].input_index,
                    });
                }
                continue;
            }

            let discovered = self.crossed_neighbors(current, cell, &line);
            let clipped = cell
                .clip(&line, Neighbor::Site(site), self.tolerance)
                .ok_or_else(|| self.collapsed(current))?;
            self.sites[current].cell = Some(clipped);

            for next in discovered {
                if !visited[next] {
                    visited[next] = true;
                    queue.push_back(next);
                }
            }

            let pending = std::mem::take(&mut self.sites[current].pending);
            let (stay, moving): (Vec<usize>, Vec<usize>) = pending
                .into_iter()
                .partition(|&p| line.eval(self.sites[p].center) <= 0.0);
            self.sites[current].pending = stay;
            for &p in &moving {
                self.owner_of[p] = site;
            }
            adopted.extend(moving);
            cut.push((current, line));
        }

        let mut own = CellRing::from_region(self.region);
        for (neighbor, line) in &cut {
            own = own
                .clip(&line.flipped(), Neighbor::Site(*neighbor), self.tolerance)
                .ok_or_else(|| self.collapsed(site))?;
        }

        for (neighbor, _) in &cut {
            if let Some(cell) = self.sites[*neighbor].cell.as_ref() {
                self.ring.absorb_cell(*neighbor, cell);
            }
        }
        self.ring.claim_cell(site, &own);

        adopted.sort_unstable();
        self.sites[site].pending = adopted;
        self.sites[site].cell = Some(own);
        Ok(())
    }

    /// Nachbarn jenseits von Kanten mit einem Endpunkt auf der Seite des neuen Zentrums.
    ///
    /// Randkanten werden über den Randring zur nächsten bzw. vorigen Zelle verfolgt.
    fn crossed_neighbors(&self, current: usize, cell: &CellRing, line: &SplitLine) -> Vec<usize> {
        let mut found = Vec::new();
        for (start, end, label) in cell.edges() {
            let start_out = line.signed_distance(start) > self.tolerance;
            let end_out = line.signed_distance(end) > self.tolerance;
            if !(start_out || end_out) {
                continue;
            }
            match label {
                Neighbor::Site(other) => found.push(other),
                Neighbor::Boundary => {
                    if end_out {
                        match self.ring.find(end) {
                            Some(point) if point.after != current => found.push(point.after),
                            Some(_) => {}
                            None => debug!("Boundary point {:?} missing from ring", end),
                        }
                    }
                    if start_out {
                        match self.ring.find(start) {
                            Some(point) if point.before != current => found.push(point.before),
                            Some(_) => {}
                            None => debug!("Boundary point {:?} missing from ring", start),
                        }
                    }
                }
            }
        }
        found
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::geometry::voronoi::input::InputIssue;
    use approx::assert_relative_eq;
    use geo::{Area, BooleanOps};
    use rand::{Rng, SeedableRng, rngs::StdRng};

    fn square(size: f64) -> Polygon {
        Polygon::rectangle(Point2D::ZERO, Point2D::splat(size)).unwrap()
    }

    fn random_sites(count: usize, size: f64, seed: u64) -> Vec<WeightedSite> {
        let mut rng = StdRng::seed_from_u64(seed);
        (0..count)
            .map(|_| {
                WeightedSite::new(
                    Point2D::new(rng.random_range(0.02 * size..0.98 * size), rng.random_range(0.02 * size..0.98 * size)),
                    rng.random_range(1.0..50.0),
                )
            })
            .collect()
    }

    fn assert_valid_partition(tessellation: &Tessellation, bounds: &Polygon) {
        assert_relative_eq!(tessellation.total_area(), bounds.area(), max_relative = 1e-9);
        for cell in &tessellation.cells {
            assert!(cell.polygon.is_convex(), "cell {} not convex", cell.index);
            assert!(cell.polygon.signed_area() > 0.0, "cell {} not ccw", cell.index);
            assert!(cell.polygon.contains_point(cell.center), "center {} outside", cell.index);
            assert_eq!(cell.neighbors.len(), cell.polygon.len());
        }
        for (i, a) in tessellation.cells.iter().enumerate() {
            let ga: geo::Polygon<f64> = (&a.polygon).into();
            for b in tessellation.cells.iter().skip(i + 1) {
                let gb: geo::Polygon<f64> = (&b.polygon).into();
                let overlap = ga.intersection(&gb).unsigned_area();
                assert!(overlap < 1e-6 * bounds.area(), "cells {} and {} overlap by {}", a.index, b.index, overlap);
            }
        }
    }

    #[test]
    fn test_three_equal_sites_in_square() {
        let bounds = square(10.0);
        let sites = vec![
            WeightedSite::new(Point2D::new(2.0, 2.0), 1.0),
            WeightedSite::new(Point2D::new(8.0, 2.0), 1.0),
            WeightedSite::new(Point2D::new(5.0, 8.0), 1.0),
        ];
        let partitioner = WeightedVoronoiPartitioner::default();
        let result = partitioner.tessellate(&sites, &bounds).unwrap();
        assert_eq!(result.cells.len(), 3);
        assert_valid_partition(&result, &bounds);

        // Symmetrie: die beiden unteren Zellen sind gleich groß
        assert_relative_eq!(result.cells[0].polygon.area(), result.cells[1].polygon.area(), epsilon = 1e-9);
        // Mittelsenkrechte von (2,2) und (8,2) ist x = 5
        let shared = result.cells[0]
            .polygon
            .edges()
            .zip(&result.cells[0].neighbors)
            .find(|(_, n)| **n == Neighbor::Site(1))
            .map(|((a, b), _)| (a, b))
            .unwrap();
        assert_relative_eq!(shared.0.x, 5.0, epsilon = 1e-9);
        assert_relative_eq!(shared.1.x, 5.0, epsilon = 1e-9);
    }

    #[test]
    fn test_equilateral_sites_split_evenly() {
        let bounds = square(10.0);
        let center = Point2D::new(5.0, 5.0);
        let sites: Vec<_> = (0..3)
            .map(|i| {
                let angle = std::f64::consts::FRAC_PI_2 + std::f64::consts::TAU * i as f64 / 3.0;
                WeightedSite::new(center + Point2D::new(angle.cos(), angle.sin()) * 2.0, 1.0)
            })
            .collect();
        let result = WeightedVoronoiPartitioner::default().tessellate(&sites, &bounds).unwrap();
        assert_valid_partition(&result, &bounds);
        let areas: Vec<f64> = result.cells.iter().map(|c| c.polygon.area()).collect();
        // Nicht exakt ein Drittel, da das Quadrat nicht dreizählig symmetrisch ist
        assert_relative_eq!(areas[1], areas[2], epsilon = 1e-9);
        assert!(areas.iter().all(|a| (a - 100.0 / 3.0).abs() < 5.0));
    }

    #[test]
    fn test_heavier_site_gets_more_area() {
        let bounds = square(10.0);
        let sites = vec![
            WeightedSite::new(Point2D::new(3.0, 5.0), 1.0),
            WeightedSite::new(Point2D::new(7.0, 5.0), 4.0),
        ];
        let result = WeightedVoronoiPartitioner::default().tessellate(&sites, &bounds).unwrap();
        assert_valid_partition(&result, &bounds);
        assert!(result.cells[1].polygon.area() > result.cells[0].polygon.area());
        assert_eq!(result.cells[0].weight, 1.0);
    }

    #[test]
    fn test_single_site_gets_whole_region() {
        let bounds = square(4.0);
        let sites = vec![WeightedSite::new(Point2D::new(1.0, 1.0), 3.0)];
        let result = WeightedVoronoiPartitioner::default().tessellate(&sites, &bounds).unwrap();
        assert_eq!(result.cells.len(), 1);
        assert_eq!(result.cells[0].polygon, bounds);
        assert!(result.cells[0].neighbors.iter().all(|n| *n == Neighbor::Boundary));
    }

    #[test]
    fn test_empty_input_rejected() {
        let result = WeightedVoronoiPartitioner::default().tessellate(&[], &square(1.0));
        assert!(matches!(result, Err(MathError::InsufficientPoints { expected: 1, actual: 0 })));
    }

    #[test]
    fn test_invalid_input_lists_every_issue() {
        let sites = vec![
            WeightedSite::new(Point2D::new(1.0, 1.0), -1.0),
            WeightedSite::new(Point2D::new(20.0, 1.0), 1.0),
        ];
        match WeightedVoronoiPartitioner::default().tessellate(&sites, &square(10.0)) {
            Err(MathError::InvalidInput { issues }) => {
                assert_eq!(
                    issues,
                    vec![
                        InputIssue::NonPositiveWeight { site: 0, weight: -1.0 },
                        InputIssue::CenterOutside { site: 1 },
                    ]
                );
            }
            other => panic!("unexpected result {other:?}"),
        }
    }

    #[test]
    fn test_random_partitions_are_valid() {
        let bounds = Polygon::regular(Point2D::new(50.0, 50.0), 60.0, 9).unwrap();
        let partitioner = WeightedVoronoiPartitioner::default();
        for seed in 0..4 {
            let sites: Vec<_> = random_sites(40, 100.0, seed)
                .into_iter()
                .filter(|s| bounds.contains_point(s.center))
                .collect();
            let (result, ring) = partitioner.run(&sites, &bounds, None).unwrap();
            assert_eq!(result.cells.len(), sites.len());
            assert_valid_partition(&result, &bounds);
            assert!(ring.check_consistency().is_ok());
        }
    }

    #[test]
    fn test_neighbor_labels_are_symmetric() {
        let bounds = square(100.0);
        let sites = random_sites(30, 100.0, 9);
        let result = WeightedVoronoiPartitioner::default().tessellate(&sites, &bounds).unwrap();
        for cell in &result.cells {
            for neighbor in &cell.neighbors {
                if let Neighbor::Site(other) = neighbor {
                    assert!(
                        result.cells[*other].neighbors.contains(&Neighbor::Site(cell.index)),
                        "{} lists {} but not vice versa",
                        cell.index,
                        other
                    );
                }
            }
        }
    }

    #[test]
    fn test_large_input_uses_spatial_index() {
        let bounds = square(1000.0);
        let sites = random_sites(300, 1000.0, 3);
        let result = WeightedVoronoiPartitioner::default().tessellate(&sites, &bounds).unwrap();
        assert_eq!(result.cells.len(), 300);
        assert_relative_eq!(result.total_area(), bounds.area(), max_relative = 1e-9);
    }

    #[test]
    fn test_clip_iteration_cap() {
        let bounds = square(100.0);
        let sites = random_sites(30, 100.0, 5);
        let partitioner =
            WeightedVoronoiPartitioner::new(PartitionConfig::default().with_max_clip_iterations(1)).unwrap();
        assert!(matches!(
            partitioner.tessellate(&sites, &bounds),
            Err(MathError::ClipLoopExceeded { limit: 1, .. })
        ));
    }

    #[test]
    fn test_memory_smooths_scale_between_calls() {
        let bounds = square(10.0);
        let task = TaskId::new("test");
        let mut memory = ScaleMemory::new();
        let partitioner = WeightedVoronoiPartitioner::default();
        let near = vec![
            WeightedSite::new(Point2D::new(4.0, 5.0), 1.0),
            WeightedSite::new(Point2D::new(6.0, 5.0), 1.0),
        ];
        let far = vec![
            WeightedSite::new(Point2D::new(1.0, 5.0), 1.0),
            WeightedSite::new(Point2D::new(9.0, 5.0), 1.0),
        ];
        let first = partitioner
            .tessellate_with_memory(&near, &bounds, &mut memory, &task, true)
            .unwrap();
        assert_relative_eq!(first.weight_scale, 0.95 * 4.0);
        let second = partitioner
            .tessellate_with_memory(&far, &bounds, &mut memory, &task, false)
            .unwrap();
        // 0.3·(0.95·64) + 0.7·3.8
        assert_relative_eq!(second.weight_scale, 0.3 * 60.8 + 0.7 * 3.8, epsilon = 1e-9);
        assert_eq!(memory.get(&task), Some(second.weight_scale));
    }
}
