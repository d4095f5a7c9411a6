// src/math/spatial/quadtree.rs

use crate::math::{
    error::{MathError, MathResult},
    types::{Bounds2D, Point2D},
    utils::constants::MIN_CELL_SIZE,
};
use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap};

/// Gespeicherter Punkt mit seiner Kennung.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuadEntry {
    pub id: usize,
    pub position: Point2D,
}

/// Treffer einer Nachbarschaftsanfrage.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpatialHit {
    pub id: usize,
    pub position: Point2D,
    pub distance_squared: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum QuadNode {
    Empty,
    Leaf(QuadEntry),
    /// Kinder in Quadrantenreihenfolge (unten links, unten rechts, oben links, oben rechts)
    Split([usize; 4]),
}

#[derive(Debug, Clone, Copy)]
struct QuadCell {
    bounds: Bounds2D,
    node: QuadNode,
}

/// Punkt-QuadTree mit höchstens einem Punkt pro Blatt, in einer Arena gespeichert.
#[derive(Debug, Clone)]
pub struct QuadTree {
    cells: Vec<QuadCell>,
    free: Vec<usize>,
    positions: HashMap<usize, Point2D>,
}

const ROOT: usize = 0;

impl QuadTree {
    pub fn new(bounds: Bounds2D) -> Self {
        Self {
            cells: vec![QuadCell {
                bounds,
                node: QuadNode::Empty,
            }],
            free: Vec::new(),
            positions: HashMap::new(),
        }
    }

    /// Baut den Baum rekursiv aus `points`; die Kennung ist der Index.
    pub fn build(points: &[Point2D], bounds: Bounds2D) -> MathResult<Self> {
        let mut tree = Self::new(bounds);
        let mut entries = Vec::with_capacity(points.len());
        for (id, &position) in points.iter().enumerate() {
            if !bounds.contains_point(position) {
                return Err(MathError::PointOutOfBounds { id });
            }
            entries.push(QuadEntry { id, position });
            tree.positions.insert(id, position);
        }
        tree.fill(ROOT, entries)?;
        Ok(tree)
    }

    fn fill(&mut self, cell: usize, entries: Vec<QuadEntry>) -> MathResult<()> {
        match entries.len() {
            0 => self.cells[cell].node = QuadNode::Empty,
            1 => self.cells[cell].node = QuadNode::Leaf(entries[0]),
            _ => {
                let bounds = self.cells[cell].bounds;
                if bounds.extent() < MIN_CELL_SIZE {
                    return Err(MathError::CoincidentPoints {
                        id: entries[1].id,
                        other: entries[0].id,
                    });
                }
                let mut parts: [Vec<QuadEntry>; 4] = Default::default();
                for entry in entries {
                    parts[bounds.quadrant_index(entry.position)].push(entry);
                }
                let children = self.split(cell);
                for (child, part) in children.into_iter().zip(parts) {
                    self.fill(child, part)?;
                }
            }
        }
        Ok(())
    }

    fn allocate(&mut self, bounds: Bounds2D) -> usize {
        let cell = QuadCell {
            bounds,
            node: QuadNode::Empty,
        };
        match self.free.pop() {
            Some(index) => {
                self.cells[index] = cell;
                index
            }
            None => {
                self.cells.push(cell);
                self.cells.len() - 1
            }
        }
    }

    fn split(&mut self, cell: usize) -> [usize; 4] {
        let bounds = self.cells[cell].bounds;
        let children = [0, 1, 2, 3].map(|q| self.allocate(bounds.quadrant(q)));
        self.cells[cell].node = QuadNode::Split(children);
        children
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn bounds(&self) -> Bounds2D {
        self.cells[ROOT].bounds
    }

    pub fn position(&self, id: usize) -> Option<Point2D> {
        self.positions.get(&id).copied()
    }

    pub fn insert(&mut self, id: usize, position: Point2D) -> MathResult<()> {
        if !self.bounds().contains_point(position) {
            return Err(MathError::PointOutOfBounds { id });
        }
        if self.positions.contains_key(&id) {
            return Err(MathError::InvalidConfiguration {
                message: format!("point id {id} already stored in quadtree"),
            });
        }

        let entry = QuadEntry { id, position };
        let mut cell = ROOT;
        loop {
            match self.cells[cell].node {
                QuadNode::Empty => {
                    self.cells[cell].node = QuadNode::Leaf(entry);
                    break;
                }
                QuadNode::Split(children) => {
                    cell = children[self.cells[cell].bounds.quadrant_index(position)];
                }
                QuadNode::Leaf(existing) => {
                    let bounds = self.cells[cell].bounds;
                    if existing.position == position || bounds.extent() < MIN_CELL_SIZE {
                        return Err(MathError::CoincidentPoints {
                            id,
                            other: existing.id,
                        });
                    }
                    let children = self.split(cell);
                    let target = children[bounds.quadrant_index(existing.position)];
                    self.cells[target].node = QuadNode::Leaf(existing);
                }
            }
        }
        self.positions.insert(id, position);
        Ok(())
    }

    /// Entfernt einen Punkt über seine Kennung und liefert seine Position.
    pub fn remove(&mut self, id: usize) -> MathResult<Point2D> {
        let position = self
            .positions
            .get(&id)
            .copied()
            .ok_or(MathError::UnknownPoint { id })?;
        self.remove_at(id, position)?;
        Ok(position)
    }

    /// Entfernt den Punkt `id` an der bekannten Position und fasst leere Zweige zusammen.
    pub fn remove_at(&mut self, id: usize, position: Point2D) -> MathResult<()> {
        let mut path = Vec::new();
        let mut cell = ROOT;
        loop {
            match self.cells[cell].node {
                QuadNode::Split(children) => {
                    path.push(cell);
                    cell = children[self.cells[cell].bounds.quadrant_index(position)];
                }
                QuadNode::Leaf(entry) if entry.id == id => break,
                _ => return Err(MathError::UnknownPoint { id }),
            }
        }
        self.cells[cell].node = QuadNode::Empty;
        self.positions.remove(&id);

        while let Some(parent) = path.pop() {
            let QuadNode::Split(children) = self.cells[parent].node else {
                break;
            };
            let mut leaf = None;
            let mut occupied = 0;
            for &child in &children {
                match self.cells[child].node {
                    QuadNode::Empty => {}
                    QuadNode::Leaf(entry) => {
                        occupied += 1;
                        leaf = Some(entry);
                    }
                    QuadNode::Split(_) => occupied += 2,
                }
            }
            if occupied > 1 {
                break;
            }
            self.cells[parent].node = leaf.map_or(QuadNode::Empty, QuadNode::Leaf);
            self.free.extend(children);
        }
        Ok(())
    }

    /// Die `k` nächsten Punkte, nach Abstand und bei Gleichstand nach Kennung sortiert.
    pub fn nearest_k(&self, point: Point2D, k: usize) -> Vec<SpatialHit> {
        let mut result = Vec::with_capacity(k);
        if k == 0 {
            return result;
        }
        let mut heap = BinaryHeap::new();
        heap.push(Candidate::cell(ROOT, self.cells[ROOT].bounds.distance_squared_to(point)));

        while let Some(candidate) = heap.pop() {
            match candidate.kind {
                CandidateKind::Point(entry) => {
                    result.push(SpatialHit {
                        id: entry.id,
                        position: entry.position,
                        distance_squared: candidate.distance_squared,
                    });
                    if result.len() == k {
                        break;
                    }
                }
                CandidateKind::Cell(cell) => match self.cells[cell].node {
                    QuadNode::Empty => {}
                    QuadNode::Leaf(entry) => {
                        heap.push(Candidate::point(entry, entry.position.distance_squared(point)));
                    }
                    QuadNode::Split(children) => {
                        for child in children {
                            let bound = self.cells[child].bounds.distance_squared_to(point);
                            heap.push(Candidate::cell(child, bound));
                        }
                    }
                },
            }
        }
        result
    }

    /// Alle Punkte mit Abstand <= `radius`, sortiert wie `nearest_k`.
    pub fn within_radius(&self, point: Point2D, radius: f64) -> Vec<SpatialHit> {
        let radius_sq = radius * radius;
        let mut hits = Vec::new();
        let mut stack = vec![ROOT];
        while let Some(cell) = stack.pop() {
            if self.cells[cell].bounds.distance_squared_to(point) > radius_sq {
                continue;
            }
            match self.cells[cell].node {
                QuadNode::Empty => {}
                QuadNode::Leaf(entry) => {
                    let distance_squared = entry.position.distance_squared(point);
                    if distance_squared <= radius_sq {
                        hits.push(SpatialHit {
                            id: entry.id,
                            position: entry.position,
                            distance_squared,
                        });
                    }
                }
                QuadNode::Split(children) => stack.extend(children),
            }
        }
        hits.sort_by(|a, b| {
            a.distance_squared
                .total_cmp(&b.distance_squared)
                .then(a.id.cmp(&b.id))
        });
        hits
    }
}

#[derive(Debug, Clone, Copy)]
enum CandidateKind {
    Cell(usize),
    Point(QuadEntry),
}

/// Heap-Eintrag; Zellen vor Punkten bei gleichem Abstand, damit Gleichstände nach Kennung fallen.
#[derive(Debug, Clone, Copy)]
struct Candidate {
    distance_squared: f64,
    rank: u8,
    key: usize,
    kind: CandidateKind,
}

impl Candidate {
    fn cell(cell: usize, distance_squared: f64) -> Self {
        Self {
            distance_squared,
            rank: 0,
            key: cell,
            kind: CandidateKind::Cell(cell),
        }
    }

    fn point(entry: QuadEntry, distance_squared: f64) -> Self {
        Self {
            distance_squared,
            rank: 1,
            key: entry.id,
            kind: CandidateKind::Point(entry),
        }
    }
}

impl PartialEq for Candidate {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Candidate {}

impl PartialOrd for Candidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Candidate {
    // umgekehrt: BinaryHeap liefert den kleinsten Abstand zuerst
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .distance_squared
            .total_cmp(&self.distance_squared)
            .then(other.rank.cmp(&self.rank))
            .then(other.key.cmp(&self.key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{Rng, SeedableRng, rngs::StdRng};

    fn unit_bounds(size: f64) -> Bounds2D {
        Bounds2D::new(Point2D::ZERO, Point2D::splat(size)).unwrap()
    }

    fn brute_force(points: &[Point2D], query: Point2D, k: usize) -> Vec<usize> {
        let mut ids: Vec<usize> = (0..points.len()).collect();
        ids.sort_by(|&a, &b| {
            points[a]
                .distance_squared(query)
                .total_cmp(&points[b].distance_squared(query))
                .then(a.cmp(&b))
        });
        ids.truncate(k);
        ids
    }

    #[test]
    fn test_nearest_k_matches_brute_force() {
        let mut rng = StdRng::seed_from_u64(42);
        let points: Vec<Point2D> = (0..10_000)
            .map(|_| Point2D::new(rng.random_range(0.0..1000.0), rng.random_range(0.0..1000.0)))
            .collect();
        let tree = QuadTree::build(&points, unit_bounds(1000.0)).unwrap();
        assert_eq!(tree.len(), 10_000);

        for _ in 0..50 {
            let query = Point2D::new(rng.random_range(-50.0..1050.0), rng.random_range(-50.0..1050.0));
            let found: Vec<usize> = tree.nearest_k(query, 5).iter().map(|hit| hit.id).collect();
            assert_eq!(found, brute_force(&points, query, 5));
        }
    }

    #[test]
    fn test_ties_sorted_by_id() {
        let points = vec![
            Point2D::new(1.0, 0.0),
            Point2D::new(0.0, 1.0),
            Point2D::new(-1.0, 0.0),
            Point2D::new(0.0, -1.0),
        ];
        let bounds = Bounds2D::new(Point2D::splat(-2.0), Point2D::splat(2.0)).unwrap();
        let tree = QuadTree::build(&points, bounds).unwrap();
        let ids: Vec<usize> = tree.nearest_k(Point2D::ZERO, 3).iter().map(|h| h.id).collect();
        assert_eq!(ids, vec![0, 1, 2]);
    }

    #[test]
    fn test_within_radius() {
        let points = vec![
            Point2D::new(1.0, 1.0),
            Point2D::new(2.0, 1.0),
            Point2D::new(8.0, 8.0),
            Point2D::new(1.5, 3.0),
        ];
        let tree = QuadTree::build(&points, unit_bounds(10.0)).unwrap();
        let hits: Vec<usize> = tree
            .within_radius(Point2D::new(1.0, 1.0), 2.1)
            .iter()
            .map(|h| h.id)
            .collect();
        assert_eq!(hits, vec![0, 1, 3]);
    }

    #[test]
    fn test_within_radius_matches_brute_force() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut points: Vec<Option<Point2D>> = (0..2_000)
            .map(|_| Some(Point2D::new(rng.random_range(0.0..500.0), rng.random_range(0.0..500.0))))
            .collect();
        let positions: Vec<Point2D> = points.iter().flatten().copied().collect();
        let mut tree = QuadTree::build(&positions, unit_bounds(500.0)).unwrap();

        let expected = |points: &[Option<Point2D>], query: Point2D, radius: f64| {
            let mut ids: Vec<usize> = (0..points.len())
                .filter(|&id| points[id].is_some_and(|p| p.distance_squared(query) <= radius * radius))
                .collect();
            ids.sort_by(|&a, &b| {
                let da = points[a].unwrap().distance_squared(query);
                let db = points[b].unwrap().distance_squared(query);
                da.total_cmp(&db).then(a.cmp(&b))
            });
            ids
        };

        for round in 0..2 {
            for _ in 0..40 {
                // auch Anfragen außerhalb der Grenzen
                let query = Point2D::new(rng.random_range(-60.0..560.0), rng.random_range(-60.0..560.0));
                let radius = rng.random_range(0.0..80.0);
                let found: Vec<usize> = tree.within_radius(query, radius).iter().map(|hit| hit.id).collect();
                assert_eq!(found, expected(&points, query, radius), "round {round}");
            }
            if round == 0 {
                for id in (0..points.len()).step_by(3) {
                    tree.remove(id).unwrap();
                    points[id] = None;
                }
                assert_eq!(tree.len(), points.iter().flatten().count());
            }
        }
    }

    #[test]
    fn test_insert_and_remove_keep_queries_consistent() {
        let mut tree = QuadTree::new(unit_bounds(10.0));
        tree.insert(0, Point2D::new(1.0, 1.0)).unwrap();
        tree.insert(1, Point2D::new(1.1, 1.1)).unwrap();
        tree.insert(2, Point2D::new(9.0, 9.0)).unwrap();
        assert_eq!(tree.len(), 3);

        assert_eq!(tree.remove(1).unwrap(), Point2D::new(1.1, 1.1));
        let nearest = tree.nearest_k(Point2D::new(1.1, 1.1), 1);
        assert_eq!(nearest[0].id, 0);

        tree.remove_at(0, Point2D::new(1.0, 1.0)).unwrap();
        assert_eq!(tree.len(), 1);
        assert_eq!(tree.nearest_k(Point2D::ZERO, 4).len(), 1);
        assert!(matches!(tree.remove(0), Err(MathError::UnknownPoint { id: 0 })));

        // freigegebene Zellen werden wiederverwendet
        let cells_before = tree.cells.len();
        tree.insert(3, Point2D::new(9.5, 9.5)).unwrap();
        assert_eq!(tree.cells.len(), cells_before);
    }

    #[test]
    fn test_coincident_and_outside_points_rejected() {
        let points = vec![Point2D::new(3.0, 3.0), Point2D::new(3.0, 3.0)];
        assert!(matches!(
            QuadTree::build(&points, unit_bounds(10.0)),
            Err(MathError::CoincidentPoints { .. })
        ));

        let mut tree = QuadTree::new(unit_bounds(10.0));
        tree.insert(0, Point2D::new(3.0, 3.0)).unwrap();
        assert!(matches!(
            tree.insert(1, Point2D::new(3.0, 3.0)),
            Err(MathError::CoincidentPoints { id: 1, other: 0 })
        ));
        assert!(matches!(
            tree.insert(2, Point2D::new(11.0, 3.0)),
            Err(MathError::PointOutOfBounds { id: 2 })
        ));
    }
}
