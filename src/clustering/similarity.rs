// src/clustering/similarity.rs
use super::error::{ClusterError, ClusterResult};
use super::node::NodeId;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Dünn besetzte symmetrische Paargewichte w_ij; die Diagonale enthält w_ii.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PairwiseWeights {
    entries: BTreeMap<(usize, usize), f64>,
}

impl PairwiseWeights {
    pub fn new() -> Self {
        Self::default()
    }

    /// Setzt w_ab (= w_ba). Ein erneutes Setzen überschreibt.
    pub fn insert(&mut self, a: usize, b: usize, weight: f64) {
        self.entries.insert(key(a, b), weight);
    }

    pub fn get(&self, a: usize, b: usize) -> Option<f64> {
        self.entries.get(&key(a, b)).copied()
    }

    pub fn diagonal(&self, i: usize) -> Option<f64> {
        self.get(i, i)
    }

    /// Nichtdiagonale Paare mit a < b, aufsteigend.
    pub fn pairs(&self) -> impl Iterator<Item = (usize, usize, f64)> + '_ {
        self.entries
            .iter()
            .filter(|((a, b), _)| a != b)
            .map(|(&(a, b), &w)| (a, b, w))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<(usize, usize, f64)> for PairwiseWeights {
    fn from_iter<T: IntoIterator<Item = (usize, usize, f64)>>(iter: T) -> Self {
        let mut weights = Self::new();
        for (a, b, w) in iter {
            weights.insert(a, b, w);
        }
        weights
    }
}

fn key(a: usize, b: usize) -> (usize, usize) {
    (a.min(b), a.max(b))
}

/// Korrelation r = w_ab² / (w_aa · w_bb).
pub fn correlation(w_ab: f64, w_aa: f64, w_bb: f64) -> f64 {
    w_ab * w_ab / (w_aa * w_bb)
}

#[derive(Debug, Clone, Copy)]
struct QueuedEdge {
    r: f64,
    a: NodeId,
    b: NodeId,
}

impl PartialEq for QueuedEdge {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for QueuedEdge {}

impl PartialOrd for QueuedEdge {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for QueuedEdge {
    // höchstes r zuerst, bei Gleichstand kleinere Ids
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .r
            .total_cmp(&self.r)
            .then(self.a.cmp(&other.a))
            .then(self.b.cmp(&other.b))
    }
}

/// Kante zwischen zwei aktiven Knoten.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Edge {
    pub a: NodeId,
    pub b: NodeId,
    pub weight: f64,
    pub r: f64,
}

/// Geordnete Kantenmenge der Agglomeration mit Nachschlagen nach Knoten.
#[derive(Debug, Default)]
pub(crate) struct EdgeQueue {
    ordered: BTreeSet<QueuedEdge>,
    edges: HashMap<(NodeId, NodeId), Edge>,
    adjacency: HashMap<NodeId, BTreeSet<NodeId>>,
}

impl EdgeQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn push(&mut self, a: NodeId, b: NodeId, weight: f64, r: f64) -> ClusterResult<()> {
        if !r.is_finite() {
            return Err(ClusterError::InvalidPairWeight { a, b, weight });
        }
        let (a, b) = key(a, b);
        self.remove(a, b);
        self.ordered.insert(QueuedEdge { r, a, b });
        self.edges.insert((a, b), Edge { a, b, weight, r });
        self.adjacency.entry(a).or_default().insert(b);
        self.adjacency.entry(b).or_default().insert(a);
        Ok(())
    }

    pub fn pop_max(&mut self) -> Option<Edge> {
        let top = self.ordered.pop_first()?;
        self.remove(top.a, top.b)
    }

    pub fn remove(&mut self, a: NodeId, b: NodeId) -> Option<Edge> {
        let (a, b) = key(a, b);
        let edge = self.edges.remove(&(a, b))?;
        self.ordered.remove(&QueuedEdge { r: edge.r, a, b });
        for (x, y) in [(a, b), (b, a)] {
            if let Some(set) = self.adjacency.get_mut(&x) {
                set.remove(&y);
                if set.is_empty() {
                    self.adjacency.remove(&x);
                }
            }
        }
        Some(edge)
    }

    /// Nachbarn von `node`, aufsteigend.
    pub fn neighbors(&self, node: NodeId) -> Vec<NodeId> {
        self.adjacency
            .get(&node)
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_weights_are_symmetric() {
        let weights: PairwiseWeights = [(2, 1, 0.5), (1, 1, 2.0)].into_iter().collect();
        assert_eq!(weights.get(1, 2), Some(0.5));
        assert_eq!(weights.diagonal(1), Some(2.0));
        assert_eq!(weights.pairs().collect::<Vec<_>>(), vec![(1, 2, 0.5)]);
    }

    #[test]
    fn test_queue_orders_by_correlation_then_ids() {
        let mut queue = EdgeQueue::new();
        queue.push(3, 4, 1.0, 0.2).unwrap();
        queue.push(2, 0, 1.0, 0.9).unwrap();
        queue.push(1, 0, 1.0, 0.9).unwrap();
        assert_eq!(queue.neighbors(0), vec![1, 2]);

        let first = queue.pop_max().unwrap();
        assert_eq!((first.a, first.b), (0, 1));
        let second = queue.pop_max().unwrap();
        assert_eq!((second.a, second.b), (0, 2));
        assert!(queue.neighbors(0).is_empty());
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn test_replacing_an_edge_updates_order() {
        let mut queue = EdgeQueue::new();
        queue.push(0, 1, 1.0, 0.1).unwrap();
        queue.push(2, 3, 1.0, 0.5).unwrap();
        queue.push(1, 0, 3.0, 0.8).unwrap();
        assert_eq!(queue.len(), 2);
        assert_eq!(queue.pop_max().unwrap().weight, 3.0);
    }

    #[test]
    fn test_non_finite_correlation_rejected() {
        let mut queue = EdgeQueue::new();
        let r = correlation(1.0, 0.0, 1.0);
        assert!(matches!(
            queue.push(0, 1, 1.0, r),
            Err(ClusterError::InvalidPairWeight { .. })
        ));
    }
}
