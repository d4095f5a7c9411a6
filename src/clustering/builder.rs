// src/clustering/builder.rs
use super::{
    config::ClusterConfig,
    error::{ClusterError, ClusterResult},
    node::{ClusterTree, NodeId},
    rebalance,
    similarity::{EdgeQueue, PairwiseWeights, correlation},
};
use bevy::log::debug;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

/// Eingabeelement: Gewicht oder Besuchszahl muss gesetzt sein.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterItem<P> {
    pub weight: Option<f64>,
    pub visit_count: Option<u64>,
    pub payload: P,
}

impl<P> ClusterItem<P> {
    pub fn new(weight: f64, visit_count: u64, payload: P) -> Self {
        Self {
            weight: Some(weight),
            visit_count: Some(visit_count),
            payload,
        }
    }

    /// Gewicht und Besuche; fehlt eines, ersetzt das andere es (Besuche mindestens 1).
    fn resolve(&self, index: usize) -> ClusterResult<(f64, u64)> {
        let (weight, visits) = match (self.weight, self.visit_count) {
            (Some(w), Some(v)) => (w, v),
            (Some(w), None) => (w, 1),
            (None, Some(v)) => (v as f64, v),
            (None, None) => return Err(ClusterError::MissingWeight { node: index }),
        };
        if !weight.is_finite() {
            return Err(ClusterError::NonFiniteWeight { node: index });
        }
        if weight <= 0.0 {
            return Err(ClusterError::NonPositiveWeight { node: index, weight });
        }
        if visits == 0 {
            return Err(ClusterError::MissingWeight { node: index });
        }
        Ok((weight, visits))
    }
}

/// Agglomeratives Clustering über einem gewichteten Ähnlichkeitsgraphen.
///
/// Blatt `i` erhält die Id `i`. Paare werden nach absteigender Korrelation zusammengeführt,
/// sofern der neue Knoten höchstens den Anteil `max(1/nmax, r)` des Gesamtgewichts trägt.
#[derive(Debug, Clone, Default)]
pub struct HierarchicalClusterBuilder {
    config: ClusterConfig,
}

impl HierarchicalClusterBuilder {
    pub fn new(config: ClusterConfig) -> ClusterResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &ClusterConfig {
        &self.config
    }

    pub fn build<P>(&self, items: Vec<ClusterItem<P>>, pairwise: &PairwiseWeights) -> ClusterResult<ClusterTree<P>> {
        if items.is_empty() {
            return Err(ClusterError::NoItems);
        }
        let n = items.len();
        let mut tree = ClusterTree::new();
        let mut self_weights = HashMap::with_capacity(n);
        let mut total = 0.0;

        for (index, item) in items.into_iter().enumerate() {
            let (weight, visits) = item.resolve(index)?;
            let weight = weight.powf(self.config.size_power);
            let diagonal = pairwise.diagonal(index).unwrap_or(weight);
            if !(diagonal > 0.0 && diagonal.is_finite()) {
                return Err(ClusterError::InvalidPairWeight {
                    a: index,
                    b: index,
                    weight: diagonal,
                });
            }
            let id = tree.add_leaf(weight, visits, diagonal, item.payload);
            self_weights.insert(id, diagonal);
            total += weight;
        }

        let mut queue = EdgeQueue::new();
        for (a, b, w_ab) in pairwise.pairs() {
            if a >= n || b >= n {
                return Err(ClusterError::UnknownNode { node: a.max(b) });
            }
            if !w_ab.is_finite() {
                return Err(ClusterError::InvalidPairWeight { a, b, weight: w_ab });
            }
            queue.push(a, b, w_ab, correlation(w_ab, self_weights[&a], self_weights[&b]))?;
        }

        debug!("Clustering {} items over {} pairs", n, queue.len());
        let mut active: BTreeSet<NodeId> = (0..n).collect();
        let admission_floor = 1.0 / self.config.cluster_nmax as f64;
        let mut skipped = 0usize;

        while let Some(edge) = queue.pop_max() {
            let share = (tree.node(edge.a)?.weight + tree.node(edge.b)?.weight) / total;
            if share > admission_floor.max(edge.r) {
                skipped += 1;
                continue;
            }

            let w_cc = self_weights[&edge.a] + self_weights[&edge.b] + 2.0 * edge.weight;
            let c = tree.add_internal(vec![edge.a, edge.b], edge.r, w_cc)?;
            self_weights.insert(c, w_cc);
            active.remove(&edge.a);
            active.remove(&edge.b);
            active.insert(c);

            let mut others: BTreeSet<NodeId> = queue.neighbors(edge.a).into_iter().collect();
            others.extend(queue.neighbors(edge.b));
            for z in others {
                let w_az = queue.remove(edge.a, z).map_or(0.0, |e| e.weight);
                let w_bz = queue.remove(edge.b, z).map_or(0.0, |e| e.weight);
                let w_cz = w_az + w_bz;
                queue.push(c, z, w_cz, correlation(w_cz, self_weights[&z], w_cc))?;
            }
        }
        debug!(
            "Clustered {} items into {} top-level nodes ({} merges skipped)",
            n,
            active.len(),
            skipped
        );

        self.merge_smallest(&mut tree, &mut active, total)?;

        let root = tree.add_internal(active.into_iter().collect(), 0.0, 0.0)?;
        tree.set_root(root)?;
        tree.order_by_weight(root)?;
        tree.propagate(root, self.config.display_power)?;
        Ok(tree)
    }

    /// Wie `build`, anschließend Nachbearbeitung gemäß `processing`.
    pub fn build_processed<P: Clone>(
        &self,
        items: Vec<ClusterItem<P>>,
        pairwise: &PairwiseWeights,
    ) -> ClusterResult<ClusterTree<P>> {
        let mut tree = self.build(items, pairwise)?;
        rebalance::process(&mut tree, self.config.processing, &self.config)?;
        Ok(tree)
    }

    /// Fasst die beiden kleinsten obersten Knoten zusammen, solange der kleinste unter
    /// `1/(2·nmax)` des Gesamtgewichts liegt und mehr als zwei übrig sind.
    fn merge_smallest<P>(&self, tree: &mut ClusterTree<P>, active: &mut BTreeSet<NodeId>, total: f64) -> ClusterResult<()> {
        let min_share = 1.0 / (2.0 * self.config.cluster_nmax as f64);
        while active.len() > 2 {
            let n1 = lightest(tree, active)?;
            if tree.node(n1)?.weight / total >= min_share {
                break;
            }
            active.remove(&n1);
            let n2 = lightest(tree, active)?;
            active.remove(&n2);

            let mut children = Vec::new();
            let mut r12 = f64::INFINITY;
            let mut self_weight = 0.0;
            for id in [n1, n2] {
                let node = tree.node(id)?;
                r12 = r12.min(node.r12);
                self_weight += node.self_weight;
                if node.is_leaf() {
                    children.push(id);
                } else {
                    children.extend(node.children.iter().copied());
                    tree.remove(id);
                }
            }
            let merged = tree.add_internal(children, r12, self_weight)?;
            active.insert(merged);
        }
        Ok(())
    }
}

fn lightest<P>(tree: &ClusterTree<P>, active: &BTreeSet<NodeId>) -> ClusterResult<NodeId> {
    let mut best: Option<(NodeId, f64)> = None;
    for &id in active {
        let weight = tree.node(id)?.weight;
        if best.is_none_or(|(_, w)| weight < w) {
            best = Some((id, weight));
        }
    }
    best.map(|(id, _)| id).ok_or(ClusterError::NoItems)
}
