// src/clustering/node.rs
use super::error::{ClusterError, ClusterResult};
use bevy::log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Stabiler Index eines Knotens im Baum-Arena.
pub type NodeId = usize;

/// Seitendaten eines Blatts; für Geometrie und Clustering undurchsichtig.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PagePayload {
    pub title: String,
    pub url: String,
    pub icon_url: Option<String>,
}

impl PagePayload {
    pub fn new(title: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
            icon_url: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterNode<P = PagePayload> {
    pub id: NodeId,
    /// Bei inneren Knoten die Summe der Kindgewichte
    pub weight: f64,
    pub visit_count: u64,
    pub children: Vec<NodeId>,
    /// Korrelation r der Zusammenführung, 0 bei Blättern und synthetischen Knoten
    pub r12: f64,
    /// Diagonalgewicht w_ii
    pub self_weight: f64,
    /// Anzeigegröße weight^p
    pub apparent_size: f64,
    /// `None` bei synthetischen Knoten
    pub payload: Option<P>,
}

impl<P> ClusterNode<P> {
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}

/// Clusterbaum als Arena. Entfernte Knoten bleiben als leere Plätze stehen, bis `compact` aufräumt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterTree<P = PagePayload> {
    nodes: Vec<Option<ClusterNode<P>>>,
    root: NodeId,
}

impl<P> Default for ClusterTree<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P> ClusterTree<P> {
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            root: 0,
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn set_root(&mut self, root: NodeId) -> ClusterResult<()> {
        self.node(root)?;
        self.root = root;
        Ok(())
    }

    /// Anzahl lebender Knoten
    pub fn len(&self) -> usize {
        self.nodes.iter().filter(|slot| slot.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, id: NodeId) -> Option<&ClusterNode<P>> {
        self.nodes.get(id).and_then(Option::as_ref)
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut ClusterNode<P>> {
        self.nodes.get_mut(id).and_then(Option::as_mut)
    }

    pub fn node(&self, id: NodeId) -> ClusterResult<&ClusterNode<P>> {
        self.get(id).ok_or(ClusterError::UnknownNode { node: id })
    }

    pub fn node_mut(&mut self, id: NodeId) -> ClusterResult<&mut ClusterNode<P>> {
        self.get_mut(id).ok_or(ClusterError::UnknownNode { node: id })
    }

    pub fn children(&self, id: NodeId) -> ClusterResult<&[NodeId]> {
        Ok(&self.node(id)?.children)
    }

    pub fn add_leaf(&mut self, weight: f64, visit_count: u64, self_weight: f64, payload: P) -> NodeId {
        self.push(ClusterNode {
            id: 0,
            weight,
            visit_count,
            children: Vec::new(),
            r12: 0.0,
            self_weight,
            apparent_size: 0.0,
            payload: Some(payload),
        })
    }

    /// Innerer Knoten; Gewicht und Besuche werden aus den Kindern summiert.
    pub fn add_internal(&mut self, children: Vec<NodeId>, r12: f64, self_weight: f64) -> ClusterResult<NodeId> {
        let mut weight = 0.0;
        let mut visit_count = 0;
        for &child in &children {
            let node = self.node(child)?;
            weight += node.weight;
            visit_count += node.visit_count;
        }
        Ok(self.push(ClusterNode {
            id: 0,
            weight,
            visit_count,
            children,
            r12,
            self_weight,
            apparent_size: 0.0,
            payload: None,
        }))
    }

    fn push(&mut self, mut node: ClusterNode<P>) -> NodeId {
        let id = self.nodes.len();
        node.id = id;
        self.nodes.push(Some(node));
        id
    }

    /// Markiert einen Knoten als entfernt; Verweise darauf muss der Aufrufer bereits gelöst haben.
    pub(crate) fn remove(&mut self, id: NodeId) -> Option<ClusterNode<P>> {
        self.nodes.get_mut(id).and_then(Option::take)
    }

    /// Alle Nachfahren unterhalb von `id` (ohne `id`), vorwärts in Vorordnung.
    pub(crate) fn descendants(&self, id: NodeId) -> ClusterResult<Vec<NodeId>> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(id)?.iter().rev().copied().collect();
        while let Some(current) = stack.pop() {
            out.push(current);
            stack.extend(self.children(current)?.iter().rev());
        }
        Ok(out)
    }

    /// Blätter unterhalb von `id` in Baumreihenfolge.
    pub fn leaves(&self, id: NodeId) -> ClusterResult<Vec<NodeId>> {
        if self.node(id)?.is_leaf() {
            return Ok(vec![id]);
        }
        let mut leaves = Vec::new();
        for node in self.descendants(id)? {
            if self.node(node)?.is_leaf() {
                leaves.push(node);
            }
        }
        Ok(leaves)
    }

    /// Knoten über Kindindizes ab der Wurzel.
    pub fn node_at_path(&self, path: &[usize]) -> ClusterResult<NodeId> {
        let mut current = self.root;
        for &index in path {
            current = *self
                .children(current)?
                .get(index)
                .ok_or_else(|| ClusterError::PathNotFound { path: path.to_vec() })?;
        }
        Ok(current)
    }

    pub fn find_leaf(&self, mut predicate: impl FnMut(&P) -> bool) -> Option<NodeId> {
        let leaves = self.leaves(self.root).ok()?;
        leaves.into_iter().find(|&id| {
            self.get(id)
                .and_then(|node| node.payload.as_ref())
                .is_some_and(&mut predicate)
        })
    }

    /// Vorordnung ab der Wurzel; der Pfad enthält die Kindindizes.
    pub fn visit(&self, mut f: impl FnMut(&ClusterNode<P>, &[usize])) -> ClusterResult<()> {
        let mut stack = vec![(self.root, Vec::new())];
        while let Some((id, path)) = stack.pop() {
            let node = self.node(id)?;
            f(node, &path);
            for (index, &child) in node.children.iter().enumerate().rev() {
                let mut child_path = path.clone();
                child_path.push(index);
                stack.push((child, child_path));
            }
        }
        Ok(())
    }

    /// Gewichte und Besuche von unten nach oben neu summieren, Anzeigegrößen setzen.
    pub fn propagate(&mut self, id: NodeId, display_power: f64) -> ClusterResult<(u64, f64)> {
        let children = self.node(id)?.children.clone();
        let (visit_count, weight) = if children.is_empty() {
            let node = self.node(id)?;
            if !node.weight.is_finite() {
                return Err(ClusterError::NonFiniteWeight { node: id });
            }
            if node.weight <= 0.0 || node.visit_count == 0 {
                return Err(ClusterError::MissingWeight { node: id });
            }
            (node.visit_count, node.weight)
        } else {
            let mut sum = (0, 0.0);
            for child in children {
                let (visits, weight) = self.propagate(child, display_power)?;
                sum.0 += visits;
                sum.1 += weight;
            }
            if !sum.1.is_finite() {
                return Err(ClusterError::NonFiniteWeight { node: id });
            }
            sum
        };
        let node = self.node_mut(id)?;
        node.weight = weight;
        node.visit_count = visit_count;
        node.apparent_size = weight.powf(display_power);
        Ok((visit_count, weight))
    }

    /// Prüft Gewicht, Besuche und Anzeigegröße aller Knoten.
    pub fn validate(&self) -> ClusterResult<()> {
        let mut failure = None;
        self.visit(|node, path| {
            if failure.is_some() {
                return;
            }
            let reason = if !(node.apparent_size > 0.0) {
                Some("apparent size not positive")
            } else if !(node.weight > 0.0) {
                Some("weight not positive")
            } else if node.visit_count == 0 {
                Some("visit count not positive")
            } else {
                None
            };
            if let Some(reason) = reason {
                failure = Some(ClusterError::CheckFailed {
                    path: path.to_vec(),
                    reason: reason.to_string(),
                });
            }
        })?;
        failure.map_or(Ok(()), Err)
    }

    /// Sortiert Kinder rekursiv nach absteigendem Gewicht.
    pub fn order_by_weight(&mut self, id: NodeId) -> ClusterResult<()> {
        let mut children = self.node(id)?.children.clone();
        let weight = |node: NodeId| self.get(node).map_or(0.0, |n| n.weight);
        children.sort_by(|&a, &b| weight(b).total_cmp(&weight(a)));
        for &child in &children {
            self.order_by_weight(child)?;
        }
        self.node_mut(id)?.children = children;
        Ok(())
    }

    /// Nummeriert die von der Wurzel erreichbaren Knoten in Vorordnung neu und verwirft den Rest.
    pub fn compact(&mut self) -> ClusterResult<HashMap<NodeId, NodeId>> {
        let mut order = vec![self.root];
        order.extend(self.descendants(self.root)?);
        let mapping: HashMap<NodeId, NodeId> = order.iter().enumerate().map(|(new, &old)| (old, new)).collect();

        let mut nodes = Vec::with_capacity(order.len());
        for &old in &order {
            let mut node = self.remove(old).ok_or(ClusterError::UnknownNode { node: old })?;
            node.id = mapping[&old];
            node.children = node.children.iter().map(|child| mapping[child]).collect();
            nodes.push(Some(node));
        }
        self.nodes = nodes;
        self.root = 0;
        Ok(mapping)
    }
}

impl<P: std::fmt::Debug> ClusterTree<P> {
    /// Gibt die Baumstruktur eingerückt auf Debug-Ebene aus.
    pub fn log_structure(&self) {
        let result = self.visit(|node, path| {
            let label = node
                .payload
                .as_ref()
                .map_or_else(|| format!("#{}", node.id), |payload| format!("{payload:?}"));
            debug!(
                "{}>{} ({}, {:.3}, r12 {:.3})",
                " ".repeat(path.len()),
                label,
                node.visit_count,
                node.weight,
                node.r12
            );
        });
        if let Err(err) = result {
            warn!("Tree structure incomplete: {}", err);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ClusterTree {
        let mut tree = ClusterTree::new();
        let a = tree.add_leaf(3.0, 3, 3.0, PagePayload::new("A", "https://a.example"));
        let b = tree.add_leaf(1.0, 2, 1.0, PagePayload::new("B", "https://b.example"));
        let c = tree.add_leaf(2.0, 1, 2.0, PagePayload::new("C", "https://c.example"));
        let ab = tree.add_internal(vec![a, b], 0.5, 4.0).unwrap();
        let root = tree.add_internal(vec![c, ab], 0.0, 0.0).unwrap();
        tree.set_root(root).unwrap();
        tree.propagate(root, 0.7).unwrap();
        tree
    }

    #[test]
    fn test_internal_sums() {
        let tree = sample();
        let root = tree.node(tree.root()).unwrap();
        assert_eq!(root.weight, 6.0);
        assert_eq!(root.visit_count, 6);
        assert!((root.apparent_size - 6.0_f64.powf(0.7)).abs() < 1e-12);
        assert!(tree.validate().is_ok());
    }

    #[test]
    fn test_paths_and_leaves() {
        let mut tree = sample();
        let ab = tree.node_at_path(&[1]).unwrap();
        assert_eq!(tree.leaves(ab).unwrap().len(), 2);
        assert_eq!(tree.node_at_path(&[1, 0]).unwrap(), 0);
        assert!(matches!(
            tree.node_at_path(&[1, 5]),
            Err(ClusterError::PathNotFound { .. })
        ));

        tree.order_by_weight(tree.root()).unwrap();
        assert_eq!(tree.node_at_path(&[0]).unwrap(), ab);
        let found = tree.find_leaf(|p| p.url == "https://c.example");
        assert_eq!(found, Some(2));
    }

    #[test]
    fn test_visit_paths_in_preorder() {
        let tree = sample();
        let mut paths = Vec::new();
        tree.visit(|_, path| paths.push(path.to_vec())).unwrap();
        assert_eq!(paths, vec![vec![], vec![0], vec![1], vec![1, 0], vec![1, 1]]);
    }

    #[test]
    fn test_validate_reports_path() {
        let mut tree = sample();
        tree.get_mut(1).unwrap().visit_count = 0;
        assert_eq!(
            tree.validate(),
            Err(ClusterError::CheckFailed {
                path: vec![1, 1],
                reason: "visit count not positive".to_string(),
            })
        );
        assert_eq!(tree.propagate(tree.root(), 0.7), Err(ClusterError::MissingWeight { node: 1 }));
    }

    #[test]
    fn test_non_finite_leaf_weight() {
        let mut tree = sample();
        tree.get_mut(2).unwrap().weight = f64::NAN;
        assert_eq!(tree.propagate(tree.root(), 0.7), Err(ClusterError::NonFiniteWeight { node: 2 }));
    }

    #[test]
    fn test_log_structure_survives_dangling_child() {
        let mut tree = sample();
        tree.log_structure();
        tree.remove(1);
        assert_eq!(tree.visit(|_, _| {}), Err(ClusterError::UnknownNode { node: 1 }));
        tree.log_structure();
    }

    #[test]
    fn test_compact_renumbers_preorder() {
        let mut tree = sample();
        let orphan = tree.add_leaf(1.0, 1, 1.0, PagePayload::default());
        let mapping = tree.compact().unwrap();
        assert_eq!(tree.len(), 5);
        assert!(!mapping.contains_key(&orphan));
        assert_eq!(tree.root(), 0);
        assert_eq!(tree.node(0).unwrap().children, vec![1, 2]);
        assert_eq!(tree.node(2).unwrap().children, vec![3, 4]);
        assert_eq!(tree.node(3).unwrap().payload.as_ref().unwrap().title, "A");
    }

    #[test]
    fn test_serde_round_trip_keeps_payloads() {
        let mut tree = sample();
        tree.get_mut(0).unwrap().payload.as_mut().unwrap().icon_url = Some("data:,".into());
        let json = serde_json::to_string(&tree).unwrap();
        let restored: ClusterTree = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, tree);
    }
}
