// src/clustering/rebalance.rs
use super::{
    config::{ClusterConfig, ProcessingMode},
    error::{ClusterError, ClusterResult},
    node::{ClusterNode, ClusterTree, NodeId},
};
use bevy::log::debug;
use std::collections::HashSet;

/// Schwelle, unter der ein Kind in seinen Elternknoten aufgelöst wird (relativ zu dessen r12).
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Threshold {
    Constant(f64),
    /// t + (1 − t) · Gewichtsanteil des Kindes
    SizeScaled(f64),
}

impl Threshold {
    pub fn at(&self, share: f64) -> f64 {
        match *self {
            Threshold::Constant(t) => t,
            Threshold::SizeScaled(t) => t + (1.0 - t) * share,
        }
    }
}

/// Löst schwach korrelierte Kinder von `node` auf und begrenzt die Kinderzahl auf `nmax`.
///
/// Ein Kind mit eigenen Kindern wird aufgelöst, wenn `child.r12 < node.r12 + threshold(anteil)`.
/// Überzählige kleinste Kinder werden reihum auf `k` synthetische Knoten verteilt.
pub fn rebalance<P>(
    tree: &mut ClusterTree<P>,
    node: NodeId,
    nmax: usize,
    threshold: Threshold,
    recursive: bool,
    display_power: f64,
) -> ClusterResult<()> {
    check_nmax(nmax)?;
    if tree.node(node)?.is_leaf() {
        return Ok(());
    }

    while let Some(index) = pull_up_candidate(tree, node, threshold)? {
        let parent = tree.node_mut(node)?;
        let child = parent.children.remove(index);
        let grandchildren = tree.node(child)?.children.clone();
        tree.node_mut(node)?.children.extend(grandchildren);
        tree.remove(child);
        sort_ascending(tree, node)?;
    }

    let m = tree.node(node)?.children.len();
    if m > nmax {
        sort_ascending(tree, node)?;
        let k = (m - nmax).div_ceil(nmax - 1);
        let num_remove = m.min(m + k - nmax);
        let smallest: Vec<NodeId> = tree.node_mut(node)?.children.drain(..num_remove).collect();

        let mut groups = vec![Vec::new(); k];
        for (i, child) in smallest.into_iter().enumerate() {
            groups[i % k].push(child);
        }
        for group in groups {
            let self_weight = group
                .iter()
                .map(|&c| tree.node(c).map(|n| n.self_weight))
                .sum::<ClusterResult<f64>>()?;
            let synthetic = tree.add_internal(group, 0.0, self_weight)?;
            tree.node_mut(node)?.children.push(synthetic);
        }
        debug!("Node {}: grouped {} children into {} synthetic nodes", node, num_remove, k);
    }

    if recursive {
        for child in tree.node(node)?.children.clone() {
            rebalance(tree, child, nmax, threshold, recursive, display_power)?;
        }
    }
    tree.propagate(node, display_power)?;
    Ok(())
}

fn check_nmax(nmax: usize) -> ClusterResult<()> {
    if nmax < 2 {
        return Err(ClusterError::InvalidConfiguration {
            message: format!("nmax must be at least 2, got {nmax}"),
        });
    }
    Ok(())
}

fn pull_up_candidate<P>(tree: &ClusterTree<P>, node: NodeId, threshold: Threshold) -> ClusterResult<Option<usize>> {
    let parent = tree.node(node)?;
    for (index, &child) in parent.children.iter().enumerate() {
        let child = tree.node(child)?;
        if !child.is_leaf() && child.r12 < parent.r12 + threshold.at(child.weight / parent.weight) {
            return Ok(Some(index));
        }
    }
    Ok(None)
}

fn sort_ascending<P>(tree: &mut ClusterTree<P>, node: NodeId) -> ClusterResult<()> {
    let mut children = tree.node(node)?.children.clone();
    let weight = |id: NodeId| tree.get(id).map_or(0.0, |n| n.weight);
    children.sort_by(|&a, &b| weight(a).total_cmp(&weight(b)));
    tree.node_mut(node)?.children = children;
    Ok(())
}

/// Ersetzt jedes innere Kind von `node` durch einen Knoten mit seinen `nmax` schwersten Blättern;
/// Blattkinder werden eine Ebene tiefer gehängt.
pub fn truncate_levels<P: Clone>(
    tree: &mut ClusterTree<P>,
    node: NodeId,
    nmax: usize,
    display_power: f64,
) -> ClusterResult<()> {
    check_nmax(nmax)?;
    if tree.node(node)?.is_leaf() {
        return Ok(());
    }
    let children = tree.node(node)?.children.clone();
    for (index, child) in children.into_iter().enumerate() {
        if tree.node(child)?.is_leaf() {
            let wrapper = make_tree_child(tree, child)?;
            tree.node_mut(node)?.children[index] = wrapper;
            continue;
        }

        let mut leaves = tree.leaves(child)?;
        let weight = |id: NodeId| tree.get(id).map_or(0.0, |n| n.weight);
        leaves.sort_by(|&a, &b| weight(a).total_cmp(&weight(b)));
        let kept: Vec<NodeId> = leaves.split_off(leaves.len().saturating_sub(nmax));

        let keep: HashSet<NodeId> = kept.iter().copied().collect();
        for dropped in tree.descendants(child)? {
            if !keep.contains(&dropped) {
                tree.remove(dropped);
            }
        }
        tree.node_mut(child)?.children = kept;
    }
    tree.propagate(node, display_power)?;
    Ok(())
}

/// Hängt `node` unter einen neuen Knoten mit denselben Werten und gibt dessen Id zurück.
///
/// Der Aufrufer ersetzt Verweise auf `node`; ist `node` die Wurzel, wird der neue Knoten Wurzel.
pub fn make_tree_child<P: Clone>(tree: &mut ClusterTree<P>, node: NodeId) -> ClusterResult<NodeId> {
    let original = tree.node(node)?.clone();
    let wrapper = tree.add_internal(vec![node], original.r12, original.self_weight)?;
    let ClusterNode { payload, apparent_size, .. } = original;
    let new = tree.node_mut(wrapper)?;
    new.payload = payload;
    new.apparent_size = apparent_size;
    if tree.root() == node {
        tree.set_root(wrapper)?;
    }
    Ok(wrapper)
}

/// Nachbearbeitung der Kinder der Wurzel; setzt anschließend alle Anzeigegrößen neu.
pub fn process<P: Clone>(tree: &mut ClusterTree<P>, mode: ProcessingMode, config: &ClusterConfig) -> ClusterResult<()> {
    config.validate()?;
    let (nmax, t, p) = (config.cluster_nmax, config.threshold, config.display_power);

    let root = tree.root();
    if mode == ProcessingMode::SizeBasedFlatten && tree.node(root)?.is_leaf() {
        make_tree_child(tree, root)?;
    }
    let root = tree.root();

    match mode {
        ProcessingMode::None => {}
        ProcessingMode::Rebalance | ProcessingMode::RebalanceRecursive => {
            let recursive = mode == ProcessingMode::RebalanceRecursive;
            for child in tree.children(root)?.to_vec() {
                rebalance(tree, child, nmax, Threshold::Constant(t), recursive, p)?;
            }
        }
        ProcessingMode::Flatten => truncate_levels(tree, root, nmax, p)?,
        ProcessingMode::SizeBased | ProcessingMode::SizeBasedFlatten => {
            for (index, mut child) in tree.children(root)?.to_vec().into_iter().enumerate() {
                if mode == ProcessingMode::SizeBasedFlatten && tree.node(child)?.is_leaf() {
                    child = make_tree_child(tree, child)?;
                    tree.node_mut(root)?.children[index] = child;
                }
                rebalance(tree, child, nmax, Threshold::Constant(t), true, p)?;
                rebalance(tree, child, nmax, Threshold::SizeScaled(t), false, p)?;
                if mode == ProcessingMode::SizeBasedFlatten {
                    truncate_levels(tree, child, nmax, p)?;
                }
            }
        }
    }

    tree.propagate(root, p)?;
    Ok(())
}
