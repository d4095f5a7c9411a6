// src/layout/treemap.rs
use super::error::{LayoutError, LayoutResult};
use crate::clustering::{ClusterTree, NodeId};
use crate::math::{
    error::MathError,
    geometry::{
        polygon::{Polygon, PolygonMorpher, PolygonProperties},
        voronoi::{
            CentroidalRelaxer, LloydConfig, PartitionConfig, ScaleMemory, TaskId, WeightedSite,
            WeightedVoronoiPartitioner,
        },
    },
    types::Point2D,
};
use bevy::log::{debug, info};
use std::collections::HashMap;

/// Polygon und Zentrum eines platzierten Knotens.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeGeometry {
    pub polygon: Polygon,
    pub center: Point2D,
}

impl NodeGeometry {
    fn of(polygon: Polygon) -> LayoutResult<Self> {
        let center = centroid(&polygon)?;
        Ok(Self { polygon, center })
    }
}

/// Verschachteltes Layout: jeder innere Knoten teilt sein Polygon unter seinen Kindern auf,
/// gewichtet nach deren Anzeigegröße.
///
/// Die Glättung des Gewichtsfaktors läuft pro Knoten unter der Aufgabe `"<layout>:<knoten>"`.
#[derive(Debug, Clone)]
pub struct TreeLayout {
    id: String,
    relaxer: CentroidalRelaxer,
    partitioner: WeightedVoronoiPartitioner,
    memory: ScaleMemory,
    geometry: HashMap<NodeId, NodeGeometry>,
}

impl TreeLayout {
    pub fn new(id: impl Into<String>, lloyd: LloydConfig, partition: PartitionConfig) -> LayoutResult<Self> {
        Ok(Self {
            id: id.into(),
            relaxer: CentroidalRelaxer::new(lloyd.with_new_centers(true), partition.clone())?,
            partitioner: WeightedVoronoiPartitioner::new(partition)?,
            memory: ScaleMemory::new(),
            geometry: HashMap::new(),
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn geometry(&self, node: NodeId) -> Option<&NodeGeometry> {
        self.geometry.get(&node)
    }

    pub fn cells(&self) -> impl Iterator<Item = (NodeId, &NodeGeometry)> {
        self.geometry.iter().map(|(&id, geometry)| (id, geometry))
    }

    pub fn len(&self) -> usize {
        self.geometry.len()
    }

    pub fn is_empty(&self) -> bool {
        self.geometry.is_empty()
    }

    fn task(&self, node: NodeId) -> TaskId {
        TaskId::new(format!("{}:{}", self.id, node))
    }

    /// Legt den ganzen Baum neu in `bounds` an: von oben nach unten werden die Kinder jedes
    /// Knotens per Lloyd-Relaxation in dessen Polygon verteilt, ausgehend von Spiralpositionen.
    pub fn initialize<P>(&mut self, tree: &ClusterTree<P>, bounds: &Polygon) -> LayoutResult<()> {
        self.geometry.clear();
        self.memory = ScaleMemory::new();

        let root = tree.root();
        self.geometry.insert(root, NodeGeometry::of(bounds.clone())?);
        let mut stack = vec![root];
        while let Some(node) = stack.pop() {
            let children = tree.children(node)?;
            if children.is_empty() {
                continue;
            }
            let polygon = self.polygon_of(node)?.clone();
            let sites = sites_for(tree, children, &vec![Point2D::ZERO; children.len()])?;
            let task = self.task(node);
            let result = self.relaxer.relax_with_memory(&sites, &polygon, &mut self.memory, &task)?;
            for (&child, cell) in children.iter().zip(result.tessellation.cells) {
                self.geometry.insert(
                    child,
                    NodeGeometry {
                        polygon: cell.polygon,
                        center: cell.center,
                    },
                );
            }
            stack.extend(children.iter().rev());
        }
        info!("Layout {}: placed {} nodes", self.id, self.geometry.len());
        Ok(())
    }

    /// Gibt `node` ein neues Polygon, verschiebt die Kindzentren mit und zerlegt neu, rekursiv.
    pub fn reshape<P>(&mut self, tree: &ClusterTree<P>, node: NodeId, new_polygon: Polygon) -> LayoutResult<()> {
        let children = tree.children(node)?;
        let old_polygon = self.polygon_of(node)?.clone();
        let target = NodeGeometry::of(new_polygon)?;

        let centers = match children.len() {
            0 => Vec::new(),
            1 => vec![target.center],
            _ => {
                let old_centers = children
                    .iter()
                    .map(|&child| self.geometry(child).map(|g| g.center).ok_or(LayoutError::NotLaidOut { node: child }))
                    .collect::<LayoutResult<Vec<_>>>()?;
                PolygonMorpher::new(&old_polygon, &target.polygon, None, None)?.map_points(&old_centers, 1.0)
            }
        };

        let polygon = target.polygon.clone();
        self.geometry.insert(node, target);
        if children.is_empty() {
            return Ok(());
        }

        let sites = sites_for(tree, children, &centers)?;
        let task = self.task(node);
        let tessellation = self
            .partitioner
            .tessellate_with_memory(&sites, &polygon, &mut self.memory, &task, false)?;
        debug!(
            "Layout {}: node {} re-tessellated into {} cells (scale {:e})",
            self.id,
            node,
            tessellation.cells.len(),
            tessellation.weight_scale
        );
        for (&child, cell) in children.iter().zip(tessellation.cells) {
            self.reshape(tree, child, cell.polygon)?;
        }
        Ok(())
    }

    /// Zerlegt alle Ebenen in den bestehenden Polygonen erneut.
    pub fn step<P>(&mut self, tree: &ClusterTree<P>) -> LayoutResult<()> {
        let root = tree.root();
        let polygon = self.polygon_of(root)?.clone();
        self.reshape(tree, root, polygon)
    }

    fn polygon_of(&self, node: NodeId) -> LayoutResult<&Polygon> {
        self.geometry
            .get(&node)
            .map(|g| &g.polygon)
            .ok_or(LayoutError::NotLaidOut { node })
    }
}

fn centroid(polygon: &Polygon) -> LayoutResult<Point2D> {
    polygon.area_centroid().ok_or_else(|| {
        LayoutError::Math(MathError::GeometricFailure {
            operation: "centroid of a zero-area layout polygon".into(),
        })
    })
}

fn sites_for<P>(tree: &ClusterTree<P>, children: &[NodeId], centers: &[Point2D]) -> LayoutResult<Vec<WeightedSite>> {
    children
        .iter()
        .zip(centers)
        .map(|(&child, &center)| Ok(WeightedSite::new(center, tree.node(child)?.apparent_size)))
        .collect()
}
