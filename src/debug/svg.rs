// src/debug/svg.rs
use crate::clustering::ClusterTree;
use crate::layout::{LayoutResult, TreeLayout};
use crate::math::{
    geometry::{polygon::Polygon, voronoi::Tessellation},
    types::{Bounds2D, Point2D},
};
use bevy::log::info;
use std::path::Path;
use svg::{
    Document, Node,
    node::element::{Circle, Polygon as SvgPolygon, Rectangle},
};

const PALETTE: [&str; 10] = [
    "#1f77b4", "#ff7f0e", "#2ca02c", "#d62728", "#9467bd", "#8c564b", "#e377c2", "#7f7f7f", "#bcbd22",
    "#17becf",
];

/// Hilfs-Struct: Dokument mit relativ zur Zeichenfläche berechneten Strichstärken.
struct SvgBuilder {
    document: Document,
    stroke_width: f64,
    point_radius: f64,
}

impl SvgBuilder {
    fn new(display_bounds: &Bounds2D, pixel_size: f64) -> Self {
        let (w, h) = (display_bounds.width(), display_bounds.height());
        let mean = (w + h) / 2.0;
        let background = Rectangle::new()
            .set("x", display_bounds.min.x)
            .set("y", display_bounds.min.y)
            .set("width", w)
            .set("height", h)
            .set("fill", "#f0f0f0");
        let document = Document::new()
            .set("width", pixel_size)
            .set("height", pixel_size)
            .set("viewBox", (display_bounds.min.x, display_bounds.min.y, w, h))
            .add(background);
        Self {
            document,
            stroke_width: mean * 0.004,
            point_radius: mean * 0.004,
        }
    }

    fn draw_polygon(&mut self, polygon: &Polygon, fill: &str, stroke_scale: f64, label: Option<String>) {
        let points = polygon
            .vertices()
            .iter()
            .map(|p| format!("{:.3},{:.3}", p.x, p.y))
            .collect::<Vec<_>>()
            .join(" ");
        let mut element = SvgPolygon::new()
            .set("points", points)
            .set("fill", fill)
            .set("fill-opacity", 0.35)
            .set("stroke", "#333333")
            .set("stroke-width", self.stroke_width * stroke_scale)
            .set("stroke-linejoin", "round");
        if let Some(label) = label {
            element = element.set("data-name", label);
        }
        self.document.append(element);
    }

    fn draw_circle(&mut self, center: Point2D, fill: &str) {
        let circle = Circle::new()
            .set("cx", center.x)
            .set("cy", center.y)
            .set("r", self.point_radius)
            .set("fill", fill);
        self.document.append(circle);
    }

    fn finish(self) -> Document {
        self.document
    }
}

/// Zellen einer Zerlegung mit ihren Zentren.
pub fn tessellation_document(tessellation: &Tessellation, bounds: &Polygon, pixel_size: f64) -> Document {
    let mut svg = SvgBuilder::new(&bounds.bounds(), pixel_size);
    svg.draw_polygon(bounds, "none", 2.0, None);
    for cell in &tessellation.cells {
        let fill = PALETTE[cell.index % PALETTE.len()];
        svg.draw_polygon(
            &cell.polygon,
            fill,
            1.0,
            Some(format!("site {} (weight {:.3})", cell.index, cell.weight)),
        );
        svg.draw_circle(cell.center, "#000000");
    }
    svg.finish()
}

/// Alle platzierten Knoten eines Baums; Farbe nach oberster Gruppe, Strich dünner mit der Tiefe.
pub fn layout_document<P>(layout: &TreeLayout, tree: &ClusterTree<P>, pixel_size: f64) -> LayoutResult<Document> {
    let root = layout
        .geometry(tree.root())
        .ok_or(crate::layout::LayoutError::NotLaidOut { node: tree.root() })?;
    let mut svg = SvgBuilder::new(&root.polygon.bounds(), pixel_size);

    let mut shapes = Vec::new();
    tree.visit(|node, path| {
        if let Some(geometry) = layout.geometry(node.id) {
            shapes.push((path.to_vec(), node.id, node.weight, geometry.polygon.clone()));
        }
    })?;
    for (path, id, weight, polygon) in shapes {
        let fill = path.first().map_or("none", |&top| PALETTE[top % PALETTE.len()]);
        let stroke_scale = 1.0 / (1.0 + path.len() as f64);
        svg.draw_polygon(&polygon, fill, 2.0 * stroke_scale, Some(format!("node {id} (weight {weight:.3})")));
    }
    Ok(svg.finish())
}

/// Speichert ein Dokument und meldet den Pfad.
pub fn save(path: impl AsRef<Path>, document: &Document) -> std::io::Result<()> {
    svg::save(path.as_ref(), document)?;
    info!("Debug SVG '{}' written", path.as_ref().display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clustering::{ClusterItem, HierarchicalClusterBuilder, PagePayload, PairwiseWeights};
    use crate::math::geometry::voronoi::{LloydConfig, PartitionConfig, WeightedSite, WeightedVoronoiPartitioner};

    #[test]
    fn test_tessellation_renders_one_polygon_per_cell() {
        let bounds = Polygon::rectangle(Point2D::ZERO, Point2D::splat(10.0)).unwrap();
        let sites = vec![
            WeightedSite::new(Point2D::new(2.0, 2.0), 1.0),
            WeightedSite::new(Point2D::new(8.0, 3.0), 2.0),
            WeightedSite::new(Point2D::new(5.0, 8.0), 1.0),
        ];
        let tessellation = WeightedVoronoiPartitioner::default().tessellate(&sites, &bounds).unwrap();
        let text = tessellation_document(&tessellation, &bounds, 512.0).to_string();
        // Rand + drei Zellen
        assert_eq!(text.matches("<polygon").count(), 4);
        assert!(text.contains("viewBox=\"0 0 10 10\""));
        assert!(text.contains("site 1"));
    }

    #[test]
    fn test_layout_renders_all_nodes() {
        let items = (0..5)
            .map(|i| ClusterItem::new(1.0 + i as f64, 1, PagePayload::new(format!("{i}"), format!("https://{i}.example"))))
            .collect();
        let tree = HierarchicalClusterBuilder::default().build(items, &PairwiseWeights::new()).unwrap();
        let mut layout = TreeLayout::new("svg", LloydConfig::default(), PartitionConfig::default()).unwrap();
        let bounds = Polygon::rectangle(Point2D::ZERO, Point2D::new(40.0, 30.0)).unwrap();
        layout.initialize(&tree, &bounds).unwrap();

        let text = layout_document(&layout, &tree, 800.0).unwrap().to_string();
        assert_eq!(text.matches("<polygon").count(), tree.len());
    }

    #[test]
    fn test_layout_without_geometry_fails() {
        let tree = HierarchicalClusterBuilder::default()
            .build(vec![ClusterItem::new(1.0, 1, ())], &PairwiseWeights::new())
            .unwrap();
        let layout = TreeLayout::new("empty", LloydConfig::default(), PartitionConfig::default()).unwrap();
        assert!(layout_document(&layout, &tree, 100.0).is_err());
    }
}
