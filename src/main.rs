// ./src/main.rs
use bevy::app::ScheduleRunnerPlugin;
use bevy::log::LogPlugin;
use bevy::prelude::*;
use history_treemap::{
    clustering::{ClusterConfig, ClusterItem, HierarchicalClusterBuilder, PagePayload, PairwiseWeights},
    debug,
    layout::TreeLayout,
    math::{
        geometry::{
            polygon::Polygon,
            voronoi::{LloydConfig, PartitionConfig},
        },
        types::Point2D,
    },
};
use rand::{Rng, SeedableRng, rngs::StdRng};

/// Einstellungen des Demo-Laufs: synthetischer Verlauf, Clustering, Layout, SVG.
#[derive(Resource, Debug, Clone)]
struct DemoConfig {
    seed: u64,
    domains: usize,
    pages_per_domain: usize,
    width: f64,
    height: f64,
    output: String,
    cluster: ClusterConfig,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            domains: 12,
            pages_per_domain: 6,
            width: 1200.0,
            height: 800.0,
            output: std::env::args().nth(1).unwrap_or_else(|| "history_map.svg".to_string()),
            cluster: ClusterConfig::default(),
        }
    }
}

fn main() {
    App::new()
        .add_plugins(MinimalPlugins.set(ScheduleRunnerPlugin::run_once()))
        .add_plugins(LogPlugin::default())
        .init_resource::<DemoConfig>()
        .add_systems(Startup, render_history_map)
        .run();
}

fn render_history_map(config: Res<DemoConfig>) {
    match run_demo(&config) {
        Ok(nodes) => info!("History map with {} nodes written to {}", nodes, config.output),
        Err(err) => error!("History map failed: {}", err),
    }
}

fn run_demo(config: &DemoConfig) -> Result<usize, Box<dyn std::error::Error>> {
    let (items, pairs) = synthetic_history(config);
    info!("Synthesized {} pages with {} pair weights", items.len(), pairs.len());

    let tree = HierarchicalClusterBuilder::new(config.cluster.clone())?.build_processed(items, &pairs)?;
    tree.validate()?;
    tree.log_structure();

    let bounds = Polygon::rectangle(Point2D::ZERO, Point2D::new(config.width, config.height))?;
    let mut layout = TreeLayout::new("demo", LloydConfig::default(), PartitionConfig::default())?;
    layout.initialize(&tree, &bounds)?;

    // Fenster wird schmaler: Layout folgt ohne Neuaufbau
    let narrower = Polygon::rectangle(Point2D::ZERO, Point2D::new(config.width * 0.75, config.height))?;
    layout.reshape(&tree, tree.root(), narrower)?;

    let document = debug::layout_document(&layout, &tree, config.width)?;
    debug::save(&config.output, &document)?;
    Ok(layout.len())
}

/// Seiten derselben Domain sind stark korreliert, zwischen Domains gibt es vereinzelte Links.
fn synthetic_history(config: &DemoConfig) -> (Vec<ClusterItem<PagePayload>>, PairwiseWeights) {
    let mut rng = StdRng::seed_from_u64(config.seed);
    let mut items = Vec::new();
    let mut domain_of = Vec::new();

    for domain in 0..config.domains {
        let popularity = rng.random_range(1.0..20.0);
        for page in 0..rng.random_range(1..=config.pages_per_domain) {
            let visits: u64 = rng.random_range(1..=(popularity as u64 * 5));
            let recency: f64 = rng.random_range(0.2..1.0);
            items.push(ClusterItem::new(
                visits as f64 * recency,
                visits,
                PagePayload::new(
                    format!("Page {page} of domain {domain}"),
                    format!("https://domain{domain}.example/page/{page}"),
                ),
            ));
            domain_of.push(domain);
        }
    }

    let mut pairs = PairwiseWeights::new();
    for a in 0..items.len() {
        let w_a = items[a].weight.unwrap_or(1.0);
        pairs.insert(a, a, w_a);
        for b in (a + 1)..items.len() {
            let w_b = items[b].weight.unwrap_or(1.0);
            let strength = if domain_of[a] == domain_of[b] {
                rng.random_range(0.6..0.95)
            } else if rng.random_bool(0.03) {
                rng.random_range(0.05..0.3)
            } else {
                continue;
            };
            pairs.insert(a, b, strength * (w_a * w_b).sqrt());
        }
    }
    (items, pairs)
}
