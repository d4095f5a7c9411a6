// src/clustering/mod.rs

// Hierarchisches Clustering gewichteter, paarweise korrelierter Elemente
pub mod builder;
pub mod config;
pub mod error;
pub mod node;
pub mod rebalance;
pub mod similarity;

pub use self::builder::{ClusterItem, HierarchicalClusterBuilder};
pub use self::config::{ClusterConfig, ProcessingMode};
pub use self::error::{ClusterError, ClusterResult};
pub use self::node::{ClusterNode, ClusterTree, NodeId, PagePayload};
pub use self::rebalance::{Threshold, make_tree_child, process, rebalance, truncate_levels};
pub use self::similarity::{PairwiseWeights, correlation};

pub mod prelude {
    pub use super::{
        ClusterConfig, ClusterError, ClusterItem, ClusterNode, ClusterResult, ClusterTree,
        HierarchicalClusterBuilder, NodeId, PagePayload, PairwiseWeights, ProcessingMode,
    };
}
