// src/clustering/error.rs
use super::node::NodeId;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ClusterError {
    #[error("No items to cluster")]
    NoItems,

    #[error("Node {node} has neither a weight nor a visit count")]
    MissingWeight { node: NodeId },

    #[error("Node {node} has a non-finite weight")]
    NonFiniteWeight { node: NodeId },

    #[error("Node {node} has a non-positive weight {weight}")]
    NonPositiveWeight { node: NodeId, weight: f64 },

    #[error("Pair weight ({a}, {b}) = {weight} is not usable")]
    InvalidPairWeight { a: usize, b: usize, weight: f64 },

    #[error("Node {node} does not exist")]
    UnknownNode { node: NodeId },

    #[error("No node at path {path:?}")]
    PathNotFound { path: Vec<usize> },

    #[error("Invalid configuration: {message}")]
    InvalidConfiguration { message: String },

    #[error("Tree check failed at node {path:?}: {reason}")]
    CheckFailed { path: Vec<usize>, reason: String },
}

pub type ClusterResult<T> = Result<T, ClusterError>;
