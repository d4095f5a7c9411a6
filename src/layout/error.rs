// src/layout/error.rs
use crate::clustering::{ClusterError, NodeId};
use crate::math::MathError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum LayoutError {
    #[error("Geometry: {0}")]
    Math(#[from] MathError),

    #[error("Cluster tree: {0}")]
    Cluster(#[from] ClusterError),

    #[error("Node {node} has not been laid out")]
    NotLaidOut { node: NodeId },
}

pub type LayoutResult<T> = Result<T, LayoutError>;
