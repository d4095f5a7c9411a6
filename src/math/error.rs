// src/math/error.rs
use crate::math::geometry::voronoi::input::InputIssue;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum MathError {
    #[error("Insufficient points for operation: expected at least {expected}, got {actual}")]
    InsufficientPoints { expected: usize, actual: usize },

    #[error("Invalid configuration: {message}")]
    InvalidConfiguration { message: String },

    #[error("Geometric calculation failed: {operation}")]
    GeometricFailure { operation: String },

    #[error("Invalid partition input ({} issue(s)): {}", issues.len(), summarize(issues))]
    InvalidInput { issues: Vec<InputIssue> },

    #[error("Split line between site {site} and its owner {owner} misses the owner polygon")]
    SplitLineMissesPolygon { site: usize, owner: usize },

    #[error("Clipping walk for site {site} exceeded {limit} iterations")]
    ClipLoopExceeded { site: usize, limit: usize },

    #[error("Site {site} is not the first pending assignee of site {owner}")]
    PendingOrderViolation { site: usize, owner: usize },

    #[error("Cell of site {site} collapsed during clipping")]
    CellCollapsed { site: usize },

    #[error("Boundary ring inconsistent: {message}")]
    BoundaryInconsistent { message: String },

    #[error("Points {id} and {other} coincide (cell below minimum size)")]
    CoincidentPoints { id: usize, other: usize },

    #[error("Point {id} lies outside the index bounds")]
    PointOutOfBounds { id: usize },

    #[error("Point {id} is not stored in the index")]
    UnknownPoint { id: usize },
}

fn summarize(issues: &[InputIssue]) -> String {
    issues
        .iter()
        .map(|issue| issue.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

pub type MathResult<T> = Result<T, MathError>;
