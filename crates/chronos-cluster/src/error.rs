//! Error types for cluster membership and endpoint selection.

use thiserror::Error;

/// Result type alias for cluster operations.
pub type ClusterResult<T> = Result<T, ClusterError>;

/// Errors surfaced by the member registry and the cluster selector.
///
/// Transport failures are deliberately absent: they are the trigger for
/// `Cluster::mark_inactive`, not an outcome of any cluster operation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClusterError {
    #[error("invalid cluster configuration: {0}")]
    Configuration(String),

    #[error("no available cluster member")]
    NoAvailableMember,
}
