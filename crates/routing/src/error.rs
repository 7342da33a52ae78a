use thiserror::Error;

/// Errors returned by balancers and routers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RoutingError {
    /// The balancer holds no peers, or was closed while waiting for one.
    #[error("no peers available for selection")]
    NoPeersAvailable,
    /// A discovery-backed router failed to reach its backend.
    #[error("routing backend error: {0}")]
    Backend(String),
}
