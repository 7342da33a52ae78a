//! Directory of content keys and the peers serving them.

mod memory;

use std::sync::Arc;

use async_trait::async_trait;

use crate::balancer::Balancer;
use crate::error::RoutingError;

pub use memory::MemoryRouter;

/// Maps content keys to peer sets.
///
/// Consumed by the fetch path through [`Router::lookup`] and fed by a discovery
/// backend through [`Router::advertise`] and [`Router::withdraw`]. Dropping a
/// returned future abandons the operation.
#[async_trait]
pub trait Router: Send + Sync {
    /// Whether the router is ready to serve lookups, e.g. after its initial
    /// peer-set sync. Never blocks.
    async fn ready(&self) -> Result<bool, RoutingError>;

    /// Returns a balancer over the peers known for `key`.
    ///
    /// `count` hints how many peers the caller intends to use; implementations
    /// may ignore it. An unknown key yields an empty balancer, not an error.
    async fn lookup(&self, key: &str, count: usize) -> Result<Box<dyn Balancer>, RoutingError>;

    /// Registers this node as a server for every key.
    async fn advertise(&self, keys: &[String]) -> Result<(), RoutingError>;

    /// Deregisters this node from every key.
    async fn withdraw(&self, keys: &[String]) -> Result<(), RoutingError>;
}

#[async_trait]
impl<R: Router + ?Sized> Router for Arc<R> {
    async fn ready(&self) -> Result<bool, RoutingError> {
        (**self).ready().await
    }

    async fn lookup(&self, key: &str, count: usize) -> Result<Box<dyn Balancer>, RoutingError> {
        (**self).lookup(key, count).await
    }

    async fn advertise(&self, keys: &[String]) -> Result<(), RoutingError> {
        (**self).advertise(keys).await
    }

    async fn withdraw(&self, keys: &[String]) -> Result<(), RoutingError> {
        (**self).withdraw(keys).await
    }
}
