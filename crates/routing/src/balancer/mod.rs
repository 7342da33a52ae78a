//! Peer selection for a single routing key.

mod closable;
mod round_robin;

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::RoutingError;
use crate::peer::Peer;

pub use closable::ClosableBalancer;
pub use round_robin::RoundRobin;

/// Selects among the peers registered under one key.
///
/// Implementations are shared between tasks and must be safe to call
/// concurrently without external locking.
#[async_trait]
pub trait Balancer: Send + Sync {
    /// Returns the next peer.
    ///
    /// The default never suspends and behaves like [`Balancer::try_next`].
    /// Decorators such as [`ClosableBalancer`] override it to wait for a peer.
    async fn next(&self) -> Result<Peer, RoutingError> {
        self.try_next()
    }

    /// Returns the next peer, failing with [`RoutingError::NoPeersAvailable`]
    /// instead of waiting when there is none.
    fn try_next(&self) -> Result<Peer, RoutingError>;

    /// Number of peers currently held.
    fn size(&self) -> usize;

    /// Adds a peer. A peer whose host is already present is ignored.
    fn add(&self, peer: Peer);

    /// Removes the peer with the same host, if present.
    fn remove(&self, peer: &Peer);
}

#[async_trait]
impl<B: Balancer + ?Sized> Balancer for Box<B> {
    async fn next(&self) -> Result<Peer, RoutingError> {
        (**self).next().await
    }

    fn try_next(&self) -> Result<Peer, RoutingError> {
        (**self).try_next()
    }

    fn size(&self) -> usize {
        (**self).size()
    }

    fn add(&self, peer: Peer) {
        (**self).add(peer)
    }

    fn remove(&self, peer: &Peer) {
        (**self).remove(peer)
    }
}

#[async_trait]
impl<B: Balancer + ?Sized> Balancer for Arc<B> {
    async fn next(&self) -> Result<Peer, RoutingError> {
        (**self).next().await
    }

    fn try_next(&self) -> Result<Peer, RoutingError> {
        (**self).try_next()
    }

    fn size(&self) -> usize {
        (**self).size()
    }

    fn add(&self, peer: Peer) {
        (**self).add(peer)
    }

    fn remove(&self, peer: &Peer) {
        (**self).remove(peer)
    }
}
