//! In-memory router (does not persist across restarts).

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use parking_lot::RwLock;
use tracing::{debug, trace};

use super::Router;
use crate::balancer::{Balancer, RoundRobin};
use crate::error::RoutingError;
use crate::peer::Peer;

/// Router backed by a key → peers table held in memory.
///
/// A discovery backend bridges peers it learns about into the table with
/// [`MemoryRouter::add`] and [`MemoryRouter::delete`]. Every stored sequence is
/// kept in insertion order and free of duplicate hosts.
#[derive(Debug)]
pub struct MemoryRouter {
    resolver: RwLock<HashMap<String, Vec<Peer>>>,
    self_peer: Peer,
    ready: AtomicBool,
}

impl MemoryRouter {
    /// Creates a router seeded with `resolver`, ready from the start.
    ///
    /// Duplicate hosts within a seeded key are dropped, keeping the first.
    pub fn new(resolver: HashMap<String, Vec<Peer>>, self_peer: Peer) -> Self {
        let resolver = resolver
            .into_iter()
            .map(|(key, peers)| {
                let mut unique: Vec<Peer> = Vec::with_capacity(peers.len());
                for peer in peers {
                    if !unique.iter().any(|p| p.same_host(&peer)) {
                        unique.push(peer);
                    }
                }
                (key, unique)
            })
            .collect();

        Self {
            resolver: RwLock::new(resolver),
            self_peer,
            ready: AtomicBool::new(true),
        }
    }

    /// The identity registered by [`Router::advertise`].
    pub fn self_peer(&self) -> &Peer {
        &self.self_peer
    }

    pub fn set_readiness(&self, ready: bool) {
        debug!(ready, "router readiness changed");
        self.ready.store(ready, Ordering::SeqCst);
    }

    /// Registers `peer` under `key`. A host already present is left untouched.
    pub fn add(&self, key: &str, peer: Peer) {
        let mut resolver = self.resolver.write();
        let peers = resolver.entry(key.to_owned()).or_default();
        if peers.iter().any(|p| p.same_host(&peer)) {
            return;
        }
        trace!(key, host = %peer.host, "peer registered");
        peers.push(peer);
    }

    /// Removes the peer with the same host from `key`.
    ///
    /// The key stays present even once its last peer is gone.
    pub fn delete(&self, key: &str, peer: &Peer) {
        let mut resolver = self.resolver.write();
        let Some(peers) = resolver.get_mut(key) else {
            return;
        };
        let before = peers.len();
        peers.retain(|p| !p.same_host(peer));
        if peers.len() != before {
            trace!(key, host = %peer.host, "peer deregistered");
        }
    }

    /// The peers currently stored for `key`, or `None` if the key was never
    /// registered.
    pub fn get(&self, key: &str) -> Option<Vec<Peer>> {
        self.resolver.read().get(key).cloned()
    }
}

#[async_trait]
impl Router for MemoryRouter {
    async fn ready(&self) -> Result<bool, RoutingError> {
        Ok(self.ready.load(Ordering::SeqCst))
    }

    async fn lookup(&self, key: &str, _count: usize) -> Result<Box<dyn Balancer>, RoutingError> {
        let resolver = self.resolver.read();
        let rr: RoundRobin = resolver.get(key).into_iter().flatten().cloned().collect();
        trace!(key, peers = rr.size(), "lookup");
        Ok(Box::new(rr))
    }

    async fn advertise(&self, keys: &[String]) -> Result<(), RoutingError> {
        for key in keys {
            self.add(key, self.self_peer.clone());
        }
        debug!(keys = keys.len(), "advertised");
        Ok(())
    }

    async fn withdraw(&self, keys: &[String]) -> Result<(), RoutingError> {
        for key in keys {
            self.delete(key, &self.self_peer);
        }
        debug!(keys = keys.len(), "withdrawn");
        Ok(())
    }
}
