//! Peer identity and addressing.

use std::net::{IpAddr, SocketAddr};

use serde::{Deserialize, Serialize};

/// A host reachable at one or more addresses.
///
/// Balancers and routers deduplicate peers by [`Peer::host`] alone: two values
/// sharing a host are the same peer even if their addresses or metadata differ.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Peer {
    pub host: String,
    #[serde(default)]
    pub addresses: Vec<IpAddr>,
    #[serde(default)]
    pub metadata: PeerMetadata,
}

/// Additional information advertised alongside a peer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PeerMetadata {
    /// Port the peer serves mirrored content on.
    #[serde(default)]
    pub registry_port: u16,
}

impl Peer {
    pub fn new(host: impl Into<String>, addresses: impl IntoIterator<Item = IpAddr>) -> Self {
        Self {
            host: host.into(),
            addresses: addresses.into_iter().collect(),
            metadata: PeerMetadata::default(),
        }
    }

    pub fn with_registry_port(mut self, port: u16) -> Self {
        self.metadata.registry_port = port;
        self
    }

    /// Whether `other` refers to the same host.
    pub fn same_host(&self, other: &Peer) -> bool {
        self.host == other.host
    }

    /// Every address paired with the registry port, in advertised order.
    pub fn socket_addrs(&self) -> Vec<SocketAddr> {
        self.addresses
            .iter()
            .map(|ip| SocketAddr::new(*ip, self.metadata.registry_port))
            .collect()
    }
}
