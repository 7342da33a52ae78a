//! Peer selection and key-to-peer routing for a cooperative content mirror.
//!
//! A [`Router`] maps content keys to the peers currently known to serve them and
//! hands out a [`Balancer`] per lookup. [`RoundRobin`] cycles through peers in
//! insertion order; [`ClosableBalancer`] wraps any balancer so callers can wait
//! for a peer to appear instead of failing on an empty set.

pub mod balancer;
pub mod error;
pub mod peer;
pub mod router;

pub use balancer::{Balancer, ClosableBalancer, RoundRobin};
pub use error::RoutingError;
pub use peer::{Peer, PeerMetadata};
pub use router::{MemoryRouter, Router};
