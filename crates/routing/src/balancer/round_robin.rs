//! Cyclic peer selection in insertion order.

use parking_lot::Mutex;
use tracing::trace;

use super::Balancer;
use crate::error::RoutingError;
use crate::peer::Peer;

#[derive(Debug, Default)]
struct Rotation {
    peers: Vec<Peer>,
    /// Index of the peer returned by the next selection. Always valid or 0.
    cursor: usize,
}

/// Hands out peers one at a time in insertion order, wrapping around.
///
/// The peer list and the cursor sit behind a single mutex, so every call to
/// [`Balancer::try_next`] observes and advances a distinct rotation position.
#[derive(Debug, Default)]
pub struct RoundRobin {
    state: Mutex<Rotation>,
}

impl RoundRobin {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of the peers in rotation order, starting from the first inserted.
    pub fn peers(&self) -> Vec<Peer> {
        self.state.lock().peers.clone()
    }
}

impl FromIterator<Peer> for RoundRobin {
    fn from_iter<I: IntoIterator<Item = Peer>>(iter: I) -> Self {
        let rr = Self::new();
        for peer in iter {
            rr.add(peer);
        }
        rr
    }
}

impl Balancer for RoundRobin {
    fn try_next(&self) -> Result<Peer, RoutingError> {
        let mut state = self.state.lock();
        let len = state.peers.len();
        let Some(peer) = state.peers.get(state.cursor).cloned() else {
            return Err(RoutingError::NoPeersAvailable);
        };
        state.cursor = (state.cursor + 1) % len;
        Ok(peer)
    }

    fn size(&self) -> usize {
        self.state.lock().peers.len()
    }

    fn add(&self, peer: Peer) {
        let mut state = self.state.lock();
        if state.peers.iter().any(|p| p.same_host(&peer)) {
            return;
        }
        trace!(host = %peer.host, "peer added to rotation");
        state.peers.push(peer);
    }

    fn remove(&self, peer: &Peer) {
        let mut state = self.state.lock();
        let Some(idx) = state.peers.iter().position(|p| p.same_host(peer)) else {
            return;
        };
        state.peers.remove(idx);

        if state.cursor > idx {
            state.cursor -= 1;
        } else if state.cursor >= state.peers.len() {
            state.cursor = 0;
        }
        trace!(host = %peer.host, "peer removed from rotation");
    }
}

#[cfg(test)]
mod tests {
    use std::net::{IpAddr, Ipv4Addr};

    use assert_matches::assert_matches;

    use super::*;

    fn peer(host: &str) -> Peer {
        Peer::new(host, [IpAddr::V4(Ipv4Addr::new(192, 168, 1, 25))]).with_registry_port(9797)
    }

    fn hosts(rr: &RoundRobin, n: usize) -> Vec<String> {
        (0..n).map(|_| rr.try_next().unwrap().host).collect()
    }

    #[test]
    fn test_cycles_in_insertion_order() {
        let rr: RoundRobin = ["a", "b", "c"].into_iter().map(peer).collect();

        assert_eq!(rr.size(), 3);
        assert_eq!(hosts(&rr, 4), ["a", "b", "c", "a"]);
    }

    #[test]
    fn test_empty_always_fails() {
        let rr = RoundRobin::new();

        assert_eq!(rr.size(), 0);
        for _ in 0..3 {
            assert_matches!(rr.try_next(), Err(RoutingError::NoPeersAvailable));
        }
        rr.remove(&peer("a"));
        assert_eq!(rr.size(), 0);
    }

    #[test]
    fn test_duplicate_host_first_wins() {
        let rr = RoundRobin::new();
        let first = peer("a");
        rr.add(first.clone());
        for _ in 0..3 {
            rr.add(Peer::new("a", []).with_registry_port(1));
        }

        assert_eq!(rr.size(), 1);
        assert_eq!(rr.try_next().unwrap(), first);
        assert_eq!(rr.peers(), vec![first]);
    }

    #[test]
    fn test_remove_absent_keeps_order() {
        let rr: RoundRobin = ["a", "b", "c"].into_iter().map(peer).collect();
        assert_eq!(hosts(&rr, 1), ["a"]);

        rr.remove(&peer("z"));

        assert_eq!(rr.size(), 3);
        assert_eq!(hosts(&rr, 3), ["b", "c", "a"]);
    }

    #[test]
    fn test_remove_at_cursor_skips_nothing() {
        let rr: RoundRobin = ["a", "b", "c"].into_iter().map(peer).collect();
        assert_eq!(hosts(&rr, 1), ["a"]);

        // b is next; the remaining cyclic order is c, a.
        rr.remove(&peer("b"));
        assert_eq!(hosts(&rr, 3), ["c", "a", "c"]);
    }

    #[test]
    fn test_remove_last_at_cursor_wraps() {
        let rr: RoundRobin = ["a", "b", "c"].into_iter().map(peer).collect();
        assert_eq!(hosts(&rr, 2), ["a", "b"]);

        rr.remove(&peer("c"));
        assert_eq!(hosts(&rr, 2), ["a", "b"]);
    }

    #[test]
    fn test_remove_before_cursor() {
        let rr: RoundRobin = ["a", "b", "c", "d"].into_iter().map(peer).collect();
        assert_eq!(hosts(&rr, 2), ["a", "b"]);

        rr.remove(&peer("a"));
        assert_eq!(hosts(&rr, 3), ["c", "d", "b"]);
    }

    #[test]
    fn test_remove_after_cursor() {
        let rr: RoundRobin = ["a", "b", "c", "d"].into_iter().map(peer).collect();
        assert_eq!(hosts(&rr, 1), ["a"]);

        rr.remove(&peer("d"));
        assert_eq!(hosts(&rr, 3), ["b", "c", "a"]);
    }

    #[test]
    fn test_remove_only_peer() {
        let rr = RoundRobin::new();
        let p = peer("test");
        rr.add(p.clone());
        assert_eq!(rr.try_next().unwrap(), p);

        rr.remove(&p);
        assert_eq!(rr.size(), 0);
        assert_matches!(rr.try_next(), Err(RoutingError::NoPeersAvailable));
    }

    #[tokio::test]
    async fn test_next_does_not_wait() {
        let rr = RoundRobin::new();
        assert_matches!(rr.next().await, Err(RoutingError::NoPeersAvailable));

        rr.add(peer("a"));
        assert_eq!(rr.next().await.unwrap().host, "a");
    }
}
