//! Balancer decorator that waits for peers instead of failing on an empty set.

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;
use tracing::trace;

use super::Balancer;
use crate::error::RoutingError;
use crate::peer::Peer;

/// Wraps a [`Balancer`] so that [`Balancer::next`] suspends until a peer is
/// added or the wrapper is closed.
///
/// Waiter registration and the emptiness check happen under the same lock that
/// [`Balancer::add`] takes to wake waiters, so a wake-up can never fall between
/// the two. There is no built-in timeout: callers bound the wait themselves by
/// dropping the `next()` future, wrapping it in `tokio::time::timeout`, or
/// closing the balancer.
#[derive(Debug)]
pub struct ClosableBalancer<B> {
    balancer: B,
    /// Pending waiters, fired and cleared on every add.
    waiters: Mutex<Vec<oneshot::Sender<()>>>,
    closed: CancellationToken,
}

impl<B: Balancer> ClosableBalancer<B> {
    pub fn new(balancer: B) -> Self {
        Self::with_token(balancer, CancellationToken::new())
    }

    /// Closes automatically when `parent` is cancelled.
    pub fn with_parent(balancer: B, parent: &CancellationToken) -> Self {
        Self::with_token(balancer, parent.child_token())
    }

    fn with_token(balancer: B, closed: CancellationToken) -> Self {
        Self {
            balancer,
            waiters: Mutex::new(Vec::new()),
            closed,
        }
    }

    /// Releases every blocked and future `next()` call waiting on an empty
    /// set. Calling it again has no further effect.
    pub fn close(&self) {
        self.closed.cancel();
    }

    pub fn is_closed(&self) -> bool {
        self.closed.is_cancelled()
    }
}

#[async_trait]
impl<B: Balancer> Balancer for ClosableBalancer<B> {
    async fn next(&self) -> Result<Peer, RoutingError> {
        loop {
            let woken = {
                let mut waiters = self.waiters.lock();
                match self.balancer.try_next() {
                    Err(RoutingError::NoPeersAvailable) if !self.closed.is_cancelled() => {
                        waiters.retain(|tx| !tx.is_closed());
                        let (tx, rx) = oneshot::channel();
                        waiters.push(tx);
                        rx
                    }
                    result => return result,
                }
            };

            trace!("waiting for a peer to be added");
            tokio::select! {
                biased;
                () = self.closed.cancelled() => return Err(RoutingError::NoPeersAvailable),
                // Another caller may take the new peer first; retry either way.
                _ = woken => {}
            }
        }
    }

    fn try_next(&self) -> Result<Peer, RoutingError> {
        self.balancer.try_next()
    }

    fn size(&self) -> usize {
        self.balancer.size()
    }

    fn add(&self, peer: Peer) {
        let mut waiters = self.waiters.lock();
        self.balancer.add(peer);
        if waiters.is_empty() {
            return;
        }
        trace!(waiters = waiters.len(), "waking waiters");
        for tx in waiters.drain(..) {
            let _ = tx.send(());
        }
    }

    fn remove(&self, peer: &Peer) {
        self.balancer.remove(peer);
    }
}
