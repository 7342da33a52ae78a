//! Staggered racing of candidate addresses.

use std::future::Future;
use std::net::IpAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::{Instant, sleep_until, timeout_at};
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use crate::error::{AttemptError, AttemptErrors, RaceError};

/// Delay between the start of consecutive attempts.
pub const DEFAULT_ATTEMPT_DELAY: Duration = Duration::from_millis(15);

/// Marks that no attempt has connected yet.
const NOT_CONNECTED: usize = usize::MAX;

/// Race configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HappyEyeballs {
    attempt_delay: Duration,
    timeout: Option<Duration>,
}

impl Default for HappyEyeballs {
    fn default() -> Self {
        Self {
            attempt_delay: DEFAULT_ATTEMPT_DELAY,
            timeout: None,
        }
    }
}

/// Sibling tokens of one race.
#[derive(Debug)]
struct RaceScope {
    tokens: Vec<CancellationToken>,
    connected: AtomicUsize,
}

/// Handle passed to the dial callback for one attempt.
#[derive(Debug, Clone)]
pub struct Attempt {
    index: usize,
    token: CancellationToken,
    scope: Arc<RaceScope>,
}

impl Attempt {
    fn new(index: usize, scope: Arc<RaceScope>) -> Self {
        let token = scope
            .tokens
            .get(index)
            .cloned()
            .unwrap_or_else(CancellationToken::new);
        Self {
            index,
            token,
            scope,
        }
    }

    /// Position of this attempt in launch order.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Cancelled when the caller gives up, the race is decided, or another
    /// attempt connects first.
    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// Signals that this attempt holds a live connection, cancelling every
    /// other attempt even before this one returns.
    ///
    /// Only the first attempt to connect cancels its siblings; returns whether
    /// this attempt was that one.
    pub fn established(&self) -> bool {
        let claimed = self
            .scope
            .connected
            .compare_exchange(NOT_CONNECTED, self.index, Ordering::AcqRel, Ordering::Acquire)
            .is_ok();
        if !claimed {
            return false;
        }

        debug!(attempt = self.index, "connection established, cancelling siblings");
        for (i, token) in self.scope.tokens.iter().enumerate() {
            if i != self.index {
                token.cancel();
            }
        }
        true
    }
}

impl HappyEyeballs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_attempt_delay(mut self, delay: Duration) -> Self {
        self.attempt_delay = delay;
        self
    }

    /// Bounds the whole race, including the dial of a single address.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn attempt_delay(&self) -> Duration {
        self.attempt_delay
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Dials `addrs` and returns the first successful result.
    ///
    /// IPv6 addresses are tried before IPv4 ones, keeping their relative order.
    /// Attempt `i` starts `i * attempt_delay` after the first. Each attempt runs
    /// as its own task and is dropped as soon as its token is cancelled, so a
    /// callback that never looks at [`Attempt::token`] still stops promptly.
    /// Cancelling `cancel` fails the race with [`RaceError::Cancelled`].
    ///
    /// A single address is dialed without any stagger, but its failure is still
    /// reported as [`RaceError::AllAttemptsFailed`] holding one entry.
    pub async fn race<T, E, F, Fut>(
        &self,
        cancel: &CancellationToken,
        addrs: &[IpAddr],
        dial: F,
    ) -> Result<T, RaceError<E>>
    where
        F: Fn(Attempt, IpAddr) -> Fut,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
        T: Send + 'static,
        E: Send + 'static,
    {
        if addrs.is_empty() {
            return Err(RaceError::EmptyAddressList);
        }

        let race = self.run(cancel, addrs, dial);
        match self.timeout {
            Some(timeout) => match timeout_at(Instant::now() + timeout, race).await {
                Ok(result) => result,
                Err(_) => {
                    debug!(?timeout, "connection race timed out");
                    Err(RaceError::DeadlineExceeded)
                }
            },
            None => race.await,
        }
    }

    async fn run<T, E, F, Fut>(
        &self,
        cancel: &CancellationToken,
        addrs: &[IpAddr],
        dial: F,
    ) -> Result<T, RaceError<E>>
    where
        F: Fn(Attempt, IpAddr) -> Fut,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
        T: Send + 'static,
        E: Send + 'static,
    {
        // Cancels every attempt once the race returns, however it returns.
        let race = cancel.child_token();
        let _guard = race.clone().drop_guard();

        let addrs = prefer_ipv6(addrs);
        let scope = Arc::new(RaceScope {
            tokens: addrs.iter().map(|_| race.child_token()).collect(),
            connected: AtomicUsize::new(NOT_CONNECTED),
        });

        if let [addr] = addrs.as_slice() {
            let addr = *addr;
            let attempt = Attempt::new(0, Arc::clone(&scope));
            return tokio::select! {
                biased;
                () = cancel.cancelled() => Err(RaceError::Cancelled),
                result = dial(attempt, addr) => result.map_err(|error| {
                    RaceError::AllAttemptsFailed(AttemptErrors::new(vec![AttemptError::Dial {
                        addr,
                        error,
                    }]))
                }),
            };
        }

        let total = addrs.len();
        let (tx, mut rx) = mpsc::channel(total);
        let launch = |index: usize, addr: IpAddr| {
            let attempt = Attempt::new(index, Arc::clone(&scope));
            let token = attempt.token();
            let fut = dial(attempt, addr);
            let tx = tx.clone();
            trace!(attempt = index, %addr, "starting attempt");
            tokio::spawn(async move {
                let result = tokio::select! {
                    biased;
                    () = token.cancelled() => Err(AttemptError::Cancelled { addr }),
                    result = fut => result.map_err(|error| AttemptError::Dial { addr, error }),
                };
                // Capacity covers every attempt, so this never waits; a closed
                // channel means the race already returned.
                let _ = tx.try_send(result);
            });
        };

        let mut pending = addrs.iter().copied().enumerate();
        if let Some((index, addr)) = pending.next() {
            launch(index, addr);
        }
        let mut next_launch = Instant::now() + self.attempt_delay;
        let mut launched = 1;
        let mut failures = Vec::with_capacity(total);

        loop {
            tokio::select! {
                biased;
                () = cancel.cancelled() => {
                    debug!("connection race cancelled by caller");
                    return Err(RaceError::Cancelled);
                }
                Some(result) = rx.recv() => match result {
                    Ok(value) => return Ok(value),
                    Err(failure) => {
                        trace!(addr = %failure.addr(), "attempt failed");
                        failures.push(failure);
                        if failures.len() == total {
                            debug!(attempts = total, "every connection attempt failed");
                            return Err(RaceError::AllAttemptsFailed(AttemptErrors::new(failures)));
                        }
                    }
                },
                () = sleep_until(next_launch), if launched < total => {
                    if let Some((index, addr)) = pending.next() {
                        launch(index, addr);
                    }
                    launched += 1;
                    next_launch += self.attempt_delay;
                }
            }
        }
    }
}

/// Races `addrs` with the default configuration.
pub async fn happy_eyeballs<T, E, F, Fut>(
    cancel: &CancellationToken,
    addrs: &[IpAddr],
    dial: F,
) -> Result<T, RaceError<E>>
where
    F: Fn(Attempt, IpAddr) -> Fut,
    Fut: Future<Output = Result<T, E>> + Send + 'static,
    T: Send + 'static,
    E: Send + 'static,
{
    HappyEyeballs::default().race(cancel, addrs, dial).await
}

/// Stable partition placing IPv6 addresses ahead of IPv4 ones.
fn prefer_ipv6(addrs: &[IpAddr]) -> Vec<IpAddr> {
    let (mut v6, v4): (Vec<IpAddr>, Vec<IpAddr>) = addrs.iter().partition(|ip| ip.is_ipv6());
    v6.extend(v4);
    v6
}
