use std::fmt;
use std::net::IpAddr;

use thiserror::Error;

/// Errors returned by a connection race.
#[derive(Debug, Error)]
pub enum RaceError<E> {
    #[error("empty list of addresses")]
    EmptyAddressList,
    /// The caller's token was cancelled before any attempt succeeded.
    #[error("connection race cancelled")]
    Cancelled,
    /// The race's overall timeout elapsed before any attempt succeeded.
    #[error("connection race deadline exceeded")]
    DeadlineExceeded,
    #[error("all connection attempts failed: {0}")]
    AllAttemptsFailed(AttemptErrors<E>),
}

/// Failure of a single attempt.
#[derive(Debug, Error)]
pub enum AttemptError<E> {
    #[error("dial {addr}: {error}")]
    Dial { addr: IpAddr, error: E },
    /// Stopped because another attempt connected first.
    #[error("dial {addr}: cancelled")]
    Cancelled { addr: IpAddr },
}

impl<E> AttemptError<E> {
    pub fn addr(&self) -> IpAddr {
        match self {
            Self::Dial { addr, .. } | Self::Cancelled { addr } => *addr,
        }
    }
}

/// Every attempt failure of a race, in the order they were reported.
#[derive(Debug)]
pub struct AttemptErrors<E>(Vec<AttemptError<E>>);

impl<E> AttemptErrors<E> {
    pub(crate) fn new(errors: Vec<AttemptError<E>>) -> Self {
        Self(errors)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &AttemptError<E>> {
        self.0.iter()
    }

    pub fn into_inner(self) -> Vec<AttemptError<E>> {
        self.0
    }
}

impl<E: fmt::Display> fmt::Display for AttemptErrors<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, err) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("\n")?;
            }
            write!(f, "{err}")?;
        }
        Ok(())
    }
}
