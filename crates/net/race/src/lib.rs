//! Connection racing across the addresses of a single destination.
//!
//! [`happy_eyeballs`] dials every candidate address with a staggered start,
//! preferring IPv6, and returns the first attempt to succeed. Losing attempts
//! are cancelled as soon as any attempt reports a live connection through
//! [`Attempt::established`].

mod error;
mod happy_eyeballs;
mod tcp;

pub use error::{AttemptError, AttemptErrors, RaceError};
pub use happy_eyeballs::{Attempt, DEFAULT_ATTEMPT_DELAY, HappyEyeballs, happy_eyeballs};
