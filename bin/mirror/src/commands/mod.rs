//! Subcommand implementations.

pub(crate) mod dial;
pub(crate) mod lookup;
