//! Logging setup shared by the mirror binaries.

mod logging;

pub use logging::{LogArgs, init_logging};
