//! Command-line interface.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use eyre::Result;
use mirror_observability::LogArgs;

use crate::commands;

/// Inspect a mirror routing table and race connections to its peers.
#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
pub(crate) struct Cli {
    /// Logging configuration (applies to all subcommands).
    #[command(flatten)]
    pub(crate) logs: LogArgs,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub(crate) command: Commands,
}

impl Cli {
    pub(crate) async fn run(self) -> Result<()> {
        match self.command {
            Commands::Lookup(args) => commands::lookup::run(args).await,
            Commands::Dial(args) => commands::dial::run(args).await,
        }
    }
}

#[derive(Debug, Subcommand)]
pub(crate) enum Commands {
    /// Print the peers serving a key in round-robin order.
    Lookup(LookupArgs),

    /// Connect to the first reachable peer serving a key.
    Dial(DialArgs),
}

/// Routing table location.
#[derive(Debug, Args, Clone)]
pub(crate) struct RoutesArgs {
    /// TOML file describing this node and the peers known per key.
    #[arg(long, env = "MIRROR_ROUTES", value_name = "FILE")]
    pub(crate) routes: PathBuf,
}

#[derive(Debug, Args)]
pub(crate) struct LookupArgs {
    #[command(flatten)]
    pub(crate) routes: RoutesArgs,

    /// Content key to resolve.
    #[arg(long)]
    pub(crate) key: String,

    /// Number of peers the caller intends to use.
    #[arg(long, default_value_t = 0)]
    pub(crate) count: usize,
}

#[derive(Debug, Args)]
pub(crate) struct DialArgs {
    #[command(flatten)]
    pub(crate) routes: RoutesArgs,

    /// Content key to resolve.
    #[arg(long)]
    pub(crate) key: String,

    /// Delay between the start of consecutive address attempts.
    #[arg(long = "attempt-delay", default_value_t = 15, value_name = "MS")]
    pub(crate) attempt_delay_ms: u64,

    /// Give up on a peer after this long.
    #[arg(long = "timeout", value_name = "MS")]
    pub(crate) timeout_ms: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_dial() {
        let cli = Cli::try_parse_from([
            "mirror", "-v", "dial", "--routes", "routes.toml", "--key", "k", "--timeout", "500",
        ])
        .unwrap();

        assert_eq!(cli.logs.verbosity, 1);
        let Commands::Dial(args) = cli.command else {
            panic!("expected dial");
        };
        assert_eq!(args.key, "k");
        assert_eq!(args.attempt_delay_ms, 15);
        assert_eq!(args.timeout_ms, Some(500));
    }

    #[test]
    fn test_parse_lookup() {
        let cli =
            Cli::try_parse_from(["mirror", "lookup", "--routes", "r.toml", "--key", "k"]).unwrap();
        let Commands::Lookup(args) = cli.command else {
            panic!("expected lookup");
        };
        assert_eq!(args.count, 0);
        assert_eq!(args.routes.routes, PathBuf::from("r.toml"));
    }
}
