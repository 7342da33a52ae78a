//! Logging arguments and subscriber initialisation.

use clap::Args;
use eyre::Result;
use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::{Directive, LevelFilter};

/// Logging configuration.
#[derive(Debug, Args, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[command(next_help_heading = "Logging")]
#[serde(default)]
pub struct LogArgs {
    /// Silence all output except errors.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Verbose mode (-v, -vv, -vvv, etc.).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    #[serde(skip)]
    pub verbosity: u8,

    /// Log filter directive (e.g., "mirror_routing=trace").
    #[arg(long = "log.filter", value_name = "DIRECTIVE", global = true)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<String>,

    /// Use JSON format for log output.
    #[arg(long = "log.json", global = true)]
    pub json: bool,
}

impl LogArgs {
    /// Default level when `RUST_LOG` is unset: errors only with `--quiet`,
    /// otherwise info raised by each `-v`.
    pub fn level(&self) -> LevelFilter {
        if self.quiet {
            return LevelFilter::ERROR;
        }
        match self.verbosity {
            0 => LevelFilter::INFO,
            1 => LevelFilter::DEBUG,
            _ => LevelFilter::TRACE,
        }
    }

    /// Extra directives from `--log.filter`; malformed entries are skipped.
    fn directives(&self) -> impl Iterator<Item = Directive> + '_ {
        self.filter
            .iter()
            .flat_map(|filter| filter.split(','))
            .filter_map(|directive| directive.parse().ok())
    }

    /// `--quiet` ignores `RUST_LOG` and `--log.filter` entirely. Otherwise
    /// `RUST_LOG` wins over [`LogArgs::level`] and `--log.filter` is layered on
    /// top.
    pub fn env_filter(&self) -> EnvFilter {
        if self.quiet {
            return EnvFilter::default().add_directive(self.level().into());
        }
        let filter = EnvFilter::builder()
            .with_default_directive(self.level().into())
            .from_env_lossy();
        self.directives().fold(filter, EnvFilter::add_directive)
    }
}

/// Installs the global tracing subscriber.
pub fn init_logging(args: &LogArgs) -> Result<()> {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(args.env_filter())
        .with_writer(std::io::stderr);

    if args.json {
        builder
            .json()
            .try_init()
            .map_err(|err| eyre::eyre!("failed to install logger: {err}"))
    } else {
        builder
            .try_init()
            .map_err(|err| eyre::eyre!("failed to install logger: {err}"))
    }
}
