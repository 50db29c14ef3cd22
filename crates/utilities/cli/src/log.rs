//! Logging flags and the tracing subscriber setup.

use clap::{ArgAction, Args, ValueEnum};
use tracing_subscriber::{
    EnvFilter,
    filter::LevelFilter,
    util::{SubscriberInitExt, TryInitError},
};

use crate::CliResult;

/// The output format of log lines.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Multi-field human readable lines.
    #[default]
    Full,
    /// Shorter human readable lines.
    Compact,
    /// One JSON object per line.
    Json,
}

/// Logging flags.
#[derive(Args, Debug, Default, Clone, PartialEq, Eq)]
pub struct LogArgs {
    /// Verbosity level. Repeat to log more: `-v` info, `-vv` debug, `-vvv` trace.
    #[arg(short = 'v', long = "verbosity", action = ArgAction::Count, global = true)]
    pub v: u8,
    /// The log line format.
    #[arg(
        long = "log.format",
        value_enum,
        default_value_t = LogFormat::Full,
        global = true,
        env = "STRAIT_LOG_FORMAT"
    )]
    pub format: LogFormat,
}

impl LogArgs {
    /// Returns the level enabled by the verbosity flag.
    pub const fn level(&self) -> LevelFilter {
        match self.v {
            0 => LevelFilter::WARN,
            1 => LevelFilter::INFO,
            2 => LevelFilter::DEBUG,
            _ => LevelFilter::TRACE,
        }
    }

    /// Installs the global tracing subscriber. `RUST_LOG` directives take precedence over the
    /// verbosity flag.
    pub fn init_tracing_subscriber(&self) -> CliResult<()> {
        let filter =
            EnvFilter::builder().with_default_directive(self.level().into()).from_env_lossy();
        init_tracing_subscriber(self.format, filter)?;
        Ok(())
    }
}

/// Installs a global fmt subscriber writing `format` lines through `filter`.
pub fn init_tracing_subscriber(format: LogFormat, filter: EnvFilter) -> Result<(), TryInitError> {
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match format {
        LogFormat::Full => builder.finish().try_init(),
        LogFormat::Compact => builder.compact().finish().try_init(),
        LogFormat::Json => builder.json().finish().try_init(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use rstest::rstest;

    #[derive(Parser, Debug)]
    struct TestCli {
        #[command(flatten)]
        log: LogArgs,
    }

    #[rstest]
    #[case(&["test"], LevelFilter::WARN)]
    #[case(&["test", "-v"], LevelFilter::INFO)]
    #[case(&["test", "-vv"], LevelFilter::DEBUG)]
    #[case(&["test", "-vvv"], LevelFilter::TRACE)]
    #[case(&["test", "-vvvvv"], LevelFilter::TRACE)]
    fn test_verbosity_levels(#[case] args: &[&str], #[case] expected: LevelFilter) {
        let cli = TestCli::try_parse_from(args).unwrap();
        assert_eq!(cli.log.level(), expected);
    }

    #[rstest]
    #[case("full", LogFormat::Full)]
    #[case("compact", LogFormat::Compact)]
    #[case("json", LogFormat::Json)]
    fn test_log_format(#[case] value: &str, #[case] expected: LogFormat) {
        let cli = TestCli::try_parse_from(["test", "--log.format", value]).unwrap();
        assert_eq!(cli.log.format, expected);
    }

    #[test]
    fn test_unknown_log_format_is_rejected() {
        assert!(TestCli::try_parse_from(["test", "--log.format", "xml"]).is_err());
    }
}
