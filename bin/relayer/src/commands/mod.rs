//! Contains the relayer subcommands.

use crate::flags::GlobalArgs;
use anyhow::Result;
use clap::Subcommand;
use tokio_util::sync::CancellationToken;

mod header;
pub(crate) use header::HeaderCommand;

mod relay;
pub(crate) use relay::Roles;

mod request;
pub(crate) use request::RequestCommand;

/// The relayer subcommands.
#[derive(Subcommand, Clone, Debug)]
pub(crate) enum Commands {
    /// Relays new source chain heads onto the bridge contract until Ctrl-C.
    Watch,
    /// Answers storage proof requests logged on the bridge contract until Ctrl-C.
    Fulfill,
    /// Runs `watch` and `fulfill` in one process.
    Run,
    /// Logs storage proof requests and waits for their resolution.
    Request(RequestCommand),
    /// Prints the canonical encoding of a source chain block header.
    Header(HeaderCommand),
}

impl Commands {
    /// Runs the subcommand until it completes or `cancellation` fires.
    pub(crate) async fn run(self, global: &GlobalArgs, cancellation: CancellationToken) -> Result<()> {
        match self {
            Self::Watch => Roles::WATCH.run(global, cancellation).await,
            Self::Fulfill => Roles::FULFILL.run(global, cancellation).await,
            Self::Run => Roles::ALL.run(global, cancellation).await,
            Self::Request(request) => request.run(global, cancellation).await,
            Self::Header(header) => header.run(global).await,
        }
    }
}
