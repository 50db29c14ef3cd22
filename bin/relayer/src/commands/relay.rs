//! The long-running relay roles.

use crate::flags::GlobalArgs;
use anyhow::Result;
use std::sync::Arc;
use strait_service::{ChainWatcher, ProofFulfiller, RelayService};
use tokio_util::sync::CancellationToken;

/// The relay roles hosted by one process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Roles {
    /// Run the [`ChainWatcher`].
    pub(crate) watch: bool,
    /// Run the [`ProofFulfiller`].
    pub(crate) fulfill: bool,
}

impl Roles {
    /// Only the [`ChainWatcher`].
    pub(crate) const WATCH: Self = Self { watch: true, fulfill: false };
    /// Only the [`ProofFulfiller`].
    pub(crate) const FULFILL: Self = Self { watch: false, fulfill: true };
    /// Both roles.
    pub(crate) const ALL: Self = Self { watch: true, fulfill: true };

    /// Runs the roles until `cancellation` fires or one of them fails.
    pub(crate) async fn run(self, global: &GlobalArgs, cancellation: CancellationToken) -> Result<()> {
        let config = global.relay_config()?;
        let source = Arc::new(global.source());
        let (bridge, poller) = global.bridge(&config).await?;

        let mut service = RelayService::new(cancellation.clone());
        if self.watch {
            let watcher = ChainWatcher::new(
                Arc::clone(&source),
                Arc::clone(&bridge),
                poller.clone(),
                cancellation.clone(),
            )
            .with_cool_down(config.cool_down);
            service.spawn("chain_watcher", watcher);
        }
        if self.fulfill {
            service.spawn("proof_fulfiller", ProofFulfiller::new(source, bridge, poller, cancellation));
        }

        tracing::info!(
            target: "relayer",
            watch = self.watch,
            fulfill = self.fulfill,
            source = %config.source_endpoint,
            destination = %config.destination_endpoint,
            "Relay started"
        );
        service.run().await?;
        tracing::info!(target: "relayer", "Relay stopped");
        Ok(())
    }
}
