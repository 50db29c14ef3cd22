//! Header inspection.

use crate::flags::GlobalArgs;
use anyhow::{Context, Result};
use clap::Args;
use strait_codec::CanonicalHeader;
use strait_service::SourceChain;

/// Prints the canonical encoding of a source chain block header, and whether it hashes to the
/// block hash.
#[derive(Args, Clone, Debug)]
pub(crate) struct HeaderCommand {
    /// The source chain block number.
    #[arg(long)]
    pub(crate) block: u64,
}

impl HeaderCommand {
    /// Runs the `header` subcommand.
    pub(crate) async fn run(self, global: &GlobalArgs) -> Result<()> {
        let raw = global
            .source()
            .raw_header(self.block)
            .await
            .with_context(|| format!("Failed to fetch block {}", self.block))?;
        let header = CanonicalHeader::encode(&raw)?;
        let fields = header.fields()?;

        println!("block:        {}", raw.number());
        println!("hash:         {}", header.block_hash);
        println!("schema:       {} ({} fields)", raw.schema()?, fields.len());
        println!("encoded:      {}", header.encoded);
        println!("content hash: {}", header.content_hash());
        println!("hash matches: {}", header.hash_matches());
        Ok(())
    }
}
