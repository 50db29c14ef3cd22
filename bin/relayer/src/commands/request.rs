//! Storage proof requests.

use crate::flags::GlobalArgs;
use alloy_primitives::{Address, U256};
use anyhow::{Context, Result, bail};
use clap::{ArgGroup, Args};
use std::time::Duration;
use strait_poller::EventLog;
use strait_service::{BridgeContract, Outcome, RequestClient};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_util::sync::CancellationToken;

/// Logs storage proof requests on the bridge contract and waits for each to be resolved.
///
/// A single request is given with `--account`, `--key` and `--block`. With `--stdin`, one request
/// is read per line as `<account> <key> <block>`; blank lines and lines starting with `#` are
/// skipped.
#[derive(Args, Clone, Debug)]
#[command(group(ArgGroup::new("input").required(true).args(["block", "stdin"])))]
pub(crate) struct RequestCommand {
    /// The source chain account whose storage is proven.
    #[arg(long, requires_all = ["key", "block"], conflicts_with = "stdin")]
    pub(crate) account: Option<Address>,
    /// The storage slot, decimal or `0x`-prefixed hex.
    #[arg(long, requires_all = ["account", "block"], conflicts_with = "stdin")]
    pub(crate) key: Option<U256>,
    /// The source chain block the proof refers to.
    #[arg(long, requires_all = ["account", "key"], conflicts_with = "stdin")]
    pub(crate) block: Option<u64>,
    /// Read requests from stdin, one per line.
    #[arg(long)]
    pub(crate) stdin: bool,
    /// Seconds to wait for each resolution. Waits indefinitely when unset.
    #[arg(long)]
    pub(crate) timeout: Option<u64>,
}

impl RequestCommand {
    /// Runs the `request` subcommand.
    pub(crate) async fn run(self, global: &GlobalArgs, cancellation: CancellationToken) -> Result<()> {
        let config = global.relay_config()?;
        let (bridge, poller) = global.bridge(&config).await?;
        let client = RequestClient::new(bridge, poller, cancellation.clone());
        let timeout = self.timeout.map(Duration::from_secs);

        if !self.stdin {
            let (Some(account), Some(key), Some(block)) = (self.account, self.key, self.block)
            else {
                bail!("--account, --key and --block are required without --stdin");
            };
            return submit(&client, account, key, block, timeout).await;
        }

        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        while let Some(line) = lines.next_line().await? {
            let request = match parse_request_line(&line) {
                Ok(Some(request)) => request,
                Ok(None) => continue,
                Err(err) => {
                    tracing::warn!(target: "relayer", %err, line, "Skipping malformed request");
                    continue;
                }
            };
            let (account, key, block) = request;
            if let Err(err) = submit(&client, account, key, block, timeout).await {
                if cancellation.is_cancelled() {
                    break;
                }
                tracing::error!(target: "relayer", ?err, %account, %key, block, "Request failed");
            }
        }
        Ok(())
    }
}

async fn submit<B: BridgeContract, L: EventLog>(
    client: &RequestClient<B, L>,
    account: Address,
    key: U256,
    block: u64,
    timeout: Option<Duration>,
) -> Result<()> {
    match client.submit(account, key, block, timeout).await? {
        Outcome::Served { request_id, result } => {
            println!("request {request_id}: served, result {result}");
        }
        Outcome::NotFound { request_id } => {
            println!("request {request_id}: block {block} not found on the bridge contract");
        }
    }
    Ok(())
}

/// Parses an `<account> <key> <block>` line. Returns `None` for blank and comment lines.
fn parse_request_line(line: &str) -> Result<Option<(Address, U256, u64)>> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }

    let parts: Vec<&str> = line.split_whitespace().collect();
    let [account, key, block] = parts[..] else {
        bail!("expected `<account> <key> <block>`, got {} fields", parts.len());
    };
    let account = account.parse::<Address>().context("invalid account")?;
    let key = key.parse::<U256>().context("invalid key")?;
    let block = block.parse::<u64>().context("invalid block")?;
    Ok(Some((account, key, block)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_parse_request_line() {
        let parsed =
            parse_request_line("0x00000000000000000000000000000000000000aa 0x07 100").unwrap();
        assert_eq!(parsed, Some((Address::with_last_byte(0xaa), U256::from(7), 100)));
    }

    #[rstest]
    #[case("")]
    #[case("   ")]
    #[case("# account key block")]
    fn test_skipped_lines(#[case] line: &str) {
        assert_eq!(parse_request_line(line).unwrap(), None);
    }

    #[rstest]
    #[case("0x00000000000000000000000000000000000000aa 7")]
    #[case("0x00000000000000000000000000000000000000aa 7 100 extra")]
    #[case("not-an-address 7 100")]
    #[case("0x00000000000000000000000000000000000000aa 7 latest")]
    fn test_malformed_lines(#[case] line: &str) {
        assert!(parse_request_line(line).is_err());
    }
}
