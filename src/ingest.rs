/// Boundary with the paginated event sources (subgraphs, indexers, RPC)
///
/// Sources hand back raw JSON pages; this module walks the pages, decodes
/// them into the typed events and assembles a `ChainDataset`. A chain is
/// either fetched completely or not at all.

use std::fmt;
use std::future::Future;

use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use prizeflow_core::{Chain, ChainDataset, TimedEvent};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Deposits,
    Withdrawals,
    Claims,
    DelegationsCreated,
    DelegationsFunded,
    DelegationsUpdated,
    DelegationsWithdrawn,
    Yields,
    Balances,
    Draws,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Deposits => "deposits",
            EventKind::Withdrawals => "withdrawals",
            EventKind::Claims => "claims",
            EventKind::DelegationsCreated => "delegations_created",
            EventKind::DelegationsFunded => "delegations_funded",
            EventKind::DelegationsUpdated => "delegations_updated",
            EventKind::DelegationsWithdrawn => "delegations_withdrawn",
            EventKind::Yields => "yields",
            EventKind::Balances => "balances",
            EventKind::Draws => "draws",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Fetching {category} on {chain} failed at page {page}: {reason}")]
    Page {
        chain: Chain,
        category: EventKind,
        page: u32,
        reason: String,
    },
    #[error("Malformed {category} record on {chain} at page {page}: {source}")]
    Decode {
        chain: Chain,
        category: EventKind,
        page: u32,
        #[source]
        source: serde_json::Error,
    },
    #[error("Source for {category} on {chain} did not advance past page {page}")]
    Stalled {
        chain: Chain,
        category: EventKind,
        page: u32,
    },
}

/// One page of raw records and the index of the page after it, if any
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Page {
    pub items: Vec<Value>,
    pub next: Option<u32>,
}

pub trait PagedEventSource: Sync {
    fn fetch_page(
        &self,
        chain: Chain,
        category: EventKind,
        page: u32,
    ) -> impl Future<Output = anyhow::Result<Page>> + Send;
}

/// Walk every page of one category, starting at page 0.
///
/// Page indices must strictly increase; a source pointing back at an
/// earlier page is reported as stalled instead of looping forever.
#[instrument(skip(source))]
pub async fn collect_all_pages<S, T>(
    source: &S,
    chain: Chain,
    category: EventKind,
) -> Result<Vec<T>, FetchError>
where
    S: PagedEventSource,
    T: DeserializeOwned,
{
    let mut records = Vec::new();
    let mut page = 0u32;

    loop {
        let fetched = source
            .fetch_page(chain, category, page)
            .await
            .map_err(|e| {
                warn!(%chain, %category, page, error = %e, "Page fetch failed, aborting chain fetch");
                FetchError::Page {
                    chain,
                    category,
                    page,
                    reason: format!("{e:#}"),
                }
            })?;

        for item in fetched.items {
            let record = serde_json::from_value(item).map_err(|source| FetchError::Decode {
                chain,
                category,
                page,
                source,
            })?;
            records.push(record);
        }

        match fetched.next {
            None => break,
            Some(next) if next <= page => {
                return Err(FetchError::Stalled {
                    chain,
                    category,
                    page,
                })
            }
            Some(next) => page = next,
        }
    }

    debug!(records = records.len(), last_page = page, "Collected category");
    Ok(records)
}

/// Highest block and timestamp span seen across the fetched events
#[derive(Debug, Default)]
struct Observed {
    last_block: u64,
    min_timestamp: Option<i64>,
    max_timestamp: Option<i64>,
}

impl Observed {
    fn observe<E: TimedEvent>(&mut self, events: &[E]) {
        for event in events {
            self.last_block = self.last_block.max(event.block_number());
            if let Some(ts) = event.timestamp() {
                self.min_timestamp = Some(self.min_timestamp.map_or(ts, |m| m.min(ts)));
                self.max_timestamp = Some(self.max_timestamp.map_or(ts, |m| m.max(ts)));
            }
        }
    }
}

/// Fetch every category of one chain into a dataset
#[instrument(skip(source))]
pub async fn fetch_chain_dataset<S: PagedEventSource>(
    source: &S,
    chain: Chain,
) -> Result<ChainDataset, FetchError> {
    let mut dataset = ChainDataset::empty(chain);

    dataset.deposits = collect_all_pages(source, chain, EventKind::Deposits).await?;
    dataset.withdrawals = collect_all_pages(source, chain, EventKind::Withdrawals).await?;
    dataset.claims = collect_all_pages(source, chain, EventKind::Claims).await?;
    dataset.delegations_created = collect_all_pages(source, chain, EventKind::DelegationsCreated).await?;
    dataset.delegations_funded = collect_all_pages(source, chain, EventKind::DelegationsFunded).await?;
    dataset.delegations_updated = collect_all_pages(source, chain, EventKind::DelegationsUpdated).await?;
    dataset.delegations_withdrawn =
        collect_all_pages(source, chain, EventKind::DelegationsWithdrawn).await?;
    dataset.yields = collect_all_pages(source, chain, EventKind::Yields).await?;
    dataset.balances = collect_all_pages(source, chain, EventKind::Balances).await?;
    dataset.draws = collect_all_pages(source, chain, EventKind::Draws).await?;

    let mut observed = Observed::default();
    observed.observe(&dataset.deposits);
    observed.observe(&dataset.withdrawals);
    observed.observe(&dataset.claims);
    observed.observe(&dataset.delegations_created);
    observed.observe(&dataset.delegations_funded);
    observed.observe(&dataset.delegations_updated);
    observed.observe(&dataset.delegations_withdrawn);
    observed.observe(&dataset.yields);
    dataset.last_queried_block = observed.last_block;
    dataset.min_timestamp = observed.min_timestamp;
    dataset.max_timestamp = observed.max_timestamp;

    info!(
        deposits = dataset.deposits.len(),
        withdrawals = dataset.withdrawals.len(),
        claims = dataset.claims.len(),
        last_block = dataset.last_queried_block,
        "Fetched chain dataset"
    );
    Ok(dataset)
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;
    use prizeflow_core::Deposit;
    use serde_json::json;
    use std::collections::HashMap;

    #[derive(Default)]
    struct MockSource {
        pages: HashMap<(EventKind, u32), Page>,
        failing: Option<(EventKind, u32)>,
    }

    impl PagedEventSource for MockSource {
        async fn fetch_page(&self, _chain: Chain, category: EventKind, page: u32) -> anyhow::Result<Page> {
            if self.failing == Some((category, page)) {
                return Err(anyhow!("connection reset"));
            }
            Ok(self.pages.get(&(category, page)).cloned().unwrap_or_default())
        }
    }

    fn deposit_json(wallet: &str, ts: i64, block: u64) -> Value {
        json!({
            "tx_hash": format!("0x{wallet}{ts}"),
            "block_number": block,
            "timestamp": ts,
            "wallet": wallet,
            "amount": 10.0
        })
    }

    fn two_page_source() -> MockSource {
        let mut source = MockSource::default();
        source.pages.insert(
            (EventKind::Deposits, 0),
            Page {
                items: vec![deposit_json("a", 100, 7)],
                next: Some(1),
            },
        );
        source.pages.insert(
            (EventKind::Deposits, 1),
            Page {
                items: vec![deposit_json("b", 300, 9)],
                next: None,
            },
        );
        source
    }

    #[tokio::test]
    async fn test_pages_are_concatenated_in_order() {
        let source = two_page_source();
        let deposits: Vec<Deposit> = collect_all_pages(&source, Chain::Base, EventKind::Deposits)
            .await
            .unwrap();
        let wallets: Vec<&str> = deposits.iter().map(|d| d.wallet.as_str()).collect();
        assert_eq!(wallets, vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_failed_page_fails_whole_fetch() {
        let mut source = two_page_source();
        source.failing = Some((EventKind::Deposits, 1));

        let err = fetch_chain_dataset(&source, Chain::Optimism).await.unwrap_err();
        match err {
            FetchError::Page {
                chain,
                category,
                page,
                reason,
            } => {
                assert_eq!(chain, Chain::Optimism);
                assert_eq!(category, EventKind::Deposits);
                assert_eq!(page, 1);
                assert!(reason.contains("connection reset"));
            }
            other => panic!("unexpected error {other}"),
        }
    }

    #[tokio::test]
    async fn test_malformed_record_is_reported() {
        let mut source = MockSource::default();
        source.pages.insert(
            (EventKind::Withdrawals, 0),
            Page {
                items: vec![json!({ "wallet": "a" })],
                next: None,
            },
        );
        let err = fetch_chain_dataset(&source, Chain::Arbitrum).await.unwrap_err();
        assert!(matches!(
            err,
            FetchError::Decode {
                category: EventKind::Withdrawals,
                page: 0,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_backwards_page_pointer_is_stalled() {
        let mut source = MockSource::default();
        source.pages.insert(
            (EventKind::Claims, 0),
            Page {
                items: Vec::new(),
                next: Some(0),
            },
        );
        let result: Result<Vec<Value>, _> =
            collect_all_pages(&source, Chain::Ethereum, EventKind::Claims).await;
        assert!(matches!(result, Err(FetchError::Stalled { page: 0, .. })));
    }

    #[tokio::test]
    async fn test_dataset_bounds_follow_events() {
        let dataset = fetch_chain_dataset(&two_page_source(), Chain::Base).await.unwrap();
        assert_eq!(dataset.deposits.len(), 2);
        assert_eq!(dataset.min_timestamp, Some(100));
        assert_eq!(dataset.max_timestamp, Some(300));
        assert_eq!(dataset.last_queried_block, 9);
        assert!(dataset.balances.is_empty());
    }
}
