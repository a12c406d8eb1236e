use serde::{Deserialize, Serialize};

use crate::chain::Chain;
use crate::error::AnalyticsError;
use crate::events::*;
use crate::holdings::{DrawResult, WalletBalance};

/// Complete raw input for one chain, as handed over by the ingestion layer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainDataset {
    pub chain: Chain,
    #[serde(default)]
    pub deposits: Vec<Deposit>,
    #[serde(default)]
    pub withdrawals: Vec<Withdrawal>,
    #[serde(default)]
    pub claims: Vec<Claim>,
    #[serde(default)]
    pub delegations_created: Vec<DelegationCreated>,
    #[serde(default)]
    pub delegations_funded: Vec<DelegationFunded>,
    #[serde(default)]
    pub delegations_updated: Vec<DelegationUpdated>,
    #[serde(default)]
    pub delegations_withdrawn: Vec<DelegationWithdrawn>,
    #[serde(default)]
    pub yields: Vec<YieldFlush>,
    #[serde(default)]
    pub balances: Vec<WalletBalance>,
    #[serde(default)]
    pub draws: Vec<DrawResult>,
    #[serde(default)]
    pub last_queried_block: u64,
    #[serde(default)]
    pub min_timestamp: Option<i64>,
    #[serde(default)]
    pub max_timestamp: Option<i64>,
}

impl ChainDataset {
    pub fn empty(chain: Chain) -> Self {
        Self {
            chain,
            deposits: Vec::new(),
            withdrawals: Vec::new(),
            claims: Vec::new(),
            delegations_created: Vec::new(),
            delegations_funded: Vec::new(),
            delegations_updated: Vec::new(),
            delegations_withdrawn: Vec::new(),
            yields: Vec::new(),
            balances: Vec::new(),
            draws: Vec::new(),
            last_queried_block: 0,
            min_timestamp: None,
            max_timestamp: None,
        }
    }

    fn event_timestamps(&self) -> impl Iterator<Item = i64> + '_ {
        fn stamps<E: TimedEvent>(events: &[E]) -> impl Iterator<Item = i64> + '_ {
            events.iter().filter_map(TimedEvent::timestamp)
        }

        stamps(&self.deposits)
            .chain(stamps(&self.withdrawals))
            .chain(stamps(&self.claims))
            .chain(stamps(&self.delegations_created))
            .chain(stamps(&self.delegations_funded))
            .chain(stamps(&self.delegations_updated))
            .chain(stamps(&self.delegations_withdrawn))
            .chain(stamps(&self.yields))
    }

    /// Time span to bucketize: earliest event up to the latest observation.
    ///
    /// `max_timestamp` (the last time the chain was queried) wins over the
    /// latest event so the final bucket reaches the present.
    pub fn time_range(&self) -> Result<(i64, i64), AnalyticsError> {
        let mut bounds: Option<(i64, i64)> = None;
        for ts in self.event_timestamps() {
            bounds = Some(match bounds {
                Some((lo, hi)) => (lo.min(ts), hi.max(ts)),
                None => (ts, ts),
            });
        }

        let (start, latest) =
            bounds.ok_or_else(|| AnalyticsError::NoTimestampedEvents(self.chain.to_string()))?;
        let end = self.max_timestamp.map_or(latest, |max| max.max(latest));
        Ok((start, end))
    }
}

/// Collection of per-chain datasets, the on-disk shape the CLI reads
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DatasetBundle {
    pub chains: Vec<ChainDataset>,
}

impl DatasetBundle {
    pub fn from_json(json: &str) -> Result<Self, AnalyticsError> {
        Ok(serde_json::from_str(json)?)
    }
}
