/// Raw protocol events as delivered by the ingestion layer.
///
/// Amounts are already scaled from base units to decimal values. A `timestamp`
/// of `None` means the block has not been resolved to a time yet; such events
/// are skipped by every time-bucketed computation.
use serde::{Deserialize, Serialize};

use crate::chain::Chain;

/// Common view over every event category
pub trait TimedEvent {
    fn tx_hash(&self) -> &str;
    fn block_number(&self) -> u64;
    fn timestamp(&self) -> Option<i64>;

    /// Wallet (or delegator / vault) the event is attributed to
    fn actor(&self) -> &str;

    /// Monetary value carried by the event, zero for events without one
    fn amount(&self) -> f64;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Deposit {
    pub tx_hash: String,
    pub block_number: u64,
    #[serde(default)]
    pub timestamp: Option<i64>,
    pub wallet: String,
    pub amount: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Withdrawal {
    pub tx_hash: String,
    pub block_number: u64,
    #[serde(default)]
    pub timestamp: Option<i64>,
    pub wallet: String,
    pub amount: f64,
}

/// Prize claim; one transaction can pay out several prizes to the same winner
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claim {
    pub tx_hash: String,
    pub block_number: u64,
    #[serde(default)]
    pub timestamp: Option<i64>,
    pub winner: String,
    #[serde(default)]
    pub tier: Option<u8>,
    pub prizes: Vec<f64>,
}

impl Claim {
    pub fn total_payout(&self) -> f64 {
        self.prizes.iter().sum()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DelegationCreated {
    pub tx_hash: String,
    pub block_number: u64,
    #[serde(default)]
    pub timestamp: Option<i64>,
    pub delegator: String,
    pub delegatee: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DelegationFunded {
    pub tx_hash: String,
    pub block_number: u64,
    #[serde(default)]
    pub timestamp: Option<i64>,
    pub delegator: String,
    pub amount: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DelegationUpdated {
    pub tx_hash: String,
    pub block_number: u64,
    #[serde(default)]
    pub timestamp: Option<i64>,
    pub delegator: String,
    pub delegatee: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DelegationWithdrawn {
    pub tx_hash: String,
    pub block_number: u64,
    #[serde(default)]
    pub timestamp: Option<i64>,
    pub delegator: String,
    pub amount: f64,
}

/// Yield contributed to the prize pool by a vault
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YieldFlush {
    pub tx_hash: String,
    pub block_number: u64,
    #[serde(default)]
    pub timestamp: Option<i64>,
    pub vault: String,
    pub amount: f64,
}

macro_rules! timed_event {
    ($ty:ty, $actor:ident, |$ev:ident| $amount:expr) => {
        impl TimedEvent for $ty {
            fn tx_hash(&self) -> &str {
                &self.tx_hash
            }

            fn block_number(&self) -> u64 {
                self.block_number
            }

            fn timestamp(&self) -> Option<i64> {
                self.timestamp
            }

            fn actor(&self) -> &str {
                &self.$actor
            }

            fn amount(&self) -> f64 {
                let $ev = self;
                $amount
            }
        }
    };
}

timed_event!(Deposit, wallet, |e| e.amount);
timed_event!(Withdrawal, wallet, |e| e.amount);
timed_event!(Claim, winner, |e| e.total_payout());
timed_event!(DelegationCreated, delegator, |_e| 0.0);
timed_event!(DelegationFunded, delegator, |e| e.amount);
timed_event!(DelegationUpdated, delegator, |_e| 0.0);
timed_event!(DelegationWithdrawn, delegator, |e| e.amount);
timed_event!(YieldFlush, vault, |e| e.amount);

/// Event annotated with the chain it was observed on
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChainTagged<T> {
    pub chain: Chain,
    #[serde(flatten)]
    pub event: T,
}

impl<T> ChainTagged<T> {
    pub fn new(chain: Chain, event: T) -> Self {
        Self { chain, event }
    }
}

impl<T: TimedEvent> TimedEvent for ChainTagged<T> {
    fn tx_hash(&self) -> &str {
        self.event.tx_hash()
    }

    fn block_number(&self) -> u64 {
        self.event.block_number()
    }

    fn timestamp(&self) -> Option<i64> {
        self.event.timestamp()
    }

    fn actor(&self) -> &str {
        self.event.actor()
    }

    fn amount(&self) -> f64 {
        self.event.amount()
    }
}
