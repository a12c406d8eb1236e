/// Per-wallet chronological transaction log

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use prizeflow_core::{ChainDataset, TimedEvent};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    Deposit,
    Withdrawal,
    Claim,
    DelegationCreated,
    DelegationFunded,
    DelegationUpdated,
    DelegationWithdrawn,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerTransaction {
    pub kind: TransactionKind,
    pub tx_hash: String,
    pub block_number: u64,
    pub timestamp: Option<i64>,
    pub amount: f64,
    /// Delegatee for delegation created/updated entries
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub counterparty: Option<String>,
}

impl LedgerTransaction {
    fn from_event<E: TimedEvent>(kind: TransactionKind, event: &E) -> Self {
        Self {
            kind,
            tx_hash: event.tx_hash().to_string(),
            block_number: event.block_number(),
            timestamp: event.timestamp(),
            amount: event.amount(),
            counterparty: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerEntry {
    /// Current on-chain balance from the snapshot
    pub balance: f64,
    pub transactions: Vec<LedgerTransaction>,
}

impl LedgerEntry {
    pub fn has_claims(&self) -> bool {
        self.transactions.iter().any(|tx| tx.kind == TransactionKind::Claim)
    }
}

/// Wallet ledger for one chain.
///
/// The balance snapshot decides which wallets exist; events from wallets
/// missing from it are dropped and only counted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WalletLedger {
    entries: BTreeMap<String, LedgerEntry>,
    skipped_events: usize,
}

impl WalletLedger {
    pub fn build(dataset: &ChainDataset) -> Self {
        let mut ledger = Self::default();

        // Seed from the snapshot so only known wallets collect events
        for snapshot in &dataset.balances {
            ledger.entries.insert(
                snapshot.wallet.clone(),
                LedgerEntry {
                    balance: snapshot.balance,
                    transactions: Vec::new(),
                },
            );
        }

        ledger.record(TransactionKind::Deposit, &dataset.deposits, |_| None);
        ledger.record(TransactionKind::Withdrawal, &dataset.withdrawals, |_| None);
        ledger.record(TransactionKind::Claim, &dataset.claims, |_| None);
        ledger.record(TransactionKind::DelegationCreated, &dataset.delegations_created, |e| {
            Some(e.delegatee.clone())
        });
        ledger.record(TransactionKind::DelegationFunded, &dataset.delegations_funded, |_| None);
        ledger.record(TransactionKind::DelegationUpdated, &dataset.delegations_updated, |e| {
            Some(e.delegatee.clone())
        });
        ledger.record(TransactionKind::DelegationWithdrawn, &dataset.delegations_withdrawn, |_| None);

        // Untimed entries sort first; same-second entries keep category order
        for entry in ledger.entries.values_mut() {
            entry.transactions.sort_by_key(|tx| tx.timestamp);
        }

        debug!(
            chain = %dataset.chain,
            wallets = ledger.entries.len(),
            skipped_events = ledger.skipped_events,
            "Built wallet ledger"
        );
        ledger
    }

    fn record<E: TimedEvent>(
        &mut self,
        kind: TransactionKind,
        events: &[E],
        counterparty: impl Fn(&E) -> Option<String>,
    ) {
        for event in events {
            match self.entries.get_mut(event.actor()) {
                Some(entry) => {
                    let mut tx = LedgerTransaction::from_event(kind, event);
                    tx.counterparty = counterparty(event);
                    entry.transactions.push(tx);
                }
                None => self.skipped_events += 1,
            }
        }
    }

    pub fn get(&self, wallet: &str) -> Option<&LedgerEntry> {
        self.entries.get(wallet)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &LedgerEntry)> {
        self.entries.iter().map(|(wallet, entry)| (wallet.as_str(), entry))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Events dropped because their wallet is not in the balance snapshot
    pub fn skipped_events(&self) -> usize {
        self.skipped_events
    }
}
