/// Detection of wallets that deposited, withdrew everything and never won

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::ledger::{LedgerEntry, LedgerTransaction, TransactionKind, WalletLedger};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WinlessWithdrawal {
    pub wallet: String,
    pub max_balance: f64,
    pub first_deposit_timestamp: i64,
    pub last_withdrawal_timestamp: i64,
}

/// Simulated balance of one wallet while its ledger is replayed
#[derive(Debug, Default, Clone, Copy, PartialEq)]
struct Replay {
    virtual_balance: f64,
    max_virtual_balance: f64,
    first_deposit_timestamp: i64,
    last_withdrawal_timestamp: i64,
}

impl Replay {
    fn apply(&mut self, tx: &LedgerTransaction) {
        let timestamp = tx.timestamp.unwrap_or(0);
        match tx.kind {
            TransactionKind::Deposit => {
                self.virtual_balance += tx.amount;
                self.max_virtual_balance = self.max_virtual_balance.max(self.virtual_balance);
                // Zero doubles as "no deposit seen yet"
                if self.first_deposit_timestamp == 0 {
                    self.first_deposit_timestamp = timestamp;
                }
            }
            TransactionKind::Withdrawal => {
                self.virtual_balance -= tx.amount;
                self.last_withdrawal_timestamp = timestamp;
            }
            _ => {}
        }
    }

    fn qualifies(&self) -> bool {
        self.virtual_balance <= 0.0
            && self.first_deposit_timestamp > 0
            && self.last_withdrawal_timestamp > 0
    }
}

/// Wallets still holding funds or with any prize claim are never candidates
fn is_candidate(entry: &LedgerEntry) -> bool {
    entry.balance <= 0.0 && !entry.has_claims()
}

fn classify(wallet: &str, entry: &LedgerEntry) -> Option<WinlessWithdrawal> {
    let mut replay = Replay::default();
    for tx in &entry.transactions {
        replay.apply(tx);
    }

    replay.qualifies().then(|| WinlessWithdrawal {
        wallet: wallet.to_string(),
        max_balance: replay.max_virtual_balance,
        first_deposit_timestamp: replay.first_deposit_timestamp,
        last_withdrawal_timestamp: replay.last_withdrawal_timestamp,
    })
}

/// Classify every wallet of the ledger, in wallet order
pub fn find_winless_withdrawals(ledger: &WalletLedger) -> Vec<WinlessWithdrawal> {
    let found: Vec<WinlessWithdrawal> = ledger
        .iter()
        .filter(|(_, entry)| is_candidate(entry))
        .filter_map(|(wallet, entry)| classify(wallet, entry))
        .collect();

    debug!(wallets = ledger.len(), winless = found.len(), "Classified winless withdrawals");
    found
}
