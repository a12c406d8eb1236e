/// Cross-chain wallet presence and chain-hopping analyses

use ahash::{AHashMap, AHashSet};
use serde::{Deserialize, Serialize};
use tracing::debug;

use prizeflow_core::{Chain, Deposit, TimedEvent, WalletBalance, Withdrawal};

/// Wallets holding a positive balance on exactly N chains
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MultichainDistribution {
    pub one_chain: u64,
    pub two_chains: u64,
    pub three_chains: u64,
    pub four_chains: u64,
    pub total_users: u64,
}

pub fn multichain_distribution(balances: &[(Chain, &[WalletBalance])]) -> MultichainDistribution {
    let mut presence: AHashMap<&str, u8> = AHashMap::new();

    // One bit per chain; popcount gives the number of chains held on
    for (chain, snapshot) in balances {
        for holding in snapshot.iter().filter(|h| h.balance > 0.0) {
            *presence.entry(holding.wallet.as_str()).or_default() |= 1 << (*chain as u8);
        }
    }

    let mut distribution = MultichainDistribution::default();
    for mask in presence.values() {
        match mask.count_ones() {
            1 => distribution.one_chain += 1,
            2 => distribution.two_chains += 1,
            3 => distribution.three_chains += 1,
            _ => distribution.four_chains += 1,
        }
        distribution.total_users += 1;
    }
    distribution
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChainMovement {
    pub chain: Chain,
    /// Withdrawing wallets that later deposited on this chain
    pub wallets: u64,
    pub amount: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovingUsers {
    pub origin: Chain,
    pub withdrawing_wallets: u64,
    pub destinations: Vec<ChainMovement>,
}

/// Follow each wallet's first withdrawal on `origin` to later deposits elsewhere.
///
/// "First" means first in list order, not earliest in time. A first
/// withdrawal without a timestamp cannot be ordered against deposits and
/// matches nothing. Deposits after `until` are ignored.
pub fn moving_users(
    origin: Chain,
    withdrawals: &[Withdrawal],
    destinations: &[(Chain, &[Deposit])],
    until: Option<i64>,
) -> MovingUsers {
    // First withdrawal per wallet, in list order
    let mut seen: AHashSet<&str> = AHashSet::new();
    let first_withdrawals: Vec<(&str, Option<i64>)> = withdrawals
        .iter()
        .filter(|w| seen.insert(w.wallet.as_str()))
        .map(|w| (w.wallet.as_str(), w.timestamp))
        .collect();

    let destinations = destinations
        .iter()
        .filter(|(chain, _)| *chain != origin)
        .map(|(chain, deposits)| {
            let mut by_wallet: AHashMap<&str, Vec<(i64, f64)>> = AHashMap::new();
            for deposit in deposits.iter() {
                if let Some(ts) = deposit.timestamp() {
                    by_wallet
                        .entry(deposit.wallet.as_str())
                        .or_default()
                        .push((ts, deposit.amount));
                }
            }

            let mut movement = ChainMovement {
                chain: *chain,
                wallets: 0,
                amount: 0.0,
            };
            for &(wallet, withdrawn_at) in &first_withdrawals {
                let (Some(withdrawn_at), Some(deposits)) = (withdrawn_at, by_wallet.get(wallet)) else {
                    continue;
                };
                // Every later deposit counts toward the amount, the wallet once
                let mut matched = false;
                for &(ts, amount) in deposits {
                    if ts > withdrawn_at && until.map_or(true, |end| ts <= end) {
                        movement.amount += amount;
                        matched = true;
                    }
                }
                if matched {
                    movement.wallets += 1;
                }
            }
            movement
        })
        .collect();

    let result = MovingUsers {
        origin,
        withdrawing_wallets: first_withdrawals.len() as u64,
        destinations,
    };
    debug!(origin = %origin, withdrawing = result.withdrawing_wallets, "Computed moving users");
    result
}
