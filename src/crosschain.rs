/// Merge of per-chain datasets into one protocol-wide view

use std::borrow::Borrow;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use prizeflow_core::*;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergedBalance {
    pub wallet: String,
    pub balance: f64,
    pub chains: Vec<Chain>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergedDraw {
    pub draw: u32,
    pub winners: u32,
    pub total_payout: f64,
    /// Chains whose result was aligned with this draw index
    pub chains: Vec<Chain>,
}

/// Every chain's events in one place, each list ascending by timestamp
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CrossChainDataset {
    pub chains: Vec<Chain>,
    pub deposits: Vec<ChainTagged<Deposit>>,
    pub withdrawals: Vec<ChainTagged<Withdrawal>>,
    pub claims: Vec<ChainTagged<Claim>>,
    pub delegations_created: Vec<ChainTagged<DelegationCreated>>,
    pub delegations_funded: Vec<ChainTagged<DelegationFunded>>,
    pub delegations_updated: Vec<ChainTagged<DelegationUpdated>>,
    pub delegations_withdrawn: Vec<ChainTagged<DelegationWithdrawn>>,
    pub yields: Vec<ChainTagged<YieldFlush>>,
    /// Descending by summed balance
    pub balances: Vec<MergedBalance>,
    pub draws: Vec<MergedDraw>,
    pub min_timestamp: Option<i64>,
    pub max_timestamp: Option<i64>,
}

fn each<D: Borrow<ChainDataset>>(datasets: &[D]) -> impl Iterator<Item = &ChainDataset> {
    datasets.iter().map(|d| d.borrow())
}

fn tag_and_sort<D, E>(datasets: &[D], pick: impl Fn(&ChainDataset) -> &[E]) -> Vec<ChainTagged<E>>
where
    D: Borrow<ChainDataset>,
    E: TimedEvent + Clone,
{
    let mut merged: Vec<ChainTagged<E>> = each(datasets)
        .flat_map(|dataset| {
            pick(dataset)
                .iter()
                .map(move |event| ChainTagged::new(dataset.chain, event.clone()))
        })
        .collect();
    merged.sort_by_key(|tagged| tagged.timestamp());
    merged
}

fn merge_balances<D: Borrow<ChainDataset>>(datasets: &[D]) -> Vec<MergedBalance> {
    let mut by_wallet: BTreeMap<&str, MergedBalance> = BTreeMap::new();

    for dataset in each(datasets) {
        for snapshot in &dataset.balances {
            let merged = by_wallet
                .entry(snapshot.wallet.as_str())
                .or_insert_with(|| MergedBalance {
                    wallet: snapshot.wallet.clone(),
                    balance: 0.0,
                    chains: Vec::new(),
                });
            merged.balance += snapshot.balance;
            if !merged.chains.contains(&dataset.chain) {
                merged.chains.push(dataset.chain);
            }
        }
    }

    let mut balances: Vec<MergedBalance> = by_wallet.into_values().collect();
    balances.sort_by(|a, b| b.balance.total_cmp(&a.balance));
    balances
}

/// Align draws position by position against the first longest draw list.
///
/// A chain whose draw at some position does not carry the expected index
/// (or that has no draw there) is left out of that position with a warning.
fn merge_draws<D: Borrow<ChainDataset>>(datasets: &[D]) -> Vec<MergedDraw> {
    // Strict comparison so ties go to the earliest chain
    let mut reference: Option<&ChainDataset> = None;
    for dataset in each(datasets) {
        if reference.map_or(true, |r| dataset.draws.len() > r.draws.len()) {
            reference = Some(dataset);
        }
    }
    let Some(reference) = reference else {
        return Vec::new();
    };

    reference
        .draws
        .iter()
        .enumerate()
        .map(|(position, expected)| {
            let mut merged = MergedDraw {
                draw: expected.draw,
                winners: 0,
                total_payout: 0.0,
                chains: Vec::new(),
            };

            // Chains are matched by position, then confirmed by draw index
            for dataset in each(datasets) {
                match dataset.draws.get(position) {
                    Some(result) if result.draw == expected.draw => {
                        merged.winners += result.winners;
                        merged.total_payout += result.total_payout;
                        merged.chains.push(dataset.chain);
                    }
                    Some(result) => warn!(
                        chain = %dataset.chain,
                        position,
                        expected = expected.draw,
                        found = result.draw,
                        "Draw index mismatch, skipping chain for this draw"
                    ),
                    None => warn!(
                        chain = %dataset.chain,
                        position,
                        expected = expected.draw,
                        "Draw missing on chain, skipping chain for this draw"
                    ),
                }
            }

            merged
        })
        .collect()
}

#[instrument(skip_all, fields(chains = datasets.len()))]
pub fn merge_chains<D: Borrow<ChainDataset>>(datasets: &[D]) -> CrossChainDataset {
    let chains: Vec<Chain> = each(datasets).map(|d| d.chain).collect();
    let min_timestamp = each(datasets).filter_map(|d| d.min_timestamp).min();
    let max_timestamp = each(datasets).filter_map(|d| d.max_timestamp).max();

    let merged = CrossChainDataset {
        chains,
        deposits: tag_and_sort(datasets, |d| d.deposits.as_slice()),
        withdrawals: tag_and_sort(datasets, |d| d.withdrawals.as_slice()),
        claims: tag_and_sort(datasets, |d| d.claims.as_slice()),
        delegations_created: tag_and_sort(datasets, |d| d.delegations_created.as_slice()),
        delegations_funded: tag_and_sort(datasets, |d| d.delegations_funded.as_slice()),
        delegations_updated: tag_and_sort(datasets, |d| d.delegations_updated.as_slice()),
        delegations_withdrawn: tag_and_sort(datasets, |d| d.delegations_withdrawn.as_slice()),
        yields: tag_and_sort(datasets, |d| d.yields.as_slice()),
        balances: merge_balances(datasets),
        draws: merge_draws(datasets),
        min_timestamp,
        max_timestamp,
    };

    debug!(
        deposits = merged.deposits.len(),
        wallets = merged.balances.len(),
        draws = merged.draws.len(),
        "Merged chain datasets"
    );
    merged
}
