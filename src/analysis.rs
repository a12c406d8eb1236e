/// Per-chain analysis pipeline
///
/// Bucketizer, then the five category aggregators in parallel, then TVL from
/// their cumulative series, then the wallet ledger and the winless
/// classifier. Everything is recomputed from the raw dataset on each call,
/// except that a previous ledger can be handed back in when only the window
/// moved.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use prizeflow_core::{AnalyticsError, Chain, ChainDataset};

use crate::aggregate::{
    aggregate_claims, aggregate_delegations, aggregate_deposits, aggregate_withdrawals,
    aggregate_yield, DelegationSeries, OverTimeSeries, Thresholds,
};
use crate::bucket::{Boundaries, LowerBound};
use crate::ledger::WalletLedger;
use crate::tvl::{reconstruct_tvl, Backfill, TvlSeries};
use crate::winless::{find_winless_withdrawals, WinlessWithdrawal};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AnalysisMode {
    /// Whole history, bucket 0 open-ended towards the past
    FullHistory,
    /// Refresh of a window starting at `start`, with pre-window TVL backfilled
    Windowed { start: i64 },
}

impl AnalysisMode {
    pub fn lower_bound(&self) -> LowerBound {
        match self {
            AnalysisMode::FullHistory => LowerBound::FullHistory,
            AnalysisMode::Windowed { .. } => LowerBound::PreTick,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisOptions {
    pub bucket_count: usize,
    pub mode: AnalysisMode,
    /// Explicit boundaries; when set, `bucket_count` is ignored
    pub boundaries: Option<Vec<i64>>,
    pub deposit_thresholds: Thresholds,
    pub claim_thresholds: Thresholds,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            bucket_count: 50,
            mode: AnalysisMode::FullHistory,
            boundaries: None,
            deposit_thresholds: Thresholds::deposits(),
            claim_thresholds: Thresholds::claims(),
        }
    }
}

impl AnalysisOptions {
    pub fn boundaries_for(&self, dataset: &ChainDataset) -> Result<Boundaries, AnalyticsError> {
        if let Some(custom) = &self.boundaries {
            return Boundaries::custom(custom.clone());
        }

        let (first_event, end) = dataset.time_range()?;
        let start = match self.mode {
            AnalysisMode::FullHistory => first_event,
            AnalysisMode::Windowed { start } => start,
        };
        Boundaries::even(start, end, self.bucket_count)
    }
}

/// Wallet-level results that do not depend on the time window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReusableState {
    pub ledger: WalletLedger,
    pub winless: Vec<WinlessWithdrawal>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ChainTotals {
    pub deposited: f64,
    pub withdrawn: f64,
    pub claimed: f64,
    pub yield_contributed: f64,
    pub depositors: u64,
    pub winners: u64,
    pub tvl: f64,
    pub delegated_tvl: f64,
    pub winless_wallets: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChainReport {
    pub chain: Chain,
    pub mode: AnalysisMode,
    pub boundaries: Boundaries,
    pub deposits: OverTimeSeries,
    pub withdrawals: OverTimeSeries,
    pub claims: OverTimeSeries,
    pub yields: OverTimeSeries,
    pub delegations: DelegationSeries,
    pub tvl: TvlSeries,
    pub ledger: WalletLedger,
    pub winless: Vec<WinlessWithdrawal>,
    pub totals: ChainTotals,
}

impl ChainReport {
    pub fn reusable_state(&self) -> ReusableState {
        ReusableState {
            ledger: self.ledger.clone(),
            winless: self.winless.clone(),
        }
    }
}

#[instrument(skip_all, fields(chain = %dataset.chain))]
pub fn analyze_chain(
    dataset: &ChainDataset,
    options: &AnalysisOptions,
    previous: Option<ReusableState>,
) -> Result<ChainReport, AnalyticsError> {
    let boundaries = options.boundaries_for(dataset)?;
    let policy = options.mode.lower_bound();
    info!(buckets = boundaries.len(), mode = ?options.mode, "Analyzing chain");

    let ((deposits, withdrawals), (claims, (yields, delegations))) = rayon::join(
        || {
            rayon::join(
                || aggregate_deposits(&dataset.deposits, &boundaries, policy, &options.deposit_thresholds),
                || aggregate_withdrawals(&dataset.withdrawals, &boundaries, policy),
            )
        },
        || {
            rayon::join(
                || aggregate_claims(&dataset.claims, &boundaries, policy, &options.claim_thresholds),
                || {
                    rayon::join(
                        || aggregate_yield(&dataset.yields, &boundaries, policy),
                        || {
                            aggregate_delegations(
                                &dataset.delegations_created,
                                &dataset.delegations_funded,
                                &dataset.delegations_withdrawn,
                                &boundaries,
                                policy,
                            )
                        },
                    )
                },
            )
        },
    );

    let backfill = match options.mode {
        AnalysisMode::FullHistory => None,
        AnalysisMode::Windowed { .. } => Some(Backfill {
            deposits: &dataset.deposits,
            claims: &dataset.claims,
            withdrawals: &dataset.withdrawals,
            before: boundaries.pre_tick_sentinel(),
        }),
    };
    let tvl = reconstruct_tvl(&deposits, &claims, &withdrawals, backfill);

    let ReusableState { ledger, winless } = match previous {
        Some(state) => {
            debug!(wallets = state.ledger.len(), "Reusing wallet ledger from previous run");
            state
        }
        None => {
            let ledger = WalletLedger::build(dataset);
            let winless = find_winless_withdrawals(&ledger);
            ReusableState { ledger, winless }
        }
    };

    let totals = ChainTotals {
        deposited: deposits.total_amount(),
        withdrawn: withdrawals.total_amount(),
        claimed: claims.total_amount(),
        yield_contributed: yields.total_amount(),
        depositors: deposits.unique_wallets(),
        winners: claims.unique_wallets(),
        tvl: tvl.latest(),
        delegated_tvl: delegations.current_tvl(),
        winless_wallets: winless.len() as u64,
    };
    info!(tvl = totals.tvl, depositors = totals.depositors, winless = totals.winless_wallets, "Chain analysis complete");

    Ok(ChainReport {
        chain: dataset.chain,
        mode: options.mode,
        boundaries,
        deposits,
        withdrawals,
        claims,
        yields,
        delegations,
        tvl,
        ledger,
        winless,
        totals,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use prizeflow_core::{Deposit, WalletBalance, Withdrawal};

    fn dataset() -> ChainDataset {
        let mut dataset = ChainDataset::empty(Chain::Optimism);
        dataset.balances = vec![WalletBalance {
            wallet: "w".to_string(),
            balance: 0.0,
        }];
        dataset.deposits = (1..=10)
            .map(|i| Deposit {
                tx_hash: format!("0xd{i}"),
                block_number: i as u64,
                timestamp: Some(i * 10),
                wallet: "w".to_string(),
                amount: 10.0,
            })
            .collect();
        dataset.withdrawals = vec![Withdrawal {
            tx_hash: "0xw".to_string(),
            block_number: 200,
            timestamp: Some(100),
            wallet: "w".to_string(),
            amount: 100.0,
        }];
        dataset.max_timestamp = Some(100);
        dataset
    }

    #[test]
    fn test_full_history_pipeline() {
        let options = AnalysisOptions {
            bucket_count: 9,
            ..AnalysisOptions::default()
        };
        let report = analyze_chain(&dataset(), &options, None).unwrap();

        // the first event at 10 opens the range but is not itself a boundary
        assert_eq!(report.boundaries.as_slice(), &[20, 30, 40, 50, 60, 70, 80, 90, 100]);
        assert_eq!(report.deposits.buckets.len(), report.boundaries.len());
        assert_eq!(report.deposits.buckets[0].count, 2);
        assert_eq!(report.totals.deposited, 100.0);
        assert_eq!(report.totals.tvl, 0.0);
        assert_eq!(report.tvl.points[0].tvl, 20.0);
        assert_eq!(report.totals.winless_wallets, 1);
    }

    #[test]
    fn test_windowed_pipeline_backfills_tvl() {
        let options = AnalysisOptions {
            bucket_count: 2,
            mode: AnalysisMode::Windowed { start: 60 },
            ..AnalysisOptions::default()
        };
        let report = analyze_chain(&dataset(), &options, None).unwrap();

        // boundaries [80, 100]; the sentinel sits on the window start
        assert_eq!(report.boundaries.as_slice(), &[80, 100]);
        assert_eq!(report.boundaries.pre_tick_sentinel(), 60);
        assert_eq!(report.tvl.prior_tvl, 50.0);
        assert_eq!(report.deposits.total_amount(), 50.0);
        assert_eq!(report.deposits.buckets[0].count, 3);
        assert_eq!(report.totals.tvl, 0.0);
    }

    #[test]
    fn test_previous_ledger_is_reused() {
        let options = AnalysisOptions::default();
        let first = analyze_chain(&dataset(), &options, None).unwrap();

        let mut changed = dataset();
        changed.balances.clear();
        let second = analyze_chain(&changed, &options, Some(first.reusable_state())).unwrap();
        assert_eq!(second.ledger, first.ledger);
        assert_eq!(second.winless, first.winless);
    }

    #[test]
    fn test_custom_boundaries_override_bucket_count() {
        let options = AnalysisOptions {
            boundaries: Some(vec![50, 100]),
            ..AnalysisOptions::default()
        };
        let report = analyze_chain(&dataset(), &options, None).unwrap();
        let amounts: Vec<f64> = report.deposits.buckets.iter().map(|b| b.amount).collect();
        assert_eq!(amounts, vec![50.0, 50.0]);
    }

    #[test]
    fn test_empty_dataset_is_rejected() {
        let result = analyze_chain(&ChainDataset::empty(Chain::Base), &AnalysisOptions::default(), None);
        assert!(matches!(result, Err(AnalyticsError::NoTimestampedEvents(_))));
    }
}
