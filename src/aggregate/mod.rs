/// Per-category event aggregation into bucketed series

pub mod delegation;
pub mod distribution;
pub mod series;

pub use delegation::{aggregate_delegations, DelegationPoint, DelegationSeries};
pub use distribution::{Thresholds, CLAIM_THRESHOLDS, DEPOSIT_THRESHOLDS};
pub use series::{aggregate_events, BucketPoint, OverTimeSeries};

use serde::{Deserialize, Serialize};

use prizeflow_core::{Claim, Deposit, Withdrawal, YieldFlush};

use crate::bucket::{Boundaries, LowerBound};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Deposits,
    Withdrawals,
    Claims,
    Yield,
}

pub fn aggregate_deposits(
    deposits: &[Deposit],
    boundaries: &Boundaries,
    policy: LowerBound,
    thresholds: &Thresholds,
) -> OverTimeSeries {
    aggregate_events(Category::Deposits, deposits, boundaries, policy, Some(thresholds))
}

pub fn aggregate_withdrawals(
    withdrawals: &[Withdrawal],
    boundaries: &Boundaries,
    policy: LowerBound,
) -> OverTimeSeries {
    aggregate_events(Category::Withdrawals, withdrawals, boundaries, policy, None)
}

pub fn aggregate_claims(
    claims: &[Claim],
    boundaries: &Boundaries,
    policy: LowerBound,
    thresholds: &Thresholds,
) -> OverTimeSeries {
    aggregate_events(Category::Claims, claims, boundaries, policy, Some(thresholds))
}

/// Yield flushes, with the contributing vault standing in for the wallet
pub fn aggregate_yield(
    yields: &[YieldFlush],
    boundaries: &Boundaries,
    policy: LowerBound,
) -> OverTimeSeries {
    aggregate_events(Category::Yield, yields, boundaries, policy, None)
}
