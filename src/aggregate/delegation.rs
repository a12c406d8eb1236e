/// Delegation series: created, funded and withdrawn events folded into one record per bucket

use ahash::AHashSet;
use serde::{Deserialize, Serialize};

use prizeflow_core::{DelegationCreated, DelegationFunded, DelegationWithdrawn};

use super::series::tally_bucket;
use crate::bucket::{Boundaries, LowerBound};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DelegationPoint {
    pub timestamp: i64,
    pub created: u64,
    pub new_delegators: u64,
    pub funded_amount: f64,
    pub funded_count: u64,
    pub withdrawn_amount: f64,
    pub withdrawn_count: u64,
    pub cumulative_created: u64,
    pub cumulative_delegators: u64,
    pub cumulative_funded_amount: f64,
    pub cumulative_withdrawn_amount: f64,
    pub cumulative_withdrawn_count: u64,
    /// Funded minus withdrawn, from the floored cumulative fields
    pub tvl: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DelegationSeries {
    pub lower_bound: LowerBound,
    pub buckets: Vec<DelegationPoint>,
}

impl DelegationSeries {
    pub fn current_tvl(&self) -> f64 {
        self.buckets.last().map_or(0.0, |b| b.tvl)
    }
}

pub fn aggregate_delegations(
    created: &[DelegationCreated],
    funded: &[DelegationFunded],
    withdrawn: &[DelegationWithdrawn],
    boundaries: &Boundaries,
    policy: LowerBound,
) -> DelegationSeries {
    let mut delegators: AHashSet<&str> = AHashSet::new();
    let mut total_created = 0u64;
    let mut total_funded = 0.0;
    let mut total_withdrawn = 0.0;
    let mut total_withdrawn_count = 0u64;
    let mut buckets = Vec::with_capacity(boundaries.len());

    for (index, &timestamp) in boundaries.as_slice().iter().enumerate() {
        // Only creations introduce delegators
        let creations = tally_bucket(created, boundaries, index, policy, Some(&mut delegators), |_| {});
        let funding = tally_bucket(funded, boundaries, index, policy, None, |_| {});
        let withdrawals = tally_bucket(withdrawn, boundaries, index, policy, None, |_| {});

        total_created += creations.count;
        total_funded += funding.amount;
        total_withdrawn += withdrawals.amount;
        total_withdrawn_count += withdrawals.count;

        let cumulative_funded_amount = total_funded.floor();
        let cumulative_withdrawn_amount = total_withdrawn.floor();

        buckets.push(DelegationPoint {
            timestamp,
            created: creations.count,
            new_delegators: creations.new_actors,
            funded_amount: funding.amount.floor(),
            funded_count: funding.count,
            withdrawn_amount: withdrawals.amount.floor(),
            withdrawn_count: withdrawals.count,
            cumulative_created: total_created,
            cumulative_delegators: delegators.len() as u64,
            cumulative_funded_amount,
            cumulative_withdrawn_amount,
            cumulative_withdrawn_count: total_withdrawn_count,
            tvl: cumulative_funded_amount - cumulative_withdrawn_amount,
        });
    }

    DelegationSeries {
        lower_bound: policy,
        buckets,
    }
}
