/// Shared bucketed aggregation engine
///
/// Every category walks the full event list once per bucket. Event lists are
/// tens of thousands long and bucket counts stay below a hundred, so the
/// quadratic scan is kept instead of a sorted sweep.

use ahash::AHashSet;
use serde::{Deserialize, Serialize};

use prizeflow_core::TimedEvent;

use super::distribution::Thresholds;
use super::Category;
use crate::bucket::{Boundaries, LowerBound};

/// One bucket of an over-time series.
///
/// Monetary fields are floored when the point is emitted; the running totals
/// behind the cumulative fields are kept unfloored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BucketPoint {
    pub timestamp: i64,
    pub amount: f64,
    pub count: u64,
    pub new_wallets: u64,
    pub average_amount: f64,
    pub cumulative_amount: f64,
    pub cumulative_count: u64,
    pub cumulative_wallets: u64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub distribution: Vec<u64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub cumulative_distribution: Vec<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverTimeSeries {
    pub category: Category,
    pub lower_bound: LowerBound,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thresholds: Option<Thresholds>,
    pub buckets: Vec<BucketPoint>,
}

impl OverTimeSeries {
    pub fn cumulative_amounts(&self) -> Vec<f64> {
        self.buckets.iter().map(|b| b.cumulative_amount).collect()
    }

    pub fn total_amount(&self) -> f64 {
        self.buckets.last().map_or(0.0, |b| b.cumulative_amount)
    }

    pub fn total_count(&self) -> u64 {
        self.buckets.last().map_or(0, |b| b.cumulative_count)
    }

    pub fn unique_wallets(&self) -> u64 {
        self.buckets.last().map_or(0, |b| b.cumulative_wallets)
    }
}

/// Raw sums for one bucket
#[derive(Debug, Default, Clone, Copy)]
pub(crate) struct BucketTally {
    pub amount: f64,
    pub count: u64,
    pub new_actors: u64,
}

/// Sum the events of bucket `index`.
///
/// Actors are recorded in `seen` across calls, so `new_actors` counts first
/// appearances over the whole run rather than per bucket.
pub(crate) fn tally_bucket<'a, E: TimedEvent>(
    events: &'a [E],
    boundaries: &Boundaries,
    index: usize,
    policy: LowerBound,
    mut seen: Option<&mut AHashSet<&'a str>>,
    mut observe: impl FnMut(f64),
) -> BucketTally {
    let mut tally = BucketTally::default();

    for event in events {
        let Some(ts) = event.timestamp() else {
            continue;
        };
        if !boundaries.contains(index, ts, policy) {
            continue;
        }

        let value = event.amount();
        tally.amount += value;
        tally.count += 1;
        observe(value);

        if let Some(seen) = seen.as_deref_mut() {
            if seen.insert(event.actor()) {
                tally.new_actors += 1;
            }
        }
    }

    tally
}

pub(crate) fn floored_average(amount: f64, count: u64) -> f64 {
    if count > 0 {
        (amount / count as f64).floor()
    } else {
        0.0
    }
}

/// Aggregate one category into a bucketed series
pub fn aggregate_events<E: TimedEvent>(
    category: Category,
    events: &[E],
    boundaries: &Boundaries,
    policy: LowerBound,
    thresholds: Option<&Thresholds>,
) -> OverTimeSeries {
    let slots = thresholds.map_or(0, Thresholds::len);
    let mut seen: AHashSet<&str> = AHashSet::new();
    let mut running_amount = 0.0;
    let mut running_count = 0u64;
    let mut running_distribution = vec![0u64; slots];
    let mut buckets = Vec::with_capacity(boundaries.len());

    for (index, &timestamp) in boundaries.as_slice().iter().enumerate() {
        let mut distribution = vec![0u64; slots];
        let tally = tally_bucket(events, boundaries, index, policy, Some(&mut seen), |value| {
            if let Some(slot) = thresholds.and_then(|t| t.slot_for(value)) {
                distribution[slot] += 1;
            }
        });

        // Running totals stay unfloored; only emitted fields are floored
        running_amount += tally.amount;
        running_count += tally.count;
        for (total, bucket) in running_distribution.iter_mut().zip(&distribution) {
            *total += bucket;
        }

        buckets.push(BucketPoint {
            timestamp,
            amount: tally.amount.floor(),
            count: tally.count,
            new_wallets: tally.new_actors,
            average_amount: floored_average(tally.amount, tally.count),
            cumulative_amount: running_amount.floor(),
            cumulative_count: running_count,
            cumulative_wallets: seen.len() as u64,
            distribution,
            cumulative_distribution: running_distribution.clone(),
        });
    }

    OverTimeSeries {
        category,
        lower_bound: policy,
        thresholds: thresholds.cloned(),
        buckets,
    }
}
