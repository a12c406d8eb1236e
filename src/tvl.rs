/// Total value locked over time

use serde::{Deserialize, Serialize};
use tracing::debug;

use prizeflow_core::{Claim, Deposit, TimedEvent, Withdrawal};

use crate::aggregate::OverTimeSeries;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TvlPoint {
    pub timestamp: i64,
    pub tvl: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TvlSeries {
    /// Value locked before the first bucket opened
    pub prior_tvl: f64,
    pub points: Vec<TvlPoint>,
}

impl TvlSeries {
    pub fn latest(&self) -> f64 {
        self.points.last().map_or(self.prior_tvl, |p| p.tvl)
    }
}

/// Raw events used to recover the value locked before a window starts
#[derive(Debug, Clone, Copy)]
pub struct Backfill<'a> {
    pub deposits: &'a [Deposit],
    pub claims: &'a [Claim],
    pub withdrawals: &'a [Withdrawal],
    /// Events strictly before this instant count towards the prior TVL
    pub before: i64,
}

impl Backfill<'_> {
    pub fn prior_tvl(&self) -> f64 {
        let deposits = sum_before(self.deposits, self.before);
        let claims = sum_before(self.claims, self.before);
        let withdrawals = sum_before(self.withdrawals, self.before);
        debug!(before = self.before, deposits, claims, withdrawals, "Backfilled pre-window activity");
        deposits + claims - withdrawals
    }
}

/// Chronological scan that stops at the first event at or past `before`
fn sum_before<E: TimedEvent>(events: &[E], before: i64) -> f64 {
    let mut stamped: Vec<(i64, f64)> = events
        .iter()
        .filter_map(|e| e.timestamp().map(|ts| (ts, e.amount())))
        .collect();
    // Stable sort keeps same-second events in ingestion order
    stamped.sort_by_key(|&(ts, _)| ts);

    // The sentinel itself belongs to the window, not the backfill
    stamped
        .iter()
        .take_while(|&&(ts, _)| ts < before)
        .map(|&(_, amount)| amount)
        .sum()
}

/// Combine the three cumulative series bucket by bucket.
///
/// The series must come from the same boundaries; extra buckets on a longer
/// series are ignored.
pub fn reconstruct_tvl(
    deposits: &OverTimeSeries,
    claims: &OverTimeSeries,
    withdrawals: &OverTimeSeries,
    backfill: Option<Backfill<'_>>,
) -> TvlSeries {
    let prior_tvl = backfill.map_or(0.0, |b| b.prior_tvl());

    let points = deposits
        .buckets
        .iter()
        .zip(&claims.buckets)
        .zip(&withdrawals.buckets)
        .map(|((d, c), w)| TvlPoint {
            timestamp: d.timestamp,
            tvl: prior_tvl + d.cumulative_amount + c.cumulative_amount - w.cumulative_amount,
        })
        .collect();

    TvlSeries { prior_tvl, points }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::{aggregate_claims, aggregate_deposits, aggregate_withdrawals, Thresholds};
    use crate::bucket::{Boundaries, LowerBound};

    fn deposit(ts: i64, amount: f64) -> Deposit {
        Deposit {
            tx_hash: format!("0xd{ts}"),
            block_number: ts as u64,
            timestamp: Some(ts),
            wallet: "0xa".to_string(),
            amount,
        }
    }

    fn withdrawal(ts: i64, amount: f64) -> Withdrawal {
        Withdrawal {
            tx_hash: format!("0xw{ts}"),
            block_number: ts as u64,
            timestamp: Some(ts),
            wallet: "0xa".to_string(),
            amount,
        }
    }

    fn claim(ts: i64, prize: f64) -> Claim {
        Claim {
            tx_hash: format!("0xc{ts}"),
            block_number: ts as u64,
            timestamp: Some(ts),
            winner: "0xa".to_string(),
            tier: None,
            prizes: vec![prize],
        }
    }

    #[test]
    fn test_tvl_identity_full_history() {
        let deposits = vec![deposit(1, 100.0), deposit(2, 100.0), deposit(3, 100.0)];
        let withdrawals = vec![withdrawal(4, 50.0)];
        let claims = vec![claim(5, 20.0)];
        let boundaries = Boundaries::custom(vec![3, 5]).unwrap();
        let policy = LowerBound::FullHistory;

        let tvl = reconstruct_tvl(
            &aggregate_deposits(&deposits, &boundaries, policy, &Thresholds::deposits()),
            &aggregate_claims(&claims, &boundaries, policy, &Thresholds::claims()),
            &aggregate_withdrawals(&withdrawals, &boundaries, policy),
            None,
        );

        let values: Vec<f64> = tvl.points.iter().map(|p| p.tvl).collect();
        assert_eq!(values, vec![300.0, 270.0]);
        assert_eq!(tvl.prior_tvl, 0.0);
        assert_eq!(tvl.latest(), 270.0);
    }

    #[test]
    fn test_windowed_tvl_adds_backfill() {
        // out of order on purpose; the scan sorts before stopping at the window
        let deposits = vec![deposit(25, 10.0), deposit(2, 1_000.0), deposit(5, 200.0)];
        let withdrawals = vec![withdrawal(8, 300.0), withdrawal(22, 5.0)];
        let claims = vec![claim(9, 40.0)];
        let boundaries = Boundaries::custom(vec![20, 30]).unwrap();
        let policy = LowerBound::PreTick;
        let backfill = Backfill {
            deposits: &deposits,
            claims: &claims,
            withdrawals: &withdrawals,
            before: boundaries.pre_tick_sentinel(),
        };

        let tvl = reconstruct_tvl(
            &aggregate_deposits(&deposits, &boundaries, policy, &Thresholds::deposits()),
            &aggregate_claims(&claims, &boundaries, policy, &Thresholds::claims()),
            &aggregate_withdrawals(&withdrawals, &boundaries, policy),
            Some(backfill),
        );

        assert_eq!(tvl.prior_tvl, 940.0);
        let values: Vec<f64> = tvl.points.iter().map(|p| p.tvl).collect();
        assert_eq!(values, vec![940.0, 945.0]);
    }

    #[test]
    fn test_backfill_boundary_is_exclusive() {
        let deposits = vec![deposit(9, 1.0), deposit(10, 2.0)];
        let backfill = Backfill {
            deposits: &deposits,
            claims: &[],
            withdrawals: &[],
            before: 10,
        };
        assert_eq!(backfill.prior_tvl(), 1.0);
    }
}
