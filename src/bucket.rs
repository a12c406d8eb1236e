/// Time bucketing: boundary generation and bucket membership

use serde::{Deserialize, Serialize};
use tracing::debug;

use prizeflow_core::AnalyticsError;

/// How the first bucket's lower edge is chosen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LowerBound {
    /// Bucket 0 holds everything up to the first boundary
    #[default]
    FullHistory,
    /// Bucket 0 starts one tick before the first boundary
    PreTick,
}

/// Ascending bucket boundaries; bucket `i` ends (inclusive) at `boundaries[i]`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<i64>", into = "Vec<i64>")]
pub struct Boundaries(Vec<i64>);

impl TryFrom<Vec<i64>> for Boundaries {
    type Error = AnalyticsError;

    fn try_from(boundaries: Vec<i64>) -> Result<Self, Self::Error> {
        Self::custom(boundaries)
    }
}

impl From<Boundaries> for Vec<i64> {
    fn from(boundaries: Boundaries) -> Self {
        boundaries.0
    }
}

impl Boundaries {
    /// Evenly spaced boundaries from `start` to `end`.
    ///
    /// Each boundary is the ceiling of the running `start + k * tick` for
    /// `k >= 1`, kept while it stays below `end`, and the sequence closes with
    /// `end`. `start` itself is not a boundary: it is where the pre-tick
    /// sentinel lands. Ceiling rounding decides how many interior points
    /// survive, so the realized length is usually `count`. A single bucket
    /// reports both window endpoints.
    pub fn even(start: i64, end: i64, count: usize) -> Result<Self, AnalyticsError> {
        if count == 0 {
            return Err(AnalyticsError::ZeroBuckets);
        }
        if end < start {
            return Err(AnalyticsError::InvertedRange { start, end });
        }
        if count == 1 {
            return Ok(Self(vec![start, end]));
        }

        let tick = (end - start) as f64 / count as f64;
        let mut boundaries = Vec::with_capacity(count);

        // Running sum stays fractional; only emitted boundaries are rounded
        let mut acc = start as f64;
        while tick > 0.0 && ((acc + tick).ceil() as i64) < end {
            acc += tick;
            boundaries.push(acc.ceil() as i64);
        }
        boundaries.push(end);

        debug!(start, end, requested = count, realized = boundaries.len(), "Computed bucket boundaries");
        Ok(Self(boundaries))
    }

    /// Caller-supplied boundaries, validated for order
    pub fn custom(boundaries: Vec<i64>) -> Result<Self, AnalyticsError> {
        if boundaries.is_empty() {
            return Err(AnalyticsError::EmptyBoundaries);
        }
        if let Some(pair) = boundaries.windows(2).find(|pair| pair[1] < pair[0]) {
            return Err(AnalyticsError::DecreasingBoundaries {
                previous: pair[0],
                next: pair[1],
            });
        }
        Ok(Self(boundaries))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[i64] {
        &self.0
    }

    pub fn first(&self) -> i64 {
        self.0[0]
    }

    pub fn last(&self) -> i64 {
        self.0[self.0.len() - 1]
    }

    /// Width of the first bucket, zero when there is only one boundary
    pub fn tick(&self) -> i64 {
        match self.0.as_slice() {
            [first, second, ..] => second - first,
            _ => 0,
        }
    }

    /// Lower bound of bucket 0 under [`LowerBound::PreTick`]
    pub fn pre_tick_sentinel(&self) -> i64 {
        self.first() - self.tick()
    }

    /// Whether `timestamp` falls in bucket `index` under `policy`
    pub fn contains(&self, index: usize, timestamp: i64, policy: LowerBound) -> bool {
        if timestamp > self.0[index] {
            return false;
        }
        if index > 0 {
            return timestamp > self.0[index - 1];
        }
        match policy {
            LowerBound::FullHistory => true,
            LowerBound::PreTick => timestamp >= self.pre_tick_sentinel(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_even_boundaries_exact_sequence() {
        let boundaries = Boundaries::even(0, 100, 10).unwrap();
        assert_eq!(
            boundaries.as_slice(),
            &[10, 20, 30, 40, 50, 60, 70, 80, 90, 100]
        );
        assert_eq!(boundaries.len(), 10);
        assert_eq!(boundaries.pre_tick_sentinel(), 0);
    }

    #[test]
    fn test_even_boundaries_leave_start_to_the_sentinel() {
        let boundaries = Boundaries::even(1, 5, 2).unwrap();
        assert_eq!(boundaries.as_slice(), &[3, 5]);
        assert_eq!(boundaries.pre_tick_sentinel(), 1);
        assert!(boundaries.contains(0, 1, LowerBound::PreTick));
        assert!(!boundaries.contains(0, 0, LowerBound::PreTick));
    }

    #[test]
    fn test_even_boundaries_ceiling_rounding() {
        // tick = 3.333.., ceilings 4 and 7, then ceil(10.0) is not below the end
        let boundaries = Boundaries::even(0, 10, 3).unwrap();
        assert_eq!(boundaries.as_slice(), &[4, 7, 10]);

        // sub-second ticks collapse onto the same second
        let boundaries = Boundaries::even(0, 3, 6).unwrap();
        assert_eq!(boundaries.as_slice(), &[1, 1, 2, 2, 3]);
    }

    #[test]
    fn test_single_bucket_reports_window_endpoints() {
        let boundaries = Boundaries::even(1_700_000_000, 1_700_086_400, 1).unwrap();
        assert_eq!(boundaries.as_slice(), &[1_700_000_000, 1_700_086_400]);
    }

    #[test]
    fn test_degenerate_ranges() {
        assert!(matches!(Boundaries::even(5, 5, 4).unwrap().as_slice(), [5]));
        assert!(matches!(Boundaries::even(0, 10, 0), Err(AnalyticsError::ZeroBuckets)));
        assert!(matches!(
            Boundaries::even(10, 0, 4),
            Err(AnalyticsError::InvertedRange { start: 10, end: 0 })
        ));
    }

    #[test]
    fn test_custom_boundaries_validation() {
        assert!(Boundaries::custom(vec![1, 2, 2, 5]).is_ok());
        assert!(matches!(Boundaries::custom(vec![]), Err(AnalyticsError::EmptyBoundaries)));
        assert!(matches!(
            Boundaries::custom(vec![1, 5, 3]),
            Err(AnalyticsError::DecreasingBoundaries { previous: 5, next: 3 })
        ));
    }

    #[test]
    fn test_deserialize_validates_boundaries() {
        let parsed: Boundaries = serde_json::from_str("[1, 2]").unwrap();
        assert_eq!((parsed.first(), parsed.last()), (1, 2));
        assert!(serde_json::from_str::<Boundaries>("[]").is_err());
        assert!(serde_json::from_str::<Boundaries>("[5, 3]").is_err());
        assert_eq!(serde_json::to_string(&parsed).unwrap(), "[1,2]");
    }

    #[test]
    fn test_membership_full_history() {
        let boundaries = Boundaries::custom(vec![10, 20, 30]).unwrap();
        assert!(boundaries.contains(0, -500, LowerBound::FullHistory));
        assert!(boundaries.contains(0, 10, LowerBound::FullHistory));
        assert!(!boundaries.contains(0, 11, LowerBound::FullHistory));
        assert!(boundaries.contains(1, 11, LowerBound::FullHistory));
        assert!(boundaries.contains(1, 20, LowerBound::FullHistory));
        assert!(!boundaries.contains(2, 20, LowerBound::FullHistory));
        assert!(!boundaries.contains(2, 31, LowerBound::FullHistory));
    }

    #[test]
    fn test_membership_pre_tick() {
        let boundaries = Boundaries::custom(vec![10, 20, 30]).unwrap();
        assert_eq!(boundaries.pre_tick_sentinel(), 0);
        assert!(boundaries.contains(0, 0, LowerBound::PreTick));
        assert!(!boundaries.contains(0, -1, LowerBound::PreTick));
        assert!(boundaries.contains(1, 15, LowerBound::PreTick));

        let single = Boundaries::custom(vec![10]).unwrap();
        assert!(single.contains(0, 10, LowerBound::PreTick));
        assert!(!single.contains(0, 9, LowerBound::PreTick));
    }

    #[test]
    fn test_every_timestamp_lands_in_exactly_one_bucket() {
        let boundaries = Boundaries::even(1000, 2000, 7).unwrap();
        for ts in 1000..=2000 {
            let hits = (0..boundaries.len())
                .filter(|&i| boundaries.contains(i, ts, LowerBound::FullHistory))
                .count();
            assert_eq!(hits, 1, "timestamp {ts} hit {hits} buckets");
        }
    }
}
