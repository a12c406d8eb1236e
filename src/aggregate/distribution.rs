/// Magnitude thresholds for amount histograms

use serde::{Deserialize, Serialize};

pub const DEPOSIT_THRESHOLDS: [f64; 6] = [1.0, 10.0, 100.0, 1_000.0, 10_000.0, 100_000.0];
pub const CLAIM_THRESHOLDS: [f64; 7] = [1.0, 5.0, 10.0, 50.0, 100.0, 500.0, 1_000.0];

/// Ordered amount thresholds; an amount is counted under the largest
/// threshold it meets, amounts below the smallest are not counted at all
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<f64>", into = "Vec<f64>")]
pub struct Thresholds(Vec<f64>);

impl Thresholds {
    pub fn new(mut thresholds: Vec<f64>) -> Self {
        thresholds.retain(|t| t.is_finite());
        thresholds.sort_by(f64::total_cmp);
        thresholds.dedup();
        Self(thresholds)
    }

    pub fn deposits() -> Self {
        Self::new(DEPOSIT_THRESHOLDS.to_vec())
    }

    pub fn claims() -> Self {
        Self::new(CLAIM_THRESHOLDS.to_vec())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn values(&self) -> &[f64] {
        &self.0
    }

    /// Histogram slot for `amount`
    pub fn slot_for(&self, amount: f64) -> Option<usize> {
        self.0.iter().rposition(|&threshold| amount >= threshold)
    }
}

impl From<Vec<f64>> for Thresholds {
    fn from(thresholds: Vec<f64>) -> Self {
        Self::new(thresholds)
    }
}

impl From<Thresholds> for Vec<f64> {
    fn from(thresholds: Thresholds) -> Self {
        thresholds.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slot_is_largest_threshold_met() {
        let thresholds = Thresholds::deposits();
        assert_eq!(thresholds.slot_for(0.99), None);
        assert_eq!(thresholds.slot_for(1.0), Some(0));
        assert_eq!(thresholds.slot_for(9.99), Some(0));
        assert_eq!(thresholds.slot_for(10.0), Some(1));
        assert_eq!(thresholds.slot_for(99_999.0), Some(4));
        assert_eq!(thresholds.slot_for(5_000_000.0), Some(5));
    }

    #[test]
    fn test_claim_thresholds() {
        let thresholds = Thresholds::claims();
        assert_eq!(thresholds.len(), 7);
        assert_eq!(thresholds.slot_for(7.5), Some(1));
        assert_eq!(thresholds.slot_for(500.0), Some(5));
    }

    #[test]
    fn test_unsorted_input_is_normalised() {
        let thresholds = Thresholds::new(vec![100.0, 1.0, f64::NAN, 10.0, 10.0]);
        assert_eq!(thresholds.values(), &[1.0, 10.0, 100.0]);
    }
}
