use serde::{Deserialize, Serialize};

use crate::Score;

/// Count and sum of the scores currently recorded for one title.
///
/// Storage produces one of these from live rows on every read; the rating is
/// derived from it and never stored.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreSummary {
    pub count: u64,
    pub total: u64,
}

impl ScoreSummary {
    pub fn from_scores<I>(scores: I) -> Self
    where
        I: IntoIterator<Item = Score>,
    {
        scores.into_iter().fold(Self::default(), |acc, s| Self {
            count: acc.count + 1,
            total: acc.total + u64::from(s.get()),
        })
    }

    /// Arithmetic mean of the scores, `None` when there are none.
    pub fn mean(&self) -> Option<f64> {
        if self.count == 0 {
            None
        } else {
            Some(self.total as f64 / self.count as f64)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn scores(values: &[i64]) -> Vec<Score> {
        values.iter().map(|v| Score::new(*v).unwrap()).collect()
    }

    #[test]
    fn empty_has_no_rating() {
        assert_eq!(ScoreSummary::from_scores(Vec::new()).mean(), None);
    }

    #[test]
    fn mean_is_not_rounded() {
        let summary = ScoreSummary::from_scores(scores(&[10, 7]));
        assert_eq!(summary, ScoreSummary { count: 2, total: 17 });
        assert_eq!(summary.mean(), Some(8.5));
    }

    proptest! {
        #[test]
        fn mean_matches_arithmetic_mean(values in proptest::collection::vec(1i64..=10, 0..64)) {
            let summary = ScoreSummary::from_scores(scores(&values));
            match summary.mean() {
                None => prop_assert!(values.is_empty()),
                Some(mean) => {
                    let expected = values.iter().sum::<i64>() as f64 / values.len() as f64;
                    prop_assert!((mean - expected).abs() < 1e-9);
                    prop_assert!((1.0..=10.0).contains(&mean));
                }
            }
        }
    }
}
