//! Per-minute aggregation of irregular observations
//!
//! Observations are bucketed by `floor(t)`. Each minute of the horizon gets
//! the mean of its bucket, or 0 when nothing was observed. Observations that
//! fall outside `[0, minutes)` are ignored.

use crate::Observation;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TimeSeries {
    values: Vec<f64>,
}

impl TimeSeries {
    pub fn from_observations(observations: &[Observation], minutes: usize) -> TimeSeries {
        let mut sums = vec![0.0; minutes];
        let mut counts = vec![0usize; minutes];

        for observation in observations {
            let minute = observation.t.floor();
            if !(minute >= 0.0 && minute < minutes as f64) {
                continue;
            }
            let minute = minute as usize;
            sums[minute] += observation.value;
            counts[minute] += 1;
        }

        let values = sums
            .into_iter()
            .zip(counts)
            .map(|(sum, count)| if count == 0 { 0.0 } else { sum / count as f64 })
            .collect();

        TimeSeries { values }
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, minute: usize) -> Option<f64> {
        self.values.get(minute).copied()
    }

    /// Arithmetic mean, 0 for an empty series
    pub fn mean(&self) -> f64 {
        if self.values.is_empty() {
            return 0.0;
        }
        self.values.iter().sum::<f64>() / self.values.len() as f64
    }

    /// Largest value, 0 for an empty series
    pub fn max(&self) -> f64 {
        self.values.iter().copied().reduce(f64::max).unwrap_or(0.0)
    }

    /// One observation per minute, stamped at the start of the minute
    pub fn to_observations(&self) -> Vec<Observation> {
        self.values
            .iter()
            .enumerate()
            .map(|(minute, &value)| Observation::new(minute as f64, value))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use proptest::prelude::*;

    fn obs(t: f64, value: f64) -> Observation {
        Observation::new(t, value)
    }

    #[test]
    fn test_empty_history_gives_zero_series() {
        let series = TimeSeries::from_observations(&[], 4);
        assert_eq!(series.values(), &[0.0, 0.0, 0.0, 0.0]);
        assert_eq!(series.mean(), 0.0);
        assert_eq!(series.max(), 0.0);
    }

    #[test]
    fn test_zero_minutes_gives_empty_series() {
        let series = TimeSeries::from_observations(&[obs(0.5, 3.0)], 0);
        assert!(series.is_empty());
        assert_eq!(series.mean(), 0.0);
        assert_eq!(series.max(), 0.0);
    }

    #[test]
    fn test_bucket_mean_per_minute() {
        let history = vec![
            obs(0.0, 2.0),
            obs(0.1, 4.0),
            obs(0.99, 6.0),
            obs(2.0, 10.0),
            obs(2.5, 20.0),
        ];

        let series = TimeSeries::from_observations(&history, 3);

        assert_eq!(series.len(), 3);
        assert_relative_eq!(series.values()[0], 4.0);
        assert_eq!(series.values()[1], 0.0);
        assert_relative_eq!(series.values()[2], 15.0);
        assert_relative_eq!(series.max(), 15.0);
        assert_relative_eq!(series.mean(), 19.0 / 3.0);
    }

    #[test]
    fn test_insertion_order_does_not_matter() {
        let history = vec![obs(1.2, 1.0), obs(0.3, 5.0), obs(1.7, 3.0), obs(0.0, 7.0)];
        let mut reversed = history.clone();
        reversed.reverse();

        assert_eq!(
            TimeSeries::from_observations(&history, 2),
            TimeSeries::from_observations(&reversed, 2)
        );
    }

    #[test]
    fn test_out_of_range_observations_are_ignored() {
        let history = vec![
            obs(-0.5, 100.0),
            obs(0.5, 1.0),
            obs(3.0, 100.0),
            obs(f64::NAN, 100.0),
        ];

        let series = TimeSeries::from_observations(&history, 3);

        assert_eq!(series.values(), &[1.0, 0.0, 0.0]);
    }

    proptest! {
        #[test]
        fn aggregating_a_series_reproduces_it(values in prop::collection::vec(0.0f64..1000.0, 0..200)) {
            let series = TimeSeries::from_observations(
                &values.iter().enumerate().map(|(m, &v)| obs(m as f64 + 0.25, v)).collect::<Vec<_>>(),
                values.len(),
            );

            let again = TimeSeries::from_observations(&series.to_observations(), series.len());

            prop_assert_eq!(again, series);
        }
    }
}
