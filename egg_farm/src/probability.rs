//! Laying and breakage probabilities

pub const MORNING_LAYING_RATE: f64 = 0.03;
pub const MIDDAY_LAYING_RATE: f64 = 0.02;
pub const OFF_PEAK_LAYING_RATE: f64 = 0.01;

pub const BASE_BREAKAGE_RATE: f64 = 0.01;
/// Queue length that adds one full unit of breakage probability
pub const CONGESTION_SCALE: f64 = 1000.0;
pub const MAX_BREAKAGE_RATE: f64 = 0.5;

/// Part of the day that sets the per-hen laying probability
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DayPeriod {
    /// 06:00 – 10:00
    Morning,
    /// 10:00 – 14:00
    Midday,
    OffPeak,
}

impl DayPeriod {
    pub const ALL: [DayPeriod; 3] = [DayPeriod::Morning, DayPeriod::Midday, DayPeriod::OffPeak];

    pub fn from_hour(hour: f64) -> DayPeriod {
        if (6.0..10.0).contains(&hour) {
            DayPeriod::Morning
        } else if (10.0..14.0).contains(&hour) {
            DayPeriod::Midday
        } else {
            DayPeriod::OffPeak
        }
    }

    /// Period at `t` minutes after the start of the run (which starts at midnight)
    pub fn at(t: f64) -> DayPeriod {
        DayPeriod::from_hour((t / 60.0).rem_euclid(24.0))
    }

    pub fn laying_probability(self) -> f64 {
        match self {
            DayPeriod::Morning => MORNING_LAYING_RATE,
            DayPeriod::Midday => MIDDAY_LAYING_RATE,
            DayPeriod::OffPeak => OFF_PEAK_LAYING_RATE,
        }
    }

    pub(crate) fn index(self) -> usize {
        match self {
            DayPeriod::Morning => 0,
            DayPeriod::Midday => 1,
            DayPeriod::OffPeak => 2,
        }
    }
}

/// Per-hen probability of laying during the minute starting at `t`
pub fn laying_probability(t: f64) -> f64 {
    DayPeriod::at(t).laying_probability()
}

/// Probability that an egg arriving behind `queue_length` others breaks
///
/// b(q) = min(0.01 + q / 1000, 0.5)
pub fn breakage_probability(queue_length: usize) -> f64 {
    (BASE_BREAKAGE_RATE + queue_length as f64 / CONGESTION_SCALE).min(MAX_BREAKAGE_RATE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use proptest::prelude::*;

    #[test]
    fn test_laying_probability_by_period() {
        assert_eq!(laying_probability(0.0), 0.01);
        assert_eq!(laying_probability(359.0), 0.01);
        assert_eq!(laying_probability(360.0), 0.03);
        assert_eq!(laying_probability(599.9), 0.03);
        assert_eq!(laying_probability(600.0), 0.02);
        assert_eq!(laying_probability(839.0), 0.02);
        assert_eq!(laying_probability(840.0), 0.01);
        assert_eq!(laying_probability(1439.0), 0.01);
    }

    #[test]
    fn test_laying_probability_wraps_after_a_day() {
        assert_eq!(DayPeriod::at(1440.0 + 400.0), DayPeriod::Morning);
        assert_eq!(DayPeriod::at(2.0 * 1440.0 + 700.0), DayPeriod::Midday);
    }

    #[test]
    fn test_breakage_probability_values() {
        assert_relative_eq!(breakage_probability(0), 0.01);
        assert_relative_eq!(breakage_probability(1), 0.011);
        assert_relative_eq!(breakage_probability(100), 0.11);
        assert_relative_eq!(breakage_probability(490), 0.5);
        assert_relative_eq!(breakage_probability(10_000), 0.5);
    }

    #[test]
    fn test_period_indices_are_distinct() {
        let mut indices: Vec<usize> = DayPeriod::ALL.iter().map(|p| p.index()).collect();
        indices.sort_unstable();
        assert_eq!(indices, vec![0, 1, 2]);
    }

    proptest! {
        #[test]
        fn breakage_is_monotonic_and_capped(a in 0usize..1_000_000, b in 0usize..1_000_000) {
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            prop_assert!(breakage_probability(lo) <= breakage_probability(hi));
            prop_assert!(breakage_probability(hi) <= MAX_BREAKAGE_RATE);
            prop_assert!(breakage_probability(lo) >= BASE_BREAKAGE_RATE);
        }

        #[test]
        fn every_hour_maps_to_exactly_one_rate(hour in 0.0f64..24.0) {
            let p = DayPeriod::from_hour(hour).laying_probability();
            let expected = if (6.0..10.0).contains(&hour) {
                0.03
            } else if (10.0..14.0).contains(&hour) {
                0.02
            } else {
                0.01
            };
            prop_assert_eq!(p, expected);
        }
    }
}
