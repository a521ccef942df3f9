//! Percentile and average over finite sample sets
//!
//! Percentiles use the nearest-rank method on an ascending copy of the
//! input: index `round(p / 100 * (n - 1))`, clamped to the last element.
//! Empty input or a percentile outside `[0, 100]` yields 0, which callers
//! must read as "no data".

use crate::models::MetricStat;

/// Percentile of `values` (nearest rank after sorting)
pub fn percentile(values: &[f64], p: f64) -> f64 {
    if values.is_empty() || !(0.0..=100.0).contains(&p) {
        return 0.0;
    }
    let sorted = sorted_copy(values);
    percentile_sorted(&sorted, p)
}

/// Arithmetic mean, 0 for an empty slice.
///
/// Summed in ascending order so the result does not depend on input order.
pub fn average(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    mean_sorted(&sorted_copy(values))
}

/// p50/p95/avg for one dimension, `None` when there are no values
pub fn summarize(values: &[f64]) -> Option<MetricStat> {
    if values.is_empty() {
        return None;
    }
    let sorted = sorted_copy(values);
    Some(MetricStat {
        p50: percentile_sorted(&sorted, 50.0),
        p95: percentile_sorted(&sorted, 95.0),
        avg: mean_sorted(&sorted),
    })
}

fn sorted_copy(values: &[f64]) -> Vec<f64> {
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    sorted
}

fn mean_sorted(sorted: &[f64]) -> f64 {
    sorted.iter().sum::<f64>() / sorted.len() as f64
}

fn percentile_sorted(sorted: &[f64], p: f64) -> f64 {
    if sorted.is_empty() || !(0.0..=100.0).contains(&p) {
        return 0.0;
    }
    let rank = (p / 100.0 * (sorted.len() - 1) as f64).round() as usize;
    sorted[rank.min(sorted.len() - 1)]
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_percentile_nearest_rank() {
        let values = vec![10.0, 1.0, 9.0, 2.0, 8.0, 3.0, 7.0, 4.0, 6.0, 5.0];
        // rank = round(0.5 * 9) = round(4.5) = 5
        assert_eq!(percentile(&values, 50.0), 6.0);
        // rank = round(0.95 * 9) = round(8.55) = 9
        assert_eq!(percentile(&values, 95.0), 10.0);
        assert_eq!(percentile(&values, 0.0), 1.0);
        assert_eq!(percentile(&values, 100.0), 10.0);
    }

    #[test]
    fn test_percentile_median_of_odd_count() {
        assert_eq!(percentile(&[5.0, 1.0, 3.0], 50.0), 3.0);
    }

    #[test]
    fn test_percentile_out_of_range_is_zero() {
        let values = [1.0, 2.0, 3.0];
        assert_eq!(percentile(&[], 50.0), 0.0);
        assert_eq!(percentile(&values, -1.0), 0.0);
        assert_eq!(percentile(&values, 101.0), 0.0);
        assert_eq!(percentile(&values, f64::NAN), 0.0);
    }

    #[test]
    fn test_average() {
        assert_eq!(average(&[]), 0.0);
        assert_eq!(average(&[4.5]), 4.5);
        assert_eq!(average(&[1.0, 2.0, 3.0, 6.0]), 3.0);
    }

    #[test]
    fn test_summarize_empty_is_none() {
        assert!(summarize(&[]).is_none());
        let stat = summarize(&[100.0; 10]).unwrap();
        assert_eq!(stat.p50, 100.0);
        assert_eq!(stat.p95, 100.0);
        assert_eq!(stat.avg, 100.0);
    }

    proptest! {
        #[test]
        fn percentile_matches_sorted_index(
            values in prop::collection::vec(-1.0e6f64..1.0e6, 1..200),
            p in 0.0f64..=100.0,
        ) {
            let mut sorted = values.clone();
            sorted.sort_by(f64::total_cmp);
            let idx = ((p / 100.0) * (sorted.len() - 1) as f64).round() as usize;
            let expected = sorted[idx.min(sorted.len() - 1)];
            prop_assert_eq!(percentile(&values, p), expected);
        }

        #[test]
        fn percentile_ignores_input_order(
            values in prop::collection::vec(0.0f64..1.0e4, 1..100),
            p in 0.0f64..=100.0,
        ) {
            let mut reversed = values.clone();
            reversed.reverse();
            prop_assert_eq!(percentile(&values, p), percentile(&reversed, p));
        }

        #[test]
        fn average_ignores_input_order(
            values in prop::collection::vec(0.0f64..1.0e4, 1..100),
        ) {
            let mut reversed = values.clone();
            reversed.reverse();
            prop_assert_eq!(average(&values), average(&reversed));
            prop_assert_eq!(summarize(&values).unwrap().avg, average(&reversed));
        }

        #[test]
        fn average_is_bounded_by_extremes(
            values in prop::collection::vec(-1.0e6f64..1.0e6, 1..100),
        ) {
            let min = values.iter().cloned().fold(f64::INFINITY, f64::min);
            let max = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
            let avg = average(&values);
            prop_assert!(avg >= min - 1e-6 && avg <= max + 1e-6);
        }
    }
}
