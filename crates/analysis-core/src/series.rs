//! Aligned series helpers shared by the indicator engine.
//!
//! A [`Series`] holds one slot per price bar. `None` marks a bar where the
//! value is undefined: a warm-up prefix, the tail of a centered window, or a
//! bar where the math degenerates (zero range, zero divisor). NaN never
//! appears in a `Series`.

use std::collections::VecDeque;

pub type Series = Vec<Option<f64>>;

/// Lift a fully-defined slice into a [`Series`].
pub fn lift(data: &[f64]) -> Series {
    data.iter().map(|&v| Some(v)).collect()
}

/// Trailing mean over `window` slots, maintained as a running sum.
///
/// A slot is defined only when every value inside its window is defined.
/// A window holding only zeros averages to exactly `0.0`, so callers can
/// test for a zero divisor without float residue from earlier windows.
pub fn rolling_mean(values: &[Option<f64>], window: usize) -> Series {
    let mut out = vec![None; values.len()];
    if window == 0 {
        return out;
    }

    let mut sum = 0.0;
    let mut missing = 0usize;
    let mut nonzero = 0usize;

    for i in 0..values.len() {
        match values[i] {
            Some(v) => {
                sum += v;
                if v != 0.0 {
                    nonzero += 1;
                }
            }
            None => missing += 1,
        }
        if i >= window {
            match values[i - window] {
                Some(v) => {
                    sum -= v;
                    if v != 0.0 {
                        nonzero -= 1;
                    }
                }
                None => missing -= 1,
            }
        }
        if nonzero == 0 {
            sum = 0.0;
        }
        if i + 1 >= window && missing == 0 {
            out[i] = Some(sum / window as f64);
        }
    }

    out
}

/// Trailing minimum over `window` values (monotonic deque, O(n)).
pub fn rolling_min(data: &[f64], window: usize) -> Series {
    rolling_extreme(data, window, |incoming, queued| incoming <= queued)
}

/// Trailing maximum over `window` values (monotonic deque, O(n)).
pub fn rolling_max(data: &[f64], window: usize) -> Series {
    rolling_extreme(data, window, |incoming, queued| incoming >= queued)
}

fn rolling_extreme(data: &[f64], window: usize, evicts: impl Fn(f64, f64) -> bool) -> Series {
    let mut out = vec![None; data.len()];
    if window == 0 {
        return out;
    }

    // Indices whose values are monotonic from front (current extreme) to back.
    let mut deque: VecDeque<usize> = VecDeque::with_capacity(window);

    for (i, &value) in data.iter().enumerate() {
        while let Some(&back) = deque.back() {
            if evicts(value, data[back]) {
                deque.pop_back();
            } else {
                break;
            }
        }
        deque.push_back(i);

        if let Some(&front) = deque.front() {
            if front + window <= i {
                deque.pop_front();
            }
        }

        if i + 1 >= window {
            out[i] = deque.front().map(|&j| data[j]);
        }
    }

    out
}

/// Re-align a trailing-window series so each slot sits at the center of its
/// window.
///
/// A trailing value at index `j` covers `j + 1 - window ..= j`; centered, it
/// lands at `j - (window - 1) / 2`. For even windows the extra bar falls
/// before the center. The last `(window - 1) / 2` slots are always `None`.
pub fn centered(trailing: &[Option<f64>], window: usize) -> Series {
    let offset = window.saturating_sub(1) / 2;
    (0..trailing.len())
        .map(|i| value_at(trailing, i + offset))
        .collect()
}

/// Most recent defined value, if any.
pub fn last_defined(series: &[Option<f64>]) -> Option<f64> {
    series.iter().rev().find_map(|v| *v)
}

/// Value at `index`, `None` when out of range or undefined.
pub fn value_at(series: &[Option<f64>], index: usize) -> Option<f64> {
    series.get(index).copied().flatten()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_rolling_mean_warm_up_is_undefined() {
        let result = rolling_mean(&lift(&[1.0, 2.0, 3.0, 4.0, 5.0]), 3);

        assert_eq!(result.len(), 5);
        assert_eq!(result[0], None);
        assert_eq!(result[1], None);
        assert_abs_diff_eq!(result[2].unwrap(), 2.0);
        assert_abs_diff_eq!(result[3].unwrap(), 3.0);
        assert_abs_diff_eq!(result[4].unwrap(), 4.0);
    }

    #[test]
    fn test_rolling_mean_skips_windows_with_gaps() {
        let values = vec![Some(1.0), None, Some(3.0), Some(4.0), Some(5.0), Some(6.0)];
        let result = rolling_mean(&values, 3);

        assert_eq!(&result[..4], &[None, None, None, None]);
        assert_abs_diff_eq!(result[4].unwrap(), 4.0);
        assert_abs_diff_eq!(result[5].unwrap(), 5.0);
    }

    #[test]
    fn test_rolling_mean_zero_window_is_exact() {
        let values = lift(&[0.1, 0.2, 0.0, 0.0, 0.0]);
        let result = rolling_mean(&values, 3);

        assert_eq!(result[4], Some(0.0));
    }

    #[test]
    fn test_rolling_mean_window_longer_than_data() {
        let result = rolling_mean(&lift(&[1.0, 2.0]), 5);
        assert_eq!(result, vec![None, None]);

        let zero = rolling_mean(&lift(&[1.0, 2.0]), 0);
        assert_eq!(zero, vec![None, None]);
    }

    #[test]
    fn test_rolling_min_max_match_naive_scan() {
        let data = vec![5.0, 3.0, 8.0, 1.0, 4.0, 9.0, 2.0, 2.0, 7.0, 6.0];
        let window = 4;
        let mins = rolling_min(&data, window);
        let maxs = rolling_max(&data, window);

        for i in 0..data.len() {
            if i + 1 < window {
                assert_eq!(mins[i], None);
                assert_eq!(maxs[i], None);
                continue;
            }
            let slice = &data[i + 1 - window..=i];
            let naive_min = slice.iter().copied().fold(f64::INFINITY, f64::min);
            let naive_max = slice.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            assert_eq!(mins[i], Some(naive_min), "min at {}", i);
            assert_eq!(maxs[i], Some(naive_max), "max at {}", i);
        }
    }

    #[test]
    fn test_centered_even_window_bounds() {
        let data: Vec<f64> = (0..30).map(|i| i as f64).collect();
        let trailing = rolling_min(&data, 10);
        let result = centered(&trailing, 10);

        // Window for index i spans i-5 ..= i+4.
        for (i, value) in result.iter().enumerate() {
            if (5..=25).contains(&i) {
                assert_eq!(*value, Some((i - 5) as f64), "index {}", i);
            } else {
                assert_eq!(*value, None, "index {}", i);
            }
        }
    }

    #[test]
    fn test_centered_odd_window_is_symmetric() {
        let data: Vec<f64> = (0..10).map(|i| i as f64).collect();
        let result = centered(&rolling_max(&data, 3), 3);

        assert_eq!(result[0], None);
        assert_eq!(result[1], Some(2.0));
        assert_eq!(result[8], Some(9.0));
        assert_eq!(result[9], None);
    }

    #[test]
    fn test_last_defined_and_value_at() {
        let series = vec![None, Some(2.0), Some(3.0), None, None];

        assert_eq!(last_defined(&series), Some(3.0));
        assert_eq!(last_defined(&[None, None]), None);
        assert_eq!(value_at(&series, 1), Some(2.0));
        assert_eq!(value_at(&series, 3), None);
        assert_eq!(value_at(&series, 99), None);
    }
}
