#[cfg(test)]
mod tests {
    use super::super::indicators::*;
    use analysis_core::PriceBar;
    use approx::assert_abs_diff_eq;
    use chrono::NaiveDate;

    // Helper function to create sample price data
    fn sample_prices() -> Vec<f64> {
        vec![
            44.34, 44.09, 44.15, 43.61, 44.33, 44.83, 45.10, 45.42, 45.84, 46.08,
            45.89, 46.03, 45.61, 46.28, 46.28, 46.00, 46.03, 46.41, 46.22, 45.64,
        ]
    }

    // Helper function to create sample bars
    fn sample_bars() -> Vec<PriceBar> {
        let prices = vec![
            (100.0, 102.0, 99.0, 101.0),
            (101.0, 103.0, 100.0, 102.0),
            (102.0, 104.0, 101.0, 103.0),
            (103.0, 105.0, 102.0, 104.0),
            (104.0, 106.0, 103.0, 105.0),
            (105.0, 107.0, 104.0, 106.0),
            (106.0, 108.0, 105.0, 107.0),
            (107.0, 109.0, 106.0, 108.0),
            (108.0, 110.0, 107.0, 109.0),
            (109.0, 111.0, 108.0, 110.0),
            (110.0, 112.0, 109.0, 111.0),
            (111.0, 113.0, 110.0, 112.0),
            (112.0, 114.0, 111.0, 113.0),
            (113.0, 115.0, 112.0, 114.0),
            (114.0, 116.0, 113.0, 115.0),
            (115.0, 117.0, 114.0, 116.0),
            (116.0, 118.0, 115.0, 117.0),
            (117.0, 119.0, 116.0, 118.0),
        ];

        let start = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        prices
            .into_iter()
            .enumerate()
            .map(|(i, (open, high, low, close))| PriceBar {
                date: start + chrono::Duration::days(i as i64),
                open,
                high,
                low,
                close,
                volume: 1000000.0,
            })
            .collect()
    }

    fn flat_bars(len: usize, price: f64) -> Vec<PriceBar> {
        let start = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        (0..len)
            .map(|i| PriceBar {
                date: start + chrono::Duration::days(i as i64),
                open: price,
                high: price,
                low: price,
                close: price,
                volume: 1000.0,
            })
            .collect()
    }

    #[test]
    fn test_sma_basic() {
        let data = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        let result = sma(&data, 3);

        assert_eq!(result.len(), 5);
        assert_eq!(result[0], None);
        assert_eq!(result[1], None);
        assert_abs_diff_eq!(result[2].unwrap(), 2.0); // (1+2+3)/3 = 2
        assert_abs_diff_eq!(result[3].unwrap(), 3.0); // (2+3+4)/3 = 3
        assert_abs_diff_eq!(result[4].unwrap(), 4.0); // (3+4+5)/3 = 4
    }

    #[test]
    fn test_sma_insufficient_data() {
        let data = vec![1.0, 2.0];
        let result = sma(&data, 5);

        // Aligned with the input, but nothing is warmed up
        assert_eq!(result, vec![None, None]);
    }

    #[test]
    fn test_sma_real_prices() {
        let prices = sample_prices();
        let result = sma(&prices, 5);

        let expected_first = (44.34 + 44.09 + 44.15 + 43.61 + 44.33) / 5.0;
        assert_abs_diff_eq!(result[4].unwrap(), expected_first, epsilon = 1e-9);
    }

    #[test]
    fn test_ema_seeded_with_first_value() {
        let data = vec![22.0, 24.0, 23.0, 25.0, 26.0];
        for period in [1, 3, 12, 26, 200] {
            let result = ema(&data, period);
            assert_eq!(result.len(), data.len());
            assert_eq!(result[0], 22.0);
        }
    }

    #[test]
    fn test_ema_recursion() {
        let data = vec![22.0, 24.0, 23.0];
        let result = ema(&data, 3);

        // alpha = 0.5
        assert_abs_diff_eq!(result[1], 23.0, epsilon = 1e-12);
        assert_abs_diff_eq!(result[2], 23.0, epsilon = 1e-12);
    }

    #[test]
    fn test_ema_empty_data() {
        let data: Vec<f64> = vec![];
        let result = ema(&data, 5);

        assert_eq!(result.len(), 0);
    }

    #[test]
    fn test_ema_increases_with_uptrend() {
        let data = vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0, 10.0];
        let result = ema(&data, 3);

        for i in 1..result.len() {
            assert!(result[i] > result[i - 1]);
        }
    }

    #[test]
    fn test_rsi_warm_up() {
        let prices = sample_prices();
        let result = rsi(&prices, 14);

        assert_eq!(result.len(), prices.len());
        assert!(result[..13].iter().all(Option::is_none));
        assert!(result[13..].iter().all(Option::is_some));
    }

    #[test]
    fn test_rsi_bounded() {
        let prices = sample_prices();
        for value in rsi(&prices, 14).into_iter().flatten() {
            assert!((0.0..=100.0).contains(&value));
        }
    }

    #[test]
    fn test_rsi_known_value() {
        let prices = sample_prices();
        let result = rsi(&prices, 14);

        // Index 13 averages the first 13 changes plus the zero change at index 0.
        let mut gains = 0.0;
        let mut losses = 0.0;
        for i in 1..=13 {
            let change = prices[i] - prices[i - 1];
            if change > 0.0 {
                gains += change;
            } else {
                losses -= change;
            }
        }
        let rs = (gains / 14.0) / (losses / 14.0);
        assert_abs_diff_eq!(result[13].unwrap(), 100.0 - 100.0 / (1.0 + rs), epsilon = 1e-9);
    }

    #[test]
    fn test_rsi_no_losses_is_100() {
        let mut uptrend = vec![100.0];
        for i in 1..20 {
            uptrend.push(100.0 + i as f64);
        }

        let result = rsi(&uptrend, 14);
        for value in result.into_iter().flatten() {
            assert_eq!(value, 100.0);
        }
    }

    #[test]
    fn test_rsi_no_gains_is_0() {
        let downtrend: Vec<f64> = (0..20).map(|i| 100.0 - i as f64).collect();
        let result = rsi(&downtrend, 14);

        assert_eq!(result[19], Some(0.0));
    }

    #[test]
    fn test_rsi_flat_prices_do_not_produce_nan() {
        let flat = vec![10.0; 30];
        let result = rsi(&flat, 14);

        for value in result.into_iter().flatten() {
            assert_eq!(value, 100.0);
        }
    }

    #[test]
    fn test_rsi_exact_after_losses_leave_window() {
        // A loss early on, then only flat and rising bars: once the loss drops
        // out of the 14-bar window RSI must read exactly 100.
        let mut data = vec![10.0, 9.7, 9.9];
        for i in 0..20 {
            data.push(9.9 + 0.1 * i as f64);
        }
        let result = rsi(&data, 14);

        assert_eq!(result[data.len() - 1], Some(100.0));
    }

    #[test]
    fn test_macd_basic() {
        let prices = sample_prices();
        let result = macd(&prices, 12, 26, 9);

        assert_eq!(result.macd_line.len(), prices.len());
        assert_eq!(result.signal_line.len(), prices.len());
        assert_eq!(result.histogram.len(), prices.len());
        assert_eq!(result.macd_line[0], 0.0);
        assert_eq!(result.signal_line[0], result.macd_line[0]);
    }

    #[test]
    fn test_macd_is_ema_difference() {
        let prices = sample_prices();
        let result = macd(&prices, 12, 26, 9);
        let fast = ema(&prices, 12);
        let slow = ema(&prices, 26);

        for i in 0..prices.len() {
            assert_abs_diff_eq!(result.macd_line[i], fast[i] - slow[i], epsilon = 1e-9);
        }
    }

    #[test]
    fn test_macd_histogram() {
        let prices = sample_prices();
        let result = macd(&prices, 12, 26, 9);

        for (i, &hist) in result.histogram.iter().enumerate() {
            let expected = result.macd_line[i] - result.signal_line[i];
            assert_abs_diff_eq!(hist, expected, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_stochastic_basic() {
        let bars = sample_bars();
        let result = stochastic(&bars, 14, 3);

        assert_eq!(result.k.len(), bars.len());
        assert_eq!(result.d.len(), bars.len());
        assert!(result.k[..13].iter().all(Option::is_none));
        assert!(result.d[..15].iter().all(Option::is_none));

        for value in result.k.iter().chain(result.d.iter()).flatten() {
            assert!((0.0..=100.0).contains(value));
        }
    }

    #[test]
    fn test_stochastic_known_value() {
        let bars = sample_bars();
        let result = stochastic(&bars, 14, 3);

        // Bar 13: low14 = 99 (bar 0), high14 = 115 (bar 13), close = 114
        let expected = 100.0 * (114.0 - 99.0) / (115.0 - 99.0);
        assert_abs_diff_eq!(result.k[13].unwrap(), expected, epsilon = 1e-9);

        let k = &result.k;
        let expected_d = (k[13].unwrap() + k[14].unwrap() + k[15].unwrap()) / 3.0;
        assert_abs_diff_eq!(result.d[15].unwrap(), expected_d, epsilon = 1e-9);
    }

    #[test]
    fn test_stochastic_flat_range_is_undefined() {
        let bars = flat_bars(20, 50.0);
        let result = stochastic(&bars, 14, 3);

        assert!(result.k.iter().all(Option::is_none));
        assert!(result.d.iter().all(Option::is_none));
    }

    #[test]
    fn test_stochastic_insufficient_data() {
        let bars = sample_bars()[..5].to_vec();
        let result = stochastic(&bars, 14, 3);

        assert_eq!(result.k.len(), 5);
        assert!(result.k.iter().all(Option::is_none));
    }

    #[test]
    fn test_support_resistance_centered_tail_undefined() {
        let bars = sample_bars();
        let result = support_resistance(&bars, 10);

        // 18 bars, window 10: defined for indices 5..=13
        for i in 0..bars.len() {
            let defined = (5..=13).contains(&i);
            assert_eq!(result.support[i].is_some(), defined, "support {}", i);
            assert_eq!(result.resistance[i].is_some(), defined, "resistance {}", i);
        }

        // Index 13 spans bars 8..=17
        assert_eq!(result.support[13], Some(107.0));
        assert_eq!(result.resistance[13], Some(119.0));
    }

    #[test]
    fn test_support_resistance_short_series() {
        let bars = sample_bars()[..6].to_vec();
        let result = support_resistance(&bars, 10);

        assert!(result.support.iter().all(Option::is_none));
        assert!(result.resistance.iter().all(Option::is_none));
    }
}
