/// Dashboard aggregation arithmetic tests
///
/// Exercises the value-weighting, score scaling, and degenerate-denominator
/// rules the dashboard endpoint relies on, over the same formulas the
/// service applies per holding.

// ---------------------------------------------------------------------------
// Value weighting
// ---------------------------------------------------------------------------

#[cfg(test)]
mod value_weighting {
    /// weight = stock_value / total, 0 when the denominator is 0
    fn weight(stock_value: f64, total_value: f64) -> f64 {
        if total_value > 0.0 { stock_value / total_value } else { 0.0 }
    }

    #[test]
    fn test_weights_sum_to_one_when_all_resolve() {
        let values = [1500.0, 2500.0, 1000.0];
        let total: f64 = values.iter().sum();
        let sum: f64 = values.iter().map(|v| weight(*v, total)).sum();
        assert!((sum - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_esg_participating_weights_sum_below_one_when_a_company_is_unmatched() {
        // All three resolve a price, but the last has no ESG company match:
        // it keeps its value weight yet contributes nothing to the ESG
        // aggregate, so the participating weights no longer cover 1.0.
        let values = [1500.0, 2500.0, 1000.0];
        let total: f64 = values.iter().sum();
        let participating: f64 = values[..2].iter().map(|v| weight(*v, total)).sum();
        assert!(participating < 1.0);
    }

    #[test]
    fn test_failed_price_lookup_shrinks_the_denominator() {
        // A holding with a failed lookup is excluded from the total, so the
        // remaining holdings still split the full weight between them.
        let total = 1500.0 + 2500.0;
        let sum = weight(1500.0, total) + weight(2500.0, total);
        assert!((sum - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_zero_total_yields_zero_weight() {
        assert_eq!(weight(0.0, 0.0), 0.0);
        assert_eq!(weight(100.0, 0.0), 0.0);
    }
}

// ---------------------------------------------------------------------------
// Score display scaling
// ---------------------------------------------------------------------------

#[cfg(test)]
mod score_scaling {
    /// Stored scores are normalized 0..1; displayed ×100 and rounded half
    /// away from zero to an integer.
    fn display_score(normalized: f64) -> i32 {
        (normalized * 100.0).round() as i32
    }

    #[test]
    fn test_half_rounds_up_at_percent_scale() {
        assert_eq!(display_score(0.755), 76);
    }

    #[test]
    fn test_whole_percent_is_unchanged() {
        assert_eq!(display_score(0.80), 80);
        assert_eq!(display_score(0.0), 0);
        assert_eq!(display_score(1.0), 100);
    }

    #[test]
    fn test_below_half_rounds_down() {
        assert_eq!(display_score(0.754), 75);
        assert_eq!(display_score(0.004), 0);
    }
}

// ---------------------------------------------------------------------------
// Weighted aggregation
// ---------------------------------------------------------------------------

#[cfg(test)]
mod weighted_scores {
    fn weighted_score(holdings: &[(f64, i32)]) -> f64 {
        holdings.iter().map(|(w, s)| w * *s as f64).sum()
    }

    #[test]
    fn test_single_holding_carries_its_score() {
        assert_eq!(weighted_score(&[(1.0, 80)]), 80.0);
    }

    #[test]
    fn test_even_split_averages() {
        assert_eq!(weighted_score(&[(0.5, 80), (0.5, 40)]), 60.0);
    }

    #[test]
    fn test_unmatched_company_contributes_zero() {
        // Second holding has no company record: weight present, score 0.
        assert_eq!(weighted_score(&[(0.5, 80), (0.5, 0)]), 40.0);
    }

    #[test]
    fn test_value_tilted_split() {
        // 75/25 by value: 0.75 × 40 + 0.25 × 80 = 50
        assert_eq!(weighted_score(&[(0.75, 40), (0.25, 80)]), 50.0);
    }
}

// ---------------------------------------------------------------------------
// Performance vs. cost basis
// ---------------------------------------------------------------------------

#[cfg(test)]
mod performance {
    /// (value − invested) / invested × 100, 0 when nothing invested
    fn performance_change(total_value: f64, total_invested: f64) -> f64 {
        if total_invested > 0.0 {
            (total_value - total_invested) / total_invested * 100.0
        } else {
            0.0
        }
    }

    #[test]
    fn test_fifty_percent_gain() {
        // 10 shares at $100 cost, now worth $1500
        assert_eq!(performance_change(1500.0, 1000.0), 50.0);
    }

    #[test]
    fn test_loss_is_negative() {
        assert_eq!(performance_change(800.0, 1000.0), -20.0);
    }

    #[test]
    fn test_zero_invested_is_zero_not_nan() {
        assert_eq!(performance_change(1500.0, 0.0), 0.0);
    }

    #[test]
    fn test_full_price_failure_still_uses_invested_totals() {
        // No holding resolved a price: value 0, invested unchanged.
        assert_eq!(performance_change(0.0, 1000.0), -100.0);
    }
}

// ---------------------------------------------------------------------------
// Trend series ordering
// ---------------------------------------------------------------------------

#[cfg(test)]
mod trend_ordering {
    use std::collections::BTreeMap;

    #[test]
    fn test_year_keys_emit_ascending_without_duplicates() {
        let mut by_year: BTreeMap<i32, f64> = BTreeMap::new();
        for (year, contribution) in [(2024, 45.0), (2021, 30.0), (2023, 35.0), (2024, 27.0)] {
            *by_year.entry(year).or_insert(0.0) += contribution;
        }

        let years: Vec<i32> = by_year.keys().copied().collect();
        assert_eq!(years, vec![2021, 2023, 2024]);
        // Same-year contributions from different holdings accumulate.
        assert_eq!(by_year[&2024], 72.0);
    }
}
