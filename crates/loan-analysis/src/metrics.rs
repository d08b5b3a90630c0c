//! Derived financial metrics
//!
//! Every function here is pure: it reads raw values through a
//! [`LineItemSource`] and returns a number. Divisions are guarded so a zero
//! denominator yields 0 for ratios and `None` for percent changes; NaN and
//! infinity never leave this module.

use crate::constants;
use crate::line_items::{DerivedMetric, LineItem, RowKey};
use crate::parse::sanitize;
use crate::periods::PeriodSeries;

/// Anything that can answer "what is line item X" for one period or year.
pub trait LineItemSource {
    /// Raw value, zero when the item was never supplied
    fn value(&self, item: LineItem) -> f64;

    /// Whether the item was supplied for this period or year (used for the
    /// NOI override)
    fn has(&self, item: LineItem) -> bool;
}

/// Round to `decimals` places
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

/// `numerator / denominator` rounded to ratio precision, 0 when the
/// denominator is zero
pub fn coverage_ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        return 0.0;
    }
    let ratio = numerator / denominator;
    if ratio.is_finite() {
        round_to(ratio, constants::RATIO_DECIMALS)
    } else {
        0.0
    }
}

/// Percent change from `prior` to `current`; `None` without a usable prior
pub fn percent_change(current: f64, prior: Option<f64>) -> Option<f64> {
    let prior = prior?;
    if prior == 0.0 {
        return None;
    }
    let change = (current - prior) / prior.abs() * 100.0;
    change.is_finite().then_some(change)
}

pub fn gross_profit(src: &impl LineItemSource) -> f64 {
    sanitize(src.value(LineItem::GrossRevenue) - src.value(LineItem::Cogs))
}

/// Gross profit as a percentage of revenue, 0 without revenue
pub fn gross_margin(src: &impl LineItemSource) -> f64 {
    let revenue = src.value(LineItem::GrossRevenue);
    if revenue == 0.0 {
        return 0.0;
    }
    sanitize(gross_profit(src) / revenue * 100.0)
}

/// Net operating income.
///
/// An injected `noi` value for the period wins; otherwise book income plus
/// the standard addbacks.
pub fn noi(src: &impl LineItemSource) -> f64 {
    if src.has(LineItem::Noi) {
        return src.value(LineItem::Noi);
    }
    sanitize(
        LineItem::NOI_CONTRIBUTORS
            .iter()
            .map(|item| src.value(*item))
            .sum(),
    )
}

pub fn debt_service(src: &impl LineItemSource) -> f64 {
    sanitize(
        LineItem::DEBT_PAYMENTS
            .iter()
            .map(|item| src.value(*item))
            .sum(),
    )
}

/// Debt service coverage before required officer compensation
pub fn dsc_pre_oc(src: &impl LineItemSource) -> f64 {
    coverage_ratio(noi(src), debt_service(src))
}

/// Debt service coverage after required officer compensation
pub fn dsc_post_oc(src: &impl LineItemSource) -> f64 {
    coverage_ratio(
        noi(src) - src.value(LineItem::RequiredOfficerComp),
        debt_service(src),
    )
}

/// Cash left for debt service after officer pay and owner draws
pub fn available_cf(src: &impl LineItemSource) -> f64 {
    sanitize(noi(src) - src.value(LineItem::RequiredOfficerComp) - src.value(LineItem::Distributions))
}

/// Cash left after debt service
pub fn excess_cf(src: &impl LineItemSource) -> f64 {
    sanitize(available_cf(src) - debt_service(src))
}

pub fn derive(metric: DerivedMetric, src: &impl LineItemSource) -> f64 {
    match metric {
        DerivedMetric::GrossProfit => gross_profit(src),
        DerivedMetric::GrossMargin => gross_margin(src),
        DerivedMetric::Noi => noi(src),
        DerivedMetric::DebtService => debt_service(src),
        DerivedMetric::DscPreOc => dsc_pre_oc(src),
        DerivedMetric::DscPostOc => dsc_post_oc(src),
        DerivedMetric::AvailableCf => available_cf(src),
        DerivedMetric::ExcessCf => excess_cf(src),
    }
}

/// Value of any table row for a period
pub fn row_value(store: &PeriodSeries, row: RowKey, index: usize) -> f64 {
    match row {
        RowKey::Raw(item) => store.get(item, index),
        RowKey::Derived(metric) => derive(metric, &store.at(index)),
    }
}

/// Change of a row against the previous period, `None` for the first period
/// or when the previous value is zero
pub fn period_change(store: &PeriodSeries, row: RowKey, index: usize) -> Option<f64> {
    if index == 0 || index >= store.len() {
        return None;
    }
    let prior = row_value(store, row, index - 1);
    percent_change(row_value(store, row, index), Some(prior))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::periods::Period;

    fn store(columns: usize, rows: &[(LineItem, Vec<f64>)]) -> PeriodSeries {
        let periods = (0..columns)
            .map(|i| Period::annual(format!("{}-12-31", 2021 + i)))
            .collect();
        let mut store = PeriodSeries::new(periods);
        for (item, values) in rows {
            store.insert(*item, values.clone()).unwrap();
        }
        store
    }

    #[test]
    fn test_gross_profit_every_period() {
        let s = store(
            3,
            &[
                (LineItem::GrossRevenue, vec![1000.0, 0.0, 2500.5]),
                (LineItem::Cogs, vec![400.0, 50.0, 1000.25]),
            ],
        );
        for i in 0..3 {
            assert_eq!(
                gross_profit(&s.at(i)),
                s.get(LineItem::GrossRevenue, i) - s.get(LineItem::Cogs, i)
            );
        }
    }

    #[test]
    fn test_gross_margin_zero_revenue() {
        let s = store(2, &[(LineItem::GrossRevenue, vec![0.0, 200.0]), (LineItem::Cogs, vec![10.0, 50.0])]);
        assert_eq!(gross_margin(&s.at(0)), 0.0);
        assert_eq!(gross_margin(&s.at(1)), 75.0);
    }

    #[test]
    fn test_noi_sums_contributors() {
        let s = store(
            1,
            &[
                (LineItem::NetIncome, vec![100_000.0]),
                (LineItem::Interest, vec![10_000.0]),
                (LineItem::Depreciation, vec![5_000.0]),
                (LineItem::Amortization, vec![1_000.0]),
                (LineItem::OfficerCompensation, vec![60_000.0]),
                (LineItem::OtherAddbacks, vec![4_000.0]),
                (LineItem::Wages, vec![999_999.0]),
            ],
        );
        assert_eq!(noi(&s.at(0)), 180_000.0);
    }

    #[test]
    fn test_noi_override_wins() {
        let s = store(
            1,
            &[(LineItem::NetIncome, vec![100.0]), (LineItem::Noi, vec![42.0])],
        );
        assert_eq!(noi(&s.at(0)), 42.0);
    }

    #[test]
    fn test_noi_edit_leaves_other_periods_on_contributors() {
        let mut s = store(
            2,
            &[
                (LineItem::NetIncome, vec![100_000.0, 120_000.0]),
                (LineItem::ExistingDebt, vec![50_000.0, 50_000.0]),
            ],
        );
        s.apply_edit("noi", 1, "150000").unwrap();

        assert_eq!(noi(&s.at(0)), 100_000.0);
        assert_eq!(dsc_pre_oc(&s.at(0)), 2.0);
        assert_eq!(available_cf(&s.at(0)), 100_000.0);
        assert_eq!(noi(&s.at(1)), 150_000.0);
        assert_eq!(dsc_pre_oc(&s.at(1)), 3.0);
    }

    #[test]
    fn test_partial_noi_override_series() {
        let mut s = store(2, &[(LineItem::NetIncome, vec![100_000.0, 120_000.0])]);
        s.insert_padded(LineItem::Noi, vec![90_000.0]);
        assert_eq!(noi(&s.at(0)), 90_000.0);
        assert_eq!(noi(&s.at(1)), 120_000.0);
    }

    #[test]
    fn test_noi_override_of_zero_is_respected() {
        let mut s = store(1, &[(LineItem::NetIncome, vec![100_000.0])]);
        s.apply_edit("noi", 0, "0").unwrap();
        assert_eq!(noi(&s.at(0)), 0.0);
    }

    #[test]
    fn test_debt_service_sums_payment_rows() {
        let s = store(
            1,
            &[
                (LineItem::ExistingDebt, vec![12_000.0]),
                (LineItem::ProposedDebt, vec![24_000.0]),
                (LineItem::OtherDebt, vec![4_000.0]),
                (LineItem::Interest, vec![8_000.0]),
            ],
        );
        assert_eq!(debt_service(&s.at(0)), 40_000.0);
    }

    #[test]
    fn test_dsc_zero_debt_service() {
        let s = store(
            2,
            &[
                (LineItem::Noi, vec![50_000.0, 50_000.0]),
                (LineItem::RequiredOfficerComp, vec![20_000.0, 20_000.0]),
                (LineItem::ProposedDebt, vec![0.0, 40_000.0]),
            ],
        );
        assert_eq!(dsc_pre_oc(&s.at(0)), 0.0);
        assert_eq!(dsc_post_oc(&s.at(0)), 0.0);
        assert_eq!(dsc_pre_oc(&s.at(1)), 1.25);
        assert_eq!(dsc_post_oc(&s.at(1)), 0.75);
    }

    #[test]
    fn test_dsc_rounds_to_two_decimals() {
        let s = store(
            1,
            &[(LineItem::Noi, vec![100.0]), (LineItem::ExistingDebt, vec![3.0])],
        );
        assert_eq!(dsc_pre_oc(&s.at(0)), 33.33);
    }

    #[test]
    fn test_cash_flow_chain() {
        let s = store(
            1,
            &[
                (LineItem::Noi, vec![150_000.0]),
                (LineItem::RequiredOfficerComp, vec![50_000.0]),
                (LineItem::Distributions, vec![20_000.0]),
                (LineItem::ExistingDebt, vec![30_000.0]),
                (LineItem::ProposedDebt, vec![25_000.0]),
            ],
        );
        assert_eq!(available_cf(&s.at(0)), 80_000.0);
        assert_eq!(excess_cf(&s.at(0)), 25_000.0);
    }

    #[test]
    fn test_percent_change_guards() {
        assert_eq!(percent_change(110.0, None), None);
        assert_eq!(percent_change(110.0, Some(0.0)), None);
        assert_eq!(percent_change(110.0, Some(100.0)), Some(10.0));
        // Negative prior uses the magnitude so improvement reads as positive
        assert_eq!(percent_change(-50.0, Some(-100.0)), Some(50.0));
    }

    #[test]
    fn test_period_change_first_period_and_zero_prior() {
        let s = store(3, &[(LineItem::GrossRevenue, vec![0.0, 100.0, 150.0])]);
        let row = RowKey::Raw(LineItem::GrossRevenue);
        assert_eq!(period_change(&s, row, 0), None);
        assert_eq!(period_change(&s, row, 1), None);
        assert_eq!(period_change(&s, row, 2), Some(50.0));
    }

    #[test]
    fn test_period_change_on_derived_row() {
        let s = store(
            2,
            &[
                (LineItem::GrossRevenue, vec![1000.0, 1200.0]),
                (LineItem::Cogs, vec![500.0, 450.0]),
            ],
        );
        let change = period_change(&s, RowKey::Derived(DerivedMetric::GrossProfit), 1);
        assert_eq!(change, Some(50.0));
    }

    #[test]
    fn test_derive_never_returns_nan() {
        let s = store(1, &[]);
        for metric in DerivedMetric::ALL {
            assert!(derive(metric, &s.at(0)).is_finite(), "{:?}", metric);
        }
    }

    #[test]
    fn test_derive_finite_for_extreme_inputs() {
        let s = store(
            1,
            &[
                (LineItem::GrossRevenue, vec![f64::MIN_POSITIVE]),
                (LineItem::Cogs, vec![-f64::MAX]),
                (LineItem::NetIncome, vec![f64::MAX]),
                (LineItem::Interest, vec![f64::MAX]),
                (LineItem::ExistingDebt, vec![f64::MIN_POSITIVE]),
            ],
        );
        assert_eq!(gross_margin(&s.at(0)), 0.0);
        for metric in DerivedMetric::ALL {
            assert!(derive(metric, &s.at(0)).is_finite(), "{:?}", metric);
        }
    }
}
