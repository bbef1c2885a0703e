// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Month-over-month trend and a one-step-ahead forecast.
//!
//! The forecast is a single least-squares slope over the monthly totals of
//! the window, added to the latest month. It is a rough projection, not a
//! statistical model.

use super::summary::CategoryTotals;
use crate::models::{Flow, Transaction};
use chrono::{Datelike, Months, NaiveDate};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::Serialize;

/// Months with activity needed before trend figures are reported.
pub const MIN_POPULATED_MONTHS: usize = 3;

pub const DEFAULT_TREND_MONTHS: usize = 6;

/// One calendar month of the trend window.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthBucket {
    /// `YYYY-MM`
    pub month: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub income: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub expenses: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub balance: Decimal,
    pub expenses_by_category: CategoryTotals,
    pub transaction_count: usize,
}

impl MonthBucket {
    fn empty(first_day: NaiveDate) -> Self {
        MonthBucket {
            month: first_day.format("%Y-%m").to_string(),
            income: Decimal::ZERO,
            expenses: Decimal::ZERO,
            balance: Decimal::ZERO,
            expenses_by_category: CategoryTotals::default(),
            transaction_count: 0,
        }
    }

    /// Short label such as `Mar 2024`.
    pub fn label(&self) -> String {
        NaiveDate::parse_from_str(&format!("{}-01", self.month), "%Y-%m-%d")
            .map(|d| d.format("%b %Y").to_string())
            .unwrap_or_else(|_| self.month.clone())
    }

    pub fn is_populated(&self) -> bool {
        self.transaction_count > 0
    }
}

/// Buckets for the `month_count` calendar months ending with the month of
/// `now`, oldest first. Months without transactions are present with zero
/// totals; transactions outside the window are ignored.
pub fn monthly_trend(transactions: &[Transaction], month_count: usize, now: NaiveDate) -> Vec<MonthBucket> {
    let current = now.with_day(1).unwrap_or(now);
    let mut buckets: Vec<MonthBucket> = (0..month_count)
        .rev()
        .filter_map(|i| current.checked_sub_months(Months::new(i as u32)))
        .map(MonthBucket::empty)
        .collect();

    for t in transactions {
        let key = t.date.format("%Y-%m").to_string();
        let Some(b) = buckets.iter_mut().find(|b| b.month == key) else {
            continue;
        };
        b.transaction_count += 1;
        match t.flow {
            Flow::Income => b.income = b.income.saturating_add(t.amount),
            Flow::Expense => {
                b.expenses = b.expenses.saturating_add(t.amount);
                b.expenses_by_category.add(&t.category, t.amount);
            }
        }
    }
    for b in &mut buckets {
        b.balance = b.income.saturating_sub(b.expenses);
    }
    buckets
}

/// Ordinary least squares slope over `(x, y)` points; 0 when the slope is
/// undefined (no points, one point, or all x equal).
pub fn linear_regression_slope(points: &[(f64, f64)]) -> f64 {
    if points.is_empty() {
        return 0.0;
    }
    let n = points.len() as f64;
    let (mut sum_x, mut sum_y, mut sum_xy, mut sum_xx) = (0.0, 0.0, 0.0, 0.0);
    for &(x, y) in points {
        sum_x += x;
        sum_y += y;
        sum_xy += x * y;
        sum_xx += x * x;
    }
    let mean_x = sum_x / n;
    let mean_y = sum_y / n;
    let numerator = sum_xy - n * mean_x * mean_y;
    let denominator = sum_xx - n * mean_x * mean_x;
    if denominator == 0.0 {
        0.0
    } else {
        numerator / denominator
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Prediction {
    pub next_month_income: f64,
    pub next_month_expenses: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendAnalysis {
    pub average_income: f64,
    pub average_expenses: f64,
    /// Percent of average income saved.
    pub savings_rate: f64,
    /// Fitted monthly change as a percent of the average.
    pub income_growth_rate: f64,
    pub expense_growth_rate: f64,
    pub prediction: Prediction,
}

impl TrendAnalysis {
    pub fn outlook(&self) -> SavingsOutlook {
        SavingsOutlook::from_rate(self.savings_rate)
    }
}

/// Averages, savings rate, growth rates and next-month forecast for buckets
/// ordered oldest first. All zero when fewer than three months saw activity.
pub fn analyze_trend(buckets: &[MonthBucket]) -> TrendAnalysis {
    let populated = buckets.iter().filter(|b| b.is_populated()).count();
    if populated < MIN_POPULATED_MONTHS {
        return TrendAnalysis::default();
    }
    let incomes: Vec<f64> = buckets.iter().map(|b| as_f64(b.income)).collect();
    let expenses: Vec<f64> = buckets.iter().map(|b| as_f64(b.expenses)).collect();

    let n = buckets.len() as f64;
    let average_income = incomes.iter().sum::<f64>() / n;
    let average_expenses = expenses.iter().sum::<f64>() / n;
    let savings_rate = if average_income > 0.0 {
        (average_income - average_expenses) / average_income * 100.0
    } else {
        0.0
    };

    let income_slope = linear_regression_slope(&indexed(&incomes));
    let expense_slope = linear_regression_slope(&indexed(&expenses));

    let growth = |slope: f64, avg: f64| if avg > 0.0 { slope / avg * 100.0 } else { 0.0 };
    let latest_income = incomes.last().copied().unwrap_or(0.0);
    let latest_expenses = expenses.last().copied().unwrap_or(0.0);

    TrendAnalysis {
        average_income,
        average_expenses,
        savings_rate,
        income_growth_rate: growth(income_slope, average_income),
        expense_growth_rate: growth(expense_slope, average_expenses),
        prediction: Prediction {
            next_month_income: (latest_income + income_slope).max(0.0),
            next_month_expenses: (latest_expenses + expense_slope).max(0.0),
        },
    }
}

/// The `n` largest expense categories across the window with their totals.
/// Ties keep the order in which categories first appear.
pub fn top_expense_categories(buckets: &[MonthBucket], n: usize) -> Vec<(String, Decimal)> {
    let mut totals = CategoryTotals::default();
    for b in buckets {
        for (category, amount) in b.expenses_by_category.iter() {
            totals.add(category, amount);
        }
    }
    let mut ranked = totals.ranked();
    ranked.truncate(n);
    ranked
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SavingsOutlook {
    Overspending,
    Low,
    Moderate,
    Healthy,
}

impl SavingsOutlook {
    pub fn from_rate(rate: f64) -> Self {
        if rate < 0.0 {
            SavingsOutlook::Overspending
        } else if rate < 10.0 {
            SavingsOutlook::Low
        } else if rate > 20.0 {
            SavingsOutlook::Healthy
        } else {
            SavingsOutlook::Moderate
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            SavingsOutlook::Overspending => {
                "You're spending more than you earn. Consider reducing expenses."
            }
            SavingsOutlook::Low => {
                "Your savings rate is low. Try to increase income or reduce expenses."
            }
            SavingsOutlook::Moderate => {
                "You have a good savings rate, but there's room for improvement."
            }
            SavingsOutlook::Healthy => "Great job! You have a healthy savings rate.",
        }
    }
}

fn as_f64(d: Decimal) -> f64 {
    d.to_f64().unwrap_or(0.0)
}

fn indexed(values: &[f64]) -> Vec<(f64, f64)> {
    values.iter().enumerate().map(|(i, v)| (i as f64, *v)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::Id;
    use crate::models::TransactionKind;

    fn tx(date: &str, flow: Flow, amount: i64, category: &str) -> Transaction {
        Transaction {
            id: Id::generate(),
            flow,
            amount: Decimal::from(amount),
            category: category.into(),
            pocket_id: None,
            date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
            description: None,
            kind: TransactionKind::Ordinary,
        }
    }

    fn now() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 18).unwrap()
    }

    #[test]
    fn slope_of_perfect_line() {
        assert_eq!(linear_regression_slope(&[(0.0, 10.0), (1.0, 20.0), (2.0, 30.0)]), 10.0);
    }

    #[test]
    fn degenerate_slopes_are_zero() {
        assert_eq!(linear_regression_slope(&[]), 0.0);
        assert_eq!(linear_regression_slope(&[(3.0, 7.0)]), 0.0);
        assert_eq!(linear_regression_slope(&[(1.0, 2.0), (1.0, 9.0)]), 0.0);
    }

    #[test]
    fn window_includes_empty_months_oldest_first() {
        let txns = vec![
            tx("2024-06-02", Flow::Income, 100, "Salary"),
            tx("2024-03-15", Flow::Expense, 40, "Food"),
            tx("2023-12-31", Flow::Expense, 999, "Food"),
        ];
        let b = monthly_trend(&txns, 6, now());
        let keys: Vec<&str> = b.iter().map(|b| b.month.as_str()).collect();
        assert_eq!(keys, ["2024-01", "2024-02", "2024-03", "2024-04", "2024-05", "2024-06"]);
        assert_eq!(b[2].expenses, Decimal::from(40));
        assert_eq!(b[2].balance, Decimal::from(-40));
        assert_eq!(b[5].income, Decimal::from(100));
        assert!(!b[0].is_populated());
        assert_eq!(b[2].label(), "Mar 2024");
    }

    #[test]
    fn current_month_only_gives_zero_trend() {
        let txns = vec![
            tx("2024-06-01", Flow::Income, 5000, "Salary"),
            tx("2024-06-03", Flow::Expense, 1200, "Housing"),
        ];
        let a = analyze_trend(&monthly_trend(&txns, 6, now()));
        assert_eq!(a, TrendAnalysis::default());
        assert_eq!(a.savings_rate, 0.0);
    }

    #[test]
    fn trend_over_three_months() {
        let txns = vec![
            tx("2024-04-01", Flow::Income, 1000, "Salary"),
            tx("2024-04-09", Flow::Expense, 500, "Food"),
            tx("2024-05-01", Flow::Income, 1100, "Salary"),
            tx("2024-05-09", Flow::Expense, 600, "Food"),
            tx("2024-06-01", Flow::Income, 1200, "Salary"),
            tx("2024-06-09", Flow::Expense, 700, "Housing"),
        ];
        let a = analyze_trend(&monthly_trend(&txns, 3, now()));
        assert!((a.average_income - 1100.0).abs() < 1e-9);
        assert!((a.average_expenses - 600.0).abs() < 1e-9);
        assert!((a.savings_rate - 500.0 / 1100.0 * 100.0).abs() < 1e-9);
        assert!((a.income_growth_rate - 100.0 / 1100.0 * 100.0).abs() < 1e-9);
        // Latest month plus slope.
        assert!((a.prediction.next_month_income - 1300.0).abs() < 1e-9);
        assert!((a.prediction.next_month_expenses - 800.0).abs() < 1e-9);
        assert_eq!(a.outlook(), SavingsOutlook::Healthy);
    }

    #[test]
    fn forecast_floors_at_zero() {
        let txns = vec![
            tx("2024-04-01", Flow::Expense, 900, "Food"),
            tx("2024-05-01", Flow::Expense, 400, "Food"),
            tx("2024-06-01", Flow::Expense, 10, "Food"),
        ];
        let a = analyze_trend(&monthly_trend(&txns, 3, now()));
        assert_eq!(a.prediction.next_month_expenses, 0.0);
        assert_eq!(a.savings_rate, 0.0);
        assert_eq!(a.income_growth_rate, 0.0);
    }

    #[test]
    fn top_categories_sum_across_months() {
        let txns = vec![
            tx("2024-04-01", Flow::Expense, 50, "Fun"),
            tx("2024-04-02", Flow::Expense, 80, "Food"),
            tx("2024-05-01", Flow::Expense, 30, "Fun"),
            tx("2024-05-02", Flow::Expense, 10, "Gym"),
            tx("2024-06-01", Flow::Expense, 80, "Rent"),
            tx("2024-06-02", Flow::Income, 500, "Salary"),
        ];
        let top = top_expense_categories(&monthly_trend(&txns, 3, now()), 2);
        assert_eq!(
            top,
            vec![("Fun".to_string(), Decimal::from(80)), ("Food".to_string(), Decimal::from(80))]
        );
    }

    #[test]
    fn outlook_thresholds() {
        assert_eq!(SavingsOutlook::from_rate(-1.0), SavingsOutlook::Overspending);
        assert_eq!(SavingsOutlook::from_rate(9.9), SavingsOutlook::Low);
        assert_eq!(SavingsOutlook::from_rate(10.0), SavingsOutlook::Moderate);
        assert_eq!(SavingsOutlook::from_rate(20.0), SavingsOutlook::Moderate);
        assert_eq!(SavingsOutlook::from_rate(20.5), SavingsOutlook::Healthy);
    }
}
