// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::models::{Flow, Transaction};
use chrono::{Datelike, Months, NaiveDate};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Serialize)]
pub struct DailyTransactions<'a> {
    pub date: NaiveDate,
    /// Largest amount first.
    pub transactions: Vec<&'a Transaction>,
    #[serde(with = "rust_decimal::serde::float")]
    pub income: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub expense: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub balance: Decimal,
    pub count: usize,
}

/// Transactions booked on exactly `date`.
pub fn daily_transactions(transactions: &[Transaction], date: NaiveDate) -> DailyTransactions<'_> {
    let mut matching: Vec<&Transaction> = transactions.iter().filter(|t| t.date == date).collect();
    let (mut income, mut expense) = (Decimal::ZERO, Decimal::ZERO);
    for t in &matching {
        match t.flow {
            Flow::Income => income = income.saturating_add(t.amount),
            Flow::Expense => expense = expense.saturating_add(t.amount),
        }
    }
    matching.sort_by(|a, b| b.amount.cmp(&a.amount));
    DailyTransactions {
        date,
        count: matching.len(),
        transactions: matching,
        income,
        expense,
        balance: income.saturating_sub(expense),
    }
}

/// Heatmap bucket 0..=4 for `amount` relative to the busiest day of the
/// month. 0 means nothing happened that day.
pub fn heatmap_intensity(amount: Decimal, max_for_month: Decimal) -> u8 {
    if amount <= Decimal::ZERO || max_for_month <= Decimal::ZERO {
        return 0;
    }
    let ratio = (amount / max_for_month).min(Decimal::ONE);
    if ratio < Decimal::new(25, 2) {
        1
    } else if ratio < Decimal::new(50, 2) {
        2
    } else if ratio < Decimal::new(75, 2) {
        3
    } else {
        4
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CalendarDay {
    pub date: NaiveDate,
    #[serde(with = "rust_decimal::serde::float")]
    pub income: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub expense: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub balance: Decimal,
    pub count: usize,
    /// Which color scale the cell uses; `None` on empty days. Ties go to
    /// income.
    pub dominant: Option<Flow>,
    pub level: u8,
}

impl CalendarDay {
    fn dominant_amount(&self) -> Decimal {
        self.income.max(self.expense)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CalendarMonth {
    pub year: i32,
    pub month: u32,
    /// Empty cells before day 1 in a Sunday-first week.
    pub leading_blanks: u32,
    pub days: Vec<CalendarDay>,
}

/// Month grid with per-day totals and heatmap levels. `None` for an invalid
/// year/month.
pub fn calendar_month(transactions: &[Transaction], year: i32, month: u32) -> Option<CalendarMonth> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let next = first.checked_add_months(Months::new(1))?;

    let mut totals: BTreeMap<NaiveDate, (Decimal, Decimal, usize)> = BTreeMap::new();
    for t in transactions.iter().filter(|t| t.date >= first && t.date < next) {
        let e = totals.entry(t.date).or_insert((Decimal::ZERO, Decimal::ZERO, 0));
        match t.flow {
            Flow::Income => e.0 = e.0.saturating_add(t.amount),
            Flow::Expense => e.1 = e.1.saturating_add(t.amount),
        }
        e.2 += 1;
    }

    let mut days: Vec<CalendarDay> = first
        .iter_days()
        .take_while(|d| *d < next)
        .map(|date| {
            let (income, expense, count) =
                totals.get(&date).copied().unwrap_or((Decimal::ZERO, Decimal::ZERO, 0));
            let dominant = match count {
                0 => None,
                _ if income >= expense => Some(Flow::Income),
                _ => Some(Flow::Expense),
            };
            CalendarDay {
                date,
                income,
                expense,
                balance: income.saturating_sub(expense),
                count,
                dominant,
                level: 0,
            }
        })
        .collect();

    let max = days
        .iter()
        .map(CalendarDay::dominant_amount)
        .max()
        .unwrap_or(Decimal::ZERO);
    for day in days.iter_mut().filter(|d| d.count > 0) {
        day.level = heatmap_intensity(day.dominant_amount(), max);
    }

    Some(CalendarMonth {
        year,
        month,
        leading_blanks: first.weekday().num_days_from_sunday(),
        days,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::Id;
    use crate::models::TransactionKind;

    fn tx(date: &str, flow: Flow, amount: i64) -> Transaction {
        Transaction {
            id: Id::generate(),
            flow,
            amount: Decimal::from(amount),
            category: "Food".into(),
            pocket_id: None,
            date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
            description: None,
            kind: TransactionKind::Ordinary,
        }
    }

    #[test]
    fn daily_totals_for_exact_day() {
        let txns = vec![
            tx("2024-07-04", Flow::Expense, 20),
            tx("2024-07-04", Flow::Income, 100),
            tx("2024-07-05", Flow::Expense, 999),
            tx("2024-07-04", Flow::Expense, 35),
        ];
        let day = daily_transactions(&txns, NaiveDate::from_ymd_opt(2024, 7, 4).unwrap());
        assert_eq!(day.count, 3);
        assert_eq!(day.income, Decimal::from(100));
        assert_eq!(day.expense, Decimal::from(55));
        assert_eq!(day.balance, Decimal::from(45));
        let amounts: Vec<Decimal> = day.transactions.iter().map(|t| t.amount).collect();
        assert_eq!(amounts, [Decimal::from(100), Decimal::from(35), Decimal::from(20)]);
    }

    #[test]
    fn intensity_buckets() {
        let max = Decimal::from(100);
        assert_eq!(heatmap_intensity(Decimal::ZERO, max), 0);
        assert_eq!(heatmap_intensity(Decimal::from(24), max), 1);
        assert_eq!(heatmap_intensity(Decimal::from(25), max), 2);
        assert_eq!(heatmap_intensity(Decimal::from(74), max), 3);
        assert_eq!(heatmap_intensity(Decimal::from(75), max), 4);
        assert_eq!(heatmap_intensity(Decimal::from(250), max), 4);
        assert_eq!(heatmap_intensity(Decimal::from(5), Decimal::ZERO), 0);
    }

    #[test]
    fn month_grid_picks_dominant_flow() {
        let txns = vec![
            tx("2024-02-01", Flow::Income, 400),
            tx("2024-02-01", Flow::Expense, 100),
            tx("2024-02-10", Flow::Expense, 150),
            tx("2024-02-29", Flow::Expense, 10),
            tx("2024-03-01", Flow::Expense, 10_000),
        ];
        let m = calendar_month(&txns, 2024, 2).unwrap();
        assert_eq!(m.days.len(), 29);
        // 2024-02-01 was a Thursday.
        assert_eq!(m.leading_blanks, 4);

        let first = &m.days[0];
        assert_eq!(first.dominant, Some(Flow::Income));
        assert_eq!(first.level, 4);
        let tenth = &m.days[9];
        assert_eq!(tenth.dominant, Some(Flow::Expense));
        assert_eq!(tenth.level, 2);
        assert_eq!(m.days[28].level, 1);
        assert_eq!(m.days[1].level, 0);
        assert_eq!(m.days[1].dominant, None);
    }

    #[test]
    fn invalid_month_has_no_grid() {
        assert!(calendar_month(&[], 2024, 13).is_none());
    }
}
