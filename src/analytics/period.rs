// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::models::{Flow, Transaction};
use chrono::{Duration, Months, NaiveDate};
use serde::Serialize;

/// Rolling dashboard window ending at "now".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Period {
    Week,
    #[default]
    Month,
    Quarter,
    Year,
}

impl Period {
    /// First day included in the window. Month arithmetic clamps to the end
    /// of shorter months (Mar 31 minus one month is Feb 28/29).
    pub fn start(&self, now: NaiveDate) -> NaiveDate {
        let start = match self {
            Period::Week => now.checked_sub_signed(Duration::days(7)),
            Period::Month => now.checked_sub_months(Months::new(1)),
            Period::Quarter => now.checked_sub_months(Months::new(3)),
            Period::Year => now.checked_sub_months(Months::new(12)),
        };
        start.unwrap_or(NaiveDate::MIN)
    }
}

/// Unrecognized names fall back to `Month`.
impl From<&str> for Period {
    fn from(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "week" => Period::Week,
            "quarter" => Period::Quarter,
            "year" => Period::Year,
            _ => Period::Month,
        }
    }
}

/// Transactions dated within `[period.start(now), now]`, in input order.
pub fn filter_by_period(
    transactions: &[Transaction],
    period: Period,
    now: NaiveDate,
) -> Vec<&Transaction> {
    let start = period.start(now);
    transactions
        .iter()
        .filter(|t| t.date >= start && t.date <= now)
        .collect()
}

/// Criteria of the transaction list screen. `None` means "all".
#[derive(Debug, Clone, Default)]
pub struct TransactionFilter {
    pub flow: Option<Flow>,
    pub category: Option<String>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl TransactionFilter {
    pub fn matches(&self, t: &Transaction) -> bool {
        self.flow.is_none_or(|f| f == t.flow)
            && self.category.as_deref().is_none_or(|c| c == t.category)
            && self.from.is_none_or(|from| t.date >= from)
            && self.to.is_none_or(|to| t.date <= to)
    }
}

/// Matching transactions, newest first. Same-day entries keep input order.
pub fn filter_transactions<'a>(
    transactions: &'a [Transaction],
    filter: &TransactionFilter,
) -> Vec<&'a Transaction> {
    let mut out: Vec<&Transaction> = transactions.iter().filter(|t| filter.matches(t)).collect();
    out.sort_by(|a, b| b.date.cmp(&a.date));
    out
}

pub fn recent_transactions(transactions: &[Transaction], n: usize) -> Vec<&Transaction> {
    let mut out = filter_transactions(transactions, &TransactionFilter::default());
    out.truncate(n);
    out
}
