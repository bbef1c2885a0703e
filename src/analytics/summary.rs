// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::ids::Id;
use crate::models::{Flow, Pocket, Transaction};
use rust_decimal::Decimal;
use serde::ser::{Serialize, SerializeMap, Serializer};

/// Per-category totals in first-seen order. Only categories that occurred
/// are present. Serializes as a JSON object of category to number.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CategoryTotals(Vec<(String, Decimal)>);

impl CategoryTotals {
    pub fn add(&mut self, category: &str, amount: Decimal) {
        match self.0.iter_mut().find(|(c, _)| c == category) {
            Some((_, total)) => *total = total.saturating_add(amount),
            None => self.0.push((category.to_string(), amount)),
        }
    }

    pub fn get(&self, category: &str) -> Option<Decimal> {
        self.0.iter().find(|(c, _)| c == category).map(|(_, v)| *v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Decimal)> {
        self.0.iter().map(|(c, v)| (c.as_str(), *v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Entries sorted by total, largest first; ties keep first-seen order.
    pub fn ranked(&self) -> Vec<(String, Decimal)> {
        let mut v = self.0.clone();
        v.sort_by(|a, b| b.1.cmp(&a.1));
        v
    }
}

impl FromIterator<(String, Decimal)> for CategoryTotals {
    fn from_iter<I: IntoIterator<Item = (String, Decimal)>>(iter: I) -> Self {
        let mut totals = CategoryTotals::default();
        for (category, amount) in iter {
            totals.add(&category, amount);
        }
        totals
    }
}

struct AsFloat<'a>(&'a Decimal);

impl Serialize for AsFloat<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        rust_decimal::serde::float::serialize(self.0, serializer)
    }
}

impl Serialize for CategoryTotals {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (k, v) in &self.0 {
            map.serialize_entry(k, &AsFloat(v))?;
        }
        map.end()
    }
}

#[derive(Debug, Clone, Default, PartialEq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    #[serde(with = "rust_decimal::serde::float")]
    pub total_income: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_expenses: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub balance: Decimal,
    pub income_by_category: CategoryTotals,
    pub expenses_by_category: CategoryTotals,
}

/// Totals saturate at the `Decimal` range.
pub fn summarize<'a, I>(transactions: I) -> Summary
where
    I: IntoIterator<Item = &'a Transaction>,
{
    let mut s = Summary::default();
    for t in transactions {
        match t.flow {
            Flow::Income => {
                s.total_income = s.total_income.saturating_add(t.amount);
                s.income_by_category.add(&t.category, t.amount);
            }
            Flow::Expense => {
                s.total_expenses = s.total_expenses.saturating_add(t.amount);
                s.expenses_by_category.add(&t.category, t.amount);
            }
        }
    }
    s.balance = s.total_income.saturating_sub(s.total_expenses);
    s
}

/// Cached balance of a pocket next to what its transaction history adds up
/// to. The difference is the opening balance plus any manual balance edits.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct PocketActivity {
    pub pocket_id: Id,
    pub name: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub cached_balance: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub net_from_history: Decimal,
    pub transaction_count: usize,
}

impl PocketActivity {
    pub fn implied_opening_balance(&self) -> Decimal {
        self.cached_balance.saturating_sub(self.net_from_history)
    }
}

pub fn pocket_activity(pockets: &[Pocket], transactions: &[Transaction]) -> Vec<PocketActivity> {
    pockets
        .iter()
        .map(|p| {
            let mut net = Decimal::ZERO;
            let mut count = 0;
            for t in transactions.iter().filter(|t| t.pocket_id.as_ref() == Some(&p.id)) {
                net = net.saturating_add(t.flow.signed(t.amount));
                count += 1;
            }
            PocketActivity {
                pocket_id: p.id.clone(),
                name: p.name.clone(),
                cached_balance: p.balance,
                net_from_history: net,
                transaction_count: count,
            }
        })
        .collect()
}
