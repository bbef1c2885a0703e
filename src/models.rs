// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::ids::Id;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::warn;

pub const DEFAULT_CURRENCY: &str = "Rp";

/// Category attached to both legs of a pocket transfer.
pub const TRANSFER_CATEGORY: &str = "Transfer";

const DEFAULT_INCOME_CATEGORIES: [&str; 5] =
    ["Salary", "Freelance", "Investments", "Gifts", "Other Income"];

const DEFAULT_EXPENSE_CATEGORIES: [&str; 12] = [
    "Food",
    "Housing",
    "Transportation",
    "Entertainment",
    "Utilities",
    "Healthcare",
    "Education",
    "Shopping",
    "Personal",
    "Debt",
    "Savings",
    "Other Expenses",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Flow {
    Income,
    Expense,
}

impl Flow {
    pub fn as_str(&self) -> &'static str {
        match self {
            Flow::Income => "income",
            Flow::Expense => "expense",
        }
    }

    /// Effect of `amount` on a pocket balance.
    pub fn signed(&self, amount: Decimal) -> Decimal {
        match self {
            Flow::Income => amount,
            Flow::Expense => -amount,
        }
    }
}

impl fmt::Display for Flow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Flow {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "income" => Ok(Flow::Income),
            "expense" => Ok(Flow::Expense),
            other => Err(format!("Unknown transaction type '{}', expected income|expense", other)),
        }
    }
}

/// Links one leg of a transfer to the pocket on the other side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferLink {
    pub transfer_id: Id,
    pub counterpart_pocket_id: Id,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum TransactionKind {
    #[default]
    Ordinary,
    TransferLeg(TransferLink),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "TransactionRecord", into = "TransactionRecord")]
pub struct Transaction {
    pub id: Id,
    pub flow: Flow,
    pub amount: Decimal,
    pub category: String,
    pub pocket_id: Option<Id>,
    pub date: NaiveDate,
    pub description: Option<String>,
    pub kind: TransactionKind,
}

impl Transaction {
    pub fn is_transfer_leg(&self) -> bool {
        matches!(self.kind, TransactionKind::TransferLeg(_))
    }

    pub fn transfer_link(&self) -> Option<&TransferLink> {
        match &self.kind {
            TransactionKind::TransferLeg(link) => Some(link),
            TransactionKind::Ordinary => None,
        }
    }
}

/// Input for [`crate::ledger::Ledger::add_transaction`]; the ledger assigns the id.
#[derive(Debug, Clone)]
pub struct TransactionDraft {
    pub flow: Flow,
    pub amount: Decimal,
    pub category: String,
    pub pocket_id: Option<Id>,
    pub date: NaiveDate,
    pub description: Option<String>,
}

// Wire shape shared by the persisted state and the export file. Transfer legs
// carry `transferId` plus the pocket on the other side: `transferToPocketId`
// on the expense leg, `transferFromPocketId` on the income leg.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TransactionRecord {
    id: Id,
    #[serde(rename = "type")]
    flow: Flow,
    #[serde(with = "rust_decimal::serde::float")]
    amount: Decimal,
    category: String,
    #[serde(default, deserialize_with = "empty_as_none", skip_serializing_if = "Option::is_none")]
    pocket_id: Option<Id>,
    date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none", skip_serializing_if = "Option::is_none")]
    transfer_id: Option<Id>,
    #[serde(default, deserialize_with = "empty_as_none", skip_serializing_if = "Option::is_none")]
    transfer_to_pocket_id: Option<Id>,
    #[serde(default, deserialize_with = "empty_as_none", skip_serializing_if = "Option::is_none")]
    transfer_from_pocket_id: Option<Id>,
}

impl From<TransactionRecord> for Transaction {
    fn from(r: TransactionRecord) -> Self {
        let counterpart = match r.flow {
            Flow::Expense => r.transfer_to_pocket_id.or(r.transfer_from_pocket_id),
            Flow::Income => r.transfer_from_pocket_id.or(r.transfer_to_pocket_id),
        };
        let kind = match (r.transfer_id, counterpart) {
            (Some(transfer_id), Some(counterpart_pocket_id)) => {
                TransactionKind::TransferLeg(TransferLink {
                    transfer_id,
                    counterpart_pocket_id,
                })
            }
            _ => TransactionKind::Ordinary,
        };
        Transaction {
            id: r.id,
            flow: r.flow,
            amount: r.amount,
            category: r.category,
            pocket_id: r.pocket_id,
            date: r.date,
            description: r.description.filter(|d| !d.is_empty()),
            kind,
        }
    }
}

impl From<Transaction> for TransactionRecord {
    fn from(t: Transaction) -> Self {
        let (transfer_id, to, from) = match t.kind {
            TransactionKind::Ordinary => (None, None, None),
            TransactionKind::TransferLeg(link) => match t.flow {
                Flow::Expense => (Some(link.transfer_id), Some(link.counterpart_pocket_id), None),
                Flow::Income => (Some(link.transfer_id), None, Some(link.counterpart_pocket_id)),
            },
        };
        TransactionRecord {
            id: t.id,
            flow: t.flow,
            amount: t.amount,
            category: t.category,
            pocket_id: t.pocket_id,
            date: t.date,
            description: t.description,
            transfer_id,
            transfer_to_pocket_id: to,
            transfer_from_pocket_id: from,
        }
    }
}

fn empty_as_none<'de, D>(deserializer: D) -> Result<Option<Id>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.filter(|s| !s.is_empty()).map(Id::from))
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum BillingCycle {
    Weekly,
    Monthly,
    Quarterly,
    Annually,
    /// Cycle name this version does not know; kept verbatim.
    Other(String),
}

impl BillingCycle {
    pub fn as_str(&self) -> &str {
        match self {
            BillingCycle::Weekly => "weekly",
            BillingCycle::Monthly => "monthly",
            BillingCycle::Quarterly => "quarterly",
            BillingCycle::Annually => "annually",
            BillingCycle::Other(s) => s,
        }
    }

    pub fn label(&self) -> &str {
        match self {
            BillingCycle::Weekly => "Weekly",
            BillingCycle::Monthly => "Monthly",
            BillingCycle::Quarterly => "Quarterly (Every 3 Months)",
            BillingCycle::Annually => "Annually (Yearly)",
            BillingCycle::Other(s) => s,
        }
    }
}

impl From<String> for BillingCycle {
    fn from(s: String) -> Self {
        match s.as_str() {
            "weekly" => BillingCycle::Weekly,
            "monthly" => BillingCycle::Monthly,
            "quarterly" => BillingCycle::Quarterly,
            "annually" => BillingCycle::Annually,
            _ => BillingCycle::Other(s),
        }
    }
}

impl From<&str> for BillingCycle {
    fn from(s: &str) -> Self {
        BillingCycle::from(s.trim().to_ascii_lowercase())
    }
}

impl From<BillingCycle> for String {
    fn from(c: BillingCycle) -> Self {
        c.as_str().to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subscription {
    pub id: Id,
    pub name: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    pub category: String,
    pub billing_cycle: BillingCycle,
    pub next_billing_date: NaiveDate,
    #[serde(default, deserialize_with = "empty_as_none", skip_serializing_if = "Option::is_none")]
    pub pocket_id: Option<Id>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone)]
pub struct SubscriptionDraft {
    pub name: String,
    pub amount: Decimal,
    pub category: String,
    pub billing_cycle: BillingCycle,
    pub next_billing_date: NaiveDate,
    pub pocket_id: Option<Id>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pocket {
    pub id: Id,
    pub name: String,
    /// Cached running total of every income minus every expense booked
    /// against this pocket, plus its opening balance.
    #[serde(with = "rust_decimal::serde::float")]
    pub balance: Decimal,
    pub color: String,
    pub icon: String,
}

#[derive(Debug, Clone)]
pub struct PocketDraft {
    pub name: String,
    pub color: String,
    pub icon: String,
}

/// Partial update for a pocket. `balance: None` keeps the cached balance.
#[derive(Debug, Clone, Default)]
pub struct PocketPatch {
    pub name: Option<String>,
    pub color: Option<String>,
    pub icon: Option<String>,
    pub balance: Option<Decimal>,
}

pub fn default_pockets() -> Vec<Pocket> {
    vec![
        Pocket {
            id: Id::from("1"),
            name: "Cash".into(),
            balance: Decimal::ZERO,
            color: "#4caf50".into(),
            icon: "cash".into(),
        },
        Pocket {
            id: Id::from("2"),
            name: "Bank Account".into(),
            balance: Decimal::ZERO,
            color: "#2196f3".into(),
            icon: "bank".into(),
        },
    ]
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategorySet {
    #[serde(default = "default_income_categories")]
    pub income: Vec<String>,
    #[serde(default = "default_expense_categories")]
    pub expense: Vec<String>,
}

fn default_income_categories() -> Vec<String> {
    DEFAULT_INCOME_CATEGORIES.iter().map(|s| s.to_string()).collect()
}

fn default_expense_categories() -> Vec<String> {
    DEFAULT_EXPENSE_CATEGORIES.iter().map(|s| s.to_string()).collect()
}

impl CategorySet {
    pub fn names(&self, flow: Flow) -> &[String] {
        match flow {
            Flow::Income => &self.income,
            Flow::Expense => &self.expense,
        }
    }

    pub fn names_mut(&mut self, flow: Flow) -> &mut Vec<String> {
        match flow {
            Flow::Income => &mut self.income,
            Flow::Expense => &mut self.expense,
        }
    }

    pub fn contains(&self, flow: Flow, name: &str) -> bool {
        self.names(flow).iter().any(|c| c == name)
    }
}

impl Default for CategorySet {
    fn default() -> Self {
        CategorySet {
            income: default_income_categories(),
            expense: default_expense_categories(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomCurrency {
    pub symbol: String,
    pub name: String,
}

/// Everything the ledger owns.
#[derive(Debug, Clone, PartialEq)]
pub struct LedgerState {
    pub transactions: Vec<Transaction>,
    pub subscriptions: Vec<Subscription>,
    pub categories: CategorySet,
    pub currency: String,
    pub custom_currencies: Vec<CustomCurrency>,
    pub pockets: Vec<Pocket>,
}

impl Default for LedgerState {
    fn default() -> Self {
        LedgerState {
            transactions: Vec::new(),
            subscriptions: Vec::new(),
            categories: CategorySet::default(),
            currency: DEFAULT_CURRENCY.to_string(),
            custom_currencies: Vec::new(),
            pockets: default_pockets(),
        }
    }
}

/// Export file schema. Every key is optional on import.
///
/// Records in `transactions`, `subscriptions` and `pockets` are read one at a
/// time: an entry that does not parse (a `null` amount, an empty date) is
/// dropped and counted in `skipped_records` instead of failing the file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "SnapshotRecord")]
pub struct Snapshot {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transactions: Option<Vec<Transaction>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subscriptions: Option<Vec<Subscription>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub categories: Option<CategorySet>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_currencies: Option<Vec<CustomCurrency>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pockets: Option<Vec<Pocket>>,
    #[serde(skip)]
    pub skipped_records: usize,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SnapshotRecord {
    #[serde(default)]
    transactions: Option<Vec<serde_json::Value>>,
    #[serde(default)]
    subscriptions: Option<Vec<serde_json::Value>>,
    #[serde(default)]
    categories: Option<CategorySet>,
    #[serde(default)]
    currency: Option<String>,
    #[serde(default)]
    custom_currencies: Option<Vec<CustomCurrency>>,
    #[serde(default)]
    pockets: Option<Vec<serde_json::Value>>,
}

fn keep_parsed<T: DeserializeOwned>(
    key: &'static str,
    raw: Option<Vec<serde_json::Value>>,
    skipped: &mut usize,
) -> Option<Vec<T>> {
    raw.map(|values| {
        values
            .into_iter()
            .enumerate()
            .filter_map(|(index, value)| match serde_json::from_value(value) {
                Ok(record) => Some(record),
                Err(error) => {
                    warn!(key, index, %error, "skipping malformed record");
                    *skipped += 1;
                    None
                }
            })
            .collect()
    })
}

impl From<SnapshotRecord> for Snapshot {
    fn from(r: SnapshotRecord) -> Self {
        let mut skipped = 0;
        let transactions = keep_parsed("transactions", r.transactions, &mut skipped);
        let subscriptions = keep_parsed("subscriptions", r.subscriptions, &mut skipped);
        let pockets = keep_parsed("pockets", r.pockets, &mut skipped);
        Snapshot {
            transactions,
            subscriptions,
            categories: r.categories,
            currency: r.currency,
            custom_currencies: r.custom_currencies,
            pockets,
            skipped_records: skipped,
        }
    }
}

impl From<&LedgerState> for Snapshot {
    fn from(s: &LedgerState) -> Self {
        Snapshot {
            transactions: Some(s.transactions.clone()),
            subscriptions: Some(s.subscriptions.clone()),
            categories: Some(s.categories.clone()),
            currency: Some(s.currency.clone()),
            custom_currencies: Some(s.custom_currencies.clone()),
            pockets: Some(s.pockets.clone()),
            skipped_records: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn transfer_leg_reads_flat_wire_fields() {
        let raw = json!({
            "id": "1700000000000",
            "type": "expense",
            "amount": 30,
            "category": "Transfer",
            "date": "2024-03-05",
            "description": "Transfer to Bank Account",
            "pocketId": "1",
            "transferId": "1700000000000",
            "transferToPocketId": "2"
        });
        let t: Transaction = serde_json::from_value(raw).unwrap();
        let link = t.transfer_link().unwrap();
        assert_eq!(link.counterpart_pocket_id, Id::from("2"));
        assert_eq!(t.amount, Decimal::from(30));

        let back = serde_json::to_value(&t).unwrap();
        assert_eq!(back["transferToPocketId"], "2");
        assert!(back.get("transferFromPocketId").is_none());
        assert_eq!(back["amount"], json!(30.0));
    }

    #[test]
    fn legacy_record_without_pocket_is_ordinary() {
        let raw = json!({
            "id": "42",
            "type": "income",
            "amount": 12.5,
            "category": "Transfer",
            "date": "2024-01-01",
            "description": "",
            "pocketId": ""
        });
        let t: Transaction = serde_json::from_value(raw).unwrap();
        assert!(!t.is_transfer_leg());
        assert!(t.pocket_id.is_none());
        assert!(t.description.is_none());
    }

    #[test]
    fn unknown_billing_cycle_kept_verbatim() {
        let c: BillingCycle = serde_json::from_str("\"biweekly\"").unwrap();
        assert_eq!(c, BillingCycle::Other("biweekly".into()));
        assert_eq!(serde_json::to_string(&c).unwrap(), "\"biweekly\"");
        assert_eq!(BillingCycle::Quarterly.label(), "Quarterly (Every 3 Months)");
    }

    #[test]
    fn snapshot_drops_unparseable_records() {
        let raw = json!({
            "transactions": [
                {"id": "a", "type": "expense", "amount": null, "category": "Food", "date": "2024-03-05"},
                {"id": "b", "type": "expense", "amount": 4, "category": "Food", "date": ""},
                {"id": "c", "type": "income", "amount": 4, "category": "Salary", "date": "2024-03-05"}
            ],
            "pockets": [
                {"id": "1", "name": "Cash", "balance": null, "color": "#4caf50", "icon": "wallet"}
            ],
            "currency": "$"
        });
        let snap: Snapshot = serde_json::from_value(raw).unwrap();
        assert_eq!(snap.skipped_records, 3);
        let ids: Vec<&str> = snap.transactions.as_ref().unwrap().iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, ["c"]);
        assert_eq!(snap.pockets, Some(vec![]));
        assert_eq!(snap.currency.as_deref(), Some("$"));
        assert_eq!(snap.subscriptions, None);

        let out = serde_json::to_value(&snap).unwrap();
        assert!(out.get("skippedRecords").is_none());
    }

    #[test]
    fn category_set_fills_missing_side_with_defaults() {
        let set: CategorySet = serde_json::from_value(json!({"income": ["Salary"]})).unwrap();
        assert_eq!(set.income, ["Salary"]);
        assert_eq!(set.expense, CategorySet::default().expense);
    }
}
