// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! The ledger: authoritative collections plus the mutations that keep them
//! consistent.
//!
//! Pocket balances are cached on the pocket and adjusted by the write paths
//! below (`add_transaction`, `delete_transaction`, `transfer_between_pockets`,
//! `update_pocket` with an explicit balance). Nothing else writes a balance.
//! The alternative is to fold a pocket's transactions on every read; that
//! cannot reproduce opening balances given to `add_pocket`, so the cache is
//! kept and the round-trip tests in this module pin the write paths. The
//! `doctor` command recomputes history per pocket to audit the cache.
//!
//! A write that would take a balance outside the `Decimal` range is refused
//! with `BalanceOverflow` before anything changes.
//!
//! Every successful mutation saves the full state before returning. A failed
//! save is returned to the caller; the in-memory change is not rolled back.

use crate::error::{LedgerError, LedgerResult};
use crate::ids::Id;
use crate::models::{
    CustomCurrency, Flow, LedgerState, Pocket, PocketDraft, PocketPatch, Snapshot, Subscription,
    SubscriptionDraft, TRANSFER_CATEGORY, Transaction, TransactionDraft, TransactionKind,
    TransferLink, default_pockets,
};
use crate::store::{KeyValueStore, keys};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};

pub struct Ledger<S: KeyValueStore> {
    state: LedgerState,
    store: S,
}

impl<S: KeyValueStore> Ledger<S> {
    /// Rehydrates from `store`. Missing keys fall back to the built-in defaults.
    pub fn open(store: S) -> LedgerResult<Self> {
        let mut state = LedgerState::default();
        if let Some(v) = load(&store, keys::TRANSACTIONS)? {
            state.transactions = v;
        }
        if let Some(v) = load(&store, keys::SUBSCRIPTIONS)? {
            state.subscriptions = v;
        }
        if let Some(v) = load(&store, keys::CATEGORIES)? {
            state.categories = v;
        }
        if let Some(v) = store.get(keys::CURRENCY)? {
            state.currency = v;
        }
        if let Some(v) = load(&store, keys::CUSTOM_CURRENCIES)? {
            state.custom_currencies = v;
        }
        if let Some(v) = load(&store, keys::POCKETS)? {
            state.pockets = v;
        }
        debug!(
            transactions = state.transactions.len(),
            pockets = state.pockets.len(),
            "ledger rehydrated"
        );
        Ok(Self { state, store })
    }

    pub fn state(&self) -> &LedgerState {
        &self.state
    }

    pub fn transactions(&self) -> &[Transaction] {
        &self.state.transactions
    }

    pub fn subscriptions(&self) -> &[Subscription] {
        &self.state.subscriptions
    }

    pub fn pockets(&self) -> &[Pocket] {
        &self.state.pockets
    }

    pub fn pocket(&self, id: &Id) -> Option<&Pocket> {
        self.state.pockets.iter().find(|p| &p.id == id)
    }

    pub fn currency(&self) -> &str {
        &self.state.currency
    }

    pub fn into_store(self) -> S {
        self.store
    }

    /// Records a transaction and applies it to its pocket's balance.
    ///
    /// Only the shape of the draft is checked by the type system; amount sign,
    /// category membership and pocket existence are the caller's business. A
    /// transaction naming an unknown pocket is stored without touching any
    /// balance.
    pub fn add_transaction(&mut self, draft: TransactionDraft) -> LedgerResult<Id> {
        let tx = Transaction {
            id: Id::generate(),
            flow: draft.flow,
            amount: draft.amount,
            category: draft.category,
            pocket_id: draft.pocket_id,
            date: draft.date,
            description: draft.description,
            kind: TransactionKind::Ordinary,
        };
        if let Some(pid) = &tx.pocket_id {
            self.adjust_balance(pid, tx.flow.signed(tx.amount))?;
        }
        let id = tx.id.clone();
        info!(id = %id, flow = %tx.flow, amount = %tx.amount, "transaction added");
        self.state.transactions.push(tx);
        self.persist()?;
        Ok(id)
    }

    /// Removes a transaction and reverses its balance effect. Unknown ids are
    /// a no-op.
    pub fn delete_transaction(&mut self, id: &Id) -> LedgerResult<()> {
        let Some(pos) = self.state.transactions.iter().position(|t| &t.id == id) else {
            debug!(id = %id, "delete of unknown transaction ignored");
            return Ok(());
        };
        let tx = &self.state.transactions[pos];
        if let Some(pid) = tx.pocket_id.clone() {
            let delta = -tx.flow.signed(tx.amount);
            self.adjust_balance(&pid, delta)?;
        }
        self.state.transactions.remove(pos);
        info!(id = %id, "transaction deleted");
        self.persist()
    }

    pub fn add_subscription(&mut self, draft: SubscriptionDraft) -> LedgerResult<Id> {
        let id = Id::generate();
        self.state.subscriptions.push(Subscription {
            id: id.clone(),
            name: draft.name,
            amount: draft.amount,
            category: draft.category,
            billing_cycle: draft.billing_cycle,
            next_billing_date: draft.next_billing_date,
            pocket_id: draft.pocket_id,
            description: draft.description,
        });
        info!(id = %id, "subscription added");
        self.persist()?;
        Ok(id)
    }

    pub fn delete_subscription(&mut self, id: &Id) -> LedgerResult<()> {
        let before = self.state.subscriptions.len();
        self.state.subscriptions.retain(|s| &s.id != id);
        if self.state.subscriptions.len() == before {
            return Ok(());
        }
        info!(id = %id, "subscription deleted");
        self.persist()
    }

    pub fn add_category(&mut self, flow: Flow, name: &str) -> LedgerResult<()> {
        if self.state.categories.contains(flow, name) {
            warn!(%flow, name, "duplicate category rejected");
            return Err(LedgerError::DuplicateCategory {
                flow,
                name: name.to_string(),
            });
        }
        self.state.categories.names_mut(flow).push(name.to_string());
        info!(%flow, name, "category added");
        self.persist()
    }

    pub fn delete_category(&mut self, flow: Flow, name: &str) -> LedgerResult<()> {
        let in_use = self
            .state
            .transactions
            .iter()
            .any(|t| !t.is_transfer_leg() && t.flow == flow && t.category == name);
        if in_use {
            warn!(%flow, name, "category in use, not deleted");
            return Err(LedgerError::CategoryInUse {
                flow,
                name: name.to_string(),
            });
        }
        self.state.categories.names_mut(flow).retain(|c| c != name);
        info!(%flow, name, "category deleted");
        self.persist()
    }

    pub fn add_pocket(&mut self, draft: PocketDraft, initial_balance: Decimal) -> LedgerResult<Id> {
        let id = Id::generate();
        self.state.pockets.push(Pocket {
            id: id.clone(),
            name: draft.name,
            balance: initial_balance,
            color: draft.color,
            icon: draft.icon,
        });
        info!(id = %id, balance = %initial_balance, "pocket added");
        self.persist()?;
        Ok(id)
    }

    /// Merges the provided fields. The cached balance is only replaced when
    /// the patch carries one.
    pub fn update_pocket(&mut self, id: &Id, patch: PocketPatch) -> LedgerResult<()> {
        let pocket = self
            .state
            .pockets
            .iter_mut()
            .find(|p| &p.id == id)
            .ok_or_else(|| LedgerError::UnknownPocket(id.clone()))?;
        if let Some(name) = patch.name {
            pocket.name = name;
        }
        if let Some(color) = patch.color {
            pocket.color = color;
        }
        if let Some(icon) = patch.icon {
            pocket.icon = icon;
        }
        if let Some(balance) = patch.balance {
            pocket.balance = balance;
        }
        info!(id = %id, "pocket updated");
        self.persist()
    }

    pub fn delete_pocket(&mut self, id: &Id) -> LedgerResult<()> {
        if self.state.pockets.len() <= 1 {
            warn!(id = %id, "refusing to delete the last pocket");
            return Err(LedgerError::LastPocket);
        }
        if self
            .state
            .transactions
            .iter()
            .any(|t| t.pocket_id.as_ref() == Some(id))
        {
            warn!(id = %id, "pocket in use, not deleted");
            return Err(LedgerError::PocketInUse(id.clone()));
        }
        let before = self.state.pockets.len();
        self.state.pockets.retain(|p| &p.id != id);
        if self.state.pockets.len() == before {
            return Ok(());
        }
        info!(id = %id, "pocket deleted");
        self.persist()
    }

    /// Moves `amount` between pockets, dated today. Returns the transfer id.
    pub fn transfer_between_pockets(
        &mut self,
        from: &Id,
        to: &Id,
        amount: Decimal,
    ) -> LedgerResult<Id> {
        let today = chrono::Local::now().date_naive();
        self.transfer_between_pockets_on(from, to, amount, today)
    }

    /// Debits `from`, credits `to`, and books a matched pair of transfer legs
    /// on `date`: an expense on the source and an income on the destination.
    pub fn transfer_between_pockets_on(
        &mut self,
        from: &Id,
        to: &Id,
        amount: Decimal,
        date: NaiveDate,
    ) -> LedgerResult<Id> {
        if from == to {
            warn!(pocket = %from, "same-pocket transfer rejected");
            return Err(LedgerError::SameTransferPocket);
        }
        let from_pocket = self
            .pocket(from)
            .ok_or_else(|| LedgerError::UnknownPocket(from.clone()))?;
        let to_pocket = self
            .pocket(to)
            .ok_or_else(|| LedgerError::UnknownPocket(to.clone()))?;
        if from_pocket.balance < amount {
            warn!(pocket = %from, balance = %from_pocket.balance, %amount, "insufficient funds for transfer");
            return Err(LedgerError::InsufficientFunds {
                available: from_pocket.balance,
                requested: amount,
            });
        }
        let debited = shifted(from_pocket, -amount)?;
        let credited = shifted(to_pocket, amount)?;
        let from_name = from_pocket.name.clone();
        let to_name = to_pocket.name.clone();

        self.set_balance(from, debited);
        self.set_balance(to, credited);

        let transfer_id = Id::generate();
        self.state.transactions.push(Transaction {
            id: Id::generate(),
            flow: Flow::Expense,
            amount,
            category: TRANSFER_CATEGORY.to_string(),
            pocket_id: Some(from.clone()),
            date,
            description: Some(format!("Transfer to {}", to_name)),
            kind: TransactionKind::TransferLeg(TransferLink {
                transfer_id: transfer_id.clone(),
                counterpart_pocket_id: to.clone(),
            }),
        });
        self.state.transactions.push(Transaction {
            id: Id::generate(),
            flow: Flow::Income,
            amount,
            category: TRANSFER_CATEGORY.to_string(),
            pocket_id: Some(to.clone()),
            date,
            description: Some(format!("Transfer from {}", from_name)),
            kind: TransactionKind::TransferLeg(TransferLink {
                transfer_id: transfer_id.clone(),
                counterpart_pocket_id: from.clone(),
            }),
        });
        info!(transfer = %transfer_id, %from, %to, %amount, "pocket transfer booked");
        self.persist()?;
        Ok(transfer_id)
    }

    pub fn set_currency(&mut self, symbol: &str) -> LedgerResult<()> {
        let symbol = symbol.trim();
        if symbol.is_empty() {
            return Err(LedgerError::InvalidCurrency);
        }
        self.state.currency = symbol.to_string();
        self.persist()
    }

    /// Registers a custom currency and makes it the current one.
    pub fn add_custom_currency(&mut self, symbol: &str, name: &str) -> LedgerResult<()> {
        let (symbol, name) = (symbol.trim(), name.trim());
        if symbol.is_empty() || name.is_empty() {
            return Err(LedgerError::InvalidCurrency);
        }
        self.state.custom_currencies.push(CustomCurrency {
            symbol: symbol.to_string(),
            name: name.to_string(),
        });
        self.state.currency = symbol.to_string();
        info!(symbol, name, "custom currency added");
        self.persist()
    }

    pub fn export_data(&self) -> Snapshot {
        Snapshot::from(&self.state)
    }

    /// Replaces collections wholesale from `snapshot`. Absent keys keep the
    /// current value, except pockets, which fall back to the built-in pair.
    pub fn import_data(&mut self, snapshot: Snapshot) -> LedgerResult<()> {
        if let Some(v) = snapshot.transactions {
            self.state.transactions = v;
        }
        if let Some(v) = snapshot.subscriptions {
            self.state.subscriptions = v;
        }
        if let Some(v) = snapshot.categories {
            self.state.categories = v;
        }
        if let Some(v) = snapshot.currency.filter(|c| !c.is_empty()) {
            self.state.currency = v;
        }
        if let Some(v) = snapshot.custom_currencies {
            self.state.custom_currencies = v;
        }
        // An empty pocket list would break the at-least-one-pocket invariant.
        self.state.pockets = match snapshot.pockets {
            Some(p) if !p.is_empty() => p,
            _ => default_pockets(),
        };
        if snapshot.skipped_records > 0 {
            warn!(skipped = snapshot.skipped_records, "malformed records left out of import");
        }
        info!(
            transactions = self.state.transactions.len(),
            pockets = self.state.pockets.len(),
            "data imported"
        );
        self.persist()
    }

    /// Resets everything to defaults except the currency selection.
    pub fn clear_all_data(&mut self) -> LedgerResult<()> {
        let currency = std::mem::take(&mut self.state.currency);
        let custom = std::mem::take(&mut self.state.custom_currencies);
        self.state = LedgerState {
            currency,
            custom_currencies: custom,
            ..LedgerState::default()
        };
        info!("all data cleared");
        self.persist()
    }

    fn adjust_balance(&mut self, pocket_id: &Id, delta: Decimal) -> LedgerResult<()> {
        match self.pocket(pocket_id) {
            Some(p) => {
                let balance = shifted(p, delta)?;
                self.set_balance(pocket_id, balance);
            }
            None => debug!(pocket = %pocket_id, "no such pocket, balance untouched"),
        }
        Ok(())
    }

    fn set_balance(&mut self, pocket_id: &Id, balance: Decimal) {
        if let Some(p) = self.state.pockets.iter_mut().find(|p| &p.id == pocket_id) {
            p.balance = balance;
        }
    }

    fn persist(&mut self) -> LedgerResult<()> {
        let s = &self.state;
        let entries = [
            (keys::TRANSACTIONS, to_json(keys::TRANSACTIONS, &s.transactions)?),
            (keys::SUBSCRIPTIONS, to_json(keys::SUBSCRIPTIONS, &s.subscriptions)?),
            (keys::CATEGORIES, to_json(keys::CATEGORIES, &s.categories)?),
            (keys::CURRENCY, s.currency.clone()),
            (
                keys::CUSTOM_CURRENCIES,
                to_json(keys::CUSTOM_CURRENCIES, &s.custom_currencies)?,
            ),
            (keys::POCKETS, to_json(keys::POCKETS, &s.pockets)?),
        ];
        self.store.set_all(&entries)?;
        debug!("state saved");
        Ok(())
    }
}

/// `pocket`'s balance moved by `delta`, or an error when it leaves the
/// representable range.
fn shifted(pocket: &Pocket, delta: Decimal) -> LedgerResult<Decimal> {
    pocket.balance.checked_add(delta).ok_or_else(|| {
        warn!(pocket = %pocket.id, balance = %pocket.balance, %delta, "balance out of range");
        LedgerError::BalanceOverflow(pocket.id.clone())
    })
}

fn load<S: KeyValueStore, T: DeserializeOwned>(
    store: &S,
    key: &'static str,
) -> LedgerResult<Option<T>> {
    match store.get(key)? {
        Some(raw) => serde_json::from_str(&raw)
            .map(Some)
            .map_err(|source| LedgerError::Serialization { key, source }),
        None => Ok(None),
    }
}

fn to_json<T: Serialize>(key: &'static str, v: &T) -> LedgerResult<String> {
    serde_json::to_string(v).map_err(|source| LedgerError::Serialization { key, source })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StorageError;
    use crate::store::MemoryStore;
    use std::cell::Cell;
    use std::rc::Rc;

    fn d(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn day(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn ledger() -> Ledger<MemoryStore> {
        Ledger::open(MemoryStore::new()).unwrap()
    }

    fn draft(flow: Flow, amount: &str, pocket: Option<&str>) -> TransactionDraft {
        TransactionDraft {
            flow,
            amount: d(amount),
            category: "Food".into(),
            pocket_id: pocket.map(Id::from),
            date: day("2024-05-01"),
            description: None,
        }
    }

    fn balance(l: &Ledger<MemoryStore>, id: &str) -> Decimal {
        l.pocket(&Id::from(id)).unwrap().balance
    }

    #[test]
    fn add_then_delete_restores_balance() {
        let mut l = ledger();
        l.update_pocket(
            &Id::from("1"),
            PocketPatch {
                balance: Some(d("100.10")),
                ..Default::default()
            },
        )
        .unwrap();
        for (flow, amount) in [
            (Flow::Income, "0.01"),
            (Flow::Expense, "250.75"),
            (Flow::Income, "1000000"),
            (Flow::Expense, "0"),
        ] {
            let before = balance(&l, "1");
            let id = l.add_transaction(draft(flow, amount, Some("1"))).unwrap();
            assert_eq!(balance(&l, "1"), before + flow.signed(d(amount)));
            l.delete_transaction(&id).unwrap();
            assert_eq!(balance(&l, "1"), before);
        }
    }

    #[test]
    fn delete_unknown_transaction_is_noop() {
        let mut l = ledger();
        l.add_transaction(draft(Flow::Income, "5", Some("1"))).unwrap();
        l.delete_transaction(&Id::from("missing")).unwrap();
        assert_eq!(l.transactions().len(), 1);
        assert_eq!(balance(&l, "1"), d("5"));
    }

    #[test]
    fn transaction_without_pocket_leaves_balances_alone() {
        let mut l = ledger();
        l.add_transaction(draft(Flow::Expense, "40", None)).unwrap();
        assert!(l.pockets().iter().all(|p| p.balance.is_zero()));
    }

    #[test]
    fn duplicate_category_rejected() {
        let mut l = ledger();
        assert!(matches!(
            l.add_category(Flow::Expense, "Food"),
            Err(LedgerError::DuplicateCategory { .. })
        ));
        l.add_category(Flow::Income, "Food").unwrap();
        assert!(l.state().categories.contains(Flow::Income, "Food"));
    }

    #[test]
    fn category_in_use_matches_on_type_and_name() {
        let mut l = ledger();
        l.add_transaction(draft(Flow::Expense, "3", None)).unwrap();
        assert!(matches!(
            l.delete_category(Flow::Expense, "Food"),
            Err(LedgerError::CategoryInUse { .. })
        ));
        l.add_category(Flow::Income, "Food").unwrap();
        l.delete_category(Flow::Income, "Food").unwrap();
        assert!(!l.state().categories.contains(Flow::Income, "Food"));
    }

    #[test]
    fn update_pocket_without_balance_keeps_it() {
        let mut l = ledger();
        let id = l
            .add_pocket(
                PocketDraft {
                    name: "Wallet".into(),
                    color: "#000000".into(),
                    icon: "wallet".into(),
                },
                d("75"),
            )
            .unwrap();
        l.update_pocket(
            &id,
            PocketPatch {
                name: Some("Travel".into()),
                color: Some("#ff0000".into()),
                ..Default::default()
            },
        )
        .unwrap();
        let p = l.pocket(&id).unwrap();
        assert_eq!(p.name, "Travel");
        assert_eq!(p.balance, d("75"));
        assert!(matches!(
            l.update_pocket(&Id::from("nope"), PocketPatch::default()),
            Err(LedgerError::UnknownPocket(_))
        ));
    }

    #[test]
    fn delete_pocket_guards() {
        let mut l = ledger();
        l.add_transaction(draft(Flow::Income, "1", Some("2"))).unwrap();
        let before = l.state().clone();
        assert!(matches!(
            l.delete_pocket(&Id::from("2")),
            Err(LedgerError::PocketInUse(_))
        ));
        assert_eq!(l.state(), &before);

        l.delete_pocket(&Id::from("1")).unwrap();
        assert!(matches!(
            l.delete_pocket(&Id::from("2")),
            Err(LedgerError::LastPocket)
        ));
        assert_eq!(l.pockets().len(), 1);
    }

    #[test]
    fn transfer_moves_money_and_links_legs() {
        let mut l = ledger();
        for (id, amt) in [("1", "100"), ("2", "50")] {
            l.update_pocket(
                &Id::from(id),
                PocketPatch {
                    balance: Some(d(amt)),
                    ..Default::default()
                },
            )
            .unwrap();
        }
        let tid = l
            .transfer_between_pockets_on(&Id::from("1"), &Id::from("2"), d("30"), day("2024-06-01"))
            .unwrap();
        assert_eq!(balance(&l, "1"), d("70"));
        assert_eq!(balance(&l, "2"), d("80"));

        let legs: Vec<&Transaction> = l.transactions().iter().collect();
        assert_eq!(legs.len(), 2);
        let (out, inc) = (legs[0], legs[1]);
        assert_eq!(out.flow, Flow::Expense);
        assert_eq!(out.pocket_id, Some(Id::from("1")));
        assert_eq!(inc.flow, Flow::Income);
        assert_eq!(inc.pocket_id, Some(Id::from("2")));
        assert_eq!(out.amount, inc.amount);
        assert!(legs.iter().all(|t| t.category == TRANSFER_CATEGORY));
        assert_eq!(out.transfer_link().unwrap().transfer_id, tid);
        assert_eq!(inc.transfer_link().unwrap().transfer_id, tid);
        assert_eq!(out.transfer_link().unwrap().counterpart_pocket_id, Id::from("2"));
        assert_eq!(inc.transfer_link().unwrap().counterpart_pocket_id, Id::from("1"));
        assert_eq!(out.description.as_deref(), Some("Transfer to Bank Account"));
    }

    #[test]
    fn rejected_transfers_change_nothing() {
        let mut l = ledger();
        l.update_pocket(
            &Id::from("1"),
            PocketPatch {
                balance: Some(d("10")),
                ..Default::default()
            },
        )
        .unwrap();
        let before = l.state().clone();
        let (a, b, x) = (Id::from("1"), Id::from("2"), Id::from("x"));
        assert!(matches!(
            l.transfer_between_pockets(&a, &b, d("10.01")),
            Err(LedgerError::InsufficientFunds { .. })
        ));
        assert!(matches!(
            l.transfer_between_pockets(&a, &a, d("1")),
            Err(LedgerError::SameTransferPocket)
        ));
        assert!(matches!(
            l.transfer_between_pockets(&a, &x, d("1")),
            Err(LedgerError::UnknownPocket(_))
        ));
        assert!(matches!(
            l.transfer_between_pockets(&x, &a, d("1")),
            Err(LedgerError::UnknownPocket(_))
        ));
        assert_eq!(l.state(), &before);
    }

    #[test]
    fn import_without_pockets_restores_defaults() {
        let mut l = ledger();
        l.add_pocket(
            PocketDraft {
                name: "Extra".into(),
                color: "#123456".into(),
                icon: "x".into(),
            },
            Decimal::ZERO,
        )
        .unwrap();
        l.set_currency("$").unwrap();
        l.import_data(Snapshot {
            subscriptions: Some(vec![]),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(l.pockets(), default_pockets().as_slice());
        assert_eq!(l.currency(), "$");
    }

    #[test]
    fn clear_keeps_currency() {
        let mut l = ledger();
        l.add_custom_currency("€", "Euro").unwrap();
        l.add_transaction(draft(Flow::Income, "9", Some("1"))).unwrap();
        l.clear_all_data().unwrap();
        assert!(l.transactions().is_empty());
        assert_eq!(l.pockets(), default_pockets().as_slice());
        assert_eq!(l.currency(), "€");
        assert_eq!(l.state().custom_currencies.len(), 1);
    }

    #[test]
    fn reopen_rehydrates_saved_state() {
        let mut l = ledger();
        l.add_transaction(draft(Flow::Income, "12.34", Some("2"))).unwrap();
        l.set_currency("$").unwrap();
        let saved = l.state().clone();
        let reopened = Ledger::open(l.into_store()).unwrap();
        assert_eq!(reopened.state(), &saved);
    }

    #[test]
    fn corrupt_key_is_reported_by_name() {
        let mut store = MemoryStore::new();
        store.set(keys::POCKETS, "not json").unwrap();
        match Ledger::open(store) {
            Err(LedgerError::Serialization { key, .. }) => assert_eq!(key, keys::POCKETS),
            _ => panic!("expected serialization error"),
        }
    }

    /// Memory store whose writes fail while `failing` is raised.
    #[derive(Default)]
    struct FlakyStore {
        inner: MemoryStore,
        failing: Rc<Cell<bool>>,
    }

    impl KeyValueStore for FlakyStore {
        fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
            self.inner.get(key)
        }

        fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
            self.inner.set(key, value)
        }

        fn set_all(&mut self, entries: &[(&str, String)]) -> Result<(), StorageError> {
            if self.failing.get() {
                let full = rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_FULL);
                return Err(StorageError::Sqlite(rusqlite::Error::SqliteFailure(full, None)));
            }
            for (key, value) in entries {
                self.inner.set(key, value)?;
            }
            Ok(())
        }
    }

    #[test]
    fn failed_save_is_returned_to_caller() {
        let failing = Rc::new(Cell::new(false));
        let store = FlakyStore {
            failing: failing.clone(),
            ..Default::default()
        };
        let mut l = Ledger::open(store).unwrap();
        l.update_pocket(
            &Id::from("1"),
            PocketPatch {
                balance: Some(d("100")),
                ..Default::default()
            },
        )
        .unwrap();

        failing.set(true);
        assert!(matches!(
            l.add_transaction(draft(Flow::Income, "5", Some("1"))),
            Err(LedgerError::Storage(StorageError::Sqlite(_)))
        ));
        assert!(matches!(
            l.transfer_between_pockets_on(&Id::from("1"), &Id::from("2"), d("30"), day("2024-06-01")),
            Err(LedgerError::Storage(_))
        ));

        failing.set(false);
        l.set_currency("$").unwrap();
        let saved = l.state().clone();
        let reopened = Ledger::open(l.into_store()).unwrap();
        assert_eq!(reopened.state(), &saved);
    }

    #[test]
    fn balance_overflow_is_rejected() {
        let mut l = ledger();
        l.update_pocket(
            &Id::from("1"),
            PocketPatch {
                balance: Some(Decimal::MAX),
                ..Default::default()
            },
        )
        .unwrap();
        let before = l.state().clone();
        assert!(matches!(
            l.add_transaction(draft(Flow::Income, "1", Some("1"))),
            Err(LedgerError::BalanceOverflow(id)) if id == Id::from("1")
        ));
        assert_eq!(l.state(), &before);

        l.update_pocket(
            &Id::from("2"),
            PocketPatch {
                balance: Some(d("10")),
                ..Default::default()
            },
        )
        .unwrap();
        let before = l.state().clone();
        assert!(matches!(
            l.transfer_between_pockets_on(&Id::from("2"), &Id::from("1"), d("1"), day("2024-06-01")),
            Err(LedgerError::BalanceOverflow(_))
        ));
        assert_eq!(l.state(), &before);

        // Withdrawing from the full pocket still works.
        l.add_transaction(draft(Flow::Expense, "1", Some("1"))).unwrap();
        assert_eq!(balance(&l, "1"), Decimal::MAX - Decimal::ONE);
    }

    #[test]
    fn transfer_legs_do_not_pin_a_user_category_named_transfer() {
        let mut l = ledger();
        l.update_pocket(
            &Id::from("1"),
            PocketPatch {
                balance: Some(d("50")),
                ..Default::default()
            },
        )
        .unwrap();
        l.add_category(Flow::Expense, TRANSFER_CATEGORY).unwrap();
        l.transfer_between_pockets_on(&Id::from("1"), &Id::from("2"), d("20"), day("2024-06-01"))
            .unwrap();
        l.delete_category(Flow::Expense, TRANSFER_CATEGORY).unwrap();
        assert!(!l.state().categories.contains(Flow::Expense, TRANSFER_CATEGORY));
        assert_eq!(l.transactions().len(), 2);
    }
}
