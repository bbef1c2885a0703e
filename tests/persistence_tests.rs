// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use budgetin::db::{self, SqliteStore};
use budgetin::ledger::Ledger;
use budgetin::models::{BillingCycle, Flow, SubscriptionDraft, TransactionDraft};
use budgetin::store::{KeyValueStore, keys};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use tempfile::tempdir;

#[test]
fn state_survives_reopening_the_database() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("state.sqlite");

    let before = {
        let mut ledger = Ledger::open(db::open_or_init(Some(path.as_path())).unwrap()).unwrap();
        ledger.add_category(Flow::Income, "Bonus").unwrap();
        ledger
            .add_transaction(TransactionDraft {
                flow: Flow::Income,
                amount: Decimal::new(10050, 2),
                category: "Bonus".into(),
                pocket_id: Some("2".into()),
                date: NaiveDate::from_ymd_opt(2024, 12, 24).unwrap(),
                description: None,
            })
            .unwrap();
        ledger
            .add_subscription(SubscriptionDraft {
                name: "Music".into(),
                amount: Decimal::from(5),
                category: "Entertainment".into(),
                billing_cycle: BillingCycle::Monthly,
                next_billing_date: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
                pocket_id: None,
                description: None,
            })
            .unwrap();
        ledger.add_custom_currency("RM", "Malaysian Ringgit").unwrap();
        ledger.state().clone()
    };

    let reopened = Ledger::open(db::open_or_init(Some(path.as_path())).unwrap()).unwrap();
    assert_eq!(reopened.state(), &before);
    assert_eq!(reopened.currency(), "RM");
    assert_eq!(reopened.pockets()[1].balance, Decimal::new(10050, 2));
}

#[test]
fn fresh_database_yields_defaults() {
    let ledger = Ledger::open(SqliteStore::open_in_memory().unwrap()).unwrap();
    assert_eq!(ledger.currency(), "Rp");
    assert_eq!(ledger.pockets().len(), 2);
    assert!(ledger.transactions().is_empty());
}

#[test]
fn every_key_is_written_after_a_mutation() {
    let mut ledger = Ledger::open(SqliteStore::open_in_memory().unwrap()).unwrap();
    ledger.set_currency("$").unwrap();
    let store = ledger.into_store();
    for key in [
        keys::TRANSACTIONS,
        keys::SUBSCRIPTIONS,
        keys::CATEGORIES,
        keys::CURRENCY,
        keys::CUSTOM_CURRENCIES,
        keys::POCKETS,
    ] {
        assert!(store.get(key).unwrap().is_some(), "{} not persisted", key);
    }
    assert_eq!(store.get(keys::CURRENCY).unwrap().as_deref(), Some("$"));
}

#[test]
fn corrupt_key_is_reported_on_open() {
    let mut store = SqliteStore::open_in_memory().unwrap();
    store.set(keys::POCKETS, "{not json").unwrap();
    assert!(Ledger::open(store).is_err());
}
