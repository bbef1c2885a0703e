// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::ids::Id;
use crate::models::Flow;
use rust_decimal::Decimal;
use thiserror::Error;

/// Failure of the durable key-value collaborator.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("sqlite: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("could not determine platform-specific data dir")]
    NoDataDir,
}

/// Every way a ledger mutation can decline. Each rejection is its own
/// variant so callers can tell them apart.
#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("{flow} category '{name}' already exists")]
    DuplicateCategory { flow: Flow, name: String },
    #[error("{flow} category '{name}' is used by existing transactions")]
    CategoryInUse { flow: Flow, name: String },
    #[error("pocket '{0}' not found")]
    UnknownPocket(Id),
    #[error("pocket '{0}' is referenced by existing transactions")]
    PocketInUse(Id),
    #[error("cannot delete the last remaining pocket")]
    LastPocket,
    #[error("cannot transfer from a pocket to itself")]
    SameTransferPocket,
    #[error("insufficient funds: {available} available, {requested} requested")]
    InsufficientFunds { available: Decimal, requested: Decimal },
    #[error("balance of pocket '{0}' is out of range")]
    BalanceOverflow(Id),
    #[error("currency symbol and name must both be non-empty")]
    InvalidCurrency,
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error("corrupt stored value for '{key}': {source}")]
    Serialization {
        key: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

pub type LedgerResult<T> = Result<T, LedgerError>;
