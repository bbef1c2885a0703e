// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Read-only views derived from a ledger snapshot.
//!
//! Every function here borrows its input and returns a fresh value; nothing
//! in this module can reach the ledger's write paths. Callers supply `now`
//! explicitly so results are reproducible.

pub mod calendar;
pub mod period;
pub mod subscriptions;
pub mod summary;
pub mod trend;

pub use calendar::{
    CalendarDay, CalendarMonth, DailyTransactions, calendar_month, daily_transactions,
    heatmap_intensity,
};
pub use period::{Period, TransactionFilter, filter_by_period, filter_transactions, recent_transactions};
pub use subscriptions::{monthly_equivalent, monthly_subscription_cost};
pub use summary::{CategoryTotals, PocketActivity, Summary, pocket_activity, summarize};
pub use trend::{
    MonthBucket, Prediction, SavingsOutlook, TrendAnalysis, analyze_trend,
    linear_regression_slope, monthly_trend, top_expense_categories,
};
