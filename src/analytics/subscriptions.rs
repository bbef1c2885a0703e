// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::models::{BillingCycle, Subscription};
use rust_decimal::Decimal;

/// Average number of weeks in a month.
const WEEKS_PER_MONTH: Decimal = Decimal::from_parts(433, 0, 0, false, 2);

/// Cost of one subscription expressed per month. Unknown cycles count as
/// monthly.
pub fn monthly_equivalent(sub: &Subscription) -> Decimal {
    match sub.billing_cycle {
        BillingCycle::Weekly => sub.amount.saturating_mul(WEEKS_PER_MONTH),
        BillingCycle::Monthly | BillingCycle::Other(_) => sub.amount,
        BillingCycle::Quarterly => sub.amount / Decimal::from(3),
        BillingCycle::Annually => sub.amount / Decimal::from(12),
    }
}

pub fn monthly_subscription_cost(subscriptions: &[Subscription]) -> Decimal {
    subscriptions
        .iter()
        .map(monthly_equivalent)
        .fold(Decimal::ZERO, Decimal::saturating_add)
}
