//! Builds the distribution roster from the savings ledger and subscription
//! records.

use rust_decimal::Decimal;
use std::collections::BTreeMap;

use crate::distribution::MemberBalance;
use crate::savings::ledger::{all_balances, SavingsTransaction};
use crate::types::{MemberId, Money};

/// Roster snapshot for a distribution year, ordered by member id.
///
/// `subscriptions` maps each member to the latest year they paid the annual
/// subscription. Members appear if they have savings activity or a
/// subscription record; eligibility means the subscription covers `year`.
pub fn build_roster(
    ledger: &[SavingsTransaction],
    subscriptions: &BTreeMap<MemberId, i32>,
    year: i32,
) -> Vec<MemberBalance> {
    let mut balances: BTreeMap<MemberId, Money> = all_balances(ledger);
    for member_id in subscriptions.keys() {
        balances.entry(member_id.clone()).or_insert(Decimal::ZERO);
    }

    balances
        .into_iter()
        .map(|(member_id, balance)| {
            let eligible = subscriptions.get(&member_id) == Some(&year);
            MemberBalance {
                member_id,
                balance,
                eligible,
            }
        })
        .collect()
}
