//! Member savings transactions: deposits, withdrawals and distribution
//! credits, plus balances and statements derived from them.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

use crate::distribution::{DistributionBasis, DistributionRecord};
use crate::error::ClubFinanceError;
use crate::types::{MemberId, Money};
use crate::ClubFinanceResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    Deposit,
    Withdrawal,
    Distribution,
}

/// One signed movement on a member's savings. Withdrawals are negative.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavingsTransaction {
    pub member_id: MemberId,
    pub amount: Money,
    pub kind: TransactionKind,
    pub transaction_date: NaiveDate,
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemberStatement {
    pub member_id: MemberId,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    /// Balance from everything dated before `start_date`.
    pub opening_balance: Money,
    /// Balance over the whole ledger.
    pub current_balance: Money,
    pub transactions: Vec<SavingsTransaction>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavingsSummary {
    pub total_savings: Money,
    pub total_members: usize,
    pub members_with_savings: usize,
    pub member_balances: BTreeMap<MemberId, Money>,
}

/// Record a savings deposit. The amount must be positive.
pub fn post_deposit(
    member_id: &str,
    amount: Money,
    transaction_date: NaiveDate,
    description: Option<&str>,
) -> ClubFinanceResult<SavingsTransaction> {
    if amount <= Decimal::ZERO {
        return Err(ClubFinanceError::InvalidInput {
            field: "amount".into(),
            reason: "Savings amount must be positive".into(),
        });
    }
    Ok(SavingsTransaction {
        member_id: member_id.to_string(),
        amount,
        kind: TransactionKind::Deposit,
        transaction_date,
        description: description.unwrap_or("Monthly savings deposit").to_string(),
    })
}

/// Record a withdrawal against the member's current balance.
pub fn post_withdrawal(
    ledger: &[SavingsTransaction],
    member_id: &str,
    amount: Money,
    transaction_date: NaiveDate,
    description: Option<&str>,
) -> ClubFinanceResult<SavingsTransaction> {
    if amount <= Decimal::ZERO {
        return Err(ClubFinanceError::InvalidInput {
            field: "amount".into(),
            reason: "Withdrawal amount must be positive".into(),
        });
    }
    let available = member_balance(ledger, member_id);
    if available < amount {
        return Err(ClubFinanceError::InsufficientBalance {
            member_id: member_id.to_string(),
            requested: amount,
            available,
        });
    }
    Ok(SavingsTransaction {
        member_id: member_id.to_string(),
        amount: -amount,
        kind: TransactionKind::Withdrawal,
        transaction_date,
        description: description.unwrap_or("Savings withdrawal").to_string(),
    })
}

pub fn member_balance(ledger: &[SavingsTransaction], member_id: &str) -> Money {
    ledger
        .iter()
        .filter(|t| t.member_id == member_id)
        .map(|t| t.amount)
        .sum()
}

/// Balance per member, keyed and ordered by member id.
pub fn all_balances(ledger: &[SavingsTransaction]) -> BTreeMap<MemberId, Money> {
    let mut balances: BTreeMap<MemberId, Money> = BTreeMap::new();
    for t in ledger {
        *balances.entry(t.member_id.clone()).or_insert(Decimal::ZERO) += t.amount;
    }
    balances
}

pub fn savings_summary(ledger: &[SavingsTransaction]) -> SavingsSummary {
    let member_balances = all_balances(ledger);
    SavingsSummary {
        total_savings: member_balances.values().copied().sum(),
        total_members: member_balances.len(),
        members_with_savings: member_balances
            .values()
            .filter(|b| **b > Decimal::ZERO)
            .count(),
        member_balances,
    }
}

/// Transactions for one member between two dates, inclusive.
pub fn member_statement(
    ledger: &[SavingsTransaction],
    member_id: &str,
    start_date: NaiveDate,
    end_date: NaiveDate,
) -> ClubFinanceResult<MemberStatement> {
    if end_date < start_date {
        return Err(ClubFinanceError::DateError(format!(
            "Statement end {end_date} is before start {start_date}"
        )));
    }

    let own: Vec<&SavingsTransaction> =
        ledger.iter().filter(|t| t.member_id == member_id).collect();
    let opening_balance: Money = own
        .iter()
        .filter(|t| t.transaction_date < start_date)
        .map(|t| t.amount)
        .sum();
    let mut transactions: Vec<SavingsTransaction> = own
        .iter()
        .filter(|t| t.transaction_date >= start_date && t.transaction_date <= end_date)
        .map(|t| (*t).clone())
        .collect();
    transactions.sort_by_key(|t| t.transaction_date);

    Ok(MemberStatement {
        member_id: member_id.to_string(),
        start_date,
        end_date,
        opening_balance,
        current_balance: own.iter().map(|t| t.amount).sum(),
        transactions,
    })
}

/// Savings credits for a completed distribution, one per record.
pub fn distribution_transactions(
    records: &[DistributionRecord],
    transaction_date: NaiveDate,
) -> Vec<SavingsTransaction> {
    let credits: Vec<SavingsTransaction> = records
        .iter()
        .filter(|r| !r.amount.is_zero())
        .map(|r| {
            let label = match r.basis {
                DistributionBasis::Equal => "Loan interest distribution",
                DistributionBasis::Proportional => "Trust earnings distribution",
            };
            SavingsTransaction {
                member_id: r.member_id.clone(),
                amount: r.amount,
                kind: TransactionKind::Distribution,
                transaction_date,
                description: format!("{label} - {transaction_date}"),
            }
        })
        .collect();
    debug!(credits = credits.len(), "distribution credits prepared");
    credits
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, d).unwrap()
    }

    fn ledger() -> Vec<SavingsTransaction> {
        vec![
            post_deposit("alice", dec!(500), day(1), None).unwrap(),
            post_deposit("bob", dec!(200), day(2), Some("Top-up")).unwrap(),
            post_deposit("alice", dec!(300), day(10), None).unwrap(),
        ]
    }

    #[test]
    fn test_deposit_defaults() {
        let t = post_deposit("alice", dec!(50), day(1), None).unwrap();
        assert_eq!(t.kind, TransactionKind::Deposit);
        assert_eq!(t.description, "Monthly savings deposit");
    }

    #[test]
    fn test_deposit_must_be_positive() {
        assert!(post_deposit("alice", Decimal::ZERO, day(1), None).is_err());
    }

    #[test]
    fn test_withdrawal_is_negative_and_checked() {
        let l = ledger();
        let w = post_withdrawal(&l, "alice", dec!(800), day(11), None).unwrap();
        assert_eq!(w.amount, dec!(-800));
        assert_eq!(w.kind, TransactionKind::Withdrawal);

        match post_withdrawal(&l, "bob", dec!(201), day(11), None) {
            Err(ClubFinanceError::InsufficientBalance { available, .. }) => {
                assert_eq!(available, dec!(200))
            }
            other => panic!("Expected InsufficientBalance, got {other:?}"),
        }
    }

    #[test]
    fn test_balances_and_summary() {
        let mut l = ledger();
        l.push(post_withdrawal(&l, "bob", dec!(200), day(12), None).unwrap());
        assert_eq!(member_balance(&l, "alice"), dec!(800));
        assert_eq!(member_balance(&l, "bob"), Decimal::ZERO);
        assert_eq!(member_balance(&l, "carol"), Decimal::ZERO);

        let summary = savings_summary(&l);
        assert_eq!(summary.total_savings, dec!(800));
        assert_eq!(summary.total_members, 2);
        assert_eq!(summary.members_with_savings, 1);
    }

    #[test]
    fn test_statement_window() {
        let s = member_statement(&ledger(), "alice", day(5), day(31)).unwrap();
        assert_eq!(s.opening_balance, dec!(500));
        assert_eq!(s.current_balance, dec!(800));
        assert_eq!(s.transactions.len(), 1);
        assert_eq!(s.transactions[0].amount, dec!(300));
    }

    #[test]
    fn test_statement_rejects_reversed_window() {
        assert!(matches!(
            member_statement(&ledger(), "alice", day(10), day(1)),
            Err(ClubFinanceError::DateError(_))
        ));
    }

    #[test]
    fn test_distribution_credits() {
        let records = vec![
            DistributionRecord {
                member_id: "alice".into(),
                amount: dec!(250),
                basis: DistributionBasis::Proportional,
            },
            DistributionRecord {
                member_id: "bob".into(),
                amount: Decimal::ZERO,
                basis: DistributionBasis::Proportional,
            },
        ];
        let credits = distribution_transactions(&records, day(31));
        assert_eq!(credits.len(), 1);
        assert_eq!(credits[0].kind, TransactionKind::Distribution);
        assert_eq!(
            credits[0].description,
            "Trust earnings distribution - 2024-05-31"
        );
    }
}
