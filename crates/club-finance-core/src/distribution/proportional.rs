//! Proportional split: each member with savings receives a share of the pool
//! matching their share of total savings.

use rust_decimal::Decimal;
use std::time::Instant;
use tracing::debug;

use super::{
    distributable_amount, remainder_warning, settle_remainder, DistributionBasis,
    DistributionInput, DistributionOutput, DistributionRecord, MemberBalance,
};
use crate::config::RemainderPolicy;
use crate::error::ClubFinanceError;
use crate::rounding::round_cents;
use crate::types::{with_metadata, ComputationOutput, Money};
use crate::ClubFinanceResult;

/// Split the distributable pool by savings balance.
///
/// Members with a zero or negative balance get no record and do not count
/// towards the total basis.
pub fn distribute_proportional(
    input: &DistributionInput,
    policy: RemainderPolicy,
) -> ClubFinanceResult<ComputationOutput<DistributionOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let distributable = distributable_amount(input)?;

    let savers: Vec<&MemberBalance> = input
        .members
        .iter()
        .filter(|m| m.balance > Decimal::ZERO)
        .collect();
    let total_basis = savers
        .iter()
        .try_fold(Decimal::ZERO, |acc, m| acc.checked_add(m.balance))
        .ok_or_else(|| ClubFinanceError::InvalidInput {
            field: "members".into(),
            reason: "Sum of member balances exceeds the representable range".into(),
        })?;
    if total_basis <= Decimal::ZERO {
        return Err(ClubFinanceError::NoPositiveBasis { total_basis });
    }

    let mut records: Vec<DistributionRecord> = savers
        .iter()
        .map(|m| DistributionRecord {
            member_id: m.member_id.clone(),
            // share ≤ 1, so scaling the pool by it cannot overflow
            amount: round_cents(distributable * (m.balance / total_basis)),
            basis: DistributionBasis::Proportional,
        })
        .collect();

    let (rounding_remainder, remainder_assigned_to) =
        settle_remainder(distributable, &mut records, &savers, policy);
    let distributed_total: Money = records.iter().map(|r| r.amount).sum();

    let excluded = input.members.len() - savers.len();
    if excluded > 0 {
        warnings.push(format!(
            "{excluded} member(s) without a positive balance excluded"
        ));
    }
    if let Some(warning) = remainder_warning(rounding_remainder) {
        warnings.push(warning);
    }

    debug!(
        members = savers.len(),
        %distributable,
        %total_basis,
        remainder = %rounding_remainder,
        "proportional distribution computed"
    );

    let output = DistributionOutput {
        basis: DistributionBasis::Proportional,
        pool_amount: input.pool_amount,
        retained_amount: input.retained_amount,
        distributable_amount: distributable,
        member_count: savers.len(),
        total_basis: Some(total_basis),
        amount_per_member: None,
        records,
        distributed_total,
        rounding_remainder,
        remainder_policy: policy,
        remainder_assigned_to,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Proportional distribution — distributable pool split by savings balance",
        &serde_json::json!({
            "pool_amount": input.pool_amount.to_string(),
            "retained_amount": input.retained_amount.to_string(),
            "total_basis": total_basis.to_string(),
            "members_with_savings": output.member_count,
        }),
        warnings,
        elapsed,
        output,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn member(id: &str, balance: Money) -> MemberBalance {
        MemberBalance {
            member_id: id.into(),
            balance,
            eligible: false,
        }
    }

    fn input(pool: Money, members: Vec<MemberBalance>) -> DistributionInput {
        DistributionInput {
            pool_amount: pool,
            retained_amount: Decimal::ZERO,
            members,
        }
    }

    #[test]
    fn test_quarter_and_three_quarters() {
        let out = distribute_proportional(
            &input(dec!(1000), vec![member("a", dec!(100)), member("b", dec!(300))]),
            RemainderPolicy::RetainInPool,
        )
        .unwrap();
        let r = &out.result;
        assert_eq!(r.total_basis, Some(dec!(400)));
        assert_eq!(r.records[0].amount, dec!(250.00));
        assert_eq!(r.records[1].amount, dec!(750.00));
        assert_eq!(r.distributed_total, dec!(1000));
    }

    #[test]
    fn test_eligibility_flag_is_ignored() {
        // Proportional payouts follow savings, not subscription status
        let out = distribute_proportional(
            &input(dec!(10), vec![member("a", dec!(1))]),
            RemainderPolicy::RetainInPool,
        )
        .unwrap();
        assert_eq!(out.result.records.len(), 1);
    }

    #[test]
    fn test_zero_and_negative_balances_excluded() {
        let out = distribute_proportional(
            &input(
                dec!(600),
                vec![
                    member("a", dec!(200)),
                    member("b", Decimal::ZERO),
                    member("c", dec!(-50)),
                    member("d", dec!(400)),
                ],
            ),
            RemainderPolicy::RetainInPool,
        )
        .unwrap();
        let r = &out.result;
        let ids: Vec<&str> = r.records.iter().map(|rec| rec.member_id.as_str()).collect();
        assert_eq!(ids, vec!["a", "d"]);
        assert_eq!(r.total_basis, Some(dec!(600)));
        assert_eq!(r.records[0].amount, dec!(200));
        assert!(out.warnings.iter().any(|w| w.contains("2 member(s)")));
    }

    #[test]
    fn test_rounding_remainder_reported() {
        let out = distribute_proportional(
            &input(
                dec!(1000),
                vec![member("a", dec!(1)), member("b", dec!(1)), member("c", dec!(1))],
            ),
            RemainderPolicy::RetainInPool,
        )
        .unwrap();
        assert_eq!(out.result.records[0].amount, dec!(333.33));
        assert_eq!(out.result.rounding_remainder, dec!(0.01));
    }

    #[test]
    fn test_sevenths_sum_exactly() {
        let out = distribute_proportional(
            &input(
                dec!(100),
                vec![member("a", dec!(1)), member("b", dec!(2)), member("c", dec!(4))],
            ),
            RemainderPolicy::LargestBalance,
        )
        .unwrap();
        let r = &out.result;
        // 14.29 + 28.57 + 57.14 = 100.00
        assert_eq!(r.distributed_total, dec!(100));
        assert_eq!(r.rounding_remainder, Decimal::ZERO);
        assert!(r.remainder_assigned_to.is_none());
    }

    #[test]
    fn test_remainder_to_largest_saver() {
        let out = distribute_proportional(
            &input(
                dec!(1000),
                vec![member("a", dec!(1)), member("b", dec!(1.5)), member("c", dec!(1))],
            ),
            RemainderPolicy::LargestBalance,
        )
        .unwrap();
        let r = &out.result;
        // 285.71 + 428.57 + 285.71 = 999.99
        assert_eq!(r.remainder_assigned_to.as_deref(), Some("b"));
        assert_eq!(r.records[1].amount, dec!(428.58));
        assert_eq!(r.distributed_total, dec!(1000));
    }

    #[test]
    fn test_over_rounding_is_taken_back_from_largest() {
        // 0.01 / 2 = 0.005 each, both round up to 0.01
        let out = distribute_proportional(
            &input(dec!(0.01), vec![member("a", dec!(5)), member("b", dec!(5))]),
            RemainderPolicy::LargestBalance,
        )
        .unwrap();
        let r = &out.result;
        assert_eq!(r.distributed_total, dec!(0.01));
        assert_eq!(r.remainder_assigned_to.as_deref(), Some("a"));
        assert_eq!(r.records[0].amount, Decimal::ZERO);
    }

    #[test]
    fn test_no_positive_basis() {
        assert!(matches!(
            distribute_proportional(
                &input(dec!(100), vec![member("a", Decimal::ZERO)]),
                RemainderPolicy::RetainInPool
            ),
            Err(ClubFinanceError::NoPositiveBasis { .. })
        ));
    }

    #[test]
    fn test_very_large_pool_does_not_overflow() {
        let out = distribute_proportional(
            &input(
                dec!(100000000000000000000),
                vec![member("a", dec!(10000000000000)), member("b", dec!(1))],
            ),
            RemainderPolicy::RetainInPool,
        )
        .unwrap();
        let r = &out.result;
        // 1e20 / (1e13 + 1) = 9999999.999999...
        assert_eq!(r.records[1].amount, dec!(10000000.00));
        assert_eq!(r.distributed_total + r.rounding_remainder, r.distributable_amount);
        assert!(r.rounding_remainder.abs() <= dec!(0.02));
    }

    #[test]
    fn test_unrepresentable_total_basis_is_rejected() {
        let out = distribute_proportional(
            &input(dec!(100), vec![member("a", Decimal::MAX), member("b", Decimal::MAX)]),
            RemainderPolicy::RetainInPool,
        );
        assert!(matches!(out, Err(ClubFinanceError::InvalidInput { .. })));
    }
}
