//! Splitting pooled interest or trust earnings across club members.
//!
//! Two strategies share one input shape: [`equal`] pays every eligible member
//! the same amount, [`proportional`] pays by savings balance. Amounts are
//! rounded to cents; what rounding leaves over is handled by the configured
//! [`RemainderPolicy`] and always reported.

pub mod equal;
pub mod proportional;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::config::RemainderPolicy;
use crate::error::ClubFinanceError;
use crate::types::{ComputationOutput, MemberId, Money};
use crate::ClubFinanceResult;

pub use equal::distribute_equal;
pub use proportional::distribute_proportional;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DistributionBasis {
    Equal,
    Proportional,
}

impl fmt::Display for DistributionBasis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DistributionBasis::Equal => f.write_str("equal"),
            DistributionBasis::Proportional => f.write_str("proportional"),
        }
    }
}

/// One member in the roster snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemberBalance {
    pub member_id: MemberId,
    pub balance: Money,
    /// Whether the member qualifies for equal distributions (e.g. subscription
    /// paid for the year). Decided by the caller.
    #[serde(default = "eligible_by_default")]
    pub eligible: bool,
}

fn eligible_by_default() -> bool {
    true
}

/// Input shared by both strategies.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DistributionInput {
    /// Total interest or earnings collected.
    pub pool_amount: Money,
    /// Portion withheld from distribution.
    #[serde(default)]
    pub retained_amount: Money,
    pub members: Vec<MemberBalance>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistributionRecord {
    pub member_id: MemberId,
    pub amount: Money,
    pub basis: DistributionBasis,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DistributionOutput {
    pub basis: DistributionBasis,
    pub pool_amount: Money,
    pub retained_amount: Money,
    /// pool_amount − retained_amount
    pub distributable_amount: Money,
    pub member_count: usize,
    /// Sum of positive balances (proportional only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_basis: Option<Money>,
    /// Rounded share before any remainder adjustment (equal only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount_per_member: Option<Money>,
    pub records: Vec<DistributionRecord>,
    pub distributed_total: Money,
    /// distributable_amount − distributed_total after the remainder policy.
    pub rounding_remainder: Money,
    pub remainder_policy: RemainderPolicy,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remainder_assigned_to: Option<MemberId>,
}

/// Run the strategy for `basis`.
pub fn distribute(
    input: &DistributionInput,
    basis: DistributionBasis,
    policy: RemainderPolicy,
) -> ClubFinanceResult<ComputationOutput<DistributionOutput>> {
    match basis {
        DistributionBasis::Equal => distribute_equal(input, policy),
        DistributionBasis::Proportional => distribute_proportional(input, policy),
    }
}

// ---------------------------------------------------------------------------
// Shared helpers
// ---------------------------------------------------------------------------

/// pool − retained, rejecting negative retention and empty pools.
pub(crate) fn distributable_amount(input: &DistributionInput) -> ClubFinanceResult<Money> {
    if input.retained_amount < Decimal::ZERO {
        return Err(ClubFinanceError::InvalidInput {
            field: "retained_amount".into(),
            reason: "Retained amount cannot be negative".into(),
        });
    }
    let distributable = input.pool_amount - input.retained_amount;
    if distributable <= Decimal::ZERO {
        return Err(ClubFinanceError::NoDistributableAmount {
            pool_amount: input.pool_amount,
            retained_amount: input.retained_amount,
        });
    }
    Ok(distributable)
}

/// Remainder left after `records`, and who absorbed it if anyone.
///
/// Under [`RemainderPolicy::LargestBalance`] the remainder goes to the record
/// of the member with the largest balance, first in roster order on ties,
/// unless taking back an over-rounding would leave that record negative.
pub(crate) fn settle_remainder(
    distributable: Money,
    records: &mut [DistributionRecord],
    roster: &[&MemberBalance],
    policy: RemainderPolicy,
) -> (Money, Option<MemberId>) {
    let distributed: Money = records.iter().map(|r| r.amount).sum();
    let remainder = distributable - distributed;
    if remainder.is_zero() || policy == RemainderPolicy::RetainInPool {
        return (remainder, None);
    }

    let mut largest: Option<&MemberBalance> = None;
    for member in roster {
        if largest.map_or(true, |l| member.balance > l.balance) {
            largest = Some(member);
        }
    }

    let Some(largest) = largest else {
        return (remainder, None);
    };
    match records.iter_mut().find(|r| r.member_id == largest.member_id) {
        Some(record) if record.amount + remainder >= Decimal::ZERO => {
            record.amount += remainder;
            (Decimal::ZERO, Some(largest.member_id.clone()))
        }
        _ => (remainder, None),
    }
}

/// Warning text for a non-zero remainder left on the output.
pub(crate) fn remainder_warning(remainder: Money) -> Option<String> {
    if remainder > Decimal::ZERO {
        Some(format!("Rounding remainder of {remainder} retained in pool"))
    } else if remainder < Decimal::ZERO {
        Some(format!(
            "Rounded records exceed the distributable amount by {}",
            remainder.abs()
        ))
    } else {
        None
    }
}
