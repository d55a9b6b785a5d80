//! Equal split: every eligible member receives the same amount.

use rust_decimal::Decimal;
use std::time::Instant;
use tracing::debug;

use super::{
    distributable_amount, remainder_warning, settle_remainder, DistributionBasis,
    DistributionInput, DistributionOutput, DistributionRecord, MemberBalance,
};
use crate::config::RemainderPolicy;
use crate::error::ClubFinanceError;
use crate::rounding::floor_cents;
use crate::types::{with_metadata, ComputationOutput, Money};
use crate::ClubFinanceResult;

/// Split the distributable pool equally across eligible members.
pub fn distribute_equal(
    input: &DistributionInput,
    policy: RemainderPolicy,
) -> ClubFinanceResult<ComputationOutput<DistributionOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let distributable = distributable_amount(input)?;

    let eligible: Vec<&MemberBalance> = input.members.iter().filter(|m| m.eligible).collect();
    if eligible.is_empty() {
        return Err(ClubFinanceError::NoEligibleMembers);
    }

    let member_count = eligible.len();
    // Truncated so the records never add up to more than the pool
    let per_member = floor_cents(distributable / Decimal::from(member_count));

    let mut records: Vec<DistributionRecord> = eligible
        .iter()
        .map(|m| DistributionRecord {
            member_id: m.member_id.clone(),
            amount: per_member,
            basis: DistributionBasis::Equal,
        })
        .collect();

    let (rounding_remainder, remainder_assigned_to) =
        settle_remainder(distributable, &mut records, &eligible, policy);
    let distributed_total: Money = records.iter().map(|r| r.amount).sum();

    let skipped = input.members.len() - member_count;
    if skipped > 0 {
        warnings.push(format!("{skipped} ineligible member(s) excluded"));
    }
    if let Some(warning) = remainder_warning(rounding_remainder) {
        warnings.push(warning);
    }

    debug!(
        members = member_count,
        %distributable,
        %per_member,
        remainder = %rounding_remainder,
        "equal distribution computed"
    );

    let output = DistributionOutput {
        basis: DistributionBasis::Equal,
        pool_amount: input.pool_amount,
        retained_amount: input.retained_amount,
        distributable_amount: distributable,
        member_count,
        total_basis: None,
        amount_per_member: Some(per_member),
        records,
        distributed_total,
        rounding_remainder,
        remainder_policy: policy,
        remainder_assigned_to,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Equal distribution — distributable pool divided evenly across eligible members",
        &serde_json::json!({
            "pool_amount": input.pool_amount.to_string(),
            "retained_amount": input.retained_amount.to_string(),
            "eligible_members": member_count,
        }),
        warnings,
        elapsed,
        output,
    ))
}
