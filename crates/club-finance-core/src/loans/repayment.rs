//! Posting a payment against one installment.
//!
//! Any amount paid above the installment's scheduled amount is taken off
//! later pending installments, earliest month first. Short payments are
//! recorded as they are and nothing downstream changes.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, warn};

use crate::error::ClubFinanceError;
use crate::loans::schedule::{Installment, InstallmentStatus};
use crate::types::{with_metadata, ComputationOutput, InstallmentId, Money};
use crate::ClubFinanceResult;

/// Input for posting a payment against a schedule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentInput {
    pub schedule: Vec<Installment>,
    pub installment_id: InstallmentId,
    pub payment_amount: Money,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_date: Option<NaiveDate>,
}

/// Reduction applied to one downstream installment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleAdjustment {
    pub installment_id: InstallmentId,
    pub month_number: u32,
    pub previous_amount: Money,
    pub new_amount: Money,
}

/// Schedule after a payment, plus how any surplus was spread.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentOutcome {
    /// Updated schedule in month order.
    pub schedule: Vec<Installment>,
    pub installment_id: InstallmentId,
    pub payment_amount: Money,
    pub scheduled_amount: Money,
    /// Amount paid above the scheduled amount (zero for exact or short payments).
    pub overpayment: Money,
    /// Amount paid below the scheduled amount (zero for exact or over payments).
    pub shortfall: Money,
    /// Part of the overpayment taken off later installments.
    pub absorbed: Money,
    /// Part of the overpayment that found no pending installment to reduce.
    pub unabsorbed_surplus: Money,
    pub adjustments: Vec<ScheduleAdjustment>,
}

/// Mark an installment paid and spread any overpayment forward.
///
/// The input schedule is left untouched; a new schedule is returned. The
/// target may be pending or overdue but not already paid. Only pending
/// installments in later months are reduced.
pub fn apply_payment(
    schedule: &[Installment],
    installment_id: InstallmentId,
    payment_amount: Money,
    payment_date: Option<NaiveDate>,
) -> ClubFinanceResult<PaymentOutcome> {
    if payment_amount <= Decimal::ZERO {
        return Err(ClubFinanceError::InvalidInput {
            field: "payment_amount".into(),
            reason: "Payment amount must be positive".into(),
        });
    }

    let target = schedule
        .iter()
        .find(|i| i.id == installment_id)
        .ok_or(ClubFinanceError::InstallmentNotFound(installment_id))?;
    if target.is_paid() {
        return Err(ClubFinanceError::InstallmentAlreadyPaid(installment_id));
    }

    let target_month = target.month_number;
    let scheduled_amount = target.scheduled_amount;
    let overpayment = (payment_amount - scheduled_amount).max(Decimal::ZERO);
    let shortfall = (scheduled_amount - payment_amount).max(Decimal::ZERO);

    let mut ordered: Vec<Installment> = schedule.to_vec();
    ordered.sort_by_key(|i| i.month_number);

    let (updated, remaining, adjustments) = ordered.into_iter().fold(
        (Vec::with_capacity(schedule.len()), overpayment, Vec::new()),
        |(mut acc, remaining, mut adjustments), mut inst| {
            let mut remaining: Money = remaining;
            if inst.id == installment_id {
                inst.actual_amount = payment_amount;
                inst.status = InstallmentStatus::Paid;
                inst.payment_date = payment_date;
            } else if remaining > Decimal::ZERO
                && inst.month_number > target_month
                && inst.is_pending()
            {
                let reduction = remaining.min(inst.scheduled_amount);
                if reduction > Decimal::ZERO {
                    let previous_amount = inst.scheduled_amount;
                    inst.scheduled_amount -= reduction;
                    remaining -= reduction;
                    adjustments.push(ScheduleAdjustment {
                        installment_id: inst.id,
                        month_number: inst.month_number,
                        previous_amount,
                        new_amount: inst.scheduled_amount,
                    });
                }
            }
            acc.push(inst);
            (acc, remaining, adjustments)
        },
    );

    if remaining > Decimal::ZERO {
        warn!(
            installment_id,
            unabsorbed = %remaining,
            "overpayment exceeds pending installments"
        );
    }
    debug!(
        installment_id,
        %payment_amount,
        %overpayment,
        adjusted = adjustments.len(),
        "applied payment to schedule"
    );

    Ok(PaymentOutcome {
        schedule: updated,
        installment_id,
        payment_amount,
        scheduled_amount,
        overpayment,
        shortfall,
        absorbed: overpayment - remaining,
        unabsorbed_surplus: remaining,
        adjustments,
    })
}

/// Apply a payment and report the result with warnings.
pub fn analyze_payment(input: &PaymentInput) -> ClubFinanceResult<ComputationOutput<PaymentOutcome>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let outcome = apply_payment(
        &input.schedule,
        input.installment_id,
        input.payment_amount,
        input.payment_date,
    )?;

    if outcome.shortfall > Decimal::ZERO {
        warnings.push(format!(
            "Payment is {} short of the scheduled {}; later installments are unchanged",
            outcome.shortfall, outcome.scheduled_amount
        ));
    }
    if outcome.unabsorbed_surplus > Decimal::ZERO {
        warnings.push(format!(
            "Overpayment of {} could not be applied to any pending installment",
            outcome.unabsorbed_surplus
        ));
    }

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Payment posting — overpayment reduces later pending installments in month order",
        &serde_json::json!({
            "installment_id": input.installment_id,
            "payment_amount": input.payment_amount.to_string(),
            "installments": input.schedule.len(),
        }),
        warnings,
        elapsed,
        outcome,
    ))
}

/// Sum of scheduled amounts still pending.
pub fn outstanding_scheduled(schedule: &[Installment]) -> Money {
    schedule
        .iter()
        .filter(|i| i.is_pending())
        .map(|i| i.scheduled_amount)
        .sum()
}

/// Unpaid installments whose due date is before `as_of`, in month order.
///
/// This is a read-only view; statuses are not changed.
pub fn overdue_installments(schedule: &[Installment], as_of: NaiveDate) -> Vec<&Installment> {
    let mut overdue: Vec<&Installment> = schedule
        .iter()
        .filter(|i| !i.is_paid() && i.due_date < as_of)
        .collect();
    overdue.sort_by_key(|i| i.month_number);
    overdue
}
