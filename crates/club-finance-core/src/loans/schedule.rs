//! Monthly repayment schedules with optional per-month overrides.
//!
//! Months without an override share the amount left after overrides equally,
//! rounded to whole currency units. The last month without an override takes
//! whatever is left so the schedule always adds back up to the loan total.

use chrono::{Months, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Instant;
use tracing::{debug, error};

use crate::error::ClubFinanceError;
use crate::rounding::{reconciles, round_currency_unit};
use crate::types::{with_metadata, ComputationOutput, InstallmentId, Money};
use crate::ClubFinanceResult;

/// Caller-chosen amounts keyed by month number (1-based).
pub type CustomAmounts = BTreeMap<u32, Money>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InstallmentStatus {
    Pending,
    Paid,
    /// Past due and unpaid. Assigned by the store from due dates, never here.
    Overdue,
}

/// One month of a loan's repayment schedule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Installment {
    pub id: InstallmentId,
    pub month_number: u32,
    pub due_date: NaiveDate,
    pub scheduled_amount: Money,
    #[serde(default)]
    pub actual_amount: Money,
    pub status: InstallmentStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_date: Option<NaiveDate>,
}

impl Installment {
    pub fn is_pending(&self) -> bool {
        self.status == InstallmentStatus::Pending
    }

    pub fn is_paid(&self) -> bool {
        self.status == InstallmentStatus::Paid
    }
}

/// Input for building a repayment schedule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleInput {
    pub total_payable: Money,
    /// Number of monthly installments.
    pub repayment_period: u32,
    #[serde(default)]
    pub custom_amounts: CustomAmounts,
    /// Disbursement date; month 1 falls due one month later.
    pub start_date: NaiveDate,
}

/// Generated schedule with reconciliation figures.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleOutput {
    pub installments: Vec<Installment>,
    pub total_payable: Money,
    pub total_scheduled: Money,
    pub custom_total: Money,
    /// Months filled by equal distribution (including the absorbing month).
    pub auto_periods: u32,
    /// Rounded per-month amount for non-absorbing auto months.
    pub auto_amount: Money,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Check that overrides can be honoured for a loan total and period count.
///
/// Checks run in a fixed order: combined total, individual amounts, then
/// month range.
pub fn validate_schedule(
    total_payable: Money,
    repayment_period: u32,
    custom_amounts: &CustomAmounts,
) -> ClubFinanceResult<()> {
    if repayment_period == 0 {
        return Err(ClubFinanceError::InvalidInput {
            field: "repayment_period".into(),
            reason: "Repayment period must be at least one month".into(),
        });
    }
    if total_payable < Decimal::ZERO {
        return Err(ClubFinanceError::InvalidInput {
            field: "total_payable".into(),
            reason: "Total payable cannot be negative".into(),
        });
    }
    if let Some((month, amount)) = custom_amounts.iter().find(|(_, a)| **a < Decimal::ZERO) {
        return Err(ClubFinanceError::InvalidInput {
            field: format!("custom_amounts[{month}]"),
            reason: format!("Custom amount {amount} cannot be negative"),
        });
    }

    let custom_total: Money = custom_amounts.values().sum();
    if custom_total > total_payable {
        return Err(ClubFinanceError::OverrideExceedsTotal {
            custom_total,
            total_payable,
        });
    }

    for (&month, &amount) in custom_amounts {
        if amount > total_payable {
            return Err(ClubFinanceError::SingleOverrideExceedsTotal {
                month,
                amount,
                total_payable,
            });
        }
    }

    for &month in custom_amounts.keys() {
        if month < 1 || month > repayment_period {
            return Err(ClubFinanceError::OverridePeriodOutOfRange {
                month,
                repayment_period,
            });
        }
    }

    Ok(())
}

/// Build the ordered list of installments for a loan.
///
/// Validation runs first, so invalid overrides never produce a schedule.
pub fn generate_schedule(
    total_payable: Money,
    repayment_period: u32,
    custom_amounts: &CustomAmounts,
    start_date: NaiveDate,
) -> ClubFinanceResult<Vec<Installment>> {
    validate_schedule(total_payable, repayment_period, custom_amounts)?;
    let plan = plan_amounts(total_payable, repayment_period, custom_amounts);

    let mut installments = Vec::with_capacity(repayment_period as usize);
    for (month, amount) in (1..=repayment_period).zip(plan.amounts) {
        installments.push(Installment {
            id: InstallmentId::from(month),
            month_number: month,
            due_date: due_date(start_date, month)?,
            scheduled_amount: amount,
            actual_amount: Decimal::ZERO,
            status: InstallmentStatus::Pending,
            payment_date: None,
        });
    }

    let total_scheduled: Money = installments.iter().map(|i| i.scheduled_amount).sum();
    if !reconciles(total_scheduled, total_payable) {
        error!(
            %total_scheduled,
            %total_payable,
            repayment_period,
            "repayment schedule does not reconcile with loan total"
        );
        return Err(ClubFinanceError::ScheduleReconciliationError {
            scheduled: total_scheduled,
            total_payable,
        });
    }

    debug!(
        repayment_period,
        overrides = custom_amounts.len(),
        %total_payable,
        auto_amount = %plan.auto_amount,
        "generated repayment schedule"
    );

    Ok(installments)
}

/// Generate a schedule and wrap it with reconciliation figures.
pub fn build_schedule(input: &ScheduleInput) -> ClubFinanceResult<ComputationOutput<ScheduleOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let installments = generate_schedule(
        input.total_payable,
        input.repayment_period,
        &input.custom_amounts,
        input.start_date,
    )?;

    let plan = plan_amounts(input.total_payable, input.repayment_period, &input.custom_amounts);
    let custom_total: Money = input.custom_amounts.values().sum();
    let total_scheduled: Money = installments.iter().map(|i| i.scheduled_amount).sum();

    if plan.auto_periods == 0 && total_scheduled != input.total_payable {
        warnings.push(format!(
            "Every month is overridden; schedule totals {} against loan total {}",
            total_scheduled, input.total_payable
        ));
    }
    if installments.iter().any(|i| i.scheduled_amount.is_zero()) {
        warnings.push("Schedule contains months with nothing due".into());
    }

    let output = ScheduleOutput {
        installments,
        total_payable: input.total_payable,
        total_scheduled,
        custom_total,
        auto_periods: plan.auto_periods,
        auto_amount: plan.auto_amount,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Monthly repayment schedule — overrides verbatim, equal rounded split, last auto month absorbs remainder",
        &serde_json::json!({
            "total_payable": input.total_payable.to_string(),
            "repayment_period": input.repayment_period,
            "overrides": input.custom_amounts.len(),
            "start_date": input.start_date.to_string(),
        }),
        warnings,
        elapsed,
        output,
    ))
}

/// Due date of a month: the start date moved forward that many calendar
/// months, clamped to the end of shorter months.
pub fn due_date(start_date: NaiveDate, month: u32) -> ClubFinanceResult<NaiveDate> {
    start_date
        .checked_add_months(Months::new(month))
        .ok_or_else(|| {
            ClubFinanceError::DateError(format!(
                "Cannot add {month} months to {start_date}"
            ))
        })
}

// ---------------------------------------------------------------------------
// Amount planning
// ---------------------------------------------------------------------------

struct AmountPlan {
    amounts: Vec<Money>,
    auto_periods: u32,
    auto_amount: Money,
}

/// Assign an amount to every month. Assumes validated input.
fn plan_amounts(
    total_payable: Money,
    repayment_period: u32,
    custom_amounts: &CustomAmounts,
) -> AmountPlan {
    let custom_total: Money = custom_amounts.values().sum();
    let auto_periods = repayment_period.saturating_sub(custom_amounts.len() as u32);
    let absorbing_month = (1..=repayment_period)
        .rev()
        .find(|m| !custom_amounts.contains_key(m));

    let auto_budget = total_payable - custom_total;
    let auto_amount = if auto_periods == 0 {
        Decimal::ZERO
    } else {
        round_currency_unit(auto_budget / Decimal::from(auto_periods))
    };

    // Rounding up can overspend the auto budget on small loans; cap each
    // share at what is left so the absorbing month never goes negative.
    let mut auto_remaining = auto_budget;
    let mut amounts = Vec::with_capacity(repayment_period as usize);
    let mut absorbing_index = None;

    for month in 1..=repayment_period {
        if let Some(&amount) = custom_amounts.get(&month) {
            amounts.push(amount);
        } else if Some(month) == absorbing_month {
            absorbing_index = Some(amounts.len());
            amounts.push(Decimal::ZERO);
        } else {
            let share = auto_amount.min(auto_remaining);
            auto_remaining -= share;
            amounts.push(share);
        }
    }

    if let Some(idx) = absorbing_index {
        amounts[idx] = auto_remaining;
    }

    AmountPlan {
        amounts,
        auto_periods,
        auto_amount,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
