//! Loan state machine: application, approval with schedule generation,
//! rejection, and repayment posting.
//!
//! Each step takes the current loan snapshot and returns a new one. Storage
//! is expected to write the result back inside one transaction per loan.

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Instant;
use tracing::{debug, info};

use crate::config::ClubConfig;
use crate::error::ClubFinanceError;
use crate::loans::repayment::{apply_payment, PaymentOutcome};
use crate::loans::schedule::{generate_schedule, validate_schedule, CustomAmounts, Installment};
use crate::loans::terms::{derive_terms, validate_terms_input, LoanTermsInput};
use crate::types::{with_metadata, ComputationOutput, InstallmentId, MemberId, Money, Rate};
use crate::ClubFinanceResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoanStatus {
    Pending,
    Approved,
    Active,
    Completed,
    Rejected,
}

impl LoanStatus {
    /// Payments and payoff quotes are only taken on disbursed, unsettled loans.
    pub fn accepts_payments(self) -> bool {
        matches!(self, LoanStatus::Approved | LoanStatus::Active)
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, LoanStatus::Completed | LoanStatus::Rejected)
    }

    /// Allowed edges; nothing moves backwards.
    pub fn can_transition_to(self, next: LoanStatus) -> bool {
        use LoanStatus::*;
        matches!(
            (self, next),
            (Pending, Approved)
                | (Pending, Rejected)
                | (Approved, Active)
                | (Approved, Completed)
                | (Active, Completed)
        )
    }
}

impl fmt::Display for LoanStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LoanStatus::Pending => "pending",
            LoanStatus::Approved => "approved",
            LoanStatus::Active => "active",
            LoanStatus::Completed => "completed",
            LoanStatus::Rejected => "rejected",
        };
        f.write_str(s)
    }
}

/// A member loan. Terms are frozen when the application is made.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Loan {
    pub id: String,
    pub member_id: MemberId,
    pub principal: Money,
    pub interest_rate: Rate,
    pub processing_fee: Money,
    pub repayment_period: u32,
    /// Total payable at application time.
    pub total_amount: Money,
    /// Never increases; floored at zero.
    pub remaining_balance: Money,
    pub status: LoanStatus,
    pub application_date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disbursement_date: Option<NaiveDate>,
}

/// A member's request for a loan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoanApplication {
    pub loan_id: String,
    pub member_id: MemberId,
    pub principal: Money,
    pub repayment_period: u32,
    #[serde(default)]
    pub custom_amounts: CustomAmounts,
    pub application_date: NaiveDate,
    /// Latest year the member paid the annual subscription for.
    #[serde(default)]
    pub subscription_year: Option<i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApprovedLoan {
    pub loan: Loan,
    pub schedule: Vec<Installment>,
}

/// Input for posting a repayment against a loan and its schedule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepaymentInput {
    pub loan: Loan,
    pub schedule: Vec<Installment>,
    pub installment_id: InstallmentId,
    pub amount: Money,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepaymentResult {
    pub loan: Loan,
    pub payment: PaymentOutcome,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Open a pending loan at the club's current rate and fee.
///
/// The member must have paid the subscription for the application year, and
/// any custom amounts must already be valid for the resulting total.
pub fn apply_for_loan(
    application: &LoanApplication,
    config: &ClubConfig,
) -> ClubFinanceResult<Loan> {
    let year = application.application_date.year();
    if application.subscription_year != Some(year) {
        return Err(ClubFinanceError::SubscriptionRequired {
            member_id: application.member_id.clone(),
            year,
        });
    }

    let terms_input = LoanTermsInput::from_config(application.principal, config);
    validate_terms_input(&terms_input)?;
    let terms = derive_terms(&terms_input);

    validate_schedule(
        terms.total_payable,
        application.repayment_period,
        &application.custom_amounts,
    )?;

    info!(
        loan_id = %application.loan_id,
        member_id = %application.member_id,
        total_amount = %terms.total_payable,
        "loan application accepted"
    );

    Ok(Loan {
        id: application.loan_id.clone(),
        member_id: application.member_id.clone(),
        principal: terms.principal,
        interest_rate: terms.interest_rate,
        processing_fee: terms.processing_fee,
        repayment_period: application.repayment_period,
        total_amount: terms.total_payable,
        remaining_balance: terms.total_payable,
        status: LoanStatus::Pending,
        application_date: application.application_date,
        disbursement_date: None,
    })
}

/// Approve a pending loan and generate its repayment schedule.
pub fn approve_loan(
    loan: &Loan,
    disbursement_date: NaiveDate,
    custom_amounts: &CustomAmounts,
) -> ClubFinanceResult<ApprovedLoan> {
    let mut approved = transition(loan, LoanStatus::Approved, "approve")?;
    let schedule = generate_schedule(
        loan.total_amount,
        loan.repayment_period,
        custom_amounts,
        disbursement_date,
    )?;
    approved.disbursement_date = Some(disbursement_date);

    info!(loan_id = %loan.id, installments = schedule.len(), "loan approved");
    Ok(ApprovedLoan {
        loan: approved,
        schedule,
    })
}

/// Reject a pending loan. Rejection is final.
pub fn reject_loan(loan: &Loan) -> ClubFinanceResult<Loan> {
    let rejected = transition(loan, LoanStatus::Rejected, "reject")?;
    info!(loan_id = %loan.id, "loan rejected");
    Ok(rejected)
}

/// Post a payment: update the schedule, reduce the balance, and move the
/// loan to active or completed.
pub fn record_repayment(
    loan: &Loan,
    schedule: &[Installment],
    installment_id: InstallmentId,
    amount: Money,
    payment_date: Option<NaiveDate>,
) -> ClubFinanceResult<RepaymentResult> {
    if !loan.status.accepts_payments() {
        return Err(invalid_state(loan, "record a repayment"));
    }

    let payment = apply_payment(schedule, installment_id, amount, payment_date)?;

    let new_balance = (loan.remaining_balance - amount).max(Decimal::ZERO);
    let next_status = if new_balance.is_zero() {
        LoanStatus::Completed
    } else {
        LoanStatus::Active
    };

    let mut updated = if next_status == loan.status {
        loan.clone()
    } else {
        transition(loan, next_status, "record a repayment")?
    };
    updated.remaining_balance = new_balance;

    debug!(
        loan_id = %loan.id,
        %amount,
        remaining_balance = %new_balance,
        status = %updated.status,
        "repayment recorded"
    );

    Ok(RepaymentResult {
        loan: updated,
        payment,
    })
}

/// Post a repayment and report it in the standard envelope.
pub fn post_repayment(
    input: &RepaymentInput,
) -> ClubFinanceResult<ComputationOutput<RepaymentResult>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let result = record_repayment(
        &input.loan,
        &input.schedule,
        input.installment_id,
        input.amount,
        input.payment_date,
    )?;

    if input.amount > input.loan.remaining_balance {
        warnings.push(format!(
            "Payment {} exceeds remaining balance {}; balance floored at zero",
            input.amount, input.loan.remaining_balance
        ));
    }
    if result.payment.unabsorbed_surplus > Decimal::ZERO {
        warnings.push(format!(
            "Overpayment of {} could not be applied to any pending installment",
            result.payment.unabsorbed_surplus
        ));
    }

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Loan repayment — schedule update, balance reduction floored at zero, status transition",
        &serde_json::json!({
            "loan_id": input.loan.id,
            "installment_id": input.installment_id,
            "amount": input.amount.to_string(),
            "status_before": input.loan.status.to_string(),
        }),
        warnings,
        elapsed,
        result,
    ))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn transition(loan: &Loan, next: LoanStatus, action: &str) -> ClubFinanceResult<Loan> {
    if !loan.status.can_transition_to(next) {
        return Err(invalid_state(loan, action));
    }
    let mut updated = loan.clone();
    updated.status = next;
    Ok(updated)
}

fn invalid_state(loan: &Loan, action: &str) -> ClubFinanceError {
    ClubFinanceError::InvalidLoanState {
        loan_id: loan.id.clone(),
        status: loan.status.to_string(),
        action: action.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
