use rust_decimal::Decimal;
use thiserror::Error;

use crate::types::InstallmentId;

#[derive(Debug, Error)]
pub enum ClubFinanceError {
    #[error("Invalid input: {field} — {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("Custom repayment amounts ({custom_total}) exceed total loan amount ({total_payable})")]
    OverrideExceedsTotal {
        custom_total: Decimal,
        total_payable: Decimal,
    },

    #[error("Custom repayment for month {month} ({amount}) exceeds total loan amount ({total_payable})")]
    SingleOverrideExceedsTotal {
        month: u32,
        amount: Decimal,
        total_payable: Decimal,
    },

    #[error("Custom repayment month {month} is outside repayment period 1..={repayment_period}")]
    OverridePeriodOutOfRange { month: u32, repayment_period: u32 },

    #[error("Repayment schedule totals {scheduled} but loan total is {total_payable}")]
    ScheduleReconciliationError {
        scheduled: Decimal,
        total_payable: Decimal,
    },

    #[error("Installment {0} not found in schedule")]
    InstallmentNotFound(InstallmentId),

    #[error("Installment {0} has already been paid")]
    InstallmentAlreadyPaid(InstallmentId),

    #[error("No amount available for distribution (pool {pool_amount}, retained {retained_amount})")]
    NoDistributableAmount {
        pool_amount: Decimal,
        retained_amount: Decimal,
    },

    #[error("No eligible members for equal distribution")]
    NoEligibleMembers,

    #[error("No positive savings balance for proportional distribution (total basis {total_basis})")]
    NoPositiveBasis { total_basis: Decimal },

    #[error("Loan {loan_id} is {status}; cannot {action}")]
    InvalidLoanState {
        loan_id: String,
        status: String,
        action: String,
    },

    #[error("Member {member_id} has no paid subscription for {year}")]
    SubscriptionRequired { member_id: String, year: i32 },

    #[error("Insufficient savings balance for {member_id}: requested {requested}, available {available}")]
    InsufficientBalance {
        member_id: String,
        requested: Decimal,
        available: Decimal,
    },

    #[error("Invalid configuration: {key} — {reason}")]
    InvalidConfig { key: String, reason: String },

    #[error("Date error: {0}")]
    DateError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<serde_json::Error> for ClubFinanceError {
    fn from(e: serde_json::Error) -> Self {
        ClubFinanceError::SerializationError(e.to_string())
    }
}
