//! Flat-rate loan terms: interest is charged once on principal and the
//! processing fee is added on top.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::config::ClubConfig;
use crate::error::ClubFinanceError;
use crate::types::{with_metadata, ComputationOutput, Money, Rate};
use crate::ClubFinanceResult;

/// Input for computing loan terms.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoanTermsInput {
    pub principal: Money,
    /// Flat interest rate on principal (0.02 = 2%).
    pub interest_rate: Rate,
    pub processing_fee: Money,
}

impl LoanTermsInput {
    /// Terms for a principal at the club's current rate and fee.
    pub fn from_config(principal: Money, config: &ClubConfig) -> Self {
        Self {
            principal,
            interest_rate: config.loan_interest_rate,
            processing_fee: config.loan_processing_fee,
        }
    }
}

/// Derived loan terms.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanTerms {
    pub principal: Money,
    pub interest_rate: Rate,
    pub processing_fee: Money,
    pub interest: Money,
    /// principal + interest + processing_fee
    pub total_payable: Money,
}

pub fn compute_interest(principal: Money, rate: Rate) -> Money {
    principal * rate
}

pub fn compute_total_payable(principal: Money, rate: Rate, fee: Money) -> Money {
    principal + compute_interest(principal, rate) + fee
}

/// Compute interest and total payable, rejecting negative inputs.
pub fn calculate_loan_terms(
    input: &LoanTermsInput,
) -> ClubFinanceResult<ComputationOutput<LoanTerms>> {
    let start = Instant::now();

    validate_terms_input(input)?;

    let terms = derive_terms(input);

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Flat-rate loan terms — principal + principal × rate + processing fee",
        &serde_json::json!({
            "principal": input.principal.to_string(),
            "interest_rate": input.interest_rate.to_string(),
            "processing_fee": input.processing_fee.to_string(),
        }),
        Vec::new(),
        elapsed,
        terms,
    ))
}

/// Terms without the output envelope, for callers composing calculations.
pub(crate) fn derive_terms(input: &LoanTermsInput) -> LoanTerms {
    let interest = compute_interest(input.principal, input.interest_rate);
    LoanTerms {
        principal: input.principal,
        interest_rate: input.interest_rate,
        processing_fee: input.processing_fee,
        interest,
        total_payable: input.principal + interest + input.processing_fee,
    }
}

pub(crate) fn validate_terms_input(input: &LoanTermsInput) -> ClubFinanceResult<()> {
    if input.principal <= Decimal::ZERO {
        return Err(ClubFinanceError::InvalidInput {
            field: "principal".into(),
            reason: "Principal must be positive".into(),
        });
    }
    if input.interest_rate < Decimal::ZERO {
        return Err(ClubFinanceError::InvalidInput {
            field: "interest_rate".into(),
            reason: "Interest rate cannot be negative".into(),
        });
    }
    if input.processing_fee < Decimal::ZERO {
        return Err(ClubFinanceError::InvalidInput {
            field: "processing_fee".into(),
            reason: "Processing fee cannot be negative".into(),
        });
    }
    Ok(())
}
