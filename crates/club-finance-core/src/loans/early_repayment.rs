//! Payoff quotes for settling a loan before its final installment.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::config::ClubConfig;
use crate::error::ClubFinanceError;
use crate::loans::lifecycle::Loan;
use crate::types::{with_metadata, ComputationOutput, Money, Rate};
use crate::ClubFinanceResult;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EarlyRepaymentInput {
    pub remaining_balance: Money,
    pub early_rate: Rate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EarlyRepaymentQuote {
    pub remaining_balance: Money,
    pub early_rate: Rate,
    /// remaining_balance × early_rate
    pub early_interest: Money,
    /// remaining_balance + early_interest
    pub total_payment: Money,
}

/// Quote the amount needed to settle a balance early. Informational only.
pub fn quote_early_repayment(remaining_balance: Money, early_rate: Rate) -> EarlyRepaymentQuote {
    let early_interest = remaining_balance * early_rate;
    EarlyRepaymentQuote {
        remaining_balance,
        early_rate,
        early_interest,
        total_payment: remaining_balance + early_interest,
    }
}

/// Quote for a live loan at the club's early repayment rate.
pub fn quote_for_loan(loan: &Loan, config: &ClubConfig) -> ClubFinanceResult<EarlyRepaymentQuote> {
    if !loan.status.accepts_payments() {
        return Err(ClubFinanceError::InvalidLoanState {
            loan_id: loan.id.clone(),
            status: loan.status.to_string(),
            action: "quote early repayment".into(),
        });
    }
    Ok(quote_early_repayment(
        loan.remaining_balance,
        config.early_repayment_rate,
    ))
}

/// Validated quote wrapped in the standard output envelope.
pub fn calculate_early_repayment(
    input: &EarlyRepaymentInput,
) -> ClubFinanceResult<ComputationOutput<EarlyRepaymentQuote>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    if input.remaining_balance < Decimal::ZERO {
        return Err(ClubFinanceError::InvalidInput {
            field: "remaining_balance".into(),
            reason: "Remaining balance cannot be negative".into(),
        });
    }
    if input.early_rate < Decimal::ZERO {
        return Err(ClubFinanceError::InvalidInput {
            field: "early_rate".into(),
            reason: "Early repayment rate cannot be negative".into(),
        });
    }
    if input.remaining_balance.is_zero() {
        warnings.push("Loan has no remaining balance; nothing to settle".into());
    }

    let quote = quote_early_repayment(input.remaining_balance, input.early_rate);

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Early repayment quote — remaining balance plus early repayment interest",
        &serde_json::json!({
            "remaining_balance": input.remaining_balance.to_string(),
            "early_rate": input.early_rate.to_string(),
        }),
        warnings,
        elapsed,
        quote,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loans::lifecycle::{apply_for_loan, approve_loan, reject_loan, LoanApplication};
    use crate::loans::schedule::CustomAmounts;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    #[test]
    fn test_quote_reference_values() {
        let q = quote_early_repayment(dec!(10000), dec!(0.03));
        assert_eq!(q.early_interest, dec!(300));
        assert_eq!(q.total_payment, dec!(10300));
    }

    #[test]
    fn test_zero_rate_quote_is_balance() {
        let q = quote_early_repayment(dec!(4200), Decimal::ZERO);
        assert_eq!(q.total_payment, dec!(4200));
    }

    #[test]
    fn test_envelope_warns_on_settled_loan() {
        let out = calculate_early_repayment(&EarlyRepaymentInput {
            remaining_balance: Decimal::ZERO,
            early_rate: dec!(0.03),
        })
        .unwrap();
        assert_eq!(out.result.total_payment, Decimal::ZERO);
        assert_eq!(out.warnings.len(), 1);
    }

    #[test]
    fn test_negative_inputs_rejected() {
        assert!(calculate_early_repayment(&EarlyRepaymentInput {
            remaining_balance: dec!(-1),
            early_rate: dec!(0.03),
        })
        .is_err());
        assert!(calculate_early_repayment(&EarlyRepaymentInput {
            remaining_balance: dec!(1),
            early_rate: dec!(-0.03),
        })
        .is_err());
    }

    fn application() -> LoanApplication {
        LoanApplication {
            loan_id: "L-7".into(),
            member_id: "m-1".into(),
            principal: dec!(10000),
            repayment_period: 3,
            custom_amounts: CustomAmounts::new(),
            application_date: NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
            subscription_year: Some(2024),
        }
    }

    #[test]
    fn test_quote_for_approved_loan_uses_club_rate() {
        let config = ClubConfig::default();
        let pending = apply_for_loan(&application(), &config).unwrap();
        let approved = approve_loan(
            &pending,
            NaiveDate::from_ymd_opt(2024, 1, 5).unwrap(),
            &CustomAmounts::new(),
        )
        .unwrap();
        let q = quote_for_loan(&approved.loan, &config).unwrap();
        // 10000 + 200 + 5000 = 15200; 3% of that
        assert_eq!(q.early_interest, dec!(456));
        assert_eq!(q.total_payment, dec!(15656));
    }

    #[test]
    fn test_quote_for_pending_or_rejected_loan_fails() {
        let config = ClubConfig::default();
        let pending = apply_for_loan(&application(), &config).unwrap();
        assert!(matches!(
            quote_for_loan(&pending, &config),
            Err(ClubFinanceError::InvalidLoanState { .. })
        ));
        let rejected = reject_loan(&pending).unwrap();
        assert!(quote_for_loan(&rejected, &config).is_err());
    }
}
