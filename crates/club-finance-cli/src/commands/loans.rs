use chrono::{Local, NaiveDate};
use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use club_finance_core::loans::early_repayment::{self, EarlyRepaymentInput};
use club_finance_core::loans::lifecycle::{self, RepaymentInput};
use club_finance_core::loans::repayment::{self, PaymentInput};
use club_finance_core::loans::schedule::{self, CustomAmounts, ScheduleInput};
use club_finance_core::loans::terms::{self, LoanTermsInput};
use club_finance_core::ClubConfig;

use crate::input;

/// Arguments for loan terms
#[derive(Args)]
pub struct LoanTermsArgs {
    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Loan principal
    #[arg(long)]
    pub principal: Option<Decimal>,

    /// Flat interest rate on principal (defaults to the club rate)
    #[arg(long)]
    pub interest_rate: Option<Decimal>,

    /// Processing fee (defaults to the club fee)
    #[arg(long)]
    pub processing_fee: Option<Decimal>,
}

/// Arguments for schedule generation
#[derive(Args)]
pub struct ScheduleArgs {
    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Loan total to be repaid
    #[arg(long)]
    pub total_payable: Option<Decimal>,

    /// Number of monthly installments
    #[arg(long, alias = "months")]
    pub repayment_period: Option<u32>,

    /// Custom amount for a month, as MONTH=AMOUNT (repeatable)
    #[arg(long = "custom", value_parser = parse_override)]
    pub custom: Vec<(u32, Decimal)>,

    /// Disbursement date (YYYY-MM-DD); defaults to today
    #[arg(long)]
    pub start_date: Option<NaiveDate>,
}

/// Arguments for applying a payment to a schedule
#[derive(Args)]
pub struct ApplyPaymentArgs {
    /// Path to JSON input file with the schedule and payment
    #[arg(long)]
    pub input: Option<String>,
}

/// Arguments for posting a repayment against a loan
#[derive(Args)]
pub struct RepayArgs {
    /// Path to JSON input file with the loan, schedule and payment
    #[arg(long)]
    pub input: Option<String>,
}

/// Arguments for an early repayment quote
#[derive(Args)]
pub struct EarlyRepaymentArgs {
    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Outstanding loan balance
    #[arg(long)]
    pub remaining_balance: Option<Decimal>,

    /// Early repayment rate (defaults to the club rate)
    #[arg(long)]
    pub early_rate: Option<Decimal>,
}

pub fn run_loan_terms(
    args: LoanTermsArgs,
    config: &ClubConfig,
) -> Result<Value, Box<dyn std::error::Error>> {
    let terms_input: LoanTermsInput = if let Some(ref path) = args.input {
        input::file::read_json(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        data
    } else {
        let principal = args
            .principal
            .ok_or("--principal is required (or provide --input)")?;
        let mut terms_input = LoanTermsInput::from_config(principal, config);
        if let Some(rate) = args.interest_rate {
            terms_input.interest_rate = rate;
        }
        if let Some(fee) = args.processing_fee {
            terms_input.processing_fee = fee;
        }
        terms_input
    };

    let result = terms::calculate_loan_terms(&terms_input)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_schedule(args: ScheduleArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let schedule_input: ScheduleInput = if let Some(ref path) = args.input {
        input::file::read_json(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        data
    } else {
        ScheduleInput {
            total_payable: args
                .total_payable
                .ok_or("--total-payable is required (or provide --input)")?,
            repayment_period: args
                .repayment_period
                .ok_or("--repayment-period is required (or provide --input)")?,
            custom_amounts: args.custom.into_iter().collect::<CustomAmounts>(),
            start_date: args
                .start_date
                .unwrap_or_else(|| Local::now().date_naive()),
        }
    };

    let result = schedule::build_schedule(&schedule_input)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_apply_payment(args: ApplyPaymentArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let payment_input: PaymentInput = if let Some(ref path) = args.input {
        input::file::read_json(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        data
    } else {
        return Err("--input <file.json> or stdin required for payment data".into());
    };

    let result = repayment::analyze_payment(&payment_input)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_repay(args: RepayArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let repayment_input: RepaymentInput = if let Some(ref path) = args.input {
        input::file::read_json(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        data
    } else {
        return Err("--input <file.json> or stdin required for repayment data".into());
    };

    let result = lifecycle::post_repayment(&repayment_input)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_early_repayment(
    args: EarlyRepaymentArgs,
    config: &ClubConfig,
) -> Result<Value, Box<dyn std::error::Error>> {
    let quote_input: EarlyRepaymentInput = if let Some(ref path) = args.input {
        input::file::read_json(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        data
    } else {
        EarlyRepaymentInput {
            remaining_balance: args
                .remaining_balance
                .ok_or("--remaining-balance is required (or provide --input)")?,
            early_rate: args.early_rate.unwrap_or(config.early_repayment_rate),
        }
    };

    let result = early_repayment::calculate_early_repayment(&quote_input)?;
    Ok(serde_json::to_value(result)?)
}

/// Parse `MONTH=AMOUNT` into an override pair.
fn parse_override(s: &str) -> Result<(u32, Decimal), String> {
    let (month, amount) = s
        .split_once('=')
        .ok_or_else(|| format!("expected MONTH=AMOUNT, got '{s}'"))?;
    let month: u32 = month
        .trim()
        .parse()
        .map_err(|e| format!("invalid month '{month}': {e}"))?;
    let amount: Decimal = amount
        .trim()
        .parse()
        .map_err(|e| format!("invalid amount '{amount}': {e}"))?;
    Ok((month, amount))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_parse_override() {
        assert_eq!(parse_override("1=5000").unwrap(), (1, dec!(5000)));
        assert_eq!(parse_override(" 3 = 2615.50 ").unwrap(), (3, dec!(2615.50)));
    }

    #[test]
    fn test_parse_override_rejects_malformed() {
        assert!(parse_override("5000").is_err());
        assert!(parse_override("x=5000").is_err());
        assert!(parse_override("1=lots").is_err());
    }
}
