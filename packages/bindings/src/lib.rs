use chrono::NaiveDate;
use napi::Result as NapiResult;
use napi_derive::napi;
use serde::Deserialize;

use club_finance_core::distribution::{DistributionBasis, DistributionInput};
use club_finance_core::loans::schedule::CustomAmounts;
use club_finance_core::loans::lifecycle::Loan;
use club_finance_core::{ClubConfig, Money, RemainderPolicy};

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

/// Club configuration from an optional JSON document.
fn parse_config(config_json: Option<String>) -> NapiResult<ClubConfig> {
    match config_json {
        Some(json) => ClubConfig::from_json(&json).map_err(to_napi_error),
        None => Ok(ClubConfig::default()),
    }
}

// ---------------------------------------------------------------------------
// Loans
// ---------------------------------------------------------------------------

#[napi]
pub fn calculate_loan_terms(input_json: String) -> NapiResult<String> {
    let input: club_finance_core::loans::terms::LoanTermsInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output =
        club_finance_core::loans::terms::calculate_loan_terms(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[derive(Deserialize)]
struct ValidateScheduleRequest {
    total_payable: Money,
    repayment_period: u32,
    #[serde(default)]
    custom_amounts: CustomAmounts,
}

/// Resolves to `true` when the overrides are acceptable; throws otherwise.
#[napi]
pub fn validate_schedule(input_json: String) -> NapiResult<bool> {
    let req: ValidateScheduleRequest =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    club_finance_core::loans::schedule::validate_schedule(
        req.total_payable,
        req.repayment_period,
        &req.custom_amounts,
    )
    .map_err(to_napi_error)?;
    Ok(true)
}

#[napi]
pub fn build_schedule(input_json: String) -> NapiResult<String> {
    let input: club_finance_core::loans::schedule::ScheduleInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output =
        club_finance_core::loans::schedule::build_schedule(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn apply_payment(input_json: String) -> NapiResult<String> {
    let input: club_finance_core::loans::repayment::PaymentInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output =
        club_finance_core::loans::repayment::analyze_payment(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn early_repayment_quote(input_json: String) -> NapiResult<String> {
    let input: club_finance_core::loans::early_repayment::EarlyRepaymentInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = club_finance_core::loans::early_repayment::calculate_early_repayment(&input)
        .map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Loan lifecycle
// ---------------------------------------------------------------------------

#[napi]
pub fn apply_for_loan(input_json: String, config_json: Option<String>) -> NapiResult<String> {
    let application: club_finance_core::loans::lifecycle::LoanApplication =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let config = parse_config(config_json)?;
    let loan = club_finance_core::loans::lifecycle::apply_for_loan(&application, &config)
        .map_err(to_napi_error)?;
    serde_json::to_string(&loan).map_err(to_napi_error)
}

#[derive(Deserialize)]
struct ApproveRequest {
    loan: Loan,
    disbursement_date: NaiveDate,
    #[serde(default)]
    custom_amounts: CustomAmounts,
}

#[napi]
pub fn approve_loan(input_json: String) -> NapiResult<String> {
    let req: ApproveRequest = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let approved = club_finance_core::loans::lifecycle::approve_loan(
        &req.loan,
        req.disbursement_date,
        &req.custom_amounts,
    )
    .map_err(to_napi_error)?;
    serde_json::to_string(&approved).map_err(to_napi_error)
}

#[napi]
pub fn reject_loan(loan_json: String) -> NapiResult<String> {
    let loan: Loan = serde_json::from_str(&loan_json).map_err(to_napi_error)?;
    let rejected =
        club_finance_core::loans::lifecycle::reject_loan(&loan).map_err(to_napi_error)?;
    serde_json::to_string(&rejected).map_err(to_napi_error)
}

#[napi]
pub fn post_repayment(input_json: String) -> NapiResult<String> {
    let input: club_finance_core::loans::lifecycle::RepaymentInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output =
        club_finance_core::loans::lifecycle::post_repayment(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Distribution
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct DistributeRequest {
    basis: DistributionBasis,
    #[serde(default)]
    remainder_policy: Option<RemainderPolicy>,
    #[serde(flatten)]
    input: DistributionInput,
}

/// `remainder_policy` in the request wins over the one in `config_json`.
#[napi]
pub fn distribute(input_json: String, config_json: Option<String>) -> NapiResult<String> {
    let req: DistributeRequest = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let config = parse_config(config_json)?;
    let policy = req.remainder_policy.unwrap_or(config.remainder_policy);
    let output = club_finance_core::distribution::distribute(&req.input, req.basis, policy)
        .map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Parse stored key/value rows into a validated config document.
#[napi]
pub fn config_from_entries(entries_json: String) -> NapiResult<String> {
    let entries: Vec<club_finance_core::config::ConfigEntry> =
        serde_json::from_str(&entries_json).map_err(to_napi_error)?;
    let config = ClubConfig::from_entries(&entries).map_err(to_napi_error)?;
    serde_json::to_string(&config).map_err(to_napi_error)
}
