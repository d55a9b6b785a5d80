use chrono::NaiveDate;
use club_finance_core::loans::{early_repayment, lifecycle, repayment, schedule, terms};
use club_finance_core::{ClubConfig, ClubFinanceError, Money};
use pretty_assertions::assert_eq;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn disbursement() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 31).unwrap()
}

fn amounts(installments: &[schedule::Installment]) -> Vec<Money> {
    installments.iter().map(|i| i.scheduled_amount).collect()
}

// ===========================================================================
// Loan terms
// ===========================================================================

#[test]
fn test_reference_loan_total_payable() {
    // 10000 principal, 2% flat, 30 fee
    let total = terms::compute_total_payable(dec!(10000), dec!(0.02), dec!(30));
    assert_eq!(total, dec!(10230));
    assert_eq!(terms::compute_interest(dec!(10000), dec!(0.02)), dec!(200));
}

// ===========================================================================
// Schedule generation
// ===========================================================================

#[test]
fn test_reference_schedule_without_overrides() {
    let installments =
        schedule::generate_schedule(dec!(10230), 3, &schedule::CustomAmounts::new(), disbursement())
            .unwrap();
    assert_eq!(installments.len(), 3);
    assert_eq!(amounts(&installments), vec![dec!(3410), dec!(3410), dec!(3410)]);
    let total: Money = amounts(&installments).iter().sum();
    assert_eq!(total, dec!(10230));
}

#[test]
fn test_reference_schedule_with_remainder() {
    // 10231 / 3 = 3410.33 -> 3410, last month takes 3411
    let installments =
        schedule::generate_schedule(dec!(10231), 3, &schedule::CustomAmounts::new(), disbursement())
            .unwrap();
    assert_eq!(amounts(&installments), vec![dec!(3410), dec!(3410), dec!(3411)]);
}

#[test]
fn test_reference_schedule_month_one_override() {
    let custom = schedule::CustomAmounts::from([(1, dec!(5000))]);
    let installments =
        schedule::generate_schedule(dec!(10230), 3, &custom, disbursement()).unwrap();
    assert_eq!(installments[0].scheduled_amount, dec!(5000));
    assert_eq!(
        installments[1].scheduled_amount + installments[2].scheduled_amount,
        dec!(5230)
    );
    assert_eq!(amounts(&installments), vec![dec!(5000), dec!(2615), dec!(2615)]);
}

#[test]
fn test_month_end_disbursement_due_dates() {
    let installments =
        schedule::generate_schedule(dec!(10230), 3, &schedule::CustomAmounts::new(), disbursement())
            .unwrap();
    let dates: Vec<NaiveDate> = installments.iter().map(|i| i.due_date).collect();
    assert_eq!(
        dates,
        vec![
            NaiveDate::from_ymd_opt(2024, 2, 29).unwrap(),
            NaiveDate::from_ymd_opt(2024, 3, 31).unwrap(),
            NaiveDate::from_ymd_opt(2024, 4, 30).unwrap(),
        ]
    );
}

#[test]
fn test_override_period_out_of_range() {
    for month in [0u32, 4] {
        let custom = schedule::CustomAmounts::from([(month, dec!(100))]);
        match schedule::validate_schedule(dec!(10230), 3, &custom) {
            Err(ClubFinanceError::OverridePeriodOutOfRange {
                month: m,
                repayment_period,
            }) => {
                assert_eq!(m, month);
                assert_eq!(repayment_period, 3);
            }
            other => panic!("Expected OverridePeriodOutOfRange, got {other:?}"),
        }
    }
}

#[test]
fn test_generation_refuses_invalid_overrides() {
    let custom = schedule::CustomAmounts::from([(2, dec!(10231))]);
    assert!(matches!(
        schedule::generate_schedule(dec!(10230), 3, &custom, disbursement()),
        Err(ClubFinanceError::OverrideExceedsTotal { .. })
    ));
}

// ===========================================================================
// Payments
// ===========================================================================

#[test]
fn test_overpayment_reduces_downstream_by_exact_amount() {
    let installments = schedule::generate_schedule(
        dec!(12000),
        6,
        &schedule::CustomAmounts::new(),
        disbursement(),
    )
    .unwrap();
    let before: Money = installments[2..].iter().map(|i| i.scheduled_amount).sum();

    let out = repayment::apply_payment(&installments, 2, dec!(2750), None).unwrap();
    let after: Money = out.schedule[2..].iter().map(|i| i.scheduled_amount).sum();

    assert_eq!(before - after, dec!(750));
    assert_eq!(out.absorbed, dec!(750));
    assert_eq!(out.schedule[0].scheduled_amount, dec!(2000));
}

#[test]
fn test_full_loan_flow() {
    let config = ClubConfig {
        loan_processing_fee: dec!(30),
        ..ClubConfig::default()
    };
    let application = lifecycle::LoanApplication {
        loan_id: "L-100".into(),
        member_id: "m-7".into(),
        principal: dec!(10000),
        repayment_period: 3,
        custom_amounts: schedule::CustomAmounts::new(),
        application_date: NaiveDate::from_ymd_opt(2024, 1, 10).unwrap(),
        subscription_year: Some(2024),
    };

    let pending = lifecycle::apply_for_loan(&application, &config).unwrap();
    let approved = lifecycle::approve_loan(
        &pending,
        disbursement(),
        &schedule::CustomAmounts::from([(1, dec!(5000))]),
    )
    .unwrap();
    assert_eq!(amounts(&approved.schedule), vec![dec!(5000), dec!(2615), dec!(2615)]);

    // Overpay month 1 by 1000
    let first = lifecycle::record_repayment(
        &approved.loan,
        &approved.schedule,
        1,
        dec!(6000),
        Some(NaiveDate::from_ymd_opt(2024, 2, 28).unwrap()),
    )
    .unwrap();
    assert_eq!(first.loan.status, lifecycle::LoanStatus::Active);
    assert_eq!(first.loan.remaining_balance, dec!(4230));
    assert_eq!(amounts(&first.payment.schedule), vec![dec!(5000), dec!(1615), dec!(2615)]);

    // Early payoff quote on what is left
    let quote = early_repayment::quote_for_loan(&first.loan, &config).unwrap();
    assert_eq!(quote.early_interest, dec!(126.90));
    assert_eq!(quote.total_payment, dec!(4356.90));

    // Settle via the normal payment path
    let settled = lifecycle::record_repayment(
        &first.loan,
        &first.payment.schedule,
        2,
        quote.total_payment,
        None,
    )
    .unwrap();
    assert_eq!(settled.loan.status, lifecycle::LoanStatus::Completed);
    assert_eq!(settled.loan.remaining_balance, Decimal::ZERO);
    assert_eq!(repayment::outstanding_scheduled(&settled.payment.schedule), Decimal::ZERO);
}

// ===========================================================================
// Early repayment
// ===========================================================================

#[test]
fn test_early_repayment_reference_quote() {
    let q = early_repayment::quote_early_repayment(dec!(10000), dec!(0.03));
    assert_eq!(q.early_interest, dec!(300));
    assert_eq!(q.total_payment, dec!(10300));
}
