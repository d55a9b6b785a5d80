pub mod early_repayment;
pub mod lifecycle;
pub mod repayment;
pub mod schedule;
pub mod terms;
