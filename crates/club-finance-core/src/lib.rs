//! Loan repayment schedules, overpayment handling, early repayment quotes and
//! member distributions for a cooperative investment club.
//!
//! Every operation is a pure function of its inputs. Configuration is passed
//! in explicitly through [`config::ClubConfig`]; nothing here reads ambient
//! state or performs I/O.

pub mod config;
pub mod error;
pub mod rounding;
pub mod types;

#[cfg(feature = "loans")]
pub mod loans;

#[cfg(feature = "distribution")]
pub mod distribution;

#[cfg(feature = "savings")]
pub mod savings;

pub use config::{ClubConfig, RemainderPolicy};
pub use error::ClubFinanceError;
pub use types::*;

/// Standard result type for all club-finance operations
pub type ClubFinanceResult<T> = Result<T, ClubFinanceError>;
