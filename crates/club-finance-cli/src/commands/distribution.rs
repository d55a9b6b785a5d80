use clap::{Args, ValueEnum};
use rust_decimal::Decimal;
use serde_json::Value;

use club_finance_core::distribution::{self, DistributionBasis, DistributionInput};
use club_finance_core::{ClubConfig, RemainderPolicy};

use crate::input;

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum BasisArg {
    /// Same amount to every eligible member
    Equal,
    /// Share of the pool matching share of total savings
    Proportional,
}

impl From<BasisArg> for DistributionBasis {
    fn from(basis: BasisArg) -> Self {
        match basis {
            BasisArg::Equal => DistributionBasis::Equal,
            BasisArg::Proportional => DistributionBasis::Proportional,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum RemainderArg {
    /// Keep leftover cents in the pool
    RetainInPool,
    /// Give leftover cents to the member with the largest balance
    LargestBalance,
}

impl From<RemainderArg> for RemainderPolicy {
    fn from(policy: RemainderArg) -> Self {
        match policy {
            RemainderArg::RetainInPool => RemainderPolicy::RetainInPool,
            RemainderArg::LargestBalance => RemainderPolicy::LargestBalance,
        }
    }
}

/// Arguments for a member distribution
#[derive(Args)]
pub struct DistributeArgs {
    /// Path to JSON input file with the pool and member roster
    #[arg(long)]
    pub input: Option<String>,

    /// Distribution basis
    #[arg(long, default_value = "equal")]
    pub basis: BasisArg,

    /// Override the pool amount from the input
    #[arg(long)]
    pub pool_amount: Option<Decimal>,

    /// Override the retained amount from the input
    #[arg(long)]
    pub retained_amount: Option<Decimal>,

    /// Override the configured remainder policy
    #[arg(long)]
    pub remainder_policy: Option<RemainderArg>,
}

pub fn run_distribute(
    args: DistributeArgs,
    config: &ClubConfig,
) -> Result<Value, Box<dyn std::error::Error>> {
    let mut dist_input: DistributionInput = if let Some(ref path) = args.input {
        input::file::read_json(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        data
    } else {
        return Err("--input <file.json> or stdin required for the member roster".into());
    };

    if let Some(pool) = args.pool_amount {
        dist_input.pool_amount = pool;
    }
    if let Some(retained) = args.retained_amount {
        dist_input.retained_amount = retained;
    }
    let policy = args
        .remainder_policy
        .map(RemainderPolicy::from)
        .unwrap_or(config.remainder_policy);

    let result = distribution::distribute(&dist_input, args.basis.into(), policy)?;
    Ok(serde_json::to_value(result)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remainder_arg_accepts_kebab_case_names() {
        let parsed = RemainderArg::from_str("largest-balance", false).unwrap();
        assert_eq!(RemainderPolicy::from(parsed), RemainderPolicy::LargestBalance);
        let parsed = RemainderArg::from_str("retain-in-pool", false).unwrap();
        assert_eq!(RemainderPolicy::from(parsed), RemainderPolicy::RetainInPool);
        assert!(RemainderArg::from_str("everyone", false).is_err());
    }

    #[test]
    fn test_basis_arg_maps_to_core_basis() {
        assert_eq!(DistributionBasis::from(BasisArg::Equal), DistributionBasis::Equal);
        assert_eq!(
            DistributionBasis::from(BasisArg::Proportional),
            DistributionBasis::Proportional
        );
    }
}
