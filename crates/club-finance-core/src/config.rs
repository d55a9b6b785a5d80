//! Club-wide settings that parameterise loan and distribution calculations.
//!
//! The membership store keeps these as key/value string rows. They are parsed
//! once into a [`ClubConfig`] and then passed explicitly to each calculation.

use std::str::FromStr;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::ClubFinanceError;
use crate::types::{Money, Rate};
use crate::ClubFinanceResult;

pub const KEY_LOAN_INTEREST_RATE: &str = "loan_interest_rate";
pub const KEY_LOAN_PROCESSING_FEE: &str = "loan_processing_fee";
pub const KEY_EARLY_REPAYMENT_RATE: &str = "early_repayment_rate";
pub const KEY_ANNUAL_SUBSCRIPTION_FEE: &str = "annual_subscription_fee";
pub const KEY_REMAINDER_POLICY: &str = "remainder_policy";

/// What happens to the cents left over after rounding distribution records.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RemainderPolicy {
    /// Remainder stays in the pool and is reported on the output.
    #[default]
    RetainInPool,
    /// Remainder is added to the record of the member with the largest balance.
    LargestBalance,
}

impl FromStr for RemainderPolicy {
    type Err = ClubFinanceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "retain_in_pool" => Ok(RemainderPolicy::RetainInPool),
            "largest_balance" => Ok(RemainderPolicy::LargestBalance),
            other => Err(ClubFinanceError::InvalidConfig {
                key: KEY_REMAINDER_POLICY.into(),
                reason: format!("Unknown policy '{other}'"),
            }),
        }
    }
}

/// Typed club configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClubConfig {
    /// Flat interest charged on principal (0.02 = 2%).
    pub loan_interest_rate: Rate,
    /// Flat processing fee added to every loan.
    pub loan_processing_fee: Money,
    /// Extra interest charged on the remaining balance for early payoff.
    pub early_repayment_rate: Rate,
    /// Yearly membership subscription.
    pub annual_subscription_fee: Money,
    pub remainder_policy: RemainderPolicy,
}

impl Default for ClubConfig {
    fn default() -> Self {
        Self {
            loan_interest_rate: dec!(0.02),
            loan_processing_fee: dec!(5000),
            early_repayment_rate: dec!(0.03),
            annual_subscription_fee: dec!(50000),
            remainder_policy: RemainderPolicy::RetainInPool,
        }
    }
}

/// One raw key/value row as stored by the persistence layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigEntry {
    pub key: String,
    pub value: String,
}

impl ConfigEntry {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

impl ClubConfig {
    /// Parse a JSON document. Missing fields fall back to defaults.
    pub fn from_json(json: &str) -> ClubFinanceResult<Self> {
        let config: ClubConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Build a config from stored key/value rows, starting from defaults.
    ///
    /// Unknown keys and unparsable values are rejected rather than ignored.
    pub fn from_entries(entries: &[ConfigEntry]) -> ClubFinanceResult<Self> {
        let mut config = ClubConfig::default();

        for entry in entries {
            match entry.key.as_str() {
                KEY_LOAN_INTEREST_RATE => {
                    config.loan_interest_rate = parse_decimal(&entry.key, &entry.value)?
                }
                KEY_LOAN_PROCESSING_FEE => {
                    config.loan_processing_fee = parse_decimal(&entry.key, &entry.value)?
                }
                KEY_EARLY_REPAYMENT_RATE => {
                    config.early_repayment_rate = parse_decimal(&entry.key, &entry.value)?
                }
                KEY_ANNUAL_SUBSCRIPTION_FEE => {
                    config.annual_subscription_fee = parse_decimal(&entry.key, &entry.value)?
                }
                KEY_REMAINDER_POLICY => config.remainder_policy = entry.value.parse()?,
                other => {
                    return Err(ClubFinanceError::InvalidConfig {
                        key: other.to_string(),
                        reason: "Unknown configuration key".into(),
                    })
                }
            }
        }

        config.validate()?;
        Ok(config)
    }

    /// Render back to key/value rows for storage.
    pub fn to_entries(&self) -> Vec<ConfigEntry> {
        let policy = match self.remainder_policy {
            RemainderPolicy::RetainInPool => "retain_in_pool",
            RemainderPolicy::LargestBalance => "largest_balance",
        };
        vec![
            ConfigEntry::new(KEY_ANNUAL_SUBSCRIPTION_FEE, self.annual_subscription_fee.to_string()),
            ConfigEntry::new(KEY_EARLY_REPAYMENT_RATE, self.early_repayment_rate.to_string()),
            ConfigEntry::new(KEY_LOAN_INTEREST_RATE, self.loan_interest_rate.to_string()),
            ConfigEntry::new(KEY_LOAN_PROCESSING_FEE, self.loan_processing_fee.to_string()),
            ConfigEntry::new(KEY_REMAINDER_POLICY, policy),
        ]
    }

    pub fn validate(&self) -> ClubFinanceResult<()> {
        validate_rate(KEY_LOAN_INTEREST_RATE, self.loan_interest_rate)?;
        validate_rate(KEY_EARLY_REPAYMENT_RATE, self.early_repayment_rate)?;
        validate_fee(KEY_LOAN_PROCESSING_FEE, self.loan_processing_fee)?;
        validate_fee(KEY_ANNUAL_SUBSCRIPTION_FEE, self.annual_subscription_fee)?;
        Ok(())
    }
}

fn parse_decimal(key: &str, value: &str) -> ClubFinanceResult<Decimal> {
    Decimal::from_str(value.trim()).map_err(|e| ClubFinanceError::InvalidConfig {
        key: key.to_string(),
        reason: format!("'{value}' is not a decimal number: {e}"),
    })
}

fn validate_rate(key: &str, rate: Rate) -> ClubFinanceResult<()> {
    if rate < Decimal::ZERO || rate > Decimal::ONE {
        return Err(ClubFinanceError::InvalidConfig {
            key: key.to_string(),
            reason: format!("Rate {rate} must be between 0 and 1"),
        });
    }
    Ok(())
}

fn validate_fee(key: &str, fee: Money) -> ClubFinanceResult<()> {
    if fee < Decimal::ZERO {
        return Err(ClubFinanceError::InvalidConfig {
            key: key.to_string(),
            reason: format!("Fee {fee} cannot be negative"),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_club_rates() {
        let config = ClubConfig::default();
        assert_eq!(config.loan_interest_rate, dec!(0.02));
        assert_eq!(config.loan_processing_fee, dec!(5000));
        assert_eq!(config.early_repayment_rate, dec!(0.03));
        assert_eq!(config.annual_subscription_fee, dec!(50000));
        assert_eq!(config.remainder_policy, RemainderPolicy::RetainInPool);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_entries_overrides_defaults() {
        let entries = vec![
            ConfigEntry::new("loan_interest_rate", "0.05"),
            ConfigEntry::new("loan_processing_fee", " 30 "),
            ConfigEntry::new("remainder_policy", "largest_balance"),
        ];
        let config = ClubConfig::from_entries(&entries).unwrap();
        assert_eq!(config.loan_interest_rate, dec!(0.05));
        assert_eq!(config.loan_processing_fee, dec!(30));
        assert_eq!(config.early_repayment_rate, dec!(0.03));
        assert_eq!(config.remainder_policy, RemainderPolicy::LargestBalance);
    }

    #[test]
    fn test_from_entries_rejects_unknown_key() {
        let entries = vec![ConfigEntry::new("theme", "dark")];
        match ClubConfig::from_entries(&entries) {
            Err(ClubFinanceError::InvalidConfig { key, .. }) => assert_eq!(key, "theme"),
            other => panic!("Expected InvalidConfig, got {other:?}"),
        }
    }

    #[test]
    fn test_from_entries_rejects_garbage_value() {
        let entries = vec![ConfigEntry::new("loan_interest_rate", "two percent")];
        assert!(matches!(
            ClubConfig::from_entries(&entries),
            Err(ClubFinanceError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn test_rate_above_one_is_rejected() {
        let entries = vec![ConfigEntry::new("early_repayment_rate", "3")];
        assert!(ClubConfig::from_entries(&entries).is_err());
    }

    #[test]
    fn test_negative_fee_is_rejected() {
        let config = ClubConfig {
            loan_processing_fee: dec!(-1),
            ..ClubConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_from_json_partial_document() {
        let config = ClubConfig::from_json(r#"{"loan_interest_rate": "0.1"}"#).unwrap();
        assert_eq!(config.loan_interest_rate, dec!(0.1));
        assert_eq!(config.loan_processing_fee, dec!(5000));
    }

    #[test]
    fn test_entries_round_trip_through_storage_rows() {
        let config = ClubConfig {
            remainder_policy: RemainderPolicy::LargestBalance,
            ..ClubConfig::default()
        };
        let restored = ClubConfig::from_entries(&config.to_entries()).unwrap();
        assert_eq!(restored, config);
    }
}
