use clap::Args;
use serde_json::Value;

use club_finance_core::ClubConfig;

/// Arguments for showing configuration
#[derive(Args)]
pub struct ConfigArgs {
    /// Show key/value rows as stored by the membership database
    #[arg(long)]
    pub entries: bool,
}

pub fn run_config(args: ConfigArgs, config: &ClubConfig) -> Result<Value, Box<dyn std::error::Error>> {
    if args.entries {
        Ok(serde_json::to_value(config.to_entries())?)
    } else {
        Ok(serde_json::to_value(config)?)
    }
}
