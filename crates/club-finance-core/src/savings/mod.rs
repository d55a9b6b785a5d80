pub mod ledger;
pub mod roster;
