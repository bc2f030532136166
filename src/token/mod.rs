pub mod balance_store;
pub mod ledger;
