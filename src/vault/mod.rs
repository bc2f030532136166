pub mod conversion;
pub mod ledger;
pub mod request;
pub mod settlement;
