pub mod address;
pub mod config;
pub mod domain;
pub mod error;
pub mod operation;
