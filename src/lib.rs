//! SecureData: a password-protected, single-file store for hierarchical
//! secrets. Accounts and folders live in one encrypted file; any record
//! can carry an extra passphrase of its own.

pub mod audit;
pub mod cli;
pub mod config;
pub mod crypto;
pub mod errors;
pub mod store;
