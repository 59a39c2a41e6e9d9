//! Errors for the account ledger.
//!
//! [`Error`] holds the business failures an operator can trigger:
//! - referencing an account that does not exist
//! - depositing or withdrawing a non-positive amount
//! - withdrawing more than the balance
//! - a deposit that would take the balance past the largest decimal
//! - opening an account with a name the data file cannot hold
//! - opening an account once every account number is used up
//!
//! All of them are recoverable and leave the store untouched.
//!
//! [`StoreError`] covers the persisted data file: I/O failures and content
//! that cannot be read back as account records.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum Error {
    #[error("Account not found.")]
    AccountNotFound,
    #[error("Amount must be positive.")]
    InvalidAmount,
    #[error("Insufficient funds.")]
    InsufficientFunds,
    #[error("Amount would overflow the balance.")]
    AmountOverflow,
    #[error("Names must be non-empty and contain no whitespace.")]
    InvalidName,
    #[error("No account numbers left.")]
    AccountNumbersExhausted,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("data file io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("corrupt data file at record {record}: {reason}")]
    Corrupt { record: usize, reason: String },
}
