use rust_decimal::Decimal;
use std::fmt;

use crate::Error;

pub type AccountNumber = u64;

/// One account: identity plus balance.
///
/// The number and names are fixed at creation. The balance only changes
/// through [`AccountRecord::deposit`] and [`AccountRecord::withdraw`], and a
/// withdrawal never takes it below zero.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountRecord {
    account_number: AccountNumber,
    first_name: String,
    last_name: String,
    balance: Decimal,
}

impl AccountRecord {
    /// Builds a record with an already assigned number.
    /// The initial balance is stored as given, zero and negative included.
    pub(crate) fn create(
        account_number: AccountNumber,
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        balance: Decimal,
    ) -> Self {
        Self {
            account_number,
            first_name: first_name.into(),
            last_name: last_name.into(),
            balance,
        }
    }

    pub fn account_number(&self) -> AccountNumber {
        self.account_number
    }

    pub fn first_name(&self) -> &str {
        &self.first_name
    }

    pub fn last_name(&self) -> &str {
        &self.last_name
    }

    pub fn balance(&self) -> Decimal {
        self.balance
    }

    pub fn deposit(&mut self, amount: Decimal) -> Result<(), Error> {
        if amount <= Decimal::ZERO {
            return Err(Error::InvalidAmount);
        }
        self.balance = self
            .balance
            .checked_add(amount)
            .ok_or(Error::AmountOverflow)?;
        Ok(())
    }

    pub fn withdraw(&mut self, amount: Decimal) -> Result<(), Error> {
        if amount <= Decimal::ZERO {
            return Err(Error::InvalidAmount);
        }
        if amount > self.balance {
            return Err(Error::InsufficientFunds);
        }
        self.balance -= amount;
        Ok(())
    }
}

impl fmt::Display for AccountRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "------------------------")?;
        writeln!(f, "Account Number: {}", self.account_number)?;
        writeln!(f, "First Name: {}", self.first_name)?;
        writeln!(f, "Last Name: {}", self.last_name)?;
        writeln!(f, "Balance: {}", self.balance)?;
        writeln!(f, "------------------------")
    }
}
