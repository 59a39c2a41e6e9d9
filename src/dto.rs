use rust_decimal::Decimal;
use serde::Serialize;

use crate::{AccountNumber, AccountRecord};

/// CSV view of an account, borrowed from the record it describes.
#[derive(Debug, Serialize, PartialEq)]
pub struct AccountRow<'a> {
    pub account: AccountNumber,
    pub first_name: &'a str,
    pub last_name: &'a str,
    pub balance: Decimal,
}

impl<'a> From<&'a AccountRecord> for AccountRow<'a> {
    fn from(record: &'a AccountRecord) -> Self {
        Self {
            account: record.account_number(),
            first_name: record.first_name(),
            last_name: record.last_name(),
            balance: record.balance(),
        }
    }
}
