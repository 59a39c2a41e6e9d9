//! Codec for the persisted data file.
//!
//! Each record takes four lines: account number, first name, last name and
//! balance. There is no header, footer or delimiter, so reading splits on
//! whitespace and takes four tokens at a time. Names containing whitespace
//! cannot be read back.

use rust_decimal::Decimal;
use std::collections::BTreeMap;
use std::io::{self, Read, Write};
use std::str::FromStr;

use super::accounts::{AccountNumber, AccountRecord};
use crate::error::StoreError;

const FIELDS_PER_RECORD: usize = 4;

/// Reads every record from `reader` in file order.
///
/// Fails with [`StoreError::Corrupt`] on a trailing partial record, an
/// account number that is not a positive integer below `u64::MAX`, or a
/// balance that is not a decimal number. `u64::MAX` is refused because no
/// account could be opened after it. `record` in the error is the 1-based
/// record position.
pub fn read_records<R: Read>(mut reader: R) -> Result<Vec<AccountRecord>, StoreError> {
    let mut content = String::new();
    reader.read_to_string(&mut content)?;

    let tokens: Vec<&str> = content.split_whitespace().collect();
    let mut records = Vec::with_capacity(tokens.len() / FIELDS_PER_RECORD);
    for (index, fields) in tokens.chunks(FIELDS_PER_RECORD).enumerate() {
        let position = index + 1;
        let [number, first_name, last_name, balance] = fields else {
            return Err(corrupt(
                position,
                format!("expected {FIELDS_PER_RECORD} fields, found {}", fields.len()),
            ));
        };
        let account_number = parse_account_number(number)
            .ok_or_else(|| corrupt(position, format!("invalid account number `{number}`")))?;
        let balance = Decimal::from_str(balance)
            .map_err(|err| corrupt(position, format!("invalid balance `{balance}`: {err}")))?;
        records.push(AccountRecord::create(
            account_number,
            *first_name,
            *last_name,
            balance,
        ));
    }
    Ok(records)
}

/// Loads records into a map keyed by account number.
/// A repeated account number is treated as corruption.
pub fn load_map<R: Read>(
    reader: R,
) -> Result<BTreeMap<AccountNumber, AccountRecord>, StoreError> {
    let mut accounts = BTreeMap::new();
    for (index, record) in read_records(reader)?.into_iter().enumerate() {
        let number = record.account_number();
        if accounts.insert(number, record).is_some() {
            return Err(corrupt(
                index + 1,
                format!("duplicate account number {number}"),
            ));
        }
    }
    Ok(accounts)
}

/// Writes one record in the four-line layout.
pub fn write_record<W: Write>(writer: &mut W, record: &AccountRecord) -> io::Result<()> {
    writeln!(writer, "{}", record.account_number())?;
    writeln!(writer, "{}", record.first_name())?;
    writeln!(writer, "{}", record.last_name())?;
    writeln!(writer, "{}", record.balance())
}

/// Writes all records in iteration order and flushes.
pub fn write_records<'a, W: Write>(
    mut writer: W,
    records: impl Iterator<Item = &'a AccountRecord>,
) -> io::Result<()> {
    for record in records {
        write_record(&mut writer, record)?;
    }
    writer.flush()
}

fn parse_account_number(token: &str) -> Option<AccountNumber> {
    token
        .parse::<AccountNumber>()
        .ok()
        .filter(|n| (1..AccountNumber::MAX).contains(n))
}

fn corrupt(record: usize, reason: String) -> StoreError {
    StoreError::Corrupt { record, reason }
}
