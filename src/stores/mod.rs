//! Storage layer for the ledger.
//!
//! [`AccountStore`] owns every [`AccountRecord`] and the data file behind
//! them. The file is touched at three points only:
//! - a full read when the store is opened
//! - a single append when an account is opened
//! - a full overwrite when the store is closed
//!
//! Deposits, withdrawals and closures only become durable at
//! [`AccountStore::close`].

mod accounts;
mod persist;

pub use accounts::{AccountNumber, AccountRecord};

use log::{debug, info, warn};
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};

use crate::csv_utils::write_csv;
use crate::dto::AccountRow;
use crate::error::{Error, StoreError};

#[derive(Debug)]
pub struct AccountStore {
    path: PathBuf,
    accounts: BTreeMap<AccountNumber, AccountRecord>,
    /// Highest number handed out so far; the next account gets this plus one.
    last_account_number: AccountNumber,
}

impl AccountStore {
    /// Opens the store backed by the data file at `path`.
    ///
    /// A missing file is a normal first run and yields an empty store.
    ///
    /// # Errors
    /// Returns an error if:
    /// * The file exists but cannot be read
    /// * The content is not a sequence of well formed records
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_owned();
        let accounts = match File::open(&path) {
            Ok(file) => persist::load_map(file)?,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!("no data file at {}, starting empty", path.display());
                BTreeMap::new()
            }
            Err(err) => return Err(err.into()),
        };
        let last_account_number = accounts.keys().next_back().copied().unwrap_or(0);
        info!(
            "loaded {} accounts from {}, last account number {}",
            accounts.len(),
            path.display(),
            last_account_number
        );
        Ok(Self {
            path,
            accounts,
            last_account_number,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn last_account_number(&self) -> AccountNumber {
        self.last_account_number
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }

    /// Opens a new account under the next sequential number and appends it
    /// to the data file.
    ///
    /// Names must be non-empty and free of whitespace, since the data file
    /// separates fields by whitespace alone. A failed append is only logged:
    /// the account still exists in memory and is saved by
    /// [`AccountStore::close`].
    ///
    /// # Errors
    /// Returns an error if:
    /// * Either name is empty or contains whitespace
    /// * Every account number has been handed out
    pub fn open_account(
        &mut self,
        first_name: &str,
        last_name: &str,
        balance: Decimal,
    ) -> Result<AccountRecord, Error> {
        if !is_valid_name(first_name) || !is_valid_name(last_name) {
            info!("rejected account name {first_name:?} {last_name:?}");
            return Err(Error::InvalidName);
        }
        let account_number = self
            .last_account_number
            .checked_add(1)
            .ok_or(Error::AccountNumbersExhausted)?;
        self.last_account_number = account_number;
        let record = AccountRecord::create(account_number, first_name, last_name, balance);
        self.accounts.insert(account_number, record.clone());
        info!("opened account {account_number}");

        if let Err(err) = self.append(&record) {
            warn!(
                "could not append account {} to {}: {}",
                account_number,
                self.path.display(),
                err
            );
        }
        Ok(record)
    }

    pub fn balance_enquiry(&self, account_number: AccountNumber) -> Result<AccountRecord, Error> {
        self.accounts
            .get(&account_number)
            .cloned()
            .ok_or(Error::AccountNotFound)
    }

    pub fn deposit(
        &mut self,
        account_number: AccountNumber,
        amount: Decimal,
    ) -> Result<AccountRecord, Error> {
        let account = self.get_mut(account_number)?;
        account.deposit(amount).inspect_err(|err| {
            info!("deposit of {amount} to account {account_number} rejected: {err}")
        })?;
        debug!("deposited {amount} to account {account_number}");
        Ok(account.clone())
    }

    pub fn withdraw(
        &mut self,
        account_number: AccountNumber,
        amount: Decimal,
    ) -> Result<AccountRecord, Error> {
        let account = self.get_mut(account_number)?;
        account.withdraw(amount).inspect_err(|err| {
            info!("withdrawal of {amount} from account {account_number} rejected: {err}")
        })?;
        debug!("withdrew {amount} from account {account_number}");
        Ok(account.clone())
    }

    /// Removes an account. `on_close` sees the record right before it goes.
    pub fn close_account<F>(
        &mut self,
        account_number: AccountNumber,
        on_close: F,
    ) -> Result<(), Error>
    where
        F: FnOnce(&AccountRecord),
    {
        let account = self.accounts.get(&account_number).ok_or_else(|| {
            info!("close of unknown account {account_number}");
            Error::AccountNotFound
        })?;
        on_close(account);
        self.accounts.remove(&account_number);
        info!("closed account {account_number}");
        Ok(())
    }

    /// All accounts, ascending by account number.
    pub fn list_all(&self) -> Vec<AccountRecord> {
        self.accounts.values().cloned().collect()
    }

    /// Writes all accounts as CSV, ascending by account number.
    pub fn export_csv<W: Write>(&self, writer: W) -> csv::Result<()> {
        write_csv(writer, self.accounts.values().map(AccountRow::from))
    }

    /// Tears the store down, overwriting the data file with exactly the
    /// accounts currently held.
    pub fn close(self) -> Result<(), StoreError> {
        let file = File::create(&self.path)?;
        persist::write_records(BufWriter::new(file), self.accounts.values())?;
        info!(
            "saved {} accounts to {}",
            self.accounts.len(),
            self.path.display()
        );
        Ok(())
    }

    fn get_mut(&mut self, account_number: AccountNumber) -> Result<&mut AccountRecord, Error> {
        self.accounts.get_mut(&account_number).ok_or_else(|| {
            info!("unknown account {account_number}");
            Error::AccountNotFound
        })
    }

    fn append(&self, record: &AccountRecord) -> io::Result<()> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        let mut writer = BufWriter::new(file);
        persist::write_record(&mut writer, record)?;
        writer.flush()
    }
}

fn is_valid_name(name: &str) -> bool {
    !name.is_empty() && !name.chars().any(char::is_whitespace)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use std::fs;
    use tempfile::TempDir;

    fn data_path(dir: &TempDir) -> PathBuf {
        dir.path().join("bank.data")
    }

    fn tuples(records: &[AccountRecord]) -> Vec<(AccountNumber, String, String, Decimal)> {
        records
            .iter()
            .map(|r| {
                (
                    r.account_number(),
                    r.first_name().to_owned(),
                    r.last_name().to_owned(),
                    r.balance(),
                )
            })
            .collect()
    }

    #[test]
    fn test_open_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = AccountStore::open(data_path(&dir)).unwrap();
        assert!(store.is_empty());
        assert_eq!(store.last_account_number(), 0);
        assert!(store.list_all().is_empty());
    }

    #[test]
    fn test_open_corrupt_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(data_path(&dir), "1\nAnn\nLee\n").unwrap();
        assert!(matches!(
            AccountStore::open(data_path(&dir)),
            Err(StoreError::Corrupt { record: 1, .. })
        ));
    }

    #[test]
    fn test_account_numbers_are_sequential() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = AccountStore::open(data_path(&dir)).unwrap();
        let numbers: Vec<_> = (0..5)
            .map(|_| store.open_account("A", "B", dec!(1)).unwrap().account_number())
            .collect();
        assert_eq!(numbers, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_numbers_not_reused_after_close() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = AccountStore::open(data_path(&dir)).unwrap();
        store.open_account("A", "B", dec!(1)).unwrap();
        store.open_account("C", "D", dec!(1)).unwrap();
        store.close_account(2, |_| {}).unwrap();
        let record = store.open_account("E", "F", dec!(1)).unwrap();
        assert_eq!(record.account_number(), 3);
    }

    #[test]
    fn test_open_account_appends_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = AccountStore::open(data_path(&dir)).unwrap();
        store.open_account("Ann", "Lee", dec!(100.0)).unwrap();
        store.open_account("Bob", "Kay", dec!(0)).unwrap();
        assert_eq!(
            fs::read_to_string(data_path(&dir)).unwrap(),
            "1\nAnn\nLee\n100.0\n2\nBob\nKay\n0\n"
        );
    }

    #[test]
    fn test_open_account_survives_failed_append() {
        let dir = tempfile::tempdir().unwrap();
        // A directory in place of the data file makes the append fail.
        let path = dir.path().join("not-a-file");
        fs::create_dir(&path).unwrap();
        let mut store = AccountStore::open(dir.path().join("missing")).unwrap();
        store.path = path;
        let record = store.open_account("Ann", "Lee", dec!(5)).unwrap();
        assert_eq!(store.balance_enquiry(1).unwrap(), record);
    }

    #[test]
    fn test_open_account_rejects_unstorable_names() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = AccountStore::open(data_path(&dir)).unwrap();
        assert_eq!(
            store.open_account("Mary Ann", "Lee", dec!(1)),
            Err(Error::InvalidName)
        );
        assert_eq!(store.open_account("Ann", "", dec!(1)), Err(Error::InvalidName));
        assert_eq!(
            store.open_account("Ann", "Lee\n", dec!(1)),
            Err(Error::InvalidName)
        );
        assert!(store.is_empty());
        assert_eq!(store.last_account_number(), 0);
        assert!(!data_path(&dir).exists());
        let record = store.open_account("Ann", "Lee", dec!(1)).unwrap();
        assert_eq!(record.account_number(), 1);
    }

    #[test]
    fn test_open_refuses_highest_possible_number() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(data_path(&dir), "18446744073709551615\nA\nB\n1\n").unwrap();
        assert!(matches!(
            AccountStore::open(data_path(&dir)),
            Err(StoreError::Corrupt { record: 1, .. })
        ));
    }

    #[test]
    fn test_account_numbers_exhausted() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(data_path(&dir), "18446744073709551614\nA\nB\n1\n").unwrap();
        let mut store = AccountStore::open(data_path(&dir)).unwrap();
        let last = store.open_account("C", "D", dec!(1)).unwrap();
        assert_eq!(last.account_number(), u64::MAX);
        assert_eq!(
            store.open_account("E", "F", dec!(1)),
            Err(Error::AccountNumbersExhausted)
        );
        assert_eq!(store.len(), 2);
        assert_eq!(store.last_account_number(), u64::MAX);
    }

    #[test]
    fn test_deposit_overflow_is_recoverable() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = AccountStore::open(data_path(&dir)).unwrap();
        store.open_account("Ann", "Lee", Decimal::MAX).unwrap();
        assert_eq!(store.deposit(1, Decimal::ONE), Err(Error::AmountOverflow));
        assert_eq!(store.balance_enquiry(1).unwrap().balance(), Decimal::MAX);
        assert_eq!(
            store.withdraw(1, Decimal::ONE).unwrap().balance(),
            Decimal::MAX - Decimal::ONE
        );
    }

    #[test]
    fn test_close_reports_unwritable_path() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = AccountStore::open(data_path(&dir)).unwrap();
        store.open_account("Ann", "Lee", dec!(1)).unwrap();
        fs::remove_file(data_path(&dir)).unwrap();
        // A directory where the data file belongs cannot be opened for writing.
        fs::create_dir(data_path(&dir)).unwrap();
        assert!(matches!(store.close(), Err(StoreError::Io(_))));
    }

    #[test]
    fn test_mutations_are_not_written_until_close() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = AccountStore::open(data_path(&dir)).unwrap();
        store.open_account("Ann", "Lee", dec!(100)).unwrap();
        store.deposit(1, dec!(50)).unwrap();
        assert_eq!(
            fs::read_to_string(data_path(&dir)).unwrap(),
            "1\nAnn\nLee\n100\n"
        );
        store.close().unwrap();
        assert_eq!(
            fs::read_to_string(data_path(&dir)).unwrap(),
            "1\nAnn\nLee\n150\n"
        );
    }

    #[test]
    fn test_unknown_account() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = AccountStore::open(data_path(&dir)).unwrap();
        assert_eq!(store.balance_enquiry(1), Err(Error::AccountNotFound));
        assert_eq!(store.deposit(1, dec!(1)), Err(Error::AccountNotFound));
        assert_eq!(store.withdraw(1, dec!(1)), Err(Error::AccountNotFound));
        assert_eq!(store.close_account(1, |_| {}), Err(Error::AccountNotFound));
    }

    #[test]
    fn test_rejected_deposit_leaves_balance() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = AccountStore::open(data_path(&dir)).unwrap();
        store.open_account("Ann", "Lee", dec!(10)).unwrap();
        assert_eq!(store.deposit(1, dec!(0)), Err(Error::InvalidAmount));
        assert_eq!(store.deposit(1, dec!(-2)), Err(Error::InvalidAmount));
        assert_eq!(store.balance_enquiry(1).unwrap().balance(), dec!(10));
    }

    #[test]
    fn test_rejected_withdrawal_leaves_balance() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = AccountStore::open(data_path(&dir)).unwrap();
        store.open_account("Ann", "Lee", dec!(10)).unwrap();
        assert_eq!(store.withdraw(1, dec!(10.5)), Err(Error::InsufficientFunds));
        assert_eq!(store.withdraw(1, dec!(0)), Err(Error::InvalidAmount));
        assert_eq!(store.balance_enquiry(1).unwrap().balance(), dec!(10));
    }

    #[test]
    fn test_returned_record_is_a_copy() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = AccountStore::open(data_path(&dir)).unwrap();
        let mut copy = store.open_account("Ann", "Lee", dec!(10)).unwrap();
        copy.deposit(dec!(90)).unwrap();
        assert_eq!(store.balance_enquiry(1).unwrap().balance(), dec!(10));
    }

    #[test]
    fn test_ann_lee_scenario() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = AccountStore::open(data_path(&dir)).unwrap();

        let opened = store.open_account("Ann", "Lee", dec!(100.0)).unwrap();
        assert_eq!(opened, AccountRecord::create(1, "Ann", "Lee", dec!(100.0)));

        assert_eq!(store.deposit(1, dec!(50.0)).unwrap().balance(), dec!(150.0));
        assert_eq!(store.withdraw(1, dec!(200.0)), Err(Error::InsufficientFunds));
        assert_eq!(store.balance_enquiry(1).unwrap().balance(), dec!(150.0));
        assert_eq!(store.withdraw(1, dec!(150.0)).unwrap().balance(), dec!(0.0));

        let mut shown = None;
        store.close_account(1, |r| shown = Some(r.clone())).unwrap();
        assert_eq!(shown.unwrap().account_number(), 1);
        assert!(store.list_all().is_empty());
        assert_eq!(store.balance_enquiry(1), Err(Error::AccountNotFound));
    }

    #[test]
    fn test_list_all_ascending_and_stable() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            data_path(&dir),
            "3\nCid\nMay\n3\n1\nAnn\nLee\n1\n2\nBob\nKay\n2\n",
        )
        .unwrap();
        let store = AccountStore::open(data_path(&dir)).unwrap();
        let first = store.list_all();
        let numbers: Vec<_> = first.iter().map(AccountRecord::account_number).collect();
        assert_eq!(numbers, vec![1, 2, 3]);
        assert_eq!(store.list_all(), first);
    }

    #[test]
    fn test_counter_uses_highest_loaded_number() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(data_path(&dir), "7\nAnn\nLee\n1\n4\nBob\nKay\n2\n").unwrap();
        let mut store = AccountStore::open(data_path(&dir)).unwrap();
        assert_eq!(store.last_account_number(), 7);
        let record = store.open_account("Cid", "May", dec!(3)).unwrap();
        assert_eq!(record.account_number(), 8);
    }

    #[test]
    fn test_close_and_reopen_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = AccountStore::open(data_path(&dir)).unwrap();
        store.open_account("Ann", "Lee", dec!(100.0)).unwrap();
        store.open_account("Bob", "Kay", dec!(-3.25)).unwrap();
        store.open_account("Cid", "May", dec!(0)).unwrap();
        store.deposit(3, dec!(0.01)).unwrap();
        store.close_account(2, |_| {}).unwrap();
        let before = store.list_all();
        store.close().unwrap();

        let reopened = AccountStore::open(data_path(&dir)).unwrap();
        assert_eq!(tuples(&reopened.list_all()), tuples(&before));
        assert_eq!(reopened.last_account_number(), 3);
    }

    #[test]
    fn test_close_overwrites_previous_content() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = AccountStore::open(data_path(&dir)).unwrap();
        store.open_account("Ann", "Lee", dec!(1)).unwrap();
        store.open_account("Bob", "Kay", dec!(2)).unwrap();
        store.close_account(1, |_| {}).unwrap();
        store.close_account(2, |_| {}).unwrap();
        store.close().unwrap();
        assert_eq!(fs::read_to_string(data_path(&dir)).unwrap(), "");
    }

    #[test]
    fn test_export_csv() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = AccountStore::open(data_path(&dir)).unwrap();
        store.open_account("Ann", "Lee", dec!(100.5)).unwrap();
        store.open_account("Bob", "Kay", dec!(0)).unwrap();
        let mut output = Vec::new();
        store.export_csv(&mut output).unwrap();
        let expected = "account,first_name,last_name,balance
1,Ann,Lee,100.5
2,Bob,Kay,0
";
        assert_eq!(String::from_utf8(output).unwrap(), expected);
    }
}
