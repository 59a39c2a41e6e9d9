//! Menu-driven console for the ledger.
//!
//! Reads whitespace separated tokens from the input, calls one
//! [`AccountStore`] operation per menu choice and prints the outcome.
//! Rejected operations are printed and the loop carries on. End of input
//! ends the session the same way Quit does.

use rust_decimal::Decimal;
use std::collections::VecDeque;
use std::io::{self, BufRead, Write};
use std::str::FromStr;

use crate::{AccountNumber, AccountStore};

const BANNER: &str = "***** BANKING SYSTEM *****";
const MENU: &str = "
\tSelect one option below:
\t1 Open an Account
\t2 Balance Enquiry
\t3 Deposit
\t4 Withdraw
\t5 Close an Account
\t6 Show All Accounts
\t7 Quit
\t8 Export Accounts (CSV)
Enter your choice: ";
const FAREWELL: &str = "\nThank you for using our banking system!\n";

/// Splits buffered input into whitespace separated tokens across lines.
struct Tokens<R> {
    input: R,
    pending: VecDeque<String>,
}

impl<R: BufRead> Tokens<R> {
    fn new(input: R) -> Self {
        Self {
            input,
            pending: VecDeque::new(),
        }
    }

    /// Next token, or `None` at end of input.
    /// Bytes that are not UTF-8 become U+FFFD instead of failing the read.
    fn next_token(&mut self) -> io::Result<Option<String>> {
        let mut line = Vec::new();
        while self.pending.is_empty() {
            line.clear();
            if self.input.read_until(b'\n', &mut line)? == 0 {
                return Ok(None);
            }
            self.pending.extend(
                String::from_utf8_lossy(&line)
                    .split_whitespace()
                    .map(str::to_owned),
            );
        }
        Ok(self.pending.pop_front())
    }

    /// Drops whatever is left of the current line.
    fn discard_line(&mut self) {
        self.pending.clear();
    }
}

/// What the loop does after a menu choice.
enum Step {
    Continue,
    Quit,
}

/// A field read from the operator.
enum Field<T> {
    Value(T),
    Invalid,
    Eof,
}

/// Runs the console until Quit or end of input.
///
/// # Errors
/// Returns an error if reading the input or writing the output fails.
pub fn run<R, W>(store: &mut AccountStore, input: R, mut output: W) -> io::Result<()>
where
    R: BufRead,
    W: Write,
{
    let mut tokens = Tokens::new(input);
    writeln!(output, "{BANNER}")?;
    loop {
        write!(output, "{MENU}")?;
        output.flush()?;
        let Some(token) = tokens.next_token()? else {
            write!(output, "{FAREWELL}")?;
            break;
        };
        let Ok(choice) = token.parse::<u32>() else {
            tokens.discard_line();
            write!(output, "\nInvalid input. Please enter a number.\n")?;
            continue;
        };
        match handle_choice(choice, store, &mut tokens, &mut output)? {
            Step::Continue => {}
            Step::Quit => break,
        }
    }
    output.flush()
}

fn handle_choice<R, W>(
    choice: u32,
    store: &mut AccountStore,
    tokens: &mut Tokens<R>,
    output: &mut W,
) -> io::Result<Step>
where
    R: BufRead,
    W: Write,
{
    match choice {
        1 => open_account(store, tokens, output),
        2 => {
            let account_number = match read_account_number(tokens, output)? {
                Field::Value(n) => n,
                other => return finish_field(other, tokens, output),
            };
            match store.balance_enquiry(account_number) {
                Ok(record) => write!(output, "\nYour Account Details:\n{record}")?,
                Err(err) => writeln!(output, "Error: {err}")?,
            }
            Ok(Step::Continue)
        }
        3 => {
            let (account_number, amount) =
                match read_number_and_amount(tokens, output, "Enter Amount to Deposit: ")? {
                    Field::Value(pair) => pair,
                    other => return finish_field(other, tokens, output),
                };
            match store.deposit(account_number, amount) {
                Ok(record) => write!(
                    output,
                    "\nAmount is Deposited successfully\nUpdated Account Details:\n{record}"
                )?,
                Err(err) => writeln!(output, "Error: {err}")?,
            }
            Ok(Step::Continue)
        }
        4 => {
            let (account_number, amount) =
                match read_number_and_amount(tokens, output, "Enter Amount to Withdraw: ")? {
                    Field::Value(pair) => pair,
                    other => return finish_field(other, tokens, output),
                };
            match store.withdraw(account_number, amount) {
                Ok(record) => write!(
                    output,
                    "\nAmount Withdrawn successfully\nUpdated Account Details:\n{record}"
                )?,
                Err(err) => writeln!(output, "Error: {err}")?,
            }
            Ok(Step::Continue)
        }
        5 => {
            let account_number = match read_account_number(tokens, output)? {
                Field::Value(n) => n,
                other => return finish_field(other, tokens, output),
            };
            let mut shown = Ok(());
            let closed = store.close_account(account_number, |record| {
                shown = write!(output, "Account Deleted:\n{record}");
            });
            shown?;
            if let Err(err) = closed {
                writeln!(output, "Error: {err}")?;
            }
            Ok(Step::Continue)
        }
        6 => {
            let accounts = store.list_all();
            if accounts.is_empty() {
                write!(output, "\nNo accounts in the bank.\n")?;
            }
            for record in accounts {
                writeln!(output, "Account {}\n{record}", record.account_number())?;
            }
            Ok(Step::Continue)
        }
        7 => {
            write!(output, "{FAREWELL}")?;
            Ok(Step::Quit)
        }
        8 => {
            writeln!(output)?;
            store.export_csv(&mut *output).map_err(io::Error::other)?;
            Ok(Step::Continue)
        }
        _ => {
            write!(output, "\nInvalid choice. Please try again.\n")?;
            Ok(Step::Continue)
        }
    }
}

fn open_account<R, W>(
    store: &mut AccountStore,
    tokens: &mut Tokens<R>,
    output: &mut W,
) -> io::Result<Step>
where
    R: BufRead,
    W: Write,
{
    let Some(first_name) = prompt(tokens, output, "Enter First Name: ")? else {
        return finish_field(Field::<()>::Eof, tokens, output);
    };
    let Some(last_name) = prompt(tokens, output, "Enter Last Name: ")? else {
        return finish_field(Field::<()>::Eof, tokens, output);
    };
    let balance = match read_parsed::<Decimal, _, _>(tokens, output, "Enter Initial Balance: ")? {
        Field::Value(balance) => balance,
        other => return finish_field(other, tokens, output),
    };
    match store.open_account(&first_name, &last_name, balance) {
        Ok(record) => write!(
            output,
            "\nCongratulations! Account is Created successfully:\n{record}"
        )?,
        Err(err) => writeln!(output, "Error: {err}")?,
    }
    Ok(Step::Continue)
}

fn read_account_number<R, W>(
    tokens: &mut Tokens<R>,
    output: &mut W,
) -> io::Result<Field<AccountNumber>>
where
    R: BufRead,
    W: Write,
{
    read_parsed(tokens, output, "Enter Account Number: ")
}

fn read_number_and_amount<R, W>(
    tokens: &mut Tokens<R>,
    output: &mut W,
    amount_prompt: &str,
) -> io::Result<Field<(AccountNumber, Decimal)>>
where
    R: BufRead,
    W: Write,
{
    let account_number = match read_account_number(tokens, output)? {
        Field::Value(n) => n,
        Field::Invalid => return Ok(Field::Invalid),
        Field::Eof => return Ok(Field::Eof),
    };
    Ok(match read_parsed::<Decimal, _, _>(tokens, output, amount_prompt)? {
        Field::Value(amount) => Field::Value((account_number, amount)),
        Field::Invalid => Field::Invalid,
        Field::Eof => Field::Eof,
    })
}

fn read_parsed<T, R, W>(tokens: &mut Tokens<R>, output: &mut W, text: &str) -> io::Result<Field<T>>
where
    T: FromStr,
    R: BufRead,
    W: Write,
{
    Ok(match prompt(tokens, output, text)? {
        Some(token) => match token.parse::<T>() {
            Ok(value) => Field::Value(value),
            Err(_) => Field::Invalid,
        },
        None => Field::Eof,
    })
}

fn prompt<R, W>(tokens: &mut Tokens<R>, output: &mut W, text: &str) -> io::Result<Option<String>>
where
    R: BufRead,
    W: Write,
{
    write!(output, "{text}")?;
    output.flush()?;
    tokens.next_token()
}

/// Handles a field that did not yield a value.
fn finish_field<T, R, W>(
    field: Field<T>,
    tokens: &mut Tokens<R>,
    output: &mut W,
) -> io::Result<Step>
where
    R: BufRead,
    W: Write,
{
    match field {
        Field::Invalid => {
            tokens.discard_line();
            write!(output, "\nInvalid input.\n")?;
            Ok(Step::Continue)
        }
        Field::Eof => {
            write!(output, "{FAREWELL}")?;
            Ok(Step::Quit)
        }
        Field::Value(_) => Ok(Step::Continue),
    }
}
