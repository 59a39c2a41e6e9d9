use std::error::Error;
use std::io;
use std::process;

use bank_ledger::logging::init_logging;
use bank_ledger::{console, AccountStore, Config};

fn main() {
    if let Err(err) = run() {
        eprintln!("Error: {}", err);
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn Error>> {
    let config = Config::from_env()?;
    let _logger = init_logging(&config.log_level)?;

    let mut store = AccountStore::open(&config.data_path)?;
    let session = console::run(&mut store, io::stdin().lock(), io::stdout().lock());

    // Save even when the console failed, then report whichever went wrong.
    let saved = store.close();
    session?;
    saved?;
    Ok(())
}
