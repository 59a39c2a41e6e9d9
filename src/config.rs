//! Runtime configuration for the ledger binary.
//!
//! The data file comes from the single optional argument, then the
//! `BANK_DATA` environment variable, then [`DEFAULT_DATA_FILE`]. The log
//! level comes from `BANK_LOG`.

use std::path::PathBuf;

pub const DEFAULT_DATA_FILE: &str = "bank.data";
pub const DEFAULT_LOG_LEVEL: &str = "warn";
pub const DATA_ENV: &str = "BANK_DATA";
pub const LOG_ENV: &str = "BANK_LOG";

const USAGE: &str = "Usage: bank-ledger [DATA_FILE]";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub data_path: PathBuf,
    pub log_level: String,
}

impl Config {
    /// Builds the config from the process arguments and environment.
    pub fn from_env() -> Result<Self, String> {
        let args: Vec<String> = std::env::args().skip(1).collect();
        Self::from_parts(
            &args,
            std::env::var(DATA_ENV).ok(),
            std::env::var(LOG_ENV).ok(),
        )
    }

    /// `args` excludes the program name.
    pub fn from_parts(
        args: &[String],
        data_env: Option<String>,
        log_env: Option<String>,
    ) -> Result<Self, String> {
        let data_path = match args {
            [] => data_env
                .filter(|value| !value.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_DATA_FILE.to_owned()),
            [path] => path.clone(),
            _ => return Err(USAGE.to_owned()),
        };
        let log_level = log_env
            .map(|value| value.trim().to_owned())
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_owned());
        Ok(Self {
            data_path: PathBuf::from(data_path),
            log_level,
        })
    }
}
