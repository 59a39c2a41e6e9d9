pub mod config;
pub mod console;
mod csv_utils;
mod dto;
mod error;
pub mod logging;
mod stores;

pub use config::Config;
pub use dto::AccountRow;
pub use error::{Error, StoreError};
pub use stores::{AccountNumber, AccountRecord, AccountStore};
