//! Logger bootstrap for the binary.
//!
//! Logs go to stderr so they never mix with the console on stdout.

use flexi_logger::{Logger, LoggerHandle};
use log::info;

/// Starts the logger at `level`, a `log` level or flexi_logger spec such
/// as `info` or `bank_ledger=debug`.
///
/// The returned handle must be kept alive for as long as logging is needed.
pub fn init_logging(level: &str) -> Result<LoggerHandle, String> {
    let handle = Logger::try_with_str(level)
        .map_err(|err| format!("invalid log level `{level}`: {err}"))?
        .log_to_stderr()
        .format(flexi_logger::default_format)
        .start()
        .map_err(|err| format!("failed to start logger: {err}"))?;
    info!(
        "event=app_start version={} level={}",
        env!("CARGO_PKG_VERSION"),
        level
    );
    Ok(handle)
}
