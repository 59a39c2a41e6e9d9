//! CSV output for the account export.

use serde::Serialize;
use std::io::Write;

/// Writes rows such as [`AccountRow`](crate::dto::AccountRow) as CSV.
/// The header comes from the first row's field names, so no rows means no
/// output at all.
pub fn write_csv<T, W>(output: W, mut rows: impl Iterator<Item = T>) -> csv::Result<()>
where
    T: Serialize,
    W: Write,
{
    let mut csv_writer = csv::Writer::from_writer(output);
    rows.try_for_each(|row| csv_writer.serialize(row))?;
    csv_writer.flush()?;
    Ok(())
}
