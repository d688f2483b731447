//! CSV output via the `csv` writer.

use anyhow::{Context, Result};
use serde::Serialize;

/// Write `records` under `header`, one row each.
///
/// The header is emitted even when there are no records (unless
/// `with_header` is false), and the text never ends in a line terminator.
pub fn to_csv<T: Serialize>(header: &[&str], records: &[T], with_header: bool) -> Result<String> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());

    if with_header {
        writer
            .write_record(header)
            .context("Failed to write CSV header")?;
    }
    for record in records {
        writer
            .serialize(record)
            .context("Failed to write CSV record")?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| anyhow::anyhow!("Failed to flush CSV: {}", e.error()))?;
    let mut text = String::from_utf8(bytes).context("CSV output is not UTF-8")?;
    if text.ends_with('\n') {
        text.pop();
    }
    Ok(text)
}
