//! Implementation of the `et summary` command.

use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};

use et_core::{Summary, extract_file};

use super::render::format_statistics_table;

/// Run the summary command.
///
/// Prints the statistics table, or the statistics artifact as JSON.
/// Nothing is written to disk.
pub fn run<W: Write>(writer: &mut W, log: &Path, json: bool) -> Result<()> {
    let extraction = extract_file(log).context("extraction failed")?;
    let summary = Summary::from_records(&extraction.records);

    if json {
        serde_json::to_writer_pretty(&mut *writer, &summary)
            .context("failed to serialize summary")?;
        writeln!(writer)?;
    } else {
        write!(writer, "{}", format_statistics_table(&summary))?;
    }
    Ok(())
}
