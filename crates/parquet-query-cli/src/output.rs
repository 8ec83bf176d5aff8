//! Rendering of payloads and errors.

use std::io::Write;

use parquet_query_core::RowsPage;
use serde::Serialize;
use serde_json::Value;
use snafu::ResultExt;
use tabled::{builder::Builder, settings::Style};

use crate::error::{CliError, CliResult, EncodeSnafu, WriteOutputSnafu};

/// Pretty JSON followed by a newline.
pub fn write_json<T: Serialize, W: Write>(value: &T, out: &mut W) -> CliResult<()> {
    serde_json::to_writer_pretty(&mut *out, value).context(EncodeSnafu)?;
    writeln!(out).context(WriteOutputSnafu)
}

pub fn print_json<T: Serialize>(value: &T) -> CliResult<()> {
    let stdout = std::io::stdout();
    let mut lock = stdout.lock();
    write_json(value, &mut lock)
}

pub fn print_text(text: &str) -> CliResult<()> {
    let stdout = std::io::stdout();
    let mut lock = stdout.lock();
    writeln!(lock, "{text}").context(WriteOutputSnafu)
}

/// Error body on stderr; falls back to the plain message if it cannot be
/// encoded.
pub fn print_error(err: &CliError) {
    let stderr = std::io::stderr();
    let mut lock = stderr.lock();
    if write_json(&err.to_body(), &mut lock).is_err() {
        eprintln!("{err}");
    }
}

fn cell(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Rows page as a rounded text table, header from the first row's keys,
/// followed by a one-line page summary.
pub fn render_rows_table(page: &RowsPage) -> String {
    let Some(first) = page.data.first() else {
        return format!("(no rows; offset {}, limit {})", page.offset, page.limit);
    };
    let columns: Vec<&String> = first.keys().collect();

    let mut builder = Builder::with_capacity(page.count + 1, columns.len());
    builder.push_record(columns.iter().map(|c| c.as_str()));
    for row in &page.data {
        builder.push_record(columns.iter().map(|c| row.get(*c).map(cell).unwrap_or_default()));
    }

    let mut table = builder.build();
    table.with(Style::rounded());
    format!(
        "{table}\n{} of at most {} rows from offset {}",
        page.count, page.limit, page.offset
    )
}
