//! Downloadable error report for rejected uploads.

use std::collections::HashMap;

use super::error::IngestError;
use super::row::RawRow;
use super::validate::RowError;

/// Builds the delimited error report returned on validation failure.
///
/// One output row per invalid/unresolved input row, reproducing the original
/// columns plus a trailing `errors` column with semicolon-joined messages.
/// Rows are emitted in ascending source row order.
///
/// # Errors
///
/// Returns an error if the CSV writer fails.
pub fn error_report(
    columns: &[String],
    rows: &[RawRow],
    errors: &[RowError],
) -> Result<Vec<u8>, IngestError> {
    let rows_by_number: HashMap<usize, &RawRow> =
        rows.iter().map(|row| (row.number, row)).collect();

    let mut sorted: Vec<&RowError> = errors.iter().collect();
    sorted.sort_by_key(|e| e.row_number);

    let mut writer = csv::Writer::from_writer(Vec::new());

    let mut header: Vec<&str> = columns.iter().map(String::as_str).collect();
    header.push("errors");
    writer.write_record(&header)?;

    for row_error in sorted {
        let joined = row_error.messages.join("; ");
        let mut record: Vec<&str> = Vec::with_capacity(columns.len() + 1);
        for column in columns {
            record.push(
                rows_by_number
                    .get(&row_error.row_number)
                    .map_or("", |row| row.value(column)),
            );
        }
        record.push(&joined);
        writer.write_record(&record)?;
    }

    writer
        .into_inner()
        .map_err(|e| IngestError::Csv(csv::Error::from(e.into_error())))
}
