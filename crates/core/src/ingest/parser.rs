//! Streaming row parser.

use std::collections::HashMap;
use std::io::Read;

use super::error::IngestError;
use super::headers::canonical_field;
use super::row::RawRow;

/// Streams canonical rows out of a tabular byte stream.
///
/// The header row is read eagerly to build the column map; data rows are
/// produced lazily, bounded only by file size, and the source is not
/// restartable without re-reading. Rows where every field is blank are
/// dropped silently (they still consume a row number so report numbering
/// matches the source file).
pub struct RowParser<R: Read> {
    records: csv::StringRecordsIntoIter<R>,
    columns: Vec<String>,
    next_number: usize,
}

impl<R: Read> RowParser<R> {
    /// Opens a parser over a reader, consuming the header row.
    ///
    /// # Errors
    ///
    /// Returns an error if the header row is missing or unreadable.
    pub fn new(reader: R) -> Result<Self, IngestError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(reader);

        let headers = csv_reader.headers()?.clone();
        if headers.is_empty() {
            return Err(IngestError::MissingHeaders);
        }

        let columns = headers
            .iter()
            .map(|header| {
                canonical_field(header)
                    .map_or_else(|| header.trim().to_string(), str::to_string)
            })
            .collect();

        Ok(Self {
            records: csv_reader.into_records(),
            columns,
            next_number: 0,
        })
    }

    /// The canonical (or passed-through) column names, in file order.
    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Checks that every required canonical column was recognized in the
    /// header row, so a file missing a whole column fails once up front
    /// instead of once per row.
    ///
    /// # Errors
    ///
    /// Returns [`IngestError::MissingColumn`] naming the first absent column.
    pub fn require_columns(&self, required: &[&'static str]) -> Result<(), IngestError> {
        for name in required {
            if !self.columns.iter().any(|column| column == name) {
                return Err(IngestError::MissingColumn(name));
            }
        }
        Ok(())
    }
}

impl<R: Read> Iterator for RowParser<R> {
    type Item = Result<RawRow, IngestError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let record = match self.records.next()? {
                Ok(record) => record,
                Err(e) => return Some(Err(IngestError::Csv(e))),
            };
            self.next_number += 1;

            let mut fields = HashMap::with_capacity(self.columns.len());
            for (index, column) in self.columns.iter().enumerate() {
                let value = record.get(index).unwrap_or("").trim();
                fields.insert(column.clone(), value.to_string());
            }

            let row = RawRow::new(self.next_number, fields);
            if row.is_blank() {
                continue;
            }
            return Some(Ok(row));
        }
    }
}
