//! Semicolon CSV as spoken by the cube server.
//!
//! Fields are separated by `;`, quoted with `"`, and a quote inside a quoted
//! field is written twice. Most rows end with a separator, which the CSV
//! reader reports as one extra empty field; [`trim_record`] drops it.

use std::io::Read;

use csv::{ReaderBuilder, StringRecord, Terminator, Writer, WriterBuilder};

use super::error::TransportResult;

/// Parsed response rows.
pub type Rows = Vec<Vec<String>>;

/// Reader configuration for server responses.
pub fn reader_builder() -> ReaderBuilder {
    let mut builder = ReaderBuilder::new();
    builder
        .delimiter(b';')
        .quote(b'"')
        .double_quote(true)
        .has_headers(false)
        .flexible(true);
    builder
}

/// Convert a record into owned fields, dropping one stray trailing empty field.
pub fn trim_record(record: &StringRecord) -> Vec<String> {
    let mut fields: Vec<String> = record.iter().map(str::to_string).collect();
    if fields.len() > 1 && fields.last().is_some_and(|f| f.is_empty()) {
        fields.pop();
    }
    fields
}

/// Parse a whole response body into rows.
pub fn parse_rows<R: Read>(reader: R) -> TransportResult<Rows> {
    let mut csv = reader_builder().from_reader(reader);
    let mut rows = Vec::new();
    let mut record = StringRecord::new();
    while csv.read_record(&mut record)? {
        rows.push(trim_record(&record));
    }
    Ok(rows)
}

/// Writer configuration for server-format bodies.
pub fn writer_builder() -> WriterBuilder {
    let mut builder = WriterBuilder::new();
    builder
        .delimiter(b';')
        .quote(b'"')
        .double_quote(true)
        .has_headers(false)
        .flexible(true)
        .terminator(Terminator::Any(b'\n'));
    builder
}

/// Builds a response body in server format.
pub struct RowWriter {
    inner: Writer<Vec<u8>>,
}

impl RowWriter {
    pub fn new() -> Self {
        Self {
            inner: writer_builder().from_writer(Vec::new()),
        }
    }

    /// Append a row ending with the trailing separator.
    pub fn row<I>(&mut self, fields: I) -> TransportResult<()>
    where
        I: IntoIterator,
        I::Item: AsRef<[u8]>,
    {
        for field in fields {
            self.inner.write_field(field)?;
        }
        self.inner.write_field("")?;
        self.inner.write_record(None::<&[u8]>)?;
        Ok(())
    }

    /// Append a row without a trailing separator, as progress lines are sent.
    pub fn bare_row<I>(&mut self, fields: I) -> TransportResult<()>
    where
        I: IntoIterator,
        I::Item: AsRef<[u8]>,
    {
        self.inner.write_record(fields)?;
        Ok(())
    }

    pub fn finish(self) -> TransportResult<Vec<u8>> {
        self.inner.into_inner().map_err(|e| e.into_error().into())
    }
}

impl Default for RowWriter {
    fn default() -> Self {
        Self::new()
    }
}
