//! Raw export rows to named rows.

use std::borrow::Cow;

use super::cursor::ExportRecord;
use crate::dimension::{parse_id_list, CoordinateResolver};
use crate::error::{CubeError, CubeResult};
use crate::transport::Transport;

/// Name of the trailing value column.
pub const VALUE_COLUMN: &str = "#VALUE";

/// Replace tabs and line feeds with a space and drop carriage returns.
pub fn sanitize_value(value: &str) -> Cow<'_, str> {
    if !value.contains(['\t', '\n', '\r']) {
        return Cow::Borrowed(value);
    }
    Cow::Owned(
        value
            .chars()
            .filter(|c| *c != '\r')
            .map(|c| if c == '\t' || c == '\n' { ' ' } else { c })
            .collect(),
    )
}

/// Turns `type;exists;value;path` rows into one element name per cube
/// dimension followed by the value.
pub struct RowTranslator<'r, T> {
    resolver: &'r CoordinateResolver<T>,
    sanitize: bool,
}

impl<'r, T: Transport> RowTranslator<'r, T> {
    pub fn new(resolver: &'r CoordinateResolver<T>, sanitize: bool) -> Self {
        Self { resolver, sanitize }
    }

    /// `<dim1>,...,<dimN>,#VALUE`
    pub fn header(&self) -> Vec<String> {
        let mut header = self.resolver.schema().dimensions().to_vec();
        header.push(VALUE_COLUMN.to_string());
        header
    }

    pub fn translate(&self, record: &ExportRecord) -> CubeResult<Vec<String>> {
        let path = parse_id_list(&record.path)
            .ok_or_else(|| CubeError::Protocol(format!("invalid path '{}'", record.path)))?;
        let mut row: Vec<String> = self
            .resolver
            .names_for_path(&path)?
            .into_iter()
            .map(str::to_string)
            .collect();

        let value = if self.sanitize {
            sanitize_value(&record.value)
        } else {
            Cow::Borrowed(record.value.as_str())
        };
        row.push(value.into_owned());
        Ok(row)
    }
}
