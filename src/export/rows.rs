//! Lazy consumption of an export.

use super::cursor::{CursorState, ExportCursor};
use super::translate::RowTranslator;
use crate::error::CubeResult;
use crate::transport::Transport;

/// Named export rows, produced one at a time.
///
/// The first item is the header row. Pages are fetched only when the
/// previous one is drained; dropping the iterator abandons the export and
/// releases the open page. After an error the iterator is exhausted.
pub struct ExportRows<'c, T: Transport> {
    cursor: ExportCursor<'c, T>,
    translator: RowTranslator<'c, T>,
    header_sent: bool,
    failed: bool,
}

impl<'c, T: Transport> ExportRows<'c, T> {
    pub fn new(cursor: ExportCursor<'c, T>, translator: RowTranslator<'c, T>) -> Self {
        Self {
            cursor,
            translator,
            header_sent: false,
            failed: false,
        }
    }

    /// The underlying cursor, for page and progress counters.
    pub fn cursor(&self) -> &ExportCursor<'c, T> {
        &self.cursor
    }

    pub fn is_complete(&self) -> bool {
        self.cursor.state() == CursorState::Complete
    }

    fn next_row(&mut self) -> CubeResult<Option<Vec<String>>> {
        if !self.header_sent {
            self.header_sent = true;
            return Ok(Some(self.translator.header()));
        }
        match self.cursor.next_record()? {
            Some(record) => self.translator.translate(&record).map(Some),
            None => Ok(None),
        }
    }
}

impl<T: Transport> Iterator for ExportRows<'_, T> {
    type Item = CubeResult<Vec<String>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        let row = self.next_row().transpose();
        if matches!(row, Some(Err(_))) {
            self.failed = true;
        }
        row
    }
}
