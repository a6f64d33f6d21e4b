//! Bulk cell export.
//!
//! ```text
//! Area + ExportOptions
//!         │
//!         ▼
//!   ExportCursor ──── /cell/export pages (blocksize cells + progress line)
//!         │ raw rows: type;exists;value;path
//!         ▼
//!   RowTranslator ─── CoordinateResolver (ids → names)
//!         │ <dim1>,...,<dimN>,#VALUE
//!         ├──► ExportRows        lazy, one page in flight
//!         └──► spool_rows        whole export in a SpooledTempFile
//! ```

mod cursor;
mod options;
mod progress;
mod rows;
mod spool;
mod translate;

pub use cursor::{CursorState, ExportCursor, ExportRecord};
pub use options::{
    ExportOptions, ProgressPolicy, ValueFilter, DEFAULT_BLOCKSIZE, DEFAULT_SPOOL_THRESHOLD,
};
pub use progress::Progress;
pub use rows::ExportRows;
pub use spool::spool_rows;
pub use translate::{sanitize_value, RowTranslator, VALUE_COLUMN};
