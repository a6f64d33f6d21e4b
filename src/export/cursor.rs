//! Paginated export cursor.
//!
//! The server never returns more than `blocksize` cells per request. Each
//! page ends with a progress line; while it reports `emitted < total` the
//! cursor asks again, starting after the path of the last data row it saw.
//!
//! ```text
//!   Start ──► Fetching ──► Stitching ──► Complete
//!                ▲             │
//!                └── Resumed ◄─┘   (emitted < total)
//! ```
//!
//! Any error moves the cursor to `Failed`; it yields nothing afterwards.

use csv::{StringRecord, StringRecordsIntoIter};

use super::options::{ExportOptions, ProgressPolicy};
use super::progress::Progress;
use crate::cube::Area;
use crate::error::{CubeError, CubeResult};
use crate::transport::{wire, ByteStream, Transport};

/// Where the cursor is in its page cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorState {
    /// Nothing fetched yet.
    Start,
    /// A page request is in flight.
    Fetching,
    /// Reading rows of the current page.
    Stitching,
    /// A page ended short of the total; the next one starts after the
    /// resumption path.
    Resumed,
    Complete,
    Failed,
}

/// One raw data row of an export page: `type;exists;value;path`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportRecord {
    pub value_type: String,
    pub exists: bool,
    pub value: String,
    /// Comma separated element ids in cube order.
    pub path: String,
}

impl ExportRecord {
    pub fn from_fields(fields: Vec<String>) -> CubeResult<Self> {
        let mut fields = fields.into_iter();
        match (fields.next(), fields.next(), fields.next(), fields.next()) {
            (Some(value_type), Some(exists), Some(value), Some(path)) => Ok(Self {
                value_type,
                exists: exists == "1",
                value,
                path,
            }),
            _ => Err(CubeError::Protocol(
                "export row has fewer than 4 fields".to_string(),
            )),
        }
    }
}

enum Step {
    Data(ExportRecord),
    /// End of page, with the parsed progress line or a description of what
    /// stood in its place.
    End(Result<Progress, String>),
}

/// Reads one page with a single row of lookahead, so the closing progress
/// line is recognised as the last row and never handed out as data.
struct PageReader {
    records: StringRecordsIntoIter<ByteStream>,
    lookahead: Option<Vec<String>>,
}

impl PageReader {
    fn new(stream: ByteStream) -> CubeResult<Self> {
        let mut reader = Self {
            records: wire::reader_builder().from_reader(stream).into_records(),
            lookahead: None,
        };
        reader.lookahead = reader.read_row()?;
        Ok(reader)
    }

    fn read_row(&mut self) -> CubeResult<Option<Vec<String>>> {
        match self.records.next() {
            Some(record) => {
                let record: StringRecord = record?;
                Ok(Some(wire::trim_record(&record)))
            }
            None => Ok(None),
        }
    }

    fn next_step(&mut self) -> CubeResult<Step> {
        let Some(current) = self.lookahead.take() else {
            return Ok(Step::End(Err("no progress line".to_string())));
        };
        self.lookahead = self.read_row()?;
        if self.lookahead.is_some() {
            return ExportRecord::from_fields(current).map(Step::Data);
        }

        if let Some(progress) = Progress::parse(&current) {
            return Ok(Step::End(Ok(progress)));
        }
        if current.len() >= 4 {
            // Last row is data; the page was cut before its progress line.
            return ExportRecord::from_fields(current).map(Step::Data);
        }
        Ok(Step::End(Err(format!("'{}'", current.join(";")))))
    }
}

/// Drives repeated page fetches for one export call and yields raw data
/// rows in server order.
///
/// The resumption boundary is exclusive: the server is expected to start
/// a resumed page after the given path. A resumed page whose first row
/// repeats that path has the row dropped with a warning. A page that ends
/// short of the total without any data row cannot make progress and is a
/// protocol error.
///
/// # Example
///
/// ```ignore
/// let mut cursor = ExportCursor::new(&transport, "Demo", "Sales", &area, &options);
/// while let Some(record) = cursor.next_record()? {
///     println!("{} = {}", record.path, record.value);
/// }
/// assert_eq!(cursor.state(), CursorState::Complete);
/// ```
pub struct ExportCursor<'c, T: Transport + ?Sized> {
    transport: &'c T,
    database: &'c str,
    cube: &'c str,
    area: &'c Area,
    options: &'c ExportOptions,
    state: CursorState,
    page: Option<PageReader>,
    resume: Option<String>,
    boundary: Option<String>,
    page_rows: u64,
    rows: u64,
    progress: Option<Progress>,
    fetches: usize,
}

impl<'c, T: Transport + ?Sized> ExportCursor<'c, T> {
    pub fn new(
        transport: &'c T,
        database: &'c str,
        cube: &'c str,
        area: &'c Area,
        options: &'c ExportOptions,
    ) -> Self {
        Self {
            transport,
            database,
            cube,
            area,
            options,
            state: CursorState::Start,
            page: None,
            resume: None,
            boundary: None,
            page_rows: 0,
            rows: 0,
            progress: None,
            fetches: 0,
        }
    }

    pub fn state(&self) -> CursorState {
        self.state
    }

    /// Page requests sent so far.
    pub fn fetches(&self) -> usize {
        self.fetches
    }

    /// Data rows yielded so far.
    pub fn rows(&self) -> u64 {
        self.rows
    }

    /// Progress reported by the most recent page.
    pub fn progress(&self) -> Option<Progress> {
        self.progress
    }

    /// Path of the last data row seen; the next page starts after it.
    pub fn resume_path(&self) -> Option<&str> {
        self.resume.as_deref()
    }

    /// Next data row, fetching pages as needed. `None` once complete.
    pub fn next_record(&mut self) -> CubeResult<Option<ExportRecord>> {
        match self.advance() {
            Ok(record) => Ok(record),
            Err(e) => {
                self.state = CursorState::Failed;
                self.page = None;
                Err(e)
            }
        }
    }

    fn advance(&mut self) -> CubeResult<Option<ExportRecord>> {
        loop {
            match self.state {
                CursorState::Complete | CursorState::Failed => return Ok(None),
                CursorState::Start | CursorState::Resumed | CursorState::Fetching => self.fetch()?,
                CursorState::Stitching => {
                    let page = self.page.as_mut().ok_or_else(|| {
                        CubeError::Protocol("export page closed while stitching".to_string())
                    })?;
                    match page.next_step()? {
                        Step::Data(record) => {
                            if self.page_rows == 0 && self.boundary.as_deref() == Some(record.path.as_str()) {
                                log::warn!(
                                    "cube '{}': resumed page repeated boundary path {}, row dropped",
                                    self.cube,
                                    record.path
                                );
                                self.boundary = None;
                                continue;
                            }
                            self.page_rows += 1;
                            self.rows += 1;
                            self.resume = Some(record.path.clone());
                            return Ok(Some(record));
                        }
                        Step::End(trailer) => {
                            self.page = None;
                            self.finish_page(trailer)?;
                        }
                    }
                }
            }
        }
    }

    fn fetch(&mut self) -> CubeResult<()> {
        self.state = CursorState::Fetching;
        self.boundary = self.resume.clone();
        let descriptor = self.options.page_descriptor(
            self.database,
            self.cube,
            self.area,
            self.resume.as_deref(),
        );
        self.fetches += 1;
        log::debug!(
            "cube '{}': fetching page {} from {}",
            self.cube,
            self.fetches,
            self.resume.as_deref().unwrap_or("start")
        );

        let stream = self.transport.send_raw(&descriptor)?;
        self.page = Some(PageReader::new(stream)?);
        self.page_rows = 0;
        self.state = CursorState::Stitching;
        Ok(())
    }

    fn finish_page(&mut self, trailer: Result<Progress, String>) -> CubeResult<()> {
        let progress = match trailer {
            Ok(progress) => progress,
            Err(found) => match self.options.progress_policy {
                ProgressPolicy::Strict => {
                    return Err(CubeError::MalformedProgress(format!(
                        "page {} of cube '{}': {}",
                        self.fetches, self.cube, found
                    )))
                }
                ProgressPolicy::AssumeComplete => {
                    log::warn!(
                        "cube '{}': page {} has no valid progress line ({}), assuming complete",
                        self.cube,
                        self.fetches,
                        found
                    );
                    self.state = CursorState::Complete;
                    return Ok(());
                }
            },
        };

        self.progress = Some(progress);
        if progress.is_complete() {
            log::info!(
                "cube '{}': export complete, {} rows in {} pages",
                self.cube,
                self.rows,
                self.fetches
            );
            self.state = CursorState::Complete;
            return Ok(());
        }

        if self.page_rows == 0 {
            return Err(CubeError::Protocol(format!(
                "export of cube '{}' stalled at {} without data rows",
                self.cube, progress
            )));
        }
        self.state = CursorState::Resumed;
        Ok(())
    }
}

impl<T: Transport + ?Sized> Iterator for ExportCursor<'_, T> {
    type Item = CubeResult<ExportRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_record().transpose()
    }
}
