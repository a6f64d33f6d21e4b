//! Export request options.

use serde::{Deserialize, Serialize};

use crate::cube::Area;
use crate::transport::Descriptor;

/// Default number of cells per page.
pub const DEFAULT_BLOCKSIZE: usize = 10_000;

/// Default in-memory size of a spooled export before it moves to disk.
pub const DEFAULT_SPOOL_THRESHOLD: usize = 10 * 1024 * 1024;

/// Which cell value types an export returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueFilter {
    #[default]
    Both,
    Numeric,
    String,
}

impl ValueFilter {
    /// Wire code of the `type` parameter.
    pub fn code(&self) -> u8 {
        match self {
            ValueFilter::Both => 0,
            ValueFilter::Numeric => 1,
            ValueFilter::String => 2,
        }
    }
}

/// What to do when a page does not end with a valid `<emitted>;<total>` line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgressPolicy {
    /// Fail with `MalformedProgress`.
    #[default]
    Strict,
    /// Log a warning and treat the export as complete.
    AssumeComplete,
}

/// Options of one export call.
///
/// `skip_empty`, `base_only`, `use_rules` and `value_filter` are passed to
/// the server unchanged. The rest shape client-side behaviour.
///
/// Deserializes from the `[export]` settings section; missing keys take
/// their defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportOptions {
    pub blocksize: usize,
    pub skip_empty: bool,
    pub base_only: bool,
    pub use_rules: bool,
    pub value_filter: ValueFilter,
    pub progress_policy: ProgressPolicy,
    /// Collapse tabs and line breaks in values.
    pub sanitize_values: bool,
    pub spool_threshold_bytes: usize,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            blocksize: DEFAULT_BLOCKSIZE,
            skip_empty: true,
            base_only: false,
            use_rules: false,
            value_filter: ValueFilter::Both,
            progress_policy: ProgressPolicy::Strict,
            sanitize_values: false,
            spool_threshold_bytes: DEFAULT_SPOOL_THRESHOLD,
        }
    }
}

impl ExportOptions {
    pub fn with_blocksize(mut self, blocksize: usize) -> Self {
        self.blocksize = blocksize.max(1);
        self
    }

    pub fn with_skip_empty(mut self, skip_empty: bool) -> Self {
        self.skip_empty = skip_empty;
        self
    }

    pub fn with_base_only(mut self, base_only: bool) -> Self {
        self.base_only = base_only;
        self
    }

    pub fn with_use_rules(mut self, use_rules: bool) -> Self {
        self.use_rules = use_rules;
        self
    }

    pub fn with_value_filter(mut self, filter: ValueFilter) -> Self {
        self.value_filter = filter;
        self
    }

    pub fn with_progress_policy(mut self, policy: ProgressPolicy) -> Self {
        self.progress_policy = policy;
        self
    }

    pub fn with_sanitize_values(mut self, sanitize: bool) -> Self {
        self.sanitize_values = sanitize;
        self
    }

    pub fn with_spool_threshold(mut self, bytes: usize) -> Self {
        self.spool_threshold_bytes = bytes;
        self
    }

    /// Request for one page. An all-wildcard area and a missing resumption
    /// path are left out.
    pub fn page_descriptor(
        &self,
        database: &str,
        cube: &str,
        area: &Area,
        resume: Option<&str>,
    ) -> Descriptor {
        let area = (!area.is_all_wildcard()).then(|| area.render());
        Descriptor::new("/cell/export")
            .param("name_database", database)
            .param("name_cube", cube)
            .param("blocksize", self.blocksize.max(1))
            .optional("area", area)
            .optional("path", resume)
            .flag("skip_empty", self.skip_empty)
            .flag("base_only", self.base_only)
            .flag("use_rules", self.use_rules)
            .param("type", self.value_filter.code())
    }
}
