//! The `<emitted>;<total>` line closing every export page.

use std::fmt;

/// Cumulative export progress reported by the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    /// Cells emitted so far, across all pages.
    pub emitted: u64,
    /// Cells in the whole export.
    pub total: u64,
}

impl Progress {
    /// Parse a progress row. Anything but exactly two integers is rejected.
    pub fn parse(fields: &[String]) -> Option<Self> {
        match fields {
            [emitted, total] => Some(Self {
                emitted: emitted.trim().parse().ok()?,
                total: total.trim().parse().ok()?,
            }),
            _ => None,
        }
    }

    /// No further page is needed.
    ///
    /// An over-count is treated as complete so a confused server cannot keep
    /// the cursor fetching.
    pub fn is_complete(&self) -> bool {
        self.emitted >= self.total
    }
}

impl fmt::Display for Progress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.emitted, self.total)
    }
}
